//! In-process host windows

use std::any::Any;
use std::rc::Rc;

use lumen_core::{Allocator, Resource, ResourceKind, Result, TypedResource};
use lumen_paint::CommandBuffer;
use lumen_raster::RasterCanvas;

/// A host window: a device-pixel surface plus, in retained mode, the command
/// buffer the host replays during its paint callback.
pub struct HostWindow {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub dpi_scale: f32,
    pub visible: bool,
    pub retained: bool,
    pub canvas: RasterCanvas,
    pub commands: CommandBuffer,
    /// Set by `end_frame`, cleared once the host has painted
    pub redraw_pending: bool,
    alloc: Rc<dyn Allocator>,
}

impl std::fmt::Debug for HostWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostWindow")
            .field("title", &self.title)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dpi_scale", &self.dpi_scale)
            .field("retained", &self.retained)
            .field("commands", &self.commands.len())
            .finish()
    }
}

impl HostWindow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        width: i32,
        height: i32,
        dpi_scale: f32,
        retained: bool,
        command_capacity: usize,
        alloc: Rc<dyn Allocator>,
    ) -> Result<Self> {
        let (w, h) = lumen_raster::canvas::device_size(width, height, dpi_scale);
        Ok(Self {
            title,
            width,
            height,
            dpi_scale,
            visible: false,
            retained,
            canvas: RasterCanvas::new(w, h, dpi_scale)?,
            commands: CommandBuffer::new(command_capacity),
            redraw_pending: false,
            alloc,
        })
    }

    /// Adopt a new logical size and DPI, reallocating the surface if needed
    pub fn resize(&mut self, width: i32, height: i32, dpi_scale: f32) -> Result<()> {
        let (w, h) = lumen_raster::canvas::device_size(width, height, dpi_scale);
        self.canvas.resize(w, h, dpi_scale)?;
        self.width = width;
        self.height = height;
        self.dpi_scale = dpi_scale;
        Ok(())
    }

    /// Free every recorded payload for a new retained frame
    pub fn reset_commands(&mut self) -> Result<()> {
        self.commands.reset(self.alloc.as_ref())
    }

    pub fn alloc(&self) -> &dyn Allocator {
        self.alloc.as_ref()
    }
}

impl Resource for HostWindow {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Window
    }

    fn destroy(&mut self) -> Result<()> {
        tracing::trace!(title = %self.title, "host window destroyed");
        self.commands.release_storage(self.alloc.as_ref())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedResource for HostWindow {
    const KIND: ResourceKind = ResourceKind::Window;
}
