//! Snapshot backend
//!
//! For toolkits that own the paint cycle. Retained windows record each frame into
//! a command buffer; `end_frame` only requests a redraw, and the host's paint
//! callback replays the buffer into whatever [`SnapshotSink`] it offers. Windows
//! follow `BackendConfig::retained` unless their `WindowConfig` says otherwise;
//! immediate windows behave exactly like the raster backend.

use std::rc::Rc;

use lumen_core::{Allocator, BackendConfig, Handle, HostBootstrap, Result, SystemAllocator};
use lumen_paint::{CommandBuffer, ReplayStats, SnapshotSink};
use lumen_raster::{RasterCanvas, RasterTexture};
use lumen_text::{Font, FontLibrary};

use crate::host::{impl_host_backend, HostState, ModeRules, RedrawCallback};

static BOOTSTRAP: HostBootstrap = HostBootstrap::new("snapshot");

/// Process-wide bootstrap shared by every snapshot backend
pub fn bootstrap() -> &'static HostBootstrap {
    &BOOTSTRAP
}

pub struct SnapshotBackend {
    host: HostState,
}

impl SnapshotBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        Self::with_parts(config, Rc::new(SystemAllocator), FontLibrary::new())
    }

    /// Create a backend with an explicit payload allocator and font library
    pub fn with_parts(
        config: BackendConfig,
        alloc: Rc<dyn Allocator>,
        fonts: FontLibrary,
    ) -> Result<Self> {
        let rules = ModeRules {
            name: "snapshot",
            default_retained: config.retained,
            allow_retained: true,
        };
        Ok(Self {
            host: HostState::new(rules, config, alloc, fonts, &BOOTSTRAP)?,
        })
    }

    pub fn config(&self) -> &BackendConfig {
        self.host.config()
    }

    pub fn fonts_mut(&mut self) -> &mut FontLibrary {
        self.host.fonts_mut()
    }

    /// Called with the window handle whenever a window needs repainting
    pub fn set_redraw_callback(&mut self, callback: Option<RedrawCallback>) {
        self.host.set_redraw_callback(callback);
    }

    pub fn redraw_pending(&self, window: Handle) -> Result<bool> {
        self.host.redraw_pending(window)
    }

    pub fn is_retained(&self, window: Handle) -> Result<bool> {
        self.host.is_retained(window)
    }

    /// Commands recorded for a retained window's last frame
    pub fn commands(&self, window: Handle) -> Result<&CommandBuffer> {
        self.host.commands(window)
    }

    /// Add one reference to a texture; each reference needs its own `destroy_texture`
    pub fn retain_texture(&mut self, texture: Handle) -> Result<u32> {
        self.host.retain_texture(texture)
    }

    /// Replay a retained window's finished frame into the host snapshot.
    ///
    /// A window whose frame has not ended yet replays nothing. Commands referring
    /// to destroyed textures or fonts are skipped and counted in the stats.
    pub fn snapshot<S>(&mut self, window: Handle, sink: &mut S) -> Result<ReplayStats>
    where
        S: SnapshotSink<RasterTexture, Font> + ?Sized,
    {
        self.host.snapshot(window, sink)
    }

    /// Replay into a raster canvas, the snapshot offered by pixel-based hosts
    pub fn paint_snapshot(&mut self, window: Handle, canvas: &mut RasterCanvas) -> Result<ReplayStats> {
        self.host.paint(window, canvas)
    }

    /// Surface of an immediate window as `(width, height, pixels)`
    pub fn surface_pixels(&self, window: Handle) -> Result<(u32, u32, Vec<u8>)> {
        self.host.surface_pixels(window)
    }

    pub fn pixel(&self, window: Handle, x: u32, y: u32) -> Result<Option<[u8; 4]>> {
        self.host.pixel(window, x, y)
    }

    /// Destroy every resource and drop the bootstrap reference. Safe to call twice.
    pub fn shutdown(&mut self) -> Result<()> {
        self.host.shutdown()
    }
}

impl_host_backend!(SnapshotBackend);
