//! Raster backend
//!
//! Every window owns a device-pixel tiny-skia surface and every draw call lands on
//! it immediately. Hosts blit [`RasterBackend::surface_pixels`] in their paint
//! callback. Retained windows are not available here; use the snapshot backend.

use std::rc::Rc;

use lumen_core::{Allocator, BackendConfig, Handle, HostBootstrap, Result, SystemAllocator};
use lumen_text::FontLibrary;

use crate::host::{impl_host_backend, HostState, ModeRules, RedrawCallback};

static BOOTSTRAP: HostBootstrap = HostBootstrap::new("raster");

/// Process-wide bootstrap shared by every raster backend
pub fn bootstrap() -> &'static HostBootstrap {
    &BOOTSTRAP
}

const RULES: ModeRules = ModeRules {
    name: "raster",
    default_retained: false,
    allow_retained: false,
};

pub struct RasterBackend {
    host: HostState,
}

impl RasterBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        Self::with_parts(config, Rc::new(SystemAllocator), FontLibrary::new())
    }

    /// Create a backend with an explicit payload allocator and font library
    pub fn with_parts(
        config: BackendConfig,
        alloc: Rc<dyn Allocator>,
        fonts: FontLibrary,
    ) -> Result<Self> {
        Ok(Self {
            host: HostState::new(RULES, config, alloc, fonts, &BOOTSTRAP)?,
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

    /// Add one reference to a texture; each reference needs its own `destroy_texture`
    pub fn retain_texture(&mut self, texture: Handle) -> Result<u32> {
        self.host.retain_texture(texture)
    }

    /// Straight-alpha RGBA8 surface as `(width, height, pixels)` in device pixels
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

impl_host_backend!(RasterBackend);
