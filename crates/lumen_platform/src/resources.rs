//! Registry lookups for retained replay

use lumen_core::{Handle, Registry};
use lumen_paint::ReplayResources;
use lumen_raster::RasterTexture;
use lumen_text::Font;

/// Resolves recorded texture and font handles against a backend registry.
/// Destroyed or mistyped handles resolve to `None` and are skipped by replay.
pub struct RegistryResources<'a> {
    registry: &'a Registry,
}

impl<'a> RegistryResources<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }
}

impl ReplayResources for RegistryResources<'_> {
    type Texture = RasterTexture;
    type Font = Font;

    fn texture(&self, handle: Handle) -> Option<&RasterTexture> {
        self.registry.resolve::<RasterTexture>(handle).ok()
    }

    fn texture_size(texture: &RasterTexture) -> (i32, i32) {
        texture.size()
    }

    fn font(&self, handle: Handle) -> Option<&Font> {
        self.registry.resolve::<Font>(handle).ok()
    }
}
