//! The backend contract
//!
//! [`Gfx`] is the drawing surface every backend implements, [`TextBackend`] the
//! font side, and [`WindowSystem`] the window collaborator the pipeline consumes.
//! Callers see the same error kinds and coordinate semantics whichever backend
//! sits behind these traits.

use crate::color::Color;
use crate::error::{GfxError, Result};
use crate::geometry::Rect;
use crate::handle::Handle;
use crate::path::Path;
use crate::transform::Mat3;

/// Pixel layout of a texture; rows are tightly packed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Bgra8,
    /// Single-channel coverage
    A8,
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Rgba8 | TextureFormat::Bgra8 => 4,
            TextureFormat::A8 => 1,
        }
    }

    /// Decode the toolkit's numeric format tag
    pub fn from_raw(raw: u32) -> Result<Self> {
        match raw {
            1 => Ok(TextureFormat::Rgba8),
            2 => Ok(TextureFormat::Bgra8),
            3 => Ok(TextureFormat::A8),
            other => Err(GfxError::InvalidArgument(format!(
                "unknown texture format {other}"
            ))),
        }
    }
}

/// Font description a text backend resolves to a native face
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontDesc {
    pub family: String,
    pub size_px: i32,
    pub weight: i32,
    pub italic: bool,
}

impl FontDesc {
    pub fn new(family: impl Into<String>, size_px: i32, weight: i32, italic: bool) -> Self {
        Self {
            family: family.into(),
            size_px,
            weight,
            italic,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.family.trim().is_empty() {
            return Err(GfxError::InvalidArgument("empty font family".into()));
        }
        if self.size_px < 1 {
            return Err(GfxError::Range(format!(
                "font size {} must be >= 1",
                self.size_px
            )));
        }
        if !(100..=900).contains(&self.weight) {
            return Err(GfxError::Range(format!(
                "font weight {} outside 100..=900",
                self.weight
            )));
        }
        Ok(())
    }
}

/// Result of `measure_text`, in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
    /// Distance from the top of the line box to the baseline
    pub baseline: f32,
}

/// Parameters for creating a host window
#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    pub width: i32,
    pub height: i32,
    pub title: String,
    /// Record commands for host-driven replay; `None` uses the backend default
    pub retained: Option<bool>,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Lumen".to_string(),
            retained: None,
            resizable: true,
        }
    }
}

impl WindowConfig {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn retained(mut self, retained: bool) -> Self {
        self.retained = Some(retained);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(GfxError::Range(format!(
                "window size {}x{} must be positive",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Frame-bracketed 2D drawing
pub trait Gfx {
    fn begin_frame(&mut self, window: Handle, width: i32, height: i32, dpi_scale: f32)
        -> Result<()>;
    fn end_frame(&mut self, window: Handle) -> Result<()>;

    fn clear(&mut self, color: Color) -> Result<()>;
    fn draw_rect(&mut self, rect: &Rect, color: Color, corner_radius: f32) -> Result<()>;
    #[allow(clippy::too_many_arguments)]
    fn draw_line(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        color: Color,
        thickness: f32,
    ) -> Result<()>;
    fn draw_path(&mut self, path: &Path, color: Color) -> Result<()>;

    fn push_clip(&mut self, rect: &Rect) -> Result<()>;
    fn pop_clip(&mut self) -> Result<()>;
    /// `None` resets to identity
    fn set_transform(&mut self, transform: Option<&Mat3>) -> Result<()>;

    fn create_texture(
        &mut self,
        width: i32,
        height: i32,
        format: TextureFormat,
        pixels: Option<&[u8]>,
    ) -> Result<Handle>;
    #[allow(clippy::too_many_arguments)]
    fn update_texture(
        &mut self,
        texture: Handle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pixels: &[u8],
    ) -> Result<()>;
    fn destroy_texture(&mut self, texture: Handle) -> Result<()>;
    fn draw_texture(&mut self, texture: Handle, src: &Rect, dst: &Rect, opacity: f32)
        -> Result<()>;
}

/// Font creation, measurement and glyph-run drawing
pub trait TextBackend {
    fn create_font(&mut self, family: &str, size_px: i32, weight: i32, italic: bool)
        -> Result<Handle>;
    fn destroy_font(&mut self, font: Handle) -> Result<()>;
    fn measure_text(&mut self, font: Handle, utf8: &str) -> Result<TextMetrics>;
    fn draw_text(&mut self, font: Handle, utf8: &str, x: f32, y: f32, color: Color)
        -> Result<()>;
}

/// Host window collaborator. Event polling is owned by the host and not part of
/// this contract.
pub trait WindowSystem {
    fn create_window(&mut self, config: &WindowConfig) -> Result<Handle>;
    fn destroy_window(&mut self, window: Handle) -> Result<()>;
    fn show_window(&mut self, window: Handle) -> Result<()>;
    fn hide_window(&mut self, window: Handle) -> Result<()>;
    fn set_window_size(&mut self, window: Handle, width: i32, height: i32) -> Result<()>;
    fn window_size(&self, window: Handle) -> Result<(i32, i32)>;
    fn window_dpi_scale(&self, window: Handle) -> Result<f32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bpp() {
        assert_eq!(TextureFormat::Rgba8.bytes_per_pixel(), 4);
        assert_eq!(TextureFormat::Bgra8.bytes_per_pixel(), 4);
        assert_eq!(TextureFormat::A8.bytes_per_pixel(), 1);
        assert!(TextureFormat::from_raw(9).is_err());
    }

    #[test]
    fn test_font_desc_validation() {
        assert!(FontDesc::new("Roboto", 14, 400, false).validate().is_ok());
        assert!(matches!(
            FontDesc::new("", 14, 400, false).validate(),
            Err(GfxError::InvalidArgument(_))
        ));
        assert!(matches!(
            FontDesc::new("Roboto", 0, 400, false).validate(),
            Err(GfxError::Range(_))
        ));
        assert!(matches!(
            FontDesc::new("Roboto", 12, 950, false).validate(),
            Err(GfxError::Range(_))
        ));
    }

    #[test]
    fn test_window_config_builder() {
        let config = WindowConfig::new(320, 240).title("demo").retained(false);
        assert_eq!(config.retained, Some(false));
        assert!(config.validate().is_ok());
        assert!(WindowConfig::new(0, 10).validate().is_err());
    }
}
