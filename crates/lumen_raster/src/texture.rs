//! CPU texture storage
//!
//! Pixels are kept premultiplied in a tiny-skia pixmap regardless of the upload
//! format. A8 textures become black coverage. A read-only native view is built on
//! first use for replay and dropped on every pixel update.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lumen_core::{
    validate, GfxError, Resource, ResourceKind, Result, TextureFormat, TypedResource,
};
use tiny_skia::{ColorU8, Pixmap};

pub struct RasterTexture {
    width: i32,
    height: i32,
    format: TextureFormat,
    storage: Pixmap,
    view: RefCell<Option<Rc<Pixmap>>>,
    views_built: Cell<u32>,
}

impl std::fmt::Debug for RasterTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterTexture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}

fn premultiplied(format: TextureFormat, px: &[u8]) -> tiny_skia::PremultipliedColorU8 {
    let color = match format {
        TextureFormat::Rgba8 => ColorU8::from_rgba(px[0], px[1], px[2], px[3]),
        TextureFormat::Bgra8 => ColorU8::from_rgba(px[2], px[1], px[0], px[3]),
        TextureFormat::A8 => ColorU8::from_rgba(0, 0, 0, px[0]),
    };
    color.premultiply()
}

impl RasterTexture {
    /// Create a texture, optionally filled with tightly packed `pixels`.
    pub fn new(
        width: i32,
        height: i32,
        format: TextureFormat,
        pixels: Option<&[u8]>,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(GfxError::Range(format!(
                "texture size {width}x{height} must be positive"
            )));
        }
        let needed = validate::byte_size(width, height, format.bytes_per_pixel())?;
        if let Some(pixels) = pixels {
            if pixels.len() < needed {
                return Err(GfxError::Range(format!(
                    "{} bytes supplied, {needed} required",
                    pixels.len()
                )));
            }
        }
        let storage = Pixmap::new(width as u32, height as u32)
            .ok_or_else(|| GfxError::OutOfMemory(format!("{width}x{height} texture")))?;

        let mut texture = Self {
            width,
            height,
            format,
            storage,
            view: RefCell::new(None),
            views_built: Cell::new(0),
        };
        if let Some(pixels) = pixels {
            texture.write(0, 0, width, height, pixels);
        }
        Ok(texture)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The backing pixel surface
    pub fn storage(&self) -> &Pixmap {
        &self.storage
    }

    /// Bounds-checked sub-rectangle update. Invalidates the cached view.
    pub fn update(&mut self, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) -> Result<()> {
        validate::texture_region(
            x,
            y,
            width,
            height,
            self.width,
            self.height,
            self.format.bytes_per_pixel(),
            pixels.len(),
        )?;
        self.write(x, y, width, height, pixels);
        Ok(())
    }

    /// Region already validated
    fn write(&mut self, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) {
        let bpp = self.format.bytes_per_pixel();
        let stride = self.width as usize;
        let row_bytes = width as usize * bpp;
        let format = self.format;
        let dst = self.storage.pixels_mut();
        for (row, src_row) in pixels.chunks_exact(row_bytes).take(height as usize).enumerate() {
            let start = (y as usize + row) * stride + x as usize;
            for (col, px) in src_row.chunks_exact(bpp).enumerate() {
                dst[start + col] = premultiplied(format, px);
            }
        }
        *self.view.get_mut() = None;
    }

    /// Shared read-only view for host replay; `None` for A8, which always takes
    /// the fallback path.
    pub fn native_view(&self) -> Option<Rc<Pixmap>> {
        if self.format == TextureFormat::A8 {
            return None;
        }
        let mut view = self.view.borrow_mut();
        if view.is_none() {
            *view = Some(Rc::new(self.storage.clone()));
            self.views_built.set(self.views_built.get() + 1);
            tracing::trace!(width = self.width, height = self.height, "texture view built");
        }
        view.clone()
    }

    /// Number of native views built so far
    pub fn views_built(&self) -> u32 {
        self.views_built.get()
    }
}

impl Resource for RasterTexture {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }

    fn destroy(&mut self) -> Result<()> {
        *self.view.get_mut() = None;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedResource for RasterTexture {
    const KIND: ResourceKind = ResourceKind::Texture;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_buffer_is_range() {
        let err = RasterTexture::new(4, 4, TextureFormat::Rgba8, Some(&[0u8; 63][..])).unwrap_err();
        assert!(matches!(err, GfxError::Range(_)));
        assert!(RasterTexture::new(0, 4, TextureFormat::A8, None).is_err());
    }

    #[test]
    fn test_bgra_is_swizzled() {
        let texture = RasterTexture::new(1, 1, TextureFormat::Bgra8, Some(&[10u8, 20, 30, 255][..])).unwrap();
        let px = texture.storage().pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (30, 20, 10));
    }

    #[test]
    fn test_update_bounds_and_view_invalidation() {
        let mut texture = RasterTexture::new(4, 4, TextureFormat::Rgba8, None).unwrap();
        let first = texture.native_view().unwrap();
        let again = texture.native_view().unwrap();
        assert!(Rc::ptr_eq(&first, &again));
        assert_eq!(texture.views_built(), 1);

        texture.update(2, 2, 2, 2, &[255u8; 16]).unwrap();
        let fresh = texture.native_view().unwrap();
        assert!(!Rc::ptr_eq(&first, &fresh));
        assert_eq!(texture.views_built(), 2);
        assert_eq!(fresh.pixel(3, 3).unwrap().alpha(), 255);
        assert_eq!(first.pixel(3, 3).unwrap().alpha(), 0);

        let err = texture.update(3, 3, 2, 2, &[0u8; 16]).unwrap_err();
        assert!(matches!(err, GfxError::Range(_)));
        let err = texture.update(0, 0, 2, 2, &[0u8; 15]).unwrap_err();
        assert!(matches!(err, GfxError::Range(_)));
    }

    #[test]
    fn test_a8_has_no_native_view() {
        let texture = RasterTexture::new(2, 2, TextureFormat::A8, Some(&[0u8, 64, 128, 255][..])).unwrap();
        assert!(texture.native_view().is_none());
        assert_eq!(texture.storage().pixel(1, 1).unwrap().alpha(), 255);
    }
}
