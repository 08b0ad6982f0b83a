//! Range checks shared by the draw primitives
//!
//! Every check runs before a primitive touches any state, so a rejected call has
//! no observable side effect.

use crate::color::Color;
use crate::error::{GfxError, Result};
use crate::geometry::Rect;

pub fn non_negative(what: &str, value: f32) -> Result<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(GfxError::range(format!("{what} {value} must be >= 0")))
    }
}

pub fn unit_interval(what: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GfxError::range(format!("{what} {value} outside [0, 1]")))
    }
}

/// Rectangle and fill color for `draw_rect` / `clear`
pub fn fill(rect: &Rect, color: &Color, radius: f32) -> Result<()> {
    rect.validate()?;
    non_negative("corner radius", radius)?;
    color.validate()
}

/// `draw_texture` arguments against a `width` x `height` texture
pub fn texture_quad(
    src: &Rect,
    dst: &Rect,
    opacity: f32,
    width: i32,
    height: i32,
) -> Result<()> {
    unit_interval("opacity", opacity)?;
    if !(src.width > 0.0 && src.height > 0.0) {
        return Err(GfxError::range("texture source must have a positive size"));
    }
    if !(dst.width > 0.0 && dst.height > 0.0) {
        return Err(GfxError::range("texture destination must have a positive size"));
    }
    if src.x < 0.0
        || src.y < 0.0
        || src.right() > width as f32
        || src.bottom() > height as f32
    {
        return Err(GfxError::range(format!(
            "source {src:?} exceeds {width}x{height} texture"
        )));
    }
    Ok(())
}

/// Sub-rectangle update of a `width` x `height` texture with `bpp` bytes per pixel.
///
/// Returns the number of bytes the update consumes.
#[allow(clippy::too_many_arguments)]
pub fn texture_region(
    x: i32,
    y: i32,
    region_width: i32,
    region_height: i32,
    width: i32,
    height: i32,
    bpp: usize,
    supplied: usize,
) -> Result<usize> {
    if x < 0 || y < 0 || region_width <= 0 || region_height <= 0 {
        return Err(GfxError::range(format!(
            "update region {x},{y} {region_width}x{region_height} is invalid"
        )));
    }
    if x > width - region_width || y > height - region_height {
        return Err(GfxError::range(format!(
            "update region {x},{y} {region_width}x{region_height} exceeds {width}x{height}"
        )));
    }
    let needed = byte_size(region_width, region_height, bpp)?;
    if supplied < needed {
        return Err(GfxError::range(format!(
            "{supplied} bytes supplied, {needed} required"
        )));
    }
    Ok(needed)
}

/// `width * height * bpp` with overflow detection
pub fn byte_size(width: i32, height: i32, bpp: usize) -> Result<usize> {
    let width = usize::try_from(width).map_err(|_| GfxError::range("negative width"))?;
    let height = usize::try_from(height).map_err(|_| GfxError::range("negative height"))?;
    width
        .checked_mul(height)
        .and_then(|px| px.checked_mul(bpp))
        .ok_or_else(|| GfxError::Overflow(format!("{width}x{height}x{bpp} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_quad_checks() {
        let full = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert!(texture_quad(&full, &full, 1.0, 4, 4).is_ok());
        assert!(texture_quad(&full, &full, 1.5, 4, 4).is_err());
        assert!(texture_quad(&Rect::new(1.0, 0.0, 4.0, 4.0), &full, 1.0, 4, 4).is_err());
        assert!(texture_quad(&full, &Rect::new(0.0, 0.0, 0.0, 2.0), 1.0, 4, 4).is_err());
    }

    #[test]
    fn test_texture_region_bounds() {
        assert_eq!(texture_region(0, 0, 2, 2, 4, 4, 4, 16).unwrap(), 16);
        assert!(texture_region(3, 0, 2, 2, 4, 4, 4, 16).is_err());
        assert!(texture_region(0, 0, 2, 2, 4, 4, 4, 15).is_err());
        assert!(texture_region(-1, 0, 2, 2, 4, 4, 4, 16).is_err());
    }

    #[test]
    fn test_byte_size_overflow() {
        assert!(matches!(
            byte_size(i32::MAX, i32::MAX, usize::MAX),
            Err(GfxError::Overflow(_))
        ));
        assert_eq!(byte_size(3, 2, 1).unwrap(), 6);
    }
}
