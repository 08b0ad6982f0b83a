//! A8 coverage bitmaps of shaped runs
//!
//! Texture-based backends draw text by uploading a run's coverage as a
//! single-channel texture and tinting it with the text color.

use lumen_core::Point;
use tiny_skia::{FillRule, Mask, Transform};

use crate::font::Font;
use crate::outline::to_skia_path;
use crate::{Result, TextError};

/// Largest coverage edge, matching common GPU texture limits
pub const MAX_COVERAGE_EDGE: u32 = 8192;

/// Tightly packed one-byte-per-pixel coverage, top-left at the line box origin
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coverage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Coverage {
    /// Render `text` into a bitmap sized to its line box.
    ///
    /// `Ok(None)` when nothing would be drawn (empty text, estimated font, zero size).
    pub fn render(font: &Font, text: &str) -> Result<Option<Coverage>> {
        if text.is_empty() || font.is_estimated() {
            return Ok(None);
        }
        let metrics = font.measure(text)?;
        let width = metrics.width.ceil().max(0.0);
        let height = metrics.height.ceil().max(0.0);
        if width > MAX_COVERAGE_EDGE as f32 || height > MAX_COVERAGE_EDGE as f32 {
            return Err(TextError::RunTooLarge(format!("{width}x{height}")));
        }
        let (width, height) = (width as u32, height as u32);
        let Some(mut mask) = Mask::new(width, height) else {
            return Ok(None);
        };

        let path = font.run_path(text, Point::ZERO)?;
        let Some(skia_path) = to_skia_path(&path) else {
            return Ok(None);
        };
        mask.fill_path(&skia_path, FillRule::Winding, true, Transform::identity());

        Ok(Some(Coverage {
            width,
            height,
            data: mask.data().to_vec(),
        }))
    }
}
