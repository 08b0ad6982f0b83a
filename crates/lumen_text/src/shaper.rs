//! Text shaping using rustybuzz (HarfBuzz port)

use crate::font::FontFace;
use crate::{Result, TextError};

/// A positioned glyph, in pixels relative to the run origin on the baseline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    pub glyph_id: u16,
    pub x: f32,
    /// Offset above the baseline
    pub y: f32,
    pub advance: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapedRun {
    pub glyphs: Vec<ShapedGlyph>,
    /// Sum of advances
    pub width: f32,
}

/// Shape a single line of text. `scale` converts font units to pixels.
pub fn shape(face: &FontFace, text: &str, scale: f32) -> Result<ShapedRun> {
    if text.is_empty() {
        return Ok(ShapedRun::default());
    }
    let rb_face = rustybuzz::Face::from_slice(face.data(), face.index())
        .ok_or_else(|| TextError::FontParseError("rustybuzz rejected face".into()))?;

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    let output = rustybuzz::shape(&rb_face, &[], buffer);

    let mut glyphs = Vec::with_capacity(output.len());
    let mut pen = 0.0f32;
    for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
        let advance = pos.x_advance as f32 * scale;
        glyphs.push(ShapedGlyph {
            glyph_id: info.glyph_id as u16,
            x: pen + pos.x_offset as f32 * scale,
            y: pos.y_offset as f32 * scale,
            advance,
        });
        pen += advance;
    }

    Ok(ShapedRun {
        glyphs,
        width: pen,
    })
}
