//! Font faces and resolved fonts

use std::any::Any;
use std::sync::Arc;

use lumen_core::{FontDesc, Path, Point, Resource, ResourceKind, TextMetrics, TypedResource};

use crate::outline;
use crate::shaper::{self, ShapedRun};
use crate::{Result, TextError};

/// Raw font file data plus the face index inside it
#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl FontFace {
    /// Parse the face header once to validate the data and cache its vertical metrics
    pub fn from_data(data: Arc<Vec<u8>>, index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|e| TextError::FontParseError(format!("face {index}: {e}")))?;
        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err(TextError::FontParseError("units_per_em is zero".into()));
        }
        let (ascender, descender, line_gap) = (face.ascender(), face.descender(), face.line_gap());
        Ok(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            line_gap,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub(crate) fn parse(&self) -> Result<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index)
            .map_err(|e| TextError::FontParseError(e.to_string()))
    }
}

/// Vertical metrics in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    /// Positive distance below the baseline
    pub descent: f32,
    pub line_gap: f32,
}

impl FontMetrics {
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }
}

/// A font description bound to a face at a pixel size.
///
/// A font with no face uses estimated metrics and draws nothing.
#[derive(Clone, Debug)]
pub struct Font {
    desc: FontDesc,
    face: Option<FontFace>,
    metrics: FontMetrics,
}

impl Font {
    pub fn new(desc: FontDesc, face: FontFace) -> Self {
        let scale = desc.size_px as f32 / face.units_per_em as f32;
        let metrics = FontMetrics {
            ascent: face.ascender as f32 * scale,
            descent: -(face.descender as f32) * scale,
            line_gap: face.line_gap as f32 * scale,
        };
        Self {
            desc,
            face: Some(face),
            metrics,
        }
    }

    /// Font without a face: half-em advances, ascent at 80% of the size
    pub fn estimated(desc: FontDesc) -> Self {
        let size = desc.size_px as f32;
        Self {
            desc,
            face: None,
            metrics: FontMetrics {
                ascent: size * 0.8,
                descent: size * 0.2,
                line_gap: 0.0,
            },
        }
    }

    pub fn desc(&self) -> &FontDesc {
        &self.desc
    }

    pub fn face(&self) -> Option<&FontFace> {
        self.face.as_ref()
    }

    pub fn is_estimated(&self) -> bool {
        self.face.is_none()
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn size_px(&self) -> f32 {
        self.desc.size_px as f32
    }

    fn scale(&self, face: &FontFace) -> f32 {
        self.size_px() / face.units_per_em as f32
    }

    pub fn shape(&self, text: &str) -> Result<ShapedRun> {
        match &self.face {
            Some(face) => shaper::shape(face, text, self.scale(face)),
            None => Ok(ShapedRun::default()),
        }
    }

    pub fn measure(&self, text: &str) -> Result<TextMetrics> {
        let width = match &self.face {
            Some(_) => self.shape(text)?.width,
            None => self.size_px() * text.chars().count() as f32 * 0.5,
        };
        Ok(TextMetrics {
            width,
            height: self.metrics.line_height(),
            baseline: self.metrics.ascent,
        })
    }

    /// Outline of the whole run with `origin` at the top-left of the line box
    pub fn run_path(&self, text: &str, origin: Point) -> Result<Path> {
        let mut path = Path::new();
        let Some(face) = &self.face else {
            return Ok(path);
        };
        let run = self.shape(text)?;
        let parsed = face.parse()?;
        let scale = self.scale(face);
        let baseline = origin.y + self.metrics.ascent;
        for glyph in &run.glyphs {
            outline::glyph_path(
                &parsed,
                glyph.glyph_id,
                origin.x + glyph.x,
                baseline - glyph.y,
                scale,
                &mut path,
            );
        }
        Ok(path)
    }
}

impl Resource for Font {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Font
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedResource for Font {
    const KIND: ResourceKind = ResourceKind::Font;
}
