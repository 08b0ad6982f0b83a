//! Lumen Text
//!
//! Text support shared by the Lumen backends:
//! - Font discovery by family, weight and style (fontdb)
//! - Text shaping (HarfBuzz via rustybuzz)
//! - Glyph outlines as [`lumen_core::Path`]s (ttf-parser)
//! - A8 coverage rendering of shaped runs for texture-based backends
//!
//! A [`Font`] resolved from a [`FontLibrary`] is a registry resource; backends
//! store it behind a handle and use it for `measure_text` and `draw_text`.

pub mod coverage;
pub mod font;
pub mod library;
pub mod outline;
pub mod shaper;

pub use coverage::Coverage;
pub use font::{Font, FontFace, FontMetrics};
pub use library::FontLibrary;
pub use shaper::{ShapedGlyph, ShapedRun};

use lumen_core::GfxError;
use thiserror::Error;

/// Text errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Failed to load font: {0}")]
    FontLoadError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Glyph run too large: {0}")]
    RunTooLarge(String),
}

pub type Result<T> = std::result::Result<T, TextError>;

impl From<TextError> for GfxError {
    fn from(err: TextError) -> Self {
        match err {
            TextError::FontLoadError(_) => GfxError::NotFound(err.to_string()),
            TextError::FontParseError(_) => GfxError::Unknown(err.to_string()),
            TextError::RunTooLarge(_) => GfxError::Range(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::ErrorKind;

    #[test]
    fn test_error_conversion() {
        let err: GfxError = TextError::FontLoadError("Roboto".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err: GfxError = TextError::RunTooLarge("1e9 px".into()).into();
        assert_eq!(err.kind(), ErrorKind::Range);
    }
}
