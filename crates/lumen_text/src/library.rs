//! Font discovery and caching
//!
//! Uses fontdb to find faces by family, weight and style. Faces are cached by
//! fontdb id so every font created from the same face shares one copy of its data.

use std::sync::Arc;

use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use lumen_core::FontDesc;
use rustc_hash::FxHashMap;

use crate::font::{Font, FontFace};
use crate::Result;

/// Font database plus loaded faces
pub struct FontLibrary {
    db: Database,
    faces: FxHashMap<ID, FontFace>,
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl FontLibrary {
    /// Create a library and load system fonts
    pub fn new() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "font library loaded system fonts");
        Self {
            db,
            faces: FxHashMap::default(),
        }
    }

    /// Create a library with no faces; every font falls back to estimated metrics
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
            faces: FxHashMap::default(),
        }
    }

    /// Register font file data (TTF/OTF/TTC)
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Resolve a validated description to a font.
    ///
    /// Lookup order: the requested family, then the generic sans-serif family, then
    /// estimated metrics with a warning.
    pub fn resolve(&mut self, desc: &FontDesc) -> Result<Font> {
        let family = Family::Name(desc.family.as_str());
        let id = self
            .query(family, desc)
            .or_else(|| {
                let fallback = self.query(Family::SansSerif, desc);
                if fallback.is_some() {
                    tracing::warn!(family = %desc.family, "font family not found, using sans-serif");
                }
                fallback
            });

        let Some(id) = id else {
            tracing::warn!(family = %desc.family, "no font face available, using estimated metrics");
            return Ok(Font::estimated(desc.clone()));
        };
        let face = self.face(id)?;
        Ok(Font::new(desc.clone(), face))
    }

    fn query(&self, family: Family<'_>, desc: &FontDesc) -> Option<ID> {
        let families = [family];
        let mut query = Query {
            families: &families,
            weight: Weight(desc.weight.clamp(1, u16::MAX as i32) as u16),
            stretch: Stretch::Normal,
            style: if desc.italic {
                Style::Italic
            } else {
                Style::Normal
            },
        };
        let found = self.db.query(&query);
        if found.is_none() && desc.italic {
            query.style = Style::Oblique;
            return self.db.query(&query);
        }
        found
    }

    fn face(&mut self, id: ID) -> Result<FontFace> {
        if let Some(face) = self.faces.get(&id) {
            return Ok(face.clone());
        }
        let (data, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| crate::TextError::FontLoadError(format!("face {id:?} unreadable")))?;
        let face = FontFace::from_data(Arc::new(data), index)?;
        self.faces.insert(id, face.clone());
        tracing::trace!(?id, "font face loaded");
        Ok(face)
    }
}
