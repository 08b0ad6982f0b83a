//! Glyph outlines
//!
//! Font outlines are y-up in font units; [`glyph_path`] scales them to pixels and
//! flips them into the y-down frame space used everywhere else.

use lumen_core::{Path, PathCommand, Point};

struct GlyphOutline<'a> {
    path: &'a mut Path,
    x: f32,
    y: f32,
    scale: f32,
}

impl GlyphOutline<'_> {
    fn point(&self, gx: f32, gy: f32) -> Point {
        Point::new(self.x + gx * self.scale, self.y - gy * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.path.push(PathCommand::MoveTo(p));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.path.push(PathCommand::LineTo(p));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let control = self.point(x1, y1);
        let to = self.point(x, y);
        self.path.push(PathCommand::QuadTo { control, to });
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let control1 = self.point(x1, y1);
        let control2 = self.point(x2, y2);
        let to = self.point(x, y);
        self.path.push(PathCommand::CubicTo {
            control1,
            control2,
            to,
        });
    }

    fn close(&mut self) {
        self.path.push(PathCommand::Close);
    }
}

/// Append the outline of `glyph_id` with its origin at `(x, baseline)`.
/// Returns false for glyphs without an outline (spaces).
pub fn glyph_path(
    face: &ttf_parser::Face<'_>,
    glyph_id: u16,
    x: f32,
    baseline: f32,
    scale: f32,
    path: &mut Path,
) -> bool {
    let mut builder = GlyphOutline {
        path,
        x,
        y: baseline,
        scale,
    };
    face.outline_glyph(ttf_parser::GlyphId(glyph_id), &mut builder)
        .is_some()
}

/// Convert to a tiny-skia path. `None` when the path has no drawable segment.
pub fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for command in path.commands() {
        match *command {
            PathCommand::MoveTo(p) => pb.move_to(p.x, p.y),
            PathCommand::LineTo(p) => pb.line_to(p.x, p.y),
            PathCommand::QuadTo { control, to } => pb.quad_to(control.x, control.y, to.x, to.y),
            PathCommand::CubicTo {
                control1,
                control2,
                to,
            } => pb.cubic_to(
                control1.x, control1.y, control2.x, control2.y, to.x, to.y,
            ),
            PathCommand::Close => pb.close(),
        }
    }
    pb.finish()
}
