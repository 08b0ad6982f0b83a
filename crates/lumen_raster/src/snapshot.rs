//! Snapshot sink painting into a raster canvas
//!
//! Hosts that hand us a raster snapshot during their paint callback get the
//! recorded commands executed here. Coordinates arrive in frame space with the
//! transform already applied, so the canvas only applies the DPI scale.

use std::rc::Rc;

use lumen_core::{Color, Mat3, Path, Point, Rect};
use lumen_paint::SnapshotSink;
use lumen_text::Font;
use tiny_skia::Pixmap;

use crate::canvas::RasterCanvas;
use crate::texture::RasterTexture;

pub struct RasterSnapshot<'a> {
    canvas: &'a mut RasterCanvas,
    clips: Vec<Rect>,
    native_textures: bool,
}

impl<'a> RasterSnapshot<'a> {
    /// `native_textures` selects cached texture views over drawing from storage
    pub fn new(canvas: &'a mut RasterCanvas, native_textures: bool) -> Self {
        canvas.set_transform(&Mat3::IDENTITY);
        if let Err(err) = canvas.set_clip(None) {
            tracing::warn!("snapshot clip reset failed: {err}");
        }
        Self {
            canvas,
            clips: Vec::new(),
            native_textures,
        }
    }

    fn apply_clip(&mut self) {
        if let Err(err) = self.canvas.set_clip(self.clips.last().copied()) {
            tracing::warn!("snapshot clip failed: {err}");
        }
    }
}

impl SnapshotSink<RasterTexture, Font> for RasterSnapshot<'_> {
    fn push_clip(&mut self, rect: Rect) {
        let clip = match self.clips.last() {
            Some(top) => top
                .intersect(&rect)
                .unwrap_or(Rect::new(rect.x, rect.y, 0.0, 0.0)),
            None => rect,
        };
        self.clips.push(clip);
        self.apply_clip();
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
        self.apply_clip();
    }

    fn append_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        self.canvas.fill_rounded_rect(&rect, radius, color);
    }

    fn append_color(&mut self, rect: Rect, color: Color) {
        self.canvas.fill_rounded_rect(&rect, 0.0, color);
    }

    fn append_stroke(&mut self, from: Point, to: Point, thickness: f32, color: Color) {
        self.canvas.stroke_line(from, to, thickness, color);
    }

    fn append_fill(&mut self, path: &Path, _bounds: Rect, color: Color) {
        self.canvas.fill_path(path, color);
    }

    fn append_texture(&mut self, texture: &RasterTexture, src: Rect, dst: Rect, opacity: f32) {
        let view: Option<Rc<Pixmap>> = if self.native_textures {
            texture.native_view()
        } else {
            None
        };
        match view {
            Some(view) => {
                let pixmap: &Pixmap = &view;
                self.canvas.draw_image(pixmap.as_ref(), &src, &dst, opacity);
            }
            None => self
                .canvas
                .draw_image(texture.storage().as_ref(), &src, &dst, opacity),
        }
    }

    fn append_text(&mut self, font: &Font, text: &str, origin: Point, color: Color) {
        match font.run_path(text, origin) {
            Ok(path) => self.canvas.fill_path(&path, color),
            Err(err) => tracing::debug!("glyph run skipped: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::TextureFormat;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn test_nested_clips_intersect() {
        let mut canvas = RasterCanvas::new(60, 60, 1.0).unwrap();
        canvas.clear(Color::WHITE);
        let mut sink = RasterSnapshot::new(&mut canvas, true);
        sink.push_clip(Rect::new(0.0, 0.0, 50.0, 50.0));
        sink.push_clip(Rect::new(40.0, 40.0, 20.0, 20.0));
        sink.append_color(Rect::new(0.0, 0.0, 60.0, 60.0), Color::RED);
        sink.pop_clip();
        sink.pop_clip();
        sink.append_color(Rect::new(0.0, 0.0, 2.0, 2.0), Color::RED);

        assert_eq!(canvas.pixel(45, 45), Some(RED));
        assert_eq!(canvas.pixel(55, 55), Some(WHITE));
        assert_eq!(canvas.pixel(20, 20), Some(WHITE));
        assert_eq!(canvas.pixel(1, 1), Some(RED));
    }

    #[test]
    fn test_texture_paths_agree() {
        let red = [255u8, 0, 0, 255].repeat(4);
        let texture = RasterTexture::new(2, 2, TextureFormat::Rgba8, Some(red.as_slice())).unwrap();
        let src = Rect::new(0.0, 0.0, 2.0, 2.0);
        let dst = Rect::new(0.0, 0.0, 8.0, 8.0);

        let mut native = RasterCanvas::new(8, 8, 1.0).unwrap();
        RasterSnapshot::new(&mut native, true).append_texture(&texture, src, dst, 1.0);
        assert_eq!(texture.views_built(), 1);

        let mut fallback = RasterCanvas::new(8, 8, 1.0).unwrap();
        RasterSnapshot::new(&mut fallback, false).append_texture(&texture, src, dst, 1.0);
        assert_eq!(texture.views_built(), 1);

        assert_eq!(native.pixel(4, 4), Some(RED));
        assert_eq!(native.to_rgba8(), fallback.to_rgba8());
    }
}
