//! 2D canvas over a tiny-skia pixmap
//!
//! The pixmap is sized in device pixels. Drawing coordinates are frame space; the
//! canvas maps them through the frame transform and then the DPI scale. The clip is
//! kept as a mask rebuilt whenever the active clip rectangle changes.

use lumen_core::{Color, GfxError, Mat3, Path, Point, Rect, Result};
use lumen_text::outline::to_skia_path;
use tiny_skia::{
    FillRule, FilterQuality, LineCap, Mask, Paint, PathBuilder, Pattern, Pixmap, PixmapRef,
    Rect as SkiaRect, SpreadMode, Stroke, Transform,
};

/// Cubic approximation constant for quarter circles
const KAPPA: f32 = 0.552_284_8;

pub struct RasterCanvas {
    pixmap: Pixmap,
    dpi_scale: f32,
    user: Mat3,
    /// `dpi * user`
    transform: Transform,
    clip: Option<Mask>,
}

impl std::fmt::Debug for RasterCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterCanvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("dpi_scale", &self.dpi_scale)
            .field("clipped", &self.clip.is_some())
            .finish()
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width.max(1), height.max(1))
        .ok_or_else(|| GfxError::OutOfMemory(format!("{width}x{height} pixmap")))
}

/// Device-pixel size of a logical frame
pub fn device_size(width: i32, height: i32, dpi_scale: f32) -> (u32, u32) {
    let scale = |v: i32| ((v.max(0) as f32) * dpi_scale).round().max(1.0) as u32;
    (scale(width), scale(height))
}

pub(crate) fn skia_transform(m: &Mat3) -> Transform {
    Transform::from_row(m.m[0], m.m[1], m.m[3], m.m[4], m.m[6], m.m[7])
}

pub(crate) fn paint_for(color: Color) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Rounded rectangle with the radius clamped to half the shorter side
pub(crate) fn rounded_rect_path(rect: &Rect, radius: f32) -> Option<tiny_skia::Path> {
    let r = radius.min(rect.width * 0.5).min(rect.height * 0.5).max(0.0);
    if r <= 0.0 {
        return SkiaRect::from_xywh(rect.x, rect.y, rect.width, rect.height)
            .map(PathBuilder::from_rect);
    }
    let (x, y) = (rect.x, rect.y);
    let (right, bottom) = (rect.right(), rect.bottom());
    let k = r * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32, dpi_scale: f32) -> Result<Self> {
        Ok(Self {
            pixmap: new_pixmap(width, height)?,
            dpi_scale,
            user: Mat3::IDENTITY,
            transform: Transform::from_scale(dpi_scale, dpi_scale),
            clip: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Reallocate the pixmap if the device size changed. Returns whether it did.
    pub fn resize(&mut self, width: u32, height: u32, dpi_scale: f32) -> Result<bool> {
        let changed = width.max(1) != self.pixmap.width() || height.max(1) != self.pixmap.height();
        if changed {
            self.pixmap = new_pixmap(width, height)?;
            tracing::trace!(width, height, "raster surface resized");
        }
        self.dpi_scale = dpi_scale;
        self.clip = None;
        let user = self.user;
        self.set_transform(&user);
        Ok(changed)
    }

    pub fn set_transform(&mut self, transform: &Mat3) {
        self.user = *transform;
        self.transform =
            Transform::from_scale(self.dpi_scale, self.dpi_scale).pre_concat(skia_transform(transform));
    }

    /// Replace the clip with `rect` in frame space; `None` removes it.
    ///
    /// An empty rectangle masks out everything.
    pub fn set_clip(&mut self, rect: Option<Rect>) -> Result<()> {
        let Some(rect) = rect else {
            self.clip = None;
            return Ok(());
        };
        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())
            .ok_or_else(|| GfxError::OutOfMemory("clip mask".into()))?;
        let device = rect.scale(self.dpi_scale);
        if !device.is_empty() {
            if let Some(path) = SkiaRect::from_xywh(device.x, device.y, device.width, device.height)
                .map(PathBuilder::from_rect)
            {
                mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
            }
        }
        self.clip = Some(mask);
        Ok(())
    }

    /// Fill the whole surface, ignoring transform and clip
    pub fn clear(&mut self, color: Color) {
        let [r, g, b, a] = color.to_rgba8();
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    pub fn fill_rounded_rect(&mut self, rect: &Rect, radius: f32, color: Color) {
        if let Some(path) = rounded_rect_path(rect, radius) {
            self.pixmap.fill_path(
                &path,
                &paint_for(color),
                FillRule::Winding,
                self.transform,
                self.clip.as_ref(),
            );
        }
    }

    pub fn stroke_line(&mut self, from: Point, to: Point, thickness: f32, color: Color) {
        if thickness <= 0.0 {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: thickness,
                line_cap: LineCap::Butt,
                ..Default::default()
            };
            self.pixmap.stroke_path(
                &path,
                &paint_for(color),
                &stroke,
                self.transform,
                self.clip.as_ref(),
            );
        }
    }

    /// Non-zero winding fill
    pub fn fill_path(&mut self, path: &Path, color: Color) {
        if let Some(path) = to_skia_path(path) {
            self.pixmap.fill_path(
                &path,
                &paint_for(color),
                FillRule::Winding,
                self.transform,
                self.clip.as_ref(),
            );
        }
    }

    /// Draw the `src` region of `image` scaled into `dst`
    pub fn draw_image(&mut self, image: PixmapRef<'_>, src: &Rect, dst: &Rect, opacity: f32) {
        if src.is_empty() || dst.is_empty() {
            return;
        }
        let sx = dst.width / src.width;
        let sy = dst.height / src.height;
        let pattern_transform =
            Transform::from_row(sx, 0.0, 0.0, sy, dst.x - src.x * sx, dst.y - src.y * sy);
        let paint = Paint {
            shader: Pattern::new(
                image,
                SpreadMode::Pad,
                FilterQuality::Bilinear,
                opacity,
                pattern_transform,
            ),
            anti_alias: true,
            ..Default::default()
        };
        if let Some(rect) = SkiaRect::from_xywh(dst.x, dst.y, dst.width, dst.height) {
            self.pixmap
                .fill_rect(rect, &paint, self.transform, self.clip.as_ref());
        }
    }

    /// Straight-alpha RGBA8 pixel at device coordinates
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Whole surface as straight-alpha RGBA8, row-major
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn test_rounded_rect_fill() {
        let mut canvas = RasterCanvas::new(100, 100, 1.0).unwrap();
        canvas.clear(Color::WHITE);
        canvas.fill_rounded_rect(&Rect::new(5.0, 5.0, 10.0, 10.0), 2.0, Color::RED);
        assert_eq!(canvas.pixel(10, 10), Some(RED));
        assert_eq!(canvas.pixel(0, 0), Some(WHITE));
        // Rounded corner leaves the extreme corner pixel mostly uncovered
        assert_ne!(canvas.pixel(5, 5), Some(RED));
    }

    #[test]
    fn test_clip_mask() {
        let mut canvas = RasterCanvas::new(20, 20, 1.0).unwrap();
        canvas.clear(Color::WHITE);
        canvas.set_clip(Some(Rect::new(0.0, 0.0, 10.0, 20.0))).unwrap();
        canvas.fill_rounded_rect(&Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, Color::RED);
        assert_eq!(canvas.pixel(5, 5), Some(RED));
        assert_eq!(canvas.pixel(15, 5), Some(WHITE));

        canvas.set_clip(Some(Rect::new(3.0, 3.0, 0.0, 0.0))).unwrap();
        canvas.fill_rounded_rect(&Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, Color::BLUE);
        assert_eq!(canvas.pixel(5, 5), Some(RED));
    }

    #[test]
    fn test_transform_and_dpi() {
        let mut canvas = RasterCanvas::new(40, 40, 2.0).unwrap();
        canvas.clear(Color::WHITE);
        canvas.set_transform(&Mat3::translate(5.0, 0.0));
        canvas.fill_rounded_rect(&Rect::new(0.0, 0.0, 5.0, 5.0), 0.0, Color::RED);
        // Logical (5..10, 0..5) -> device (10..20, 0..10)
        assert_eq!(canvas.pixel(15, 5), Some(RED));
        assert_eq!(canvas.pixel(5, 5), Some(WHITE));
    }

    #[test]
    fn test_draw_image_region() {
        let mut image = Pixmap::new(2, 1).unwrap();
        image.fill(tiny_skia::Color::from_rgba8(0, 0, 255, 255));
        image.pixels_mut()[0] = tiny_skia::ColorU8::from_rgba(255, 0, 0, 255).premultiply();

        let mut canvas = RasterCanvas::new(10, 10, 1.0).unwrap();
        canvas.clear(Color::WHITE);
        canvas.draw_image(
            image.as_ref(),
            &Rect::new(1.0, 0.0, 1.0, 1.0),
            &Rect::new(0.0, 0.0, 10.0, 10.0),
            1.0,
        );
        let [r, _, b, _] = canvas.pixel(5, 5).unwrap();
        assert!(r < 5 && b > 250);
    }

    #[test]
    fn test_line_and_path() {
        let mut canvas = RasterCanvas::new(20, 20, 1.0).unwrap();
        canvas.clear(Color::WHITE);
        canvas.stroke_line(Point::new(0.0, 10.0), Point::new(20.0, 10.0), 4.0, Color::RED);
        assert_eq!(canvas.pixel(10, 10), Some(RED));

        let triangle = lumen_core::PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(8.0, 0.0)
            .line_to(0.0, 8.0)
            .close()
            .build();
        canvas.fill_path(&triangle, Color::BLUE);
        assert_eq!(canvas.pixel(1, 1), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(18, 2), Some(WHITE));
    }

    #[test]
    fn test_device_size() {
        assert_eq!(device_size(100, 50, 1.5), (150, 75));
        assert_eq!(device_size(1, 1, 0.25), (1, 1));
    }
}
