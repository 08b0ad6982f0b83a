//! 3x3 affine transform
//!
//! Storage is column-major: `m[0]`/`m[1]` is the first column (x scale, y shear),
//! `m[3]`/`m[4]` the second (x shear, y scale), `m[6]`/`m[7]` the translation, and
//! `m[2]`/`m[5]`/`m[8]` the homogeneous row.

use crate::geometry::{Point, Rect};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3 {
    pub m: [f32; 9],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub const fn from_array(m: [f32; 9]) -> Self {
        Self { m }
    }

    pub const fn scale_translate(sx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Self {
            m: [sx, 0.0, 0.0, 0.0, sy, 0.0, tx, ty, 1.0],
        }
    }

    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::scale_translate(1.0, 1.0, tx, ty)
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::scale_translate(sx, sy, 0.0, 0.0)
    }

    pub fn rotate(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            m: [cos, sin, 0.0, -sin, cos, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// No rotation, shear or projection: only independent X/Y scale plus translation
    pub fn is_simple(&self) -> bool {
        let m = &self.m;
        m[1] == 0.0 && m[3] == 0.0 && m[2] == 0.0 && m[5] == 0.0 && m[8] == 1.0
    }

    pub fn scale_x(&self) -> f32 {
        self.m[0]
    }

    pub fn scale_y(&self) -> f32 {
        self.m[4]
    }

    pub fn transform_point(&self, p: Point) -> Point {
        let m = &self.m;
        Point::new(
            m[0] * p.x + m[3] * p.y + m[6],
            m[1] * p.x + m[4] * p.y + m[7],
        )
    }

    /// Axis-aligned rectangle spanning the two transformed diagonal corners.
    ///
    /// Exact for simple transforms; use [`Mat3::transform_rect_bounds`] otherwise.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let a = self.transform_point(Point::new(rect.x, rect.y));
        let b = self.transform_point(Point::new(rect.right(), rect.bottom()));
        Rect::from_points(a, b)
    }

    /// Bounding box of all four transformed corners
    pub fn transform_rect_bounds(&self, rect: &Rect) -> Rect {
        if self.is_simple() {
            return self.transform_rect(rect);
        }
        let corners = [
            Point::new(rect.x, rect.y),
            Point::new(rect.right(), rect.y),
            Point::new(rect.x, rect.bottom()),
            Point::new(rect.right(), rect.bottom()),
        ]
        .map(|c| self.transform_point(c));
        let mut bounds = Rect::from_points(corners[0], corners[3]);
        for corner in &corners[1..3] {
            bounds = bounds.union(&Rect::new(corner.x, corner.y, 0.0, 0.0));
        }
        bounds
    }

    /// Factor applied to corner radii recorded under this transform
    pub fn radius_scale(&self) -> f32 {
        self.m[0].abs().min(self.m[4].abs())
    }

    /// Factor applied to line thickness recorded under this transform
    pub fn thickness_scale(&self) -> f32 {
        (self.m[0].abs() + self.m[4].abs()) * 0.5
    }

    /// `self * other`: applies `other` first
    pub fn multiply(&self, other: &Mat3) -> Mat3 {
        let a = &self.m;
        let b = &other.m;
        let mut out = [0.0; 9];
        for col in 0..3 {
            for row in 0..3 {
                out[col * 3 + row] = a[row] * b[col * 3]
                    + a[3 + row] * b[col * 3 + 1]
                    + a[6 + row] * b[col * 3 + 2];
            }
        }
        Mat3 { m: out }
    }

    /// Column-major 4x4 embedding for GPU uniforms
    pub fn to_mat4(&self) -> [f32; 16] {
        let m = &self.m;
        let mut out = [0.0; 16];
        out[0] = m[0];
        out[1] = m[1];
        out[3] = m[2];
        out[4] = m[3];
        out[5] = m[4];
        out[7] = m[5];
        out[10] = 1.0;
        out[12] = m[6];
        out[13] = m[7];
        out[15] = m[8];
        out
    }
}
