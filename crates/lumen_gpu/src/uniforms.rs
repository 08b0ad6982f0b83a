//! Per-draw uniform block and vertex layout

use lumen_core::{Color, Mat3, Point, Rect};

/// One uniform block per draw call, bound at a 256-byte dynamic offset
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    /// Frame transform as a column-major mat4
    pub transform: [f32; 16],
    /// `[device_width, device_height, dpi_scale, flip_y]`
    pub viewport: [f32; 4],
    /// Local rectangle evaluated by the rounded-rect SDF
    pub rect: [f32; 4],
    pub color: [f32; 4],
    /// `[use_texture, opacity, radius, alpha_only]`
    pub params: [f32; 4],
}

pub const UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;

pub const fn align256(v: u64) -> u64 {
    (v + 255) & !255
}

/// Distance between consecutive uniform blocks in the frame buffer
pub const UNIFORM_STRIDE: u64 = align256(UNIFORM_SIZE);

/// How a draw samples its bound texture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sampling {
    /// Solid color; the default white texture is bound
    None,
    /// RGBA texel modulated by opacity
    Color,
    /// Red channel is coverage for the uniform color
    Coverage,
}

impl DrawUniforms {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transform: &Mat3,
        viewport: [f32; 4],
        rect: &Rect,
        color: Color,
        sampling: Sampling,
        opacity: f32,
        radius: f32,
    ) -> Self {
        let (use_texture, alpha_only) = match sampling {
            Sampling::None => (0.0, 0.0),
            Sampling::Color => (1.0, 0.0),
            Sampling::Coverage => (1.0, 1.0),
        };
        Self {
            transform: transform.to_mat4(),
            viewport,
            rect: [rect.x, rect.y, rect.width, rect.height],
            color: color.to_array(),
            params: [use_texture, opacity, radius, alpha_only],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            uv: [u, v],
        }
    }
}

/// Triangle-strip quad covering `rect` with `uv` spanning `[u0, v0, u1, v1]`
pub fn quad(rect: &Rect, uv: [f32; 4]) -> [Vertex; 4] {
    let [u0, v0, u1, v1] = uv;
    [
        Vertex::new(rect.x, rect.y, u0, v0),
        Vertex::new(rect.right(), rect.y, u1, v0),
        Vertex::new(rect.x, rect.bottom(), u0, v1),
        Vertex::new(rect.right(), rect.bottom(), u1, v1),
    ]
}

/// Strip for a butt-capped segment of the given thickness
pub fn line_quad(from: Point, to: Point, thickness: f32) -> Option<[Vertex; 4]> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 || thickness <= 0.0 {
        return None;
    }
    let half = thickness * 0.5;
    let (nx, ny) = (-dy / len * half, dx / len * half);
    Some([
        Vertex::new(from.x + nx, from.y + ny, 0.0, 0.0),
        Vertex::new(to.x + nx, to.y + ny, 1.0, 0.0),
        Vertex::new(from.x - nx, from.y - ny, 0.0, 1.0),
        Vertex::new(to.x - nx, to.y - ny, 1.0, 1.0),
    ])
}
