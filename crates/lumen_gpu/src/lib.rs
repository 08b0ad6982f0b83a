//! Lumen GPU
//!
//! wgpu backend for the Lumen drawing contract:
//!
//! - One uniform block per draw (`transform`, `viewport`, `rect`, `color`, `params`)
//!   bound at a 256-byte dynamic offset
//! - Quads as 4-vertex triangle strips, filled paths as lyon triangle lists
//! - Clips as scissor rectangles in device pixels
//! - Text as transient A8 coverage textures tinted in the shader
//!
//! Windows render offscreen by default; hosts present through a window by handing
//! over a surface with [`GpuBackend::attach_surface`].

pub mod backend;
pub mod context;
pub mod draw;
pub mod error;
pub mod pipeline;
pub mod scissor;
pub mod shader;
pub mod tessellate;
pub mod texture;
pub mod uniforms;
pub mod window;

pub use backend::{bootstrap, GpuBackend, Readback};
pub use context::GpuContext;
pub use error::GpuError;
pub use scissor::{scissor_for, Scissor};
pub use texture::GpuTexture;
pub use uniforms::{DrawUniforms, Sampling, Vertex, UNIFORM_STRIDE};
