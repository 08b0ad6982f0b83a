//! GPU setup errors

use lumen_core::GfxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    AdapterNotFound,

    #[error("Failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("Failed to acquire surface texture: {0}")]
    Acquire(#[from] wgpu::SurfaceError),

    #[error("Readback failed: {0}")]
    Readback(String),
}

impl From<GpuError> for GfxError {
    fn from(err: GpuError) -> Self {
        match err {
            GpuError::AdapterNotFound => GfxError::Unsupported(err.to_string()),
            _ => GfxError::Unknown(err.to_string()),
        }
    }
}
