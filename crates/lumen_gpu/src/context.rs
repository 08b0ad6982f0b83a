//! Instance, adapter, device and queue

use std::sync::Arc;

use lumen_core::GpuConfig;

use crate::error::GpuError;

pub fn power_preference(config: &GpuConfig) -> wgpu::PowerPreference {
    match config.power_preference.as_str() {
        "high" => wgpu::PowerPreference::HighPerformance,
        _ => wgpu::PowerPreference::LowPower,
    }
}

pub fn present_mode(config: &GpuConfig) -> wgpu::PresentMode {
    match config.present_mode.as_str() {
        "immediate" => wgpu::PresentMode::Immediate,
        "mailbox" => wgpu::PresentMode::Mailbox,
        _ => wgpu::PresentMode::Fifo,
    }
}

/// Shared GPU objects. Cloning shares the same device.
#[derive(Clone)]
pub struct GpuContext {
    pub instance: Arc<wgpu::Instance>,
    pub adapter: Arc<wgpu::Adapter>,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Request an adapter able to present to `surface` (if any) and open a device
    pub async fn new(
        instance: wgpu::Instance,
        config: &GpuConfig,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power_preference(config),
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::AdapterNotFound)?;

        let info = adapter.get_info();
        tracing::info!(
            "gpu adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Lumen GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        Ok(Self {
            instance: Arc::new(instance),
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Headless context, blocking on adapter and device requests
    pub fn headless(config: &GpuConfig) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        pollster::block_on(Self::new(instance, config, None))
    }
}
