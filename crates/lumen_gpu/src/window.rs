//! Render targets behind GPU window handles

use std::any::Any;

use lumen_core::{Resource, ResourceKind, Result, TypedResource};

/// Format of offscreen window targets
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Device pixel size for a logical size at `dpi_scale`, at least 1x1
pub fn device_size(width: i32, height: i32, dpi_scale: f32) -> (u32, u32) {
    let w = (width as f32 * dpi_scale).round().max(1.0) as u32;
    let h = (height as f32 * dpi_scale).round().max(1.0) as u32;
    (w, h)
}

pub enum Target {
    /// Headless color target, readable with `read_pixels`
    Offscreen { texture: wgpu::Texture },
    /// Host-provided presentation surface
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
}

pub struct GpuWindow {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub dpi_scale: f32,
    pub visible: bool,
    pub target: Target,
}

impl std::fmt::Debug for GpuWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuWindow")
            .field("title", &self.title)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dpi_scale", &self.dpi_scale)
            .finish()
    }
}

pub fn offscreen_texture(device: &wgpu::Device, (width, height): (u32, u32)) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Lumen Window Target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Prefer a non-sRGB 8-bit format so blending matches the raster backends
pub fn surface_format(caps: &wgpu::SurfaceCapabilities) -> Option<wgpu::TextureFormat> {
    caps.formats
        .iter()
        .copied()
        .find(|f| {
            matches!(
                f,
                wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Bgra8Unorm
            )
        })
        .or_else(|| caps.formats.first().copied())
}

impl GpuWindow {
    pub fn device_size(&self) -> (u32, u32) {
        device_size(self.width, self.height, self.dpi_scale)
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match &self.target {
            Target::Offscreen { .. } => OFFSCREEN_FORMAT,
            Target::Surface { config, .. } => config.format,
        }
    }

    /// Resize the backing target when the logical size or DPI changed
    pub fn resize(&mut self, device: &wgpu::Device, width: i32, height: i32, dpi_scale: f32) {
        let unchanged = self.width == width && self.height == height && self.dpi_scale == dpi_scale;
        self.width = width;
        self.height = height;
        self.dpi_scale = dpi_scale;
        if unchanged {
            return;
        }
        let size = self.device_size();
        match &mut self.target {
            Target::Offscreen { texture } => {
                if (texture.width(), texture.height()) != size {
                    texture.destroy();
                    *texture = offscreen_texture(device, size);
                }
            }
            Target::Surface { surface, config } => {
                if (config.width, config.height) != size {
                    config.width = size.0;
                    config.height = size.1;
                    surface.configure(device, config);
                }
            }
        }
        tracing::trace!(width = size.0, height = size.1, "window target resized");
    }
}

impl Resource for GpuWindow {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Window
    }

    fn destroy(&mut self) -> Result<()> {
        if let Target::Offscreen { texture } = &self.target {
            texture.destroy();
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedResource for GpuWindow {
    const KIND: ResourceKind = ResourceKind::Window;
}
