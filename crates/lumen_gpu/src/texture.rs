//! GPU texture resources

use std::any::Any;
use std::borrow::Cow;
use std::rc::Rc;

use lumen_core::{validate, GfxError, Resource, ResourceKind, Result, TextureFormat, TypedResource};

use crate::pipeline::Pipelines;

/// Bytes per row rounded up to `COPY_BYTES_PER_ROW_ALIGNMENT`
pub fn padded_bytes_per_row(row_bytes: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    row_bytes.div_ceil(align) * align
}

/// Copy tightly packed rows into a buffer with aligned row pitch
pub fn pad_rows(pixels: &[u8], row_bytes: usize, rows: usize) -> (Cow<'_, [u8]>, u32) {
    let padded = padded_bytes_per_row(row_bytes as u32) as usize;
    if padded == row_bytes {
        return (Cow::Borrowed(&pixels[..row_bytes * rows]), padded as u32);
    }
    let mut out = vec![0u8; padded * rows];
    for (row, src) in pixels.chunks_exact(row_bytes).take(rows).enumerate() {
        out[row * padded..row * padded + row_bytes].copy_from_slice(src);
    }
    (Cow::Owned(out), padded as u32)
}

pub fn wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Bgra8 => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::A8 => wgpu::TextureFormat::R8Unorm,
    }
}

/// A sampled texture with its bind group
pub struct GpuTexture {
    width: i32,
    height: i32,
    format: TextureFormat,
    texture: wgpu::Texture,
    bind_group: Rc<wgpu::BindGroup>,
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuTexture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}

impl GpuTexture {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &Pipelines,
        width: i32,
        height: i32,
        format: TextureFormat,
        pixels: Option<&[u8]>,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(GfxError::Range(format!(
                "texture size {width}x{height} must be positive"
            )));
        }
        let max = device.limits().max_texture_dimension_2d;
        if width as u32 > max || height as u32 > max {
            return Err(GfxError::Range(format!(
                "texture size {width}x{height} exceeds device limit {max}"
            )));
        }
        let needed = validate::byte_size(width, height, format.bytes_per_pixel())?;
        if let Some(pixels) = pixels {
            if pixels.len() < needed {
                return Err(GfxError::Range(format!(
                    "{} bytes supplied, {needed} required",
                    pixels.len()
                )));
            }
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Lumen Texture"),
            size: wgpu::Extent3d {
                width: width as u32,
                height: height as u32,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = Rc::new(pipelines.texture_bind_group(device, &view));

        let gpu = Self {
            width,
            height,
            format,
            texture,
            bind_group,
        };
        if let Some(pixels) = pixels {
            gpu.write(queue, 0, 0, width, height, pixels);
        }
        tracing::trace!(width, height, ?format, "gpu texture created");
        Ok(gpu)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn bind_group(&self) -> Rc<wgpu::BindGroup> {
        Rc::clone(&self.bind_group)
    }

    pub fn update(
        &self,
        queue: &wgpu::Queue,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pixels: &[u8],
    ) -> Result<()> {
        validate::texture_region(
            x,
            y,
            width,
            height,
            self.width,
            self.height,
            self.format.bytes_per_pixel(),
            pixels.len(),
        )?;
        self.write(queue, x, y, width, height, pixels);
        Ok(())
    }

    fn write(&self, queue: &wgpu::Queue, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) {
        let row_bytes = width as usize * self.format.bytes_per_pixel();
        let (data, bytes_per_row) = pad_rows(pixels, row_bytes, height as usize);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: x as u32,
                    y: y as u32,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height as u32),
            },
            wgpu::Extent3d {
                width: width as u32,
                height: height as u32,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl Resource for GpuTexture {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedResource for GpuTexture {
    const KIND: ResourceKind = ResourceKind::Texture;
}
