//! GPU backend
//!
//! Implements the drawing contract on wgpu. Draw calls are recorded into a
//! [`DrawList`] while the frame is open and encoded into a single render pass at
//! `end_frame`, one draw call per primitive with its own uniform slot and scissor.

use std::rc::Rc;

use lumen_core::{
    validate, BackendConfig, Color, FontDesc, FrameState, Gfx, GfxError, Handle, HostBootstrap,
    Mat3, Path, Point, Rect, Registry, Result, TextBackend, TextMetrics, TextureFormat,
    WindowConfig, WindowSystem,
};
use lumen_text::{Coverage, Font, FontLibrary};

use crate::context::{present_mode, GpuContext};
use crate::draw::{DrawList, Geometry};
use crate::error::GpuError;
use crate::pipeline::Pipelines;
use crate::scissor::{scissor_for, Scissor};
use crate::tessellate;
use crate::texture::{padded_bytes_per_row, GpuTexture};
use crate::uniforms::{line_quad, quad, DrawUniforms, Sampling, Vertex, UNIFORM_STRIDE};
use crate::window::{device_size, offscreen_texture, surface_format, GpuWindow, Target};

static BOOTSTRAP: HostBootstrap = HostBootstrap::new("gpu");

/// Process-wide bootstrap shared by every GPU backend
pub fn bootstrap() -> &'static HostBootstrap {
    &BOOTSTRAP
}

const FULL_UV: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const MIN_VERTEX_BYTES: u64 = 64 * 1024;
const MIN_INDEX_BYTES: u64 = 16 * 1024;

/// RGBA8 pixels read back from an offscreen window
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Readback {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Readback {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let px = self.pixels.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

fn create_buffer(device: &wgpu::Device, label: &str, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub struct GpuBackend {
    config: BackendConfig,
    context: GpuContext,
    pipelines: Pipelines,
    registry: Registry,
    frame: FrameState,
    fonts: FontLibrary,
    draws: DrawList,

    white_texture: wgpu::Texture,
    white: Rc<wgpu::BindGroup>,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_slots: usize,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,

    /// Glyph coverage textures alive until the frame is submitted
    transient: Vec<GpuTexture>,
    acquired: Option<wgpu::SurfaceTexture>,
    shut_down: bool,
}

impl GpuBackend {
    /// Create a backend on a headless device
    pub fn new(config: BackendConfig) -> Result<Self> {
        config.validate()?;
        let context = GpuContext::headless(&config.gpu)?;
        Self::with_context(config, context)
    }

    /// Create a backend sharing an existing device
    pub fn with_context(config: BackendConfig, context: GpuContext) -> Result<Self> {
        Self::with_fonts(config, context, FontLibrary::new())
    }

    pub fn with_fonts(config: BackendConfig, context: GpuContext, fonts: FontLibrary) -> Result<Self> {
        config.validate()?;
        BOOTSTRAP.acquire(|| Ok(()))?;

        let device = &context.device;
        let pipelines = Pipelines::new(device);

        let white_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Lumen White Texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        context.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &white_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255u8; 4],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let white_view = white_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let white = Rc::new(pipelines.texture_bind_group(device, &white_view));

        let uniform_slots = config.gpu.max_draws_per_frame;
        let uniform_buffer = create_buffer(
            device,
            "Lumen Uniform Buffer",
            uniform_slots as u64 * UNIFORM_STRIDE,
            wgpu::BufferUsages::UNIFORM,
        );
        let uniform_bind_group = pipelines.uniform_bind_group(device, &uniform_buffer);
        let vertex_buffer = create_buffer(
            device,
            "Lumen Vertex Buffer",
            MIN_VERTEX_BYTES,
            wgpu::BufferUsages::VERTEX,
        );
        let index_buffer = create_buffer(
            device,
            "Lumen Index Buffer",
            MIN_INDEX_BYTES,
            wgpu::BufferUsages::INDEX,
        );

        tracing::debug!(uniform_slots, "gpu backend created");
        Ok(Self {
            registry: Registry::with_capacity(config.handle_capacity),
            config,
            context,
            pipelines,
            frame: FrameState::new(),
            fonts,
            draws: DrawList::default(),
            white_texture,
            white,
            uniform_buffer,
            uniform_bind_group,
            uniform_slots,
            vertex_buffer,
            index_buffer,
            transient: Vec::new(),
            acquired: None,
            shut_down: false,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn fonts_mut(&mut self) -> &mut FontLibrary {
        &mut self.fonts
    }

    fn log_op(&self, op: &'static str) {
        if self.config.enable_logging {
            tracing::debug!(op, "gpu");
        }
    }

    /// Present `window` through a host surface instead of its offscreen target
    pub fn attach_surface(&mut self, window: Handle, surface: wgpu::Surface<'static>) -> Result<()> {
        self.log_op("gpu.attach_surface");
        if matches!(self.frame.active(), Ok(frame) if frame.window == window) {
            return Err(GfxError::State("attach_surface during the window's frame".into()));
        }
        let caps = surface.get_capabilities(&self.context.adapter);
        let format = surface_format(&caps)
            .ok_or_else(|| GfxError::Unsupported("surface reports no formats".into()))?;
        let wanted = present_mode(&self.config.gpu);
        let present_mode = if caps.present_modes.contains(&wanted) {
            wanted
        } else {
            wgpu::PresentMode::Fifo
        };
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let device = &self.context.device;
        let win = self.registry.resolve_mut::<GpuWindow>(window)?;
        let (width, height) = win.device_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(device, &config);
        if let Target::Offscreen { texture } = &win.target {
            texture.destroy();
        }
        win.target = Target::Surface { surface, config };
        self.pipelines.ensure_target(device, format);
        tracing::debug!(%window, ?format, ?present_mode, "surface attached");
        Ok(())
    }

    /// Add a reference to a texture; `destroy_texture` drops one
    pub fn retain_texture(&mut self, texture: Handle) -> Result<u32> {
        self.registry.resolve::<GpuTexture>(texture)?;
        self.registry.retain(texture)
    }

    /// Copy an offscreen window's last frame back to the CPU
    pub fn read_pixels(&self, window: Handle) -> Result<Readback> {
        self.log_op("gpu.read_pixels");
        let win = self.registry.resolve::<GpuWindow>(window)?;
        let Target::Offscreen { texture } = &win.target else {
            return Err(GfxError::Unsupported("read_pixels on a surface window".into()));
        };
        let (width, height) = (texture.width(), texture.height());
        let row_bytes = width * 4;
        let bytes_per_row = padded_bytes_per_row(row_bytes);
        let device = &self.context.device;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen Readback"),
            size: bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Lumen Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.context.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|err| GpuError::Readback(err.to_string()))?
            .map_err(|err| GpuError::Readback(err.to_string()))?;

        let mut pixels = Vec::with_capacity((row_bytes * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks_exact(bytes_per_row as usize).take(height as usize) {
                pixels.extend_from_slice(&row[..row_bytes as usize]);
            }
        }
        buffer.unmap();
        Ok(Readback {
            width,
            height,
            pixels,
        })
    }

    /// Release every resource and the bootstrap reference. Safe to call twice.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        if let Some(frame) = self.frame.abort() {
            tracing::warn!(window = %frame.window, "gpu backend destroyed inside a frame");
        }
        self.acquired = None;
        self.draws.reset();
        self.transient.clear();
        let destroyed = self.registry.destroy_all();
        self.white_texture.destroy();
        let released = BOOTSTRAP.release(|| Ok(()));
        tracing::debug!("gpu backend destroyed");
        destroyed.and(released)
    }

    fn viewport(&self, frame_size: (i32, i32), dpi_scale: f32) -> [f32; 4] {
        let (w, h) = device_size(frame_size.0, frame_size.1, dpi_scale);
        [w as f32, h as f32, dpi_scale, 0.0]
    }

    /// Uniforms and scissor for the next draw; `None` when fully clipped out
    fn prepare(
        &self,
        local: &Rect,
        color: Color,
        sampling: Sampling,
        opacity: f32,
        radius: f32,
    ) -> Result<Option<(DrawUniforms, Scissor)>> {
        let frame = *self.frame.active()?;
        let device = device_size(frame.width, frame.height, frame.dpi_scale);
        let Some(scissor) = scissor_for(self.frame.clip(), frame.dpi_scale, device, false) else {
            return Ok(None);
        };
        let uniforms = DrawUniforms::new(
            self.frame.transform(),
            self.viewport((frame.width, frame.height), frame.dpi_scale),
            local,
            color,
            sampling,
            opacity,
            radius,
        );
        Ok(Some((uniforms, scissor)))
    }

    #[allow(clippy::too_many_arguments)]
    fn push_quad(
        &mut self,
        local: &Rect,
        vertices: [Vertex; 4],
        color: Color,
        sampling: Sampling,
        opacity: f32,
        radius: f32,
        bind_group: Option<Rc<wgpu::BindGroup>>,
    ) -> Result<()> {
        let Some((uniforms, scissor)) = self.prepare(local, color, sampling, opacity, radius)? else {
            return Ok(());
        };
        let bind_group = bind_group.unwrap_or_else(|| Rc::clone(&self.white));
        self.draws.push_quad(uniforms, vertices, bind_group, scissor);
        Ok(())
    }

    fn grow_buffers(&mut self) {
        let device = &self.context.device;

        let slots = self.draws.uniforms.len();
        if slots > self.uniform_slots {
            self.uniform_slots = slots.next_power_of_two();
            self.uniform_buffer = create_buffer(
                device,
                "Lumen Uniform Buffer",
                self.uniform_slots as u64 * UNIFORM_STRIDE,
                wgpu::BufferUsages::UNIFORM,
            );
            self.uniform_bind_group = self.pipelines.uniform_bind_group(device, &self.uniform_buffer);
            tracing::debug!(slots = self.uniform_slots, "uniform buffer grown");
        }

        let vertex_bytes = std::mem::size_of_val(self.draws.vertices.as_slice()) as u64;
        if vertex_bytes > self.vertex_buffer.size() {
            self.vertex_buffer = create_buffer(
                device,
                "Lumen Vertex Buffer",
                vertex_bytes.next_power_of_two(),
                wgpu::BufferUsages::VERTEX,
            );
        }

        let index_bytes = std::mem::size_of_val(self.draws.indices.as_slice()) as u64;
        if index_bytes > self.index_buffer.size() {
            self.index_buffer = create_buffer(
                device,
                "Lumen Index Buffer",
                index_bytes.next_power_of_two(),
                wgpu::BufferUsages::INDEX,
            );
        }
    }

    fn upload(&mut self) {
        self.grow_buffers();
        let queue = &self.context.queue;
        if !self.draws.uniforms.is_empty() {
            queue.write_buffer(&self.uniform_buffer, 0, &self.draws.uniform_bytes());
        }
        if !self.draws.vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.draws.vertices));
        }
        if !self.draws.indices.is_empty() {
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.draws.indices));
        }
    }

    /// Encode the recorded draws into one pass on the window target and submit
    fn submit(&mut self, window: Handle, acquired: Option<wgpu::SurfaceTexture>) -> Result<()> {
        self.upload();

        let win = self.registry.resolve::<GpuWindow>(window)?;
        let view = match (&acquired, &win.target) {
            (Some(frame), _) => frame.texture.create_view(&wgpu::TextureViewDescriptor::default()),
            (None, Target::Offscreen { texture }) => {
                texture.create_view(&wgpu::TextureViewDescriptor::default())
            }
            (None, Target::Surface { .. }) => {
                return Err(GfxError::Unknown("surface frame has no acquired texture".into()));
            }
        };
        let format = win.format();
        let targets = self
            .pipelines
            .target(format)
            .ok_or_else(|| GfxError::Unknown(format!("no pipelines for {format:?}")))?;

        let load = match self.draws.clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: (c.r * c.a) as f64,
                g: (c.g * c.a) as f64,
                b: (c.b * c.a) as f64,
                a: c.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lumen Frame Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lumen Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            for draw in &self.draws.draws {
                pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset()]);
                pass.set_bind_group(1, draw.bind_group.as_ref(), &[]);
                let s = draw.scissor;
                pass.set_scissor_rect(s.x, s.y, s.width, s.height);
                match draw.geometry {
                    Geometry::Quad { first_vertex } => {
                        pass.set_pipeline(&targets.quad);
                        pass.draw(first_vertex..first_vertex + 4, 0..1);
                    }
                    Geometry::Mesh {
                        base_vertex,
                        first_index,
                        index_count,
                    } => {
                        pass.set_pipeline(&targets.mesh);
                        pass.draw_indexed(first_index..first_index + index_count, base_vertex, 0..1);
                    }
                }
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        if let Some(frame) = acquired {
            frame.present();
        }
        tracing::trace!(draws = self.draws.len(), "frame submitted");
        Ok(())
    }
}

impl Drop for GpuBackend {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!("gpu backend teardown: {err}");
        }
    }
}

impl Gfx for GpuBackend {
    fn begin_frame(&mut self, window: Handle, width: i32, height: i32, dpi_scale: f32) -> Result<()> {
        self.log_op("gfx.begin_frame");
        self.frame.check_begin(width, height, dpi_scale)?;
        let dpi_scale = self.config.dpi_override.unwrap_or(dpi_scale);

        let device = &self.context.device;
        let win = self.registry.resolve_mut::<GpuWindow>(window)?;
        win.resize(device, width, height, dpi_scale);
        let format = win.format();
        let acquired = match &win.target {
            Target::Surface { surface, .. } => {
                Some(surface.get_current_texture().map_err(GpuError::from)?)
            }
            Target::Offscreen { .. } => None,
        };
        self.pipelines.ensure_target(device, format);

        self.frame.begin(window, width, height, dpi_scale, false)?;
        self.draws.reset();
        self.acquired = acquired;
        Ok(())
    }

    fn end_frame(&mut self, window: Handle) -> Result<()> {
        self.log_op("gfx.end_frame");
        let ended = self.frame.end(window);
        let acquired = self.acquired.take();
        let result = ended.and_then(|frame| self.submit(frame.window, acquired));
        self.draws.reset();
        self.transient.clear();
        result
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.log_op("gfx.clear");
        color.validate()?;
        self.frame.active()?;
        self.draws.clear(color);
        Ok(())
    }

    fn draw_rect(&mut self, rect: &Rect, color: Color, corner_radius: f32) -> Result<()> {
        self.log_op("gfx.draw_rect");
        validate::fill(rect, &color, corner_radius)?;
        self.frame.active()?;
        if rect.is_empty() {
            return Ok(());
        }
        self.push_quad(
            rect,
            quad(rect, FULL_UV),
            color,
            Sampling::None,
            1.0,
            corner_radius,
            None,
        )
    }

    fn draw_line(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        color: Color,
        thickness: f32,
    ) -> Result<()> {
        self.log_op("gfx.draw_line");
        validate::non_negative("line thickness", thickness)?;
        color.validate()?;
        self.frame.active()?;
        if thickness == 0.0 {
            return Ok(());
        }
        let (from, to) = (Point::new(x0, y0), Point::new(x1, y1));
        if x0 == x1 || y0 == y1 {
            let half = thickness * 0.5;
            let span = Rect::from_points(from, to);
            let rect = Rect::new(
                span.x - half,
                span.y - half,
                span.width + thickness,
                span.height + thickness,
            );
            return self.push_quad(&rect, quad(&rect, FULL_UV), color, Sampling::None, 1.0, 0.0, None);
        }
        let Some(vertices) = line_quad(from, to, thickness) else {
            return Ok(());
        };
        let bounds = Rect::from_points(from, to).inflate(thickness);
        self.push_quad(&bounds, vertices, color, Sampling::None, 1.0, 0.0, None)
    }

    fn draw_path(&mut self, path: &Path, color: Color) -> Result<()> {
        self.log_op("gfx.draw_path");
        color.validate()?;
        self.frame.active()?;
        let Some(bounds) = path.bounds() else {
            return Ok(());
        };
        let mesh = tessellate::fill(path);
        if mesh.is_empty() {
            return Ok(());
        }
        let Some((uniforms, scissor)) = self.prepare(&bounds, color, Sampling::None, 1.0, 0.0)? else {
            return Ok(());
        };
        let white = Rc::clone(&self.white);
        self.draws.push_mesh(uniforms, &mesh, white, scissor);
        Ok(())
    }

    fn push_clip(&mut self, rect: &Rect) -> Result<()> {
        self.log_op("gfx.push_clip");
        self.frame.push_clip(rect).map(|_| ())
    }

    fn pop_clip(&mut self) -> Result<()> {
        self.log_op("gfx.pop_clip");
        self.frame.pop_clip()
    }

    fn set_transform(&mut self, transform: Option<&Mat3>) -> Result<()> {
        self.log_op("gfx.set_transform");
        self.frame.set_transform(transform)
    }

    fn create_texture(
        &mut self,
        width: i32,
        height: i32,
        format: TextureFormat,
        pixels: Option<&[u8]>,
    ) -> Result<Handle> {
        self.log_op("gfx.create_texture");
        let texture = GpuTexture::new(
            &self.context.device,
            &self.context.queue,
            &self.pipelines,
            width,
            height,
            format,
            pixels,
        )?;
        self.registry.register(Box::new(texture))
    }

    fn update_texture(
        &mut self,
        texture: Handle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pixels: &[u8],
    ) -> Result<()> {
        self.log_op("gfx.update_texture");
        let queue = &self.context.queue;
        self.registry
            .resolve::<GpuTexture>(texture)?
            .update(queue, x, y, width, height, pixels)
    }

    fn destroy_texture(&mut self, texture: Handle) -> Result<()> {
        self.log_op("gfx.destroy_texture");
        self.registry.resolve::<GpuTexture>(texture)?;
        self.registry.release(texture).map(|_| ())
    }

    fn draw_texture(&mut self, texture: Handle, src: &Rect, dst: &Rect, opacity: f32) -> Result<()> {
        self.log_op("gfx.draw_texture");
        let resolved = self.registry.resolve::<GpuTexture>(texture)?;
        let (width, height) = resolved.size();
        validate::texture_quad(src, dst, opacity, width, height)?;
        self.frame.active()?;

        let (sampling, color) = match resolved.format() {
            TextureFormat::A8 => (Sampling::Coverage, Color::BLACK),
            _ => (Sampling::Color, Color::WHITE),
        };
        let bind_group = resolved.bind_group();
        let (w, h) = (width as f32, height as f32);
        let uv = [src.x / w, src.y / h, src.right() / w, src.bottom() / h];
        self.push_quad(dst, quad(dst, uv), color, sampling, opacity, 0.0, Some(bind_group))
    }
}

impl TextBackend for GpuBackend {
    fn create_font(&mut self, family: &str, size_px: i32, weight: i32, italic: bool) -> Result<Handle> {
        self.log_op("text.create_font");
        let desc = FontDesc::new(family, size_px, weight, italic);
        desc.validate()?;
        let font = self.fonts.resolve(&desc)?;
        self.registry.register(Box::new(font))
    }

    fn destroy_font(&mut self, font: Handle) -> Result<()> {
        self.log_op("text.destroy_font");
        self.registry.resolve::<Font>(font)?;
        self.registry.release(font).map(|_| ())
    }

    fn measure_text(&mut self, font: Handle, utf8: &str) -> Result<TextMetrics> {
        self.log_op("text.measure_text");
        Ok(self.registry.resolve::<Font>(font)?.measure(utf8)?)
    }

    fn draw_text(&mut self, font: Handle, utf8: &str, x: f32, y: f32, color: Color) -> Result<()> {
        self.log_op("text.draw_text");
        color.validate()?;
        self.frame.active()?;
        let resolved = self.registry.resolve::<Font>(font)?;
        let Some(coverage) = Coverage::render(resolved, utf8)? else {
            return Ok(());
        };

        let glyphs = GpuTexture::new(
            &self.context.device,
            &self.context.queue,
            &self.pipelines,
            coverage.width as i32,
            coverage.height as i32,
            TextureFormat::A8,
            Some(coverage.data.as_slice()),
        )?;
        let bind_group = glyphs.bind_group();
        let rect = Rect::new(x, y, coverage.width as f32, coverage.height as f32);
        let pushed = self.push_quad(
            &rect,
            quad(&rect, FULL_UV),
            color,
            Sampling::Coverage,
            1.0,
            0.0,
            Some(bind_group),
        );
        self.transient.push(glyphs);
        pushed
    }
}

impl WindowSystem for GpuBackend {
    fn create_window(&mut self, config: &WindowConfig) -> Result<Handle> {
        self.log_op("window.create");
        config.validate()?;
        if config.retained == Some(true) {
            return Err(GfxError::Unsupported(
                "gpu windows render immediately; retained mode is unavailable".into(),
            ));
        }
        let dpi_scale = self.config.dpi_override.unwrap_or(1.0);
        let size = device_size(config.width, config.height, dpi_scale);
        let texture = offscreen_texture(&self.context.device, size);
        self.pipelines
            .ensure_target(&self.context.device, crate::window::OFFSCREEN_FORMAT);
        let window = GpuWindow {
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            dpi_scale,
            visible: false,
            target: Target::Offscreen { texture },
        };
        self.registry.register(Box::new(window))
    }

    fn destroy_window(&mut self, window: Handle) -> Result<()> {
        self.log_op("window.destroy");
        self.registry.resolve::<GpuWindow>(window)?;
        if matches!(self.frame.active(), Ok(frame) if frame.window == window) {
            return Err(GfxError::State("destroy_window during the window's frame".into()));
        }
        self.registry.release(window).map(|_| ())
    }

    fn show_window(&mut self, window: Handle) -> Result<()> {
        self.log_op("window.show");
        self.registry.resolve_mut::<GpuWindow>(window)?.visible = true;
        Ok(())
    }

    fn hide_window(&mut self, window: Handle) -> Result<()> {
        self.log_op("window.hide");
        self.registry.resolve_mut::<GpuWindow>(window)?.visible = false;
        Ok(())
    }

    fn set_window_size(&mut self, window: Handle, width: i32, height: i32) -> Result<()> {
        self.log_op("window.set_size");
        WindowConfig::new(width, height).validate()?;
        if matches!(self.frame.active(), Ok(frame) if frame.window == window) {
            return Err(GfxError::State("set_window_size during the window's frame".into()));
        }
        let device = &self.context.device;
        let win = self.registry.resolve_mut::<GpuWindow>(window)?;
        let dpi_scale = win.dpi_scale;
        win.resize(device, width, height, dpi_scale);
        Ok(())
    }

    fn window_size(&self, window: Handle) -> Result<(i32, i32)> {
        let win = self.registry.resolve::<GpuWindow>(window)?;
        Ok((win.width, win.height))
    }

    fn window_dpi_scale(&self, window: Handle) -> Result<f32> {
        Ok(self.registry.resolve::<GpuWindow>(window)?.dpi_scale)
    }
}
