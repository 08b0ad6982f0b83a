//! Drawing state shared by the raster and snapshot backends
//!
//! Both backends render into per-window tiny-skia surfaces. A window is either
//! immediate (draws hit its surface directly) or retained (draws are recorded and
//! replayed by the host's paint callback). [`HostState`] implements the whole
//! contract once; the public backends pick the mode rules and the bootstrap.

use std::rc::Rc;

use lumen_core::{
    validate, ActiveFrame, Allocator, BackendConfig, Color, FontDesc, FrameState, GfxError,
    Handle, HostBootstrap, Mat3, Path, Point, Rect, Registry, Result, TextMetrics, TextureFormat,
    WindowConfig,
};
use lumen_paint::{replay, CommandBuffer, Recorder, ReplayStats, SnapshotSink};
use lumen_raster::{RasterCanvas, RasterSnapshot, RasterTexture};
use lumen_text::{Font, FontLibrary};
use tiny_skia::Pixmap;

use crate::resources::RegistryResources;
use crate::window::HostWindow;

/// Host paint request for a window whose frame just ended
pub type RedrawCallback = Box<dyn FnMut(Handle)>;

/// Which windows a backend may open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ModeRules {
    pub name: &'static str,
    pub default_retained: bool,
    pub allow_retained: bool,
}

pub(crate) struct HostState {
    rules: ModeRules,
    config: BackendConfig,
    alloc: Rc<dyn Allocator>,
    registry: Registry,
    frame: FrameState,
    fonts: FontLibrary,
    redraw: Option<RedrawCallback>,
    bootstrap: &'static HostBootstrap,
    shut_down: bool,
}

/// Axis-aligned segments are drawn as solid quads grown by half the thickness
fn axis_aligned_quad(from: Point, to: Point, thickness: f32) -> Option<Rect> {
    if from.x != to.x && from.y != to.y {
        return None;
    }
    let half = thickness * 0.5;
    let span = Rect::from_points(from, to);
    Some(Rect::new(
        span.x - half,
        span.y - half,
        span.width + thickness,
        span.height + thickness,
    ))
}

impl HostState {
    pub fn new(
        rules: ModeRules,
        config: BackendConfig,
        alloc: Rc<dyn Allocator>,
        fonts: FontLibrary,
        bootstrap: &'static HostBootstrap,
    ) -> Result<Self> {
        config.validate()?;
        bootstrap.acquire(|| {
            tracing::debug!(backend = rules.name, "host toolkit bootstrap");
            Ok(())
        })?;
        tracing::debug!(backend = rules.name, "backend created");
        Ok(Self {
            rules,
            registry: Registry::with_capacity(config.handle_capacity),
            config,
            alloc,
            frame: FrameState::new(),
            fonts,
            redraw: None,
            bootstrap,
            shut_down: false,
        })
    }

    fn log_op(&self, op: &'static str) {
        if self.config.enable_logging {
            tracing::debug!(op, backend = self.rules.name);
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn fonts_mut(&mut self) -> &mut FontLibrary {
        &mut self.fonts
    }

    pub fn set_redraw_callback(&mut self, callback: Option<RedrawCallback>) {
        self.redraw = callback;
    }

    fn request_redraw(&mut self, window: Handle) {
        if let Some(callback) = self.redraw.as_mut() {
            callback(window);
        }
    }

    fn window(&self, window: Handle) -> Result<&HostWindow> {
        self.registry.resolve::<HostWindow>(window)
    }

    fn window_mut(&mut self, window: Handle) -> Result<&mut HostWindow> {
        self.registry.resolve_mut::<HostWindow>(window)
    }

    fn is_active_window(&self, window: Handle) -> bool {
        matches!(self.frame.active(), Ok(frame) if frame.window == window)
    }

    /// Open frame and its window
    fn target(&mut self) -> Result<(ActiveFrame, &mut HostWindow)> {
        let frame = *self.frame.active()?;
        let window = self.registry.resolve_mut::<HostWindow>(frame.window)?;
        Ok((frame, window))
    }

    // Frame lifecycle

    pub fn begin_frame(&mut self, window: Handle, width: i32, height: i32, dpi_scale: f32) -> Result<()> {
        self.log_op("gfx.begin_frame");
        self.frame.check_begin(width, height, dpi_scale)?;
        let dpi_scale = self.config.dpi_override.unwrap_or(dpi_scale);
        let retained = self.window(window)?.retained;
        if retained && !self.frame.transform().is_simple() {
            return Err(GfxError::Unsupported(
                "retained frames require a scale/translate transform".into(),
            ));
        }

        let transform = *self.frame.transform();
        let win = self.window_mut(window)?;
        win.resize(width, height, dpi_scale)?;
        if retained {
            win.reset_commands()?;
        } else {
            win.canvas.set_transform(&transform);
            win.canvas.set_clip(None)?;
        }
        self.frame.begin(window, width, height, dpi_scale, retained)?;
        Ok(())
    }

    pub fn end_frame(&mut self, window: Handle) -> Result<()> {
        self.log_op("gfx.end_frame");
        let frame = self.frame.end(window)?;
        let win = self.window_mut(frame.window)?;
        if frame.retained {
            win.commands.mark_ready();
        } else {
            win.canvas.set_clip(None)?;
        }
        win.redraw_pending = true;
        self.request_redraw(window);
        Ok(())
    }

    // Primitives

    pub fn clear(&mut self, color: Color) -> Result<()> {
        self.log_op("gfx.clear");
        color.validate()?;
        let alloc = Rc::clone(&self.alloc);
        let transform = *self.frame.transform();
        let (frame, win) = self.target()?;
        if frame.retained {
            Recorder::new(&mut win.commands, alloc.as_ref(), &transform).clear(frame.bounds(), color)
        } else {
            win.canvas.clear(color);
            Ok(())
        }
    }

    pub fn draw_rect(&mut self, rect: &Rect, color: Color, corner_radius: f32) -> Result<()> {
        self.log_op("gfx.draw_rect");
        validate::fill(rect, &color, corner_radius)?;
        let alloc = Rc::clone(&self.alloc);
        let transform = *self.frame.transform();
        let (frame, win) = self.target()?;
        if frame.retained {
            Recorder::new(&mut win.commands, alloc.as_ref(), &transform).rect(rect, color, corner_radius)
        } else {
            win.canvas.fill_rounded_rect(rect, corner_radius, color);
            Ok(())
        }
    }

    pub fn draw_line(&mut self, from: Point, to: Point, color: Color, thickness: f32) -> Result<()> {
        self.log_op("gfx.draw_line");
        validate::non_negative("line thickness", thickness)?;
        color.validate()?;
        let alloc = Rc::clone(&self.alloc);
        let transform = *self.frame.transform();
        let (frame, win) = self.target()?;
        if frame.retained {
            return Recorder::new(&mut win.commands, alloc.as_ref(), &transform)
                .line(from, to, color, thickness);
        }
        if thickness == 0.0 {
            return Ok(());
        }
        match axis_aligned_quad(from, to, thickness) {
            Some(quad) => win.canvas.fill_rounded_rect(&quad, 0.0, color),
            None => win.canvas.stroke_line(from, to, thickness, color),
        }
        Ok(())
    }

    pub fn draw_path(&mut self, path: &Path, color: Color) -> Result<()> {
        self.log_op("gfx.draw_path");
        color.validate()?;
        let alloc = Rc::clone(&self.alloc);
        let transform = *self.frame.transform();
        let (frame, win) = self.target()?;
        if path.is_empty() {
            return Ok(());
        }
        if frame.retained {
            Recorder::new(&mut win.commands, alloc.as_ref(), &transform).path(path, color)
        } else {
            win.canvas.fill_path(path, color);
            Ok(())
        }
    }

    pub fn push_clip(&mut self, rect: &Rect) -> Result<()> {
        self.log_op("gfx.push_clip");
        let pushed = self.frame.push_clip(rect)?;
        let clip = self.frame.clip();
        let alloc = Rc::clone(&self.alloc);
        let transform = *self.frame.transform();
        let (frame, win) = self.target()?;
        if frame.retained {
            Recorder::new(&mut win.commands, alloc.as_ref(), &transform).push_clip(pushed)
        } else {
            win.canvas.set_clip(clip)
        }
    }

    pub fn pop_clip(&mut self) -> Result<()> {
        self.log_op("gfx.pop_clip");
        self.frame.pop_clip()?;
        let clip = self.frame.clip();
        let alloc = Rc::clone(&self.alloc);
        let transform = *self.frame.transform();
        let (frame, win) = self.target()?;
        if frame.retained {
            Recorder::new(&mut win.commands, alloc.as_ref(), &transform).pop_clip()
        } else {
            win.canvas.set_clip(clip)
        }
    }

    pub fn set_transform(&mut self, transform: Option<&Mat3>) -> Result<()> {
        self.log_op("gfx.set_transform");
        self.frame.set_transform(transform)?;
        let transform = *self.frame.transform();
        if let Ok((frame, win)) = self.target() {
            if !frame.retained {
                win.canvas.set_transform(&transform);
            }
        }
        Ok(())
    }

    // Textures

    pub fn create_texture(
        &mut self,
        width: i32,
        height: i32,
        format: TextureFormat,
        pixels: Option<&[u8]>,
    ) -> Result<Handle> {
        self.log_op("gfx.create_texture");
        let texture = RasterTexture::new(width, height, format, pixels)?;
        self.registry.register(Box::new(texture))
    }

    pub fn update_texture(
        &mut self,
        texture: Handle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pixels: &[u8],
    ) -> Result<()> {
        self.log_op("gfx.update_texture");
        self.registry
            .resolve_mut::<RasterTexture>(texture)?
            .update(x, y, width, height, pixels)
    }

    pub fn retain_texture(&mut self, texture: Handle) -> Result<u32> {
        self.log_op("gfx.retain_texture");
        self.registry.resolve::<RasterTexture>(texture)?;
        self.registry.retain(texture)
    }

    pub fn destroy_texture(&mut self, texture: Handle) -> Result<()> {
        self.log_op("gfx.destroy_texture");
        self.registry.resolve::<RasterTexture>(texture)?;
        self.registry.release(texture).map(|_| ())
    }

    pub fn draw_texture(&mut self, texture: Handle, src: &Rect, dst: &Rect, opacity: f32) -> Result<()> {
        self.log_op("gfx.draw_texture");
        let resolved = self.registry.resolve::<RasterTexture>(texture)?;
        let (width, height) = resolved.size();
        validate::texture_quad(src, dst, opacity, width, height)?;
        let frame = *self.frame.active()?;

        if frame.retained {
            let alloc = Rc::clone(&self.alloc);
            let transform = *self.frame.transform();
            let (_, win) = self.target()?;
            return Recorder::new(&mut win.commands, alloc.as_ref(), &transform)
                .texture(texture, src, dst, opacity);
        }

        let image: Rc<Pixmap> = match resolved.native_view() {
            Some(view) => view,
            None => Rc::new(resolved.storage().clone()),
        };
        let (_, win) = self.target()?;
        let pixmap: &Pixmap = &image;
        win.canvas.draw_image(pixmap.as_ref(), src, dst, opacity);
        Ok(())
    }

    // Text

    pub fn create_font(&mut self, family: &str, size_px: i32, weight: i32, italic: bool) -> Result<Handle> {
        self.log_op("text.create_font");
        let desc = FontDesc::new(family, size_px, weight, italic);
        desc.validate()?;
        let font = self.fonts.resolve(&desc)?;
        self.registry.register(Box::new(font))
    }

    pub fn destroy_font(&mut self, font: Handle) -> Result<()> {
        self.log_op("text.destroy_font");
        self.registry.resolve::<Font>(font)?;
        self.registry.release(font).map(|_| ())
    }

    pub fn measure_text(&self, font: Handle, utf8: &str) -> Result<TextMetrics> {
        self.log_op("text.measure_text");
        Ok(self.registry.resolve::<Font>(font)?.measure(utf8)?)
    }

    pub fn draw_text(&mut self, font: Handle, utf8: &str, origin: Point, color: Color) -> Result<()> {
        self.log_op("text.draw_text");
        color.validate()?;
        let frame = *self.frame.active()?;
        let resolved = self.registry.resolve::<Font>(font)?;

        if frame.retained {
            let alloc = Rc::clone(&self.alloc);
            let transform = *self.frame.transform();
            let (_, win) = self.target()?;
            return Recorder::new(&mut win.commands, alloc.as_ref(), &transform)
                .text(font, utf8, origin, color);
        }

        let path = resolved.run_path(utf8, origin)?;
        let (_, win) = self.target()?;
        if !path.is_empty() {
            win.canvas.fill_path(&path, color);
        }
        Ok(())
    }

    // Windows

    pub fn create_window(&mut self, config: &WindowConfig) -> Result<Handle> {
        self.log_op("window.create");
        config.validate()?;
        let retained = config.retained.unwrap_or(self.rules.default_retained);
        if retained && !self.rules.allow_retained {
            return Err(GfxError::Unsupported(format!(
                "{} windows cannot be retained",
                self.rules.name
            )));
        }
        let dpi_scale = self.config.dpi_override.unwrap_or(1.0);
        let window = HostWindow::new(
            config.title.clone(),
            config.width,
            config.height,
            dpi_scale,
            retained,
            self.config.command_buffer_capacity,
            Rc::clone(&self.alloc),
        )?;
        self.registry.register(Box::new(window))
    }

    pub fn destroy_window(&mut self, window: Handle) -> Result<()> {
        self.log_op("window.destroy");
        self.window(window)?;
        if self.is_active_window(window) {
            return Err(GfxError::State("destroy_window during the window's frame".into()));
        }
        self.registry.release(window).map(|_| ())
    }

    pub fn show_window(&mut self, window: Handle) -> Result<()> {
        self.log_op("window.show");
        let win = self.window_mut(window)?;
        win.visible = true;
        win.redraw_pending = true;
        self.request_redraw(window);
        Ok(())
    }

    pub fn hide_window(&mut self, window: Handle) -> Result<()> {
        self.log_op("window.hide");
        self.window_mut(window)?.visible = false;
        Ok(())
    }

    pub fn set_window_size(&mut self, window: Handle, width: i32, height: i32) -> Result<()> {
        self.log_op("window.set_size");
        WindowConfig::new(width, height).validate()?;
        if self.is_active_window(window) {
            return Err(GfxError::State("set_window_size during the window's frame".into()));
        }
        let win = self.window_mut(window)?;
        let dpi_scale = win.dpi_scale;
        win.resize(width, height, dpi_scale)
    }

    pub fn window_size(&self, window: Handle) -> Result<(i32, i32)> {
        let win = self.window(window)?;
        Ok((win.width, win.height))
    }

    pub fn window_dpi_scale(&self, window: Handle) -> Result<f32> {
        Ok(self.window(window)?.dpi_scale)
    }

    pub fn is_retained(&self, window: Handle) -> Result<bool> {
        Ok(self.window(window)?.retained)
    }

    pub fn redraw_pending(&self, window: Handle) -> Result<bool> {
        Ok(self.window(window)?.redraw_pending)
    }

    pub fn commands(&self, window: Handle) -> Result<&CommandBuffer> {
        Ok(&self.window(window)?.commands)
    }

    // Host paint callback

    /// Straight-alpha RGBA8 of the window surface, in device pixels
    pub fn surface_pixels(&self, window: Handle) -> Result<(u32, u32, Vec<u8>)> {
        let win = self.window(window)?;
        if win.retained {
            return Err(GfxError::Unsupported(
                "retained windows are painted through snapshot replay".into(),
            ));
        }
        Ok((win.canvas.width(), win.canvas.height(), win.canvas.to_rgba8()))
    }

    pub fn pixel(&self, window: Handle, x: u32, y: u32) -> Result<Option<[u8; 4]>> {
        let win = self.window(window)?;
        if win.retained {
            return Err(GfxError::Unsupported(
                "retained windows are painted through snapshot replay".into(),
            ));
        }
        Ok(win.canvas.pixel(x, y))
    }

    /// Replay the window's finished command buffer into `sink`
    pub fn snapshot<S>(&mut self, window: Handle, sink: &mut S) -> Result<ReplayStats>
    where
        S: SnapshotSink<RasterTexture, Font> + ?Sized,
    {
        self.log_op("snapshot.replay");
        let win = self.window(window)?;
        if !win.retained {
            return Err(GfxError::Unsupported(
                "immediate windows have no command buffer to replay".into(),
            ));
        }
        let stats = if win.commands.is_ready() {
            let resources = RegistryResources::new(&self.registry);
            replay(&win.commands, &resources, sink)
        } else {
            ReplayStats::default()
        };
        if stats.skipped > 0 {
            tracing::debug!(%window, skipped = stats.skipped, "replay skipped commands");
        }
        self.window_mut(window)?.redraw_pending = false;
        Ok(stats)
    }

    /// Replay into a raster canvas sized like the window surface
    pub fn paint(&mut self, window: Handle, canvas: &mut RasterCanvas) -> Result<ReplayStats> {
        let native = self.config.native_textures;
        let mut sink = RasterSnapshot::new(canvas, native);
        self.snapshot(window, &mut sink)
    }

    /// Release every resource and the bootstrap reference. Safe to call twice.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        if let Some(frame) = self.frame.abort() {
            tracing::warn!(window = %frame.window, backend = self.rules.name, "backend destroyed inside a frame");
        }
        let destroyed = self.registry.destroy_all();
        let name = self.rules.name;
        let released = self.bootstrap.release(|| {
            tracing::debug!(backend = name, "host toolkit shutdown");
            Ok(())
        });
        tracing::debug!(backend = name, "backend destroyed");
        destroyed.and(released)
    }
}

impl Drop for HostState {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!(backend = self.rules.name, "backend teardown: {err}");
        }
    }
}

/// Forward the backend traits to an inner `host: HostState`
macro_rules! impl_host_backend {
    ($backend:ty) => {
        impl lumen_core::Gfx for $backend {
            fn begin_frame(
                &mut self,
                window: lumen_core::Handle,
                width: i32,
                height: i32,
                dpi_scale: f32,
            ) -> lumen_core::Result<()> {
                self.host.begin_frame(window, width, height, dpi_scale)
            }

            fn end_frame(&mut self, window: lumen_core::Handle) -> lumen_core::Result<()> {
                self.host.end_frame(window)
            }

            fn clear(&mut self, color: lumen_core::Color) -> lumen_core::Result<()> {
                self.host.clear(color)
            }

            fn draw_rect(
                &mut self,
                rect: &lumen_core::Rect,
                color: lumen_core::Color,
                corner_radius: f32,
            ) -> lumen_core::Result<()> {
                self.host.draw_rect(rect, color, corner_radius)
            }

            fn draw_line(
                &mut self,
                x0: f32,
                y0: f32,
                x1: f32,
                y1: f32,
                color: lumen_core::Color,
                thickness: f32,
            ) -> lumen_core::Result<()> {
                self.host.draw_line(
                    lumen_core::Point::new(x0, y0),
                    lumen_core::Point::new(x1, y1),
                    color,
                    thickness,
                )
            }

            fn draw_path(
                &mut self,
                path: &lumen_core::Path,
                color: lumen_core::Color,
            ) -> lumen_core::Result<()> {
                self.host.draw_path(path, color)
            }

            fn push_clip(&mut self, rect: &lumen_core::Rect) -> lumen_core::Result<()> {
                self.host.push_clip(rect)
            }

            fn pop_clip(&mut self) -> lumen_core::Result<()> {
                self.host.pop_clip()
            }

            fn set_transform(
                &mut self,
                transform: Option<&lumen_core::Mat3>,
            ) -> lumen_core::Result<()> {
                self.host.set_transform(transform)
            }

            fn create_texture(
                &mut self,
                width: i32,
                height: i32,
                format: lumen_core::TextureFormat,
                pixels: Option<&[u8]>,
            ) -> lumen_core::Result<lumen_core::Handle> {
                self.host.create_texture(width, height, format, pixels)
            }

            fn update_texture(
                &mut self,
                texture: lumen_core::Handle,
                x: i32,
                y: i32,
                width: i32,
                height: i32,
                pixels: &[u8],
            ) -> lumen_core::Result<()> {
                self.host.update_texture(texture, x, y, width, height, pixels)
            }

            fn destroy_texture(&mut self, texture: lumen_core::Handle) -> lumen_core::Result<()> {
                self.host.destroy_texture(texture)
            }

            fn draw_texture(
                &mut self,
                texture: lumen_core::Handle,
                src: &lumen_core::Rect,
                dst: &lumen_core::Rect,
                opacity: f32,
            ) -> lumen_core::Result<()> {
                self.host.draw_texture(texture, src, dst, opacity)
            }
        }

        impl lumen_core::TextBackend for $backend {
            fn create_font(
                &mut self,
                family: &str,
                size_px: i32,
                weight: i32,
                italic: bool,
            ) -> lumen_core::Result<lumen_core::Handle> {
                self.host.create_font(family, size_px, weight, italic)
            }

            fn destroy_font(&mut self, font: lumen_core::Handle) -> lumen_core::Result<()> {
                self.host.destroy_font(font)
            }

            fn measure_text(
                &mut self,
                font: lumen_core::Handle,
                utf8: &str,
            ) -> lumen_core::Result<lumen_core::TextMetrics> {
                self.host.measure_text(font, utf8)
            }

            fn draw_text(
                &mut self,
                font: lumen_core::Handle,
                utf8: &str,
                x: f32,
                y: f32,
                color: lumen_core::Color,
            ) -> lumen_core::Result<()> {
                self.host
                    .draw_text(font, utf8, lumen_core::Point::new(x, y), color)
            }
        }

        impl lumen_core::WindowSystem for $backend {
            fn create_window(
                &mut self,
                config: &lumen_core::WindowConfig,
            ) -> lumen_core::Result<lumen_core::Handle> {
                self.host.create_window(config)
            }

            fn destroy_window(&mut self, window: lumen_core::Handle) -> lumen_core::Result<()> {
                self.host.destroy_window(window)
            }

            fn show_window(&mut self, window: lumen_core::Handle) -> lumen_core::Result<()> {
                self.host.show_window(window)
            }

            fn hide_window(&mut self, window: lumen_core::Handle) -> lumen_core::Result<()> {
                self.host.hide_window(window)
            }

            fn set_window_size(
                &mut self,
                window: lumen_core::Handle,
                width: i32,
                height: i32,
            ) -> lumen_core::Result<()> {
                self.host.set_window_size(window, width, height)
            }

            fn window_size(&self, window: lumen_core::Handle) -> lumen_core::Result<(i32, i32)> {
                self.host.window_size(window)
            }

            fn window_dpi_scale(&self, window: lumen_core::Handle) -> lumen_core::Result<f32> {
                self.host.window_dpi_scale(window)
            }
        }
    };
}

pub(crate) use impl_host_backend;
