//! Retained replay against a host snapshot
//!
//! The host toolkit's paint callback hands us a [`SnapshotSink`]; [`replay`] walks
//! the recorded commands in order and translates each into sink primitives.
//! Texture and font handles are resolved again here, and any command whose
//! resource has gone away since recording is skipped.

use lumen_core::{Color, Handle, Path, Point, Rect};

use crate::buffer::CommandBuffer;
use crate::command::Command;

/// Resolves recorded handles at replay time
pub trait ReplayResources {
    type Texture;
    type Font;

    fn texture(&self, handle: Handle) -> Option<&Self::Texture>;
    fn texture_size(texture: &Self::Texture) -> (i32, i32);
    fn font(&self, handle: Handle) -> Option<&Self::Font>;
}

/// Native drawing primitives offered by a host snapshot
pub trait SnapshotSink<T, F> {
    fn push_clip(&mut self, rect: Rect);
    fn pop_clip(&mut self);
    fn append_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color);
    /// Solid axis-aligned quad
    fn append_color(&mut self, rect: Rect, color: Color);
    fn append_stroke(&mut self, from: Point, to: Point, thickness: f32, color: Color);
    /// `path` contains no quadratic segments
    fn append_fill(&mut self, path: &Path, bounds: Rect, color: Color);
    fn append_texture(&mut self, texture: &T, src: Rect, dst: Rect, opacity: f32);
    fn append_text(&mut self, font: &F, text: &str, origin: Point, color: Color);
}

/// Outcome of one replay pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub replayed: usize,
    pub skipped: usize,
}

/// Replay every command of `buffer` into `sink`, in recorded order
pub fn replay<R, S>(buffer: &CommandBuffer, resources: &R, sink: &mut S) -> ReplayStats
where
    R: ReplayResources,
    S: SnapshotSink<R::Texture, R::Font> + ?Sized,
{
    let mut stats = ReplayStats::default();
    let mut open_clips = 0usize;

    for command in buffer.commands() {
        let drawn = match command {
            Command::Clear { rect, color } => {
                sink.append_rounded_rect(*rect, 0.0, *color);
                true
            }
            Command::Rect {
                rect,
                color,
                radius,
            } => {
                sink.append_rounded_rect(*rect, *radius, *color);
                true
            }
            Command::Line {
                from,
                to,
                color,
                thickness,
            } => replay_line::<R::Texture, R::Font, S>(sink, *from, *to, *color, *thickness),
            Command::PushClip { rect } => {
                sink.push_clip(*rect);
                open_clips += 1;
                true
            }
            Command::PopClip => {
                if open_clips == 0 {
                    false
                } else {
                    sink.pop_clip();
                    open_clips -= 1;
                    true
                }
            }
            Command::Texture {
                texture,
                src,
                dst,
                opacity,
            } => match resources.texture(*texture) {
                Some(resolved) => {
                    let (width, height) = R::texture_size(resolved);
                    let inside = src.width > 0.0
                        && src.height > 0.0
                        && dst.width > 0.0
                        && dst.height > 0.0
                        && src.x >= 0.0
                        && src.y >= 0.0
                        && src.right() <= width as f32
                        && src.bottom() <= height as f32;
                    if inside {
                        sink.append_texture(resolved, *src, *dst, *opacity);
                    }
                    inside
                }
                None => {
                    tracing::debug!(handle = %texture, "replay skipped destroyed texture");
                    false
                }
            },
            Command::Text {
                font,
                text,
                origin,
                color,
            } => match resources.font(*font) {
                Some(resolved) => {
                    sink.append_text(resolved, text, *origin, *color);
                    true
                }
                None => {
                    tracing::debug!(handle = %font, "replay skipped destroyed font");
                    false
                }
            },
            Command::Path {
                path,
                bounds,
                color,
            } => {
                if path.is_empty() {
                    false
                } else {
                    sink.append_fill(&path.with_cubics(), *bounds, *color);
                    true
                }
            }
        };
        if drawn {
            stats.replayed += 1;
        } else {
            stats.skipped += 1;
        }
    }

    for _ in 0..open_clips {
        sink.pop_clip();
    }
    stats
}

fn replay_line<T, F, S>(sink: &mut S, from: Point, to: Point, color: Color, thickness: f32) -> bool
where
    S: SnapshotSink<T, F> + ?Sized,
{
    if thickness <= 0.0 {
        return false;
    }
    if from.x == to.x || from.y == to.y {
        let half = thickness * 0.5;
        let span = Rect::from_points(from, to);
        let quad = Rect::new(
            span.x - half,
            span.y - half,
            span.width + thickness,
            span.height + thickness,
        );
        sink.append_color(quad, color);
    } else {
        sink.append_stroke(from, to, thickness, color);
    }
    true
}
