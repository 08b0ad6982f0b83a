//! Retained-mode recording of draw primitives
//!
//! A [`Recorder`] appends exactly one command per accepted primitive, after
//! applying the frame's simple transform. Argument validation happens before the
//! recorder is reached; the recorder only transforms, copies payloads and pushes.

use lumen_core::{Allocator, Color, Handle, Mat3, Path, Point, Rect, Result};

use crate::buffer::CommandBuffer;
use crate::command::{path_payload_bytes, text_payload_bytes, Command};

pub struct Recorder<'a> {
    buffer: &'a mut CommandBuffer,
    alloc: &'a dyn Allocator,
    transform: Mat3,
}

impl<'a> Recorder<'a> {
    pub fn new(buffer: &'a mut CommandBuffer, alloc: &'a dyn Allocator, transform: &Mat3) -> Self {
        Self {
            buffer,
            alloc,
            transform: *transform,
        }
    }

    fn push(&mut self, command: Command) -> Result<()> {
        self.buffer.push(command, self.alloc)
    }

    /// `frame` is the untransformed frame rectangle
    pub fn clear(&mut self, frame: Rect, color: Color) -> Result<()> {
        self.push(Command::Clear { rect: frame, color })
    }

    pub fn rect(&mut self, rect: &Rect, color: Color, radius: f32) -> Result<()> {
        let command = Command::Rect {
            rect: self.transform.transform_rect(rect),
            color,
            radius: radius * self.transform.radius_scale(),
        };
        self.push(command)
    }

    pub fn line(&mut self, from: Point, to: Point, color: Color, thickness: f32) -> Result<()> {
        let command = Command::Line {
            from: self.transform.transform_point(from),
            to: self.transform.transform_point(to),
            color,
            thickness: thickness * self.transform.thickness_scale(),
        };
        self.push(command)
    }

    /// `rect` is already in frame space
    pub fn push_clip(&mut self, rect: Rect) -> Result<()> {
        self.push(Command::PushClip { rect })
    }

    pub fn pop_clip(&mut self) -> Result<()> {
        self.push(Command::PopClip)
    }

    pub fn texture(&mut self, texture: Handle, src: &Rect, dst: &Rect, opacity: f32) -> Result<()> {
        let command = Command::Texture {
            texture,
            src: *src,
            dst: self.transform.transform_rect(dst),
            opacity,
        };
        self.push(command)
    }

    pub fn text(&mut self, font: Handle, utf8: &str, origin: Point, color: Color) -> Result<()> {
        self.alloc.reserve(text_payload_bytes(utf8))?;
        let command = Command::Text {
            font,
            text: utf8.to_owned(),
            origin: self.transform.transform_point(origin),
            color,
        };
        self.push(command)
    }

    /// Record a filled path. A path without any points records nothing.
    pub fn path(&mut self, path: &Path, color: Color) -> Result<()> {
        let transformed = path.transformed(&self.transform);
        let Some(bounds) = transformed.bounds() else {
            return Ok(());
        };
        self.alloc.reserve(path_payload_bytes(&transformed))?;
        self.push(Command::Path {
            path: transformed,
            bounds,
            color,
        })
    }
}
