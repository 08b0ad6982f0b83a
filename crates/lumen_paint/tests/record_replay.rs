//! Integration tests for recording and replaying a retained frame
//!
//! These tests verify that:
//! - Recorded geometry arrives at the sink already in frame space
//! - Unbalanced clips are closed at the end of replay
//! - Payloads are released exactly once across frames

use std::collections::HashMap;

use lumen_core::{
    Color, CountingAllocator, Handle, Mat3, Path, PathBuilder, Point, Rect,
};
use lumen_paint::{replay, CommandBuffer, Recorder, ReplayResources, SnapshotSink};

#[derive(Debug, PartialEq)]
enum Op {
    Clip(Rect),
    Unclip,
    Rect(Rect, f32),
    Quad(Rect),
    Stroke(Point, Point, f32),
    Fill(Rect),
    Text(String, Point),
    Texture(Rect),
}

#[derive(Default)]
struct Log(Vec<Op>);

impl SnapshotSink<(i32, i32), ()> for Log {
    fn push_clip(&mut self, rect: Rect) {
        self.0.push(Op::Clip(rect));
    }
    fn pop_clip(&mut self) {
        self.0.push(Op::Unclip);
    }
    fn append_rounded_rect(&mut self, rect: Rect, radius: f32, _color: Color) {
        self.0.push(Op::Rect(rect, radius));
    }
    fn append_color(&mut self, rect: Rect, _color: Color) {
        self.0.push(Op::Quad(rect));
    }
    fn append_stroke(&mut self, from: Point, to: Point, thickness: f32, _color: Color) {
        self.0.push(Op::Stroke(from, to, thickness));
    }
    fn append_fill(&mut self, _path: &Path, bounds: Rect, _color: Color) {
        self.0.push(Op::Fill(bounds));
    }
    fn append_texture(&mut self, _texture: &(i32, i32), _src: Rect, dst: Rect, _opacity: f32) {
        self.0.push(Op::Texture(dst));
    }
    fn append_text(&mut self, _font: &(), text: &str, origin: Point, _color: Color) {
        self.0.push(Op::Text(text.to_string(), origin));
    }
}

#[derive(Default)]
struct Table {
    textures: HashMap<Handle, (i32, i32)>,
    fonts: HashMap<Handle, ()>,
}

impl ReplayResources for Table {
    type Texture = (i32, i32);
    type Font = ();

    fn texture(&self, handle: Handle) -> Option<&(i32, i32)> {
        self.textures.get(&handle)
    }
    fn texture_size(texture: &(i32, i32)) -> (i32, i32) {
        *texture
    }
    fn font(&self, handle: Handle) -> Option<&()> {
        self.fonts.get(&handle)
    }
}

/// A scaled and translated frame replays in frame coordinates
#[test]
fn test_transformed_frame_replays_in_frame_space() {
    let alloc = CountingAllocator::new();
    let mut buffer = CommandBuffer::new(2);
    let transform = Mat3::scale_translate(2.0, 2.0, 10.0, 0.0);
    let font = Handle::new(1, 1);
    let texture = Handle::new(2, 1);

    {
        let mut rec = Recorder::new(&mut buffer, &alloc, &transform);
        rec.clear(Rect::new(0.0, 0.0, 100.0, 50.0), Color::WHITE)
            .unwrap();
        rec.push_clip(Rect::new(10.0, 0.0, 40.0, 40.0)).unwrap();
        rec.rect(&Rect::new(0.0, 0.0, 5.0, 5.0), Color::RED, 1.0)
            .unwrap();
        rec.line(Point::new(0.0, 0.0), Point::new(5.0, 0.0), Color::BLACK, 1.0)
            .unwrap();
        rec.line(Point::new(0.0, 0.0), Point::new(5.0, 5.0), Color::BLACK, 1.0)
            .unwrap();
        rec.text(font, "hi", Point::new(1.0, 1.0), Color::BLACK)
            .unwrap();
        let path = PathBuilder::new().rect(&Rect::new(0.0, 0.0, 4.0, 4.0)).build();
        rec.path(&path, Color::BLUE).unwrap();
        rec.texture(
            texture,
            &Rect::new(0.0, 0.0, 8.0, 8.0),
            &Rect::new(0.0, 0.0, 8.0, 8.0),
            1.0,
        )
        .unwrap();
    }
    buffer.mark_ready();

    let mut table = Table::default();
    table.fonts.insert(font, ());
    table.textures.insert(texture, (8, 8));

    let mut log = Log::default();
    let stats = replay(&buffer, &table, &mut log);
    assert_eq!(stats.replayed, 8);
    assert_eq!(stats.skipped, 0);

    assert_eq!(
        log.0,
        vec![
            Op::Rect(Rect::new(0.0, 0.0, 100.0, 50.0), 0.0),
            Op::Clip(Rect::new(10.0, 0.0, 40.0, 40.0)),
            Op::Rect(Rect::new(10.0, 0.0, 10.0, 10.0), 2.0),
            Op::Quad(Rect::new(9.0, -1.0, 12.0, 2.0)),
            Op::Stroke(Point::new(10.0, 0.0), Point::new(20.0, 10.0), 2.0),
            Op::Text("hi".into(), Point::new(12.0, 2.0)),
            Op::Fill(Rect::new(10.0, 0.0, 8.0, 8.0)),
            Op::Texture(Rect::new(10.0, 0.0, 16.0, 16.0)),
            Op::Unclip,
        ]
    );
}

/// Payload bytes return to zero after the next frame's reset
#[test]
fn test_payloads_released_across_frames() {
    let alloc = CountingAllocator::new();
    let mut buffer = CommandBuffer::default();
    for frame in 0..3 {
        buffer.reset(&alloc).unwrap();
        let storage = alloc.in_use();
        let mut rec = Recorder::new(&mut buffer, &alloc, &Mat3::IDENTITY);
        for i in 0..frame + 1 {
            rec.text(Handle::new(1, 1), "label", Point::new(0.0, i as f32), Color::BLACK)
                .unwrap();
        }
        assert!(alloc.in_use() > storage);
    }
    buffer.release_storage(&alloc).unwrap();
    assert_eq!(alloc.in_use(), 0);
}
