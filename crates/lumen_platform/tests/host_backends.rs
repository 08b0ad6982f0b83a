//! Integration tests for the raster and snapshot backends
//!
//! These tests verify that:
//! - Immediate frames land on the window surface pixel for pixel
//! - Retained frames record commands that replay to the same pixels
//! - Resetting a retained buffer frees each payload exactly once
//! - Frame, transform and texture misuse is reported with the right error kind

use std::cell::RefCell;
use std::rc::Rc;

use lumen_core::{
    Allocator, BackendConfig, Color, CountingAllocator, ErrorKind, Gfx, GfxError, Mat3, Rect,
    SystemAllocator, TextBackend, TextureFormat, WindowConfig, WindowSystem,
};
use lumen_paint::{command::text_payload_bytes, CommandKind};
use lumen_platform::{RasterBackend, SnapshotBackend};
use lumen_raster::RasterCanvas;
use lumen_text::FontLibrary;

const RED: [u8; 4] = [255, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn raster() -> RasterBackend {
    RasterBackend::with_parts(
        BackendConfig::default(),
        Rc::new(SystemAllocator),
        FontLibrary::empty(),
    )
    .unwrap()
}

fn snapshot_with(alloc: Rc<dyn Allocator>) -> SnapshotBackend {
    SnapshotBackend::with_parts(BackendConfig::default(), alloc, FontLibrary::empty()).unwrap()
}

fn snapshot() -> SnapshotBackend {
    snapshot_with(Rc::new(SystemAllocator))
}

fn draw_scene<G: Gfx>(gfx: &mut G, window: lumen_core::Handle) {
    gfx.begin_frame(window, 100, 100, 1.0).unwrap();
    gfx.clear(Color::WHITE).unwrap();
    gfx.draw_rect(&Rect::new(10.0, 10.0, 50.0, 50.0), Color::RED, 0.0)
        .unwrap();
    gfx.end_frame(window).unwrap();
}

#[test]
fn test_immediate_frame_pixels() {
    let mut gfx = raster();
    let window = gfx.create_window(&WindowConfig::new(100, 100)).unwrap();
    draw_scene(&mut gfx, window);

    assert_eq!(gfx.pixel(window, 10, 10).unwrap(), Some(RED));
    assert_eq!(gfx.pixel(window, 59, 59).unwrap(), Some(RED));
    assert_eq!(gfx.pixel(window, 0, 0).unwrap(), Some(WHITE));
    assert_eq!(gfx.pixel(window, 60, 60).unwrap(), Some(WHITE));

    let (w, h, pixels) = gfx.surface_pixels(window).unwrap();
    assert_eq!((w, h), (100, 100));
    assert_eq!(pixels.len(), 100 * 100 * 4);
}

#[test]
fn test_small_rounded_rect_pixels() {
    let mut gfx = raster();
    let window = gfx.create_window(&WindowConfig::new(100, 100)).unwrap();
    gfx.begin_frame(window, 100, 100, 1.0).unwrap();
    gfx.clear(Color::WHITE).unwrap();
    gfx.draw_rect(&Rect::new(5.0, 5.0, 10.0, 10.0), Color::RED, 2.0)
        .unwrap();
    gfx.end_frame(window).unwrap();

    assert_eq!(gfx.pixel(window, 10, 10).unwrap(), Some(RED));
    assert_eq!(gfx.pixel(window, 0, 0).unwrap(), Some(WHITE));
}

#[test]
fn test_negative_sizes_leave_no_trace() {
    let mut gfx = snapshot();
    let window = gfx.create_window(&WindowConfig::new(50, 50)).unwrap();
    gfx.begin_frame(window, 50, 50, 1.0).unwrap();

    let bad = Rect::new(0.0, 0.0, -1.0, 5.0);
    assert_eq!(gfx.draw_rect(&bad, Color::RED, 0.0).unwrap_err().kind(), ErrorKind::Range);
    assert_eq!(gfx.push_clip(&bad).unwrap_err().kind(), ErrorKind::Range);
    let err = gfx
        .draw_rect(&Rect::new(0.0, 0.0, 5.0, 5.0), Color::new(1.5, 0.0, 0.0, 1.0), 0.0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
    let err = gfx
        .draw_line(0.0, 0.0, 5.0, 5.0, Color::RED, -1.0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
    assert_eq!(gfx.pop_clip().unwrap_err().kind(), ErrorKind::State);

    gfx.end_frame(window).unwrap();
    assert!(gfx.commands(window).unwrap().is_empty());
}

#[test]
fn test_retained_replay_matches_immediate() {
    let mut gfx = snapshot();
    let window = gfx.create_window(&WindowConfig::new(100, 100)).unwrap();
    draw_scene(&mut gfx, window);
    assert!(gfx.redraw_pending(window).unwrap());

    let mut canvas = RasterCanvas::new(100, 100, 1.0).unwrap();
    let stats = gfx.paint_snapshot(window, &mut canvas).unwrap();
    assert_eq!(stats.replayed, 2);
    assert_eq!(stats.skipped, 0);
    assert_eq!(canvas.pixel(10, 10), Some(RED));
    assert_eq!(canvas.pixel(0, 0), Some(WHITE));

    let mut immediate = raster();
    let reference = immediate.create_window(&WindowConfig::new(100, 100)).unwrap();
    draw_scene(&mut immediate, reference);
    let (_, _, pixels) = immediate.surface_pixels(reference).unwrap();
    assert_eq!(canvas.to_rgba8(), pixels);
}

#[test]
fn test_retained_clip_is_recorded_in_order() {
    let mut gfx = snapshot();
    let window = gfx.create_window(&WindowConfig::new(100, 100)).unwrap();
    gfx.begin_frame(window, 100, 100, 1.0).unwrap();
    gfx.push_clip(&Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
    gfx.draw_rect(&Rect::new(40.0, 40.0, 20.0, 20.0), Color::RED, 0.0)
        .unwrap();
    gfx.pop_clip().unwrap();
    gfx.end_frame(window).unwrap();

    let kinds: Vec<CommandKind> = gfx
        .commands(window)
        .unwrap()
        .commands()
        .iter()
        .map(|c| c.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![CommandKind::PushClip, CommandKind::Rect, CommandKind::PopClip]
    );

    let mut canvas = RasterCanvas::new(100, 100, 1.0).unwrap();
    canvas.clear(Color::WHITE);
    gfx.paint_snapshot(window, &mut canvas).unwrap();
    assert_eq!(canvas.pixel(45, 45), Some(RED));
    assert_eq!(canvas.pixel(55, 55), Some(WHITE));
}

#[test]
fn test_general_transform_rejected_only_when_retained() {
    let mut gfx = snapshot();
    let retained = gfx.create_window(&WindowConfig::new(40, 40)).unwrap();
    let immediate = gfx
        .create_window(&WindowConfig::new(40, 40).retained(false))
        .unwrap();
    let rotation = Mat3::rotate(0.5);

    gfx.set_transform(Some(&rotation)).unwrap();
    let err = gfx.begin_frame(retained, 40, 40, 1.0).unwrap_err();
    assert!(matches!(err, GfxError::Unsupported(_)));
    // Nothing was opened
    assert_eq!(gfx.end_frame(retained).unwrap_err().kind(), ErrorKind::State);

    gfx.begin_frame(immediate, 40, 40, 1.0).unwrap();
    gfx.draw_rect(&Rect::new(5.0, 5.0, 10.0, 10.0), Color::RED, 0.0)
        .unwrap();
    gfx.end_frame(immediate).unwrap();

    gfx.set_transform(None).unwrap();
    gfx.begin_frame(retained, 40, 40, 1.0).unwrap();
    let err = gfx.set_transform(Some(&rotation)).unwrap_err();
    assert!(matches!(err, GfxError::Unsupported(_)));
    gfx.set_transform(Some(&Mat3::scale_translate(2.0, 2.0, 1.0, 1.0)))
        .unwrap();
    gfx.end_frame(retained).unwrap();
}

#[test]
fn test_reset_frees_each_payload_once() {
    let counting = Rc::new(CountingAllocator::new());
    let alloc: Rc<dyn Allocator> = counting.clone();
    let mut gfx = snapshot_with(alloc);
    let window = gfx.create_window(&WindowConfig::new(100, 30)).unwrap();
    let font = gfx.create_font("Roboto", 14, 400, false).unwrap();

    let labels = ["first", "second", "third"];
    gfx.begin_frame(window, 100, 30, 1.0).unwrap();
    for (i, label) in labels.iter().enumerate() {
        gfx.draw_text(font, label, 0.0, i as f32 * 10.0, Color::BLACK)
            .unwrap();
    }
    gfx.end_frame(window).unwrap();

    let payload: usize = labels.iter().map(|l| text_payload_bytes(l)).sum();
    let in_use = counting.in_use();
    let releases = counting.releases();

    gfx.begin_frame(window, 100, 30, 1.0).unwrap();
    assert_eq!(counting.releases(), releases + labels.len());
    assert_eq!(counting.in_use(), in_use - payload);
    gfx.end_frame(window).unwrap();

    gfx.begin_frame(window, 100, 30, 1.0).unwrap();
    assert_eq!(counting.releases(), releases + labels.len());
    gfx.end_frame(window).unwrap();

    gfx.destroy_window(window).unwrap();
    assert_eq!(counting.in_use(), 0);
}

#[test]
fn test_frame_misuse_is_state_error() {
    let mut gfx = raster();
    let window = gfx.create_window(&WindowConfig::new(10, 10)).unwrap();
    let other = gfx.create_window(&WindowConfig::new(10, 10)).unwrap();

    let err = gfx.clear(Color::WHITE).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(gfx.end_frame(window).unwrap_err().kind(), ErrorKind::State);
    assert_eq!(gfx.pop_clip().unwrap_err().kind(), ErrorKind::State);

    gfx.begin_frame(window, 10, 10, 1.0).unwrap();
    let err = gfx.begin_frame(window, 10, 10, 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    let err = gfx.destroy_window(window).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    // Mismatched end still closes the frame
    assert_eq!(gfx.end_frame(other).unwrap_err().kind(), ErrorKind::State);
    gfx.begin_frame(window, 10, 10, 1.0).unwrap();
    gfx.end_frame(window).unwrap();
}

#[test]
fn test_texture_errors_and_release() {
    let mut gfx = raster();
    let err = gfx
        .create_texture(4, 4, TextureFormat::Rgba8, Some(&[0u8; 10]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);

    let texture = gfx
        .create_texture(4, 4, TextureFormat::Rgba8, None)
        .unwrap();
    let err = gfx
        .update_texture(texture, 3, 3, 2, 2, &[0u8; 16])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);

    assert_eq!(gfx.retain_texture(texture).unwrap(), 2);
    gfx.destroy_texture(texture).unwrap();
    gfx.update_texture(texture, 0, 0, 1, 1, &[255u8; 4]).unwrap();
    gfx.destroy_texture(texture).unwrap();
    let err = gfx.destroy_texture(texture).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_immediate_texture_draw() {
    let mut gfx = raster();
    let window = gfx.create_window(&WindowConfig::new(20, 20)).unwrap();
    let red = [255u8, 0, 0, 255].repeat(4);
    let texture = gfx
        .create_texture(2, 2, TextureFormat::Rgba8, Some(&red))
        .unwrap();

    gfx.begin_frame(window, 20, 20, 1.0).unwrap();
    gfx.clear(Color::WHITE).unwrap();
    gfx.draw_texture(
        texture,
        &Rect::new(0.0, 0.0, 2.0, 2.0),
        &Rect::new(0.0, 0.0, 10.0, 10.0),
        1.0,
    )
    .unwrap();
    let err = gfx
        .draw_texture(
            texture,
            &Rect::new(0.0, 0.0, 3.0, 2.0),
            &Rect::new(0.0, 0.0, 10.0, 10.0),
            1.0,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
    gfx.end_frame(window).unwrap();

    assert_eq!(gfx.pixel(window, 5, 5).unwrap(), Some(RED));
    assert_eq!(gfx.pixel(window, 15, 15).unwrap(), Some(WHITE));
}

#[test]
fn test_replay_skips_destroyed_texture() {
    let mut gfx = snapshot();
    let window = gfx.create_window(&WindowConfig::new(20, 20)).unwrap();
    let texture = gfx
        .create_texture(2, 2, TextureFormat::Rgba8, Some(&[255u8; 16]))
        .unwrap();

    gfx.begin_frame(window, 20, 20, 1.0).unwrap();
    gfx.clear(Color::WHITE).unwrap();
    gfx.draw_texture(
        texture,
        &Rect::new(0.0, 0.0, 2.0, 2.0),
        &Rect::new(0.0, 0.0, 10.0, 10.0),
        1.0,
    )
    .unwrap();
    gfx.end_frame(window).unwrap();
    gfx.destroy_texture(texture).unwrap();

    let mut canvas = RasterCanvas::new(20, 20, 1.0).unwrap();
    let stats = gfx.paint_snapshot(window, &mut canvas).unwrap();
    assert_eq!(stats.replayed, 1);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn test_redraw_callback_and_window_queries() {
    let requested = Rc::new(RefCell::new(Vec::new()));
    let mut gfx = snapshot();
    let sink = Rc::clone(&requested);
    gfx.set_redraw_callback(Some(Box::new(move |window| sink.borrow_mut().push(window))));

    let window = gfx
        .create_window(&WindowConfig::new(30, 20).title("demo"))
        .unwrap();
    gfx.show_window(window).unwrap();
    gfx.begin_frame(window, 30, 20, 2.0).unwrap();
    gfx.end_frame(window).unwrap();
    assert_eq!(*requested.borrow(), vec![window, window]);

    assert_eq!(gfx.window_size(window).unwrap(), (30, 20));
    assert_eq!(gfx.window_dpi_scale(window).unwrap(), 2.0);
    gfx.set_window_size(window, 60, 40).unwrap();
    assert_eq!(gfx.window_size(window).unwrap(), (60, 40));
    let err = gfx.set_window_size(window, 0, 40).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);

    gfx.hide_window(window).unwrap();
    gfx.destroy_window(window).unwrap();
    assert_eq!(gfx.window_size(window).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_dpi_override_and_bootstrap() {
    let config = BackendConfig {
        dpi_override: Some(2.0),
        ..BackendConfig::default()
    };
    let mut gfx =
        RasterBackend::with_parts(config, Rc::new(SystemAllocator), FontLibrary::empty()).unwrap();
    assert!(lumen_platform::raster::bootstrap().refs() >= 1);
    assert!(lumen_platform::raster::bootstrap().init_count() >= 1);

    let window = gfx.create_window(&WindowConfig::new(10, 10)).unwrap();
    gfx.begin_frame(window, 10, 10, 1.0).unwrap();
    gfx.clear(Color::RED).unwrap();
    gfx.end_frame(window).unwrap();
    let (w, h, _) = gfx.surface_pixels(window).unwrap();
    assert_eq!((w, h), (20, 20));
    assert_eq!(gfx.window_dpi_scale(window).unwrap(), 2.0);
}
