//! Clip rectangles to device scissors

use lumen_core::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scissor {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Scissor {
    pub fn full(device: (u32, u32)) -> Self {
        Self {
            x: 0,
            y: 0,
            width: device.0,
            height: device.1,
        }
    }
}

/// Scissor for the active clip (frame space), scaled by `dpi` and clamped to the
/// device. `None` when nothing would be visible. `flip_y` is for bottom-left
/// origin targets.
pub fn scissor_for(clip: Option<Rect>, dpi: f32, device: (u32, u32), flip_y: bool) -> Option<Scissor> {
    let Some(clip) = clip else {
        return Some(Scissor::full(device));
    };
    let (dw, dh) = (device.0 as f32, device.1 as f32);
    let scaled = clip.scale(dpi);
    let x0 = scaled.x.floor().clamp(0.0, dw);
    let y0 = scaled.y.floor().clamp(0.0, dh);
    let x1 = scaled.right().ceil().clamp(0.0, dw);
    let y1 = scaled.bottom().ceil().clamp(0.0, dh);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let (width, height) = ((x1 - x0) as u32, (y1 - y0) as u32);
    let y = if flip_y { dh - y1 } else { y0 };
    Some(Scissor {
        x: x0 as u32,
        y: y as u32,
        width,
        height,
    })
}
