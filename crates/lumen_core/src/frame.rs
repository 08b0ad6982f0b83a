//! Frame lifecycle shared by every backend
//!
//! `Idle -> InFrame -> Idle`. [`FrameState`] owns the pieces of drawing state that
//! must behave identically whether a backend executes immediately or records:
//! the active transform, the clip stack and the window the open frame targets.

use crate::clip::ClipStack;
use crate::error::{GfxError, Result};
use crate::geometry::Rect;
use crate::handle::Handle;
use crate::transform::Mat3;

/// The frame opened by `begin_frame`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveFrame {
    pub window: Handle,
    pub width: i32,
    pub height: i32,
    pub dpi_scale: f32,
    /// Commands are recorded for later replay instead of executed
    pub retained: bool,
}

impl ActiveFrame {
    /// Logical frame bounds, used as the clear rectangle
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

#[derive(Debug, Default)]
pub struct FrameState {
    frame: Option<ActiveFrame>,
    transform: Mat3,
    clip: ClipStack,
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Argument and state checks for `begin_frame`, without side effects
    pub fn check_begin(&self, width: i32, height: i32, dpi_scale: f32) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(GfxError::range(format!(
                "frame size {width}x{height} must be positive"
            )));
        }
        if dpi_scale.is_nan() || dpi_scale <= 0.0 {
            return Err(GfxError::range(format!(
                "dpi scale {dpi_scale} must be positive"
            )));
        }
        if self.frame.is_some() {
            return Err(GfxError::state("begin_frame while a frame is open"));
        }
        Ok(())
    }

    /// Open a frame. Retained frames freeze the current transform, which must be simple.
    pub fn begin(
        &mut self,
        window: Handle,
        width: i32,
        height: i32,
        dpi_scale: f32,
        retained: bool,
    ) -> Result<ActiveFrame> {
        self.check_begin(width, height, dpi_scale)?;
        if retained && !self.transform.is_simple() {
            return Err(GfxError::Unsupported(
                "retained frames require a scale/translate transform".into(),
            ));
        }
        let frame = ActiveFrame {
            window,
            width,
            height,
            dpi_scale,
            retained,
        };
        self.clip.clear();
        self.frame = Some(frame);
        Ok(frame)
    }

    /// Close the frame opened for `window`.
    ///
    /// The frame is cleared even when `window` does not match.
    pub fn end(&mut self, window: Handle) -> Result<ActiveFrame> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| GfxError::state("end_frame without begin_frame"))?;
        self.clip.clear();
        if frame.window != window {
            return Err(GfxError::state(format!(
                "end_frame for {window} but frame was opened for {}",
                frame.window
            )));
        }
        Ok(frame)
    }

    /// Forcibly drop an open frame (backend teardown)
    pub fn abort(&mut self) -> Option<ActiveFrame> {
        self.clip.clear();
        self.frame.take()
    }

    pub fn active(&self) -> Result<&ActiveFrame> {
        self.frame
            .as_ref()
            .ok_or_else(|| GfxError::state("drawing outside of a frame"))
    }

    pub fn transform(&self) -> &Mat3 {
        &self.transform
    }

    /// Replace the active transform; `None` resets to identity.
    ///
    /// Inside a retained frame a general transform is rejected and the previous
    /// transform stays in effect.
    pub fn set_transform(&mut self, transform: Option<&Mat3>) -> Result<()> {
        let next = transform.copied().unwrap_or(Mat3::IDENTITY);
        if let Some(frame) = &self.frame {
            if frame.retained && !next.is_simple() {
                return Err(GfxError::Unsupported(
                    "rotation/shear is not representable in a retained frame".into(),
                ));
            }
        }
        self.transform = next;
        Ok(())
    }

    /// Push a clip given in user space. Returns the transformed rectangle as pushed,
    /// before intersection with the enclosing clip.
    pub fn push_clip(&mut self, rect: &Rect) -> Result<Rect> {
        rect.validate()?;
        self.active()?;
        let device = self.transform.transform_rect_bounds(rect);
        self.clip.push(device)?;
        Ok(device)
    }

    pub fn pop_clip(&mut self) -> Result<()> {
        self.active()?;
        self.clip.pop().map(|_| ())
    }

    /// Intersection of every pushed clip, in frame space
    pub fn clip(&self) -> Option<Rect> {
        self.clip.current()
    }

    pub fn clip_depth(&self) -> usize {
        self.clip.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Handle {
        Handle::new(1, 1)
    }

    #[test]
    fn test_begin_rejects_bad_dimensions() {
        let mut state = FrameState::new();
        assert!(matches!(
            state.begin(window(), 0, 10, 1.0, false),
            Err(GfxError::Range(_))
        ));
        assert!(matches!(
            state.begin(window(), 10, -1, 1.0, false),
            Err(GfxError::Range(_))
        ));
        assert!(matches!(
            state.begin(window(), 10, 10, 0.0, false),
            Err(GfxError::Range(_))
        ));
        assert!(!state.is_in_frame());
    }

    #[test]
    fn test_double_begin_is_state() {
        let mut state = FrameState::new();
        state.begin(window(), 10, 10, 1.0, false).unwrap();
        assert!(matches!(
            state.begin(window(), 10, 10, 1.0, false),
            Err(GfxError::State(_))
        ));
    }

    #[test]
    fn test_end_mismatch_clears_frame() {
        let mut state = FrameState::new();
        state.begin(window(), 10, 10, 1.0, false).unwrap();
        assert!(matches!(
            state.end(Handle::new(2, 1)),
            Err(GfxError::State(_))
        ));
        assert!(!state.is_in_frame());
        assert!(matches!(state.end(window()), Err(GfxError::State(_))));
    }

    #[test]
    fn test_retained_rejects_general_transform() {
        let mut state = FrameState::new();
        state.set_transform(Some(&Mat3::rotate(0.5))).unwrap();
        assert!(matches!(
            state.begin(window(), 10, 10, 1.0, true),
            Err(GfxError::Unsupported(_))
        ));
        assert!(!state.is_in_frame());
        assert!(state.begin(window(), 10, 10, 1.0, false).is_ok());
    }

    #[test]
    fn test_set_transform_inside_retained_frame() {
        let mut state = FrameState::new();
        state.begin(window(), 10, 10, 1.0, true).unwrap();
        let scale = Mat3::scale(2.0, 2.0);
        state.set_transform(Some(&scale)).unwrap();
        assert!(state.set_transform(Some(&Mat3::rotate(1.0))).is_err());
        assert_eq!(*state.transform(), scale);
        state.set_transform(None).unwrap();
        assert_eq!(*state.transform(), Mat3::IDENTITY);
    }

    #[test]
    fn test_push_clip_is_transformed() {
        let mut state = FrameState::new();
        state
            .set_transform(Some(&Mat3::scale_translate(2.0, 2.0, 1.0, 1.0)))
            .unwrap();
        state.begin(window(), 100, 100, 1.0, false).unwrap();
        let pushed = state.push_clip(&Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(pushed, Rect::new(1.0, 1.0, 20.0, 20.0));
        assert_eq!(state.clip(), Some(pushed));
    }

    #[test]
    fn test_clip_requires_frame() {
        let mut state = FrameState::new();
        assert!(matches!(
            state.push_clip(&Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(GfxError::State(_))
        ));
        assert!(matches!(state.pop_clip(), Err(GfxError::State(_))));
    }

    #[test]
    fn test_begin_resets_clip() {
        let mut state = FrameState::new();
        state.begin(window(), 10, 10, 1.0, false).unwrap();
        state.push_clip(&Rect::new(0.0, 0.0, 5.0, 5.0)).unwrap();
        state.abort();
        state.begin(window(), 10, 10, 1.0, false).unwrap();
        assert_eq!(state.clip_depth(), 0);
    }
}
