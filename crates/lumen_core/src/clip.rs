//! Bounded clip-rectangle stack

use smallvec::SmallVec;

use crate::error::{GfxError, Result};
use crate::geometry::Rect;

/// Maximum number of nested clip rectangles
pub const MAX_CLIP_DEPTH: usize = 32;

/// Stack of clip rectangles where each entry is already intersected with the one
/// beneath it, so the top is always the active clip.
#[derive(Clone, Debug, Default)]
pub struct ClipStack {
    entries: SmallVec<[Rect; 8]>,
}

impl ClipStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `rect` intersected with the current clip and return the new active clip.
    ///
    /// An empty intersection is stored as a zero-size rectangle at `rect`'s origin.
    pub fn push(&mut self, rect: Rect) -> Result<Rect> {
        rect.validate()?;
        if self.entries.len() >= MAX_CLIP_DEPTH {
            return Err(GfxError::range(format!(
                "clip stack depth limit of {MAX_CLIP_DEPTH} reached"
            )));
        }
        let clipped = match self.entries.last() {
            Some(top) => top
                .intersect(&rect)
                .unwrap_or(Rect::new(rect.x, rect.y, 0.0, 0.0)),
            None => rect,
        };
        self.entries.push(clipped);
        Ok(clipped)
    }

    pub fn pop(&mut self) -> Result<Rect> {
        self.entries
            .pop()
            .ok_or_else(|| GfxError::state("pop_clip on an empty clip stack"))
    }

    pub fn current(&self) -> Option<Rect> {
        self.entries.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_intersects() {
        let mut stack = ClipStack::new();
        stack.push(Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        let active = stack.push(Rect::new(40.0, 40.0, 20.0, 20.0)).unwrap();
        assert_eq!(active, Rect::new(40.0, 40.0, 10.0, 10.0));
    }

    #[test]
    fn test_disjoint_push_is_empty_not_error() {
        let mut stack = ClipStack::new();
        stack.push(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let active = stack.push(Rect::new(20.0, 20.0, 5.0, 5.0)).unwrap();
        assert!(active.is_empty());
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_pop_empty_is_state() {
        let mut stack = ClipStack::new();
        assert!(matches!(stack.pop(), Err(GfxError::State(_))));
    }

    #[test]
    fn test_negative_rect_no_side_effect() {
        let mut stack = ClipStack::new();
        stack.push(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(matches!(
            stack.push(Rect::new(0.0, 0.0, -1.0, 10.0)),
            Err(GfxError::Range(_))
        ));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_push_pop_restores_active_clip() {
        let mut stack = ClipStack::new();
        stack.push(Rect::new(5.0, 5.0, 30.0, 30.0)).unwrap();
        let before = stack.current();
        stack.push(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        stack.pop().unwrap();
        assert_eq!(stack.current(), before);
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = ClipStack::new();
        for _ in 0..MAX_CLIP_DEPTH {
            stack.push(Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        }
        assert!(matches!(
            stack.push(Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(GfxError::Range(_))
        ));
        assert_eq!(stack.depth(), MAX_CLIP_DEPTH);
    }
}
