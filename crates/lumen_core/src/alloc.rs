//! Allocator collaborator
//!
//! Backends account every heap acquisition that the pipeline owns (command
//! storage, copied glyph-run text, copied path commands) through an [`Allocator`].
//! The default [`SystemAllocator`] never refuses; [`CountingAllocator`] enforces a
//! byte budget and keeps counters so exhaustion and release paths are observable.

use std::cell::Cell;

use crate::error::{GfxError, Result};

pub trait Allocator {
    /// Account for `bytes` about to be allocated
    fn reserve(&self, bytes: usize) -> Result<()>;

    /// Account for `bytes` just freed
    fn release(&self, bytes: usize) -> Result<()>;
}

/// Unlimited allocator backed by the global heap
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn reserve(&self, _bytes: usize) -> Result<()> {
        Ok(())
    }

    fn release(&self, _bytes: usize) -> Result<()> {
        Ok(())
    }
}

/// Budgeted allocator with reserve/release counters
#[derive(Debug, Default)]
pub struct CountingAllocator {
    limit: Option<usize>,
    in_use: Cell<usize>,
    reserves: Cell<usize>,
    releases: Cell<usize>,
    fail_next: Cell<bool>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any reservation that would push usage past `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Make the next `reserve` fail regardless of budget
    pub fn fail_next_reserve(&self) {
        self.fail_next.set(true);
    }

    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    pub fn reserves(&self) -> usize {
        self.reserves.get()
    }

    pub fn releases(&self) -> usize {
        self.releases.get()
    }
}

impl Allocator for CountingAllocator {
    fn reserve(&self, bytes: usize) -> Result<()> {
        if self.fail_next.replace(false) {
            return Err(GfxError::OutOfMemory(format!("refused {bytes} bytes")));
        }
        let total = self
            .in_use
            .get()
            .checked_add(bytes)
            .ok_or_else(|| GfxError::Overflow("allocator usage".into()))?;
        if let Some(limit) = self.limit {
            if total > limit {
                return Err(GfxError::OutOfMemory(format!(
                    "{bytes} bytes exceeds budget of {limit}"
                )));
            }
        }
        self.in_use.set(total);
        self.reserves.set(self.reserves.get() + 1);
        Ok(())
    }

    fn release(&self, bytes: usize) -> Result<()> {
        let remaining = self.in_use.get().checked_sub(bytes).ok_or_else(|| {
            GfxError::State(format!("released {bytes} bytes that were never reserved"))
        })?;
        self.in_use.set(remaining);
        self.releases.set(self.releases.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_enforced() {
        let alloc = CountingAllocator::with_limit(100);
        assert!(alloc.reserve(60).is_ok());
        assert!(matches!(alloc.reserve(60), Err(GfxError::OutOfMemory(_))));
        alloc.release(60).unwrap();
        assert!(alloc.reserve(60).is_ok());
        assert_eq!(alloc.reserves(), 2);
        assert_eq!(alloc.releases(), 1);
    }

    #[test]
    fn test_fail_next_reserve() {
        let alloc = CountingAllocator::new();
        alloc.fail_next_reserve();
        assert!(alloc.reserve(1).is_err());
        assert!(alloc.reserve(1).is_ok());
    }

    #[test]
    fn test_over_release_is_state_error() {
        let alloc = CountingAllocator::new();
        assert!(matches!(alloc.release(4), Err(GfxError::State(_))));
    }
}
