//! Growable, append-only command storage for a retained window

use lumen_core::{Allocator, GfxError, Result};

use crate::command::Command;

/// Default number of command slots reserved by the first push
pub const INITIAL_CAPACITY: usize = 64;

/// Per-window list of recorded commands.
///
/// Owns every payload (copied text, copied paths) until [`CommandBuffer::reset`].
/// Storage and payload bytes are accounted through the backend's [`Allocator`].
#[derive(Debug)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    initial_capacity: usize,
    /// Slots accounted with the allocator
    capacity: usize,
    ready: bool,
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new(INITIAL_CAPACITY)
    }
}

impl CommandBuffer {
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            commands: Vec::new(),
            initial_capacity: initial_capacity.max(1),
            capacity: 0,
            ready: false,
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set once the frame that recorded these commands has ended
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    fn grow(&mut self, alloc: &dyn Allocator) -> Result<()> {
        let new_capacity = if self.capacity == 0 {
            self.initial_capacity
        } else {
            self.capacity
                .checked_mul(2)
                .ok_or_else(|| GfxError::Overflow("command buffer capacity".into()))?
        };
        let slot = std::mem::size_of::<Command>();
        let new_bytes = new_capacity
            .checked_mul(slot)
            .ok_or_else(|| GfxError::Overflow("command buffer bytes".into()))?;

        alloc.reserve(new_bytes)?;
        if self
            .commands
            .try_reserve_exact(new_capacity - self.commands.len())
            .is_err()
        {
            alloc.release(new_bytes)?;
            return Err(GfxError::OutOfMemory(format!(
                "{new_capacity} command slots"
            )));
        }

        let old_bytes = self.capacity * slot;
        self.capacity = new_capacity;
        tracing::trace!(capacity = new_capacity, "command buffer grown");
        if old_bytes > 0 {
            alloc.release(old_bytes)?;
        }
        Ok(())
    }

    /// Append a command, taking ownership of its payload.
    ///
    /// On failure the payload is released before the error is returned.
    pub fn push(&mut self, command: Command, alloc: &dyn Allocator) -> Result<()> {
        if self.commands.len() >= self.capacity {
            if let Err(err) = self.grow(alloc) {
                if let Some(bytes) = command.payload_bytes() {
                    if let Err(free_err) = alloc.release(bytes) {
                        tracing::warn!("payload release after failed push: {free_err}");
                    }
                }
                return Err(err);
            }
        }
        self.commands.push(command);
        Ok(())
    }

    /// Free every payload and empty the list, keeping storage.
    ///
    /// Every payload is released even if an earlier release fails; the first failure
    /// is returned.
    pub fn reset(&mut self, alloc: &dyn Allocator) -> Result<()> {
        let mut first = Ok(());
        for command in self.commands.drain(..) {
            if let Some(bytes) = command.payload_bytes() {
                if let Err(err) = alloc.release(bytes) {
                    if first.is_ok() {
                        first = Err(err);
                    }
                }
            }
        }
        self.ready = false;
        first
    }

    /// Reset and give the storage back (window teardown)
    pub fn release_storage(&mut self, alloc: &dyn Allocator) -> Result<()> {
        let reset = self.reset(alloc);
        let bytes = self.capacity * std::mem::size_of::<Command>();
        self.capacity = 0;
        self.commands = Vec::new();
        let storage = if bytes > 0 {
            alloc.release(bytes)
        } else {
            Ok(())
        };
        reset.and(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Color, CountingAllocator, Handle, PathBuilder, Point, Rect};

    fn text(alloc: &CountingAllocator, s: &str) -> Command {
        alloc.reserve(s.len() + 1).unwrap();
        Command::Text {
            font: Handle::new(1, 1),
            text: s.to_string(),
            origin: Point::ZERO,
            color: Color::BLACK,
        }
    }

    #[test]
    fn test_push_preserves_order() {
        let alloc = CountingAllocator::new();
        let mut buffer = CommandBuffer::new(2);
        for i in 0..5 {
            buffer
                .push(
                    Command::PushClip {
                        rect: Rect::new(i as f32, 0.0, 1.0, 1.0),
                    },
                    &alloc,
                )
                .unwrap();
        }
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.capacity(), 8);
        for (i, command) in buffer.commands().iter().enumerate() {
            assert_eq!(
                *command,
                Command::PushClip {
                    rect: Rect::new(i as f32, 0.0, 1.0, 1.0)
                }
            );
        }
    }

    #[test]
    fn test_reset_frees_each_payload_once() {
        let alloc = CountingAllocator::new();
        let mut buffer = CommandBuffer::default();
        buffer.push(Command::PopClip, &alloc).unwrap();
        let storage_reserves = alloc.reserves();

        for i in 0..3 {
            buffer.push(text(&alloc, &format!("run {i}")), &alloc).unwrap();
        }
        let path = PathBuilder::new().move_to(0.0, 0.0).line_to(1.0, 1.0).build();
        alloc.reserve(crate::command::path_payload_bytes(&path)).unwrap();
        buffer
            .push(
                Command::Path {
                    path,
                    bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
                    color: Color::BLACK,
                },
                &alloc,
            )
            .unwrap();
        assert_eq!(alloc.reserves(), storage_reserves + 4);

        let releases = alloc.releases();
        buffer.reset(&alloc).unwrap();
        assert_eq!(alloc.releases() - releases, 4);
        assert_eq!(buffer.len(), 0);

        buffer.reset(&alloc).unwrap();
        assert_eq!(alloc.releases() - releases, 4);
    }

    #[test]
    fn test_failed_push_frees_payload() {
        let alloc = CountingAllocator::new();
        let mut buffer = CommandBuffer::new(1);
        buffer.push(Command::PopClip, &alloc).unwrap();

        let command = text(&alloc, "payload");
        let before = alloc.in_use();
        alloc.fail_next_reserve();
        let err = buffer.push(command, &alloc).unwrap_err();
        assert!(matches!(err, GfxError::OutOfMemory(_)));
        assert_eq!(alloc.in_use(), before - 8);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_release_storage_returns_everything() {
        let alloc = CountingAllocator::new();
        let mut buffer = CommandBuffer::new(4);
        for _ in 0..6 {
            buffer.push(text(&alloc, "x"), &alloc).unwrap();
        }
        buffer.release_storage(&alloc).unwrap();
        assert_eq!(alloc.in_use(), 0);
        assert_eq!(buffer.capacity(), 0);
    }
}
