//! Lumen Paint
//!
//! Retained-mode drawing for hosts that own their paint cycle:
//!
//! - [`Command`]: a closed set of eight tagged draw operations
//! - [`CommandBuffer`]: per-window append-only storage owning command payloads
//! - [`Recorder`]: turns draw primitives into transformed commands
//! - [`replay`]: walks a finished buffer into a host [`SnapshotSink`]

pub mod buffer;
pub mod command;
pub mod recorder;
pub mod replay;

pub use buffer::{CommandBuffer, INITIAL_CAPACITY};
pub use command::{Command, CommandKind};
pub use recorder::Recorder;
pub use replay::{replay, ReplayResources, ReplayStats, SnapshotSink};
