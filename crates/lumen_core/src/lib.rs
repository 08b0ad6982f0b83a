//! Lumen Core
//!
//! Shared building blocks for every Lumen graphics backend:
//!
//! - **Handles & Registry**: generation-checked handles to reference-counted resources
//! - **Geometry**: colors, rectangles, paths and the 3x3 transform
//! - **Frame State**: the `Idle -> InFrame -> Idle` lifecycle with its clip stack
//! - **Backend Contract**: the [`Gfx`], [`TextBackend`] and [`WindowSystem`] traits
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{Mat3, Point, Rect};
//!
//! let m = Mat3::scale_translate(2.0, 3.0, 10.0, 20.0);
//! assert!(m.is_simple());
//! assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(12.0, 23.0));
//!
//! let r = m.transform_rect(&Rect::new(0.0, 0.0, 5.0, 5.0));
//! assert_eq!(r, Rect::new(10.0, 20.0, 10.0, 15.0));
//! ```

pub mod alloc;
pub mod bootstrap;
pub mod clip;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gfx;
pub mod handle;
pub mod path;
pub mod registry;
pub mod transform;
pub mod validate;

pub use alloc::{Allocator, CountingAllocator, SystemAllocator};
pub use bootstrap::HostBootstrap;
pub use clip::{ClipStack, MAX_CLIP_DEPTH};
pub use color::Color;
pub use config::{BackendConfig, GpuConfig};
pub use error::{ErrorKind, GfxError, Result};
pub use frame::{ActiveFrame, FrameState};
pub use geometry::{Point, Rect};
pub use gfx::{
    FontDesc, Gfx, TextBackend, TextMetrics, TextureFormat, WindowConfig, WindowSystem,
};
pub use handle::Handle;
pub use path::{Path, PathBuilder, PathCommand};
pub use registry::{Registry, Resource, ResourceKind, TypedResource};
pub use transform::Mat3;
