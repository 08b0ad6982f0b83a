//! Lumen Platform
//!
//! CPU backends for native host toolkits:
//!
//! - [`RasterBackend`]: immediate drawing into per-window tiny-skia surfaces
//! - [`SnapshotBackend`]: retained recording replayed in the host's paint callback
//! - [`init_logging`]: `tracing` subscriber driven by `LUMEN_LOG`
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{BackendConfig, Color, Gfx, Rect, WindowConfig, WindowSystem};
//! use lumen_platform::RasterBackend;
//!
//! let mut gfx = RasterBackend::new(BackendConfig::default()).unwrap();
//! let window = gfx.create_window(&WindowConfig::new(100, 100)).unwrap();
//!
//! gfx.begin_frame(window, 100, 100, 1.0).unwrap();
//! gfx.clear(Color::WHITE).unwrap();
//! gfx.draw_rect(&Rect::new(10.0, 10.0, 50.0, 50.0), Color::RED, 4.0).unwrap();
//! gfx.end_frame(window).unwrap();
//!
//! assert_eq!(gfx.pixel(window, 30, 30).unwrap(), Some([255, 0, 0, 255]));
//! ```

mod host;
pub mod logging;
pub mod raster;
pub mod resources;
pub mod snapshot;
pub mod window;

pub use host::RedrawCallback;
pub use logging::{init_logging, LOG_ENV};
pub use raster::RasterBackend;
pub use resources::RegistryResources;
pub use snapshot::SnapshotBackend;
pub use window::HostWindow;
