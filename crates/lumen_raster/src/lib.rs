//! Lumen Raster
//!
//! CPU rendering shared by the raster and snapshot backends:
//!
//! - [`RasterCanvas`]: a tiny-skia pixmap with a clip mask and the frame transform
//! - [`RasterTexture`]: premultiplied texture storage with a lazily cached view
//! - [`RasterSnapshot`]: a [`lumen_paint::SnapshotSink`] painting replayed commands

pub mod canvas;
pub mod snapshot;
pub mod texture;

pub use canvas::RasterCanvas;
pub use snapshot::RasterSnapshot;
pub use texture::RasterTexture;
