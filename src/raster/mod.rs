//! In-memory elevation rasters
//!
//! A [`RasterGrid`] is loaded once from a GeoTIFF and then only read by the
//! band pipeline. Binarized bands are [`BinaryMask`]s of the same shape.

mod chunk_decoder;
pub mod geotransform;
pub mod grid;
pub mod loader;
pub mod mask;
pub mod preview;
mod samples;
mod strip_reader;
mod tile_reader;

pub use geotransform::GeoTransform;
pub use grid::RasterGrid;
pub use loader::GeoTiffLoader;
pub use mask::BinaryMask;
pub use preview::{render_preview, save_preview};
