pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod raster;
pub mod coordinate;
pub mod bands;
pub mod contour;
pub mod features;
pub mod labels;
pub mod extractor;
pub mod commands;
pub mod errors;
pub mod api;

pub use crate::api::BandTrace;
pub use crate::errors::{BandResult, BandTraceError};

pub use tiff::TiffReader;
pub use raster::{GeoTiffLoader, RasterGrid};
pub use extractor::{BandExtractor, ExtractionMode};
pub use coordinate::{CoordinateMapper, CoordinateTransformer, Pixel, Point};
