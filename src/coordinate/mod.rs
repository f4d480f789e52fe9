//! Coordinate handling for geospatial data
//!
//! This module resolves EPSG codes, reprojects batches of points, and maps
//! between raster pixels and geographic coordinates.

mod crs;
mod mapper;
mod point;
mod transform;

// Re-export key types
pub use self::crs::{lookup, CoordinateSystem, CoordinateSystemFactory, CrsDefinition, LinearUnit};
pub use self::mapper::CoordinateMapper;
pub use self::point::{Pixel, Point};
pub use self::transform::{CoordinateTransformer, Reprojection};
