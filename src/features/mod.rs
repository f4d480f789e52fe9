//! GeoJSON feature output and input

pub mod assembler;
pub mod geojson;

pub use assembler::{FeatureAssembler, FeatureProperties};
pub use geojson::{Feature, FeatureCollection, Geometry};
