//! Band feature extraction from elevation rasters
//!
//! This module turns rasters into band features using a strategy pattern:
//! one strategy per kind of band output, one shared pipeline.

mod elevation_strategy;
mod extractor_strategy;
mod heightmap_strategy;
mod pipeline;

// Public exports
pub use elevation_strategy::ElevationBandStrategy;
pub use extractor_strategy::{BandStrategy, BandStrategyFactory, ExtractionMode};
pub use heightmap_strategy::{HeightmapStrategy, NO_ELEVATION};
pub use pipeline::band_polygons;

// Simple facade that runs the pipeline for a strategy
pub use extractor_strategy::BandExtractor;
