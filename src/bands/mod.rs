//! Band planning, binarization and noise filtering

pub mod binarize;
pub mod noise;
pub mod planner;

pub use binarize::binarize;
pub use noise::{NoiseFilter, StructuringElement};
pub use planner::{BandSpec, ElevationBand};
