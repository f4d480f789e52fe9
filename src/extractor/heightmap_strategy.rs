//! Heightmap levels over a single grid

use std::path::Path;

use crate::bands::{BandSpec, ElevationBand, NoiseFilter};
use crate::errors::BandResult;
use crate::features::FeatureProperties;
use crate::raster::{GeoTiffLoader, RasterGrid};

use super::extractor_strategy::BandStrategy;

/// Sentinel assumed when a heightmap raster declares no nodata value
pub const NO_ELEVATION: f64 = -9999.0;

/// `{level}` features from a uniform step, noise kernel given in pixels
pub struct HeightmapStrategy {
    spec: BandSpec,
    kernel_size: i64,
    loader: GeoTiffLoader,
}

impl HeightmapStrategy {
    /// # Arguments
    /// * `step` - Band width; must be positive
    /// * `kernel_size` - Closing kernel in pixels; `<= 0` disables filtering
    pub fn new(step: f64, kernel_size: i64) -> BandResult<Self> {
        Ok(HeightmapStrategy {
            spec: BandSpec::step(step)?,
            kernel_size,
            loader: GeoTiffLoader::new().with_default_nodata(Some(NO_ELEVATION)),
        })
    }
}

impl BandStrategy for HeightmapStrategy {
    fn name(&self) -> &'static str {
        "heightmap"
    }

    fn load_grid(&self, source: &Path) -> BandResult<RasterGrid> {
        self.loader.load(source)
    }

    fn plan_bands(&self, grid: &RasterGrid) -> Vec<ElevationBand> {
        self.spec.plan(grid.valid_range())
    }

    fn noise_filter(&self, _grid: &RasterGrid) -> NoiseFilter {
        NoiseFilter::from_kernel_pixels(self.kernel_size)
    }

    fn properties(&self, band: &ElevationBand) -> FeatureProperties {
        FeatureProperties::Level(band.bottom)
    }
}
