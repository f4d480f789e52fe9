//! Elevation bands, optionally over a surface-minus-terrain difference

use std::path::{Path, PathBuf};

use log::info;

use crate::bands::{BandSpec, ElevationBand, NoiseFilter};
use crate::errors::BandResult;
use crate::features::FeatureProperties;
use crate::raster::{GeoTiffLoader, RasterGrid};

use super::extractor_strategy::BandStrategy;

/// `{bottom, top}` features from a step or explicit ranges
pub struct ElevationBandStrategy {
    spec: BandSpec,
    /// Terrain model for difference mode
    dtm: Option<PathBuf>,
    /// Noise size in metres
    noise_filter_size: f64,
    loader: GeoTiffLoader,
}

impl ElevationBandStrategy {
    pub fn new(spec: BandSpec, dtm: Option<PathBuf>, noise_filter_size: f64) -> Self {
        ElevationBandStrategy { spec, dtm, noise_filter_size, loader: GeoTiffLoader::new() }
    }
}

impl BandStrategy for ElevationBandStrategy {
    fn name(&self) -> &'static str {
        "elevation"
    }

    /// Loads the surface model, subtracting the terrain model when one is set
    ///
    /// Difference cells are `max(dsm - dtm, 0)`; nodata in either input
    /// stays nodata. Mismatched grids fail before any band work.
    fn load_grid(&self, source: &Path) -> BandResult<RasterGrid> {
        let dsm = self.loader.load(source)?;
        match &self.dtm {
            None => Ok(dsm),
            Some(dtm_path) => {
                info!("Subtracting terrain model {}", dtm_path.display());
                let dtm = self.loader.load(dtm_path)?;
                dsm.clamped_difference(&dtm)
            },
        }
    }

    fn plan_bands(&self, grid: &RasterGrid) -> Vec<ElevationBand> {
        if self.spec.needs_value_range() {
            self.spec.plan(grid.valid_range())
        } else {
            self.spec.plan(None)
        }
    }

    fn noise_filter(&self, grid: &RasterGrid) -> NoiseFilter {
        NoiseFilter::from_physical(self.noise_filter_size, grid.resolution(), grid.linear_unit())
    }

    fn properties(&self, band: &ElevationBand) -> FeatureProperties {
        FeatureProperties::Band(*band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    fn grid(values: Vec<f64>) -> RasterGrid {
        RasterGrid::from_values(2, 2, values, None, GeoTransform::north_up(0.0, 2.0, 0.5, 0.5)).unwrap()
    }

    #[test]
    fn test_stepped_bands_use_valid_range() {
        let strategy = ElevationBandStrategy::new(BandSpec::Step(5.0), None, 0.0);
        let bands = strategy.plan_bands(&grid(vec![1.2, 3.0, 7.5, 12.1]));
        assert_eq!(bands.first(), Some(&ElevationBand::new(1.0, 6.0)));
        assert_eq!(bands.last().map(|b| b.top), Some(13.0));
    }

    #[test]
    fn test_noise_filter_scales_with_resolution() {
        let strategy = ElevationBandStrategy::new(BandSpec::Step(1.0), None, 1.0);
        let filter = strategy.noise_filter(&grid(vec![0.0; 4]));
        let element = filter.element().unwrap();
        assert_eq!((element.width(), element.height()), (5, 5));

        let disabled = ElevationBandStrategy::new(BandSpec::Step(1.0), None, 0.0);
        assert!(disabled.noise_filter(&grid(vec![0.0; 4])).is_identity());
    }

    #[test]
    fn test_band_properties() {
        let strategy = ElevationBandStrategy::new(BandSpec::Step(1.0), None, 0.0);
        let band = ElevationBand::new(2.0, 3.0);
        assert_eq!(strategy.properties(&band), FeatureProperties::Band(band));
    }
}
