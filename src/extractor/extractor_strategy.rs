//! Band extraction strategy definitions
//!
//! A strategy decides how a raster is loaded, which bands are cut from it,
//! how noise is filtered and what properties each band feature carries. The
//! [`BandExtractor`] facade runs the shared pipeline for whichever strategy
//! the factory hands it.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::bands::{BandSpec, ElevationBand, NoiseFilter};
use crate::coordinate::{self, CoordinateMapper};
use crate::errors::{BandResult, ValidationError};
use crate::features::{FeatureAssembler, FeatureCollection, FeatureProperties};
use crate::raster::RasterGrid;
use crate::utils::output;
use crate::utils::progress::ProgressTracker;

use super::elevation_strategy::ElevationBandStrategy;
use super::heightmap_strategy::HeightmapStrategy;
use super::pipeline;

/// Strategy for turning one raster into band features
pub trait BandStrategy {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Loads the grid the bands are cut from
    ///
    /// # Arguments
    /// * `source` - Path of the primary raster
    ///
    /// # Returns
    /// The grid, or an error if it cannot be read or a precondition fails
    fn load_grid(&self, source: &Path) -> BandResult<RasterGrid>;

    /// Ordered bands to extract from `grid`
    fn plan_bands(&self, grid: &RasterGrid) -> Vec<ElevationBand>;

    /// Noise filter sized for `grid`
    fn noise_filter(&self, grid: &RasterGrid) -> NoiseFilter;

    /// Properties of the feature emitted for `band`
    fn properties(&self, band: &ElevationBand) -> FeatureProperties;

    /// Check if this strategy supports the given file format
    fn supports_format(&self, file_path: &Path) -> bool {
        let extension = file_path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("")
            .to_lowercase();

        matches!(extension.as_str(), "tif" | "tiff")
    }
}

/// Parameters selecting an extraction strategy
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionMode {
    /// `{bottom, top}` features from a step or explicit ranges
    Elevation {
        bands: String,
        /// Terrain model subtracted from the source first
        dtm: Option<PathBuf>,
        /// Noise size in metres
        noise_filter_size: f64,
    },
    /// `{level}` features from a uniform step
    Heightmap {
        interval: String,
        /// Noise kernel size in pixels
        kernel_size: i64,
    },
}

/// Factory for creating band strategies
pub struct BandStrategyFactory;

impl BandStrategyFactory {
    /// Creates the strategy for `mode`
    ///
    /// The band specification is validated here, before any raster is read.
    pub fn create_strategy(mode: ExtractionMode) -> BandResult<Box<dyn BandStrategy>> {
        match mode {
            ExtractionMode::Elevation { bands, dtm, noise_filter_size } => {
                debug!("Using elevation band strategy");
                let spec = BandSpec::parse(&bands)?;
                Ok(Box::new(ElevationBandStrategy::new(spec, dtm, noise_filter_size)))
            },
            ExtractionMode::Heightmap { interval, kernel_size } => {
                debug!("Using heightmap strategy");
                let step = interval
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ValidationError::InvalidStep(interval.clone()))?;
                Ok(Box::new(HeightmapStrategy::new(step, kernel_size)?))
            },
        }
    }
}

/// Runs the band pipeline for a strategy
///
/// This facade validates everything that can fail fatally (target CRS,
/// raster CRS, dtm registration) before any band is processed.
pub struct BandExtractor {
    strategy: Box<dyn BandStrategy>,
    target_epsg: u32,
    show_progress: bool,
}

impl BandExtractor {
    /// Create a new extractor
    ///
    /// # Arguments
    /// * `strategy` - How bands are planned and labelled
    /// * `target_epsg` - EPSG code of the output coordinates
    pub fn new(strategy: Box<dyn BandStrategy>, target_epsg: u32) -> Self {
        BandExtractor { strategy, target_epsg, show_progress: false }
    }

    /// Draws a progress bar over the bands
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Extracts band features from a raster file
    ///
    /// # Returns
    /// The feature collection; bands without polygons are omitted
    pub fn extract(&self, source: &Path) -> BandResult<FeatureCollection> {
        info!("Extracting {} bands from {}", self.strategy.name(), source.display());

        if !self.strategy.supports_format(source) {
            warn!("{} does not look like a GeoTIFF, trying anyway", source.display());
        }
        coordinate::lookup(self.target_epsg)?;

        let grid = self.strategy.load_grid(source)?;
        let mapper = CoordinateMapper::new(&grid, self.target_epsg)?;
        self.extract_grid(&grid, &mapper)
    }

    /// Extracts band features from an already loaded grid
    pub fn extract_grid(&self, grid: &RasterGrid, mapper: &CoordinateMapper) -> BandResult<FeatureCollection> {
        let bands = self.strategy.plan_bands(grid);
        let filter = self.strategy.noise_filter(grid);
        info!("{} bands planned over a {}x{} grid", bands.len(), grid.rows(), grid.cols());

        let progress = if self.show_progress {
            ProgressTracker::new(bands.len() as u64, "Tracing bands")
        } else {
            ProgressTracker::hidden(bands.len() as u64)
        };

        let mut assembler = FeatureAssembler::new();
        for band in &bands {
            progress.set_message(&format!("band {}", band));
            let polygons = pipeline::band_polygons(grid, band, &filter, mapper)?;
            if !assembler.add_band(&polygons, self.strategy.properties(band)) {
                debug!("Omitting empty band {}", band);
            }
            progress.increment(1);
        }
        progress.finish();

        info!("{} of {} bands produced features", assembler.len(), bands.len());
        Ok(assembler.finish())
    }

    /// Extracts band features and writes them as GeoJSON
    ///
    /// Nothing is written when extraction fails.
    ///
    /// # Returns
    /// The number of features written
    pub fn extract_to_file(&self, source: &Path, output_path: &Path) -> BandResult<usize> {
        let collection = self.extract(source)?;
        output::write_atomic(output_path, collection.to_json()?.as_bytes())?;
        info!("Wrote {} features to {}", collection.len(), output_path.display());
        Ok(collection.len())
    }
}
