use std::path::{Path, PathBuf};

use log::info;

use crate::coordinate::{self, CoordinateMapper};
use crate::errors::BandResult;
use crate::extractor::{BandExtractor, BandStrategyFactory, ExtractionMode};
use crate::features::FeatureCollection;
use crate::labels::{self, AnnotationStore, DocumentHeader, LabeledObject};
use crate::raster::{self, GeoTiffLoader, RasterGrid};
use crate::utils::config::Config;
use crate::utils::output;

/// Main interface to the bandtrace library
pub struct BandTrace {
    config: Config,
    show_progress: bool,
}

impl BandTrace {
    /// Create a new BandTrace instance
    ///
    /// # Arguments
    /// * `config` - Defaults for everything the calls below do not specify
    pub fn new(config: Config) -> Self {
        BandTrace { config, show_progress: false }
    }

    /// Draw progress bars while tracing bands
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output path of a call, falling back to the configured one
    fn output_path(&self, output: Option<&Path>) -> PathBuf {
        output.map(Path::to_path_buf).unwrap_or_else(|| self.config.output.clone())
    }

    fn run_extraction(&self, mode: ExtractionMode, source: &Path, output: Option<&Path>) -> BandResult<PathBuf> {
        let strategy = BandStrategyFactory::create_strategy(mode)?;
        let extractor = BandExtractor::new(strategy, self.config.epsg).with_progress(self.show_progress);

        let output_path = self.output_path(output);
        extractor.extract_to_file(source, &output_path)?;
        Ok(output_path)
    }

    /// Extract elevation band features from a raster
    ///
    /// # Arguments
    /// * `source` - Surface model GeoTIFF
    /// * `bands` - Numeric step or comma-separated `bottom-top` ranges
    /// * `dtm` - Optional terrain model; bands are then cut from `source - dtm`
    /// * `output` - GeoJSON destination, or the configured default
    ///
    /// # Returns
    /// The path the feature collection was written to
    pub fn extract_bands(&self, source: &Path, bands: &str, dtm: Option<&Path>, output: Option<&Path>) -> BandResult<PathBuf> {
        let mode = ExtractionMode::Elevation {
            bands: bands.to_string(),
            dtm: dtm.map(Path::to_path_buf),
            noise_filter_size: self.config.noise_filter_size,
        };
        self.run_extraction(mode, source, output)
    }

    /// Extract `{level}` heightmap features with a uniform step
    pub fn extract_heightmap(&self, source: &Path, interval: &str, output: Option<&Path>) -> BandResult<PathBuf> {
        let mode = ExtractionMode::Heightmap {
            interval: interval.to_string(),
            kernel_size: self.config.kernel_size,
        };
        self.run_extraction(mode, source, output)
    }

    fn load_raster(&self, raster: &Path) -> BandResult<RasterGrid> {
        GeoTiffLoader::new().load(raster)
    }

    /// Append the polygons of a GeoJSON file to a raster's annotation store
    ///
    /// # Arguments
    /// * `raster` - Raster the labels are drawn on
    /// * `features` - GeoJSON in the configured label source CRS
    /// * `store` - Annotation document, created if missing
    ///
    /// # Returns
    /// The appended objects with their ids
    pub fn import_labels(&self, raster: &Path, features: &Path, store: &Path) -> BandResult<Vec<LabeledObject>> {
        coordinate::lookup(self.config.label_source_epsg)?;
        let collection = FeatureCollection::from_file(features)?;

        let grid = self.load_raster(raster)?;
        let mapper = CoordinateMapper::new(&grid, self.config.label_source_epsg)?;
        let new_labels = labels::labels_from_features(&collection, &mapper)?;

        let header = DocumentHeader::for_raster(raster, store, grid.rows(), grid.cols());
        AnnotationStore::new(store).append(new_labels, &header)
    }

    /// Export the verified labels of a store as GeoJSON
    ///
    /// # Returns
    /// The number of exported features, or `NoLabels` when nothing was ever imported
    pub fn export_labels(&self, raster: &Path, store: &Path, output: Option<&Path>) -> BandResult<usize> {
        let objects = AnnotationStore::new(store).exportable_objects()?;
        coordinate::lookup(self.config.epsg)?;

        let grid = self.load_raster(raster)?;
        let mapper = CoordinateMapper::new(&grid, self.config.epsg)?;
        let collection = labels::features_from_labels(&objects, &mapper)?;

        let output_path = self.output_path(output);
        output::write_atomic(&output_path, collection.to_json()?.as_bytes())?;
        info!("Wrote {} label features to {}", collection.len(), output_path.display());
        Ok(collection.len())
    }

    /// Render a raster to the PNG the annotation store refers to
    pub fn preview(&self, raster: &Path, output: &Path) -> BandResult<()> {
        let grid = self.load_raster(raster)?;
        raster::save_preview(&grid, output)
    }
}
