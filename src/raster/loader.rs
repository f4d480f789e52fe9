//! GeoTIFF → [`RasterGrid`] loading
//!
//! Reads band 1 of the first IFD, whatever the strip/tile layout,
//! compression, predictor or sample type, together with its georeferencing.

use std::path::Path;

use log::{debug, info, warn};

use crate::compression::CompressionFactory;
use crate::coordinate::{self, LinearUnit};
use crate::errors::{BandTraceError, BandResult};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, planar_config, predictor, sample_format, tags};
use crate::tiff::geo_key_parser::{GeoInfo, GeoKeyParser};
use crate::tiff::{validation, TiffReader, IFD};

use super::chunk_decoder::ChunkDecoder;
use super::geotransform::GeoTransform;
use super::grid::RasterGrid;
use super::samples::SampleLayout;
use super::strip_reader::StripReader;
use super::tile_reader::TileReader;

/// Loader for single-band GeoTIFF elevation rasters
pub struct GeoTiffLoader {
    /// Sentinel used when the file declares no GDAL_NODATA value
    default_nodata: Option<f64>,
}

impl Default for GeoTiffLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoTiffLoader {
    pub fn new() -> Self {
        GeoTiffLoader { default_nodata: None }
    }

    /// Treats `value` as nodata when the file does not declare a sentinel
    pub fn with_default_nodata(mut self, value: Option<f64>) -> Self {
        self.default_nodata = value;
        self
    }

    /// Loads band 1 of a GeoTIFF file
    ///
    /// # Arguments
    /// * `path` - Path to the GeoTIFF
    ///
    /// # Returns
    /// The grid with its transform, EPSG code (if known), linear unit and
    /// nodata mask
    pub fn load(&self, path: &Path) -> BandResult<RasterGrid> {
        let mut tiff_reader = TiffReader::new();
        let (tiff, mut reader) = tiff_reader.load(path)?;
        debug!("{}", tiff);
        let ifd = tiff.main_ifd().ok_or_else(|| {
            BandTraceError::GenericError(format!("{} contains no image", path.display()))
        })?;

        self.load_ifd(&tiff_reader, &mut reader, ifd)
    }

    /// Loads band 1 of an already parsed IFD
    pub fn load_ifd(&self, tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> BandResult<RasterGrid> {
        let width = Self::single_value(tiff_reader, reader, ifd, tags::IMAGE_WIDTH)
            .map_err(|_| BandTraceError::MissingDimensions)? as usize;
        let height = Self::single_value(tiff_reader, reader, ifd, tags::IMAGE_LENGTH)
            .map_err(|_| BandTraceError::MissingDimensions)? as usize;
        if width == 0 || height == 0 {
            return Err(BandTraceError::MissingDimensions);
        }

        let layout = Self::sample_layout(tiff_reader, reader, ifd)?;
        let compression_code = Self::optional_value(tiff_reader, reader, ifd, tags::COMPRESSION, compression::NONE)?;
        let predictor_code = Self::optional_value(tiff_reader, reader, ifd, tags::PREDICTOR, predictor::NONE)?;

        info!("Raster {}x{}, {} bits, sample format {}, compression {}, predictor {}",
              width, height, layout.bits_per_sample, layout.sample_format, compression_code, predictor_code);

        let decoder = ChunkDecoder::new(
            CompressionFactory::create_handler(compression_code)?,
            predictor_code,
            layout,
            validation::get_file_size(reader)?,
        );

        let mut values = vec![f64::NAN; width * height];
        if ifd.is_tiled() {
            let tile_width = Self::single_value(tiff_reader, reader, ifd, tags::TILE_WIDTH)? as usize;
            let tile_height = Self::single_value(tiff_reader, reader, ifd, tags::TILE_LENGTH)? as usize;
            let offsets = tiff_reader.read_tag_values(reader, ifd, tags::TILE_OFFSETS)?;
            let byte_counts = tiff_reader.read_tag_values(reader, ifd, tags::TILE_BYTE_COUNTS)?;

            TileReader::new(&decoder, width, height, tile_width, tile_height)?
                .read_into(reader, &offsets, &byte_counts, &mut values)?;
        } else {
            let rows_per_strip = Self::optional_value(tiff_reader, reader, ifd, tags::ROWS_PER_STRIP, height as u64)? as usize;
            let offsets = tiff_reader.read_tag_values(reader, ifd, tags::STRIP_OFFSETS)?;
            let byte_counts = tiff_reader.read_tag_values(reader, ifd, tags::STRIP_BYTE_COUNTS)?;

            StripReader::new(&decoder, width, height, rows_per_strip)
                .read_into(reader, &offsets, &byte_counts, &mut values)?;
        }

        let geo_info = GeoKeyParser::extract_geo_info(tiff_reader, reader, ifd)?;
        let transform = geo_info.transform.unwrap_or_else(|| {
            warn!("Raster has no georeferencing, using an identity pixel grid");
            GeoTransform::default()
        });

        let nodata = self.read_nodata(tiff_reader, reader, ifd);
        let epsg = geo_info.epsg_code();
        let linear_unit = Self::linear_unit(&geo_info, epsg);

        debug!("Raster CRS: {:?}, unit: {}, nodata: {:?}", epsg, linear_unit.name(), nodata);

        Ok(RasterGrid::from_values(height, width, values, nodata, transform)?.with_crs(epsg, linear_unit))
    }

    /// Validates the sample description and narrows it to band 1
    fn sample_layout(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> BandResult<SampleLayout> {
        let samples_per_pixel = Self::optional_value(tiff_reader, reader, ifd, tags::SAMPLES_PER_PIXEL, 1)? as usize;
        let bits = if ifd.has_tag(tags::BITS_PER_SAMPLE) {
            tiff_reader.read_tag_values(reader, ifd, tags::BITS_PER_SAMPLE)?
        } else {
            vec![1]
        };
        let formats = if ifd.has_tag(tags::SAMPLE_FORMAT) {
            tiff_reader.read_tag_values(reader, ifd, tags::SAMPLE_FORMAT)?
        } else {
            vec![sample_format::UNSIGNED]
        };

        // Mixed sample sizes would make band 1 unaddressable in chunky data
        if bits.is_empty() || formats.is_empty() || bits.iter().any(|b| *b != bits[0]) {
            return Err(BandTraceError::UnsupportedSampleLayout(format!("mixed bits per sample {:?}", bits)));
        }

        let planar = Self::optional_value(tiff_reader, reader, ifd, tags::PLANAR_CONFIGURATION, planar_config::CHUNKY)?;
        let interleaved = if planar == planar_config::PLANAR { 1 } else { samples_per_pixel };

        SampleLayout::new(bits[0] as u16, formats[0], interleaved, tiff_reader.byte_order()?)
    }

    /// Reads GDAL_NODATA, falling back to the configured default
    fn read_nodata(&self, tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> Option<f64> {
        if !ifd.has_tag(tags::GDAL_NODATA) {
            return self.default_nodata;
        }

        match tiff_reader.read_tag_ascii(reader, ifd, tags::GDAL_NODATA) {
            Ok(text) => match text.parse::<f64>() {
                Ok(value) => {
                    info!("Found NoData value: '{}'", text);
                    Some(value)
                },
                Err(_) => {
                    warn!("Ignoring unparsable NoData value '{}'", text);
                    self.default_nodata
                },
            },
            Err(e) => {
                warn!("Failed to read NoData value: {}", e);
                self.default_nodata
            },
        }
    }

    /// Unit from ProjLinearUnitsGeoKey, else from the CRS definition
    fn linear_unit(geo_info: &GeoInfo, epsg: Option<u32>) -> LinearUnit {
        if let Some(unit) = geo_info.linear_unit_code.and_then(LinearUnit::from_geokey) {
            return unit;
        }

        match epsg.map(coordinate::lookup) {
            Some(Ok(def)) => def.linear_unit,
            _ => LinearUnit::Metre,
        }
    }

    fn single_value(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> BandResult<u64> {
        tiff_reader
            .read_tag_values(reader, ifd, tag)?
            .first()
            .copied()
            .ok_or(BandTraceError::TagNotFound(tag))
    }

    fn optional_value(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16, default: u64) -> BandResult<u64> {
        if ifd.has_tag(tag) {
            Self::single_value(tiff_reader, reader, ifd, tag)
        } else {
            Ok(default)
        }
    }
}
