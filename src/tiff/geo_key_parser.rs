//! GeoTIFF Metadata and GeoKey parsing functionality
//!
//! Interprets the GeoKey directory and the model tags of an IFD into the
//! pieces a raster grid needs: an affine transform, an EPSG code and a
//! linear unit.

use log::{debug, warn};

use crate::errors::{BandTraceError, BandResult};
use crate::io::seekable::SeekableReader;
use crate::raster::GeoTransform;
use crate::tiff::constants::{geo_keys, raster_type, tags, USER_DEFINED};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// One entry of the GeoKey directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    /// 0 when the value is stored in `value_offset` itself
    pub tiff_tag_location: u16,
    pub count: u16,
    pub value_offset: u16,
}

impl GeoKeyEntry {
    pub fn new(key_id: u16, tiff_tag_location: u16, count: u16, value_offset: u16) -> Self {
        GeoKeyEntry { key_id, tiff_tag_location, count, value_offset }
    }

    /// Short value stored directly in the directory, if any
    pub fn inline_value(&self) -> Option<u16> {
        if self.tiff_tag_location == 0 {
            Some(self.value_offset)
        } else {
            None
        }
    }
}

/// Structure to hold geospatial information extracted from a GeoTIFF
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    /// ProjectedCSTypeGeoKey
    pub projected_cs_code: Option<u32>,
    /// GeographicTypeGeoKey
    pub geographic_cs_code: Option<u32>,
    /// ProjLinearUnitsGeoKey
    pub linear_unit_code: Option<u16>,
    /// GTRasterTypeGeoKey, PixelIsArea when absent
    pub raster_type: u16,
    /// Pixel → plane transform, corner-anchored
    pub transform: Option<GeoTransform>,
}

impl GeoInfo {
    /// EPSG code of the raster's CRS
    ///
    /// The projected code wins over the geographic one; user-defined codes
    /// count as unknown.
    pub fn epsg_code(&self) -> Option<u32> {
        self.projected_cs_code
            .or(self.geographic_cs_code)
            .filter(|code| *code != USER_DEFINED as u32 && *code != 0)
    }

    /// Check if the GeoInfo contains valid georeferencing information
    pub fn is_georeferenced(&self) -> bool {
        self.transform.is_some()
    }
}

/// Parser for GeoTIFF geographic metadata
pub struct GeoKeyParser;

impl GeoKeyParser {
    /// Parse the GeoKey directory from an IFD
    ///
    /// The directory is an array of shorts: a four-short header
    /// (version, revision, minor revision, key count) followed by four
    /// shorts per key.
    ///
    /// # Returns
    /// The key entries, empty when the IFD has no directory
    pub fn parse_geo_key_directory(
        tiff_reader: &TiffReader,
        reader: &mut dyn SeekableReader,
        ifd: &IFD,
    ) -> BandResult<Vec<GeoKeyEntry>> {
        if !ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
            return Ok(Vec::new());
        }

        let values = tiff_reader.read_tag_values(reader, ifd, tags::GEO_KEY_DIRECTORY_TAG)?;
        if values.len() < 4 {
            return Err(BandTraceError::GenericError("Invalid GeoKey directory header".to_string()));
        }

        let num_keys = values[3] as usize;
        debug!("GeoKey directory: version={}, revision={}.{}, keys={}",
               values[0], values[1], values[2], num_keys);

        let geo_keys: Vec<GeoKeyEntry> = values[4..]
            .chunks_exact(4)
            .take(num_keys)
            .map(|k| GeoKeyEntry::new(k[0] as u16, k[1] as u16, k[2] as u16, k[3] as u16))
            .collect();

        if geo_keys.len() < num_keys {
            warn!("GeoKey directory declares {} keys but holds {}", num_keys, geo_keys.len());
        }

        Ok(geo_keys)
    }

    /// Builds the affine transform from the model tags
    ///
    /// ModelTransformationTag is used when present, otherwise the first
    /// tiepoint together with ModelPixelScaleTag.
    fn read_transform(
        tiff_reader: &TiffReader,
        reader: &mut dyn SeekableReader,
        ifd: &IFD,
    ) -> BandResult<Option<GeoTransform>> {
        if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
            let m = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_TRANSFORMATION_TAG)?;
            if m.len() >= 8 {
                return Ok(Some(GeoTransform::new(m[0], m[1], m[3], m[4], m[5], m[7])));
            }
            warn!("ModelTransformationTag has {} values, ignoring it", m.len());
        }

        if !ifd.has_tag(tags::MODEL_TIEPOINT_TAG) || !ifd.has_tag(tags::MODEL_PIXEL_SCALE_TAG) {
            return Ok(None);
        }

        let tie_points = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_TIEPOINT_TAG)?;
        let scale = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
        if tie_points.len() < 6 || scale.len() < 2 {
            warn!("Incomplete tiepoint or pixel scale tags");
            return Ok(None);
        }

        // Tiepoint (i, j) maps to world (x, y); rows grow southwards
        let (i, j, x, y) = (tie_points[0], tie_points[1], tie_points[3], tie_points[4]);
        let (sx, sy) = (scale[0], scale[1]);
        Ok(Some(GeoTransform::north_up(x - i * sx, y + j * sy, sx, sy)))
    }

    /// Extract geospatial information from a TIFF IFD
    ///
    /// # Arguments
    /// * `tiff_reader` - Reader that parsed the file, for byte order
    /// * `reader` - The open file
    /// * `ifd` - The IFD to extract information from
    pub fn extract_geo_info(
        tiff_reader: &TiffReader,
        reader: &mut dyn SeekableReader,
        ifd: &IFD,
    ) -> BandResult<GeoInfo> {
        let mut geo_info = GeoInfo {
            raster_type: raster_type::PIXEL_IS_AREA,
            ..GeoInfo::default()
        };

        for key in Self::parse_geo_key_directory(tiff_reader, reader, ifd)? {
            let value = match key.inline_value() {
                Some(value) => value,
                None => continue,
            };

            match key.key_id {
                geo_keys::PROJECTED_CS_TYPE => geo_info.projected_cs_code = Some(value as u32),
                geo_keys::GEOGRAPHIC_TYPE => geo_info.geographic_cs_code = Some(value as u32),
                geo_keys::PROJ_LINEAR_UNITS => geo_info.linear_unit_code = Some(value),
                geo_keys::RASTER_TYPE => geo_info.raster_type = value,
                _ => {},
            }
        }

        geo_info.transform = Self::read_transform(tiff_reader, reader, ifd)?.map(|t| {
            if geo_info.raster_type == raster_type::PIXEL_IS_POINT {
                // Model coordinates refer to pixel centers; move the origin to the corner
                GeoTransform::new(t.a, t.b, t.c - 0.5 * (t.a + t.b), t.d, t.e, t.f - 0.5 * (t.d + t.e))
            } else {
                t
            }
        });

        debug!("GeoInfo: {:?}", geo_info);
        Ok(geo_info)
    }
}
