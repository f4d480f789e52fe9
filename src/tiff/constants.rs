//! TIFF and GeoTIFF constants
//!
//! Only the codes the raster loader actually interprets are listed here.

/// TIFF header constants
pub mod header {
    /// Standard TIFF version number (42)
    pub const TIFF_VERSION: u16 = 42;

    /// BigTIFF version number (43)
    pub const BIG_TIFF_VERSION: u16 = 43;

    /// BigTIFF offset size (8 bytes)
    pub const BIGTIFF_OFFSET_SIZE: u16 = 8;
}

/// Field types as defined in the TIFF spec
pub mod field_types {
    pub const BYTE: u16 = 1;       // 8-bit unsigned integer
    pub const ASCII: u16 = 2;      // 8-bit byte containing ASCII character
    pub const SHORT: u16 = 3;      // 16-bit unsigned integer
    pub const LONG: u16 = 4;       // 32-bit unsigned integer
    pub const RATIONAL: u16 = 5;   // Two LONGs: numerator and denominator
    pub const SBYTE: u16 = 6;      // 8-bit signed integer
    pub const UNDEFINED: u16 = 7;  // 8-bit byte with unspecified format
    pub const SSHORT: u16 = 8;     // 16-bit signed integer
    pub const SLONG: u16 = 9;      // 32-bit signed integer
    pub const SRATIONAL: u16 = 10; // Two SLONGs: numerator and denominator
    pub const FLOAT: u16 = 11;     // Single precision IEEE floating point
    pub const DOUBLE: u16 = 12;    // Double precision IEEE floating point
    pub const LONG8: u16 = 16;     // BigTIFF 64-bit unsigned integer
    pub const SLONG8: u16 = 17;    // BigTIFF 64-bit signed integer
    pub const IFD8: u16 = 18;      // BigTIFF 64-bit IFD offset
}

/// Tags read by the raster loader
pub mod tags {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const PREDICTOR: u16 = 317;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const SAMPLE_FORMAT: u16 = 339;

    // GeoTIFF tags
    pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
    pub const MODEL_TIEPOINT_TAG: u16 = 33922;
    pub const MODEL_TRANSFORMATION_TAG: u16 = 34264;
    pub const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
    pub const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;
    pub const GEO_ASCII_PARAMS_TAG: u16 = 34737;

    // GDAL specific tags
    pub const GDAL_NODATA: u16 = 42113;
}

/// Compression codes
pub mod compression {
    pub const NONE: u64 = 1;
    pub const DEFLATE: u64 = 8;
    pub const ZSTD: u64 = 14;
    pub const ADOBE_DEFLATE: u64 = 32946;
    pub const ZSTD_GDAL: u64 = 50000;
}

/// Planar configuration values
pub mod planar_config {
    pub const CHUNKY: u64 = 1;
    pub const PLANAR: u64 = 2;
}

/// Sample format values
pub mod sample_format {
    pub const UNSIGNED: u64 = 1;
    pub const SIGNED: u64 = 2;
    pub const IEEEFP: u64 = 3;
}

/// Predictor values
pub mod predictor {
    pub const NONE: u64 = 1;
    pub const HORIZONTAL_DIFFERENCING: u64 = 2;
    pub const FLOATING_POINT: u64 = 3;
}

/// GeoTIFF Key ID constants
pub mod geo_keys {
    pub const RASTER_TYPE: u16 = 1025;        // GTRasterTypeGeoKey
    pub const GEOGRAPHIC_TYPE: u16 = 2048;    // GeographicTypeGeoKey
    pub const PROJECTED_CS_TYPE: u16 = 3072;  // ProjectedCSTypeGeoKey
    pub const PROJ_LINEAR_UNITS: u16 = 3076;  // ProjLinearUnitsGeoKey
}

/// GTRasterTypeGeoKey values
pub mod raster_type {
    pub const PIXEL_IS_AREA: u16 = 1;
    pub const PIXEL_IS_POINT: u16 = 2;
}

/// GeoTIFF linear unit codes
pub mod linear_units {
    pub const METRE: u16 = 9001;
    pub const FOOT: u16 = 9002;
    pub const US_SURVEY_FOOT: u16 = 9003;
}

/// GeoKey value meaning "user defined"
pub const USER_DEFINED: u16 = 32767;
