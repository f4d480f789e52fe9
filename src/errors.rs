//! Custom error types for band extraction and label exchange
//!
//! Every fallible operation in the crate returns [`BandResult`]. Fatal
//! conditions abort the whole invocation; the empty-result conditions of the
//! pipeline (no contours for a band, degenerate rings) are not errors at all
//! and never reach this type.

use std::fmt;
use std::io;

/// Message reported when label export runs before any import
pub const NO_LABELS_MESSAGE: &str = "Failed to find the labels file. Are you sure you added some labels?";

/// Structural problems with a band specification
///
/// These are detected before any raster is read.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The range list is empty
    EmptyRangeList,
    /// A token did not split into exactly two parts
    MalformedRange(String),
    /// A token had a non-numeric bound
    NonNumericRange(String),
    /// A token had `bottom >= top`
    InvertedRange(String),
    /// Two ranges overlap after sorting
    OverlappingRanges { first: (f64, f64), second: (f64, f64) },
    /// The uniform step is not a positive finite number
    InvalidStep(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyRangeList => write!(f, "Please add a range."),
            ValidationError::MalformedRange(token) => {
                write!(f, "Ranges must have a beginning and an end (got '{}').", token)
            },
            ValidationError::NonNumericRange(token) => write!(
                f,
                "Please make sure that both the beginning and end of the range are numeric (got '{}').",
                token
            ),
            ValidationError::InvertedRange(token) => {
                write!(f, "The end of the range must be greater than the beginning (got '{}').", token)
            },
            ValidationError::OverlappingRanges { first, second } => write!(
                f,
                "Please make sure that the ranges don't overlap ({}-{} and {}-{}).",
                first.0, first.1, second.0, second.1
            ),
            ValidationError::InvalidStep(step) => {
                write!(f, "The interval must be a positive number (got '{}').", step)
            },
        }
    }
}

/// Crate-wide error type
#[derive(Debug)]
pub enum BandTraceError {
    /// I/O error
    IoError(io::Error),
    /// Invalid TIFF header
    InvalidHeader,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    InvalidBigTIFFHeader,
    /// Unsupported TIFF version
    UnsupportedVersion(u16),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported field type
    UnsupportedFieldType(u16),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Unsupported pixel layout (bits per sample, sample format)
    UnsupportedSampleLayout(String),
    /// Image dimensions not found
    MissingDimensions,
    /// Malformed band specification
    Validation(ValidationError),
    /// A precondition of the invocation does not hold
    Precondition(String),
    /// EPSG code missing from the CRS registry
    UnsupportedCrs(u32),
    /// Reprojection between two CRSs failed
    Projection { from: u32, to: u32, reason: String },
    /// No annotation store exists yet
    NoLabels,
    /// Annotation document could not be read or written
    Xml(String),
    /// GeoJSON could not be read or written
    Json(serde_json::Error),
    /// Configuration file could not be parsed
    Config(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for BandTraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandTraceError::IoError(e) => write!(f, "I/O error: {}", e),
            BandTraceError::InvalidHeader => write!(f, "Invalid TIFF header"),
            BandTraceError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            BandTraceError::InvalidBigTIFFHeader => write!(f, "Invalid BigTIFF header"),
            BandTraceError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            BandTraceError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            BandTraceError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            BandTraceError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            BandTraceError::UnsupportedSampleLayout(msg) => write!(f, "Unsupported sample layout: {}", msg),
            BandTraceError::MissingDimensions => write!(f, "Image dimensions not found"),
            BandTraceError::Validation(e) => write!(f, "{}", e),
            BandTraceError::Precondition(msg) => write!(f, "{}", msg),
            BandTraceError::UnsupportedCrs(code) => write!(f, "Unsupported or unknown EPSG code: {}", code),
            BandTraceError::Projection { from, to, reason } => {
                write!(f, "Reprojection from EPSG:{} to EPSG:{} failed: {}", from, to, reason)
            },
            BandTraceError::NoLabels => write!(f, "{}", NO_LABELS_MESSAGE),
            BandTraceError::Xml(msg) => write!(f, "Annotation XML error: {}", msg),
            BandTraceError::Json(e) => write!(f, "GeoJSON error: {}", e),
            BandTraceError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BandTraceError::GenericError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BandTraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BandTraceError::IoError(e) => Some(e),
            BandTraceError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BandTraceError {
    fn from(error: io::Error) -> Self {
        BandTraceError::IoError(error)
    }
}

impl From<ValidationError> for BandTraceError {
    fn from(error: ValidationError) -> Self {
        BandTraceError::Validation(error)
    }
}

impl From<serde_json::Error> for BandTraceError {
    fn from(error: serde_json::Error) -> Self {
        BandTraceError::Json(error)
    }
}

impl From<quick_xml::Error> for BandTraceError {
    fn from(error: quick_xml::Error) -> Self {
        BandTraceError::Xml(error.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for BandTraceError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        BandTraceError::Xml(error.to_string())
    }
}

impl From<toml::de::Error> for BandTraceError {
    fn from(error: toml::de::Error) -> Self {
        BandTraceError::Config(error.to_string())
    }
}

impl From<String> for BandTraceError {
    fn from(msg: String) -> Self {
        BandTraceError::GenericError(msg)
    }
}

/// Result type for crate operations
pub type BandResult<T> = Result<T, BandTraceError>;
