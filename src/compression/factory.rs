//! Factory for creating compression handlers

use crate::errors::{BandTraceError, BandResult};
use crate::tiff::constants::compression;
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
use super::zstandard::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a compression handler for the given compression code
    pub fn create_handler(code: u64) -> BandResult<Box<dyn CompressionHandler>> {
        match code {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::DEFLATE | compression::ADOBE_DEFLATE => Ok(Box::new(AdobeDeflateHandler)),
            compression::ZSTD | compression::ZSTD_GDAL => Ok(Box::new(ZstdHandler)),
            _ => Err(BandTraceError::UnsupportedCompression(code))
        }
    }
}
