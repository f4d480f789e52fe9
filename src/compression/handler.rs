//! Compression handler trait definition

use crate::errors::BandResult;

/// Strategy trait for decoding the chunks of one compression method
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip or tile
    fn decompress(&self, data: &[u8]) -> BandResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;
}
