//! Handler for ZSTD compressed data

use log::{debug, warn};

use crate::errors::{BandTraceError, BandResult};
use super::handler::CompressionHandler;

/// ZSTD compression handler (compression codes 14 and 50000)
pub struct ZstdHandler;

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8]) -> BandResult<Vec<u8>> {
        debug!("ZSTD decompressing {} bytes", data.len());
        if data.is_empty() {
            return Ok(Vec::new());
        }

        zstd::decode_all(data).map_err(|e| {
            warn!("ZSTD decompression error: {}", e);
            BandTraceError::GenericError(format!("ZSTD decompression error: {}", e))
        })
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }
}
