//! Handler for Adobe Deflate compressed data

use std::io::Read;
use flate2::read::ZlibDecoder;

use crate::errors::BandResult;
use super::handler::CompressionHandler;

/// Adobe Deflate (Zlib) compression handler (compression codes 8 and 32946)
pub struct AdobeDeflateHandler;

impl CompressionHandler for AdobeDeflateHandler {
    fn decompress(&self, data: &[u8]) -> BandResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed_data = Vec::new();
        decoder.read_to_end(&mut decompressed_data)?;
        Ok(decompressed_data)
    }

    fn name(&self) -> &'static str {
        "Adobe Deflate"
    }
}
