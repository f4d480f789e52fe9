//! Strip-based raster data reading
//!
//! Stripped TIFFs store the image as horizontal bands spanning the full
//! width. Strips are decoded one at a time and copied into the grid buffer.

use log::{debug, info};

use crate::errors::{BandTraceError, BandResult};
use crate::io::seekable::SeekableReader;

use super::chunk_decoder::ChunkDecoder;

/// Reads first-band values from a stripped TIFF
pub struct StripReader<'a> {
    decoder: &'a ChunkDecoder,
    width: usize,
    height: usize,
    rows_per_strip: usize,
}

impl<'a> StripReader<'a> {
    /// Create a new strip reader
    ///
    /// # Arguments
    /// * `decoder` - Decoder configured for the file's compression and samples
    /// * `width`, `height` - Image dimensions in pixels
    /// * `rows_per_strip` - RowsPerStrip, clamped to the image height
    pub fn new(decoder: &'a ChunkDecoder, width: usize, height: usize, rows_per_strip: usize) -> Self {
        StripReader {
            decoder,
            width,
            height,
            rows_per_strip: rows_per_strip.clamp(1, height.max(1)),
        }
    }

    /// Number of strips covering one sample plane
    pub fn strips_per_plane(&self) -> usize {
        (self.height + self.rows_per_strip - 1) / self.rows_per_strip
    }

    /// Decodes all strips of the first plane into `values`
    ///
    /// # Arguments
    /// * `reader` - The open file
    /// * `offsets`, `byte_counts` - StripOffsets and StripByteCounts
    /// * `values` - Row-major output buffer of `width * height` cells
    pub fn read_into(
        &self,
        reader: &mut dyn SeekableReader,
        offsets: &[u64],
        byte_counts: &[u64],
        values: &mut [f64],
    ) -> BandResult<()> {
        let strip_count = self.strips_per_plane();
        if offsets.len() < strip_count || byte_counts.len() < strip_count {
            return Err(BandTraceError::GenericError(format!(
                "Expected {} strips, found {} offsets and {} byte counts",
                strip_count, offsets.len(), byte_counts.len()
            )));
        }

        info!("Rows per strip: {}", self.rows_per_strip);
        info!("Total strips: {}", strip_count);

        for strip_idx in 0..strip_count {
            debug!("Reading strip {} at offset {} with {} bytes",
                   strip_idx, offsets[strip_idx], byte_counts[strip_idx]);

            let strip = self.decoder.decode(reader, offsets[strip_idx], byte_counts[strip_idx], self.width)?;

            let start_row = strip_idx * self.rows_per_strip;
            let rows = self.rows_per_strip.min(self.height - start_row);
            let start = start_row * self.width;
            let len = (rows * self.width).min(strip.len());
            values[start..start + len].copy_from_slice(&strip[..len]);
        }

        Ok(())
    }
}
