//! Shared decoding of one strip or tile

use std::io::SeekFrom;

use log::trace;

use crate::compression::CompressionHandler;
use crate::errors::BandResult;
use crate::io::seekable::SeekableReader;
use crate::tiff::validation;

use super::samples::SampleLayout;

/// Turns the raw bytes of a chunk into first-band sample values
pub struct ChunkDecoder {
    compression: Box<dyn CompressionHandler>,
    predictor: u64,
    layout: SampleLayout,
    file_size: u64,
}

impl ChunkDecoder {
    pub fn new(compression: Box<dyn CompressionHandler>, predictor: u64, layout: SampleLayout, file_size: u64) -> Self {
        ChunkDecoder { compression, predictor, layout, file_size }
    }

    /// Reads, decompresses and decodes one chunk
    ///
    /// # Arguments
    /// * `offset`, `byte_count` - Location of the chunk in the file
    /// * `width` - Chunk width in pixels, for predictor rows
    ///
    /// # Returns
    /// First-band values in row-major chunk order; may be shorter than the
    /// nominal chunk when the encoder truncated the last strip
    pub fn decode(&self, reader: &mut dyn SeekableReader, offset: u64, byte_count: u64, width: usize) -> BandResult<Vec<f64>> {
        validation::validate_chunk(offset, byte_count, self.file_size)?;

        reader.seek(SeekFrom::Start(offset))?;
        let mut compressed = vec![0u8; byte_count as usize];
        reader.read_exact(&mut compressed)?;

        let mut data = self.compression.decompress(&compressed)?;
        trace!("Chunk at {}: {} -> {} bytes ({})", offset, byte_count, data.len(), self.compression.name());

        self.layout.undo_predictor(&mut data, width, self.predictor)?;
        Ok(self.layout.decode_first_samples(&data))
    }
}
