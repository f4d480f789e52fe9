//! Tile-based raster data reading
//!
//! Tiled TIFFs store the image as equally sized rectangles. Edge tiles are
//! padded to the full tile size; the padding is dropped when copying.

use log::{debug, info};

use crate::errors::{BandTraceError, BandResult};
use crate::io::seekable::SeekableReader;

use super::chunk_decoder::ChunkDecoder;

/// Reads first-band values from a tiled TIFF
pub struct TileReader<'a> {
    decoder: &'a ChunkDecoder,
    width: usize,
    height: usize,
    tile_width: usize,
    tile_height: usize,
}

impl<'a> TileReader<'a> {
    /// Create a new tile reader
    ///
    /// # Arguments
    /// * `decoder` - Decoder configured for the file's compression and samples
    /// * `width`, `height` - Image dimensions in pixels
    /// * `tile_width`, `tile_height` - TileWidth and TileLength
    pub fn new(decoder: &'a ChunkDecoder, width: usize, height: usize, tile_width: usize, tile_height: usize) -> BandResult<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(BandTraceError::GenericError("Tile dimensions must be positive".to_string()));
        }

        Ok(TileReader { decoder, width, height, tile_width, tile_height })
    }

    fn tiles_across(&self) -> usize {
        (self.width + self.tile_width - 1) / self.tile_width
    }

    fn tiles_down(&self) -> usize {
        (self.height + self.tile_height - 1) / self.tile_height
    }

    /// Number of tiles covering one sample plane
    pub fn tiles_per_plane(&self) -> usize {
        self.tiles_across() * self.tiles_down()
    }

    /// Decodes all tiles of the first plane into `values`
    ///
    /// # Arguments
    /// * `reader` - The open file
    /// * `offsets`, `byte_counts` - TileOffsets and TileByteCounts
    /// * `values` - Row-major output buffer of `width * height` cells
    pub fn read_into(
        &self,
        reader: &mut dyn SeekableReader,
        offsets: &[u64],
        byte_counts: &[u64],
        values: &mut [f64],
    ) -> BandResult<()> {
        let tile_count = self.tiles_per_plane();
        if offsets.len() < tile_count || byte_counts.len() < tile_count {
            return Err(BandTraceError::GenericError(format!(
                "Expected {} tiles, found {} offsets and {} byte counts",
                tile_count, offsets.len(), byte_counts.len()
            )));
        }

        info!("Tile size: {}x{}, {} tiles", self.tile_width, self.tile_height, tile_count);

        for tile_idx in 0..tile_count {
            debug!("Reading tile {} at offset {} with {} bytes",
                   tile_idx, offsets[tile_idx], byte_counts[tile_idx]);

            let tile = self.decoder.decode(reader, offsets[tile_idx], byte_counts[tile_idx], self.tile_width)?;

            let tile_row = (tile_idx / self.tiles_across()) * self.tile_height;
            let tile_col = (tile_idx % self.tiles_across()) * self.tile_width;
            let copy_width = self.tile_width.min(self.width - tile_col);
            let copy_height = self.tile_height.min(self.height - tile_row);

            for r in 0..copy_height {
                let src = r * self.tile_width;
                if src + copy_width > tile.len() {
                    break;
                }
                let dst = (tile_row + r) * self.width + tile_col;
                values[dst..dst + copy_width].copy_from_slice(&tile[src..src + copy_width]);
            }
        }

        Ok(())
    }
}
