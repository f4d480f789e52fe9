//! TIFF validation utilities
//!
//! Checks applied while walking the file structure so that malformed files
//! fail with a clear error instead of a bogus seek.

use log::{debug, error, warn};
use std::io::SeekFrom;

use crate::errors::{BandTraceError, BandResult};
use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;

/// Validates an IFD offset to ensure it's within reasonable bounds
///
/// # Arguments
/// * `offset` - The offset to validate
/// * `file_size` - The file size for validation
pub fn validate_ifd_offset(offset: u64, file_size: u64) -> BandResult<()> {
    if offset >= file_size || offset < 8 {
        return Err(BandTraceError::GenericError(format!(
            "Invalid IFD offset: {} (file size: {})",
            offset, file_size
        )));
    }

    Ok(())
}

/// Gets the file size for validation purposes
///
/// # Returns
/// The file size or u64::MAX if it couldn't be determined
pub fn get_file_size(reader: &mut dyn SeekableReader) -> BandResult<u64> {
    let current_position = reader.stream_position()?;
    let file_size = match reader.seek(SeekFrom::End(0)) {
        Ok(size) => size,
        Err(e) => {
            warn!("Could not determine file size: {}", e);
            u64::MAX
        }
    };
    reader.seek(SeekFrom::Start(current_position))?;

    Ok(file_size)
}

/// Validates the BigTIFF header
///
/// After the version number (43) BigTIFF stores the offset size, which must
/// be 8, and a reserved zero.
pub fn validate_bigtiff_header(
    reader: &mut dyn SeekableReader,
    byte_order_handler: &dyn ByteOrderHandler
) -> BandResult<()> {
    let offset_size = byte_order_handler.read_u16(reader)?;
    let zeros = byte_order_handler.read_u16(reader)?;

    debug!("BigTIFF offset size: {}, reserved: {}", offset_size, zeros);

    if offset_size != header::BIGTIFF_OFFSET_SIZE || zeros != 0 {
        error!("Invalid BigTIFF header: offset_size={}, zeros={}", offset_size, zeros);
        return Err(BandTraceError::InvalidBigTIFFHeader);
    }

    Ok(())
}

/// Validates that a strip or tile lies entirely inside the file
pub fn validate_chunk(offset: u64, byte_count: u64, file_size: u64) -> BandResult<()> {
    match offset.checked_add(byte_count) {
        Some(end) if end <= file_size => Ok(()),
        _ => Err(BandTraceError::GenericError(format!(
            "Data chunk at offset {} with {} bytes exceeds file size {}",
            offset, byte_count, file_size
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ifd_offset_bounds() {
        assert!(validate_ifd_offset(8, 100).is_ok());
        assert!(validate_ifd_offset(4, 100).is_err());
        assert!(validate_ifd_offset(100, 100).is_err());
    }

    #[test]
    fn test_file_size_keeps_position() {
        let mut cursor = Cursor::new(vec![0u8; 42]);
        cursor.set_position(10);
        assert_eq!(get_file_size(&mut cursor).unwrap(), 42);
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn test_chunk_outside_file_is_rejected() {
        assert!(validate_chunk(10, 20, 30).is_ok());
        assert!(validate_chunk(10, 21, 30).is_err());
        assert!(validate_chunk(u64::MAX, 2, 30).is_err());
    }
}
