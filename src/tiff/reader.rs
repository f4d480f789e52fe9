//! TIFF file reader implementation
//!
//! This module implements the TIFF/BigTIFF file reader that uses the
//! Strategy pattern to handle different byte orders.

use byteorder::{BigEndian, LittleEndian};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, SeekFrom};
use std::path::Path;

use crate::errors::{BandTraceError, BandResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;
use crate::tiff::validation;

/// Hard stop for corrupt IFD chains that loop back on themselves
const MAX_IFDS: usize = 100;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader {
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Whether currently reading BigTIFF format
    is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            is_big_tiff: false,
        }
    }

    /// Returns the byte order handler, failing if no header was read yet
    fn handler(&self) -> BandResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| BandTraceError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Byte order of the file read last
    pub fn byte_order(&self) -> BandResult<ByteOrder> {
        Ok(self.handler()?.byte_order())
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Opens a TIFF file and reads its structure
    ///
    /// # Arguments
    /// * `filepath` - Path to the TIFF file to load
    ///
    /// # Returns
    /// The parsed structure plus the open, buffered file so that the caller
    /// can go on reading tag arrays and pixel data from it
    pub fn load(&mut self, filepath: &Path) -> BandResult<(TIFF, BufReader<File>)> {
        info!("Loading TIFF file: {}", filepath.display());

        let file = File::open(filepath)?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file);
        let tiff = self.read(&mut reader)?;

        Ok((tiff, reader))
    }

    /// Reads a TIFF file from the given reader
    ///
    /// 1. Detect byte order (little/big endian)
    /// 2. Check for TIFF or BigTIFF format
    /// 3. Read all IFDs (Image File Directories)
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> BandResult<TIFF> {
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = ByteOrder::detect(reader)?;
        debug!("Detected byte order: {}", byte_order.name());
        self.byte_order_handler = Some(byte_order.create_handler());

        self.is_big_tiff = self.detect_tiff_format(reader)?;
        let mut tiff = TIFF::new(self.is_big_tiff, byte_order);

        let first_ifd_offset = self.read_offset(reader)?;
        debug!("First IFD offset: {}", first_ifd_offset);

        let file_size = validation::get_file_size(reader)?;
        validation::validate_ifd_offset(first_ifd_offset, file_size)?;

        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size)?;

        info!("Read {} IFDs from TIFF file", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads the version field and validates the BigTIFF header extension
    ///
    /// # Returns
    /// `true` for BigTIFF, `false` for classic TIFF
    fn detect_tiff_format(&self, reader: &mut dyn SeekableReader) -> BandResult<bool> {
        let handler = self.handler()?;
        let version = handler.read_u16(reader)?;
        debug!("TIFF version: {}", version);

        match version {
            header::BIG_TIFF_VERSION => {
                validation::validate_bigtiff_header(reader, handler)?;
                Ok(true)
            },
            header::TIFF_VERSION => Ok(false),
            _ => Err(BandTraceError::UnsupportedVersion(version)),
        }
    }

    /// Reads a 4 or 8 byte offset depending on the format
    fn read_offset(&self, reader: &mut dyn SeekableReader) -> BandResult<u64> {
        let handler = self.handler()?;
        if self.is_big_tiff {
            Ok(handler.read_u64(reader)?)
        } else {
            Ok(handler.read_u32(reader)? as u64)
        }
    }

    /// Size in bytes of an IFD with the given number of entries
    fn ifd_size(&self, entry_count: usize) -> u64 {
        if self.is_big_tiff {
            // 8 (entry count) + 20 (each entry)
            8 + 20 * entry_count as u64
        } else {
            // 2 (entry count) + 12 (each entry)
            2 + 12 * entry_count as u64
        }
    }

    /// Reads a chain of IFDs starting from the given offset
    ///
    /// A broken link ends the chain with a warning rather than an error,
    /// so a readable first IFD is always enough.
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_ifd_offset: u64, file_size: u64) -> BandResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 && ifds.len() < MAX_IFDS {
            if ifd_offset >= file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", ifd_offset, file_size);
                break;
            }

            let ifd = match self.read_ifd(reader, ifd_offset, ifds.len()) {
                Ok(ifd) => ifd,
                Err(e) if !ifds.is_empty() => {
                    warn!("Error reading IFD {}: {}", ifds.len(), e);
                    break;
                },
                Err(e) => return Err(e),
            };

            let next_offset_position = ifd_offset + self.ifd_size(ifd.entries.len());
            ifds.push(ifd);

            if next_offset_position >= file_size {
                break;
            }
            reader.seek(SeekFrom::Start(next_offset_position))?;

            let next_ifd_offset = match self.read_offset(reader) {
                Ok(offset) => offset,
                Err(e) => {
                    warn!("Error reading next IFD offset: {}", e);
                    break;
                }
            };

            if next_ifd_offset != 0 && (next_ifd_offset >= file_size || next_ifd_offset < 8) {
                warn!("Invalid next IFD offset: {}, stopping IFD chain", next_ifd_offset);
                break;
            }
            ifd_offset = next_ifd_offset;
        }

        Ok(ifds)
    }

    /// Reads an IFD from the reader
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `offset` - Offset in the file where the IFD starts
    /// * `number` - The index of this IFD in the file
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> BandResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;
        let handler = self.handler()?;

        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };
        debug!("IFD entry count: {}", entry_count);

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            let tag = handler.read_u16(reader)?;
            let field_type = handler.read_u16(reader)?;
            let count = self.read_offset(reader)?;
            let value_offset = self.read_offset(reader)?;
            ifd.add_entry(IFDEntry::new(tag, field_type, count, value_offset));
        }

        Ok(ifd)
    }

    /// Reads the raw bytes of a tag's value array, in file byte order
    ///
    /// Inline values are rebuilt from the value/offset field, the rest are
    /// read from the file.
    pub fn read_tag_bytes(&self, reader: &mut dyn SeekableReader, entry: &IFDEntry) -> BandResult<Vec<u8>> {
        let len = entry.byte_len();

        if entry.is_value_inline(self.is_big_tiff) {
            let mut bytes = self.handler()?.inline_bytes(entry.value_offset, self.is_big_tiff);
            bytes.truncate(len);
            return Ok(bytes);
        }

        reader.seek(SeekFrom::Start(entry.value_offset))?;
        let mut bytes = vec![0u8; len];
        reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads an integer tag as a vector of u64 (offsets, byte counts, sample formats)
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> BandResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(BandTraceError::TagNotFound(tag))?;
        let bytes = self.read_tag_bytes(reader, entry)?;

        match self.byte_order()? {
            ByteOrder::LittleEndian => decode_unsigned::<LittleEndian>(&bytes, entry),
            ByteOrder::BigEndian => decode_unsigned::<BigEndian>(&bytes, entry),
        }
    }

    /// Reads a numeric tag as a vector of f64 (GeoTIFF model tags, double params)
    pub fn read_tag_doubles(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> BandResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(BandTraceError::TagNotFound(tag))?;
        let bytes = self.read_tag_bytes(reader, entry)?;

        match self.byte_order()? {
            ByteOrder::LittleEndian => decode_float::<LittleEndian>(&bytes, entry),
            ByteOrder::BigEndian => decode_float::<BigEndian>(&bytes, entry),
        }
    }

    /// Reads an ASCII tag, dropping trailing NULs and whitespace
    pub fn read_tag_ascii(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> BandResult<String> {
        let entry = ifd.get_entry(tag).ok_or(BandTraceError::TagNotFound(tag))?;
        let mut bytes = self.read_tag_bytes(reader, entry)?;

        while matches!(bytes.last(), Some(0)) {
            bytes.pop();
        }

        String::from_utf8(bytes)
            .map(|s| s.trim().to_string())
            .map_err(|e| BandTraceError::GenericError(format!("Invalid UTF-8 string: {}", e)))
    }
}

/// Decodes an array of unsigned integer tag values
fn decode_unsigned<B: byteorder::ByteOrder>(bytes: &[u8], entry: &IFDEntry) -> BandResult<Vec<u64>> {
    let size = entry.get_field_type_size();
    let values = bytes.chunks_exact(size).map(|chunk| match entry.field_type {
        field_types::BYTE | field_types::UNDEFINED => Ok(chunk[0] as u64),
        field_types::SHORT => Ok(B::read_u16(chunk) as u64),
        field_types::LONG => Ok(B::read_u32(chunk) as u64),
        field_types::LONG8 | field_types::IFD8 => Ok(B::read_u64(chunk)),
        other => Err(BandTraceError::UnsupportedFieldType(other)),
    });

    values.collect()
}

/// Decodes an array of numeric tag values as f64
fn decode_float<B: byteorder::ByteOrder>(bytes: &[u8], entry: &IFDEntry) -> BandResult<Vec<f64>> {
    let size = entry.get_field_type_size();
    let values = bytes.chunks_exact(size).map(|chunk| match entry.field_type {
        field_types::BYTE | field_types::UNDEFINED => Ok(chunk[0] as f64),
        field_types::SBYTE => Ok(chunk[0] as i8 as f64),
        field_types::SHORT => Ok(B::read_u16(chunk) as f64),
        field_types::SSHORT => Ok(B::read_i16(chunk) as f64),
        field_types::LONG => Ok(B::read_u32(chunk) as f64),
        field_types::SLONG => Ok(B::read_i32(chunk) as f64),
        field_types::LONG8 | field_types::IFD8 => Ok(B::read_u64(chunk) as f64),
        field_types::SLONG8 => Ok(B::read_i64(chunk) as f64),
        field_types::FLOAT => Ok(B::read_f32(chunk) as f64),
        field_types::DOUBLE => Ok(B::read_f64(chunk)),
        field_types::RATIONAL => Ok(B::read_u32(&chunk[..4]) as f64 / B::read_u32(&chunk[4..]) as f64),
        field_types::SRATIONAL => Ok(B::read_i32(&chunk[..4]) as f64 / B::read_i32(&chunk[4..]) as f64),
        other => Err(BandTraceError::UnsupportedFieldType(other)),
    });

    values.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::constants::tags;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    /// Classic little-endian TIFF with width, height and a 2-value SHORT tag
    fn create_test_tiff_buffer() -> Cursor<Vec<u8>> {
        let mut buffer = Vec::new();

        buffer.write_u16::<LittleEndian>(0x4949).unwrap(); // II for little-endian
        buffer.write_u16::<LittleEndian>(42).unwrap();     // TIFF magic number
        buffer.write_u32::<LittleEndian>(8).unwrap();      // IFD offset

        buffer.write_u16::<LittleEndian>(3).unwrap();      // Entry count

        buffer.write_u16::<LittleEndian>(256).unwrap();    // ImageWidth
        buffer.write_u16::<LittleEndian>(4).unwrap();
        buffer.write_u32::<LittleEndian>(1).unwrap();
        buffer.write_u32::<LittleEndian>(800).unwrap();

        buffer.write_u16::<LittleEndian>(257).unwrap();    // ImageLength
        buffer.write_u16::<LittleEndian>(4).unwrap();
        buffer.write_u32::<LittleEndian>(1).unwrap();
        buffer.write_u32::<LittleEndian>(600).unwrap();

        buffer.write_u16::<LittleEndian>(339).unwrap();    // SampleFormat, two SHORTs inline
        buffer.write_u16::<LittleEndian>(3).unwrap();
        buffer.write_u32::<LittleEndian>(2).unwrap();
        buffer.write_u16::<LittleEndian>(3).unwrap();
        buffer.write_u16::<LittleEndian>(1).unwrap();

        buffer.write_u32::<LittleEndian>(0).unwrap();      // No next IFD

        Cursor::new(buffer)
    }

    /// BigTIFF header with a single two-entry IFD
    fn create_test_bigtiff_buffer() -> Cursor<Vec<u8>> {
        let mut buffer = Vec::new();

        buffer.write_u16::<BigEndian>(0x4D4D).unwrap(); // MM for big-endian
        buffer.write_u16::<BigEndian>(43).unwrap();     // BigTIFF version
        buffer.write_u16::<BigEndian>(8).unwrap();      // Offset size
        buffer.write_u16::<BigEndian>(0).unwrap();      // Reserved
        buffer.write_u64::<BigEndian>(16).unwrap();     // IFD offset

        buffer.write_u64::<BigEndian>(2).unwrap();

        buffer.write_u16::<BigEndian>(256).unwrap();
        buffer.write_u16::<BigEndian>(4).unwrap();
        buffer.write_u64::<BigEndian>(1).unwrap();
        buffer.write_u32::<BigEndian>(1024).unwrap();   // LONG sits in the first 4 bytes
        buffer.write_u32::<BigEndian>(0).unwrap();

        buffer.write_u16::<BigEndian>(257).unwrap();
        buffer.write_u16::<BigEndian>(16).unwrap();     // LONG8
        buffer.write_u64::<BigEndian>(1).unwrap();
        buffer.write_u64::<BigEndian>(768).unwrap();

        buffer.write_u64::<BigEndian>(0).unwrap();

        Cursor::new(buffer)
    }

    #[test]
    fn test_read_classic_tiff() {
        let mut cursor = create_test_tiff_buffer();
        let mut reader = TiffReader::new();

        let tiff = reader.read(&mut cursor).unwrap();
        assert!(!tiff.is_big_tiff);
        assert_eq!(tiff.ifds.len(), 1);
        assert_eq!(tiff.ifds[0].get_dimensions(), Some((800, 600)));

        let formats = reader.read_tag_values(&mut cursor, &tiff.ifds[0], tags::SAMPLE_FORMAT).unwrap();
        assert_eq!(formats, vec![3, 1]);
    }

    #[test]
    fn test_read_big_endian_bigtiff() {
        let mut cursor = create_test_bigtiff_buffer();
        let mut reader = TiffReader::new();

        let tiff = reader.read(&mut cursor).unwrap();
        assert!(tiff.is_big_tiff);
        assert_eq!(tiff.byte_order, ByteOrder::BigEndian);

        let ifd = &tiff.ifds[0];
        let width = reader.read_tag_values(&mut cursor, ifd, tags::IMAGE_WIDTH).unwrap();
        let height = reader.read_tag_values(&mut cursor, ifd, tags::IMAGE_LENGTH).unwrap();
        assert_eq!(width, vec![1024]);
        assert_eq!(height, vec![768]);
    }

    #[test]
    fn test_missing_tag_is_reported() {
        let mut cursor = create_test_tiff_buffer();
        let mut reader = TiffReader::new();
        let tiff = reader.read(&mut cursor).unwrap();

        let result = reader.read_tag_values(&mut cursor, &tiff.ifds[0], tags::STRIP_OFFSETS);
        assert!(matches!(result, Err(BandTraceError::TagNotFound(273))));
    }
}
