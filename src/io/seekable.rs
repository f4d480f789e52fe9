//! Random-access input for the TIFF reader

use std::io::{Read, Seek};

/// Source the TIFF reader can jump around in
///
/// Implemented for files and in-memory cursors alike, so tests can feed
/// byte buffers where the loader reads files.
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
