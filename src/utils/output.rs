//! Atomic output writing
//!
//! Output is written to a temporary file next to its destination and only
//! renamed into place once complete, so a failed run never leaves a partial
//! document behind.

use std::io::Write;
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::errors::{BandTraceError, BandResult};

/// Writes `contents` to `path` atomically
pub fn write_atomic(path: &Path, contents: &[u8]) -> BandResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;
    file.persist(path).map_err(|e| BandTraceError::IoError(e.error))?;

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
