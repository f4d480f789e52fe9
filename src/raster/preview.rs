//! Grayscale PNG rendering of a grid
//!
//! The preview is the image annotation tools display; its pixels line up
//! one-to-one with the grid's cells.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GrayAlphaImage, ImageFormat, LumaA};
use log::info;

use crate::errors::{BandTraceError, BandResult};
use crate::utils::output;

use super::grid::RasterGrid;

/// Renders valid cells linearly from black (min) to white (max)
///
/// Nodata cells are fully transparent. A flat grid renders mid-gray.
pub fn render_preview(grid: &RasterGrid) -> GrayAlphaImage {
    let range = grid.valid_range();
    GrayAlphaImage::from_fn(grid.cols() as u32, grid.rows() as u32, |x, y| {
        match (grid.get(y as usize, x as usize), range) {
            (Some(value), Some((lo, hi))) => {
                let level = if hi > lo { (value - lo) / (hi - lo) * 255.0 } else { 127.0 };
                LumaA([level.round().clamp(0.0, 255.0) as u8, 255])
            },
            _ => LumaA([0, 0]),
        }
    })
}

/// Renders `grid` and writes it as a PNG file
pub fn save_preview(grid: &RasterGrid, path: &Path) -> BandResult<()> {
    let image = DynamicImage::ImageLumaA8(render_preview(grid));

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| BandTraceError::GenericError(format!("PNG encoding failed: {}", e)))?;

    output::write_atomic(path, &bytes)?;
    info!("Wrote {}x{} preview to {}", grid.cols(), grid.rows(), path.display());
    Ok(())
}
