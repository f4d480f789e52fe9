//! Per-band binarization

use crate::raster::{BinaryMask, RasterGrid};

use super::planner::ElevationBand;

/// Selects the cells of `grid` inside `band`
///
/// Nodata cells are always background, whatever their stored value.
pub fn binarize(grid: &RasterGrid, band: &ElevationBand) -> BinaryMask {
    let mut mask = BinaryMask::new(grid.rows(), grid.cols());
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if let Some(value) = grid.get(row, col) {
                if band.contains(value) {
                    mask.set(row, col, true);
                }
            }
        }
    }
    mask
}
