//! Georeferenced elevation grid with a nodata mask

use crate::coordinate::LinearUnit;
use crate::errors::{BandTraceError, BandResult};
use crate::raster::geotransform::GeoTransform;

/// A single-band raster held in memory, row-major
///
/// Cells flagged in `nodata_mask` are invalid regardless of the number
/// stored in `values`.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
    nodata_mask: Vec<bool>,
    transform: GeoTransform,
    /// EPSG code of the raster's CRS, if it has a known one
    crs: Option<u32>,
    /// Linear unit of the CRS's plane coordinates
    linear_unit: LinearUnit,
}

impl RasterGrid {
    /// Creates a grid from row-major values and a matching mask
    ///
    /// # Arguments
    /// * `rows`, `cols` - Grid dimensions
    /// * `values` - `rows * cols` cell values
    /// * `nodata_mask` - `rows * cols` flags, `true` marks an invalid cell
    /// * `transform` - Pixel to plane transform
    pub fn new(rows: usize, cols: usize, values: Vec<f64>, nodata_mask: Vec<bool>, transform: GeoTransform) -> BandResult<Self> {
        if values.len() != rows * cols || nodata_mask.len() != rows * cols {
            return Err(BandTraceError::GenericError(format!(
                "Grid of {}x{} cells needs {} values, got {} values and {} mask flags",
                rows, cols, rows * cols, values.len(), nodata_mask.len()
            )));
        }

        Ok(RasterGrid {
            rows,
            cols,
            values,
            nodata_mask,
            transform,
            crs: None,
            linear_unit: LinearUnit::Metre,
        })
    }

    /// Creates a grid whose nodata cells are those equal to `nodata` (and all NaNs)
    pub fn from_values(rows: usize, cols: usize, values: Vec<f64>, nodata: Option<f64>, transform: GeoTransform) -> BandResult<Self> {
        let mask = values.iter().map(|v| is_nodata(*v, nodata)).collect();
        Self::new(rows, cols, values, mask, transform)
    }

    /// Attaches a CRS and its linear unit
    pub fn with_crs(mut self, epsg: Option<u32>, linear_unit: LinearUnit) -> Self {
        self.crs = epsg;
        self.linear_unit = linear_unit;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<u32> {
        self.crs
    }

    pub fn linear_unit(&self) -> LinearUnit {
        self.linear_unit
    }

    /// Value at `(row, col)`, or `None` for nodata and out-of-range cells
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let idx = row * self.cols + col;
        if self.nodata_mask[idx] {
            None
        } else {
            Some(self.values[idx])
        }
    }

    /// Whether the cell at `(row, col)` is nodata
    pub fn is_nodata(&self, row: usize, col: usize) -> bool {
        self.nodata_mask[row * self.cols + col]
    }

    /// Iterator over valid values only
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter()
            .zip(self.nodata_mask.iter())
            .filter(|(_, masked)| !**masked)
            .map(|(v, _)| *v)
    }

    /// Minimum and maximum over valid cells
    ///
    /// # Returns
    /// `None` when every cell is nodata
    pub fn valid_range(&self) -> Option<(f64, f64)> {
        self.valid_values().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Pixel resolution `(x, y)` in CRS units
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }

    /// Plane bounds `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.rows, self.cols)
    }

    /// Cell-wise `max(self - other, 0)`; nodata in either input is nodata in the result
    ///
    /// Both grids must share dimensions, bounds and resolution.
    pub fn clamped_difference(&self, other: &RasterGrid) -> BandResult<RasterGrid> {
        self.ensure_coregistered(other)?;

        let mut values = Vec::with_capacity(self.values.len());
        let mut mask = Vec::with_capacity(self.values.len());
        for idx in 0..self.values.len() {
            let masked = self.nodata_mask[idx] || other.nodata_mask[idx];
            mask.push(masked);
            values.push(if masked { 0.0 } else { (self.values[idx] - other.values[idx]).max(0.0) });
        }

        Ok(RasterGrid {
            rows: self.rows,
            cols: self.cols,
            values,
            nodata_mask: mask,
            transform: self.transform,
            crs: self.crs,
            linear_unit: self.linear_unit,
        })
    }

    /// Fails unless `other` covers the same pixel grid
    pub fn ensure_coregistered(&self, other: &RasterGrid) -> BandResult<()> {
        let (rx, ry) = self.resolution();
        let tolerance = 1e-9 * rx.max(ry).max(1.0);

        let same_shape = self.rows == other.rows && self.cols == other.cols;
        let same_grid = self.transform.approx_eq(&other.transform, tolerance);

        if !same_shape || !same_grid {
            return Err(BandTraceError::Precondition(format!(
                "DTM and DSM have different bounds or resolution ({}x{} {:?} vs {}x{} {:?})",
                self.rows, self.cols, self.bounds(), other.rows, other.cols, other.bounds()
            )));
        }

        Ok(())
    }
}

/// Whether a raw cell value counts as nodata
pub fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(sentinel) if sentinel.is_nan() => false,
        Some(sentinel) => value == sentinel,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: Vec<f64>, nodata: Option<f64>) -> RasterGrid {
        RasterGrid::from_values(2, 2, values, nodata, GeoTransform::north_up(0.0, 2.0, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_valid_range_skips_nodata() {
        let g = grid(vec![-9999.0, 3.5, 7.25, f64::NAN], Some(-9999.0));
        assert_eq!(g.valid_range(), Some((3.5, 7.25)));
        assert!(g.get(0, 0).is_none());
        assert!(g.get(1, 1).is_none());
    }

    #[test]
    fn test_all_nodata_has_no_range() {
        let g = grid(vec![0.0; 4], Some(0.0));
        assert_eq!(g.valid_range(), None);
    }

    #[test]
    fn test_clamped_difference_propagates_nodata() {
        let dsm = grid(vec![10.0, 5.0, -9999.0, 8.0], Some(-9999.0));
        let dtm = grid(vec![4.0, 7.0, 1.0, -9999.0], Some(-9999.0));

        let diff = dsm.clamped_difference(&dtm).unwrap();
        assert_eq!(diff.get(0, 0), Some(6.0));
        assert_eq!(diff.get(0, 1), Some(0.0));
        assert!(diff.is_nodata(1, 0));
        assert!(diff.is_nodata(1, 1));
    }

    #[test]
    fn test_mismatched_grids_are_rejected() {
        let a = grid(vec![1.0; 4], None);
        let b = RasterGrid::from_values(2, 2, vec![1.0; 4], None, GeoTransform::north_up(0.0, 2.0, 2.0, 2.0)).unwrap();
        assert!(matches!(a.clamped_difference(&b), Err(BandTraceError::Precondition(_))));
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let result = RasterGrid::from_values(2, 3, vec![0.0; 4], None, GeoTransform::default());
        assert!(result.is_err());
    }
}
