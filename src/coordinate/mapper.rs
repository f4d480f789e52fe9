//! Pixel ↔ geographic coordinate mapping
//!
//! Composes a raster's affine transform with a reprojection in each
//! direction. Pixel coordinates follow the pixel-center convention of
//! [`GeoTransform::pixel_to_plane`]; this is the only place pixel indices
//! become plane coordinates.

use log::debug;

use super::point::{Pixel, Point};
use super::transform::{CoordinateTransformer, Reprojection};
use crate::errors::{BandTraceError, BandResult};
use crate::raster::{GeoTransform, RasterGrid};

/// Bidirectional mapper between a grid's pixels and another CRS
pub struct CoordinateMapper {
    transform: GeoTransform,
    /// Grid CRS → other CRS
    forward: Box<dyn Reprojection>,
    /// Other CRS → grid CRS
    inverse: Box<dyn Reprojection>,
}

impl CoordinateMapper {
    /// Creates a mapper between `grid` and the CRS `other_epsg`
    ///
    /// Both CRSs are resolved here, so an unknown code fails before any
    /// contour is mapped.
    ///
    /// # Arguments
    /// * `grid` - Raster whose pixel space is one side of the mapping
    /// * `other_epsg` - EPSG code of the geographic side
    pub fn new(grid: &RasterGrid, other_epsg: u32) -> BandResult<Self> {
        let grid_epsg = grid.crs().ok_or_else(|| {
            BandTraceError::Precondition(
                "The raster does not declare an EPSG coordinate system".to_string(),
            )
        })?;

        debug!("Mapping pixels of EPSG:{} grid to EPSG:{}", grid_epsg, other_epsg);

        Ok(Self::with_reprojections(
            *grid.transform(),
            Box::new(CoordinateTransformer::new(grid_epsg, other_epsg)?),
            Box::new(CoordinateTransformer::new(other_epsg, grid_epsg)?),
        ))
    }

    /// Creates a mapper from explicit reprojections
    pub fn with_reprojections(
        transform: GeoTransform,
        forward: Box<dyn Reprojection>,
        inverse: Box<dyn Reprojection>,
    ) -> Self {
        CoordinateMapper { transform, forward, inverse }
    }

    /// EPSG code of the geographic side
    pub fn target_epsg(&self) -> u32 {
        self.forward.target()
    }

    /// Maps a batch of pixels to coordinates in the target CRS
    pub fn pixels_to_coordinates(&self, pixels: &[Pixel]) -> BandResult<Vec<Point>> {
        let mut points: Vec<Point> = pixels
            .iter()
            .map(|p| {
                let (x, y) = self.transform.pixel_to_plane(p.row as f64, p.col as f64);
                Point::new(x, y)
            })
            .collect();

        self.forward.transform_batch(&mut points)?;
        Ok(points)
    }

    /// Maps a batch of target-CRS coordinates to fractional `(row, col)`
    pub fn coordinates_to_fractional_pixels(&self, points: &[Point]) -> BandResult<Vec<(f64, f64)>> {
        let mut plane = points.to_vec();
        self.inverse.transform_batch(&mut plane)?;

        plane
            .iter()
            .map(|p| {
                self.transform.plane_to_pixel(p.x, p.y).ok_or_else(|| {
                    BandTraceError::Precondition("The raster transform is not invertible".to_string())
                })
            })
            .collect()
    }

    /// Maps a batch of target-CRS coordinates to the nearest pixel indices
    ///
    /// Halves round away from zero.
    pub fn coordinates_to_pixels(&self, points: &[Point]) -> BandResult<Vec<Pixel>> {
        Ok(self
            .coordinates_to_fractional_pixels(points)?
            .into_iter()
            .map(|(row, col)| Pixel::new(row.round() as i64, col.round() as i64))
            .collect())
    }
}
