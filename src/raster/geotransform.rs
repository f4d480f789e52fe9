//! Affine pixel ↔ plane transform

/// Six-coefficient affine transform from pixel space to the raster's plane
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// For north-up rasters `b` and `d` are zero and `e` is negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    /// Creates a transform from its six coefficients
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        GeoTransform { a, b, c, d, e, f }
    }

    /// Creates a north-up transform from the top-left corner and pixel size
    ///
    /// # Arguments
    /// * `origin_x`, `origin_y` - Plane coordinates of the top-left corner of pixel (0, 0)
    /// * `pixel_width` - Pixel size along x
    /// * `pixel_height` - Pixel size along y, positive; rows grow southwards
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height, origin_y)
    }

    /// Plane coordinates of the center of pixel `(row, col)`
    pub fn pixel_to_plane(&self, row: f64, col: f64) -> (f64, f64) {
        let col = col + 0.5;
        let row = row + 0.5;
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Fractional `(row, col)` of a plane coordinate, in the same pixel-center
    /// convention as [`pixel_to_plane`](Self::pixel_to_plane)
    ///
    /// # Returns
    /// `None` when the transform is degenerate
    pub fn plane_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let dx = x - self.c;
        let dy = y - self.f;
        let col = (self.e * dx - self.b * dy) / det;
        let row = (-self.d * dx + self.a * dy) / det;

        Some((row - 0.5, col - 0.5))
    }

    /// Pixel size along x and y (always positive)
    pub fn resolution(&self) -> (f64, f64) {
        (
            (self.a * self.a + self.d * self.d).sqrt(),
            (self.b * self.b + self.e * self.e).sqrt(),
        )
    }

    /// Plane bounds `(min_x, min_y, max_x, max_y)` of a `rows × cols` grid
    pub fn bounds(&self, rows: usize, cols: usize) -> (f64, f64, f64, f64) {
        let corner = |row: f64, col: f64| {
            (self.a * col + self.b * row + self.c, self.d * col + self.e * row + self.f)
        };
        let corners = [
            corner(0.0, 0.0),
            corner(0.0, cols as f64),
            corner(rows as f64, 0.0),
            corner(rows as f64, cols as f64),
        ];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Whether two transforms describe the same pixel grid
    pub fn approx_eq(&self, other: &GeoTransform, tolerance: f64) -> bool {
        let lhs = [self.a, self.b, self.c, self.d, self.e, self.f];
        let rhs = [other.a, other.b, other.c, other.d, other.e, other.f];
        lhs.iter().zip(rhs.iter()).all(|(l, r)| (l - r).abs() <= tolerance)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        GeoTransform::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_center_convention() {
        let gt = GeoTransform::north_up(100.0, 200.0, 10.0, 10.0);
        assert_eq!(gt.pixel_to_plane(0.0, 0.0), (105.0, 195.0));
        assert_eq!(gt.pixel_to_plane(2.0, 3.0), (135.0, 175.0));
    }

    #[test]
    fn test_inverse_recovers_pixel() {
        let gt = GeoTransform::new(0.5, 0.1, 1000.0, 0.05, -0.5, 5000.0);
        let (x, y) = gt.pixel_to_plane(7.0, 11.0);
        let (row, col) = gt.plane_to_pixel(x, y).unwrap();
        assert!((row - 7.0).abs() < 1e-9);
        assert!((col - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_transform_has_no_inverse() {
        let gt = GeoTransform::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(gt.plane_to_pixel(1.0, 1.0).is_none());
    }

    #[test]
    fn test_bounds_and_resolution() {
        let gt = GeoTransform::north_up(10.0, 20.0, 2.0, 4.0);
        assert_eq!(gt.bounds(5, 3), (10.0, 0.0, 16.0, 20.0));
        assert_eq!(gt.resolution(), (2.0, 4.0));
    }
}
