//! Per-band raster → polygon pipeline
//!
//! binarize → close → trace → assemble, with every ring mapped to the
//! target CRS as one batch.

use log::debug;

use crate::bands::{binarize, ElevationBand, NoiseFilter};
use crate::contour::{assemble_polygons, trace_contours, Polygon};
use crate::coordinate::CoordinateMapper;
use crate::errors::BandResult;
use crate::raster::RasterGrid;

/// Polygons of one band in the mapper's target CRS
///
/// A band without foreground cells yields no polygons.
pub fn band_polygons(
    grid: &RasterGrid,
    band: &ElevationBand,
    filter: &NoiseFilter,
    mapper: &CoordinateMapper,
) -> BandResult<Vec<Polygon>> {
    let mask = filter.apply(&binarize(grid, band));
    if mask.is_empty() {
        debug!("Band {} has no cells", band);
        return Ok(Vec::new());
    }

    let forest = trace_contours(&mask);
    let polygons = assemble_polygons(&forest, |ring| mapper.pixels_to_coordinates(ring))?;

    debug!("Band {}: {} cells, {} borders, {} polygons", band, mask.count(), forest.len(), polygons.len());
    Ok(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{Point, Reprojection};
    use crate::raster::GeoTransform;

    struct Identity(u32);

    impl Reprojection for Identity {
        fn source(&self) -> u32 {
            self.0
        }

        fn target(&self) -> u32 {
            self.0
        }

        fn transform_batch(&self, _points: &mut [Point]) -> BandResult<()> {
            Ok(())
        }
    }

    fn mapper() -> CoordinateMapper {
        let transform = GeoTransform::north_up(100.0, 200.0, 1.0, 1.0);
        CoordinateMapper::with_reprojections(transform, Box::new(Identity(0)), Box::new(Identity(0)))
    }

    fn grid(rows: usize, cols: usize, values: Vec<f64>) -> RasterGrid {
        RasterGrid::from_values(rows, cols, values, Some(-9999.0), GeoTransform::north_up(100.0, 200.0, 1.0, 1.0))
            .unwrap()
    }

    #[test]
    fn test_block_becomes_square_in_plane_coordinates() {
        #[rustfmt::skip]
        let values = vec![
            0.0, 0.0, 0.0, 0.0,
            0.0, 5.0, 5.0, 0.0,
            0.0, 5.0, 5.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ];
        let polygons = band_polygons(&grid(4, 4, values), &ElevationBand::new(4.0, 6.0), &NoiseFilter::identity(), &mapper())
            .unwrap();

        assert_eq!(polygons.len(), 1);
        let outer = &polygons[0].outer;
        assert_eq!(outer.len(), 5);
        assert!(outer.contains(&Point::new(101.5, 198.5)));
        assert!(outer.contains(&Point::new(102.5, 197.5)));
        assert_eq!(outer.first(), outer.last());
    }

    #[test]
    fn test_band_without_cells_is_empty() {
        let polygons = band_polygons(&grid(2, 2, vec![1.0; 4]), &ElevationBand::new(5.0, 6.0), &NoiseFilter::identity(), &mapper())
            .unwrap();
        assert!(polygons.is_empty());
    }

    #[test]
    fn test_nodata_cells_are_never_traced() {
        let polygons = band_polygons(&grid(3, 3, vec![-9999.0; 9]), &ElevationBand::new(-10000.0, 0.0), &NoiseFilter::identity(), &mapper())
            .unwrap();
        assert!(polygons.is_empty());
    }
}
