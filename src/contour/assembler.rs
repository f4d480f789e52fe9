//! Polygon assembly from a contour forest
//!
//! Polygons follow a two-level model: an outer border with its direct hole
//! children. An island found inside a hole starts a polygon of its own
//! rather than nesting further.

use std::collections::VecDeque;

use crate::coordinate::{Pixel, Point};
use crate::errors::BandResult;

use super::tracer::ContourForest;

/// Outer ring plus holes, every ring closed
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

/// Appends the first point when a ring is not already closed
pub fn close_ring<T: PartialEq + Clone>(ring: &mut Vec<T>) {
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            let first = first.clone();
            ring.push(first);
        }
    }
}

/// Whether a closed ring has fewer than three distinct vertices
pub fn is_degenerate(ring: &[Point]) -> bool {
    let open = match ring.split_last() {
        Some((last, rest)) if rest.first() == Some(last) => rest,
        _ => ring,
    };

    let mut distinct: Vec<&Point> = Vec::with_capacity(3);
    for point in open {
        if !distinct.contains(&point) {
            distinct.push(point);
            if distinct.len() >= 3 {
                return false;
            }
        }
    }
    true
}

/// Builds the polygons of one band
///
/// # Arguments
/// * `forest` - Traced borders of the band mask
/// * `map` - Maps one closed pixel ring to plane coordinates
///
/// # Returns
/// Polygons in discovery order; rings that map to fewer than three distinct
/// points are dropped, and a polygon whose outer ring is dropped disappears
pub fn assemble_polygons<F>(forest: &ContourForest, mut map: F) -> BandResult<Vec<Polygon>>
where
    F: FnMut(&[Pixel]) -> BandResult<Vec<Point>>,
{
    let mut map_ring = |index: usize| -> BandResult<Option<Vec<Point>>> {
        let mut pixels = forest.contour(index).points.clone();
        close_ring(&mut pixels);
        let ring = map(&pixels)?;
        Ok(if is_degenerate(&ring) { None } else { Some(ring) })
    };

    let mut polygons = Vec::new();
    let mut pending: VecDeque<usize> = forest.roots().collect();

    while let Some(root) = pending.pop_front() {
        let mut holes = Vec::new();
        for hole in forest.children(root) {
            if let Some(ring) = map_ring(hole)? {
                holes.push(ring);
            }
            pending.extend(forest.children(hole));
        }

        if let Some(outer) = map_ring(root)? {
            polygons.push(Polygon { outer, holes });
        }
    }

    Ok(polygons)
}
