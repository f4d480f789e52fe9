//! Pixel-space labels to GeoJSON features

use log::{debug, warn};

use crate::contour::close_ring;
use crate::coordinate::CoordinateMapper;
use crate::errors::BandResult;
use crate::features::{FeatureAssembler, FeatureCollection};

use super::object::{distinct_points, LabeledObject, MIN_DISTINCT_POINTS};

/// Converts verified, non-deleted objects into `Polygon` features
///
/// Objects with fewer than three distinct vertices cannot form a valid
/// ring and are skipped.
pub fn features_from_labels(objects: &[LabeledObject], mapper: &CoordinateMapper) -> BandResult<FeatureCollection> {
    let mut assembler = FeatureAssembler::new();

    for object in objects.iter().filter(|o| o.is_exportable()) {
        let distinct = distinct_points(&object.points);
        if distinct < MIN_DISTINCT_POINTS {
            warn!("Skipping object {} ('{}') with {} distinct points", object.id, object.name, distinct);
            continue;
        }

        let mut pixels = object.points.clone();
        close_ring(&mut pixels);
        let ring = mapper.pixels_to_coordinates(&pixels)?;
        assembler.add_label(&ring, object.name.clone(), object.attributes.clone());
    }

    debug!("Exported {} of {} objects", assembler.len(), objects.len());
    Ok(assembler.finish())
}
