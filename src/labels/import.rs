//! GeoJSON features to pixel-space labels

use log::{debug, warn};
use serde_json::Value;

use crate::contour::{close_ring, is_degenerate};
use crate::coordinate::{CoordinateMapper, Pixel, Point};
use crate::errors::BandResult;
use crate::features::geojson::ring_points;
use crate::features::FeatureCollection;

use super::object::{distinct_points, NewLabel, MIN_DISTINCT_POINTS};

fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Display name of an imported feature
///
/// Band features become `From {bottom} To {top}`; otherwise the `name`
/// property is used, falling back to `Unnamed`.
pub fn label_name(properties: &serde_json::Map<String, Value>) -> String {
    let bottom = properties.get("bottom").and_then(property_text);
    let top = properties.get("top").and_then(property_text);
    if let (Some(bottom), Some(top)) = (bottom, top) {
        return format!("From {} To {}", bottom, top);
    }

    properties
        .get("name")
        .and_then(property_text)
        .unwrap_or_else(|| "Unnamed".to_string())
}

/// Closed pixel ring reduced to its unclosed vertex list
fn dedup_unclosed(mut pixels: Vec<Pixel>) -> Vec<Pixel> {
    pixels.dedup();
    if pixels.len() > 1 && pixels.first() == pixels.last() {
        pixels.pop();
    }
    pixels
}

/// Converts every polygon's outer ring into a label
///
/// Holes are dropped. Rings that collapse to fewer than three distinct
/// pixels are skipped.
///
/// # Arguments
/// * `collection` - Features in the mapper's geographic CRS
/// * `mapper` - Mapper between the labelled raster and that CRS
pub fn labels_from_features(collection: &FeatureCollection, mapper: &CoordinateMapper) -> BandResult<Vec<NewLabel>> {
    let mut labels = Vec::new();

    for feature in &collection.features {
        let name = label_name(&feature.properties);

        for rings in feature.geometry.polygons() {
            let Some(outer) = rings.first() else { continue };

            let mut points: Vec<Point> = ring_points(outer);
            if is_degenerate(&points) {
                warn!("Skipping degenerate ring of feature '{}'", name);
                continue;
            }
            close_ring(&mut points);

            let pixels = dedup_unclosed(mapper.coordinates_to_pixels(&points)?);
            let distinct = distinct_points(&pixels);
            if distinct < MIN_DISTINCT_POINTS {
                debug!("Ring of feature '{}' collapsed to {} pixels", name, distinct);
                continue;
            }

            labels.push(NewLabel { name: name.clone(), points: pixels });
        }
    }

    debug!("Converted {} features into {} labels", collection.len(), labels.len());
    Ok(labels)
}
