//! Packaging of polygons into output features

use serde_json::{Map, Value};

use crate::bands::ElevationBand;
use crate::contour::Polygon;
use crate::coordinate::Point;

use super::geojson::{number_value, ring_positions, Feature, FeatureCollection, Geometry};

/// Properties attached to an output feature
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureProperties {
    /// `{bottom, top}` of an elevation band
    Band(ElevationBand),
    /// `{level}`, the bottom of a heightmap band
    Level(f64),
    /// `{name, attributes}` of an exported label
    Label { name: String, attributes: String },
}

impl FeatureProperties {
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            FeatureProperties::Band(band) => {
                map.insert("bottom".to_string(), number_value(band.bottom));
                map.insert("top".to_string(), number_value(band.top));
            },
            FeatureProperties::Level(level) => {
                map.insert("level".to_string(), number_value(level));
            },
            FeatureProperties::Label { name, attributes } => {
                map.insert("name".to_string(), Value::String(name));
                map.insert("attributes".to_string(), Value::String(attributes));
            },
        }
        map
    }
}

/// Collects features for one output document
#[derive(Debug, Default)]
pub struct FeatureAssembler {
    features: Vec<Feature>,
}

impl FeatureAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one band's polygons as a single `MultiPolygon` feature
    ///
    /// # Returns
    /// `false` when the band has no polygons and nothing was added
    pub fn add_band(&mut self, polygons: &[Polygon], properties: FeatureProperties) -> bool {
        if polygons.is_empty() {
            return false;
        }

        let coordinates = polygons
            .iter()
            .map(|polygon| {
                std::iter::once(&polygon.outer)
                    .chain(polygon.holes.iter())
                    .map(|ring| ring_positions(ring))
                    .collect()
            })
            .collect();

        self.features.push(Feature::new(Geometry::MultiPolygon { coordinates }, properties.into_map()));
        true
    }

    /// Adds a single-ring `Polygon` feature; the ring must already be closed
    pub fn add_label(&mut self, ring: &[Point], name: String, attributes: String) {
        let geometry = Geometry::Polygon { coordinates: vec![ring_positions(ring)] };
        let properties = FeatureProperties::Label { name, attributes }.into_map();
        self.features.push(Feature::new(geometry, properties));
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn finish(self) -> FeatureCollection {
        FeatureCollection::new(self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        let outer = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 0.0),
            Point::new(0.0, 0.0),
        ];
        Polygon { outer, holes: Vec::new() }
    }

    #[test]
    fn test_empty_band_is_omitted() {
        let mut assembler = FeatureAssembler::new();
        assert!(!assembler.add_band(&[], FeatureProperties::Level(3.0)));
        assert!(assembler.finish().is_empty());
    }

    #[test]
    fn test_band_feature_properties() {
        let mut assembler = FeatureAssembler::new();
        assembler.add_band(&[square(), square()], FeatureProperties::Band(ElevationBand::new(0.0, 2.5)));

        let collection = assembler.finish();
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["properties"], serde_json::json!({"bottom": 0, "top": 2.5}));
        assert_eq!(json["features"][0]["geometry"]["coordinates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_label_feature_is_polygon() {
        let mut assembler = FeatureAssembler::new();
        assembler.add_label(&square().outer, "Tree".to_string(), String::new());

        let json = serde_json::to_value(assembler.finish()).unwrap();
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(json["features"][0]["properties"]["attributes"], "");
    }
}
