//! GeoJSON document model
//!
//! Only what the crate reads and writes: feature collections whose features
//! carry `Polygon` or `MultiPolygon` geometries.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::coordinate::Point;
use crate::errors::BandResult;

/// A position; a third (height) ordinate is accepted on input and ignored
pub type Position = Vec<f64>;

/// A linear ring of positions
pub type Ring = Vec<Position>;

/// Polygonal geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
}

impl Geometry {
    /// Polygons of the geometry, each as its list of rings
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            Geometry::Polygon { coordinates } => vec![coordinates.as_slice()],
            Geometry::MultiPolygon { coordinates } => coordinates.iter().map(Vec::as_slice).collect(),
        }
    }
}

/// One feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    #[serde(default, deserialize_with = "nullable_map")]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Feature { kind: "Feature".to_string(), geometry, properties }
    }
}

/// Top-level document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection { kind: "FeatureCollection".to_string(), features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Reads a collection from a file
    pub fn from_file(path: &Path) -> BandResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> BandResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> BandResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// `null` properties deserialize as an empty object
fn nullable_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ring of points as GeoJSON positions
pub fn ring_positions(points: &[Point]) -> Ring {
    points.iter().map(|p| vec![p.x, p.y]).collect()
}

/// GeoJSON positions as points; positions with fewer than two ordinates are skipped
pub fn ring_points(ring: &[Position]) -> Vec<Point> {
    ring.iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Point::new(p[0], p[1]))
        .collect()
}

/// Number as JSON, integral values without a fractional part
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
