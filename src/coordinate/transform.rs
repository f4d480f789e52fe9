//! Coordinate transformation functionality
//!
//! Reprojection sits behind the [`Reprojection`] trait so the pixel mapper can
//! be driven by a stub in tests. [`CoordinateTransformer`] picks the cheapest
//! strategy for a CRS pair.

use std::f64::consts::PI;
use std::fmt;

use log::debug;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::crs::{self, CrsDefinition};
use super::point::Point;
use crate::errors::{BandTraceError, BandResult};

/// Batch reprojection between two EPSG-identified CRSs
pub trait Reprojection {
    /// EPSG code of the input coordinates
    fn source(&self) -> u32;

    /// EPSG code of the output coordinates
    fn target(&self) -> u32;

    /// Reprojects all points in place
    ///
    /// Either every point is transformed or an error is returned.
    fn transform_batch(&self, points: &mut [Point]) -> BandResult<()>;
}

/// Earth radius in meters
const EARTH_RADIUS: f64 = 6378137.0;

/// Maximum latitude for Web Mercator
const MAX_MERCATOR_LAT: f64 = 85.05;

const EPSG_WGS84: u32 = 4326;
const EPSG_WEB_MERCATOR: u32 = 3857;

/// How a transformer moves points between its two CRSs
enum Strategy {
    /// Same CRS on both sides
    Identity,
    /// Closed-form WGS84 to Web Mercator
    Wgs84ToWebMercator,
    /// Closed-form Web Mercator to WGS84
    WebMercatorToWgs84,
    /// General case
    Proj4 {
        source: Box<Proj>,
        target: Box<Proj>,
        source_is_geographic: bool,
        target_is_geographic: bool,
    },
}

/// Transformer for converting between coordinate systems
pub struct CoordinateTransformer {
    from: u32,
    to: u32,
    strategy: Strategy,
}

impl fmt::Debug for CoordinateTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match self.strategy {
            Strategy::Identity => "identity",
            Strategy::Wgs84ToWebMercator | Strategy::WebMercatorToWgs84 => "web-mercator",
            Strategy::Proj4 { .. } => "proj4",
        };
        f.debug_struct("CoordinateTransformer")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("strategy", &strategy)
            .finish()
    }
}

impl CoordinateTransformer {
    /// Creates a transformer between two EPSG codes
    ///
    /// # Arguments
    /// * `from` - EPSG code of the input coordinates
    /// * `to` - EPSG code of the output coordinates
    ///
    /// # Returns
    /// `UnsupportedCrs` if either code is not in the registry, or a
    /// `Projection` error if proj4rs rejects a definition
    pub fn new(from: u32, to: u32) -> BandResult<Self> {
        let source_def = crs::lookup(from)?;
        let target_def = crs::lookup(to)?;

        let strategy = match (from, to) {
            _ if from == to => Strategy::Identity,
            (EPSG_WGS84, EPSG_WEB_MERCATOR) => Strategy::Wgs84ToWebMercator,
            (EPSG_WEB_MERCATOR, EPSG_WGS84) => Strategy::WebMercatorToWgs84,
            _ => Self::proj4_strategy(&source_def, &target_def)?,
        };

        let transformer = CoordinateTransformer { from, to, strategy };
        debug!("Created {:?}", transformer);
        Ok(transformer)
    }

    fn proj4_strategy(source: &CrsDefinition, target: &CrsDefinition) -> BandResult<Strategy> {
        let build = |def: &CrsDefinition| {
            Proj::from_proj_string(&def.proj).map_err(|e| BandTraceError::Projection {
                from: source.epsg,
                to: target.epsg,
                reason: format!("invalid definition for EPSG:{}: {:?}", def.epsg, e),
            })
        };

        Ok(Strategy::Proj4 {
            source: Box::new(build(source)?),
            target: Box::new(build(target)?),
            source_is_geographic: source.is_geographic(),
            target_is_geographic: target.is_geographic(),
        })
    }

    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(lon: f64, lat: f64) -> Point {
        let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);

        let x = lon * EARTH_RADIUS * PI / 180.0;
        let y = f64::ln(f64::tan((90.0 + lat) * PI / 360.0)) * EARTH_RADIUS;

        Point::new(x, y)
    }

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(x: f64, y: f64) -> Point {
        let lon = x * 180.0 / (EARTH_RADIUS * PI);
        let lat = 180.0 / PI * (2.0 * f64::atan(f64::exp(y / EARTH_RADIUS)) - PI / 2.0);

        Point::new(lon, lat)
    }

    /// Transform a single point
    pub fn transform_point(&self, point: &Point) -> BandResult<Point> {
        let mut points = [*point];
        self.transform_batch(&mut points)?;
        Ok(points[0])
    }

    fn projection_error(&self, reason: String) -> BandTraceError {
        BandTraceError::Projection { from: self.from, to: self.to, reason }
    }
}

impl Reprojection for CoordinateTransformer {
    fn source(&self) -> u32 {
        self.from
    }

    fn target(&self) -> u32 {
        self.to
    }

    fn transform_batch(&self, points: &mut [Point]) -> BandResult<()> {
        match &self.strategy {
            Strategy::Identity => {},
            Strategy::Wgs84ToWebMercator => {
                for p in points.iter_mut() {
                    *p = Self::wgs84_to_web_mercator(p.x, p.y);
                }
            },
            Strategy::WebMercatorToWgs84 => {
                for p in points.iter_mut() {
                    *p = Self::web_mercator_to_wgs84(p.x, p.y);
                }
            },
            Strategy::Proj4 { source, target, source_is_geographic, target_is_geographic } => {
                for p in points.iter_mut() {
                    let mut coord = if *source_is_geographic {
                        (p.x.to_radians(), p.y.to_radians(), 0.0)
                    } else {
                        (p.x, p.y, 0.0)
                    };

                    transform(source, target, &mut coord)
                        .map_err(|e| self.projection_error(format!("{:?} at ({}, {})", e, p.x, p.y)))?;

                    let (x, y) = if *target_is_geographic {
                        (coord.0.to_degrees(), coord.1.to_degrees())
                    } else {
                        (coord.0, coord.1)
                    };

                    if !x.is_finite() || !y.is_finite() {
                        return Err(self.projection_error(format!("non-finite result at ({}, {})", p.x, p.y)));
                    }
                    *p = Point::new(x, y);
                }
            },
        }
        Ok(())
    }
}
