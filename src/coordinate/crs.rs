//! Coordinate Reference System handling
//!
//! EPSG codes are resolved against a proj4 definition table shipped with the
//! crate. UTM zones are generated rather than listed.

use std::collections::HashMap;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::errors::{BandTraceError, BandResult};
use crate::tiff::constants::linear_units;

/// Metres per US survey foot
const US_SURVEY_FOOT_METRES: f64 = 1200.0 / 3937.0;

/// Metres per international foot
const FOOT_METRES: f64 = 0.3048;

/// Approximate metres per degree of latitude
const METRES_PER_DEGREE: f64 = 111_320.0;

lazy_static! {
    static ref CRS_DEFINITIONS: HashMap<u32, CrsDefinition> = {
        let content = include_str!("../../crs_definitions.toml");
        parse_definitions(content).unwrap_or_else(|e| {
            warn!("Failed to parse CRS definitions: {}", e);
            HashMap::new()
        })
    };

    /// Parameters proj4rs does not need and may refuse
    static ref UNSUPPORTED_PARAMS: Regex = Regex::new(r"\s*\+(nadgrids=@null|wktext)").unwrap();
    static ref UNITS_PARAM: Regex = Regex::new(r"\+units=([A-Za-z\-]+)").unwrap();
    static ref TO_METER_PARAM: Regex = Regex::new(r"\+to_meter=([0-9.eE+\-]+)").unwrap();
}

/// Linear unit of a CRS's plane coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinearUnit {
    Metre,
    Foot,
    UsSurveyFoot,
    /// Geographic CRS, coordinates in degrees
    Degree,
    /// Any other unit, given as metres per unit
    Other(f64),
}

impl LinearUnit {
    /// Unit for a GeoTIFF ProjLinearUnitsGeoKey value
    pub fn from_geokey(code: u16) -> Option<Self> {
        match code {
            linear_units::METRE => Some(LinearUnit::Metre),
            linear_units::FOOT => Some(LinearUnit::Foot),
            linear_units::US_SURVEY_FOOT => Some(LinearUnit::UsSurveyFoot),
            _ => None,
        }
    }

    /// Unit declared by a proj4 string
    pub fn from_proj_string(proj: &str) -> Self {
        if proj.contains("+proj=longlat") || proj.contains("+proj=latlong") {
            return LinearUnit::Degree;
        }
        if let Some(caps) = TO_METER_PARAM.captures(proj) {
            if let Ok(factor) = caps[1].parse::<f64>() {
                return LinearUnit::Other(factor);
            }
        }
        match UNITS_PARAM.captures(proj).as_ref().map(|c| &c[1]) {
            Some("us-ft") => LinearUnit::UsSurveyFoot,
            Some("ft") => LinearUnit::Foot,
            _ => LinearUnit::Metre,
        }
    }

    pub fn is_metre(&self) -> bool {
        matches!(self, LinearUnit::Metre)
    }

    /// Converts a length given in metres into this unit
    ///
    /// Degrees use a flat metres-per-degree approximation, which is only
    /// good enough for sizing a smoothing kernel.
    pub fn from_metres(&self, metres: f64) -> f64 {
        match self {
            LinearUnit::Metre => metres,
            LinearUnit::Foot => metres / FOOT_METRES,
            LinearUnit::UsSurveyFoot => metres / US_SURVEY_FOOT_METRES,
            LinearUnit::Degree => metres / METRES_PER_DEGREE,
            LinearUnit::Other(factor) => metres / factor,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LinearUnit::Metre => "metre",
            LinearUnit::Foot => "foot",
            LinearUnit::UsSurveyFoot => "US survey foot",
            LinearUnit::Degree => "degree",
            LinearUnit::Other(_) => "custom",
        }
    }
}

/// A resolved CRS definition
#[derive(Debug, Clone, PartialEq)]
pub struct CrsDefinition {
    pub epsg: u32,
    pub name: String,
    /// proj4 string, cleaned for proj4rs
    pub proj: String,
    pub linear_unit: LinearUnit,
}

impl CrsDefinition {
    fn new(epsg: u32, name: &str, proj: &str) -> Self {
        let proj = UNSUPPORTED_PARAMS.replace_all(proj, "").trim().to_string();
        let linear_unit = LinearUnit::from_proj_string(&proj);
        CrsDefinition { epsg, name: name.to_string(), proj, linear_unit }
    }

    /// Whether coordinates are longitude/latitude in degrees
    pub fn is_geographic(&self) -> bool {
        self.linear_unit == LinearUnit::Degree
    }
}

/// Identifier for common coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM Zone (EPSG:326xx for northern hemisphere, 327xx for southern)
    UTM(u8, bool),
    /// Other EPSG code
    Other(u32),
}

impl CoordinateSystem {
    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, is_northern) => {
                if *is_northern {
                    32600 + *zone as u32
                } else {
                    32700 + *zone as u32
                }
            },
            CoordinateSystem::Other(code) => *code,
        }
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM(zone, is_northern) => {
                let hemisphere = if *is_northern { "N" } else { "S" };
                format!("UTM Zone {}{} (EPSG:{})", zone, hemisphere, self.epsg_code())
            },
            CoordinateSystem::Other(code) => match CRS_DEFINITIONS.get(code) {
                Some(def) => format!("{} (EPSG:{})", def.name, code),
                None => format!("EPSG:{}", code),
            },
        }
    }
}

/// Factory for creating coordinate systems
pub struct CoordinateSystemFactory;

impl CoordinateSystemFactory {
    /// Create a coordinate system from an EPSG code
    ///
    /// Codes missing from the registry are rejected here, before any
    /// per-contour work.
    pub fn from_epsg(epsg: u32) -> BandResult<CoordinateSystem> {
        let system = match epsg {
            4326 => CoordinateSystem::WGS84,
            3857 => CoordinateSystem::WebMercator,
            32601..=32660 => CoordinateSystem::UTM((epsg - 32600) as u8, true),
            32701..=32760 => CoordinateSystem::UTM((epsg - 32700) as u8, false),
            _ => CoordinateSystem::Other(epsg),
        };
        lookup(epsg)?;
        Ok(system)
    }

    /// Parse a coordinate system from a string (e.g. "EPSG:4326" or "4326")
    pub fn from_string(crs_str: &str) -> BandResult<CoordinateSystem> {
        let crs_str = crs_str.trim().to_uppercase();
        let code = crs_str.strip_prefix("EPSG:").unwrap_or(&crs_str);

        match code.parse::<u32>() {
            Ok(epsg) => Self::from_epsg(epsg),
            Err(_) => Err(BandTraceError::GenericError(format!("Unsupported CRS format: {}", crs_str))),
        }
    }
}

/// Resolves an EPSG code to its definition
pub fn lookup(epsg: u32) -> BandResult<CrsDefinition> {
    if let Some(def) = CRS_DEFINITIONS.get(&epsg) {
        return Ok(def.clone());
    }

    let generated = match epsg {
        32601..=32660 => Some(format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", epsg - 32600)),
        32701..=32760 => Some(format!("+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs", epsg - 32700)),
        26901..=26923 => Some(format!(
            "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
            epsg - 26900
        )),
        _ => None,
    };

    generated
        .map(|proj| CrsDefinition::new(epsg, &format!("UTM (EPSG:{})", epsg), &proj))
        .ok_or(BandTraceError::UnsupportedCrs(epsg))
}

/// Parses the `[crs.<code>]` tables of the definitions file
fn parse_definitions(content: &str) -> BandResult<HashMap<u32, CrsDefinition>> {
    let toml_value: toml::Value = content.parse()
        .map_err(|e| BandTraceError::Config(format!("Failed to parse TOML: {}", e)))?;

    let mut definitions = HashMap::new();
    if let Some(table) = toml_value.get("crs").and_then(|v| v.as_table()) {
        for (code, entry) in table {
            let proj = entry.get("proj").and_then(|v| v.as_str());
            let name = entry.get("name").and_then(|v| v.as_str()).unwrap_or("");
            if let (Ok(epsg), Some(proj)) = (code.parse::<u32>(), proj) {
                definitions.insert(epsg, CrsDefinition::new(epsg, name, proj));
            }
        }
    }

    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contains_common_codes() {
        for code in [4326, 3857, 2056, 27700, 2263] {
            assert!(lookup(code).is_ok(), "EPSG:{} missing", code);
        }
    }

    #[test]
    fn test_utm_codes_are_generated() {
        let north = lookup(32633).unwrap();
        assert!(north.proj.contains("+zone=33"));
        assert!(!north.proj.contains("+south"));
        assert!(lookup(32719).unwrap().proj.contains("+south"));
        assert!(lookup(26910).unwrap().proj.contains("+zone=10"));
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        assert!(matches!(lookup(999_999), Err(BandTraceError::UnsupportedCrs(999_999))));
        assert!(CoordinateSystemFactory::from_epsg(1234).is_err());
    }

    #[test]
    fn test_linear_units() {
        assert_eq!(lookup(4326).unwrap().linear_unit, LinearUnit::Degree);
        assert_eq!(lookup(3857).unwrap().linear_unit, LinearUnit::Metre);
        assert_eq!(lookup(2263).unwrap().linear_unit, LinearUnit::UsSurveyFoot);
        assert_eq!(LinearUnit::from_geokey(9002), Some(LinearUnit::Foot));
    }

    #[test]
    fn test_web_mercator_is_cleaned() {
        let def = lookup(3857).unwrap();
        assert!(!def.proj.contains("nadgrids"));
        assert!(!def.proj.contains("wktext"));
    }

    #[test]
    fn test_us_foot_conversion() {
        let feet = LinearUnit::UsSurveyFoot.from_metres(1.0);
        assert!((feet - 3.2808333333465).abs() < 1e-9);
    }

    #[test]
    fn test_from_string() {
        assert_eq!(CoordinateSystemFactory::from_string("epsg:4326").unwrap(), CoordinateSystem::WGS84);
        assert_eq!(CoordinateSystemFactory::from_string("32633").unwrap(), CoordinateSystem::UTM(33, true));
        assert!(CoordinateSystemFactory::from_string("WGS84").is_err());
    }
}
