//! Elevation band planning
//!
//! A band specification is either a uniform step (`"2.5"`) or a list of
//! explicit `bottom-top` ranges (`"0-10,10-20"`). Explicit ranges are
//! validated before any raster is read; stepped bands need the grid's valid
//! value range.

use std::fmt;

use log::debug;

use crate::errors::ValidationError;

/// Half-open elevation interval `[bottom, top)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationBand {
    pub bottom: f64,
    pub top: f64,
}

impl ElevationBand {
    pub fn new(bottom: f64, top: f64) -> Self {
        ElevationBand { bottom, top }
    }

    /// Whether `value` falls inside the band; `top` itself belongs to the next band
    pub fn contains(&self, value: f64) -> bool {
        self.bottom <= value && value < self.top
    }
}

impl fmt::Display for ElevationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.bottom, self.top)
    }
}

/// Parsed band specification
#[derive(Debug, Clone, PartialEq)]
pub enum BandSpec {
    /// Uniform step over the grid's valid value range
    Step(f64),
    /// Explicit, sorted, non-overlapping ranges
    Ranges(Vec<ElevationBand>),
}

impl BandSpec {
    /// Parses a band specification
    ///
    /// Text that parses as a single number is a step; anything else is a
    /// comma-separated range list.
    ///
    /// # Returns
    /// The specification, or the first validation problem found
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyRangeList);
        }

        if let Ok(step) = text.parse::<f64>() {
            return Self::step(step);
        }

        let mut ranges = text
            .split(',')
            .map(parse_range)
            .collect::<Result<Vec<_>, _>>()?;

        ranges.sort_by(|a, b| a.bottom.total_cmp(&b.bottom).then(a.top.total_cmp(&b.top)));

        if let Some(pair) = ranges.windows(2).find(|pair| pair[0].top > pair[1].bottom) {
            return Err(ValidationError::OverlappingRanges {
                first: (pair[0].bottom, pair[0].top),
                second: (pair[1].bottom, pair[1].top),
            });
        }

        Ok(BandSpec::Ranges(ranges))
    }

    /// Uniform step specification
    pub fn step(step: f64) -> Result<Self, ValidationError> {
        if step.is_finite() && step > 0.0 {
            Ok(BandSpec::Step(step))
        } else {
            Err(ValidationError::InvalidStep(step.to_string()))
        }
    }

    /// Whether the bands depend on the raster's values
    pub fn needs_value_range(&self) -> bool {
        matches!(self, BandSpec::Step(_))
    }

    /// Produces the ordered bands
    ///
    /// # Arguments
    /// * `valid_range` - `(min, max)` over non-nodata cells; `None` when the
    ///   grid has no valid cell, which yields no stepped bands
    pub fn plan(&self, valid_range: Option<(f64, f64)>) -> Vec<ElevationBand> {
        match self {
            BandSpec::Ranges(ranges) => ranges.clone(),
            BandSpec::Step(step) => match valid_range {
                Some((lo, hi)) => stepped_bands(lo.floor(), hi.ceil(), *step),
                None => Vec::new(),
            },
        }
    }
}

/// Bands of width `step` from `start` while the bottom stays below `end`
///
/// The last band is cut at `end`.
fn stepped_bands(start: f64, end: f64, step: f64) -> Vec<ElevationBand> {
    let mut bands = Vec::new();
    let mut k = 0u64;

    loop {
        // Multiply rather than accumulate to keep bottoms exact
        let bottom = start + k as f64 * step;
        if bottom >= end {
            break;
        }
        let top = (start + (k + 1) as f64 * step).min(end);
        bands.push(ElevationBand::new(bottom, top));
        k += 1;
    }

    debug!("Planned {} bands of {} over [{}, {})", bands.len(), step, start, end);
    bands
}

/// Parses one `bottom-top` token
fn parse_range(token: &str) -> Result<ElevationBand, ValidationError> {
    let token = token.trim();
    let parts: Vec<&str> = token.split('-').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(ValidationError::MalformedRange(token.to_string()));
    }

    let bound = |text: &str| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ValidationError::NonNumericRange(token.to_string()))
    };
    let (bottom, top) = (bound(parts[0])?, bound(parts[1])?);

    if bottom >= top {
        return Err(ValidationError::InvertedRange(token.to_string()));
    }

    Ok(ElevationBand::new(bottom, top))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_ranges() {
        let spec = BandSpec::parse("0-10,10-20").unwrap();
        assert_eq!(
            spec.plan(None),
            vec![ElevationBand::new(0.0, 10.0), ElevationBand::new(10.0, 20.0)]
        );
    }

    #[test]
    fn test_ranges_are_sorted() {
        let spec = BandSpec::parse(" 20-30 , 0-5").unwrap();
        assert_eq!(spec.plan(None)[0], ElevationBand::new(0.0, 5.0));
        assert!(!spec.needs_value_range());
    }

    #[test]
    fn test_overlap_is_rejected() {
        assert_eq!(
            BandSpec::parse("0-15,10-20"),
            Err(ValidationError::OverlappingRanges { first: (0.0, 15.0), second: (10.0, 20.0) })
        );
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert_eq!(BandSpec::parse("10-5"), Err(ValidationError::InvertedRange("10-5".to_string())));
        assert!(matches!(BandSpec::parse("5-5"), Err(ValidationError::InvertedRange(_))));
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert_eq!(BandSpec::parse(""), Err(ValidationError::EmptyRangeList));
        assert_eq!(BandSpec::parse("   "), Err(ValidationError::EmptyRangeList));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(BandSpec::parse("0-10,"), Err(ValidationError::MalformedRange(_))));
        assert!(matches!(BandSpec::parse("0-5-10"), Err(ValidationError::MalformedRange(_))));
        assert!(matches!(BandSpec::parse("a-b"), Err(ValidationError::NonNumericRange(_))));
    }

    #[test]
    fn test_step_must_be_positive() {
        assert!(matches!(BandSpec::parse("0"), Err(ValidationError::InvalidStep(_))));
        assert!(matches!(BandSpec::parse("-2"), Err(ValidationError::InvalidStep(_))));
        assert_eq!(BandSpec::parse("2.5"), Ok(BandSpec::Step(2.5)));
    }

    #[test]
    fn test_step_covers_floor_to_ceil_without_gaps() {
        let bands = BandSpec::Step(3.0).plan(Some((0.4, 9.2)));
        assert_eq!(bands.first().map(|b| b.bottom), Some(0.0));
        assert_eq!(bands.last().map(|b| b.top), Some(10.0));
        for pair in bands.windows(2) {
            assert_eq!(pair[0].top, pair[1].bottom);
        }
        // Last band is narrower since 3 does not divide 10
        assert_eq!(bands.last(), Some(&ElevationBand::new(9.0, 10.0)));
        assert!(bands.iter().all(|b| b.bottom < b.top));
    }

    #[test]
    fn test_step_without_valid_cells() {
        assert!(BandSpec::Step(1.0).plan(None).is_empty());
    }

    #[test]
    fn test_half_open_membership() {
        let band = ElevationBand::new(10.0, 20.0);
        assert!(band.contains(10.0));
        assert!(band.contains(19.999));
        assert!(!band.contains(20.0));
    }
}
