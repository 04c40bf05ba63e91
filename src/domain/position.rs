//! Geographic position model.
//!
//! A [`Position`] is only ever produced by the location acquirer or restored
//! from the position store, and both paths go through [`Position::new`] so
//! that non-finite or out-of-range coordinates never reach a search request.

use super::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};

/// Valid latitude range in degrees.
const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Position {
    /// The `{0, 0}` fallback used for catalog entries without usable coordinates.
    pub const ORIGIN: Self = Self {
        latitude: 0.0,
        longitude: 0.0,
    };

    /// Creates a validated position.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidPosition`] if either coordinate is not
    /// finite or lies outside its valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// use gym_discovery::Position;
    ///
    /// let delhi = Position::new(28.6139, 77.2090)?;
    /// assert!(delhi.is_valid());
    /// assert!(Position::new(f64::NAN, 77.2090).is_err());
    /// # Ok::<(), gym_discovery::DiscoveryError>(())
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let position = Self {
            latitude,
            longitude,
        };
        if position.is_valid() {
            Ok(position)
        } else {
            Err(DiscoveryError::InvalidPosition(format!(
                "({latitude}, {longitude}) is not a finite in-range coordinate"
            )))
        }
    }

    /// Returns `true` if both coordinates are finite and in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && LATITUDE_RANGE.contains(&self.latitude)
            && LONGITUDE_RANGE.contains(&self.longitude)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_and_out_of_range() {
        assert!(Position::new(f64::INFINITY, 0.0).is_err());
        assert!(Position::new(0.0, f64::NAN).is_err());
        assert!(Position::new(90.5, 0.0).is_err());
        assert!(Position::new(0.0, -180.5).is_err());
    }

    #[test]
    fn origin_is_valid() {
        assert!(Position::ORIGIN.is_valid());
    }

    #[test]
    fn display_uses_four_decimals() {
        let p = Position::new(28.613_912, 77.209_01).unwrap();
        assert_eq!(p.to_string(), "28.6139, 77.2090");
    }
}
