//! Storage record models for the position cache.
//!
//! [`PositionRecord`] is the exact JSON shape persisted under the
//! `"userLocation"` key. [`CachedPosition`] is what callers get back once the
//! record has been validated and its age checked.

use crate::domain::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw persisted record.
///
/// `latitude`/`longitude` are `null` when the record documents an explicit
/// permission denial rather than a fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Acquisition time in milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// Whether location permission was granted when the record was written.
    pub permission: bool,
}

impl PositionRecord {
    /// Builds a record for `position` captured at `captured_at`.
    #[must_use]
    pub fn new(position: Option<Position>, permission: bool, captured_at: DateTime<Utc>) -> Self {
        Self {
            latitude: position.map(|p| p.latitude),
            longitude: position.map(|p| p.longitude),
            timestamp: captured_at.timestamp_millis(),
            permission,
        }
    }
}

/// A validated, unexpired position cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPosition {
    /// Last fix, `None` for a recorded denial or an unusable stored fix.
    pub position: Option<Position>,

    /// When the fix (or denial) was recorded.
    pub captured_at: DateTime<Utc>,

    /// Permission outcome at capture time; cleared by failed acquisitions.
    pub permission_granted: bool,
}

impl CachedPosition {
    /// Returns the position if this entry can skip permission and acquisition.
    ///
    /// A hit needs both a valid fix and a granted permission.
    #[must_use]
    pub fn usable_position(&self) -> Option<Position> {
        if self.permission_granted {
            self.position.filter(Position::is_valid)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_record_serializes_null_coordinates() {
        let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let record = PositionRecord::new(None, false, at);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"latitude":null,"longitude":null,"timestamp":1700000000000,"permission":false}"#
        );
    }

    #[test]
    fn usable_position_requires_permission() {
        let cached = CachedPosition {
            position: Some(Position::new(28.6139, 77.2090).unwrap()),
            captured_at: Utc::now(),
            permission_granted: false,
        };
        assert!(cached.usable_position().is_none());
    }
}
