//! Gym catalog models.
//!
//! [`GymSummary`] is the row type returned by the discovery endpoint and shown
//! both as a list row and as a map marker. [`GymDetail`] is the richer record
//! returned by the profile endpoint. Parsing from the wire lives in
//! [`crate::search::normalize`]; these types are already cleaned up.

use super::position::Position;
use serde::{Deserialize, Serialize};

/// A gym as returned by the proximity search.
///
/// # Fields
///
/// - `id`: Catalog identifier, unique within a discovery session
/// - `name`: Display name
/// - `address`: Single-line postal address (may be empty)
/// - `coordinates`: Gym location, [`Position::ORIGIN`] when the catalog entry had none
/// - `rating`: Average rating, `0.0` when unrated
/// - `daily_pass_price`: Price of a day pass, if the gym sells one
/// - `gym_type`: Catalog category (e.g. `"gym"`, `"crossfit"`, `"yoga"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GymSummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Position,
    pub rating: f64,
    pub daily_pass_price: Option<f64>,
    pub gym_type: String,
}

impl GymSummary {
    /// Creates a summary with only the required fields set.
    ///
    /// # Examples
    ///
    /// ```
    /// use gym_discovery::{GymSummary, Position};
    ///
    /// let gym = GymSummary::new("g-1", "Iron Temple", Position::ORIGIN);
    /// assert_eq!(gym.rating, 0.0);
    /// assert!(gym.daily_pass_price.is_none());
    /// ```
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinates: Position) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: String::new(),
            coordinates,
            rating: 0.0,
            daily_pass_price: None,
            gym_type: "gym".to_string(),
        }
    }

    /// Returns `true` if the catalog entry had no usable coordinates.
    #[must_use]
    pub fn has_placeholder_coordinates(&self) -> bool {
        self.coordinates == Position::ORIGIN
    }

    /// Formats the day-pass price for display, e.g. `"₹299/day"`.
    #[must_use]
    pub fn price_label(&self) -> String {
        self.daily_pass_price.map_or_else(
            || "No day pass".to_string(),
            |price| format!("₹{price:.0}/day"),
        )
    }
}

/// Full gym profile as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GymDetail {
    /// Fields shared with the search result.
    pub summary: GymSummary,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<String>,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
}
