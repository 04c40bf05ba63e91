//! Domain layer for the gym discovery client.
//!
//! This module contains the core value types shared by every other layer,
//! independent of the platform, the storage backend, and the HTTP transport.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`position`]: Validated coordinate pair
//! - [`gym`]: Catalog entities returned by search and detail queries
//!
//! # Examples
//!
//! ```
//! use gym_discovery::domain::{GymSummary, Position, Result};
//!
//! fn nearby() -> Result<GymSummary> {
//!     let at = Position::new(28.6139, 77.2090)?;
//!     Ok(GymSummary::new("g-42", "Powerhouse", at))
//! }
//! # nearby().unwrap();
//! ```

pub mod error;
pub mod gym;
pub mod position;

pub use error::{DiscoveryError, LocationError, Result, SearchError};
pub use gym::{GymDetail, GymSummary};
pub use position::Position;
