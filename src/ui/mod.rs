//! Bridge between the state machine and the map/list screen.
//!
//! ```text
//! AppState → compute_viewmodel → DiscoveryViewModel → render / native views
//!     ↑
//! ViewSync ── ViewCommand ──→ MapSurface
//! ```
//!
//! # Modules
//!
//! - [`sync`]: [`ViewSync`] selection and recenter bookkeeping
//! - [`map`]: [`MapSurface`] capability and command execution
//! - [`viewmodel`]: View model types
//! - [`renderer`]: Plain-text rendering for the CLI

pub mod map;
pub mod renderer;
pub mod sync;
pub mod viewmodel;

pub use map::{MapSurface, SurfaceError};
pub use renderer::render_text;
pub use sync::{ViewCommand, ViewSync};
pub use viewmodel::{
    Banner, DiscoveryViewModel, EmptyState, GymRow, HeaderInfo, MapMarker, PermissionPrompt,
};
