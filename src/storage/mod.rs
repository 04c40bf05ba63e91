//! Storage layer for the persisted device position.
//!
//! This module provides the key-value backend abstraction and the position
//! cache built on top of it.
//!
//! # Modules
//!
//! - `backend`: [`KeyValueStore`] trait for backend implementations
//! - `json`: JSON file backend with atomic writes
//! - `memory`: In-memory backend
//! - `models`: Persisted record shape and the validated cache entry
//! - `position_store`: TTL-enforcing [`PositionStore`]

pub mod backend;
pub mod json;
pub mod memory;
pub mod models;
pub mod position_store;

pub use backend::KeyValueStore;
pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use models::{CachedPosition, PositionRecord};
pub use position_store::{PositionStore, DEFAULT_TTL_MINUTES, POSITION_KEY};
