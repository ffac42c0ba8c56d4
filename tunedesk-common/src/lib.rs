//! # TuneDesk Common Library
//!
//! Shared code for the TuneDesk catalog services including:
//! - Database initialization and track models
//! - Event types (CatalogEvent enum) and the event bus
//! - Configuration loading and root folder resolution
//! - Human-readable duration formatting

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};
