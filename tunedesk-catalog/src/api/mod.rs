//! HTTP API handlers for tunedesk-catalog
//!
//! REST endpoints for the track library, albums and the duration correction
//! sweep, plus an SSE stream of catalog events.

pub mod albums;
pub mod durations;
pub mod health;
pub mod sse;
pub mod tracks;

pub use albums::album_routes;
pub use durations::duration_routes;
pub use health::health_routes;
pub use sse::event_stream;
pub use tracks::track_routes;
