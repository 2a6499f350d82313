//! HTTP surface over the boundary operations.
//!
//! Handlers decode requests, hand the work to `ingest`, `chat` or `labs`
//! on the blocking pool, and map `CoreError` to structured JSON errors.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;

pub use router::api_router;
pub use server::{serve, ServerError};
