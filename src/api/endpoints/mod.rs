//! Endpoint handlers, one module per area.

pub mod chat;
pub mod documents;
pub mod health;
pub mod labs;
pub mod session;
