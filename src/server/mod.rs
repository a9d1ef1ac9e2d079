//! HTTP server exposing the relay.
//!
//! - [`api`]: Request/response types and route handlers
//! - [`docs`]: Interactive docs page and OpenAPI document

pub mod api;
pub mod docs;
