//! Shared building blocks for the chapter portal services.
//!
//! Contains configuration loading, the error taxonomy, the unified API
//! response envelope, HTTP middleware, and shared data models.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
