//! # API Shared
//!
//! Shared transport types for the forms APIs.
//!
//! Contains:
//! - Health check response and `HealthService`
//! - The JSON error body returned by every failing request
//! - List query parameters
//!
//! Used by `api-rest`; free of storage and rendering concerns.

pub mod dto;
pub mod health;

pub use dto::{ErrorRes, ListParams};
pub use health::{HealthRes, HealthService};
