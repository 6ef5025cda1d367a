//! Document identifiers and sharded storage paths.
//!
//! Every stored form (SOC packet, NOMNC notice, patient consent) is addressed by a
//! [`DocumentId`]: a UUID v4 in **canonical form**, 32 lowercase hexadecimal characters with no
//! hyphens.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Identifiers arriving from outside (URL path segments, CLI arguments) must already be
//! canonical; [`DocumentId::parse`] rejects everything else rather than normalising it.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, a document lives under:
//! `collection_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `forms_data/soc/55/0e/550e8400e29b41d4a716446655440000/document.json`

mod service;

pub use service::{DocumentId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
