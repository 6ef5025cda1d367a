//! # Forms PDF
//!
//! Coordinate overlay engine for fixed-layout PDF templates.
//!
//! A template is an ordinary PDF whose pages already carry the printed form. Filling it means
//! drawing on top of those pages at literal `(x, y)` positions (PDF user space, origin at the
//! bottom-left corner of the page). Nothing here touches interactive AcroForm fields.
//!
//! The pieces:
//! - [`Layout`] / [`FieldSpec`]: static lookup tables mapping a field key to a page index, a
//!   position and a [`FieldKind`].
//! - [`FieldValues`]: the values for one document, keyed like the layout.
//! - [`metrics`]: Helvetica width estimates used for wrapping and truncation.
//! - [`SignatureImage`]: base64 (or data-URL) signature bitmaps decoded for embedding.
//! - [`Stamper`]: queues drawing operations per page and writes them as overlay content streams.
//! - [`render`]: walks a layout once against a set of values and returns the filled PDF bytes.

#![warn(rust_2018_idioms)]

mod encoding;
mod layout;
pub mod metrics;
mod render;
mod signature;
mod stamp;
mod template;
mod values;

pub use layout::{Column, FieldKind, FieldSpec, Layout};
pub use render::{fill, render};
pub use signature::SignatureImage;
pub use stamp::Stamper;
pub use template::blank_template;
pub use values::{FieldValue, FieldValues, Row};

use std::path::PathBuf;

/// Errors raised while loading, filling or writing a PDF.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error("failed to read template: {0}")]
    TemplateRead(std::io::Error),
    #[error("failed to parse PDF: {0}")]
    Parse(lopdf::Error),
    #[error("page index {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
    #[error("malformed PDF structure: {0}")]
    Structure(String),
    #[error("failed to encode content stream: {0}")]
    Encode(lopdf::Error),
    #[error("failed to write PDF: {0}")]
    Write(std::io::Error),
    #[error("invalid signature image: {0}")]
    Signature(String),
}

pub type PdfResult<T> = std::result::Result<T, PdfError>;
