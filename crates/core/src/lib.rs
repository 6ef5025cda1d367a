//! # Forms Core
//!
//! Core business logic for the home health forms service.
//!
//! This crate contains pure data operations and file/folder management:
//! - Form models (SOC packet, NOMNC notice, patient consent) with validation and page layouts
//! - Sharded JSON document storage under the configured data directory
//! - Rendering stored documents onto their PDF templates
//! - A spool directory for rendered output
//!
//! **No API concerns**: HTTP servers, routing and response shaping belong in `api-rest` and
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod forms;
pub mod lenient;
mod repo;
pub mod service;
pub mod spool;
pub mod store;

pub use config::CoreConfig;
pub use error::{FormsError, FormsResult};
pub use forms::{
    download_file_name, DocumentKind, FormDocument, Medication, NomncNotice, PatientConsent,
    SocPacket,
};
pub use forms_uuid::DocumentId;
pub use service::{BulkReport, BulkRowError, FormService, GeneratedDocument};
pub use spool::OutputSpool;
pub use store::{Collection, DocumentStore, ListQuery, Page, StoredDocument};
