//! Form services.
//!
//! [`FormService`] is the single entry point the API surfaces use for a form kind: it validates
//! payloads, persists them through the document store and renders the PDF template.

use crate::config::CoreConfig;
use crate::forms::FormDocument;
use crate::store::{Collection, DocumentStore, ListQuery, Page, StoredDocument};
use crate::{FormsError, FormsResult};
use forms_pdf::{fill, Stamper};
use forms_uuid::DocumentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

/// Keys managed by the store; they are ignored when merging an update.
const RESERVED_KEYS: [&str; 4] = ["id", "_id", "createdAt", "updatedAt"];

/// A stored document together with its freshly rendered PDF.
#[derive(Debug, Clone)]
pub struct GeneratedDocument<T> {
    pub document: StoredDocument<T>,
    pub pdf: Vec<u8>,
    /// Download name including the `.pdf` extension.
    pub file_name: String,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    /// Ids of the documents created, in row order.
    #[schema(value_type = Vec<String>)]
    pub created: Vec<DocumentId>,
    pub errors: Vec<BulkRowError>,
}

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BulkRowError {
    /// 1-based position in the submitted array.
    pub row: usize,
    pub message: String,
}

/// Operations on one form kind.
#[derive(Clone, Debug)]
pub struct FormService<T> {
    cfg: Arc<CoreConfig>,
    collection: Collection<T>,
}

impl<T: FormDocument> FormService<T> {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let collection = DocumentStore::new(cfg.clone()).collection();
        Self { cfg, collection }
    }

    /// Validates and persists `data`, then renders it.
    ///
    /// The document stays stored even if rendering fails afterwards.
    pub fn generate(&self, data: T) -> FormsResult<GeneratedDocument<T>> {
        data.validate()?;
        let document = self.collection.create(data)?;
        self.render_stored(document)
    }

    /// Merges the top-level keys of `patch` into the stored document, validates the result,
    /// persists it and re-renders.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `patch` is not an object or the merged document does not deserialize;
    /// `MissingFields` if the merge blanks a required field; `NotFound` for an unknown id.
    pub fn update(&self, id: DocumentId, patch: Value) -> FormsResult<GeneratedDocument<T>> {
        let Value::Object(patch) = patch else {
            return Err(FormsError::InvalidInput(
                "update body must be a JSON object".into(),
            ));
        };

        let existing = self.collection.get(id)?;
        let mut merged = serde_json::to_value(&existing.data).map_err(FormsError::Serialization)?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in patch {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                fields.insert(key, value);
            }
        }

        let data: T = serde_json::from_value(merged)
            .map_err(|e| FormsError::InvalidInput(e.to_string()))?;
        data.validate()?;

        let document = self.collection.replace(id, data)?;
        self.render_stored(document)
    }

    pub fn get(&self, id: DocumentId) -> FormsResult<StoredDocument<T>> {
        self.collection.get(id)
    }

    pub fn list(&self, query: &ListQuery) -> Page<T> {
        self.collection.list(query)
    }

    /// Re-renders a stored document without modifying it.
    pub fn render(&self, id: DocumentId) -> FormsResult<GeneratedDocument<T>> {
        let document = self.collection.get(id)?;
        self.render_stored(document)
    }

    /// Imports `rows` one at a time. A row that fails to parse, validate or persist is recorded
    /// in the report and the loop moves on.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `rows` is empty or longer than the configured maximum.
    pub fn bulk_create(&self, rows: Vec<Value>) -> FormsResult<BulkReport> {
        if rows.is_empty() {
            return Err(FormsError::InvalidInput("no rows to import".into()));
        }
        if rows.len() > self.cfg.max_bulk_rows() {
            return Err(FormsError::InvalidInput(format!(
                "too many rows: {} (maximum {})",
                rows.len(),
                self.cfg.max_bulk_rows()
            )));
        }

        let mut report = BulkReport::default();
        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            let outcome = serde_json::from_value::<T>(row)
                .map_err(|e| FormsError::InvalidInput(e.to_string()))
                .and_then(|data| {
                    data.validate()?;
                    self.collection.create(data)
                });

            match outcome {
                Ok(document) => report.created.push(document.id),
                Err(e) => {
                    tracing::warn!(kind = %T::KIND, row = row_number, error = %e, "bulk row rejected");
                    report.errors.push(BulkRowError {
                        row: row_number,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            kind = %T::KIND,
            created = report.created.len(),
            failed = report.errors.len(),
            "bulk import finished"
        );
        Ok(report)
    }

    fn render_stored(&self, document: StoredDocument<T>) -> FormsResult<GeneratedDocument<T>> {
        let template = self.cfg.template_path(T::KIND);
        let mut stamper = Stamper::open(&template)?;
        let drawn = fill(&mut stamper, T::layout(), &document.data.field_values())?;
        let pdf = stamper.finish()?;

        tracing::debug!(kind = %T::KIND, id = %document.id, drawn, bytes = pdf.len(), "rendered");
        let file_name = format!("{}.pdf", document.data.file_stem());
        Ok(GeneratedDocument {
            document,
            pdf,
            file_name,
        })
    }
}
