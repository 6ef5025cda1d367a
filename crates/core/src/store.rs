//! Sharded JSON document store.
//!
//! Each collection lives in its own directory under the data root:
//!
//! ```text
//! <data>/<collection>/<s1>/<s2>/<32hex-id>/document.json
//! ```
//!
//! where `s1`/`s2` are the first four hex characters of the id.

use crate::config::CoreConfig;
use crate::constants::{DEFAULT_PAGE_LIMIT, DOCUMENT_JSON_FILENAME, MAX_PAGE_LIMIT};
use crate::forms::FormDocument;
use crate::repo::{create_unique_document_dir, write_json_atomic};
use crate::{FormsError, FormsResult};
use chrono::{DateTime, Utc};
use forms_uuid::DocumentId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A persisted form with its bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument<T> {
    pub id: DocumentId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

/// Pagination and search parameters for [`Collection::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
}

impl ListQuery {
    /// Resolves defaults and clamps to the accepted ranges: page is at least 1 and limit is
    /// between 1 and the maximum page size. A blank search is dropped.
    pub fn normalized(&self) -> (usize, usize, Option<String>) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        (page, limit, search)
    }
}

/// One page of list results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<StoredDocument<T>>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Entry point to the per-kind collections under the configured data root.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    cfg: Arc<CoreConfig>,
}

impl DocumentStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn collection<T: FormDocument>(&self) -> Collection<T> {
        Collection::new(self.cfg.collection_dir(T::KIND))
    }
}

/// Typed access to the documents of one form kind.
#[derive(Debug)]
pub struct Collection<T> {
    dir: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: FormDocument> Collection<T> {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            _marker: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists `data` under a freshly allocated id.
    pub fn create(&self, data: T) -> FormsResult<StoredDocument<T>> {
        fs::create_dir_all(&self.dir).map_err(FormsError::StorageDirCreation)?;
        let (id, doc_dir) = create_unique_document_dir(&self.dir, DocumentId::new)?;

        let now = Utc::now();
        let doc = StoredDocument {
            id,
            created_at: now,
            updated_at: now,
            data,
        };

        write_json_atomic(&doc_dir.join(DOCUMENT_JSON_FILENAME), &doc)?;
        tracing::info!(kind = %T::KIND, %id, "document created");
        Ok(doc)
    }

    /// Loads the document with `id`.
    ///
    /// # Errors
    ///
    /// `FormsError::NotFound` if no such document exists; read or parse failures otherwise.
    pub fn get(&self, id: DocumentId) -> FormsResult<StoredDocument<T>> {
        let path = self.document_path(id);
        if !path.is_file() {
            return Err(FormsError::NotFound { kind: T::KIND, id });
        }
        let contents = fs::read_to_string(&path).map_err(FormsError::FileRead)?;
        serde_json::from_str(&contents).map_err(FormsError::Deserialization)
    }

    /// Overwrites the form data of an existing document, keeping `createdAt` and bumping
    /// `updatedAt`.
    pub fn replace(&self, id: DocumentId, data: T) -> FormsResult<StoredDocument<T>> {
        let existing = self.get(id)?;
        let doc = StoredDocument {
            id,
            created_at: existing.created_at,
            updated_at: Utc::now(),
            data,
        };

        write_json_atomic(&self.document_path(id), &doc)?;
        tracing::info!(kind = %T::KIND, %id, "document updated");
        Ok(doc)
    }

    /// Every readable document in the collection, in no particular order.
    ///
    /// Unreadable or unparsable documents are logged and skipped.
    pub fn all(&self) -> Vec<StoredDocument<T>> {
        let mut documents = Vec::new();

        let s1_iter = match fs::read_dir(&self.dir) {
            Ok(it) => it,
            Err(_) => return documents,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };
                for id_ent in id_iter.flatten() {
                    let doc_path = id_ent.path().join(DOCUMENT_JSON_FILENAME);
                    if !doc_path.is_file() {
                        continue;
                    }

                    let parsed = fs::read_to_string(&doc_path)
                        .map_err(FormsError::FileRead)
                        .and_then(|c| serde_json::from_str(&c).map_err(FormsError::Deserialization));
                    match parsed {
                        Ok(doc) => documents.push(doc),
                        Err(e) => tracing::warn!(
                            path = %doc_path.display(),
                            error = %e,
                            "skipping unreadable document"
                        ),
                    }
                }
            }
        }

        documents
    }

    /// Newest-first page of documents whose search text contains the query, ignoring case.
    pub fn list(&self, query: &ListQuery) -> Page<T> {
        let (page, limit, search) = query.normalized();

        let mut matching: Vec<StoredDocument<T>> = self
            .all()
            .into_iter()
            .filter(|doc| match &search {
                Some(needle) => doc.data.search_text().to_lowercase().contains(needle),
                None => true,
            })
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Page {
            items,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }

    fn document_path(&self, id: DocumentId) -> PathBuf {
        id.sharded_dir(&self.dir).join(DOCUMENT_JSON_FILENAME)
    }
}
