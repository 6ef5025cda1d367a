//! Storage directory utilities.
//!
//! Allocation of sharded document directories and atomic JSON writes.

use crate::constants::TEMP_SUFFIX;
use crate::{FormsError, FormsResult};
use forms_uuid::DocumentId;
use serde::Serialize;
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// Creates a unique sharded directory for a new document.
///
/// Identifiers come from `id_source`. A collision with an existing directory (or one created
/// concurrently) is retried with a fresh identifier, up to 5 times.
///
/// # Errors
///
/// Returns `FormsError::DocumentDirCreation` if directory creation fails or no unique
/// directory could be allocated after 5 attempts.
pub(crate) fn create_unique_document_dir(
    base_dir: &Path,
    mut id_source: impl FnMut() -> DocumentId,
) -> FormsResult<(DocumentId, PathBuf)> {
    for _attempt in 0..5 {
        let id = id_source();
        let candidate = id.sharded_dir(base_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(FormsError::DocumentDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((id, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(FormsError::DocumentDirCreation(e)),
        }
    }

    Err(FormsError::DocumentDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique document directory after 5 attempts",
    )))
}

/// Serializes `value` as pretty JSON into `path`, writing a sibling temp file first and
/// renaming it into place so readers never observe a partial document.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> FormsResult<()> {
    let json = serde_json::to_vec_pretty(value).map_err(FormsError::Serialization)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(TEMP_SUFFIX);
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, json).map_err(FormsError::FileWrite)?;
    fs::rename(&tmp_path, path).map_err(FormsError::FileWrite)
}
