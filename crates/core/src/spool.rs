//! Short-lived on-disk copies of rendered PDFs.

use crate::config::CoreConfig;
use crate::{FormsError, FormsResult};
use forms_uuid::DocumentId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Output directory where each rendered PDF is written before being streamed back.
///
/// Files are expected to be removed after [`OutputSpool::ttl`]; the caller schedules that.
/// [`OutputSpool::sweep_expired`] removes anything left behind by a previous process.
#[derive(Clone, Debug)]
pub struct OutputSpool {
    dir: PathBuf,
    ttl: Duration,
}

impl OutputSpool {
    pub fn new(dir: PathBuf, ttl: Duration) -> Self {
        Self { dir, ttl }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.output_dir().to_path_buf(), cfg.output_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Writes `bytes` as `<id>_<file_name>` and returns the path.
    pub fn write(&self, id: DocumentId, file_name: &str, bytes: &[u8]) -> FormsResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(FormsError::SpoolWrite)?;
        let path = self.dir.join(format!("{}_{}", id, file_name));
        fs::write(&path, bytes).map_err(FormsError::SpoolWrite)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "spooled output");
        Ok(path)
    }

    /// Deletes a spooled file. A file that is already gone is not an error.
    pub fn remove(path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed spooled output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove spooled output")
            }
        }
    }

    /// Removes files older than the TTL, returning how many were deleted.
    pub fn sweep_expired(&self) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age >= self.ttl);
            if expired && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, dir = %self.dir.display(), "swept expired output files");
        }
        removed
    }
}
