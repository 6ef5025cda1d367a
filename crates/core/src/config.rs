//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services as an
//! `Arc<CoreConfig>`. Request handling never reads process environment variables.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_MAX_BULK_ROWS, DEFAULT_OUTPUT_TTL_SECS, OUTPUT_DIR_NAME,
    TEMPLATE_DIR_NAME,
};
use crate::forms::DocumentKind;
use crate::{FormsError, FormsResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming the document store root.
pub const DATA_DIR_ENV: &str = "FORMS_DATA_DIR";
/// Environment variable naming the template directory.
pub const TEMPLATE_DIR_ENV: &str = "FORMS_TEMPLATE_DIR";
/// Environment variable naming the spool directory.
pub const OUTPUT_DIR_ENV: &str = "FORMS_OUTPUT_DIR";
/// Environment variable holding the spool retention in seconds.
pub const OUTPUT_TTL_ENV: &str = "FORMS_OUTPUT_TTL_SECS";
/// Environment variable bounding bulk request size.
pub const MAX_BULK_ROWS_ENV: &str = "FORMS_MAX_BULK_ROWS";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    template_dir: PathBuf,
    output_dir: PathBuf,
    output_ttl: Duration,
    max_bulk_rows: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`, creating the data and output directories if needed.
    ///
    /// # Errors
    ///
    /// Returns `FormsError::InvalidInput` if `max_bulk_rows` is zero and
    /// `FormsError::StorageDirCreation` if a directory cannot be created.
    pub fn new(
        data_dir: PathBuf,
        template_dir: PathBuf,
        output_dir: PathBuf,
        output_ttl: Duration,
        max_bulk_rows: usize,
    ) -> FormsResult<Self> {
        if max_bulk_rows == 0 {
            return Err(FormsError::InvalidInput(
                "max_bulk_rows must be at least 1".into(),
            ));
        }

        std::fs::create_dir_all(&data_dir).map_err(FormsError::StorageDirCreation)?;
        std::fs::create_dir_all(&output_dir).map_err(FormsError::StorageDirCreation)?;

        Ok(Self {
            data_dir,
            template_dir,
            output_dir,
            output_ttl,
            max_bulk_rows,
        })
    }

    /// Builds the configuration from `FORMS_*` environment variables.
    ///
    /// Intended to be called once from a binary's `main`.
    pub fn from_env() -> FormsResult<Self> {
        let data_dir = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let template_dir =
            resolve_template_dir(std::env::var(TEMPLATE_DIR_ENV).ok().map(PathBuf::from))?;
        let output_dir = std::env::var(OUTPUT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join(OUTPUT_DIR_NAME));
        let ttl_secs = parse_env_value(
            OUTPUT_TTL_ENV,
            std::env::var(OUTPUT_TTL_ENV).ok(),
            DEFAULT_OUTPUT_TTL_SECS,
        )?;
        let max_bulk_rows = parse_env_value(
            MAX_BULK_ROWS_ENV,
            std::env::var(MAX_BULK_ROWS_ENV).ok(),
            DEFAULT_MAX_BULK_ROWS,
        )?;

        Self::new(
            data_dir,
            template_dir,
            output_dir,
            Duration::from_secs(ttl_secs),
            max_bulk_rows,
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_ttl(&self) -> Duration {
        self.output_ttl
    }

    pub fn max_bulk_rows(&self) -> usize {
        self.max_bulk_rows
    }

    /// Directory holding every stored document of `kind`.
    pub fn collection_dir(&self, kind: DocumentKind) -> PathBuf {
        self.data_dir.join(kind.collection())
    }

    /// Full path of the PDF template for `kind`.
    pub fn template_path(&self, kind: DocumentKind) -> PathBuf {
        self.template_dir.join(kind.template_file())
    }

    /// Template kinds whose file is absent from the template directory.
    pub fn missing_templates(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|kind| !self.template_path(*kind).is_file())
            .collect()
    }
}

/// Resolve the template directory without reading environment variables.
///
/// If `override_dir` is provided it must be an existing directory. Otherwise this searches for
/// `templates/` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`. When nothing is found the relative `templates/` path is returned so the
/// caller can report it; rendering then fails per request.
pub fn resolve_template_dir(override_dir: Option<PathBuf>) -> FormsResult<PathBuf> {
    if let Some(template_dir) = override_dir {
        if template_dir.is_dir() {
            return Ok(template_dir);
        }
        return Err(FormsError::InvalidInput(format!(
            "{} override is not a directory: {}",
            TEMPLATE_DIR_ENV,
            template_dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(TEMPLATE_DIR_NAME);
    if cwd_relative.is_dir() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(TEMPLATE_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }

    Ok(cwd_relative)
}

/// Parse an optional numeric setting.
///
/// `None` or an empty/whitespace value yields `default`.
pub fn parse_env_value<T: FromStr>(name: &str, value: Option<String>, default: T) -> FormsResult<T> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        None => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|_| FormsError::InvalidInput(format!("{} has an invalid value: '{}'", name, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_directories() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("data");
        let output = temp.path().join("data").join("output");
        let cfg = CoreConfig::new(
            data.clone(),
            temp.path().join("templates"),
            output.clone(),
            Duration::from_secs(5),
            10,
        )
        .unwrap();

        assert!(data.is_dir());
        assert!(output.is_dir());
        assert_eq!(cfg.collection_dir(DocumentKind::Soc), data.join("soc"));
        assert_eq!(
            cfg.template_path(DocumentKind::Nomnc),
            temp.path().join("templates").join("nomnc.pdf")
        );
    }

    #[test]
    fn test_new_rejects_zero_bulk_rows() {
        let temp = TempDir::new().unwrap();
        let err = CoreConfig::new(
            temp.path().to_path_buf(),
            temp.path().to_path_buf(),
            temp.path().join("out"),
            Duration::from_secs(5),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, FormsError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_templates() {
        let temp = TempDir::new().unwrap();
        let templates = temp.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("nomnc.pdf"), b"%PDF-").unwrap();

        let cfg = CoreConfig::new(
            temp.path().join("data"),
            templates,
            temp.path().join("out"),
            Duration::from_secs(5),
            10,
        )
        .unwrap();

        assert_eq!(
            cfg.missing_templates(),
            vec![DocumentKind::Soc, DocumentKind::Consent]
        );
    }

    #[test]
    fn test_resolve_template_dir_override() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_template_dir(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(resolved, temp.path());

        let missing = temp.path().join("nope");
        assert!(resolve_template_dir(Some(missing)).is_err());
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env_value("X", None, 30u64).unwrap(), 30);
        assert_eq!(parse_env_value("X", Some("  ".into()), 30u64).unwrap(), 30);
        assert_eq!(parse_env_value("X", Some(" 45 ".into()), 30u64).unwrap(), 45);
        assert!(parse_env_value("X", Some("soon".into()), 30u64).is_err());
    }
}
