//! Constants used throughout the forms core crate.
//!
//! Path, filename and limit constants live here so storage layout and request bounds are
//! defined in one place.

/// Default root directory of the document store when none is configured.
pub const DEFAULT_DATA_DIR: &str = "forms_data";

/// Directory searched for PDF templates when no explicit directory is configured.
pub const TEMPLATE_DIR_NAME: &str = "templates";

/// Name of the spool directory created under the data directory by default.
pub const OUTPUT_DIR_NAME: &str = "output";

/// Filename of each stored document inside its sharded directory.
pub const DOCUMENT_JSON_FILENAME: &str = "document.json";

/// Suffix for in-flight writes; renamed into place once complete.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Default delay before a spooled PDF is deleted.
pub const DEFAULT_OUTPUT_TTL_SECS: u64 = 30;

/// Default upper bound on rows accepted by one bulk request.
pub const DEFAULT_MAX_BULK_ROWS: usize = 500;

/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Largest page size a listing will return.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Template filenames, one per document kind.
pub const SOC_TEMPLATE_FILENAME: &str = "soc_packet.pdf";
pub const NOMNC_TEMPLATE_FILENAME: &str = "nomnc.pdf";
pub const CONSENT_TEMPLATE_FILENAME: &str = "patient_consent.pdf";

/// Date format printed on the forms.
pub const FORM_DATE_FORMAT: &str = "%m/%d/%Y";
