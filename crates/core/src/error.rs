use crate::forms::DocumentKind;
use forms_uuid::DocumentId;

#[derive(Debug, thiserror::Error)]
pub enum FormsError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid document id: {0}")]
    InvalidId(#[from] forms_uuid::UuidError),
    #[error("{kind} document not found: {id}")]
    NotFound { kind: DocumentKind, id: DocumentId },

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create document directory: {0}")]
    DocumentDirCreation(std::io::Error),
    #[error("failed to write document file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document: {0}")]
    Deserialization(serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] forms_pdf::PdfError),
    #[error("failed to write output file: {0}")]
    SpoolWrite(std::io::Error),
}

impl FormsError {
    /// True for errors caused by the request rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FormsError::MissingFields(_) | FormsError::InvalidInput(_) | FormsError::InvalidId(_)
        )
    }
}

pub type FormsResult<T> = std::result::Result<T, FormsError>;
