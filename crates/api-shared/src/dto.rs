use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Error body: `{ "error": "...", "missingFields": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRes {
    pub error: String,
    /// Present only when required fields were absent or blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            missing_fields: None,
        }
    }

    pub fn missing(error: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            error: error.into(),
            missing_fields: Some(fields),
        }
    }
}

/// Query string of the list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number (default 1).
    pub page: Option<usize>,
    /// Page size, 1 to 100 (default 10).
    pub limit: Option<usize>,
    /// Case-insensitive match on patient name and identifiers.
    pub search: Option<String>,
}
