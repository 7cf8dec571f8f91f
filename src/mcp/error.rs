//! MCP-specific error types and mapping to JSON-RPC error codes.

use crate::entity::ContributionType;
use crate::error::SlicePieError;
use rmcp::model::ErrorCode;
use rmcp::ErrorData as RmcpError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Custom MCP error codes (in the -32000 to -32099 range for server errors)
pub mod error_codes {
    pub const ENTITY_NOT_FOUND: i32 = -32001;
    pub const CONTRIBUTION_TYPE_INVALID: i32 = -32002;
    pub const VALIDATION_FAILED: i32 = -32003;
    pub const CONTRIBUTOR_DELETED: i32 = -32004;
    pub const RESOURCE_NOT_FOUND: i32 = -32005;
    pub const INVALID_RESOURCE_URI: i32 = -32006;
    pub const STORAGE_ERROR: i32 = -32010;
    pub const INTERNAL_ERROR: i32 = -32011;
}

/// Valid values for the `type` field of a contribution.
pub fn valid_contribution_types() -> Vec<String> {
    ContributionType::ALL.iter().map(|t| t.to_string()).collect()
}

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum McpError {
    #[error("Contributor not found: {id}")]
    ContributorNotFound { id: String },

    #[error("Contribution not found: {id}")]
    ContributionNotFound { id: String },

    #[error("Entity not found: {id}")]
    EntityNotFound { id: String },

    #[error("Invalid contribution type '{provided}'. Valid types: {}", valid.join(", "))]
    ContributionTypeInvalid { provided: String, valid: Vec<String> },

    #[error("Validation failed: {}", reasons.join("; "))]
    ValidationFailed { reasons: Vec<String> },

    #[error("Invalid date format for field '{field}': '{value}'. Expected YYYY-MM-DD")]
    InvalidDateFormat { field: String, value: String },

    #[error("Contributor {id} is deleted; restore it before adding contributions")]
    ContributorDeleted { id: String },

    #[error("Resource not found: {uri}")]
    ResourceNotFound { uri: String },

    #[error("Invalid resource URI: {uri}")]
    InvalidResourceUri { uri: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Get the JSON-RPC error code for this error type.
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::ContributorNotFound { .. }
            | McpError::ContributionNotFound { .. }
            | McpError::EntityNotFound { .. } => error_codes::ENTITY_NOT_FOUND,
            McpError::ContributionTypeInvalid { .. } => error_codes::CONTRIBUTION_TYPE_INVALID,
            McpError::ValidationFailed { .. } | McpError::InvalidDateFormat { .. } => {
                error_codes::VALIDATION_FAILED
            }
            McpError::ContributorDeleted { .. } => error_codes::CONTRIBUTOR_DELETED,
            McpError::ResourceNotFound { .. } => error_codes::RESOURCE_NOT_FOUND,
            McpError::InvalidResourceUri { .. } => error_codes::INVALID_RESOURCE_URI,
            McpError::StorageError { .. } => error_codes::STORAGE_ERROR,
            McpError::InternalError { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// Get the error type name for the data payload.
    pub fn error_type(&self) -> &'static str {
        match self {
            McpError::ContributorNotFound { .. } => "ContributorNotFound",
            McpError::ContributionNotFound { .. } => "ContributionNotFound",
            McpError::EntityNotFound { .. } => "EntityNotFound",
            McpError::ContributionTypeInvalid { .. } => "ContributionTypeInvalid",
            McpError::ValidationFailed { .. } => "ValidationFailed",
            McpError::InvalidDateFormat { .. } => "InvalidDateFormat",
            McpError::ContributorDeleted { .. } => "ContributorDeleted",
            McpError::ResourceNotFound { .. } => "ResourceNotFound",
            McpError::InvalidResourceUri { .. } => "InvalidResourceUri",
            McpError::StorageError { .. } => "StorageError",
            McpError::InternalError { .. } => "InternalError",
        }
    }

    /// Convert to rmcp ErrorData for JSON-RPC response.
    pub fn to_rmcp_error(&self) -> RmcpError {
        RmcpError {
            code: ErrorCode(self.error_code()),
            message: self.to_string().into(),
            data: Some(json!({
                "error_type": self.error_type(),
                "details": self.clone()
            })),
        }
    }
}

impl From<McpError> for RmcpError {
    fn from(err: McpError) -> Self {
        err.to_rmcp_error()
    }
}

impl From<SlicePieError> for McpError {
    fn from(err: SlicePieError) -> Self {
        match err {
            SlicePieError::NotInitialized => McpError::StorageError {
                message: "Not in a slicepie project. Run 'slicepie init' first.".to_string(),
            },
            SlicePieError::AlreadyInitialized => McpError::StorageError {
                message: "Already initialized".to_string(),
            },
            SlicePieError::ContributorNotFound(id) => McpError::ContributorNotFound { id },
            SlicePieError::ContributionNotFound(id) => McpError::ContributionNotFound { id },
            SlicePieError::EntityNotFound(id) => McpError::EntityNotFound { id },
            SlicePieError::Validation(reasons) => McpError::ValidationFailed { reasons },
            SlicePieError::Storage(message) => McpError::StorageError { message },
            SlicePieError::Io(e) => McpError::StorageError {
                message: format!("IO error: {}", e),
            },
            SlicePieError::Loro(e) => McpError::StorageError {
                message: format!("Loro error: {}", e),
            },
            SlicePieError::LoroEncode(e) => McpError::StorageError {
                message: format!("Loro encode error: {}", e),
            },
            SlicePieError::Json(e) => McpError::InternalError {
                message: format!("JSON error: {}", e),
            },
            SlicePieError::Yaml(e) => McpError::InternalError {
                message: format!("YAML error: {}", e),
            },
            SlicePieError::Server(message) => McpError::InternalError { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            McpError::ContributorNotFound { id: "7".into() }.error_code(),
            error_codes::ENTITY_NOT_FOUND
        );
        assert_eq!(
            McpError::ValidationFailed {
                reasons: vec!["value must be positive".into()]
            }
            .error_code(),
            error_codes::VALIDATION_FAILED
        );
        assert_eq!(
            McpError::InvalidDateFormat {
                field: "date".into(),
                value: "yesterday".into()
            }
            .error_code(),
            error_codes::VALIDATION_FAILED
        );
        assert_eq!(
            McpError::ContributorDeleted { id: "1".into() }.error_code(),
            error_codes::CONTRIBUTOR_DELETED
        );
        assert_eq!(
            McpError::InvalidResourceUri { uri: "x://y".into() }.error_code(),
            error_codes::INVALID_RESOURCE_URI
        );
    }

    #[test]
    fn test_from_slicepie_error() {
        let err: McpError = SlicePieError::ContributionNotFound("abcd".into()).into();
        assert!(matches!(err, McpError::ContributionNotFound { id } if id == "abcd"));

        let err: McpError =
            SlicePieError::Validation(vec!["a".into(), "b".into()]).into();
        assert_eq!(err.to_string(), "Validation failed: a; b");

        let err: McpError = SlicePieError::NotInitialized.into();
        assert_eq!(err.error_code(), error_codes::STORAGE_ERROR);
    }

    #[test]
    fn test_to_rmcp_error() {
        let err = McpError::ContributionTypeInvalid {
            provided: "labour".into(),
            valid: valid_contribution_types(),
        };
        let rmcp_err = err.to_rmcp_error();
        assert_eq!(rmcp_err.code.0, error_codes::CONTRIBUTION_TYPE_INVALID);
        assert!(rmcp_err.message.contains("non-cash"));
        let data = rmcp_err.data.unwrap();
        assert_eq!(data["error_type"], "ContributionTypeInvalid");
    }
}
