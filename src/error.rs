use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlicePieError {
    #[error("Not in a slicepie project. Run 'slicepie init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .slicepie/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Contributor not found: {0}")]
    ContributorNotFound(String),

    #[error("Contribution not found: {0}")]
    ContributionNotFound(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Invalid input: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Loro error: {0}")]
    Loro(#[from] loro::LoroError),

    #[error("Loro encode error: {0}")]
    LoroEncode(#[from] loro::LoroEncodeError),
}

impl SlicePieError {
    /// Shorthand for a single-reason validation failure.
    pub fn invalid(reason: impl Into<String>) -> Self {
        SlicePieError::Validation(vec![reason.into()])
    }
}

pub type Result<T> = std::result::Result<T, SlicePieError>;
