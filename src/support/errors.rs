use thiserror::Error;

use crate::domain::SlotStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {collection} document {id}")]
    NotFound { collection: String, id: String },

    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("No candidates: {0}")]
    NoCandidates(String),

    #[error("Invalid {collection} document {id}: {reason}")]
    InvalidDocument {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Transition {from} -> {to} is not allowed")]
    InvalidTransition { from: SlotStatus, to: SlotStatus },

    #[error("Missing initial data: {0}")]
    MissingData(String),
}

impl DomainError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn invalid_document(
        collection: impl Into<String>,
        id: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidDocument {
            collection: collection.into(),
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
