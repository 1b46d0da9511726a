use std::path::PathBuf;

use thiserror::Error;

use crate::source::traits::SourceError;
use crate::source::types::ArtifactKey;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Provider '{0}' is already registered")]
    DuplicateName(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access override store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to store '{version}' for {key} in {}", path.display())]
    InvalidEntry {
        path: PathBuf,
        key: ArtifactKey,
        version: String,
    },

    #[error("Override store {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: SourceError,
    },
}

#[derive(Debug, Error)]
pub enum UpdateSourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to read update source: {0}")]
    Unreadable(#[from] SourceError),

    #[error("No update source configured")]
    NotConfigured,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Provider '{0}' is not adaptable")]
    NotAdaptable(String),

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Update source unavailable: {0}")]
    UpdateSourceUnavailable(#[from] UpdateSourceError),

    #[error("Nothing to store: no pending override")]
    NoPendingValue,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Base recommendations unavailable: {0}")]
    Source(#[from] SourceError),
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Provider '{0}' is not adaptable")]
    NotAdaptable(String),

    #[error("Operation '{0}' needs a version value")]
    MissingValue(String),

    #[error("Ordering constraint refers to operation '{0}' that was not requested")]
    NotRequested(String),

    #[error("Conflicting ordering between operations: {}", .0.join(", "))]
    OrderingConflict(Vec<String>),
}
