//! Recommendation source trait definition

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::source::types::{ArtifactKey, Recommendations, SourceKind, lookup_in};

/// Trait for sources of recommended versions
///
/// Implementations must be free of observable side effects: loading the
/// underlying file and caching the parsed result is allowed, anything else
/// is not.
pub trait RecommendationSource: Send + Sync {
    /// Returns the kind of source this implementation reads
    fn kind(&self) -> SourceKind;

    /// Human readable origin of the recommendations (usually a file path)
    fn origin(&self) -> String;

    /// All recommendations of this source
    fn recommendations(&self) -> Result<&Recommendations, SourceError>;

    /// Recommended version for a single artifact
    fn lookup(&self, key: &ArtifactKey) -> Result<Option<String>, SourceError> {
        Ok(lookup_in(self.recommendations()?, key).map(str::to_string))
    }
}

/// Error type for reading recommendation sources
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid syntax in the source
    #[error("Invalid syntax in {origin} at line {line}: {message}")]
    InvalidSyntax {
        origin: String,
        line: usize,
        message: String,
    },

    /// A `${property}` reference without a definition
    #[error("Unresolved property '${{{property}}}' in {origin}")]
    UnresolvedProperty { origin: String, property: String },
}

/// Loads a source once and keeps the successful result
///
/// Failed loads are not cached, so a later lookup retries.
#[derive(Debug, Default)]
pub struct LoadOnce {
    cell: OnceLock<Recommendations>,
}

impl LoadOnce {
    /// Already loaded recommendations
    pub fn loaded(recommendations: Recommendations) -> Self {
        Self {
            cell: OnceLock::from(recommendations),
        }
    }

    pub fn get_or_load(
        &self,
        load: impl FnOnce() -> Result<Recommendations, SourceError>,
    ) -> Result<&Recommendations, SourceError> {
        if let Some(recommendations) = self.cell.get() {
            return Ok(recommendations);
        }

        let recommendations = load()?;
        Ok(self.cell.get_or_init(|| recommendations))
    }
}

/// Read a source file into a string
pub fn read_source(path: &std::path::Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// 1-based line number of a byte offset in `content`
pub fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}
