//! Property file update source
//!
//! Lists the versions available per artifact, for offline updates:
//! ```text
//! org.slf4j:slf4j-api = 2.0.12, 2.0.13
//! ```

use std::path::PathBuf;

use async_trait::async_trait;

use crate::recommendation::error::UpdateSourceError;
use crate::recommendation::update::UpdateSource;
use crate::source::properties::parse_pairs;
use crate::source::traits::SourceError;
use crate::source::types::ArtifactKey;

/// Update source reading available versions from a property file
pub struct PropertiesUpdateSource {
    path: PathBuf,
}

impl PropertiesUpdateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UpdateSource for PropertiesUpdateSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_versions(&self, key: &ArtifactKey) -> Result<Vec<String>, UpdateSourceError> {
        // Read on every fetch so edits between sessions are picked up
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let wanted = key.to_string();
        let versions = parse_pairs(&content, &self.location())?
            .into_iter()
            .filter(|(entry_key, _)| *entry_key == wanted)
            .flat_map(|(_, versions)| {
                versions
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(versions)
    }
}
