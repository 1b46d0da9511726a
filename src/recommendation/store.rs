//! Persisted version overrides of one provider

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::recommendation::error::StoreError;
use crate::source::properties::{format_recommendations, parse_recommendations};
use crate::source::types::Recommendations;

/// File-backed `group:name=version` mapping
///
/// Writes go to a temporary file in the same directory which then replaces
/// the store, so an interrupted write never leaves a partial store behind.
/// Only one session at a time may write a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideStore {
    path: PathBuf,
}

impl OverrideStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Read the persisted overrides; a store that was never written is empty
    pub fn read(&self) -> Result<Recommendations, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No override store at {:?}", self.path);
                return Ok(Recommendations::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        parse_recommendations(&content, &self.path.display().to_string()).map_err(|source| {
            StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Every version must read back unchanged from a property line
    fn check_entries(&self, entries: &Recommendations) -> Result<(), StoreError> {
        let unreadable = entries.iter().find(|(_, version)| {
            version.is_empty() || version.trim() != version.as_str() || version.contains(['\n', '\r'])
        });

        match unreadable {
            Some((key, version)) => Err(StoreError::InvalidEntry {
                path: self.path.clone(),
                key: key.clone(),
                version: version.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Replace the whole store with `entries`
    ///
    /// Nothing is written when an entry could not be read back.
    pub fn write(&self, entries: &Recommendations) -> Result<(), StoreError> {
        self.check_entries(entries)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let header = format!(
            "Version overrides written by version-recommender\n{}",
            chrono::Utc::now().to_rfc3339()
        );
        let content = format_recommendations(&header, entries);

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| self.io_error(e))?;
        temp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        info!("Stored {} overrides in {:?}", entries.len(), self.path);
        Ok(())
    }
}
