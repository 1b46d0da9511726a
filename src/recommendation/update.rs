//! Update sources for the `update` lifecycle operation

#[cfg(test)]
use mockall::automock;
use serde::Deserialize;

use crate::recommendation::error::UpdateSourceError;
use crate::recommendation::semver::{
    calculate_latest_major, calculate_latest_minor, calculate_latest_patch,
};
use crate::source::types::ArtifactKey;

/// Which newer versions an update may move to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Any newer version
    Major,
    /// Newer versions within the same major version
    #[default]
    Minor,
    /// Newer versions within the same major.minor version
    Patch,
}

impl UpdatePolicy {
    /// Version to move to from `current`, or None to keep it
    pub fn select(&self, current: &str, available: &[String]) -> Option<String> {
        match self {
            UpdatePolicy::Major => calculate_latest_major(current, available),
            UpdatePolicy::Minor => calculate_latest_minor(current, available),
            UpdatePolicy::Patch => calculate_latest_patch(current, available),
        }
    }
}

/// Trait for fetching the versions available for an artifact
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait UpdateSource: Send + Sync {
    /// Human readable location of the update source
    fn location(&self) -> String;

    /// Fetches all versions published for an artifact
    ///
    /// # Returns
    /// * `Ok(versions)` - Known versions in any order, empty if the artifact is unknown
    /// * `Err(UpdateSourceError)` - If the source cannot be reached or read
    async fn fetch_versions(&self, key: &ArtifactKey) -> Result<Vec<String>, UpdateSourceError>;
}

/// An update source paired with the policy applied to its versions
pub struct Updater {
    source: Box<dyn UpdateSource>,
    policy: UpdatePolicy,
}

impl Updater {
    pub fn new(source: Box<dyn UpdateSource>, policy: UpdatePolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.policy
    }

    pub fn location(&self) -> String {
        self.source.location()
    }

    /// Newest allowed version for `key`, or `current` when there is none
    pub async fn updated_version(
        &self,
        key: &ArtifactKey,
        current: &str,
    ) -> Result<String, UpdateSourceError> {
        // Group wildcards have no published versions of their own
        if key.is_wildcard() {
            return Ok(current.to_string());
        }

        let available = self.source.fetch_versions(key).await?;
        Ok(self
            .policy
            .select(current, &available)
            .unwrap_or_else(|| current.to_string()))
    }
}
