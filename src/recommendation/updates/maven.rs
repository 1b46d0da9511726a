//! Maven repository update source
//!
//! Reads `maven-metadata.xml` of an artifact:
//! `{repository}/{group with dots as slashes}/{name}/maven-metadata.xml`

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::FETCH_TIMEOUT_MS;
use crate::recommendation::error::UpdateSourceError;
use crate::recommendation::update::UpdateSource;
use crate::source::types::ArtifactKey;

/// Default Maven repository
pub const DEFAULT_REPOSITORY_URL: &str = "https://repo.maven.apache.org/maven2";

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<version>\s*([^<]+?)\s*</version>").unwrap());

/// Update source backed by a Maven repository
pub struct MavenRepositoryUpdateSource {
    client: reqwest::Client,
    base_url: String,
}

impl MavenRepositoryUpdateSource {
    /// Creates a new source for the repository at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("version-recommender")
                .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn metadata_url(&self, key: &ArtifactKey) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.base_url,
            key.group.replace('.', "/"),
            key.name
        )
    }

    /// Versions listed in a metadata document, in document order
    fn parse_metadata(body: &str) -> Vec<String> {
        // Only the <versions> list counts; <version> elsewhere is the artifact's latest
        let versions_section = body
            .split_once("<versions>")
            .and_then(|(_, rest)| rest.split_once("</versions>"))
            .map(|(section, _)| section)
            .unwrap_or(body);

        VERSION_RE
            .captures_iter(versions_section)
            .map(|caps| caps.get(1).unwrap().as_str().to_string())
            .collect()
    }
}

impl Default for MavenRepositoryUpdateSource {
    fn default() -> Self {
        Self::new(DEFAULT_REPOSITORY_URL)
    }
}

#[async_trait]
impl UpdateSource for MavenRepositoryUpdateSource {
    fn location(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch_versions(&self, key: &ArtifactKey) -> Result<Vec<String>, UpdateSourceError> {
        let url = self.metadata_url(key);
        debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        // An artifact unknown to the repository has no newer version
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("No metadata for {} at {}", key, url);
            return Ok(Vec::new());
        }

        if !status.is_success() {
            warn!("Maven repository returned status {}: {}", status, url);
            return Err(UpdateSourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body = response.text().await?;
        Ok(Self::parse_metadata(&body))
    }
}
