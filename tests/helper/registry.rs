//! Provider and update source test utilities

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use version_recommender::recommendation::error::UpdateSourceError;
use version_recommender::recommendation::lifecycle::{LifecycleController, Qualifiers};
use version_recommender::recommendation::provider::Provider;
use version_recommender::recommendation::registry::ProviderRegistry;
use version_recommender::recommendation::store::OverrideStore;
use version_recommender::recommendation::update::{UpdateSource, Updater};
use version_recommender::source::{
    ArtifactKey, PropertiesSource, RecommendationSource, Recommendations, SourceError, SourceKind,
};

/// Update source answering from a fixed version list
pub struct StubUpdateSource {
    versions: HashMap<String, Vec<String>>,
}

impl StubUpdateSource {
    pub fn new() -> Self {
        Self {
            versions: HashMap::new(),
        }
    }

    pub fn with_versions(mut self, artifact: &str, versions: Vec<&str>) -> Self {
        self.versions.insert(
            artifact.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl UpdateSource for StubUpdateSource {
    fn location(&self) -> String {
        "stub".to_string()
    }

    async fn fetch_versions(&self, key: &ArtifactKey) -> Result<Vec<String>, UpdateSourceError> {
        Ok(self.versions.get(&key.to_string()).cloned().unwrap_or_default())
    }
}

/// Update source that can never be reached
pub struct OfflineUpdateSource;

#[async_trait]
impl UpdateSource for OfflineUpdateSource {
    fn location(&self) -> String {
        "offline".to_string()
    }

    async fn fetch_versions(&self, _key: &ArtifactKey) -> Result<Vec<String>, UpdateSourceError> {
        Err(UpdateSourceError::InvalidResponse(
            "connection refused".to_string(),
        ))
    }
}

/// Recommendation source whose every lookup fails
pub struct FailingSource;

impl RecommendationSource for FailingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Bom
    }

    fn origin(&self) -> String {
        "broken.xml".to_string()
    }

    fn recommendations(&self) -> Result<&Recommendations, SourceError> {
        Err(SourceError::InvalidSyntax {
            origin: self.origin(),
            line: 1,
            message: "unexpected end of document".to_string(),
        })
    }
}

/// Inline properties source from `group:name` and version pairs
pub fn inline_source(entries: &[(&str, &str)]) -> Box<PropertiesSource> {
    let recommendations = entries
        .iter()
        .map(|(key, version)| (key.parse::<ArtifactKey>().unwrap(), version.to_string()))
        .collect();
    Box::new(PropertiesSource::inline(recommendations))
}

/// Adaptable provider storing its overrides in `store_dir/{name}.version`
pub fn adaptable_provider(
    name: &str,
    entries: &[(&str, &str)],
    store_dir: &Path,
    updater: Option<Updater>,
) -> Provider {
    let store = OverrideStore::new(store_dir.join(format!("{}.version", name)));
    let controller = LifecycleController::open(store, Qualifiers::default(), updater).unwrap();
    Provider::adaptable(name, inline_source(entries), controller)
}

pub fn registry_of(providers: Vec<Provider>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.add(provider).unwrap();
    }
    registry
}

/// Write `content` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
