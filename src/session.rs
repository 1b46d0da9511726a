//! Builds the provider chain of a project from its configuration

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ProviderConfig, RecommenderConfig, UpdateConfig};
use crate::recommendation::error::{RegistryError, StoreError};
use crate::recommendation::lifecycle::{LifecycleController, Qualifiers};
use crate::recommendation::provider::Provider;
use crate::recommendation::registry::ProviderRegistry;
use crate::recommendation::store::OverrideStore;
use crate::recommendation::update::{UpdateSource, Updater};
use crate::recommendation::updates::{MavenRepositoryUpdateSource, PropertiesUpdateSource};
use crate::source::types::{ArtifactKey, InvalidArtifactKey, Recommendations, SourceKind};
use crate::source::{BomSource, ManifestSource, PropertiesSource, RecommendationSource};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Provider '{0}' has no source: set 'path' or, for properties, 'versions'")]
    MissingSource(String),

    #[error("Provider '{provider}': {source}")]
    InvalidKey {
        provider: String,
        #[source]
        source: InvalidArtifactKey,
    },
}

fn create_source(
    config: &ProviderConfig,
    project_dir: &Path,
) -> Result<Box<dyn RecommendationSource>, SessionError> {
    let path = config.path.as_ref().map(|p| project_dir.join(p));

    let source: Box<dyn RecommendationSource> = match (config.kind, path, &config.versions) {
        (SourceKind::Manifest, Some(path), _) => Box::new(ManifestSource::new(path)),
        (SourceKind::Bom, Some(path), _) => Box::new(BomSource::new(path)),
        (SourceKind::Properties, Some(path), _) => Box::new(PropertiesSource::from_path(path)),
        (SourceKind::Properties, None, Some(versions)) => {
            let recommendations = versions
                .iter()
                .map(|(key, version)| {
                    key.parse::<ArtifactKey>()
                        .map(|key| (key, version.clone()))
                        .map_err(|source| SessionError::InvalidKey {
                            provider: config.name.clone(),
                            source,
                        })
                })
                .collect::<Result<Recommendations, _>>()?;
            Box::new(PropertiesSource::inline(recommendations))
        }
        _ => return Err(SessionError::MissingSource(config.name.clone())),
    };

    Ok(source)
}

fn create_updater(config: &UpdateConfig, project_dir: &Path) -> Updater {
    let source: Box<dyn UpdateSource> = match (&config.repository, &config.file) {
        (Some(repository), file) => {
            if file.is_some() {
                warn!("Both repository and file configured for update, using repository");
            }
            Box::new(MavenRepositoryUpdateSource::new(repository))
        }
        (None, Some(file)) => Box::new(PropertiesUpdateSource::new(project_dir.join(file))),
        (None, None) => Box::new(MavenRepositoryUpdateSource::default()),
    };
    Updater::new(source, config.policy)
}

fn create_provider(
    config: &RecommenderConfig,
    provider: &ProviderConfig,
    project_dir: &Path,
) -> Result<Provider, SessionError> {
    let source = create_source(provider, project_dir)?;

    if !provider.adaptable {
        if provider.update.is_some() {
            warn!(
                "Provider '{}' is not adaptable, ignoring its update source",
                provider.name
            );
        }
        return Ok(Provider::new(&provider.name, source));
    }

    let mut qualifiers = Qualifiers::default();
    if let Some(local) = &provider.local_qualifier {
        qualifiers.local = local.clone();
    }
    if let Some(snapshot) = &provider.snapshot_qualifier {
        qualifiers.snapshot = snapshot.clone();
    }

    let updater = provider
        .update
        .as_ref()
        .map(|update| create_updater(update, project_dir));
    if let Some(updater) = &updater {
        debug!(
            "Provider '{}' updates from {} ({:?})",
            provider.name,
            updater.location(),
            updater.policy()
        );
    }

    let store = OverrideStore::new(config.store_path(project_dir, &provider.name));
    let controller = LifecycleController::open(store, qualifiers, updater)?;
    Ok(Provider::adaptable(&provider.name, source, controller))
}

/// Create the provider registry of a project, in configured order
pub fn build_registry(
    config: &RecommenderConfig,
    project_dir: &Path,
) -> Result<ProviderRegistry, SessionError> {
    let mut registry = ProviderRegistry::new();
    for provider in &config.providers {
        registry.add(create_provider(config, provider, project_dir)?)?;
    }
    Ok(registry)
}
