//! Ordered fallback resolution across providers
//!
//! Providers are consulted in registration order and the first one with an
//! answer wins. A provider whose lookup fails is logged and skipped, so one
//! broken source never hides the recommendations of the others.

use thiserror::Error;
use tracing::{debug, error};

use crate::recommendation::registry::ProviderRegistry;
use crate::source::traits::SourceError;
use crate::source::types::ArtifactKey;

/// A provider lookup that failed and was treated as "not found"
#[derive(Debug, Error)]
#[error("Lookup failed for provider '{provider}': {error}")]
pub struct LookupFailure {
    pub provider: String,
    #[source]
    pub error: SourceError,
}

/// Outcome of a resolution, with the failures that were skipped on the way
#[derive(Debug, Default)]
pub struct Resolution {
    pub version: Option<String>,
    /// Name of the provider that answered
    pub provider: Option<String>,
    pub failures: Vec<LookupFailure>,
}

/// Recommended version for `key`, or `None` if no provider has one
pub fn resolve_version(registry: &ProviderRegistry, key: &ArtifactKey) -> Option<String> {
    resolve_detailed(registry, key).version
}

pub fn resolve_detailed(registry: &ProviderRegistry, key: &ArtifactKey) -> Resolution {
    let mut resolution = Resolution::default();

    for provider in registry.iter() {
        match provider.lookup(key) {
            Ok(Some(version)) => {
                debug!(
                    "Resolved {} to {} from provider '{}'",
                    key,
                    version,
                    provider.name()
                );
                resolution.version = Some(version);
                resolution.provider = Some(provider.name().to_string());
                return resolution;
            }
            Ok(None) => continue,
            Err(e) => {
                let failure = LookupFailure {
                    provider: provider.name().to_string(),
                    error: e,
                };
                error!("{}", failure);
                resolution.failures.push(failure);
            }
        }
    }

    debug!("No recommendation for {}", key);
    resolution
}
