//! Ordered, name-unique collection of providers

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::recommendation::error::RegistryError;
use crate::recommendation::provider::Provider;

/// Adaptable providers known to the aggregate operations
///
/// Maps provider name to its override store, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateRecord {
    store_paths: IndexMap<String, PathBuf>,
}

impl AggregateRecord {
    fn register(&mut self, name: &str, store_path: &Path) {
        self.store_paths
            .insert(name.to_string(), store_path.to_path_buf());
    }

    /// Names of the adaptable providers, in registration order
    pub fn members(&self) -> Vec<String> {
        self.store_paths.keys().cloned().collect()
    }

    pub fn store_path(&self, name: &str) -> Option<&Path> {
        self.store_paths.get(name).map(PathBuf::as_path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store_paths.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.store_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store_paths.is_empty()
    }
}

/// Providers in registration order; the order is the fallback precedence
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Provider>,
    aggregate: AggregateRecord,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider; fails without changes if the name is taken
    pub fn add(&mut self, provider: Provider) -> Result<(), RegistryError> {
        if self.providers.contains_key(provider.name()) {
            return Err(RegistryError::DuplicateName(provider.name().to_string()));
        }

        if let Some(store_path) = provider.override_file_path() {
            self.aggregate.register(provider.name(), store_path);
            debug!(
                "Provider '{}' joins aggregate operations with store {:?}",
                provider.name(),
                store_path
            );
        }

        info!(
            "Registered {} provider '{}' at position {}",
            provider.kind().as_str(),
            provider.name(),
            self.providers.len()
        );
        self.providers.insert(provider.name().to_string(), provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Provider> {
        self.providers.get_mut(name)
    }

    /// Providers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn aggregate(&self) -> &AggregateRecord {
        &self.aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::lifecycle::{LifecycleController, Qualifiers};
    use crate::recommendation::store::OverrideStore;
    use crate::source::properties::PropertiesSource;
    use crate::source::types::Recommendations;
    use tempfile::TempDir;

    fn plain(name: &str) -> Provider {
        Provider::new(name, Box::new(PropertiesSource::inline(Recommendations::new())))
    }

    fn adaptable(name: &str, temp_dir: &TempDir) -> Provider {
        let store = OverrideStore::new(temp_dir.path().join(format!("{}.version", name)));
        let controller = LifecycleController::open(store, Qualifiers::default(), None).unwrap();
        Provider::adaptable(
            name,
            Box::new(PropertiesSource::inline(Recommendations::new())),
            controller,
        )
    }

    #[test]
    fn add_preserves_registration_order() {
        let mut registry = ProviderRegistry::new();
        registry.add(plain("c")).unwrap();
        registry.add(plain("a")).unwrap();
        registry.add(plain("b")).unwrap();

        assert_eq!(registry.names(), vec!["c", "a", "b"]);
        assert_eq!(
            registry.iter().map(Provider::name).collect::<Vec<_>>(),
            vec!["c", "a", "b"]
        );
    }

    #[test]
    fn add_rejects_duplicate_name_and_leaves_registry_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = ProviderRegistry::new();
        registry.add(plain("platform")).unwrap();
        registry.add(plain("other")).unwrap();

        let result = registry.add(adaptable("platform", &temp_dir));

        assert!(matches!(result, Err(RegistryError::DuplicateName(name)) if name == "platform"));
        assert_eq!(registry.names(), vec!["platform", "other"]);
        assert!(!registry.get("platform").unwrap().is_adaptable());
        assert!(registry.aggregate().is_empty());
    }

    #[test]
    fn add_registers_only_adaptable_providers_for_aggregates() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = ProviderRegistry::new();
        registry.add(adaptable("platform", &temp_dir)).unwrap();
        registry.add(plain("static")).unwrap();
        registry.add(adaptable("tools", &temp_dir)).unwrap();

        assert_eq!(registry.aggregate().members(), vec!["platform", "tools"]);
        assert_eq!(
            registry.aggregate().store_path("tools"),
            Some(temp_dir.path().join("tools.version").as_path())
        );
        assert!(!registry.aggregate().contains("static"));
    }

    #[test]
    fn get_returns_none_for_unknown_name() {
        let registry = ProviderRegistry::new();

        assert!(registry.get("missing").is_none());
    }
}
