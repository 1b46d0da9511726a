//! Named, ordered source of version recommendations

use std::path::Path;

use crate::recommendation::error::LifecycleError;
use crate::recommendation::lifecycle::{
    LifecycleCommand, LifecycleController, LifecycleOutcome, OverrideState,
};
use crate::source::traits::{RecommendationSource, SourceError};
use crate::source::types::{ArtifactKey, Recommendations, SourceKind};

/// A recommendation source registered under a unique name
///
/// Adaptable providers carry a [`LifecycleController`]; lookups consult its
/// pending override first, then the persisted overrides, then the source.
pub struct Provider {
    name: String,
    source: Box<dyn RecommendationSource>,
    controller: Option<LifecycleController>,
}

impl Provider {
    /// Provider without override support
    pub fn new(name: impl Into<String>, source: Box<dyn RecommendationSource>) -> Self {
        Self {
            name: name.into(),
            source,
            controller: None,
        }
    }

    /// Provider supporting the override lifecycle
    pub fn adaptable(
        name: impl Into<String>,
        source: Box<dyn RecommendationSource>,
        controller: LifecycleController,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            controller: Some(controller),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn origin(&self) -> String {
        self.source.origin()
    }

    pub fn is_adaptable(&self) -> bool {
        self.controller.is_some()
    }

    pub fn controller(&self) -> Option<&LifecycleController> {
        self.controller.as_ref()
    }

    /// Override store location of an adaptable provider
    pub fn override_file_path(&self) -> Option<&Path> {
        self.controller.as_ref().map(|c| c.store_path())
    }

    /// Current override state; always `Base` for non-adaptable providers
    pub fn state(&self) -> OverrideState {
        self.controller
            .as_ref()
            .map(|c| c.state())
            .unwrap_or(OverrideState::Base)
    }

    /// Task name of a lifecycle operation, e.g. `updatePlatform`
    pub fn task_name(&self, op_name: &str) -> String {
        let mut chars = self.name.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("{}{}", op_name, capitalized)
    }

    /// Recommendation without the pending override
    pub fn base_recommendation(&self, key: &ArtifactKey) -> Result<Option<String>, SourceError> {
        if let Some(version) = self.controller.as_ref().and_then(|c| c.persisted_version(key)) {
            return Ok(Some(version.to_string()));
        }
        self.source.lookup(key)
    }

    /// All recommendations without the pending override
    ///
    /// Every entry agrees with [`Provider::base_recommendation`], so a
    /// persisted `group:*` override also replaces exact source entries of
    /// that group.
    pub fn base_recommendations(&self) -> Result<Recommendations, SourceError> {
        let Some(controller) = &self.controller else {
            return Ok(self.source.recommendations()?.clone());
        };

        let mut recommendations: Recommendations = self
            .source
            .recommendations()?
            .iter()
            .map(|(key, version)| {
                let version = controller.persisted_version(key).unwrap_or(version.as_str());
                (key.clone(), version.to_string())
            })
            .collect();
        recommendations.extend(
            controller
                .persisted()
                .iter()
                .map(|(key, version)| (key.clone(), version.clone())),
        );
        Ok(recommendations)
    }

    /// Recommended version for `key`, honoring the current override
    pub fn lookup(&self, key: &ArtifactKey) -> Result<Option<String>, SourceError> {
        if let Some(version) = self.controller.as_ref().and_then(|c| c.pending_version(key)) {
            return Ok(Some(version.to_string()));
        }
        self.base_recommendation(key)
    }

    /// Run a lifecycle command against this provider
    pub async fn apply(
        &mut self,
        command: &LifecycleCommand,
    ) -> Result<LifecycleOutcome, LifecycleError> {
        if !self.is_adaptable() {
            return Err(LifecycleError::NotAdaptable(self.name.clone()));
        }

        // Store and reset work on the pending override only
        let base = if command.produces_override() {
            self.base_recommendations()?
        } else {
            Recommendations::new()
        };

        let Some(controller) = self.controller.as_mut() else {
            return Err(LifecycleError::NotAdaptable(self.name.clone()));
        };
        controller.apply(&base, command).await
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("adaptable", &self.is_adaptable())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::lifecycle::Qualifiers;
    use crate::recommendation::store::OverrideStore;
    use crate::source::properties::PropertiesSource;
    use tempfile::TempDir;

    fn source() -> Box<dyn RecommendationSource> {
        Box::new(PropertiesSource::inline(Recommendations::from([
            (ArtifactKey::new("com.example", "core"), "1.0".to_string()),
            (ArtifactKey::new("com.example", "web"), "1.0".to_string()),
        ])))
    }

    fn adaptable(temp_dir: &TempDir) -> Provider {
        let store = OverrideStore::new(temp_dir.path().join("platform.version"));
        let controller = LifecycleController::open(store, Qualifiers::default(), None).unwrap();
        Provider::adaptable("platform", source(), controller)
    }

    #[test]
    fn task_name_capitalizes_provider_name() {
        let provider = Provider::new("platform", source());

        assert_eq!(provider.task_name("setLocal"), "setLocalPlatform");
        assert_eq!(provider.task_name("update"), "updatePlatform");
    }

    #[tokio::test]
    async fn non_adaptable_provider_rejects_lifecycle_commands() {
        let mut provider = Provider::new("static", source());

        let result = provider.apply(&LifecycleCommand::Local).await;

        assert!(matches!(result, Err(LifecycleError::NotAdaptable(name)) if name == "static"));
        assert_eq!(provider.state(), OverrideState::Base);
        assert_eq!(provider.override_file_path(), None);
    }

    #[tokio::test]
    async fn lookup_prefers_pending_override() {
        let temp_dir = TempDir::new().unwrap();
        let mut provider = adaptable(&temp_dir);
        let key = ArtifactKey::new("com.example", "core");

        provider
            .apply(&LifecycleCommand::Set("2.0-rc1".to_string()))
            .await
            .unwrap();

        assert_eq!(provider.lookup(&key).unwrap(), Some("2.0-rc1".to_string()));
        assert_eq!(
            provider.base_recommendation(&key).unwrap(),
            Some("1.0".to_string())
        );
    }

    #[test]
    fn persisted_overrides_shadow_source_in_base_layer() {
        let temp_dir = TempDir::new().unwrap();
        OverrideStore::new(temp_dir.path().join("platform.version"))
            .write(&Recommendations::from([(
                ArtifactKey::new("com.example", "web"),
                "1.7".to_string(),
            )]))
            .unwrap();

        let provider = adaptable(&temp_dir);

        assert_eq!(
            provider
                .lookup(&ArtifactKey::new("com.example", "web"))
                .unwrap(),
            Some("1.7".to_string())
        );
        assert_eq!(
            provider
                .lookup(&ArtifactKey::new("com.example", "core"))
                .unwrap(),
            Some("1.0".to_string())
        );
        assert_eq!(provider.base_recommendations().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn set_local_derives_from_persisted_base() {
        let temp_dir = TempDir::new().unwrap();
        OverrideStore::new(temp_dir.path().join("platform.version"))
            .write(&Recommendations::from([(
                ArtifactKey::new("com.example", "web"),
                "1.7".to_string(),
            )]))
            .unwrap();
        let mut provider = adaptable(&temp_dir);

        provider.apply(&LifecycleCommand::Local).await.unwrap();

        assert_eq!(
            provider
                .lookup(&ArtifactKey::new("com.example", "web"))
                .unwrap(),
            Some("1.7-LOCAL".to_string())
        );
    }

    #[tokio::test]
    async fn set_local_uses_persisted_wildcard_over_exact_source_entry() {
        let temp_dir = TempDir::new().unwrap();
        OverrideStore::new(temp_dir.path().join("platform.version"))
            .write(&Recommendations::from([(
                ArtifactKey::wildcard("com.example"),
                "1.5".to_string(),
            )]))
            .unwrap();
        let store = OverrideStore::new(temp_dir.path().join("platform.version"));
        let controller = LifecycleController::open(store, Qualifiers::default(), None).unwrap();
        let source = Box::new(PropertiesSource::inline(Recommendations::from([
            (ArtifactKey::wildcard("com.example"), "1.0".to_string()),
            (ArtifactKey::new("com.example", "core"), "2.0".to_string()),
        ])));
        let mut provider = Provider::adaptable("platform", source, controller);
        let core = ArtifactKey::new("com.example", "core");

        assert_eq!(
            provider.base_recommendation(&core).unwrap(),
            Some("1.5".to_string())
        );
        assert_eq!(
            provider.base_recommendations().unwrap().get(&core),
            Some(&"1.5".to_string())
        );

        provider.apply(&LifecycleCommand::Local).await.unwrap();

        assert_eq!(provider.lookup(&core).unwrap(), Some("1.5-LOCAL".to_string()));
        assert_eq!(
            provider
                .lookup(&ArtifactKey::new("com.example", "web"))
                .unwrap(),
            Some("1.5-LOCAL".to_string())
        );
    }
}
