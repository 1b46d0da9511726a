//! Override lifecycle of an adaptable provider
//!
//! ```text
//!          setLocal | setSnapshot | set | update
//!   Base ───────────────────────────────────────▶ Local | Snapshot | Set | Updated
//!    ▲                                                       │
//!    └─────────────────────── reset ─────────────────────────┘
//! ```
//!
//! `store` persists the pending override and keeps the state.
//! Entering any override state replaces whatever was pending before.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::recommendation::error::{LifecycleError, StoreError, UpdateSourceError};
use crate::recommendation::semver::{is_valid_version, with_qualifier};
use crate::recommendation::store::OverrideStore;
use crate::recommendation::update::Updater;
use crate::source::types::{ArtifactKey, Recommendations, lookup_in};

/// Default marker for locally built versions
pub const DEFAULT_LOCAL_QUALIFIER: &str = "LOCAL";

/// Default marker for snapshot versions
pub const DEFAULT_SNAPSHOT_QUALIFIER: &str = "SNAPSHOT";

/// Override state of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideState {
    /// No override, reads flow to the base recommendations
    Base,
    /// Base versions marked as locally built
    Local,
    /// Base versions marked as snapshots
    Snapshot,
    /// Explicit version set by the operator
    Set,
    /// Versions pulled from the update source
    Updated,
}

impl OverrideState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideState::Base => "base",
            OverrideState::Local => "local",
            OverrideState::Snapshot => "snapshot",
            OverrideState::Set => "set",
            OverrideState::Updated => "updated",
        }
    }
}

impl fmt::Display for OverrideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations of the override lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleCommand {
    Local,
    Snapshot,
    Set(String),
    Update,
    Store,
    Reset,
}

impl LifecycleCommand {
    /// Operation name as exposed to users
    pub fn op_name(&self) -> &'static str {
        match self {
            LifecycleCommand::Local => "setLocal",
            LifecycleCommand::Snapshot => "setSnapshot",
            LifecycleCommand::Set(_) => "set",
            LifecycleCommand::Update => "update",
            LifecycleCommand::Store => "store",
            LifecycleCommand::Reset => "reset",
        }
    }

    /// Whether the command computes a new pending override
    pub fn produces_override(&self) -> bool {
        matches!(
            self,
            LifecycleCommand::Local
                | LifecycleCommand::Snapshot
                | LifecycleCommand::Set(_)
                | LifecycleCommand::Update
        )
    }
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleCommand::Set(value) => write!(f, "set({})", value),
            other => f.write_str(other.op_name()),
        }
    }
}

/// Markers applied by `setLocal` and `setSnapshot`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifiers {
    pub local: String,
    pub snapshot: String,
}

impl Qualifiers {
    fn apply(&self, version: &str, qualifier: &str) -> String {
        with_qualifier(
            version,
            qualifier,
            &[self.local.as_str(), self.snapshot.as_str()],
        )
    }
}

impl Default for Qualifiers {
    fn default() -> Self {
        Self {
            local: DEFAULT_LOCAL_QUALIFIER.to_string(),
            snapshot: DEFAULT_SNAPSHOT_QUALIFIER.to_string(),
        }
    }
}

/// Result of a successful lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOutcome {
    /// State after the operation
    pub state: OverrideState,
    /// Number of entries pending, stored or discarded
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingOverride {
    state: OverrideState,
    values: Recommendations,
}

/// Override state machine of one adaptable provider
pub struct LifecycleController {
    store: OverrideStore,
    /// Overrides persisted by earlier sessions, read once at initialization
    persisted: Recommendations,
    pending: Option<PendingOverride>,
    qualifiers: Qualifiers,
    updater: Option<Updater>,
}

impl LifecycleController {
    /// Create a controller, seeding the persisted layer from `store`
    pub fn open(
        store: OverrideStore,
        qualifiers: Qualifiers,
        updater: Option<Updater>,
    ) -> Result<Self, StoreError> {
        let persisted = store.read()?;
        if !persisted.is_empty() {
            info!(
                "Loaded {} persisted overrides from {:?}",
                persisted.len(),
                store.path()
            );
        }

        Ok(Self {
            store,
            persisted,
            pending: None,
            qualifiers,
            updater,
        })
    }

    pub fn state(&self) -> OverrideState {
        self.pending
            .as_ref()
            .map(|p| p.state)
            .unwrap_or(OverrideState::Base)
    }

    pub fn pending(&self) -> Option<&Recommendations> {
        self.pending.as_ref().map(|p| &p.values)
    }

    pub fn persisted(&self) -> &Recommendations {
        &self.persisted
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    pub fn qualifiers(&self) -> &Qualifiers {
        &self.qualifiers
    }

    /// Pending override for `key`, if any
    pub fn pending_version(&self, key: &ArtifactKey) -> Option<&str> {
        self.pending().and_then(|values| lookup_in(values, key))
    }

    /// Persisted override for `key`, if any
    pub fn persisted_version(&self, key: &ArtifactKey) -> Option<&str> {
        lookup_in(&self.persisted, key)
    }

    fn enter(&mut self, state: OverrideState, values: Recommendations) -> LifecycleOutcome {
        let previous = self.state();
        let entries = values.len();
        self.pending = Some(PendingOverride { state, values });

        info!(
            "Override state {} -> {} ({} entries)",
            previous, state, entries
        );
        LifecycleOutcome { state, entries }
    }

    /// Mark every base version as locally built
    pub fn set_local(&mut self, base: &Recommendations) -> LifecycleOutcome {
        let values = base
            .iter()
            .map(|(key, version)| {
                (
                    key.clone(),
                    self.qualifiers.apply(version, &self.qualifiers.local),
                )
            })
            .collect();
        self.enter(OverrideState::Local, values)
    }

    /// Mark every base version as a snapshot
    pub fn set_snapshot(&mut self, base: &Recommendations) -> LifecycleOutcome {
        let values = base
            .iter()
            .map(|(key, version)| {
                (
                    key.clone(),
                    self.qualifiers.apply(version, &self.qualifiers.snapshot),
                )
            })
            .collect();
        self.enter(OverrideState::Snapshot, values)
    }

    /// Override every base version with `value`
    pub fn set_version(
        &mut self,
        base: &Recommendations,
        value: &str,
    ) -> Result<LifecycleOutcome, LifecycleError> {
        if !is_valid_version(value) {
            warn!("Rejecting invalid version '{}'", value);
            return Err(LifecycleError::InvalidVersion(value.to_string()));
        }

        let values = base
            .keys()
            .map(|key| (key.clone(), value.to_string()))
            .collect();
        Ok(self.enter(OverrideState::Set, values))
    }

    /// Replace every base version with the newest one the update source allows
    ///
    /// All-or-nothing: on any failure the previous state is kept.
    pub async fn update(
        &mut self,
        base: &Recommendations,
    ) -> Result<LifecycleOutcome, LifecycleError> {
        let updater = self
            .updater
            .as_ref()
            .ok_or(UpdateSourceError::NotConfigured)?;

        let mut values = Recommendations::new();
        for (key, current) in base {
            let updated = updater.updated_version(key, current).await?;
            if updated != *current {
                debug!("Update {} {} -> {}", key, current, updated);
            }
            values.insert(key.clone(), updated);
        }

        Ok(self.enter(OverrideState::Updated, values))
    }

    /// Persist the pending override, keeping the current state
    pub fn store(&self) -> Result<LifecycleOutcome, LifecycleError> {
        let pending = self.pending.as_ref().ok_or(LifecycleError::NoPendingValue)?;
        self.store.write(&pending.values)?;

        Ok(LifecycleOutcome {
            state: pending.state,
            entries: pending.values.len(),
        })
    }

    /// Discard the pending override; the store is left untouched
    pub fn reset(&mut self) -> LifecycleOutcome {
        let discarded = self.pending.take().map(|p| p.values.len()).unwrap_or(0);
        if discarded > 0 {
            info!("Override reset, {} pending entries discarded", discarded);
        }

        LifecycleOutcome {
            state: OverrideState::Base,
            entries: discarded,
        }
    }

    /// Dispatch a lifecycle command
    pub async fn apply(
        &mut self,
        base: &Recommendations,
        command: &LifecycleCommand,
    ) -> Result<LifecycleOutcome, LifecycleError> {
        match command {
            LifecycleCommand::Local => Ok(self.set_local(base)),
            LifecycleCommand::Snapshot => Ok(self.set_snapshot(base)),
            LifecycleCommand::Set(value) => self.set_version(base, value),
            LifecycleCommand::Update => self.update(base).await,
            LifecycleCommand::Store => self.store(),
            LifecycleCommand::Reset => Ok(self.reset()),
        }
    }
}
