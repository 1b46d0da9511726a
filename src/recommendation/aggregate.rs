//! Operations applied to every adaptable provider at once

use std::fmt;

use tracing::{info, warn};

use crate::recommendation::error::LifecycleError;
use crate::recommendation::lifecycle::{LifecycleCommand, LifecycleOutcome};
use crate::recommendation::registry::ProviderRegistry;

/// Aggregate operations over all adaptable providers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AggregateCommand {
    UpdateAll,
    SetAllVersion(String),
    StoreAll,
    ResetAll,
}

impl AggregateCommand {
    pub fn op_name(&self) -> &'static str {
        match self {
            AggregateCommand::UpdateAll => "updateAll",
            AggregateCommand::SetAllVersion(_) => "setAllVersion",
            AggregateCommand::StoreAll => "storeAll",
            AggregateCommand::ResetAll => "resetAll",
        }
    }

    /// Command run against each member
    pub fn member_command(&self) -> LifecycleCommand {
        match self {
            AggregateCommand::UpdateAll => LifecycleCommand::Update,
            AggregateCommand::SetAllVersion(value) => LifecycleCommand::Set(value.clone()),
            AggregateCommand::StoreAll => LifecycleCommand::Store,
            AggregateCommand::ResetAll => LifecycleCommand::Reset,
        }
    }
}

impl fmt::Display for AggregateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateCommand::SetAllVersion(value) => write!(f, "setAllVersion({})", value),
            other => f.write_str(other.op_name()),
        }
    }
}

/// Result of one member of an aggregate operation
#[derive(Debug)]
pub struct ProviderResult {
    pub provider: String,
    pub result: Result<LifecycleOutcome, LifecycleError>,
}

/// Per-provider results, in registration order
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub results: Vec<ProviderResult>,
}

impl AggregateReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &ProviderResult> {
        self.results.iter().filter(|r| r.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProviderResult> {
        self.results.iter().filter(|r| r.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.result.is_ok())
    }
}

/// Runs aggregate operations against a registry
///
/// A failing member is recorded and the remaining members still run.
pub struct AggregateCoordinator<'a> {
    registry: &'a mut ProviderRegistry,
}

impl<'a> AggregateCoordinator<'a> {
    pub fn new(registry: &'a mut ProviderRegistry) -> Self {
        Self { registry }
    }

    pub async fn update_all(&mut self) -> AggregateReport {
        self.run(&AggregateCommand::UpdateAll).await
    }

    pub async fn set_all_version(&mut self, value: &str) -> AggregateReport {
        self.run(&AggregateCommand::SetAllVersion(value.to_string()))
            .await
    }

    pub async fn store_all(&mut self) -> AggregateReport {
        self.run(&AggregateCommand::StoreAll).await
    }

    pub async fn reset_all(&mut self) -> AggregateReport {
        self.run(&AggregateCommand::ResetAll).await
    }

    pub async fn run(&mut self, command: &AggregateCommand) -> AggregateReport {
        let members = self.registry.aggregate().members();
        let member_command = command.member_command();
        info!("Running {} on {} providers", command, members.len());

        let mut report = AggregateReport::default();
        for name in members {
            let store_path = self.registry.aggregate().store_path(&name).map(|p| p.to_path_buf());
            let result = match self.registry.get_mut(&name) {
                Some(provider) => provider.apply(&member_command).await,
                None => Err(LifecycleError::NotAdaptable(name.clone())),
            };

            if let Err(e) = &result {
                warn!(
                    "{} failed for provider '{}' (store {:?}): {}",
                    command, name, store_path, e
                );
            }
            report.results.push(ProviderResult {
                provider: name,
                result,
            });
        }

        report
    }
}
