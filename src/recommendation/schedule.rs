//! Ordering and execution of requested lifecycle operations
//!
//! Requested operations form the nodes of a DAG. Edges come from the built-in
//! must-run-after rules and from explicit constraints; the plan is a
//! topological order that keeps request order wherever no edge decides.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, info, warn};

use crate::recommendation::aggregate::{AggregateCommand, AggregateCoordinator, AggregateReport};
use crate::recommendation::error::{LifecycleError, ScheduleError};
use crate::recommendation::lifecycle::{LifecycleCommand, LifecycleOutcome};
use crate::recommendation::registry::ProviderRegistry;

/// Lifecycle operations addressable by task name, longest prefix first
pub const TASK_OPS: [&str; 6] = ["setSnapshot", "setLocal", "update", "store", "reset", "set"];

/// A requested operation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Provider {
        provider: String,
        command: LifecycleCommand,
    },
    Aggregate(AggregateCommand),
}

impl Operation {
    pub fn provider(provider: impl Into<String>, command: LifecycleCommand) -> Self {
        Operation::Provider {
            provider: provider.into(),
            command,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Provider { provider, command } => write!(f, "{}.{}", provider, command),
            Operation::Aggregate(command) => write!(f, "{}", command),
        }
    }
}

fn required_value(value: Option<&str>, token: &str) -> Result<String, ScheduleError> {
    value
        .map(str::to_string)
        .ok_or_else(|| ScheduleError::MissingValue(token.to_string()))
}

fn provider_command(
    op: &str,
    value: Option<&str>,
    token: &str,
) -> Result<Option<LifecycleCommand>, ScheduleError> {
    let command = match op {
        "setLocal" => LifecycleCommand::Local,
        "setSnapshot" => LifecycleCommand::Snapshot,
        "set" | "setVersion" => LifecycleCommand::Set(required_value(value, token)?),
        "update" => LifecycleCommand::Update,
        "store" => LifecycleCommand::Store,
        "reset" => LifecycleCommand::Reset,
        _ => return Ok(None),
    };
    Ok(Some(command))
}

fn aggregate_command(
    op: &str,
    value: Option<&str>,
    token: &str,
) -> Result<Option<AggregateCommand>, ScheduleError> {
    let command = match op {
        "update" | "updateAll" => AggregateCommand::UpdateAll,
        "setVersion" | "setAllVersion" => {
            AggregateCommand::SetAllVersion(required_value(value, token)?)
        }
        "store" | "storeAll" => AggregateCommand::StoreAll,
        "reset" | "resetAll" => AggregateCommand::ResetAll,
        _ => return Ok(None),
    };
    Ok(Some(command))
}

/// Parse an operation token
///
/// Accepted forms:
/// - `platform.update`, `platform.set=2.0`
/// - task names such as `updatePlatform` or `setPlatform=2.0`
/// - aggregates `update`, `store`, `reset`, `setVersion=2.0` and their
///   `updateAll`, `storeAll`, `resetAll`, `setAllVersion` spellings
///
/// `default_value` is used by `set` operations written without `=value`.
pub fn parse_operation(
    token: &str,
    registry: &ProviderRegistry,
    default_value: Option<&str>,
) -> Result<Operation, ScheduleError> {
    let token = token.trim();
    let (head, value) = match token.split_once('=') {
        Some((head, value)) => (head, Some(value.trim())),
        None => (token, default_value),
    };

    // Operation names never contain a dot, provider names may
    if let Some((provider, op)) = head.rsplit_once('.') {
        return match provider_command(op, value, token)? {
            Some(command) => Ok(Operation::provider(provider, command)),
            None => Err(ScheduleError::UnknownOperation(token.to_string())),
        };
    }

    if let Some(command) = aggregate_command(head, value, token)? {
        return Ok(Operation::Aggregate(command));
    }

    for provider in registry.iter() {
        for op in TASK_OPS {
            if provider.task_name(op) == head
                && let Some(command) = provider_command(op, value, token)?
            {
                return Ok(Operation::provider(provider.name(), command));
            }
        }
    }

    Err(ScheduleError::UnknownOperation(token.to_string()))
}

/// Whether `later` must run after `earlier` when both are requested
pub fn must_run_after(later: &Operation, earlier: &Operation) -> bool {
    use AggregateCommand::*;

    match (later, earlier) {
        (
            Operation::Provider {
                provider: p,
                command: LifecycleCommand::Store,
            },
            Operation::Provider {
                provider: q,
                command,
            },
        ) => p == q && command.produces_override(),
        (
            Operation::Provider {
                command: LifecycleCommand::Store,
                ..
            },
            Operation::Aggregate(aggregate),
        ) => matches!(aggregate, UpdateAll | SetAllVersion(_)),

        (
            Operation::Provider {
                provider: p,
                command: LifecycleCommand::Reset,
            },
            Operation::Provider {
                provider: q,
                command,
            },
        ) => p == q && (command.produces_override() || *command == LifecycleCommand::Store),
        (
            Operation::Provider {
                command: LifecycleCommand::Reset,
                ..
            },
            Operation::Aggregate(aggregate),
        ) => matches!(aggregate, UpdateAll | SetAllVersion(_) | StoreAll),

        (Operation::Aggregate(StoreAll), Operation::Aggregate(aggregate)) => {
            matches!(aggregate, UpdateAll | SetAllVersion(_))
        }
        (Operation::Aggregate(StoreAll), Operation::Provider { command, .. }) => {
            command.produces_override() || *command == LifecycleCommand::Store
        }

        (Operation::Aggregate(ResetAll), other) => *other != Operation::Aggregate(ResetAll),

        _ => false,
    }
}

/// Collects requested operations and extra ordering constraints
#[derive(Debug, Default)]
pub struct PlanBuilder {
    requested: Vec<Operation>,
    constraints: Vec<(Operation, Operation)>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an operation; repeated requests run once
    pub fn request(&mut self, operation: Operation) -> &mut Self {
        if self.requested.contains(&operation) {
            debug!("Ignoring duplicate request for {}", operation);
        } else {
            self.requested.push(operation);
        }
        self
    }

    /// Require `later` to run after `earlier`
    pub fn constrain(&mut self, later: Operation, earlier: Operation) -> &mut Self {
        self.constraints.push((later, earlier));
        self
    }

    fn validate(&self, registry: &ProviderRegistry) -> Result<(), ScheduleError> {
        for operation in &self.requested {
            if let Operation::Provider { provider, .. } = operation {
                match registry.get(provider) {
                    None => return Err(ScheduleError::UnknownProvider(provider.clone())),
                    Some(p) if !p.is_adaptable() => {
                        return Err(ScheduleError::NotAdaptable(provider.clone()));
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn index_of(&self, operation: &Operation) -> Result<NodeIndex, ScheduleError> {
        self.requested
            .iter()
            .position(|o| o == operation)
            .map(NodeIndex::new)
            .ok_or_else(|| ScheduleError::NotRequested(operation.to_string()))
    }

    /// Validate the requests and order them
    ///
    /// Nothing is executed here; every configuration error surfaces before
    /// any provider is touched.
    pub fn build(&self, registry: &ProviderRegistry) -> Result<ExecutionPlan, ScheduleError> {
        self.validate(registry)?;

        // Node i carries request index i; edges point from earlier to later
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        for i in 0..self.requested.len() {
            graph.add_node(i);
        }

        for (i, earlier) in self.requested.iter().enumerate() {
            for (j, later) in self.requested.iter().enumerate() {
                if i != j && must_run_after(later, earlier) {
                    graph.update_edge(NodeIndex::new(i), NodeIndex::new(j), ());
                }
            }
        }
        for (later, earlier) in &self.constraints {
            let (later, earlier) = (self.index_of(later)?, self.index_of(earlier)?);
            graph.update_edge(earlier, later, ());
        }

        for component in tarjan_scc(&graph) {
            if component.len() > 1 || graph.contains_edge(component[0], component[0]) {
                let mut indices: Vec<usize> = component.iter().map(|n| n.index()).collect();
                indices.sort_unstable();
                let conflicting: Vec<String> = indices
                    .into_iter()
                    .map(|i| self.requested[i].to_string())
                    .collect();
                warn!("Ordering conflict between {}", conflicting.join(", "));
                return Err(ScheduleError::OrderingConflict(conflicting));
            }
        }

        // Kahn's algorithm, always releasing the earliest request first
        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut operations = Vec::with_capacity(self.requested.len());
        while let Some(Reverse(i)) = ready.pop() {
            operations.push(self.requested[i].clone());
            for next in graph.neighbors_directed(NodeIndex::new(i), Direction::Outgoing) {
                let j = next.index();
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(Reverse(j));
                }
            }
        }

        debug!(
            "Execution plan: {}",
            operations
                .iter()
                .map(Operation::to_string)
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(ExecutionPlan { operations })
    }
}

/// Result of a single executed operation
#[derive(Debug)]
pub enum OperationOutcome {
    Single(Result<LifecycleOutcome, LifecycleError>),
    Aggregate(AggregateReport),
}

#[derive(Debug)]
pub struct OperationReport {
    pub operation: Operation,
    pub outcome: OperationOutcome,
}

impl OperationReport {
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            OperationOutcome::Single(result) => result.is_ok(),
            OperationOutcome::Aggregate(report) => report.is_success(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionReport {
    pub operations: Vec<OperationReport>,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        self.operations.iter().all(OperationReport::is_success)
    }
}

/// Validated, ordered operations ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    operations: Vec<Operation>,
}

impl ExecutionPlan {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Run every operation in order
    ///
    /// A failed operation is recorded in the report and the remaining
    /// operations still run.
    pub async fn execute(self, registry: &mut ProviderRegistry) -> SessionReport {
        let mut report = SessionReport::default();

        for operation in self.operations {
            info!("Running {}", operation);
            let outcome = match &operation {
                Operation::Provider { provider, command } => {
                    let result = match registry.get_mut(provider) {
                        Some(p) => p.apply(command).await,
                        None => Err(LifecycleError::NotAdaptable(provider.clone())),
                    };
                    if let Err(e) = &result {
                        warn!("{} failed: {}", operation, e);
                    }
                    OperationOutcome::Single(result)
                }
                Operation::Aggregate(command) => OperationOutcome::Aggregate(
                    AggregateCoordinator::new(registry).run(command).await,
                ),
            };

            report.operations.push(OperationReport { operation, outcome });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::lifecycle::{LifecycleController, OverrideState, Qualifiers};
    use crate::recommendation::provider::Provider;
    use crate::recommendation::store::OverrideStore;
    use crate::source::properties::PropertiesSource;
    use crate::source::types::{ArtifactKey, Recommendations};
    use rstest::rstest;
    use tempfile::TempDir;

    fn source() -> Box<PropertiesSource> {
        Box::new(PropertiesSource::inline(Recommendations::from([(
            ArtifactKey::new("com.example", "core"),
            "1.0".to_string(),
        )])))
    }

    fn registry(temp_dir: &TempDir) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for name in ["platform", "tools"] {
            let store = OverrideStore::new(temp_dir.path().join(format!("{}.version", name)));
            let controller =
                LifecycleController::open(store, Qualifiers::default(), None).unwrap();
            registry
                .add(Provider::adaptable(name, source(), controller))
                .unwrap();
        }
        registry.add(Provider::new("static", source())).unwrap();
        registry
    }

    fn op(provider: &str, command: LifecycleCommand) -> Operation {
        Operation::provider(provider, command)
    }

    fn set(provider: &str, value: &str) -> Operation {
        op(provider, LifecycleCommand::Set(value.to_string()))
    }

    fn plan(registry: &ProviderRegistry, requests: Vec<Operation>) -> Vec<String> {
        let mut builder = PlanBuilder::new();
        for request in requests {
            builder.request(request);
        }
        builder
            .build(registry)
            .unwrap()
            .operations()
            .iter()
            .map(Operation::to_string)
            .collect()
    }

    #[rstest]
    #[case("platform.update", op("platform", LifecycleCommand::Update))]
    #[case("platform.setLocal", op("platform", LifecycleCommand::Local))]
    #[case("platform.set=2.0", set("platform", "2.0"))]
    #[case("platform.setVersion=2.0", set("platform", "2.0"))]
    #[case("updatePlatform", op("platform", LifecycleCommand::Update))]
    #[case("setSnapshotTools", op("tools", LifecycleCommand::Snapshot))]
    #[case("setTools=3.1", set("tools", "3.1"))]
    #[case("update", Operation::Aggregate(AggregateCommand::UpdateAll))]
    #[case("storeAll", Operation::Aggregate(AggregateCommand::StoreAll))]
    #[case("reset", Operation::Aggregate(AggregateCommand::ResetAll))]
    #[case(
        "setVersion=4.0",
        Operation::Aggregate(AggregateCommand::SetAllVersion("4.0".to_string()))
    )]
    fn parse_operation_accepts_every_token_form(#[case] token: &str, #[case] expected: Operation) {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        assert_eq!(parse_operation(token, &registry, None).unwrap(), expected);
    }

    #[test]
    fn parse_operation_uses_default_value_for_set() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        assert_eq!(
            parse_operation("platform.set", &registry, Some("5.0")).unwrap(),
            set("platform", "5.0")
        );
    }

    #[rstest]
    #[case("platform.set")]
    #[case("setAllVersion")]
    fn parse_operation_requires_value_for_set(#[case] token: &str) {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        assert!(matches!(
            parse_operation(token, &registry, None),
            Err(ScheduleError::MissingValue(_))
        ));
    }

    #[rstest]
    #[case("platform.publish")]
    #[case("publishPlatform")]
    #[case("updateNobody")]
    fn parse_operation_rejects_unknown_tokens(#[case] token: &str) {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        assert!(matches!(
            parse_operation(token, &registry, None),
            Err(ScheduleError::UnknownOperation(_))
        ));
    }

    #[test]
    fn build_rejects_unknown_provider() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);
        let mut builder = PlanBuilder::new();
        builder.request(op("nobody", LifecycleCommand::Update));

        assert!(matches!(
            builder.build(&registry),
            Err(ScheduleError::UnknownProvider(name)) if name == "nobody"
        ));
    }

    #[test]
    fn build_rejects_non_adaptable_provider() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);
        let mut builder = PlanBuilder::new();
        builder.request(op("static", LifecycleCommand::Local));

        assert!(matches!(
            builder.build(&registry),
            Err(ScheduleError::NotAdaptable(name)) if name == "static"
        ));
    }

    #[test]
    fn store_runs_after_set_of_same_provider() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        let order = plan(
            &registry,
            vec![op("platform", LifecycleCommand::Store), set("platform", "2.0")],
        );

        assert_eq!(order, vec!["platform.set(2.0)", "platform.store"]);
    }

    #[test]
    fn reset_runs_after_aggregates_that_feed_it() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        let order = plan(
            &registry,
            vec![
                op("platform", LifecycleCommand::Reset),
                Operation::Aggregate(AggregateCommand::StoreAll),
                Operation::Aggregate(AggregateCommand::UpdateAll),
            ],
        );

        assert_eq!(order, vec!["updateAll", "storeAll", "platform.reset"]);
    }

    #[test]
    fn store_all_runs_after_single_provider_changes() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        let order = plan(
            &registry,
            vec![
                Operation::Aggregate(AggregateCommand::StoreAll),
                op("tools", LifecycleCommand::Snapshot),
                op("platform", LifecycleCommand::Store),
            ],
        );

        assert_eq!(order, vec!["tools.setSnapshot", "platform.store", "storeAll"]);
    }

    #[test]
    fn reset_all_runs_last() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        let order = plan(
            &registry,
            vec![
                Operation::Aggregate(AggregateCommand::ResetAll),
                op("tools", LifecycleCommand::Update),
                op("platform", LifecycleCommand::Local),
            ],
        );

        assert_eq!(order, vec!["tools.update", "platform.setLocal", "resetAll"]);
    }

    #[test]
    fn unconstrained_operations_keep_request_order() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        let order = plan(
            &registry,
            vec![
                op("tools", LifecycleCommand::Store),
                op("platform", LifecycleCommand::Local),
                op("tools", LifecycleCommand::Reset),
            ],
        );

        assert_eq!(order, vec!["tools.store", "platform.setLocal", "tools.reset"]);
    }

    #[test]
    fn reset_requested_first_runs_after_set_and_store_of_same_provider() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        let order = plan(
            &registry,
            vec![
                op("platform", LifecycleCommand::Reset),
                op("platform", LifecycleCommand::Store),
                set("platform", "2.0"),
            ],
        );

        assert_eq!(
            order,
            vec!["platform.set(2.0)", "platform.store", "platform.reset"]
        );
    }

    #[test]
    fn parse_operation_addresses_provider_with_dotted_name() {
        let temp_dir = TempDir::new().unwrap();
        let store = OverrideStore::new(temp_dir.path().join("com.platform.version"));
        let controller = LifecycleController::open(store, Qualifiers::default(), None).unwrap();
        let mut registry = ProviderRegistry::new();
        registry
            .add(Provider::adaptable("com.platform", source(), controller))
            .unwrap();

        assert_eq!(
            parse_operation("com.platform.update", &registry, None).unwrap(),
            op("com.platform", LifecycleCommand::Update)
        );
        assert_eq!(
            parse_operation("com.platform.set=2.0.1", &registry, None).unwrap(),
            set("com.platform", "2.0.1")
        );
        assert!(
            PlanBuilder::new()
                .request(op("com.platform", LifecycleCommand::Update))
                .build(&registry)
                .is_ok()
        );
    }

    #[test]
    fn duplicate_requests_run_once() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);

        let order = plan(
            &registry,
            vec![
                op("platform", LifecycleCommand::Update),
                op("platform", LifecycleCommand::Update),
            ],
        );

        assert_eq!(order, vec!["platform.update"]);
    }

    #[test]
    fn explicit_constraint_reorders_unrelated_operations() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);
        let mut builder = PlanBuilder::new();
        builder
            .request(op("platform", LifecycleCommand::Update))
            .request(op("tools", LifecycleCommand::Update))
            .constrain(
                op("platform", LifecycleCommand::Update),
                op("tools", LifecycleCommand::Update),
            );

        let plan = builder.build(&registry).unwrap();

        assert_eq!(
            plan.operations(),
            &[
                op("tools", LifecycleCommand::Update),
                op("platform", LifecycleCommand::Update)
            ]
        );
    }

    #[test]
    fn conflicting_constraint_is_reported_before_execution() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);
        let mut builder = PlanBuilder::new();
        builder
            .request(set("platform", "2.0"))
            .request(op("platform", LifecycleCommand::Store))
            .constrain(set("platform", "2.0"), op("platform", LifecycleCommand::Store));

        let result = builder.build(&registry);

        assert!(matches!(
            result,
            Err(ScheduleError::OrderingConflict(ops))
                if ops == vec!["platform.set(2.0)".to_string(), "platform.store".to_string()]
        ));
    }

    #[test]
    fn constraint_on_unrequested_operation_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry(&temp_dir);
        let mut builder = PlanBuilder::new();
        builder
            .request(op("platform", LifecycleCommand::Update))
            .constrain(
                op("platform", LifecycleCommand::Update),
                op("tools", LifecycleCommand::Update),
            );

        assert!(matches!(
            builder.build(&registry),
            Err(ScheduleError::NotRequested(name)) if name == "tools.update"
        ));
    }

    #[tokio::test]
    async fn execute_runs_plan_and_continues_after_failures() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = registry(&temp_dir);
        let mut builder = PlanBuilder::new();
        builder
            .request(op("tools", LifecycleCommand::Store))
            .request(op("platform", LifecycleCommand::Store))
            .request(set("platform", "2.0"));
        let plan = builder.build(&registry).unwrap();

        let report = plan.execute(&mut registry).await;

        assert!(!report.is_success());
        let results: Vec<(String, bool)> = report
            .operations
            .iter()
            .map(|r| (r.operation.to_string(), r.is_success()))
            .collect();
        assert_eq!(
            results,
            vec![
                ("tools.store".to_string(), false),
                ("platform.set(2.0)".to_string(), true),
                ("platform.store".to_string(), true),
            ]
        );
        assert_eq!(registry.get("platform").unwrap().state(), OverrideState::Set);
        assert!(temp_dir.path().join("platform.version").exists());
        assert!(!temp_dir.path().join("tools.version").exists());
    }
}
