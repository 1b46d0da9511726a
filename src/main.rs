use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use version_recommender::config::{DEFAULT_CONFIG_FILE, RecommenderConfig};
use version_recommender::logging::init_logging;
use version_recommender::recommendation::registry::ProviderRegistry;
use version_recommender::recommendation::resolver::resolve_detailed;
use version_recommender::recommendation::schedule::{
    OperationOutcome, PlanBuilder, SessionReport, TASK_OPS, parse_operation,
};
use version_recommender::session::build_registry;
use version_recommender::source::ArtifactKey;

#[derive(Parser)]
#[command(name = "version-recommender")]
#[command(version, about = "Ordered dependency version recommendations with overrides")]
struct Cli {
    /// Project directory holding the config file and override stores
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Config file, defaults to version-recommender.json in the project directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the recommended version of each artifact
    Resolve {
        /// Artifacts as group:name
        #[arg(required = true)]
        artifacts: Vec<String>,
    },
    /// Run lifecycle operations, e.g. `platform.setLocal`, `updatePlatform`, `storeAll`
    Run {
        #[arg(required = true)]
        operations: Vec<String>,

        /// Version used by set operations given without `=value`
        #[arg(long)]
        value: Option<String>,

        /// Extra ordering constraint as LATER=EARLIER
        #[arg(long = "after", value_name = "LATER=EARLIER")]
        after: Vec<String>,
    },
    /// List providers in fallback order
    List,
}

fn resolve(registry: &ProviderRegistry, artifacts: &[String]) -> anyhow::Result<bool> {
    let mut all_found = true;
    for artifact in artifacts {
        let key: ArtifactKey = artifact.parse()?;
        let resolution = resolve_detailed(registry, &key);
        match (resolution.version, resolution.provider) {
            (Some(version), Some(provider)) => println!("{} {} ({})", key, version, provider),
            _ => {
                all_found = false;
                println!("{} not found", key);
            }
        }
        for failure in resolution.failures {
            eprintln!("  warning: {}", failure);
        }
    }
    Ok(all_found)
}

fn list(registry: &ProviderRegistry) {
    for (position, provider) in registry.iter().enumerate() {
        println!(
            "{}. {} [{}] {}",
            position + 1,
            provider.name(),
            provider.kind().as_str(),
            provider.origin()
        );
        if let Some(path) = provider.override_file_path() {
            println!("   state: {}", provider.state());
            println!("   overrides: {}", path.display());
            let tasks: Vec<String> = TASK_OPS.iter().map(|op| provider.task_name(op)).collect();
            println!("   tasks: {}", tasks.join(", "));
        }
    }
}

fn print_report(report: &SessionReport) {
    for operation in &report.operations {
        match &operation.outcome {
            OperationOutcome::Single(Ok(outcome)) => println!(
                "{}: ok, {} ({} entries)",
                operation.operation, outcome.state, outcome.entries
            ),
            OperationOutcome::Single(Err(e)) => println!("{}: failed, {}", operation.operation, e),
            OperationOutcome::Aggregate(aggregate) => {
                println!("{}:", operation.operation);
                for member in &aggregate.results {
                    match &member.result {
                        Ok(outcome) => println!(
                            "  {}: ok, {} ({} entries)",
                            member.provider, outcome.state, outcome.entries
                        ),
                        Err(e) => println!("  {}: failed, {}", member.provider, e),
                    }
                }
            }
        }
    }
}

async fn run(
    registry: &mut ProviderRegistry,
    operations: &[String],
    value: Option<&str>,
    after: &[String],
) -> anyhow::Result<bool> {
    let mut builder = PlanBuilder::new();
    for token in operations {
        builder.request(parse_operation(token, registry, value)?);
    }
    for constraint in after {
        let (later, earlier) = constraint
            .split_once('=')
            .with_context(|| format!("Invalid constraint '{}', expected LATER=EARLIER", constraint))?;
        builder.constrain(
            parse_operation(later, registry, value)?,
            parse_operation(earlier, registry, value)?,
        );
    }

    let plan = builder.build(registry)?;
    let report = plan.execute(registry).await;
    print_report(&report);
    Ok(report.is_success())
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.project_dir.join(DEFAULT_CONFIG_FILE));
    let config = RecommenderConfig::load(&config_path)?;
    let _guard = init_logging(&config.log)?;

    let mut registry = build_registry(&config, &cli.project_dir)?;

    let success = match cli.command {
        Command::Resolve { artifacts } => resolve(&registry, &artifacts)?,
        Command::List => {
            list(&registry);
            true
        }
        Command::Run {
            operations,
            value,
            after,
        } => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(run(&mut registry, &operations, value.as_deref(), &after))?,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
