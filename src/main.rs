use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docksteady::config::Config;
use docksteady::history::HistoryStore;
use docksteady::runtime::{self, DockerCli};
use docksteady::{ContainerSpec, DesiredState, Outcome, Params, reconcile};

/// Declarative state management for a single docker container.
///
/// Reads a params file declaring the desired state of one container and
/// converges the runtime on it, printing a JSON report on stdout.
#[derive(Parser)]
#[command(name = "docksteady", version, about)]
struct Cli {
    /// YAML or JSON file declaring the container.
    params: PathBuf,

    /// Installation config file.
    #[arg(long, default_value = "/etc/docksteady.yaml")]
    config: PathBuf,

    /// Override the directory where previous commands are remembered.
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) => {
            print_report(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            // Failures report changed=true: a partial action sequence may
            // already have mutated runtime state.
            let payload = serde_json::json!({ "changed": true, "msg": format!("{err:#}") });
            println!("{payload}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let params = Params::load(&cli.params)
        .with_context(|| format!("failed to load params from {}", cli.params.display()))?;

    if params.state != DesiredState::Stopped && params.image.is_none() {
        anyhow::bail!("Invalid argument: no image name provided");
    }
    tracing::info!(container = %params.name, state = params.state.as_str(), "reconciling");

    let mut config = Config::load(&cli.config)?;
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    let state = params.state;
    let spec = ContainerSpec::from_params(params)?;

    let store = HistoryStore::open(&config.state_dir).with_context(|| {
        format!(
            "failed to create state directory {}",
            config.state_dir.display()
        )
    })?;

    runtime::ensure_available()?;

    let outcome = reconcile(&spec, state, &DockerCli, &store)?;
    Ok(outcome)
}

fn print_report(outcome: &Outcome) {
    match serde_json::to_string(outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize report: {e}"),
    }
}
