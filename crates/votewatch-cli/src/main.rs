mod display;
mod state;
mod wiring;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use votewatch_core::{Config, RecordPolicy};
use votewatch_runner::Runner;

#[derive(Parser)]
#[command(name = "votewatch", version, about = "Email subscribers about governance proposals open for voting")]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, short, global = true, env = "VOTEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Override `store.path` (file backend).
    #[arg(long, global = true, env = "VOTEWATCH_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Override `record_policy`. Switching a plain-written document to
    /// `lifecycle` notifies every record without `started_at` again.
    #[arg(long, global = true, value_enum)]
    policy: Option<PolicyArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one notification pass and print the outcome as JSON.
    Run,
    /// Show what a run would do without notifying or writing state.
    Preview {
        /// Print the preview as JSON instead of a report.
        #[arg(long)]
        json: bool,
    },
    /// Inspect or initialise the state document.
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the stored document.
    Show,
    /// Write an empty document.
    Init {
        /// Overwrite an existing document.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Plain,
    Lifecycle,
}

impl From<PolicyArg> for RecordPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Plain => RecordPolicy::Plain,
            PolicyArg::Lifecycle => RecordPolicy::Lifecycle,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(path) = &cli.state_file {
        config.store.path = path.clone();
    }
    if let Some(policy) = cli.policy {
        config.record_policy = policy.into();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("votewatch v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config(&cli)?;

    match cli.command {
        Command::Run => {
            let runner = Runner::new(
                &config,
                wiring::proposal_source(&config),
                wiring::state_store(&config).await,
                wiring::notifier(&config).await,
            );
            let outcome = runner.run().await.map_err(|e| {
                tracing::error!(error = %e, "run failed");
                e
            })?;
            println!("{}", serde_json::to_string(&outcome)?);
        }
        Command::Preview { json } => {
            let runner = Runner::new(
                &config,
                wiring::proposal_source(&config),
                wiring::state_store(&config).await,
                Box::new(votewatch_notify::LogNotifier::new(config.notify.clone())),
            );
            let preview = runner.preview().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                print!("{}", display::preview_report(&preview, config.record_policy));
            }
        }
        Command::State { action } => {
            let store = wiring::state_store(&config).await;
            match action {
                StateAction::Show => {
                    let doc = store.get().await.context("reading state document")?;
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                }
                StateAction::Init { force } => {
                    if state::init(store.as_ref(), force).await? {
                        eprintln!("Initialised empty state at {}", store.describe());
                    } else {
                        anyhow::bail!(
                            "state already exists at {}; pass --force to overwrite",
                            store.describe()
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
