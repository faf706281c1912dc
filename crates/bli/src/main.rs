//! BLI - Bare Layer Infrastructure CLI
//!
//! A thin wrapper around the Pulumi and gcloud CLIs for managing GCP
//! infrastructure stacks.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose());
    output::banner();

    if let Err(err) = run(cli).await {
        output::fatal(&format!("{:#}", err));
        std::process::exit(exit_code(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => commands::init::run(args).await,
        Commands::Preview(args) => commands::preview::run(args).await,
        Commands::Deploy(args) => commands::deploy::run(args).await,
        Commands::Destroy(args) => commands::destroy::run(args).await,
        Commands::Clear(args) => commands::clear::run(args).await,
        Commands::Graph(args) => commands::graph::run(args).await,
        Commands::Depend(args) => commands::depend::run(args).await,
    }
}

/// Exit status for a failed command: the wrapped tool's code when there is one
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<bli_core::Error>()
        .map_or(1, bli_core::Error::exit_code)
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
