//! # worklock CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// Worklock settlement core CLI.
///
/// Runs instruction scripts against an engine state file, inspects saved
/// ledger state, and exercises a canned end-to-end scenario.
#[derive(Parser, Debug)]
#[command(name = "worklock", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Apply a JSON instruction script.
    Run(worklock_cli::run::RunArgs),
    /// Print a saved engine state.
    Inspect(worklock_cli::inspect::InspectArgs),
    /// Run a canned end-to-end scenario.
    Demo(worklock_cli::demo::DemoArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => worklock_cli::run::run(args),
        Commands::Inspect(args) => worklock_cli::inspect::run(args),
        Commands::Demo(args) => worklock_cli::demo::run(args),
    }
}
