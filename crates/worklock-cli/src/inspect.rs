//! # Inspect Subcommand
//!
//! Prints a saved engine state: live escrow entries, open disputes, and
//! the audit event log.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use worklock_settlement::SettlementEngine;

/// Arguments for the inspect subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Saved engine state file.
    pub state: PathBuf,

    /// Print the full audit event log as well.
    #[arg(long)]
    pub events: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let state = fs::read_to_string(&args.state)
        .with_context(|| format!("reading state {}", args.state.display()))?;
    let engine: SettlementEngine = serde_json::from_str(&state).context("parsing engine state")?;

    println!("{}", serde_json::to_string_pretty(engine.ledger())?);
    if args.events {
        for event in engine.ledger().events() {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}
