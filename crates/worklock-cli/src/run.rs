//! # Run Subcommand
//!
//! Applies a JSON instruction script to an engine, printing one outcome
//! per line. The engine starts from a config file or resumes from a
//! previously saved state file; either way the final state can be saved
//! back out.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use worklock_settlement::{apply, EngineConfig, Instruction, SettlementEngine};

/// Arguments for the run subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON instruction script to apply.
    pub script: PathBuf,

    /// Engine configuration for a fresh engine. Mutually exclusive with
    /// --state-in.
    #[arg(long, conflicts_with = "state_in")]
    pub config: Option<PathBuf>,

    /// Resume from a saved engine state file.
    #[arg(long)]
    pub state_in: Option<PathBuf>,

    /// Write the final engine state here.
    #[arg(long)]
    pub state_out: Option<PathBuf>,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut engine = load_engine(&args)?;

    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("reading script {}", args.script.display()))?;
    let instructions: Vec<Instruction> =
        serde_json::from_str(&script).context("parsing instruction script")?;

    for (index, instruction) in instructions.into_iter().enumerate() {
        let outcome = apply(&mut engine, instruction)
            .with_context(|| format!("applying instruction {index}"))?;
        println!("{}", serde_json::to_string(&outcome)?);
    }

    if let Some(path) = &args.state_out {
        fs::write(path, serde_json::to_string_pretty(&engine)?)
            .with_context(|| format!("writing state {}", path.display()))?;
        tracing::info!(path = %path.display(), "engine state saved");
    }
    Ok(())
}

fn load_engine(args: &RunArgs) -> anyhow::Result<SettlementEngine> {
    if let Some(path) = &args.state_in {
        let state = fs::read_to_string(path)
            .with_context(|| format!("reading state {}", path.display()))?;
        return serde_json::from_str(&state).context("parsing engine state");
    }
    let path = args
        .config
        .as_ref()
        .context("either --config or --state-in is required")?;
    let config = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&config).context("parsing engine config")?;
    Ok(SettlementEngine::new(config))
}
