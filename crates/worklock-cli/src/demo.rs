//! # Demo Subcommand
//!
//! Runs a canned marketplace flow end to end on a fresh engine: a plain
//! release, a dispute resolved as a split, and a cross-chain release
//! carried through attestation and execution. Prints each settlement.

use clap::Args;

use worklock_core::{AccountId, BasisPoints, ChainId, Currency, JobId};
use worklock_escrow::{DepositRequest, FeePolicy};
use worklock_settlement::{
    EngineConfig, ResolutionChoice, Role, SettlementEngine, SettlementReceipt,
};

/// Arguments for the demo subcommand.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Print the full audit event log at the end.
    #[arg(long)]
    pub events: bool,
}

pub fn run(args: DemoArgs) -> anyhow::Result<()> {
    let admin = AccountId::new("admin")?;
    let client = AccountId::new("client")?;
    let freelancer = AccountId::new("freelancer")?;
    let resolver = AccountId::new("resolver")?;
    let relayer = AccountId::new("relayer-a")?;
    let origin = ChainId(1);
    let dest = ChainId(137);

    let mut engine = SettlementEngine::new(config(&admin, origin)?);
    engine.grant_role(&admin, Role::Resolver, resolver.clone())?;
    engine.grant_role(&admin, Role::Relayer, relayer.clone())?;

    // 1. Plain release.
    engine.deposit(request(1, &client, &freelancer, 1000, None)?)?;
    let receipt = engine.release(JobId(1), &client)?;
    print_receipt("release", &receipt)?;

    // 2. Dispute resolved as a 30/70 split.
    engine.deposit(request(2, &client, &freelancer, 5000, None)?)?;
    engine.open_dispute(JobId(2), client.clone(), "half the scope delivered".to_string())?;
    engine.post_message(JobId(2), freelancer.clone(), "scope changed mid-job".to_string())?;
    engine.begin_review(JobId(2), &resolver)?;
    let receipt = engine.resolve_dispute(
        JobId(2),
        resolver,
        ResolutionChoice::Split { ratio_percent: 30 },
        Some("partial delivery confirmed".to_string()),
    )?;
    print_receipt("split resolution", &receipt)?;

    // 3. Cross-chain release, round-tripped through a destination relay.
    engine.deposit(request(3, &client, &freelancer, 2000, Some(dest))?)?;
    let receipt = engine.release(JobId(3), &client)?;
    print_receipt("cross-chain release", &receipt)?;
    if let Some(nonce) = receipt.bridge_nonce {
        let message = engine
            .relay()
            .message(origin, nonce)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("outbound message missing"))?;
        let mut dest_engine = SettlementEngine::new(config(&admin, dest)?);
        dest_engine.grant_role(&admin, Role::Relayer, relayer.clone())?;
        dest_engine.ingest_message(message)?;
        dest_engine.attest_transfer(origin, nonce, relayer)?;
        let payload = dest_engine.execute_transfer(origin, nonce)?;
        println!("delivered: {}", serde_json::to_string(&payload)?);
    }

    if args.events {
        for event in engine.ledger().events() {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}

fn config(admin: &AccountId, chain: ChainId) -> anyhow::Result<EngineConfig> {
    Ok(EngineConfig {
        bootstrap_admin: admin.clone(),
        fee_collector: AccountId::new("fee-collector")?,
        fee_policy: FeePolicy::default(),
        origin_chain: chain,
        quorum: 1,
    })
}

fn request(
    job: u64,
    depositor: &AccountId,
    beneficiary: &AccountId,
    amount: u64,
    dest_chain: Option<ChainId>,
) -> anyhow::Result<DepositRequest> {
    Ok(DepositRequest {
        job_id: JobId(job),
        depositor: depositor.clone(),
        beneficiary: beneficiary.clone(),
        amount,
        currency: Currency::Native,
        fee_bps: BasisPoints::new(500)?,
        dest_chain,
        deadline: None,
    })
}

fn print_receipt(label: &str, receipt: &SettlementReceipt) -> anyhow::Result<()> {
    println!("{label}: {}", serde_json::to_string(receipt)?);
    Ok(())
}
