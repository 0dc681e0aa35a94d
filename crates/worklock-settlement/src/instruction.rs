//! # Instruction Surface
//!
//! A serialized vocabulary over the engine: every mutating entry point as
//! a tagged instruction, applied one at a time. Scripts of instructions
//! drive the CLI and the integration tests through exactly the same code
//! path the engine's callers use.

use serde::{Deserialize, Serialize};

use worklock_access::Role;
use worklock_arbitration::DisputeStatus;
use worklock_bridge::{BridgeMessage, TransferPayload};
use worklock_core::{
    sha256_digest, AccountId, BasisPoints, ChainId, ContentDigest, Currency, JobId, Timestamp,
};
use worklock_escrow::{DepositRequest, EscrowState};

use crate::engine::{EngineError, ResolutionChoice, SettlementEngine, SettlementReceipt};

/// One mutating operation against the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    /// Grant a role.
    GrantRole {
        /// The acting Admin.
        actor: AccountId,
        /// Role to grant.
        role: Role,
        /// Receiving account.
        holder: AccountId,
    },
    /// Revoke a role.
    RevokeRole {
        /// The acting Admin.
        actor: AccountId,
        /// Role to revoke.
        role: Role,
        /// Losing account.
        holder: AccountId,
    },
    /// Lock funds into a new escrow entry.
    Deposit {
        /// Caller-supplied job identifier.
        job_id: JobId,
        /// The client locking the funds.
        depositor: AccountId,
        /// The freelancer the funds are destined for.
        beneficiary: AccountId,
        /// Amount to lock.
        amount: u64,
        /// Asset denomination.
        currency: Currency,
        /// Platform fee in basis points.
        fee_bps: BasisPoints,
        /// Destination chain for cross-chain jobs.
        #[serde(default)]
        dest_chain: Option<ChainId>,
        /// Informational deadline.
        #[serde(default)]
        deadline: Option<Timestamp>,
    },
    /// Release to the beneficiary, at the depositor's request.
    Release {
        /// Target job.
        job_id: JobId,
        /// The depositor.
        caller: AccountId,
    },
    /// Release on the strength of a relayer attestation.
    RelayedRelease {
        /// Target job.
        job_id: JobId,
        /// The attesting relayer.
        relayer: AccountId,
    },
    /// Refund to the depositor, at the beneficiary's request.
    Refund {
        /// Target job.
        job_id: JobId,
        /// The beneficiary.
        caller: AccountId,
    },
    /// Open a dispute against a funded entry.
    OpenDispute {
        /// Target job.
        job_id: JobId,
        /// The disputing party.
        initiator: AccountId,
        /// Why the dispute was opened.
        reason: String,
    },
    /// Submit an exhibit; the content is digested, not stored.
    SubmitEvidence {
        /// Target job.
        job_id: JobId,
        /// The submitting party or resolver.
        submitter: AccountId,
        /// Exhibit content. Only its digest is retained.
        content: String,
        /// Optional retrieval hint.
        #[serde(default)]
        uri: Option<String>,
    },
    /// Post a message to the dispute thread.
    PostMessage {
        /// Target job.
        job_id: JobId,
        /// The posting party or resolver.
        sender: AccountId,
        /// Message body.
        body: String,
    },
    /// Mark a pending dispute as under review.
    BeginReview {
        /// Target job.
        job_id: JobId,
        /// The acting resolver.
        resolver: AccountId,
    },
    /// Execute a terminal resolution.
    ResolveDispute {
        /// Target job.
        job_id: JobId,
        /// The acting resolver.
        resolver: AccountId,
        /// The chosen outcome.
        resolution: ResolutionChoice,
        /// Free-text audit notes.
        #[serde(default)]
        admin_notes: Option<String>,
    },
    /// Ingest a transfer message from another chain.
    IngestMessage {
        /// The inbound message.
        message: BridgeMessage,
    },
    /// Record a relayer attestation over a pending message.
    AttestTransfer {
        /// Origin chain of the message.
        origin_chain: ChainId,
        /// Message nonce.
        nonce: u64,
        /// The attesting relayer.
        relayer: AccountId,
    },
    /// Execute an inbound message whose quorum is met.
    ExecuteTransfer {
        /// Origin chain of the message.
        origin_chain: ChainId,
        /// Message nonce.
        nonce: u64,
    },
}

/// What an applied instruction produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// A role grant or revocation landed.
    RoleChanged,
    /// Funds were locked.
    Deposited {
        /// The funded job.
        job_id: JobId,
        /// Locked amount.
        amount: u64,
        /// Entry state after the deposit.
        state: EscrowState,
    },
    /// A terminal transition distributed funds.
    Settled {
        /// The payouts and any bridge handoff.
        receipt: SettlementReceipt,
    },
    /// A dispute was opened.
    DisputeOpened {
        /// The disputed job.
        job_id: JobId,
        /// Status after opening.
        status: DisputeStatus,
    },
    /// An exhibit landed.
    EvidenceSubmitted {
        /// The target job.
        job_id: JobId,
        /// Digest of the submitted content.
        content_digest: ContentDigest,
    },
    /// A dispute message landed.
    MessagePosted {
        /// The target job.
        job_id: JobId,
    },
    /// A dispute moved under review.
    ReviewStarted {
        /// The target job.
        job_id: JobId,
    },
    /// An inbound message was accepted.
    TransferIngested {
        /// Origin chain of the message.
        origin_chain: ChainId,
        /// Message nonce.
        nonce: u64,
    },
    /// An attestation landed.
    TransferAttested {
        /// Origin chain of the message.
        origin_chain: ChainId,
        /// Message nonce.
        nonce: u64,
    },
    /// An inbound message executed.
    TransferExecuted {
        /// The delivered payout.
        payload: TransferPayload,
    },
}

/// Apply one instruction to the engine.
pub fn apply(
    engine: &mut SettlementEngine,
    instruction: Instruction,
) -> Result<Outcome, EngineError> {
    match instruction {
        Instruction::GrantRole { actor, role, holder } => {
            engine.grant_role(&actor, role, holder)?;
            Ok(Outcome::RoleChanged)
        }
        Instruction::RevokeRole { actor, role, holder } => {
            engine.revoke_role(&actor, role, &holder)?;
            Ok(Outcome::RoleChanged)
        }
        Instruction::Deposit {
            job_id,
            depositor,
            beneficiary,
            amount,
            currency,
            fee_bps,
            dest_chain,
            deadline,
        } => {
            let entry = engine.deposit(DepositRequest {
                job_id,
                depositor,
                beneficiary,
                amount,
                currency,
                fee_bps,
                dest_chain,
                deadline,
            })?;
            Ok(Outcome::Deposited {
                job_id: entry.job_id,
                amount: entry.amount,
                state: entry.state,
            })
        }
        Instruction::Release { job_id, caller } => {
            let receipt = engine.release(job_id, &caller)?;
            Ok(Outcome::Settled { receipt })
        }
        Instruction::RelayedRelease { job_id, relayer } => {
            let receipt = engine.relayed_release(job_id, &relayer)?;
            Ok(Outcome::Settled { receipt })
        }
        Instruction::Refund { job_id, caller } => {
            let receipt = engine.refund(job_id, &caller)?;
            Ok(Outcome::Settled { receipt })
        }
        Instruction::OpenDispute {
            job_id,
            initiator,
            reason,
        } => {
            let dispute = engine.open_dispute(job_id, initiator, reason)?;
            Ok(Outcome::DisputeOpened {
                job_id: dispute.job_id,
                status: dispute.status,
            })
        }
        Instruction::SubmitEvidence {
            job_id,
            submitter,
            content,
            uri,
        } => {
            let content_digest = sha256_digest(content.as_bytes());
            engine.submit_evidence(job_id, submitter, content_digest, uri, Vec::new())?;
            Ok(Outcome::EvidenceSubmitted {
                job_id,
                content_digest,
            })
        }
        Instruction::PostMessage {
            job_id,
            sender,
            body,
        } => {
            engine.post_message(job_id, sender, body)?;
            Ok(Outcome::MessagePosted { job_id })
        }
        Instruction::BeginReview { job_id, resolver } => {
            engine.begin_review(job_id, &resolver)?;
            Ok(Outcome::ReviewStarted { job_id })
        }
        Instruction::ResolveDispute {
            job_id,
            resolver,
            resolution,
            admin_notes,
        } => {
            let receipt = engine.resolve_dispute(job_id, resolver, resolution, admin_notes)?;
            Ok(Outcome::Settled { receipt })
        }
        Instruction::IngestMessage { message } => {
            let origin_chain = message.origin_chain;
            let nonce = message.nonce;
            engine.ingest_message(message)?;
            Ok(Outcome::TransferIngested {
                origin_chain,
                nonce,
            })
        }
        Instruction::AttestTransfer {
            origin_chain,
            nonce,
            relayer,
        } => {
            engine.attest_transfer(origin_chain, nonce, relayer)?;
            Ok(Outcome::TransferAttested {
                origin_chain,
                nonce,
            })
        }
        Instruction::ExecuteTransfer {
            origin_chain,
            nonce,
        } => {
            let payload = engine.execute_transfer(origin_chain, nonce)?;
            Ok(Outcome::TransferExecuted { payload })
        }
    }
}

/// Apply a script of instructions in order, stopping at the first error.
///
/// Instructions already applied stay applied; each instruction is atomic
/// but the script as a whole is not.
pub fn apply_script(
    engine: &mut SettlementEngine,
    script: Vec<Instruction>,
) -> Result<Vec<Outcome>, EngineError> {
    let mut outcomes = Vec::with_capacity(script.len());
    for instruction in script {
        outcomes.push(apply(engine, instruction)?);
    }
    Ok(outcomes)
}
