//! # Escrow Ledger
//!
//! Guarded state transitions over the escrow entries, with exact payout
//! computation and an append-only event log. Each entry point validates
//! completely before mutating anything, so a rejected call leaves the
//! ledger exactly as it found it.
//!
//! ## Fee Semantics
//!
//! The platform fee is earmarked at deposit (as basis points of the
//! amount) but carved out of the distributed funds only at release time.
//! A voluntary refund pays no fee. On a split resolution the fee applies
//! to the beneficiary-bound portion only, or is waived entirely under
//! [`FeePolicy::WaiveOnSplit`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use worklock_core::{
    AccountId, BasisPoints, ChainId, Currency, EventId, JobId, Timestamp,
};

use crate::entry::{EscrowEntry, EscrowState};

// ─── Payouts and Settlements ─────────────────────────────────────────

/// Which leg of a settlement a payout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutKind {
    /// Funds paid to the job's beneficiary.
    Beneficiary,
    /// Funds returned to the job's depositor.
    Depositor,
    /// Platform fee paid to the configured collector.
    FeeCollector,
}

/// One value transfer produced by a terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Receiving account.
    pub to: AccountId,
    /// Amount transferred, in units of the entry's currency.
    pub amount: u64,
    /// Which leg this payout is.
    pub kind: PayoutKind,
}

/// How a settlement's beneficiary leg reaches its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementPath {
    /// All payouts apply on the origin chain.
    Direct,
    /// The beneficiary leg must be carried to the named chain by the
    /// bridge relay; fee and depositor legs still apply locally.
    Bridged(ChainId),
}

/// The complete outcome of a terminal transition.
///
/// Payouts always sum exactly to the entry's deposited amount: the fee is
/// carved out of the distributed funds, never created or destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// The job that settled.
    pub job_id: JobId,
    /// The asset the payouts are denominated in.
    pub currency: Currency,
    /// Zero-amount legs are omitted.
    pub payouts: Vec<Payout>,
    /// Whether the beneficiary leg settles locally or over the bridge.
    pub path: SettlementPath,
}

impl Settlement {
    /// Total value distributed across all payouts.
    pub fn total(&self) -> u64 {
        self.payouts.iter().map(|p| p.amount).sum()
    }

    /// The payout for a given leg, if present.
    pub fn payout(&self, kind: PayoutKind) -> Option<&Payout> {
        self.payouts.iter().find(|p| p.kind == kind)
    }
}

// ─── Resolution Outcomes ─────────────────────────────────────────────

/// The closed set of dispute resolutions a resolver may execute.
///
/// A tagged enum rather than free-form strings: the admin surface's
/// "freelancer / client / split" buttons map onto exactly these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionOutcome {
    /// Award the full amount to the beneficiary (fee applies).
    BeneficiaryFull,
    /// Return the full amount to the depositor (no fee).
    DepositorFull,
    /// Award the given basis-point share to the beneficiary; the
    /// remainder, including the truncation remainder, goes to the
    /// depositor.
    Split(BasisPoints),
}

impl std::fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeneficiaryFull => f.write_str("BENEFICIARY_FULL"),
            Self::DepositorFull => f.write_str("DEPOSITOR_FULL"),
            Self::Split(ratio) => write!(f, "SPLIT({ratio})"),
        }
    }
}

/// Fee treatment for split resolutions. Deliberately a configuration
/// point: the fee is always charged on full release and never on refund,
/// but split treatment varies by deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeePolicy {
    /// Charge the fee proportionally on the beneficiary-bound portion.
    #[default]
    ProRataBeneficiary,
    /// Waive the fee entirely on split resolutions.
    WaiveOnSplit,
}

// ─── Deposit Input ───────────────────────────────────────────────────

/// Parameters for creating a funded escrow entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Caller-supplied job identifier, unique among non-terminal entries.
    pub job_id: JobId,
    /// The client locking the funds.
    pub depositor: AccountId,
    /// The freelancer the funds are destined for.
    pub beneficiary: AccountId,
    /// Amount to lock; must be greater than zero.
    pub amount: u64,
    /// Asset denomination.
    pub currency: Currency,
    /// Platform fee earmarked for release time.
    pub fee_bps: BasisPoints,
    /// Destination chain for cross-chain jobs.
    #[serde(default)]
    pub dest_chain: Option<ChainId>,
    /// Informational deadline; never acted on by the core.
    #[serde(default)]
    pub deadline: Option<Timestamp>,
}

// ─── Events ──────────────────────────────────────────────────────────

/// Structured audit event appended on every state mutation.
///
/// Each event carries the before/after state, so the audit trail can be
/// reconstructed without replaying full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowEvent {
    /// Funds were locked into a new entry.
    Deposited {
        /// Unique event identifier.
        event_id: EventId,
        /// The funded job.
        job_id: JobId,
        /// The client who locked the funds.
        depositor: AccountId,
        /// The freelancer the funds are destined for.
        beneficiary: AccountId,
        /// Locked amount.
        amount: u64,
        /// Earmarked fee ratio.
        fee_bps: BasisPoints,
        /// When the deposit landed.
        at: Timestamp,
    },
    /// The entry released to the beneficiary.
    Released {
        /// Unique event identifier.
        event_id: EventId,
        /// The released job.
        job_id: JobId,
        /// State before the transition.
        from_state: EscrowState,
        /// State after the transition.
        to_state: EscrowState,
        /// The payouts produced.
        settlement: Settlement,
        /// When the release landed.
        at: Timestamp,
    },
    /// The entry refunded to the depositor.
    Refunded {
        /// Unique event identifier.
        event_id: EventId,
        /// The refunded job.
        job_id: JobId,
        /// State before the transition.
        from_state: EscrowState,
        /// State after the transition.
        to_state: EscrowState,
        /// The payouts produced.
        settlement: Settlement,
        /// When the refund landed.
        at: Timestamp,
    },
    /// A dispute froze the entry.
    Disputed {
        /// Unique event identifier.
        event_id: EventId,
        /// The disputed job.
        job_id: JobId,
        /// State before the transition.
        from_state: EscrowState,
        /// State after the transition.
        to_state: EscrowState,
        /// When the dispute landed.
        at: Timestamp,
    },
    /// A resolution distributed the entry's funds.
    ResolvedByDispute {
        /// Unique event identifier.
        event_id: EventId,
        /// The resolved job.
        job_id: JobId,
        /// State before the transition.
        from_state: EscrowState,
        /// State after the transition.
        to_state: EscrowState,
        /// The executed outcome.
        outcome: ResolutionOutcome,
        /// The payouts produced.
        settlement: Settlement,
        /// When the resolution landed.
        at: Timestamp,
    },
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from ledger entry points. All are rejected atomically; no
/// partial state is persisted.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// No entry exists for the job.
    #[error("unknown job {job_id}")]
    UnknownJob {
        /// The missing job.
        job_id: JobId,
    },

    /// A non-terminal entry already exists for the job.
    #[error("duplicate job {job_id}: a non-terminal escrow entry already exists")]
    DuplicateJob {
        /// The conflicting job.
        job_id: JobId,
    },

    /// The deposit amount was zero.
    #[error("invalid amount: deposit must be greater than zero")]
    InvalidAmount,

    /// The caller is not permitted to perform the action on this entry.
    #[error("unauthorized: {caller} may not {action} {job_id}")]
    Unauthorized {
        /// The rejected caller.
        caller: AccountId,
        /// What was attempted.
        action: String,
        /// The target job.
        job_id: JobId,
    },

    /// The entry is not in a state that allows the action.
    #[error("invalid state: cannot {action} {job_id} while {state}")]
    InvalidState {
        /// The target job.
        job_id: JobId,
        /// The entry's current state.
        state: EscrowState,
        /// What was attempted.
        action: String,
    },
}

// ─── The Ledger ──────────────────────────────────────────────────────

/// Custodies every escrow entry and owns all fund movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowLedger {
    /// Receives the platform fee carved out at release time.
    fee_collector: AccountId,
    /// Fee treatment on split resolutions.
    fee_policy: FeePolicy,
    /// Live entries, at most one per job identifier.
    entries: HashMap<JobId, EscrowEntry>,
    /// Terminal entries displaced by a re-funded job identifier.
    archive: Vec<EscrowEntry>,
    /// Append-only audit event log.
    events: Vec<EscrowEvent>,
}

impl EscrowLedger {
    /// Create an empty ledger paying fees to `fee_collector`.
    pub fn new(fee_collector: AccountId, fee_policy: FeePolicy) -> Self {
        Self {
            fee_collector,
            fee_policy,
            entries: HashMap::new(),
            archive: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Lock funds into a new `Funded` entry.
    ///
    /// If the job identifier previously settled, the terminal entry is
    /// archived and the identifier becomes fundable again; a live
    /// non-terminal entry rejects the deposit.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a zero amount, `DuplicateJob` if a non-terminal
    /// entry exists for `job_id`.
    pub fn deposit(&mut self, request: DepositRequest) -> Result<&EscrowEntry, EscrowError> {
        if request.amount == 0 {
            return Err(EscrowError::InvalidAmount);
        }
        if let Some(existing) = self.entries.get(&request.job_id) {
            if !existing.is_terminal() {
                return Err(EscrowError::DuplicateJob {
                    job_id: request.job_id,
                });
            }
        }
        if let Some(displaced) = self.entries.remove(&request.job_id) {
            self.archive.push(displaced);
        }

        let now = Timestamp::now();
        let entry = EscrowEntry {
            job_id: request.job_id,
            depositor: request.depositor.clone(),
            beneficiary: request.beneficiary.clone(),
            amount: request.amount,
            currency: request.currency,
            fee_bps: request.fee_bps,
            dest_chain: request.dest_chain,
            deadline: request.deadline,
            state: EscrowState::Funded,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(
            job_id = %entry.job_id,
            amount = entry.amount,
            fee_bps = %entry.fee_bps,
            "escrow funded"
        );
        self.events.push(EscrowEvent::Deposited {
            event_id: EventId::new(),
            job_id: entry.job_id,
            depositor: request.depositor,
            beneficiary: request.beneficiary,
            amount: entry.amount,
            fee_bps: entry.fee_bps,
            at: now,
        });
        Ok(self.entries.entry(request.job_id).or_insert(entry))
    }

    /// Release a funded entry to its beneficiary, on the depositor's
    /// direct approval.
    ///
    /// Pays `amount − fee` to the beneficiary and `fee` to the collector.
    /// Cross-chain entries report a [`SettlementPath::Bridged`] beneficiary
    /// leg for the relay to carry.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the depositor; `InvalidState`
    /// unless the entry is `Funded`.
    pub fn release(&mut self, job_id: JobId, caller: &AccountId) -> Result<Settlement, EscrowError> {
        let entry = self.require_entry(job_id)?;
        if caller != &entry.depositor {
            return Err(EscrowError::Unauthorized {
                caller: caller.clone(),
                action: "release".to_string(),
                job_id,
            });
        }
        self.release_inner(job_id)
    }

    /// Release a funded entry on the authority of an attested relay
    /// message rather than the depositor's signature.
    ///
    /// The relay-authorized settlement path for bridge-settled jobs; the
    /// caller check is the attestation quorum already enforced upstream.
    pub fn release_attested(&mut self, job_id: JobId) -> Result<Settlement, EscrowError> {
        self.require_entry(job_id)?;
        self.release_inner(job_id)
    }

    /// Refund a funded entry in full to its depositor.
    ///
    /// Voluntary forfeiture by the beneficiary; no fee is charged.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the beneficiary; `InvalidState`
    /// unless the entry is `Funded`.
    pub fn refund(&mut self, job_id: JobId, caller: &AccountId) -> Result<Settlement, EscrowError> {
        let entry = self.require_entry(job_id)?;
        if caller != &entry.beneficiary {
            return Err(EscrowError::Unauthorized {
                caller: caller.clone(),
                action: "refund".to_string(),
                job_id,
            });
        }
        let entry = self.require_state(job_id, EscrowState::Funded, "refund")?;
        let settlement = Settlement {
            job_id,
            currency: entry.currency.clone(),
            payouts: vec![Payout {
                to: entry.depositor.clone(),
                amount: entry.amount,
                kind: PayoutKind::Depositor,
            }],
            path: SettlementPath::Direct,
        };
        let from_state = entry.state;
        self.transition(job_id, EscrowState::Refunded);
        tracing::info!(job_id = %job_id, amount = settlement.total(), "escrow refunded");
        self.events.push(EscrowEvent::Refunded {
            event_id: EventId::new(),
            job_id,
            from_state,
            to_state: EscrowState::Refunded,
            settlement: settlement.clone(),
            at: Timestamp::now(),
        });
        Ok(settlement)
    }

    /// Freeze a funded entry under a dispute. Arbitrator-driven; prevents
    /// release or refund, and prevents opening a second dispute.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the entry is `Funded`.
    pub fn mark_disputed(&mut self, job_id: JobId) -> Result<(), EscrowError> {
        let entry = self.require_state(job_id, EscrowState::Funded, "dispute")?;
        let from_state = entry.state;
        self.transition(job_id, EscrowState::Disputed);
        tracing::info!(job_id = %job_id, "escrow disputed");
        self.events.push(EscrowEvent::Disputed {
            event_id: EventId::new(),
            job_id,
            from_state,
            to_state: EscrowState::Disputed,
            at: Timestamp::now(),
        });
        Ok(())
    }

    /// Execute a dispute resolution over a disputed entry.
    ///
    /// Arbitrator-driven; the terminal transition for disputed jobs.
    /// Split shares truncate toward the depositor, so the distributed
    /// payouts always sum to the deposited amount exactly.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the entry is `Disputed`.
    pub fn resolve(
        &mut self,
        job_id: JobId,
        outcome: ResolutionOutcome,
    ) -> Result<Settlement, EscrowError> {
        let entry = self.require_state(job_id, EscrowState::Disputed, "resolve")?;
        let (beneficiary_gross, depositor_amount) = match outcome {
            ResolutionOutcome::BeneficiaryFull => (entry.amount, 0),
            ResolutionOutcome::DepositorFull => (0, entry.amount),
            ResolutionOutcome::Split(ratio) => ratio.split_of(entry.amount),
        };
        let fee = match (outcome, self.fee_policy) {
            (ResolutionOutcome::DepositorFull, _) => 0,
            (ResolutionOutcome::Split(_), FeePolicy::WaiveOnSplit) => 0,
            _ => entry.fee_bps.of(beneficiary_gross),
        };

        let mut payouts = Vec::new();
        if beneficiary_gross - fee > 0 {
            payouts.push(Payout {
                to: entry.beneficiary.clone(),
                amount: beneficiary_gross - fee,
                kind: PayoutKind::Beneficiary,
            });
        }
        if depositor_amount > 0 {
            payouts.push(Payout {
                to: entry.depositor.clone(),
                amount: depositor_amount,
                kind: PayoutKind::Depositor,
            });
        }
        if fee > 0 {
            payouts.push(Payout {
                to: self.fee_collector.clone(),
                amount: fee,
                kind: PayoutKind::FeeCollector,
            });
        }
        let path = match entry.dest_chain {
            Some(chain) if beneficiary_gross > fee => SettlementPath::Bridged(chain),
            _ => SettlementPath::Direct,
        };
        let settlement = Settlement {
            job_id,
            currency: entry.currency.clone(),
            payouts,
            path,
        };
        let from_state = entry.state;
        self.transition(job_id, EscrowState::Resolved);
        tracing::info!(job_id = %job_id, outcome = %outcome, "escrow resolved");
        self.events.push(EscrowEvent::ResolvedByDispute {
            event_id: EventId::new(),
            job_id,
            from_state,
            to_state: EscrowState::Resolved,
            outcome,
            settlement: settlement.clone(),
            at: Timestamp::now(),
        });
        Ok(settlement)
    }

    /// Look up the live entry for a job.
    pub fn entry(&self, job_id: JobId) -> Option<&EscrowEntry> {
        self.entries.get(&job_id)
    }

    /// Terminal entries displaced by re-funded job identifiers.
    pub fn archive(&self) -> &[EscrowEntry] {
        &self.archive
    }

    /// Access the append-only event log.
    pub fn events(&self) -> &[EscrowEvent] {
        &self.events
    }

    /// The configured fee collector.
    pub fn fee_collector(&self) -> &AccountId {
        &self.fee_collector
    }

    // ─── Internal helpers ────────────────────────────────────────────

    fn release_inner(&mut self, job_id: JobId) -> Result<Settlement, EscrowError> {
        let entry = self.require_state(job_id, EscrowState::Funded, "release")?;
        let fee = entry.fee_bps.of(entry.amount);
        let mut payouts = Vec::new();
        if entry.amount - fee > 0 {
            payouts.push(Payout {
                to: entry.beneficiary.clone(),
                amount: entry.amount - fee,
                kind: PayoutKind::Beneficiary,
            });
        }
        if fee > 0 {
            payouts.push(Payout {
                to: self.fee_collector.clone(),
                amount: fee,
                kind: PayoutKind::FeeCollector,
            });
        }
        let path = match entry.dest_chain {
            Some(chain) if entry.amount > fee => SettlementPath::Bridged(chain),
            _ => SettlementPath::Direct,
        };
        let settlement = Settlement {
            job_id,
            currency: entry.currency.clone(),
            payouts,
            path,
        };
        let from_state = entry.state;
        self.transition(job_id, EscrowState::Released);
        tracing::info!(job_id = %job_id, amount = settlement.total(), "escrow released");
        self.events.push(EscrowEvent::Released {
            event_id: EventId::new(),
            job_id,
            from_state,
            to_state: EscrowState::Released,
            settlement: settlement.clone(),
            at: Timestamp::now(),
        });
        Ok(settlement)
    }

    fn require_entry(&self, job_id: JobId) -> Result<&EscrowEntry, EscrowError> {
        self.entries
            .get(&job_id)
            .ok_or(EscrowError::UnknownJob { job_id })
    }

    fn require_state(
        &self,
        job_id: JobId,
        expected: EscrowState,
        action: &str,
    ) -> Result<&EscrowEntry, EscrowError> {
        let entry = self.require_entry(job_id)?;
        if entry.state != expected {
            return Err(EscrowError::InvalidState {
                job_id,
                state: entry.state,
                action: action.to_string(),
            });
        }
        Ok(entry)
    }

    fn transition(&mut self, job_id: JobId, to: EscrowState) {
        // Callers verify existence via require_state first.
        if let Some(entry) = self.entries.get_mut(&job_id) {
            entry.state = to;
            entry.updated_at = Timestamp::now();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
