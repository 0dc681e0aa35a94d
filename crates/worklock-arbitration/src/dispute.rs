//! # Dispute Record
//!
//! The per-job dispute: parties, reason, accumulated evidence and
//! messages, lifecycle status, and the terminal resolution record. The
//! record survives resolution as an immutable audit trail.

use serde::{Deserialize, Serialize};

use worklock_core::{AccountId, JobId, Timestamp};
use worklock_escrow::ResolutionOutcome;

use crate::evidence::{DisputeMessage, Evidence};

/// The lifecycle status of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    /// Opened; awaiting a resolver.
    Pending,
    /// A resolver has taken the case. Advisory state for external
    /// observers; evidence may still be submitted.
    Reviewing,
    /// A resolution has been executed (terminal).
    Resolved,
}

impl DisputeStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Whether the dispute still accepts evidence and messages.
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Pending | Self::Reviewing)
    }

    /// Returns the canonical status name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Reviewing => "REVIEWING",
            Self::Resolved => "RESOLVED",
        }
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The terminal resolution attached to a resolved dispute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// The executed outcome.
    pub outcome: ResolutionOutcome,
    /// The resolver who executed it.
    pub resolved_by: AccountId,
    /// When the resolution landed.
    pub resolved_at: Timestamp,
    /// Free-text notes from the resolver. Audit-only; never part of
    /// resolution logic.
    pub admin_notes: Option<String>,
}

/// A dispute opened against a funded escrow entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    /// The disputed job.
    pub job_id: JobId,
    /// The party who opened the dispute.
    pub initiator: AccountId,
    /// The other party to the escrow entry.
    pub respondent: AccountId,
    /// Why the dispute was opened.
    pub reason: String,
    /// Append-only exhibit sequence, in insertion order.
    pub evidence: Vec<Evidence>,
    /// Append-only message thread, in insertion order.
    pub messages: Vec<DisputeMessage>,
    /// Current lifecycle status.
    pub status: DisputeStatus,
    /// When the dispute was opened.
    pub opened_at: Timestamp,
    /// Set exactly once, when the dispute resolves.
    pub resolution: Option<ResolutionRecord>,
    /// Cumulative inline payload bytes accumulated so far.
    pub payload_bytes: usize,
}

impl Dispute {
    /// Whether `account` is the initiator or the respondent.
    pub fn is_party(&self, account: &AccountId) -> bool {
        account == &self.initiator || account == &self.respondent
    }
}
