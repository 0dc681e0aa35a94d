//! # Escrow Entry — Per-Job Custody Record
//!
//! One `EscrowEntry` exists per job identifier at a time. The entry is
//! funds-bearing from creation until a terminal state is reached, after
//! which it survives only as an immutable audit record.

use serde::{Deserialize, Serialize};

use worklock_core::{AccountId, BasisPoints, ChainId, Currency, JobId, Timestamp};

/// The lifecycle state of an escrow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowState {
    /// Funds are locked in custody; the job is in progress.
    Funded,
    /// A dispute is open against the entry; funds are frozen pending
    /// resolution.
    Disputed,
    /// Funds were paid out to the beneficiary (terminal).
    Released,
    /// Funds were returned in full to the depositor (terminal).
    Refunded,
    /// A dispute resolution distributed the funds (terminal).
    Resolved,
}

impl EscrowState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded | Self::Resolved)
    }

    /// Returns the canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Funded => "FUNDED",
            Self::Disputed => "DISPUTED",
            Self::Released => "RELEASED",
            Self::Refunded => "REFUNDED",
            Self::Resolved => "RESOLVED",
        }
    }
}

impl std::fmt::Display for EscrowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Custodial record for one job's locked funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowEntry {
    /// The job this entry custodies funds for.
    pub job_id: JobId,
    /// The client who locked the funds.
    pub depositor: AccountId,
    /// The freelancer the funds are destined for.
    pub beneficiary: AccountId,
    /// Locked amount, in units of `currency`.
    pub amount: u64,
    /// The asset the entry is denominated in.
    pub currency: Currency,
    /// Platform fee earmarked at deposit, deducted only at release time.
    pub fee_bps: BasisPoints,
    /// Destination chain for a cross-chain job; `None` settles on the
    /// origin chain.
    pub dest_chain: Option<ChainId>,
    /// Informational job deadline. The core stores and reports it but
    /// never acts on it; there is no automatic timeout-refund path.
    pub deadline: Option<Timestamp>,
    /// Current lifecycle state.
    pub state: EscrowState,
    /// When the entry was created.
    pub created_at: Timestamp,
    /// When the entry last changed state.
    pub updated_at: Timestamp,
}

impl EscrowEntry {
    /// Whether the entry has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether this job settles across chains.
    pub fn is_cross_chain(&self) -> bool {
        self.dest_chain.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!EscrowState::Funded.is_terminal());
        assert!(!EscrowState::Disputed.is_terminal());
        assert!(EscrowState::Released.is_terminal());
        assert!(EscrowState::Refunded.is_terminal());
        assert!(EscrowState::Resolved.is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(EscrowState::Funded.to_string(), "FUNDED");
        assert_eq!(EscrowState::Disputed.to_string(), "DISPUTED");
        assert_eq!(EscrowState::Resolved.to_string(), "RESOLVED");
    }

    #[test]
    fn test_state_serde_screaming_case() {
        let json = serde_json::to_string(&EscrowState::Released).unwrap();
        assert_eq!(json, "\"RELEASED\"");
    }
}
