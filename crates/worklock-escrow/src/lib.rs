//! # worklock-escrow — Fund Custody Ledger
//!
//! Custodies a job's funds from deposit until one terminal outcome:
//! release to the beneficiary, refund to the depositor, or an adjudicated
//! split. The ledger is the single locus of truth for balance movements;
//! the arbitrator and the bridge relay never move funds themselves, they
//! invoke ledger operations.
//!
//! ## State Machine (per entry)
//!
//! ```text
//! Funded ──release()──▶ Released
//!   │
//!   ├──refund()───────▶ Refunded
//!   │
//!   └──mark_disputed()▶ Disputed ──resolve()──▶ Resolved
//! ```
//!
//! `Released`, `Refunded`, and `Resolved` are terminal; no transition
//! leaves them.
//!
//! ## Crate Policy
//!
//! - Fee arithmetic is exact: payouts always sum to the deposited amount.
//! - Rejected calls mutate nothing; there is no partially-applied entry.

pub mod entry;
pub mod ledger;

pub use entry::{EscrowEntry, EscrowState};
pub use ledger::{
    DepositRequest, EscrowError, EscrowEvent, EscrowLedger, FeePolicy, Payout, PayoutKind,
    ResolutionOutcome, Settlement, SettlementPath,
};
