//! # worklock-arbitration — Dispute Arbitration
//!
//! Opens disputes against funded escrow entries, accumulates evidence and
//! messages from the parties, and executes a single terminal resolution
//! that drives the escrow ledger.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──begin_review()──▶ Reviewing
//!    │                           │
//!    └────────resolve()──────────┴──▶ Resolved (terminal)
//! ```
//!
//! The arbitrator never holds funds. Resolution authorizes a transition
//! that the ledger executes; the dispute record is retained immutably
//! afterward as the audit trail.
//!
//! ## Crate Policy
//!
//! - Authorization goes through `worklock-access`; no local role storage.
//! - Evidence and messages are append-only and never mutated after
//!   insertion.

pub mod arbitrator;
pub mod dispute;
pub mod evidence;

pub use arbitrator::{DisputeArbitrator, DisputeError};
pub use dispute::{Dispute, DisputeStatus, ResolutionRecord};
pub use evidence::{DisputeMessage, Evidence, MAX_DISPUTE_PAYLOAD_BYTES};
