//! # worklock-settlement — The Settlement Engine
//!
//! Composes the four components behind a single façade: the access
//! registry authorizes, the escrow ledger moves funds, the arbitrator
//! handles disputes, and the bridge relay carries cross-chain payouts.
//!
//! The engine is the only place the components meet. Each component stays
//! ignorant of the others; the engine routes between them, for example by
//! handing a `Bridged` settlement's beneficiary leg to the relay.
//!
//! ## Crate Policy
//!
//! - The engine adds no business rules of its own beyond routing and the
//!   percent-to-basis-points conversion at the admin boundary.
//! - Every mutating call is atomic: it either completes in full or leaves
//!   all four components untouched.

pub mod engine;
pub mod instruction;

pub use engine::{EngineConfig, EngineError, ResolutionChoice, SettlementEngine, SettlementReceipt};
pub use instruction::{apply, apply_script, Instruction, Outcome};

pub use worklock_access::Role;
