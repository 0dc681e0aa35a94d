//! # worklock-bridge — Cross-Chain Relay
//!
//! Carries settlement payouts to a destination chain as attested transfer
//! messages. A message is identified by its `(origin_chain, nonce)` pair,
//! collects relayer attestations on the destination side, and executes
//! exactly once after a quorum is met.
//!
//! ## Lifecycle
//!
//! ```text
//! initiate_transfer()        ingest()          attest() × quorum
//!   origin relay  ──message──▶ dest relay ──▶ Pending ──▶ Executed
//!                                                          (terminal)
//! ```
//!
//! ## Security Invariant
//!
//! Execution permanently consumes the `(origin_chain, nonce)` pair. A
//! replayed or re-ingested message for a consumed pair is rejected even
//! after the executed record itself is gone.
//!
//! ## Crate Policy
//!
//! - Attestations are simulated signatures: a digest binding the relayer
//!   identity to the message content. No real cryptographic verification
//!   happens here.
//! - Relayer authorization goes through `worklock-access`.

pub mod message;
pub mod relay;

pub use message::{Attestation, BridgeMessage, MessageStatus, TransferPayload};
pub use relay::{BridgeError, BridgeRelay};
