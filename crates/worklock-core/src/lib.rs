//! # worklock-core — Foundational Types for the Settlement Core
//!
//! This crate is the bedrock of the Worklock stack. It defines the primitive
//! types every other crate in the workspace builds on; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `JobId`, `AccountId`,
//!    `ChainId`, `BasisPoints` are all newtypes with validated constructors.
//!    No bare integers or strings for identifiers or ratios.
//!
//! 2. **Integer money only.** Amounts are `u64` units of the escrowed asset;
//!    fee and split arithmetic widens to `u128` internally so overflow is
//!    unreachable for any pair of valid inputs. There are no floats anywhere
//!    in a funds path.
//!
//! 3. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision, so serialized audit records are
//!    byte-for-byte reproducible.
//!
//! 4. **Content digests for opaque payloads.** Evidence bodies and
//!    attestation signature payloads are referenced by SHA-256 digest, never
//!    stored as trusted content.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `worklock-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod digest;
pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use digest::{sha256_digest, ContentDigest};
pub use error::CoreError;
pub use identity::{AccountId, ChainId, EventId, JobId};
pub use money::{BasisPoints, Currency, BASIS_POINTS_SCALE};
pub use temporal::Timestamp;
