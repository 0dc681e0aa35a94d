//! # Error Types — Input Validation Failures
//!
//! Defines `CoreError`, the validation error type shared by the primitive
//! constructors in this crate. Component crates define their own error
//! enums; `CoreError` covers only what can go wrong while building the
//! primitives themselves.
//!
//! ## Design
//!
//! - Every variant names the rejected input so callers can report it
//!   without re-deriving context.
//! - All failures are rejected at construction; there is no deferred
//!   validation anywhere in the crate.

use thiserror::Error;

/// Validation error for core primitive construction.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An identifier string was empty or otherwise malformed.
    #[error("invalid identifier: {reason}")]
    InvalidIdentifier {
        /// Why the identifier was rejected.
        reason: String,
    },

    /// A basis-point ratio exceeded the 10000 (100%) scale.
    #[error("invalid basis points: {value} exceeds {max}", max = crate::money::BASIS_POINTS_SCALE)]
    InvalidBasisPoints {
        /// The rejected value.
        value: u16,
    },

    /// A timestamp string could not be parsed or was not UTC.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input string.
        input: String,
        /// Why the timestamp was rejected.
        reason: String,
    },
}
