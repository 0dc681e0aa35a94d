//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers of the settlement core. These
//! prevent accidental identifier confusion: you cannot pass a `ChainId`
//! where a `JobId` is expected, and an `AccountId` cannot be built from an
//! empty string.
//!
//! ## Security Invariant
//!
//! Type-level distinction between identifier namespaces prevents
//! cross-namespace confusion where one kind of identifier is substituted
//! for another in a funds-moving call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Caller-supplied job identifier, unique per origin chain.
///
/// The marketplace assigns these; the core only requires uniqueness among
/// non-terminal escrow entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

/// A chain-native account reference (depositor, beneficiary, relayer,
/// resolver, fee collector).
///
/// Kept as an opaque validated string so the core stays agnostic to any
/// particular chain's address format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

/// Identifier of a ledger execution environment (origin or destination
/// chain of a bridge message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u64);

/// Unique identifier for an audit event record.
///
/// Synthetic; every emitted event gets a fresh one so downstream consumers
/// can deduplicate re-read event logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl JobId {
    /// Access the raw job number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl EventId {
    /// Generate a new random event identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountId {
    /// Create an account reference from a chain-native address string.
    ///
    /// # Errors
    ///
    /// Rejects empty or whitespace-only input. No further format checks are
    /// applied; address validity is the execution environment's concern.
    pub fn new(address: impl Into<String>) -> Result<Self, CoreError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier {
                reason: "account address must not be empty".to_string(),
            });
        }
        Ok(Self(address))
    }

    /// Access the underlying address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ChainId {
    /// Access the raw chain number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job:{}", self.0)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event:{}", self.0)
    }
}
