//! # Transfer Messages
//!
//! The wire-level record a relay carries between chains: the transfer
//! payload, the escrow entry it settles, and the attestations gathered on
//! the destination side.

use serde::{Deserialize, Serialize};

use worklock_core::{sha256_digest, AccountId, ChainId, ContentDigest, Currency, JobId, Timestamp};

/// The lifecycle status of a transfer message on the destination relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    /// Ingested; collecting attestations.
    Pending,
    /// Executed after quorum (terminal).
    Executed,
}

impl MessageStatus {
    /// Returns the canonical status name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Executed => "EXECUTED",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the destination chain pays out when the message executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    /// The destination-side recipient.
    pub recipient: AccountId,
    /// Amount to deliver, in the currency's smallest unit.
    pub amount: u64,
    /// Currency of the transfer.
    pub currency: Currency,
}

/// One relayer's attestation over a pending message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attestation {
    /// The attesting relayer.
    pub relayer: AccountId,
    /// When the attestation landed.
    pub attested_at: Timestamp,
    /// Digest binding the relayer to the message content. Stands in for a
    /// signature.
    pub signature_digest: ContentDigest,
}

/// A cross-chain transfer message, identified by `(origin_chain, nonce)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeMessage {
    /// Monotonic per-origin sequence number.
    pub nonce: u64,
    /// Chain the transfer originated on.
    pub origin_chain: ChainId,
    /// Chain the payout lands on.
    pub dest_chain: ChainId,
    /// The escrow entry this transfer settles.
    pub escrow_ref: JobId,
    /// The payout to deliver.
    pub payload: TransferPayload,
    /// Relay fee already withheld on the origin side. Informational.
    pub fee_amount: u64,
    /// Attestations gathered on the destination side, in arrival order.
    pub attestations: Vec<Attestation>,
    /// Current lifecycle status.
    pub status: MessageStatus,
}

impl BridgeMessage {
    /// Digest over the immutable message content. Attestations sign this.
    pub fn content_digest(&self) -> ContentDigest {
        let mut buf = Vec::with_capacity(128);
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&self.origin_chain.0.to_be_bytes());
        buf.extend_from_slice(&self.dest_chain.0.to_be_bytes());
        buf.extend_from_slice(&self.escrow_ref.0.to_be_bytes());
        buf.extend_from_slice(self.payload.recipient.as_str().as_bytes());
        buf.push(0);
        buf.extend_from_slice(&self.payload.amount.to_be_bytes());
        buf.extend_from_slice(self.payload.currency.to_string().as_bytes());
        buf.push(0);
        buf.extend_from_slice(&self.fee_amount.to_be_bytes());
        sha256_digest(&buf)
    }

    /// The simulated signature a relayer produces over this message.
    pub fn attestation_digest(&self, relayer: &AccountId) -> ContentDigest {
        let content = self.content_digest();
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&content.bytes);
        buf.extend_from_slice(relayer.as_str().as_bytes());
        sha256_digest(&buf)
    }

    /// Whether `relayer` has already attested this message.
    pub fn has_attested(&self, relayer: &AccountId) -> bool {
        self.attestations.iter().any(|a| &a.relayer == relayer)
    }
}
