//! # Evidence and Message Records
//!
//! Append-only, attributed records accumulated while a dispute is open.
//! Insertion order is the only ordering guarantee; nothing is mutated or
//! deleted after it lands.
//!
//! Payload content is referenced by digest rather than stored, so the
//! dispute record stays small and a submitted exhibit cannot be rewritten
//! later. The cumulative size of the inline parts (message bodies, URIs)
//! is capped per dispute to bound storage cost.

use serde::{Deserialize, Serialize};

use worklock_core::{AccountId, ContentDigest, Timestamp};

/// Cap on the cumulative inline payload (message bodies, reasons, URIs)
/// a single dispute may accumulate.
pub const MAX_DISPUTE_PAYLOAD_BYTES: usize = 64 * 1024;

/// One submitted exhibit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Who submitted the exhibit.
    pub submitter: AccountId,
    /// When it was submitted.
    pub submitted_at: Timestamp,
    /// Digest of the exhibit content.
    pub content_digest: ContentDigest,
    /// Optional retrieval hint (e.g. an IPFS URI). Not interpreted by the
    /// core.
    pub uri: Option<String>,
    /// Digests of any attachments.
    pub attachments: Vec<ContentDigest>,
}

impl Evidence {
    /// Bytes this record contributes to the dispute's inline payload.
    pub(crate) fn inline_len(&self) -> usize {
        self.uri.as_ref().map_or(0, |u| u.len())
    }
}

/// One message posted to the dispute thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeMessage {
    /// Who posted the message.
    pub sender: AccountId,
    /// When it was posted.
    pub sent_at: Timestamp,
    /// Message body.
    pub body: String,
}

impl DisputeMessage {
    /// Bytes this record contributes to the dispute's inline payload.
    pub(crate) fn inline_len(&self) -> usize {
        self.body.len()
    }
}
