//! # Bridge Relay
//!
//! One relay instance per chain. The origin-side relay mints transfer
//! messages with monotonic nonces; the destination-side relay ingests
//! them, gathers relayer attestations, and executes each message exactly
//! once after quorum.
//!
//! ## Security Invariant
//!
//! A `(origin_chain, nonce)` pair is consumed permanently at execution.
//! The consumed set outlives the message record, so replay is impossible
//! even across re-ingestion attempts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use worklock_access::{AccessRegistry, Role};
use worklock_core::{AccountId, ChainId, JobId, Timestamp};

use crate::message::{Attestation, BridgeMessage, MessageStatus, TransferPayload};

/// Errors from relay entry points.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The account lacks the role required for the action.
    #[error("unauthorized: {account} may not {action}")]
    Unauthorized {
        /// The rejected account.
        account: AccountId,
        /// What was attempted.
        action: String,
    },

    /// No message exists for the `(origin_chain, nonce)` pair.
    #[error("no message from {origin_chain} with nonce {nonce}")]
    UnknownMessage {
        /// The claimed origin chain.
        origin_chain: ChainId,
        /// The claimed nonce.
        nonce: u64,
    },

    /// A message with this `(origin_chain, nonce)` pair was already
    /// ingested.
    #[error("message from {origin_chain} with nonce {nonce} already ingested")]
    DuplicateMessage {
        /// The duplicated origin chain.
        origin_chain: ChainId,
        /// The duplicated nonce.
        nonce: u64,
    },

    /// The message was not addressed to this relay's chain.
    #[error("message addressed to {dest_chain}, this relay serves {chain_id}")]
    WrongDestination {
        /// Where the message wanted to go.
        dest_chain: ChainId,
        /// The chain this relay serves.
        chain_id: ChainId,
    },

    /// The relayer has already attested this message.
    #[error("{relayer} has already attested message nonce {nonce}")]
    DuplicateAttestation {
        /// The repeating relayer.
        relayer: AccountId,
        /// The nonce in question.
        nonce: u64,
    },

    /// Not enough attestations to execute.
    #[error("quorum not met: have {have} attestations, need {need}")]
    QuorumNotMet {
        /// Attestations gathered so far.
        have: usize,
        /// The relay's quorum threshold.
        need: usize,
    },

    /// The message has already been executed.
    #[error("message from {origin_chain} with nonce {nonce} already executed")]
    AlreadyExecuted {
        /// The consumed origin chain.
        origin_chain: ChainId,
        /// The consumed nonce.
        nonce: u64,
    },

    /// A transfer must move a positive amount.
    #[error("transfer amount must be positive")]
    InvalidAmount,
}

/// A relay serving one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRelay {
    /// The chain this relay serves.
    chain_id: ChainId,
    /// Attestations required before a message may execute.
    quorum: usize,
    /// Next nonce to assign to an outbound message.
    next_nonce: u64,
    /// Messages known to this relay, outbound and ingested, in arrival
    /// order. At most one per `(origin_chain, nonce)` pair.
    messages: Vec<BridgeMessage>,
    /// Permanently consumed message identities.
    consumed: HashSet<(ChainId, u64)>,
}

impl BridgeRelay {
    /// Create a relay for `chain_id` requiring `quorum` attestations.
    ///
    /// A quorum of zero is clamped to one; an unattested message must
    /// never execute.
    pub fn new(chain_id: ChainId, quorum: usize) -> Self {
        Self {
            chain_id,
            quorum: quorum.max(1),
            next_nonce: 0,
            messages: Vec::new(),
            consumed: HashSet::new(),
        }
    }

    /// The chain this relay serves.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// The attestation threshold.
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Mint an outbound transfer message bound for `dest_chain`.
    ///
    /// Called by the settlement engine when a release or resolution
    /// produces a bridged payout; authorization happened upstream in the
    /// ledger. Nonces are assigned monotonically and never reused, even
    /// if a later step fails.
    pub fn initiate_transfer(
        &mut self,
        dest_chain: ChainId,
        escrow_ref: JobId,
        payload: TransferPayload,
        fee_amount: u64,
    ) -> Result<&BridgeMessage, BridgeError> {
        if payload.amount == 0 {
            return Err(BridgeError::InvalidAmount);
        }
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        let message = BridgeMessage {
            nonce,
            origin_chain: self.chain_id,
            dest_chain,
            escrow_ref,
            payload,
            fee_amount,
            attestations: Vec::new(),
            status: MessageStatus::Pending,
        };
        tracing::info!(
            nonce,
            origin_chain = %self.chain_id,
            dest_chain = %dest_chain,
            escrow_ref = %escrow_ref,
            "transfer initiated"
        );
        self.messages.push(message);
        // Just pushed, so the vec is non-empty.
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Ingest a message arriving from another chain.
    ///
    /// Destination-side intake. Attestations carried on the inbound copy
    /// are discarded; this relay's relayers attest locally.
    ///
    /// # Errors
    ///
    /// `WrongDestination` if the message is not addressed to this chain;
    /// `AlreadyExecuted` if its identity was consumed here;
    /// `DuplicateMessage` if it is already pending here.
    pub fn ingest(&mut self, mut message: BridgeMessage) -> Result<(), BridgeError> {
        if message.dest_chain != self.chain_id {
            return Err(BridgeError::WrongDestination {
                dest_chain: message.dest_chain,
                chain_id: self.chain_id,
            });
        }
        let key = (message.origin_chain, message.nonce);
        if self.consumed.contains(&key) {
            return Err(BridgeError::AlreadyExecuted {
                origin_chain: key.0,
                nonce: key.1,
            });
        }
        if self.message(key.0, key.1).is_some() {
            return Err(BridgeError::DuplicateMessage {
                origin_chain: key.0,
                nonce: key.1,
            });
        }
        message.attestations.clear();
        message.status = MessageStatus::Pending;
        tracing::info!(
            nonce = key.1,
            origin_chain = %key.0,
            escrow_ref = %message.escrow_ref,
            "message ingested"
        );
        self.messages.push(message);
        Ok(())
    }

    /// Record a relayer's attestation over a pending message.
    ///
    /// Only messages addressed to this relay's chain are attestable; the
    /// outbound copy retained by `initiate_transfer` on the origin relay
    /// is an audit record, not an execution candidate.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the Relayer role; `WrongDestination` for a
    /// message not addressed to this chain; `DuplicateAttestation` if
    /// this relayer already attested; `AlreadyExecuted` if the message
    /// has executed.
    pub fn attest(
        &mut self,
        registry: &AccessRegistry,
        origin_chain: ChainId,
        nonce: u64,
        relayer: AccountId,
    ) -> Result<(), BridgeError> {
        if !registry.has_role(Role::Relayer, &relayer) {
            return Err(BridgeError::Unauthorized {
                account: relayer,
                action: "attest a transfer message".to_string(),
            });
        }
        let chain_id = self.chain_id;
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.origin_chain == origin_chain && m.nonce == nonce)
            .ok_or(BridgeError::UnknownMessage { origin_chain, nonce })?;
        if message.dest_chain != chain_id {
            return Err(BridgeError::WrongDestination {
                dest_chain: message.dest_chain,
                chain_id,
            });
        }
        if message.status == MessageStatus::Executed {
            return Err(BridgeError::AlreadyExecuted { origin_chain, nonce });
        }
        if message.has_attested(&relayer) {
            return Err(BridgeError::DuplicateAttestation { relayer, nonce });
        }
        let signature_digest = message.attestation_digest(&relayer);
        tracing::info!(nonce, origin_chain = %origin_chain, relayer = %relayer, "attestation recorded");
        message.attestations.push(Attestation {
            relayer,
            attested_at: Timestamp::now(),
            signature_digest,
        });
        Ok(())
    }

    /// Execute a message whose quorum is met, returning its payload for
    /// delivery.
    ///
    /// Only the relay serving the message's destination chain may execute
    /// it; consumes the `(origin_chain, nonce)` identity permanently.
    ///
    /// # Errors
    ///
    /// `WrongDestination` for a message not addressed to this chain;
    /// `QuorumNotMet` with the current and required counts;
    /// `AlreadyExecuted` on any later call for the same identity.
    pub fn execute(
        &mut self,
        origin_chain: ChainId,
        nonce: u64,
    ) -> Result<TransferPayload, BridgeError> {
        let key = (origin_chain, nonce);
        if self.consumed.contains(&key) {
            return Err(BridgeError::AlreadyExecuted { origin_chain, nonce });
        }
        let chain_id = self.chain_id;
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.origin_chain == origin_chain && m.nonce == nonce)
            .ok_or(BridgeError::UnknownMessage { origin_chain, nonce })?;
        if message.dest_chain != chain_id {
            return Err(BridgeError::WrongDestination {
                dest_chain: message.dest_chain,
                chain_id,
            });
        }
        let have = message.attestations.len();
        if have < self.quorum {
            return Err(BridgeError::QuorumNotMet {
                have,
                need: self.quorum,
            });
        }
        message.status = MessageStatus::Executed;
        self.consumed.insert(key);
        tracing::info!(
            nonce,
            origin_chain = %origin_chain,
            recipient = %message.payload.recipient,
            amount = message.payload.amount,
            "message executed"
        );
        Ok(message.payload.clone())
    }

    /// Look up a message by its identity.
    pub fn message(&self, origin_chain: ChainId, nonce: u64) -> Option<&BridgeMessage> {
        self.messages
            .iter()
            .find(|m| m.origin_chain == origin_chain && m.nonce == nonce)
    }

    /// Whether the identity has been executed here.
    pub fn is_consumed(&self, origin_chain: ChainId, nonce: u64) -> bool {
        self.consumed.contains(&(origin_chain, nonce))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use worklock_core::Currency;

    const ORIGIN: ChainId = ChainId(1);
    const DEST: ChainId = ChainId(137);

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn payload(amount: u64) -> TransferPayload {
        TransferPayload {
            recipient: acct("freelancer"),
            amount,
            currency: Currency::Native,
        }
    }

    fn registry_with_relayers() -> AccessRegistry {
        let admin = acct("admin");
        let mut registry = AccessRegistry::bootstrap(admin.clone());
        for r in ["relayer-a", "relayer-b", "relayer-c"] {
            registry.grant_role(&admin, Role::Relayer, acct(r)).unwrap();
        }
        registry
    }

    /// Origin relay mints a message; destination relay ingests it.
    fn delivered(quorum: usize) -> BridgeRelay {
        let mut origin = BridgeRelay::new(ORIGIN, 1);
        let message = origin
            .initiate_transfer(DEST, JobId(1), payload(950), 50)
            .unwrap()
            .clone();
        let mut dest = BridgeRelay::new(DEST, quorum);
        dest.ingest(message).unwrap();
        dest
    }

    // ── Initiation ───────────────────────────────────────────────────

    #[test]
    fn test_nonces_are_monotonic() {
        let mut relay = BridgeRelay::new(ORIGIN, 1);
        for expected in 0..3u64 {
            let m = relay
                .initiate_transfer(DEST, JobId(expected), payload(100), 0)
                .unwrap();
            assert_eq!(m.nonce, expected);
            assert_eq!(m.origin_chain, ORIGIN);
        }
    }

    #[test]
    fn test_zero_amount_transfer_rejected() {
        let mut relay = BridgeRelay::new(ORIGIN, 1);
        let result = relay.initiate_transfer(DEST, JobId(1), payload(0), 0);
        assert!(matches!(result, Err(BridgeError::InvalidAmount)));
    }

    #[test]
    fn test_zero_quorum_clamped_to_one() {
        assert_eq!(BridgeRelay::new(ORIGIN, 0).quorum(), 1);
    }

    // ── Ingestion ────────────────────────────────────────────────────

    #[test]
    fn test_ingest_rejects_wrong_destination() {
        let mut origin = BridgeRelay::new(ORIGIN, 1);
        let message = origin
            .initiate_transfer(DEST, JobId(1), payload(100), 0)
            .unwrap()
            .clone();
        let mut other = BridgeRelay::new(ChainId(999), 1);
        let result = other.ingest(message);
        assert!(matches!(result, Err(BridgeError::WrongDestination { .. })));
    }

    #[test]
    fn test_ingest_rejects_duplicate() {
        let mut origin = BridgeRelay::new(ORIGIN, 1);
        let message = origin
            .initiate_transfer(DEST, JobId(1), payload(100), 0)
            .unwrap()
            .clone();
        let mut dest = BridgeRelay::new(DEST, 1);
        dest.ingest(message.clone()).unwrap();
        let result = dest.ingest(message);
        assert!(matches!(result, Err(BridgeError::DuplicateMessage { .. })));
    }

    #[test]
    fn test_ingest_discards_inbound_attestations() {
        let mut origin = BridgeRelay::new(ORIGIN, 1);
        let mut message = origin
            .initiate_transfer(DEST, JobId(1), payload(100), 0)
            .unwrap()
            .clone();
        let digest = message.attestation_digest(&acct("forged"));
        message.attestations.push(Attestation {
            relayer: acct("forged"),
            attested_at: Timestamp::now(),
            signature_digest: digest,
        });
        let mut dest = BridgeRelay::new(DEST, 1);
        dest.ingest(message).unwrap();
        assert!(dest.message(ORIGIN, 0).unwrap().attestations.is_empty());
    }

    // ── Attestation ──────────────────────────────────────────────────

    #[test]
    fn test_attest_requires_relayer_role() {
        let mut dest = delivered(2);
        let registry = registry_with_relayers();
        let result = dest.attest(&registry, ORIGIN, 0, acct("stranger"));
        assert!(matches!(result, Err(BridgeError::Unauthorized { .. })));
    }

    #[test]
    fn test_duplicate_attestation_rejected() {
        let mut dest = delivered(2);
        let registry = registry_with_relayers();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-a")).unwrap();
        let result = dest.attest(&registry, ORIGIN, 0, acct("relayer-a"));
        assert!(matches!(result, Err(BridgeError::DuplicateAttestation { .. })));
        assert_eq!(dest.message(ORIGIN, 0).unwrap().attestations.len(), 1);
    }

    #[test]
    fn test_attestation_carries_binding_digest() {
        let mut dest = delivered(2);
        let registry = registry_with_relayers();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-a")).unwrap();
        let message = dest.message(ORIGIN, 0).unwrap();
        let expected = message.attestation_digest(&acct("relayer-a"));
        assert_eq!(message.attestations[0].signature_digest, expected);
    }

    #[test]
    fn test_attest_unknown_message_fails() {
        let mut dest = BridgeRelay::new(DEST, 1);
        let registry = registry_with_relayers();
        let result = dest.attest(&registry, ORIGIN, 99, acct("relayer-a"));
        assert!(matches!(result, Err(BridgeError::UnknownMessage { .. })));
    }

    // ── Execution ────────────────────────────────────────────────────

    #[test]
    fn test_execute_below_quorum_fails_with_counts() {
        let mut dest = delivered(2);
        let registry = registry_with_relayers();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-a")).unwrap();
        match dest.execute(ORIGIN, 0) {
            Err(BridgeError::QuorumNotMet { have, need }) => {
                assert_eq!(have, 1);
                assert_eq!(need, 2);
            }
            other => panic!("expected QuorumNotMet, got {other:?}"),
        }
        // Still pending; a later attestation can complete it.
        assert!(!dest.is_consumed(ORIGIN, 0));
    }

    #[test]
    fn test_execute_at_quorum_returns_payload() {
        let mut dest = delivered(2);
        let registry = registry_with_relayers();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-a")).unwrap();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-b")).unwrap();
        let delivered = dest.execute(ORIGIN, 0).unwrap();
        assert_eq!(delivered.recipient, acct("freelancer"));
        assert_eq!(delivered.amount, 950);
        assert!(dest.is_consumed(ORIGIN, 0));
        assert_eq!(
            dest.message(ORIGIN, 0).unwrap().status,
            MessageStatus::Executed
        );
    }

    #[test]
    fn test_execute_twice_fails() {
        let mut dest = delivered(1);
        let registry = registry_with_relayers();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-a")).unwrap();
        dest.execute(ORIGIN, 0).unwrap();
        let result = dest.execute(ORIGIN, 0);
        assert!(matches!(result, Err(BridgeError::AlreadyExecuted { .. })));
    }

    #[test]
    fn test_attest_after_execute_fails() {
        let mut dest = delivered(1);
        let registry = registry_with_relayers();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-a")).unwrap();
        dest.execute(ORIGIN, 0).unwrap();
        let result = dest.attest(&registry, ORIGIN, 0, acct("relayer-b"));
        assert!(matches!(result, Err(BridgeError::AlreadyExecuted { .. })));
    }

    #[test]
    fn test_outbound_copy_is_not_executable_on_origin() {
        // The origin relay keeps its outbound message as an audit record;
        // it must never collect attestations or execute there, or the
        // same transfer would apply on both chains.
        let mut origin = BridgeRelay::new(ORIGIN, 1);
        let message = origin
            .initiate_transfer(DEST, JobId(1), payload(950), 50)
            .unwrap()
            .clone();
        let registry = registry_with_relayers();

        let result = origin.attest(&registry, ORIGIN, 0, acct("relayer-a"));
        assert!(matches!(result, Err(BridgeError::WrongDestination { .. })));
        let result = origin.execute(ORIGIN, 0);
        assert!(matches!(result, Err(BridgeError::WrongDestination { .. })));
        assert!(!origin.is_consumed(ORIGIN, 0));

        // The destination relay remains the only place the transfer lands.
        let mut dest = BridgeRelay::new(DEST, 1);
        dest.ingest(message).unwrap();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-a")).unwrap();
        assert_eq!(dest.execute(ORIGIN, 0).unwrap().amount, 950);
        assert!(matches!(
            dest.execute(ORIGIN, 0),
            Err(BridgeError::AlreadyExecuted { .. })
        ));
    }

    #[test]
    fn test_reingest_after_execute_fails() {
        let mut origin = BridgeRelay::new(ORIGIN, 1);
        let message = origin
            .initiate_transfer(DEST, JobId(1), payload(100), 0)
            .unwrap()
            .clone();
        let mut dest = BridgeRelay::new(DEST, 1);
        dest.ingest(message.clone()).unwrap();
        let registry = registry_with_relayers();
        dest.attest(&registry, ORIGIN, 0, acct("relayer-a")).unwrap();
        dest.execute(ORIGIN, 0).unwrap();
        let result = dest.ingest(message);
        assert!(matches!(result, Err(BridgeError::AlreadyExecuted { .. })));
    }
}
