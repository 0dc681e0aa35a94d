//! # Settlement Engine
//!
//! The composition root. Owns one instance of each component and routes
//! between them: authorization checks go to the registry, fund movements
//! to the ledger, dispute lifecycle to the arbitrator, and any `Bridged`
//! settlement's beneficiary leg to the relay.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use worklock_access::{AccessError, AccessRegistry, Role};
use worklock_arbitration::{Dispute, DisputeArbitrator, DisputeError};
use worklock_bridge::{BridgeError, BridgeMessage, BridgeRelay, TransferPayload};
use worklock_core::{AccountId, BasisPoints, ChainId, ContentDigest, JobId};
use worklock_escrow::{
    DepositRequest, EscrowEntry, EscrowError, EscrowLedger, FeePolicy, PayoutKind,
    ResolutionOutcome, Settlement, SettlementPath,
};

/// Errors from engine entry points. Component errors pass through
/// unchanged; the engine adds only the admin-boundary ratio check.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A split ratio outside 0..=100 percent.
    #[error("invalid ratio: split must be 0..=100 percent, got {percent}")]
    InvalidRatio {
        /// The rejected percentage.
        percent: u16,
    },

    /// The account lacks the role required for the action.
    #[error("unauthorized: {account} may not {action}")]
    Unauthorized {
        /// The rejected account.
        account: AccountId,
        /// What was attempted.
        action: String,
    },

    /// Access registry rejection.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Escrow ledger rejection.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Arbitration rejection.
    #[error(transparent)]
    Dispute(#[from] DisputeError),

    /// Bridge relay rejection.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// The resolutions the admin surface may request, in its own vocabulary.
/// Converted to a ledger outcome at the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionChoice {
    /// Award everything to the freelancer.
    ReleaseToFreelancer,
    /// Return everything to the client.
    RefundToClient,
    /// Award the given percentage to the freelancer, the rest to the
    /// client.
    Split {
        /// Freelancer share, 0..=100.
        ratio_percent: u16,
    },
}

impl ResolutionChoice {
    /// Convert to the ledger's outcome vocabulary.
    fn to_outcome(self) -> Result<ResolutionOutcome, EngineError> {
        match self {
            Self::ReleaseToFreelancer => Ok(ResolutionOutcome::BeneficiaryFull),
            Self::RefundToClient => Ok(ResolutionOutcome::DepositorFull),
            Self::Split { ratio_percent } => BasisPoints::from_percent(ratio_percent)
                .map(ResolutionOutcome::Split)
                .map_err(|_| EngineError::InvalidRatio {
                    percent: ratio_percent,
                }),
        }
    }
}

/// Deployment configuration for an engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seeded as the first Admin.
    pub bootstrap_admin: AccountId,
    /// Receives the platform fee.
    pub fee_collector: AccountId,
    /// Fee treatment on split resolutions.
    #[serde(default)]
    pub fee_policy: FeePolicy,
    /// The chain this engine settles on.
    pub origin_chain: ChainId,
    /// Relayer attestations required to execute an inbound transfer.
    pub quorum: usize,
}

/// A terminal settlement plus the bridge handoff, if one was made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// The payouts the ledger produced.
    pub settlement: Settlement,
    /// Nonce of the outbound transfer message, when the beneficiary leg
    /// went over the bridge.
    pub bridge_nonce: Option<u64>,
}

/// One engine instance per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementEngine {
    registry: AccessRegistry,
    ledger: EscrowLedger,
    arbitrator: DisputeArbitrator,
    relay: BridgeRelay,
}

impl SettlementEngine {
    /// Build an engine from deployment configuration.
    pub fn new(config: EngineConfig) -> Self {
        tracing::info!(
            admin = %config.bootstrap_admin,
            fee_collector = %config.fee_collector,
            origin_chain = %config.origin_chain,
            quorum = config.quorum,
            "engine initialized"
        );
        Self {
            registry: AccessRegistry::bootstrap(config.bootstrap_admin),
            ledger: EscrowLedger::new(config.fee_collector, config.fee_policy),
            arbitrator: DisputeArbitrator::new(),
            relay: BridgeRelay::new(config.origin_chain, config.quorum),
        }
    }

    // ─── Access control ──────────────────────────────────────────────

    /// Grant `role` to `holder`, performed by `actor`.
    pub fn grant_role(
        &mut self,
        actor: &AccountId,
        role: Role,
        holder: AccountId,
    ) -> Result<(), EngineError> {
        Ok(self.registry.grant_role(actor, role, holder)?)
    }

    /// Revoke `role` from `holder`, performed by `actor`.
    pub fn revoke_role(
        &mut self,
        actor: &AccountId,
        role: Role,
        holder: &AccountId,
    ) -> Result<(), EngineError> {
        Ok(self.registry.revoke_role(actor, role, holder)?)
    }

    // ─── Escrow ──────────────────────────────────────────────────────

    /// Lock funds into a new escrow entry.
    pub fn deposit(&mut self, request: DepositRequest) -> Result<&EscrowEntry, EngineError> {
        Ok(self.ledger.deposit(request)?)
    }

    /// Release an entry to its beneficiary, at the depositor's request.
    ///
    /// A `Bridged` settlement's beneficiary leg is handed to the relay as
    /// an outbound transfer message.
    pub fn release(
        &mut self,
        job_id: JobId,
        caller: &AccountId,
    ) -> Result<SettlementReceipt, EngineError> {
        let settlement = self.ledger.release(job_id, caller)?;
        self.route(settlement)
    }

    /// Release an entry on the strength of a relayer attestation, without
    /// the depositor acting locally.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `relayer` holds the Relayer role.
    pub fn relayed_release(
        &mut self,
        job_id: JobId,
        relayer: &AccountId,
    ) -> Result<SettlementReceipt, EngineError> {
        if !self.registry.has_role(Role::Relayer, relayer) {
            return Err(EngineError::Unauthorized {
                account: relayer.clone(),
                action: format!("release {job_id} by attestation"),
            });
        }
        let settlement = self.ledger.release_attested(job_id)?;
        self.route(settlement)
    }

    /// Refund an entry to its depositor, at the beneficiary's request.
    /// Refunds always settle locally.
    pub fn refund(
        &mut self,
        job_id: JobId,
        caller: &AccountId,
    ) -> Result<SettlementReceipt, EngineError> {
        let settlement = self.ledger.refund(job_id, caller)?;
        Ok(SettlementReceipt {
            settlement,
            bridge_nonce: None,
        })
    }

    // ─── Disputes ────────────────────────────────────────────────────

    /// Open a dispute against a funded entry, freezing it.
    pub fn open_dispute(
        &mut self,
        job_id: JobId,
        initiator: AccountId,
        reason: String,
    ) -> Result<&Dispute, EngineError> {
        Ok(self
            .arbitrator
            .open_dispute(&mut self.ledger, job_id, initiator, reason)?)
    }

    /// Submit an exhibit to a live dispute.
    pub fn submit_evidence(
        &mut self,
        job_id: JobId,
        submitter: AccountId,
        content_digest: ContentDigest,
        uri: Option<String>,
        attachments: Vec<ContentDigest>,
    ) -> Result<(), EngineError> {
        Ok(self.arbitrator.submit_evidence(
            &self.registry,
            job_id,
            submitter,
            content_digest,
            uri,
            attachments,
        )?)
    }

    /// Post a message to a live dispute's thread.
    pub fn post_message(
        &mut self,
        job_id: JobId,
        sender: AccountId,
        body: String,
    ) -> Result<(), EngineError> {
        Ok(self
            .arbitrator
            .post_message(&self.registry, job_id, sender, body)?)
    }

    /// Mark a pending dispute as under review.
    pub fn begin_review(&mut self, job_id: JobId, resolver: &AccountId) -> Result<(), EngineError> {
        Ok(self.arbitrator.begin_review(&self.registry, job_id, resolver)?)
    }

    /// Execute a resolution chosen at the admin surface.
    ///
    /// The percentage vocabulary is converted to basis points here; the
    /// ledger and arbitrator only ever see the typed outcome.
    pub fn resolve_dispute(
        &mut self,
        job_id: JobId,
        resolver: AccountId,
        choice: ResolutionChoice,
        admin_notes: Option<String>,
    ) -> Result<SettlementReceipt, EngineError> {
        let outcome = choice.to_outcome()?;
        let settlement = self.arbitrator.resolve(
            &mut self.ledger,
            &self.registry,
            job_id,
            resolver,
            outcome,
            admin_notes,
        )?;
        self.route(settlement)
    }

    // ─── Bridge ──────────────────────────────────────────────────────

    /// Ingest a transfer message arriving from another chain.
    pub fn ingest_message(&mut self, message: BridgeMessage) -> Result<(), EngineError> {
        Ok(self.relay.ingest(message)?)
    }

    /// Record a relayer attestation over a pending message.
    pub fn attest_transfer(
        &mut self,
        origin_chain: ChainId,
        nonce: u64,
        relayer: AccountId,
    ) -> Result<(), EngineError> {
        Ok(self.relay.attest(&self.registry, origin_chain, nonce, relayer)?)
    }

    /// Execute an inbound message whose quorum is met.
    pub fn execute_transfer(
        &mut self,
        origin_chain: ChainId,
        nonce: u64,
    ) -> Result<TransferPayload, EngineError> {
        Ok(self.relay.execute(origin_chain, nonce)?)
    }

    // ─── Read surface ────────────────────────────────────────────────

    /// The access registry.
    pub fn registry(&self) -> &AccessRegistry {
        &self.registry
    }

    /// The escrow ledger.
    pub fn ledger(&self) -> &EscrowLedger {
        &self.ledger
    }

    /// The dispute arbitrator.
    pub fn arbitrator(&self) -> &DisputeArbitrator {
        &self.arbitrator
    }

    /// The bridge relay.
    pub fn relay(&self) -> &BridgeRelay {
        &self.relay
    }

    // ─── Internal helpers ────────────────────────────────────────────

    /// Hand a `Bridged` settlement's beneficiary leg to the relay.
    ///
    /// The ledger only marks a settlement `Bridged` when the beneficiary
    /// leg is positive, so initiation cannot fail on amount.
    fn route(&mut self, settlement: Settlement) -> Result<SettlementReceipt, EngineError> {
        let bridge_nonce = match settlement.path {
            SettlementPath::Direct => None,
            SettlementPath::Bridged(dest_chain) => {
                let leg = settlement
                    .payout(PayoutKind::Beneficiary)
                    .ok_or(BridgeError::InvalidAmount)?;
                let fee_amount = settlement
                    .payout(PayoutKind::FeeCollector)
                    .map_or(0, |p| p.amount);
                let message = self.relay.initiate_transfer(
                    dest_chain,
                    settlement.job_id,
                    TransferPayload {
                        recipient: leg.to.clone(),
                        amount: leg.amount,
                        currency: settlement.currency.clone(),
                    },
                    fee_amount,
                )?;
                Some(message.nonce)
            }
        };
        Ok(SettlementReceipt {
            settlement,
            bridge_nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worklock_core::Currency;
    use worklock_escrow::EscrowState;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn engine() -> SettlementEngine {
        SettlementEngine::new(EngineConfig {
            bootstrap_admin: acct("admin"),
            fee_collector: acct("fee-collector"),
            fee_policy: FeePolicy::default(),
            origin_chain: ChainId(1),
            quorum: 2,
        })
    }

    fn fund(engine: &mut SettlementEngine, job: u64, dest_chain: Option<ChainId>) {
        engine
            .deposit(DepositRequest {
                job_id: JobId(job),
                depositor: acct("client"),
                beneficiary: acct("freelancer"),
                amount: 1000,
                currency: Currency::Native,
                fee_bps: BasisPoints::new(500).unwrap(),
                dest_chain,
                deadline: None,
            })
            .unwrap();
    }

    #[test]
    fn test_bootstrap_seeds_admin() {
        let engine = engine();
        assert!(engine.registry().has_role(Role::Admin, &acct("admin")));
    }

    #[test]
    fn test_local_release_has_no_bridge_nonce() {
        let mut engine = engine();
        fund(&mut engine, 1, None);
        let receipt = engine.release(JobId(1), &acct("client")).unwrap();
        assert_eq!(receipt.bridge_nonce, None);
        assert_eq!(receipt.settlement.total(), 1000);
    }

    #[test]
    fn test_bridged_release_mints_transfer_message() {
        let mut engine = engine();
        fund(&mut engine, 1, Some(ChainId(137)));
        let receipt = engine.release(JobId(1), &acct("client")).unwrap();
        let nonce = receipt.bridge_nonce.unwrap();
        let message = engine.relay().message(ChainId(1), nonce).unwrap();
        assert_eq!(message.dest_chain, ChainId(137));
        assert_eq!(message.payload.amount, 950);
        assert_eq!(message.fee_amount, 50);
        assert_eq!(message.escrow_ref, JobId(1));
    }

    #[test]
    fn test_relayed_release_requires_relayer_role() {
        let mut engine = engine();
        fund(&mut engine, 1, None);
        let result = engine.relayed_release(JobId(1), &acct("stranger"));
        assert!(matches!(result, Err(EngineError::Unauthorized { .. })));
        engine
            .grant_role(&acct("admin"), Role::Relayer, acct("relayer-a"))
            .unwrap();
        let receipt = engine.relayed_release(JobId(1), &acct("relayer-a")).unwrap();
        assert_eq!(receipt.settlement.total(), 1000);
    }

    #[test]
    fn test_split_percent_converts_to_basis_points() {
        let mut engine = engine();
        fund(&mut engine, 1, None);
        engine
            .grant_role(&acct("admin"), Role::Resolver, acct("resolver"))
            .unwrap();
        engine
            .open_dispute(JobId(1), acct("client"), "late".to_string())
            .unwrap();
        let receipt = engine
            .resolve_dispute(
                JobId(1),
                acct("resolver"),
                ResolutionChoice::Split { ratio_percent: 30 },
                None,
            )
            .unwrap();
        // 30% of 1000 to the freelancer, minus the 5% fee on that leg.
        assert_eq!(
            receipt
                .settlement
                .payout(PayoutKind::Beneficiary)
                .unwrap()
                .amount,
            285
        );
        assert_eq!(
            receipt
                .settlement
                .payout(PayoutKind::Depositor)
                .unwrap()
                .amount,
            700
        );
    }

    #[test]
    fn test_split_over_100_percent_rejected() {
        let mut engine = engine();
        fund(&mut engine, 1, None);
        engine
            .grant_role(&acct("admin"), Role::Resolver, acct("resolver"))
            .unwrap();
        engine
            .open_dispute(JobId(1), acct("client"), "late".to_string())
            .unwrap();
        let result = engine.resolve_dispute(
            JobId(1),
            acct("resolver"),
            ResolutionChoice::Split { ratio_percent: 101 },
            None,
        );
        assert!(matches!(
            result,
            Err(EngineError::InvalidRatio { percent: 101 })
        ));
        // The rejected call left the dispute and the entry untouched.
        assert_eq!(
            engine.ledger().entry(JobId(1)).unwrap().state,
            EscrowState::Disputed
        );
    }

    #[test]
    fn test_resolution_choice_serde_vocabulary() {
        let json = r#"{"type":"SPLIT","ratio_percent":40}"#;
        let choice: ResolutionChoice = serde_json::from_str(json).unwrap();
        assert_eq!(choice, ResolutionChoice::Split { ratio_percent: 40 });
        let json = r#"{"type":"RELEASE_TO_FREELANCER"}"#;
        let choice: ResolutionChoice = serde_json::from_str(json).unwrap();
        assert_eq!(choice, ResolutionChoice::ReleaseToFreelancer);
    }
}
