//! # Dispute Arbitrator
//!
//! Opens disputes, accepts evidence and messages while a dispute is live,
//! and executes resolver-gated resolutions against the escrow ledger.
//!
//! ## Security Invariant
//!
//! Resolution is single-shot. The dispute status and the escrow state
//! machine both guard it: a second `resolve` fails here with
//! `AlreadyResolved` before the ledger is touched, and the ledger would
//! independently reject the re-entry because the entry has left
//! `Disputed`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use worklock_access::{AccessRegistry, Role};
use worklock_core::{AccountId, ContentDigest, JobId, Timestamp};
use worklock_escrow::{EscrowError, EscrowLedger, ResolutionOutcome, Settlement};

use crate::dispute::{Dispute, DisputeStatus, ResolutionRecord};
use crate::evidence::{DisputeMessage, Evidence, MAX_DISPUTE_PAYLOAD_BYTES};

/// Errors from arbitration entry points.
#[derive(Error, Debug)]
pub enum DisputeError {
    /// No dispute exists for the job.
    #[error("no dispute is open for {job_id}")]
    UnknownDispute {
        /// The job without a dispute.
        job_id: JobId,
    },

    /// A live dispute already exists for the job.
    #[error("a dispute already exists for {job_id}")]
    AlreadyDisputed {
        /// The already-disputed job.
        job_id: JobId,
    },

    /// The dispute has already been resolved.
    #[error("dispute for {job_id} is already resolved")]
    AlreadyResolved {
        /// The resolved job.
        job_id: JobId,
    },

    /// The dispute is not in a status that allows the action.
    #[error("cannot {action} dispute for {job_id} while {status}")]
    InvalidStatus {
        /// The target job.
        job_id: JobId,
        /// The dispute's current status.
        status: DisputeStatus,
        /// What was attempted.
        action: String,
    },

    /// The account lacks the role or party standing for the action.
    #[error("unauthorized: {account} may not {action}")]
    Unauthorized {
        /// The rejected account.
        account: AccountId,
        /// What was attempted.
        action: String,
    },

    /// The dispute's cumulative inline payload cap would be exceeded.
    #[error(
        "payload too large for dispute {job_id}: cap is {MAX_DISPUTE_PAYLOAD_BYTES} bytes"
    )]
    PayloadTooLarge {
        /// The capped job.
        job_id: JobId,
    },

    /// The underlying ledger rejected the operation.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}

/// Arbitrates disputes over escrow entries. Holds no funds; every fund
/// movement goes through the ledger it is handed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisputeArbitrator {
    /// Live and resolved disputes, at most one per job identifier.
    disputes: HashMap<JobId, Dispute>,
    /// Resolved disputes displaced when a re-funded job is disputed again.
    archive: Vec<Dispute>,
}

impl DisputeArbitrator {
    /// Create an arbitrator with no disputes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a dispute against a funded escrow entry.
    ///
    /// The initiator must be the entry's depositor or beneficiary; the
    /// other party becomes the respondent. Freezes the escrow entry.
    ///
    /// # Errors
    ///
    /// `AlreadyDisputed` if a live dispute exists; `Unauthorized` if the
    /// initiator is not a party; ledger errors if the entry is missing or
    /// not `Funded`.
    pub fn open_dispute(
        &mut self,
        ledger: &mut EscrowLedger,
        job_id: JobId,
        initiator: AccountId,
        reason: String,
    ) -> Result<&Dispute, DisputeError> {
        if let Some(existing) = self.disputes.get(&job_id) {
            if !existing.status.is_terminal() {
                return Err(DisputeError::AlreadyDisputed { job_id });
            }
        }
        if reason.len() > MAX_DISPUTE_PAYLOAD_BYTES {
            return Err(DisputeError::PayloadTooLarge { job_id });
        }
        let entry = ledger
            .entry(job_id)
            .ok_or(EscrowError::UnknownJob { job_id })?;
        let respondent = if initiator == entry.depositor {
            entry.beneficiary.clone()
        } else if initiator == entry.beneficiary {
            entry.depositor.clone()
        } else {
            return Err(DisputeError::Unauthorized {
                account: initiator,
                action: format!("open a dispute for {job_id}"),
            });
        };

        // All validation done; freeze the escrow, then record the dispute.
        ledger.mark_disputed(job_id)?;
        if let Some(displaced) = self.disputes.remove(&job_id) {
            self.archive.push(displaced);
        }
        let payload_bytes = reason.len();
        let dispute = Dispute {
            job_id,
            initiator: initiator.clone(),
            respondent,
            reason,
            evidence: Vec::new(),
            messages: Vec::new(),
            status: DisputeStatus::Pending,
            opened_at: Timestamp::now(),
            resolution: None,
            payload_bytes,
        };
        tracing::info!(job_id = %job_id, initiator = %initiator, "dispute opened");
        Ok(self.disputes.entry(job_id).or_insert(dispute))
    }

    /// Submit an exhibit to a live dispute.
    ///
    /// The submitter must be a party to the dispute or hold the Resolver
    /// role.
    pub fn submit_evidence(
        &mut self,
        registry: &AccessRegistry,
        job_id: JobId,
        submitter: AccountId,
        content_digest: ContentDigest,
        uri: Option<String>,
        attachments: Vec<ContentDigest>,
    ) -> Result<(), DisputeError> {
        let evidence = Evidence {
            submitter,
            submitted_at: Timestamp::now(),
            content_digest,
            uri,
            attachments,
        };
        let added = evidence.inline_len();
        let dispute = self.require_submittable(registry, job_id, &evidence.submitter, added)?;
        tracing::info!(job_id = %job_id, submitter = %evidence.submitter, "evidence submitted");
        dispute.payload_bytes += added;
        dispute.evidence.push(evidence);
        Ok(())
    }

    /// Post a message to a live dispute's thread.
    ///
    /// The sender must be a party to the dispute or hold the Resolver
    /// role.
    pub fn post_message(
        &mut self,
        registry: &AccessRegistry,
        job_id: JobId,
        sender: AccountId,
        body: String,
    ) -> Result<(), DisputeError> {
        let message = DisputeMessage {
            sender,
            sent_at: Timestamp::now(),
            body,
        };
        let added = message.inline_len();
        let dispute = self.require_submittable(registry, job_id, &message.sender, added)?;
        tracing::info!(job_id = %job_id, sender = %message.sender, "dispute message posted");
        dispute.payload_bytes += added;
        dispute.messages.push(message);
        Ok(())
    }

    /// Mark a pending dispute as under review.
    ///
    /// Advisory for external observers; resolution does not require it.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the Resolver role; `InvalidStatus` unless
    /// the dispute is `Pending`.
    pub fn begin_review(
        &mut self,
        registry: &AccessRegistry,
        job_id: JobId,
        resolver: &AccountId,
    ) -> Result<(), DisputeError> {
        require_role(registry, Role::Resolver, resolver, "begin review")?;
        let dispute = self
            .disputes
            .get_mut(&job_id)
            .ok_or(DisputeError::UnknownDispute { job_id })?;
        if dispute.status != DisputeStatus::Pending {
            return Err(DisputeError::InvalidStatus {
                job_id,
                status: dispute.status,
                action: "begin review of".to_string(),
            });
        }
        dispute.status = DisputeStatus::Reviewing;
        tracing::info!(job_id = %job_id, resolver = %resolver, "dispute under review");
        Ok(())
    }

    /// Execute a terminal resolution.
    ///
    /// Resolver-gated. Drives the ledger's resolve transition, then
    /// records the outcome, resolver, time, and notes on the dispute.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the Resolver role; `AlreadyResolved` on a
    /// second call; ledger errors if the entry has left `Disputed`.
    pub fn resolve(
        &mut self,
        ledger: &mut EscrowLedger,
        registry: &AccessRegistry,
        job_id: JobId,
        resolver: AccountId,
        outcome: ResolutionOutcome,
        admin_notes: Option<String>,
    ) -> Result<Settlement, DisputeError> {
        require_role(registry, Role::Resolver, &resolver, "resolve a dispute")?;
        let dispute = self
            .disputes
            .get_mut(&job_id)
            .ok_or(DisputeError::UnknownDispute { job_id })?;
        if dispute.status.is_terminal() {
            return Err(DisputeError::AlreadyResolved { job_id });
        }

        let settlement = ledger.resolve(job_id, outcome)?;
        dispute.status = DisputeStatus::Resolved;
        dispute.resolution = Some(ResolutionRecord {
            outcome,
            resolved_by: resolver.clone(),
            resolved_at: Timestamp::now(),
            admin_notes,
        });
        tracing::info!(job_id = %job_id, resolver = %resolver, outcome = %outcome, "dispute resolved");
        Ok(settlement)
    }

    /// Look up the dispute for a job.
    pub fn dispute(&self, job_id: JobId) -> Option<&Dispute> {
        self.disputes.get(&job_id)
    }

    /// Resolved disputes displaced by re-disputed job identifiers.
    pub fn archive(&self) -> &[Dispute] {
        &self.archive
    }

    // ─── Internal helpers ────────────────────────────────────────────

    /// Validate that the dispute accepts submissions from `account` and
    /// has room for `added` more inline bytes.
    fn require_submittable(
        &mut self,
        registry: &AccessRegistry,
        job_id: JobId,
        account: &AccountId,
        added: usize,
    ) -> Result<&mut Dispute, DisputeError> {
        let dispute = self
            .disputes
            .get_mut(&job_id)
            .ok_or(DisputeError::UnknownDispute { job_id })?;
        if !dispute.status.accepts_submissions() {
            return Err(DisputeError::AlreadyResolved { job_id });
        }
        if !dispute.is_party(account) && !registry.has_role(Role::Resolver, account) {
            return Err(DisputeError::Unauthorized {
                account: account.clone(),
                action: format!("submit to the dispute for {job_id}"),
            });
        }
        if dispute.payload_bytes + added > MAX_DISPUTE_PAYLOAD_BYTES {
            return Err(DisputeError::PayloadTooLarge { job_id });
        }
        Ok(dispute)
    }
}

fn require_role(
    registry: &AccessRegistry,
    role: Role,
    account: &AccountId,
    action: &str,
) -> Result<(), DisputeError> {
    if !registry.has_role(role, account) {
        return Err(DisputeError::Unauthorized {
            account: account.clone(),
            action: action.to_string(),
        });
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use worklock_core::{sha256_digest, BasisPoints, Currency};
    use worklock_escrow::{DepositRequest, EscrowState, FeePolicy, PayoutKind};

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn setup() -> (EscrowLedger, AccessRegistry, DisputeArbitrator) {
        let mut ledger = EscrowLedger::new(acct("fee-collector"), FeePolicy::default());
        ledger
            .deposit(DepositRequest {
                job_id: JobId(1),
                depositor: acct("client"),
                beneficiary: acct("freelancer"),
                amount: 1000,
                currency: Currency::Native,
                fee_bps: BasisPoints::new(500).unwrap(),
                dest_chain: None,
                deadline: None,
            })
            .unwrap();
        let mut registry = AccessRegistry::bootstrap(acct("admin"));
        registry
            .grant_role(&acct("admin"), Role::Resolver, acct("resolver"))
            .unwrap();
        (ledger, registry, DisputeArbitrator::new())
    }

    fn open(arb: &mut DisputeArbitrator, ledger: &mut EscrowLedger) {
        arb.open_dispute(ledger, JobId(1), acct("client"), "work not delivered".to_string())
            .unwrap();
    }

    // ── Opening ──────────────────────────────────────────────────────

    #[test]
    fn test_open_dispute_freezes_escrow_and_derives_respondent() {
        let (mut ledger, _registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        let dispute = arb.dispute(JobId(1)).unwrap();
        assert_eq!(dispute.status, DisputeStatus::Pending);
        assert_eq!(dispute.initiator, acct("client"));
        assert_eq!(dispute.respondent, acct("freelancer"));
        assert_eq!(ledger.entry(JobId(1)).unwrap().state, EscrowState::Disputed);
    }

    #[test]
    fn test_beneficiary_may_initiate() {
        let (mut ledger, _registry, mut arb) = setup();
        arb.open_dispute(&mut ledger, JobId(1), acct("freelancer"), "unpaid".to_string())
            .unwrap();
        let dispute = arb.dispute(JobId(1)).unwrap();
        assert_eq!(dispute.respondent, acct("client"));
    }

    #[test]
    fn test_third_party_cannot_initiate() {
        let (mut ledger, _registry, mut arb) = setup();
        let result = arb.open_dispute(&mut ledger, JobId(1), acct("stranger"), "x".to_string());
        assert!(matches!(result, Err(DisputeError::Unauthorized { .. })));
        assert_eq!(ledger.entry(JobId(1)).unwrap().state, EscrowState::Funded);
    }

    #[test]
    fn test_second_open_fails_already_disputed() {
        let (mut ledger, _registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        let result = arb.open_dispute(&mut ledger, JobId(1), acct("freelancer"), "x".to_string());
        assert!(matches!(result, Err(DisputeError::AlreadyDisputed { .. })));
    }

    #[test]
    fn test_open_against_released_escrow_fails() {
        let (mut ledger, _registry, mut arb) = setup();
        ledger.release(JobId(1), &acct("client")).unwrap();
        let result = arb.open_dispute(&mut ledger, JobId(1), acct("client"), "x".to_string());
        assert!(matches!(result, Err(DisputeError::Escrow(_))));
    }

    #[test]
    fn test_open_against_unknown_job_fails() {
        let (mut ledger, _registry, mut arb) = setup();
        let result = arb.open_dispute(&mut ledger, JobId(42), acct("client"), "x".to_string());
        assert!(matches!(
            result,
            Err(DisputeError::Escrow(EscrowError::UnknownJob { .. }))
        ));
    }

    // ── Evidence and messages ────────────────────────────────────────

    #[test]
    fn test_parties_and_resolver_may_submit_evidence() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        for who in ["client", "freelancer", "resolver"] {
            arb.submit_evidence(
                &registry,
                JobId(1),
                acct(who),
                sha256_digest(who.as_bytes()),
                None,
                vec![],
            )
            .unwrap();
        }
        assert_eq!(arb.dispute(JobId(1)).unwrap().evidence.len(), 3);
    }

    #[test]
    fn test_stranger_cannot_submit_evidence() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        let result = arb.submit_evidence(
            &registry,
            JobId(1),
            acct("stranger"),
            sha256_digest(b"x"),
            None,
            vec![],
        );
        assert!(matches!(result, Err(DisputeError::Unauthorized { .. })));
        assert!(arb.dispute(JobId(1)).unwrap().evidence.is_empty());
    }

    #[test]
    fn test_messages_preserve_insertion_order() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        arb.post_message(&registry, JobId(1), acct("client"), "first".to_string())
            .unwrap();
        arb.post_message(&registry, JobId(1), acct("freelancer"), "second".to_string())
            .unwrap();
        let dispute = arb.dispute(JobId(1)).unwrap();
        assert_eq!(dispute.messages[0].body, "first");
        assert_eq!(dispute.messages[1].body, "second");
    }

    #[test]
    fn test_payload_cap_enforced() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        let result = arb.post_message(
            &registry,
            JobId(1),
            acct("client"),
            "x".repeat(MAX_DISPUTE_PAYLOAD_BYTES + 1),
        );
        assert!(matches!(result, Err(DisputeError::PayloadTooLarge { .. })));
        assert!(arb.dispute(JobId(1)).unwrap().messages.is_empty());
    }

    // ── Review ───────────────────────────────────────────────────────

    #[test]
    fn test_begin_review_requires_resolver_role() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        let result = arb.begin_review(&registry, JobId(1), &acct("client"));
        assert!(matches!(result, Err(DisputeError::Unauthorized { .. })));
        arb.begin_review(&registry, JobId(1), &acct("resolver")).unwrap();
        assert_eq!(arb.dispute(JobId(1)).unwrap().status, DisputeStatus::Reviewing);
    }

    #[test]
    fn test_begin_review_twice_fails() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        arb.begin_review(&registry, JobId(1), &acct("resolver")).unwrap();
        let result = arb.begin_review(&registry, JobId(1), &acct("resolver"));
        assert!(matches!(result, Err(DisputeError::InvalidStatus { .. })));
    }

    #[test]
    fn test_evidence_still_accepted_while_reviewing() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        arb.begin_review(&registry, JobId(1), &acct("resolver")).unwrap();
        arb.post_message(&registry, JobId(1), acct("client"), "late addition".to_string())
            .unwrap();
        assert_eq!(arb.dispute(JobId(1)).unwrap().messages.len(), 1);
    }

    // ── Resolution ───────────────────────────────────────────────────

    #[test]
    fn test_resolve_requires_resolver_role() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        let result = arb.resolve(
            &mut ledger,
            &registry,
            JobId(1),
            acct("client"),
            ResolutionOutcome::BeneficiaryFull,
            None,
        );
        assert!(matches!(result, Err(DisputeError::Unauthorized { .. })));
        // Nothing moved.
        assert_eq!(ledger.entry(JobId(1)).unwrap().state, EscrowState::Disputed);
        assert_eq!(arb.dispute(JobId(1)).unwrap().status, DisputeStatus::Pending);
    }

    #[test]
    fn test_resolve_split_records_resolution() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        let outcome = ResolutionOutcome::Split(BasisPoints::new(3000).unwrap());
        let settlement = arb
            .resolve(
                &mut ledger,
                &registry,
                JobId(1),
                acct("resolver"),
                outcome,
                Some("partial delivery".to_string()),
            )
            .unwrap();
        assert_eq!(settlement.payout(PayoutKind::Depositor).unwrap().amount, 700);
        let dispute = arb.dispute(JobId(1)).unwrap();
        assert_eq!(dispute.status, DisputeStatus::Resolved);
        let record = dispute.resolution.as_ref().unwrap();
        assert_eq!(record.resolved_by, acct("resolver"));
        assert_eq!(record.admin_notes.as_deref(), Some("partial delivery"));
    }

    #[test]
    fn test_resolve_twice_fails_already_resolved() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        arb.resolve(
            &mut ledger,
            &registry,
            JobId(1),
            acct("resolver"),
            ResolutionOutcome::DepositorFull,
            None,
        )
        .unwrap();
        let events_before = ledger.events().len();
        let result = arb.resolve(
            &mut ledger,
            &registry,
            JobId(1),
            acct("resolver"),
            ResolutionOutcome::BeneficiaryFull,
            None,
        );
        assert!(matches!(result, Err(DisputeError::AlreadyResolved { .. })));
        // Ledger state untouched by the rejected second call.
        assert_eq!(ledger.events().len(), events_before);
        assert_eq!(ledger.entry(JobId(1)).unwrap().state, EscrowState::Resolved);
    }

    #[test]
    fn test_resolved_dispute_rejects_submissions() {
        let (mut ledger, registry, mut arb) = setup();
        open(&mut arb, &mut ledger);
        arb.resolve(
            &mut ledger,
            &registry,
            JobId(1),
            acct("resolver"),
            ResolutionOutcome::BeneficiaryFull,
            None,
        )
        .unwrap();
        let result = arb.post_message(&registry, JobId(1), acct("client"), "too late".to_string());
        assert!(matches!(result, Err(DisputeError::AlreadyResolved { .. })));
    }
}
