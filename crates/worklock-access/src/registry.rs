//! # Role Registry
//!
//! Role grants as a set of `(role, holder)` pairs with Admin-gated
//! mutation. The registry is bootstrapped with a single Admin identity at
//! deployment; every later grant or revoke must be performed by a current
//! Admin.
//!
//! ## Security Invariant
//!
//! There is no path that inserts a grant without an Admin actor except the
//! bootstrap constructor, and the bootstrap grant itself is recorded in the
//! audit log.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use worklock_core::{AccountId, Timestamp};

/// An enumerated capability tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May grant and revoke roles, including other Admin grants.
    Admin,
    /// May review and resolve disputes.
    Resolver,
    /// May attest cross-chain bridge messages.
    Relayer,
}

impl Role {
    /// Returns the canonical role name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Resolver => "RESOLVER",
            Self::Relayer => "RELAYER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The direction of a role mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleChange {
    /// The grant was added.
    Granted,
    /// The grant was removed.
    Revoked,
}

/// Audit record of one effective role mutation.
///
/// Idempotent no-ops (granting an existing grant, revoking an absent one)
/// are not recorded; the log reflects actual membership changes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleChangeRecord {
    /// Whether the grant was added or removed.
    pub change: RoleChange,
    /// The role affected.
    pub role: Role,
    /// The identity whose grant changed.
    pub holder: AccountId,
    /// The Admin who performed the change.
    pub actor: AccountId,
    /// When the change occurred.
    pub timestamp: Timestamp,
}

/// Errors from registry operations.
#[derive(Error, Debug)]
pub enum AccessError {
    /// The acting identity lacks the Admin role.
    #[error("unauthorized: {actor} lacks the ADMIN role required to {action}")]
    Unauthorized {
        /// The identity that attempted the change.
        actor: AccountId,
        /// What was attempted.
        action: String,
    },
}

/// The capability registry queried by every gated entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRegistry {
    /// Current grants as a set of `(role, holder)` pairs.
    grants: BTreeSet<(Role, AccountId)>,
    /// Append-only log of effective changes.
    audit_log: Vec<RoleChangeRecord>,
}

impl AccessRegistry {
    /// Create a registry seeded with a single bootstrap Admin.
    pub fn bootstrap(admin: AccountId) -> Self {
        let mut registry = Self {
            grants: BTreeSet::new(),
            audit_log: Vec::new(),
        };
        registry.insert_grant(Role::Admin, admin.clone(), admin);
        registry
    }

    /// Whether `holder` currently holds `role`.
    pub fn has_role(&self, role: Role, holder: &AccountId) -> bool {
        self.grants.contains(&(role, holder.clone()))
    }

    /// Grant `role` to `holder`, performed by `actor`.
    ///
    /// Idempotent: granting an existing grant succeeds without a new audit
    /// record.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if `actor` is not an Admin.
    pub fn grant_role(
        &mut self,
        actor: &AccountId,
        role: Role,
        holder: AccountId,
    ) -> Result<(), AccessError> {
        self.require_admin(actor, &format!("grant {role}"))?;
        if self.has_role(role, &holder) {
            return Ok(());
        }
        self.insert_grant(role, holder, actor.clone());
        Ok(())
    }

    /// Revoke `role` from `holder`, performed by `actor`.
    ///
    /// Idempotent: revoking an absent grant succeeds without a new audit
    /// record.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if `actor` is not an Admin.
    pub fn revoke_role(
        &mut self,
        actor: &AccountId,
        role: Role,
        holder: &AccountId,
    ) -> Result<(), AccessError> {
        self.require_admin(actor, &format!("revoke {role}"))?;
        if !self.grants.remove(&(role, holder.clone())) {
            return Ok(());
        }
        tracing::info!(role = %role, holder = %holder, actor = %actor, "role revoked");
        self.audit_log.push(RoleChangeRecord {
            change: RoleChange::Revoked,
            role,
            holder: holder.clone(),
            actor: actor.clone(),
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    /// Access the append-only audit log.
    pub fn audit_log(&self) -> &[RoleChangeRecord] {
        &self.audit_log
    }

    /// Number of current grants across all roles.
    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }

    fn require_admin(&self, actor: &AccountId, action: &str) -> Result<(), AccessError> {
        if !self.has_role(Role::Admin, actor) {
            return Err(AccessError::Unauthorized {
                actor: actor.clone(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn insert_grant(&mut self, role: Role, holder: AccountId, actor: AccountId) {
        tracing::info!(role = %role, holder = %holder, actor = %actor, "role granted");
        self.grants.insert((role, holder.clone()));
        self.audit_log.push(RoleChangeRecord {
            change: RoleChange::Granted,
            role,
            holder,
            actor,
            timestamp: Timestamp::now(),
        });
    }
}
