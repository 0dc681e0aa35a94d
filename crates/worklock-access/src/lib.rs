//! # worklock-access — Capability Registry
//!
//! Holds the role grants the rest of the settlement core queries: who may
//! resolve disputes, who may attest bridge messages, and who may administer
//! the grants themselves.
//!
//! Authorization checks are centralized behind [`AccessRegistry::has_role`]
//! rather than scattered through the gated entry points; the component
//! crates ask one question and never inspect grant storage directly.
//!
//! ## Crate Policy
//!
//! - Depends only on `worklock-core` internally.
//! - Grant and revoke are idempotent set operations.
//! - Every effective change is appended to an audit log.

pub mod registry;

pub use registry::{AccessError, AccessRegistry, Role, RoleChange, RoleChangeRecord};
