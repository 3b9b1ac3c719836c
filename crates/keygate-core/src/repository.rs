//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The core treats each store
//! call as a single awaitable unit with its own success/failure
//! outcome; "not found" is distinct from transport-level failure.

use crate::error::KeygateResult;
use crate::models::{
    delegation::{CreateDelegationRelation, DelegationRelation},
    principal::{CreatePrincipal, Principal, PrincipalKind},
};

pub trait PrincipalRepository: Send + Sync {
    /// Create a principal with a store-assigned numeric id. The name
    /// must be unique within its kind.
    fn create(&self, input: CreatePrincipal) -> impl Future<Output = KeygateResult<Principal>> + Send;

    fn get_by_id(
        &self,
        kind: PrincipalKind,
        id: u64,
    ) -> impl Future<Output = KeygateResult<Principal>> + Send;

    fn get_by_name(
        &self,
        kind: PrincipalKind,
        name: &str,
    ) -> impl Future<Output = KeygateResult<Principal>> + Send;

    /// Persist `token` as the principal's sole valid refresh token,
    /// atomically replacing whatever was stored before. This is the
    /// single authoritative write per principal that rotation relies
    /// on.
    fn set_refresh_token(
        &self,
        kind: PrincipalKind,
        id: u64,
        token: &str,
    ) -> impl Future<Output = KeygateResult<()>> + Send;

    /// Replace the stored refresh token only if it still equals
    /// `expected`, as one conditional write. "Not found" covers both a
    /// missing principal and a slot that no longer holds `expected`;
    /// of two concurrent rotations presenting the same token, at most
    /// one succeeds.
    fn rotate_refresh_token(
        &self,
        kind: PrincipalKind,
        id: u64,
        expected: &str,
        next: &str,
    ) -> impl Future<Output = KeygateResult<()>> + Send;

    /// Clear the stored refresh token (explicit session teardown).
    fn clear_refresh_token(
        &self,
        kind: PrincipalKind,
        id: u64,
    ) -> impl Future<Output = KeygateResult<()>> + Send;
}

pub trait DelegationRepository: Send + Sync {
    /// Register a service↔user relation (out-of-core linking workflow).
    fn link(
        &self,
        input: CreateDelegationRelation,
    ) -> impl Future<Output = KeygateResult<DelegationRelation>> + Send;

    /// Find the relation matching the exact triple. Partial matches
    /// are "not found" — the authorization check fails closed.
    fn find(
        &self,
        service_id: u64,
        user_id: u64,
        service_username: &str,
    ) -> impl Future<Output = KeygateResult<DelegationRelation>> + Send;
}
