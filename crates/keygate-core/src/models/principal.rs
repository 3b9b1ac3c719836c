//! Principal domain model.
//!
//! A principal is an authenticated identity — either an end-user
//! account or a backend service. Names are unique within a kind;
//! ids are store-assigned, monotonically increasing, and never
//! reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrincipalKind {
    User,
    Service,
}

impl PrincipalKind {
    /// Canonical string form, used at the storage and claim seams.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "User",
            PrincipalKind::Service => "Service",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: u64,
    pub kind: PrincipalKind,
    pub name: String,
    /// Stored credential (password or shared secret), compared verbatim.
    pub secret: String,
    /// The single currently valid refresh token, if any. Overwritten on
    /// every issuance; an old value failing the comparison is the only
    /// revocation mechanism.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrincipal {
    pub kind: PrincipalKind,
    pub name: String,
    pub secret: String,
}
