//! Delegation relation domain model.
//!
//! Links a service to a user it may act on behalf of, together with
//! the user's identity inside that service's namespace. The existence
//! of an exact `(service_id, user_id, service_username)` triple is the
//! sole authorization check for delegated token issuance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationRelation {
    pub id: u64,
    pub service_id: u64,
    pub user_id: u64,
    pub service_username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDelegationRelation {
    pub service_id: u64,
    pub user_id: u64,
    pub service_username: String,
}
