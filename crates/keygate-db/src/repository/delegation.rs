//! SurrealDB implementation of [`DelegationRepository`].
//!
//! Relations are consulted by the authorizer and created by the
//! out-of-core linking workflow; they are never mutated.

use chrono::{DateTime, Utc};
use keygate_core::error::KeygateResult;
use keygate_core::models::delegation::{CreateDelegationRelation, DelegationRelation};
use keygate_core::repository::DelegationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;
use crate::repository::sequence;

#[derive(Debug, SurrealValue)]
struct DelegationRow {
    service_id: i64,
    user_id: i64,
    service_username: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DelegationRowWithId {
    record_id: i64,
    service_id: i64,
    user_id: i64,
    service_username: String,
    created_at: DateTime<Utc>,
}

fn ids_to_u64(record_id: i64, service_id: i64, user_id: i64) -> Result<(u64, u64, u64), DbError> {
    let convert = |v: i64, what: &str| {
        u64::try_from(v).map_err(|_| DbError::Migration(format!("negative {what}: {v}")))
    };
    Ok((
        convert(record_id, "record id")?,
        convert(service_id, "service id")?,
        convert(user_id, "user id")?,
    ))
}

impl DelegationRow {
    fn into_relation(self, id: u64) -> Result<DelegationRelation, DbError> {
        let (_, service_id, user_id) = ids_to_u64(0, self.service_id, self.user_id)?;
        Ok(DelegationRelation {
            id,
            service_id,
            user_id,
            service_username: self.service_username,
            created_at: self.created_at,
        })
    }
}

impl DelegationRowWithId {
    fn try_into_relation(self) -> Result<DelegationRelation, DbError> {
        let (id, service_id, user_id) =
            ids_to_u64(self.record_id, self.service_id, self.user_id)?;
        Ok(DelegationRelation {
            id,
            service_id,
            user_id,
            service_username: self.service_username,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Delegation repository.
#[derive(Clone)]
pub struct SurrealDelegationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDelegationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DelegationRepository for SurrealDelegationRepository<C> {
    async fn link(&self, input: CreateDelegationRelation) -> KeygateResult<DelegationRelation> {
        let id = sequence::next_id(&self.db, "delegation").await?;

        let result = self
            .db
            .query(
                "CREATE type::record('delegation', $id) SET \
                 service_id = $service_id, \
                 user_id = $user_id, \
                 service_username = $service_username",
            )
            .bind(("id", id as i64))
            .bind(("service_id", input.service_id as i64))
            .bind(("user_id", input.user_id as i64))
            .bind(("service_username", input.service_username))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|_| DbError::AlreadyExists {
            entity: "delegation".into(),
        })?;

        let rows: Vec<DelegationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "delegation".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_relation(id)?)
    }

    async fn find(
        &self,
        service_id: u64,
        user_id: u64,
        service_username: &str,
    ) -> KeygateResult<DelegationRelation> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM delegation \
                 WHERE service_id = $service_id \
                 AND user_id = $user_id \
                 AND service_username = $service_username",
            )
            .bind(("service_id", service_id as i64))
            .bind(("user_id", user_id as i64))
            .bind(("service_username", service_username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DelegationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "delegation".into(),
            id: format!("({service_id}, {user_id}, {service_username})"),
        })?;

        Ok(row.try_into_relation()?)
    }
}
