//! SurrealDB implementation of [`PrincipalRepository`].
//!
//! Principals are keyed by numeric record ids from the `principal`
//! sequence. The refresh-token slot is only ever written by single
//! statements keyed by that id; rotation additionally conditions the
//! write on the current slot value, which is what gives it its
//! at-most-one-winner guarantee.

use chrono::{DateTime, Utc};
use keygate_core::error::{KeygateError, KeygateResult};
use keygate_core::models::principal::{CreatePrincipal, Principal, PrincipalKind};
use keygate_core::repository::PrincipalRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;
use crate::repository::sequence;

/// DB-side row struct for queries where the id is already known.
#[derive(Debug, SurrealValue)]
struct PrincipalRow {
    kind: String,
    name: String,
    secret: String,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record id via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PrincipalRowWithId {
    record_id: i64,
    kind: String,
    name: String,
    secret: String,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_kind(s: &str) -> Result<PrincipalKind, DbError> {
    match s {
        "User" => Ok(PrincipalKind::User),
        "Service" => Ok(PrincipalKind::Service),
        other => Err(DbError::Migration(format!(
            "unknown principal kind: {other}"
        ))),
    }
}

fn id_from_record(record_id: i64) -> Result<u64, DbError> {
    u64::try_from(record_id)
        .map_err(|_| DbError::Migration(format!("negative record id: {record_id}")))
}

impl PrincipalRow {
    fn into_principal(self, id: u64) -> Result<Principal, DbError> {
        Ok(Principal {
            id,
            kind: parse_kind(&self.kind)?,
            name: self.name,
            secret: self.secret,
            refresh_token: self.refresh_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PrincipalRowWithId {
    fn try_into_principal(self) -> Result<Principal, DbError> {
        let id = id_from_record(self.record_id)?;
        Ok(Principal {
            id,
            kind: parse_kind(&self.kind)?,
            name: self.name,
            secret: self.secret,
            refresh_token: self.refresh_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Principal repository.
#[derive(Clone)]
pub struct SurrealPrincipalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPrincipalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PrincipalRepository for SurrealPrincipalRepository<C> {
    async fn create(&self, input: CreatePrincipal) -> KeygateResult<Principal> {
        // Reject a taken name up front; the unique index on
        // (kind, name) backstops the race.
        match self.get_by_name(input.kind, &input.name).await {
            Ok(_) => {
                return Err(DbError::AlreadyExists {
                    entity: "principal".into(),
                }
                .into());
            }
            Err(KeygateError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let id = sequence::next_id(&self.db, "principal").await?;

        let result = self
            .db
            .query(
                "CREATE type::record('principal', $id) SET \
                 kind = $kind, \
                 name = $name, \
                 secret = $secret, \
                 refresh_token = NONE",
            )
            .bind(("id", id as i64))
            .bind(("kind", input.kind.as_str().to_string()))
            .bind(("name", input.name))
            .bind(("secret", input.secret))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_principal(id)?)
    }

    async fn get_by_id(&self, kind: PrincipalKind, id: u64) -> KeygateResult<Principal> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('principal', $id) \
                 WHERE kind = $kind",
            )
            .bind(("id", id as i64))
            .bind(("kind", kind.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_principal(id)?)
    }

    async fn get_by_name(&self, kind: PrincipalKind, name: &str) -> KeygateResult<Principal> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM principal \
                 WHERE kind = $kind AND name = $name",
            )
            .bind(("kind", kind.as_str().to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.try_into_principal()?)
    }

    async fn set_refresh_token(
        &self,
        kind: PrincipalKind,
        id: u64,
        token: &str,
    ) -> KeygateResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('principal', $id) SET \
                 refresh_token = $rt, updated_at = time::now() \
                 WHERE kind = $kind",
            )
            .bind(("id", id as i64))
            .bind(("kind", kind.as_str().to_string()))
            .bind(("rt", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "principal".into(),
                id: id.to_string(),
            }
            .into());
        }

        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        kind: PrincipalKind,
        id: u64,
        expected: &str,
        next: &str,
    ) -> KeygateResult<()> {
        // Single conditional statement keyed by record id; the WHERE
        // clause on the current slot value is what makes concurrent
        // rotations of the same token single-winner.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('principal', $id) SET \
                 refresh_token = $next, updated_at = time::now() \
                 WHERE kind = $kind AND refresh_token = $expected",
            )
            .bind(("id", id as i64))
            .bind(("kind", kind.as_str().to_string()))
            .bind(("expected", expected.to_string()))
            .bind(("next", next.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "principal".into(),
                id: id.to_string(),
            }
            .into());
        }

        Ok(())
    }

    async fn clear_refresh_token(&self, kind: PrincipalKind, id: u64) -> KeygateResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('principal', $id) SET \
                 refresh_token = NONE, updated_at = time::now() \
                 WHERE kind = $kind",
            )
            .bind(("id", id as i64))
            .bind(("kind", kind.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "principal".into(),
                id: id.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
