//! Monotonic id allocation backed by the `sequence` table.
//!
//! One row per sequence key; the increment is a single statement, so
//! two concurrent allocations never hand out the same id, and released
//! ids are never reused.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SequenceRow {
    value: i64,
}

/// Allocate the next id for `key`.
pub(crate) async fn next_id<C: Connection>(db: &Surreal<C>, key: &str) -> Result<u64, DbError> {
    let mut result = db
        .query("UPSERT type::record('sequence', $key) SET value = (value ?? 0) + 1")
        .bind(("key", key.to_string()))
        .await?;

    let rows: Vec<SequenceRow> = result.take(0)?;
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "sequence".into(),
        id: key.to_string(),
    })?;

    u64::try_from(row.value).map_err(|_| DbError::Migration(format!("negative sequence: {key}")))
}
