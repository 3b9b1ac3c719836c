//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Principal ids are numeric record ids drawn from a sequence table,
//! so they are stable, monotonically increasing, and never reused.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Principals (users and services share one table, discriminated by kind)
-- =======================================================================
DEFINE TABLE principal SCHEMAFULL;
DEFINE FIELD kind ON TABLE principal TYPE string \
    ASSERT $value IN ['User', 'Service'];
DEFINE FIELD name ON TABLE principal TYPE string;
DEFINE FIELD secret ON TABLE principal TYPE string;
DEFINE FIELD refresh_token ON TABLE principal TYPE option<string>;
DEFINE FIELD created_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_principal_kind_name ON TABLE principal \
    COLUMNS kind, name UNIQUE;

-- =======================================================================
-- Delegation relations (service acting on behalf of a user)
-- =======================================================================
DEFINE TABLE delegation SCHEMAFULL;
DEFINE FIELD service_id ON TABLE delegation TYPE int;
DEFINE FIELD user_id ON TABLE delegation TYPE int;
DEFINE FIELD service_username ON TABLE delegation TYPE string;
DEFINE FIELD created_at ON TABLE delegation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_delegation_triple ON TABLE delegation \
    COLUMNS service_id, user_id, service_username UNIQUE;

-- =======================================================================
-- Id sequences (one row per sequence key)
-- =======================================================================
DEFINE TABLE sequence SCHEMAFULL;
DEFINE FIELD value ON TABLE sequence TYPE int DEFAULT 0;
";

pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
