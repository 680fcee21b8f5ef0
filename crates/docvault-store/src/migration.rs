//! SQLite schema versions.
//!
//! Applied versions are recorded in `schema_migrations`. Opening a database
//! applies every missing step in one transaction.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Latest schema this build understands.
pub const CURRENT_VERSION: u32 = 1;

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
///
/// Refuses databases written by a newer build.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// v1: documents, grants, signatures, versions and the id counter.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Monotonic counters (document id allocation)
        CREATE TABLE counters (
            name TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );
        INSERT INTO counters (name, value) VALUES ('document_id', 0);

        -- Document head state
        CREATE TABLE documents (
            document_id INTEGER PRIMARY KEY,  -- sequential, never reused
            owner TEXT NOT NULL,              -- opaque principal handle
            status INTEGER NOT NULL,          -- 0=draft, 1=active, 2=suspended, 3=revoked
            created_at INTEGER NOT NULL,      -- Unix ms
            updated_at INTEGER NOT NULL       -- Unix ms
        );

        -- Role membership facts
        CREATE TABLE role_grants (
            document_id INTEGER NOT NULL REFERENCES documents(document_id),
            principal TEXT NOT NULL,
            role INTEGER NOT NULL,            -- 0=editor, 1=validator, 2=reader
            seq INTEGER NOT NULL,             -- grant order within the document
            granted_at INTEGER NOT NULL,
            PRIMARY KEY (document_id, principal, role)
        );

        -- Certification signatures of the current round
        CREATE TABLE signatures (
            document_id INTEGER NOT NULL REFERENCES documents(document_id),
            position INTEGER NOT NULL,        -- signing order
            validator TEXT NOT NULL,
            signed_at INTEGER NOT NULL,
            PRIMARY KEY (document_id, position),
            UNIQUE (document_id, validator)
        );

        -- Append-only version history
        CREATE TABLE versions (
            document_id INTEGER NOT NULL REFERENCES documents(document_id),
            idx INTEGER NOT NULL,             -- 0-based, dense
            content_id TEXT NOT NULL,         -- external content-addressed reference
            author TEXT NOT NULL,
            timestamp INTEGER NOT NULL,       -- Unix ms
            note TEXT NOT NULL,
            prev_digest BLOB NOT NULL,        -- 32 bytes
            digest BLOB NOT NULL,             -- 32 bytes, Blake3
            PRIMARY KEY (document_id, idx)
        );

        -- Indexes for common queries
        CREATE INDEX idx_documents_owner ON documents(owner);
        CREATE INDEX idx_role_grants_principal ON role_grants(principal);
        "#,
    )?;

    Ok(())
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["counters", "documents", "role_grants", "signatures", "versions", "schema_migrations"] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);

        // Counter seeded exactly once.
        let counters: i64 = conn
            .query_row("SELECT COUNT(*) FROM counters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(counters, 1);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (99, 0)",
            [],
        )
        .unwrap();
        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
