//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for docvault. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking. Every write that
//! touches more than one row runs in a transaction.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use docvault_core::{
    Blake3Hash, Certification, ContentId, DocumentId, DocumentRecord, DocumentStatus, Principal,
    SignatureRecord, Version,
};
use docvault_perms::{PermissionRegistry, Role, RoleGrant};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{InsertResult, Store, StoredDocument};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(format!("sqlite connection: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Convert an id, index or sequence number for writing.
///
/// SQLite integers are signed; anything above `i64::MAX` is refused rather
/// than wrapped.
fn sql_int(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        StoreError::InvalidData(format!("{what} {value} exceeds the SQLite integer range"))
    })
}

/// Convert a stored integer back, refusing negative values.
fn stored_u64(value: i64, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| StoreError::InvalidData(format!("negative {what} {value}")))
}

// Helper to convert a blob column to a digest
fn digest_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Blake3Hash> {
    let bytes: Vec<u8> = row.get(idx)?;
    Blake3Hash::try_from(bytes.as_slice())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(e)))
}

// Helper to convert a row to Version
fn row_to_version(row: &rusqlite::Row<'_>) -> rusqlite::Result<Version> {
    let index: i64 = row.get(0)?;
    let content_id: String = row.get(1)?;
    let author: String = row.get(2)?;

    let index = u64::try_from(index)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e)))?;

    Ok(Version {
        index,
        content_id: ContentId::new(content_id),
        author: Principal::new(author),
        timestamp: row.get(3)?,
        note: row.get(4)?,
        prev_digest: digest_column(row, 5)?,
        digest: digest_column(row, 6)?,
    })
}

const VERSION_COLUMNS: &str = "idx, content_id, author, timestamp, note, prev_digest, digest";

fn load_version(conn: &Connection, id: DocumentId, index: u64) -> Result<Option<Version>> {
    // Keys that cannot be stored cannot be found either.
    let (Ok(key), Ok(idx)) = (i64::try_from(id.get()), i64::try_from(index)) else {
        return Ok(None);
    };
    conn.query_row(
        &format!("SELECT {VERSION_COLUMNS} FROM versions WHERE document_id = ?1 AND idx = ?2"),
        params![key, idx],
        row_to_version,
    )
    .optional()
    .map_err(StoreError::from)
}

fn count_versions(conn: &Connection, id: DocumentId) -> Result<u64> {
    let Ok(key) = i64::try_from(id.get()) else {
        return Ok(0);
    };
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM versions WHERE document_id = ?1",
        params![key],
        |row| row.get(0),
    )?;
    stored_u64(count, "version count")
}

fn write_version(conn: &Connection, id: DocumentId, version: &Version) -> Result<()> {
    conn.execute(
        "INSERT INTO versions (
            document_id, idx, content_id, author, timestamp, note, prev_digest, digest
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            sql_int(id.get(), "document id")?,
            sql_int(version.index, "version index")?,
            version.content_id.as_str(),
            version.author.as_str(),
            version.timestamp,
            &version.note,
            version.prev_digest.0.as_slice(),
            version.digest.0.as_slice(),
        ],
    )?;
    Ok(())
}

/// Load the head state of a document: record, signatures and grants.
fn load_document(conn: &Connection, id: DocumentId) -> Result<Option<StoredDocument>> {
    let Ok(key) = i64::try_from(id.get()) else {
        return Ok(None);
    };
    let row: Option<(String, i64, i64, i64)> = conn
        .query_row(
            "SELECT owner, status, created_at, updated_at FROM documents WHERE document_id = ?1",
            params![key],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;

    let Some((owner, status_int, created_at, updated_at)) = row else {
        return Ok(None);
    };

    let status = u8::try_from(status_int)
        .map_err(|_| StoreError::InvalidData(format!("status {status_int} out of range")))
        .and_then(|s| {
            DocumentStatus::from_u8(s).map_err(|e| StoreError::InvalidData(e.to_string()))
        })?;

    let mut sig_stmt = conn.prepare(
        "SELECT validator, signed_at FROM signatures WHERE document_id = ?1 ORDER BY position",
    )?;
    let signatures: Vec<SignatureRecord> = sig_stmt
        .query_map(params![key], |row| {
            let validator: String = row.get(0)?;
            Ok(SignatureRecord {
                validator: Principal::new(validator),
                signed_at: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut grant_stmt = conn.prepare(
        "SELECT principal, role, seq, granted_at FROM role_grants WHERE document_id = ?1 ORDER BY seq",
    )?;
    let raw_grants: Vec<(String, i64, i64, i64)> = grant_stmt
        .query_map(params![key], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut grants = Vec::with_capacity(raw_grants.len());
    for (principal, role_int, seq, granted_at) in raw_grants {
        let role = u8::try_from(role_int)
            .ok()
            .and_then(Role::from_u8)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown role code {role_int}")))?;
        grants.push(RoleGrant {
            principal: Principal::new(principal),
            role,
            seq: stored_u64(seq, "grant sequence")?,
            granted_at,
        });
    }

    Ok(Some(StoredDocument {
        record: DocumentRecord {
            id,
            owner: Principal::new(owner),
            status,
            certification: Certification::from_signatures(signatures),
            created_at,
            updated_at,
        },
        permissions: PermissionRegistry::from_grants(grants),
    }))
}

/// Replace signatures and grants of a document inside `tx`.
fn write_children(tx: &Transaction<'_>, document: &StoredDocument) -> Result<()> {
    let id = sql_int(document.id().get(), "document id")?;

    tx.execute("DELETE FROM signatures WHERE document_id = ?1", params![id])?;
    for (position, sig) in document.record.certification.signatures().iter().enumerate() {
        tx.execute(
            "INSERT INTO signatures (document_id, position, validator, signed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                sql_int(position as u64, "signature position")?,
                sig.validator.as_str(),
                sig.signed_at
            ],
        )?;
    }

    tx.execute("DELETE FROM role_grants WHERE document_id = ?1", params![id])?;
    for grant in document.permissions.grants() {
        tx.execute(
            "INSERT INTO role_grants (document_id, principal, role, seq, granted_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                grant.principal.as_str(),
                i64::from(grant.role.to_u8()),
                sql_int(grant.seq, "grant sequence")?,
                grant.granted_at,
            ],
        )?;
    }

    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn allocate_document_id(&self) -> Result<DocumentId> {
        self.run(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE counters SET value = value + 1 WHERE name = 'document_id'",
                [],
            )?;
            let value: i64 = tx.query_row(
                "SELECT value FROM counters WHERE name = 'document_id'",
                [],
                |row| row.get(0),
            )?;
            tx.commit()?;

            DocumentId::new(stored_u64(value, "allocated id")?)
                .ok_or_else(|| StoreError::InvalidData(format!("invalid allocated id {value}")))
        })
        .await
    }

    async fn insert_document(&self, document: &StoredDocument, initial: &Version) -> Result<()> {
        let document = document.clone();
        let initial = initial.clone();

        self.run(move |conn| {
            let id = document.id();
            let key = sql_int(id.get(), "document id")?;
            if initial.index != 0 {
                return Err(StoreError::NonContiguousVersion {
                    document_id: id,
                    expected: 0,
                    got: initial.index,
                });
            }

            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM documents WHERE document_id = ?1)",
                params![key],
                |row| row.get(0),
            )?;
            if exists {
                return Err(StoreError::DocumentExists(id));
            }

            let record = &document.record;
            tx.execute(
                "INSERT INTO documents (document_id, owner, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    key,
                    record.owner.as_str(),
                    i64::from(record.status.to_u8()),
                    record.created_at,
                    record.updated_at,
                ],
            )?;
            write_children(&tx, &document)?;
            write_version(&tx, id, &initial)?;

            // Keep the allocator ahead of explicitly inserted ids.
            tx.execute(
                "UPDATE counters SET value = MAX(value, ?1) WHERE name = 'document_id'",
                params![key],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<StoredDocument>> {
        self.run(move |conn| load_document(conn, id)).await
    }

    async fn update_document(&self, document: &StoredDocument) -> Result<()> {
        let document = document.clone();

        self.run(move |conn| {
            let record = &document.record;
            let key = sql_int(record.id.get(), "document id")?;
            let tx = conn.transaction()?;

            let changed = tx.execute(
                "UPDATE documents SET owner = ?2, status = ?3, updated_at = ?4
                 WHERE document_id = ?1",
                params![
                    key,
                    record.owner.as_str(),
                    i64::from(record.status.to_u8()),
                    record.updated_at,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(record.id));
            }

            write_children(&tx, &document)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list_documents(&self, owner: Option<&Principal>) -> Result<Vec<DocumentId>> {
        let owner = owner.cloned();

        self.run(move |conn| {
            let raw: Vec<i64> = if let Some(owner) = owner {
                let mut stmt = conn.prepare(
                    "SELECT document_id FROM documents WHERE owner = ?1 ORDER BY document_id",
                )?;
                let ids = stmt
                    .query_map(params![owner.as_str()], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                ids
            } else {
                let mut stmt =
                    conn.prepare("SELECT document_id FROM documents ORDER BY document_id")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                ids
            };

            raw.into_iter()
                .map(|v| {
                    DocumentId::new(stored_u64(v, "document id")?)
                        .ok_or_else(|| StoreError::InvalidData(format!("invalid document id {v}")))
                })
                .collect()
        })
        .await
    }

    async fn insert_version(&self, id: DocumentId, version: &Version) -> Result<InsertResult> {
        let version = version.clone();

        self.run(move |conn| {
            let key = sql_int(id.get(), "document id")?;
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM documents WHERE document_id = ?1)",
                params![key],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(StoreError::NotFound(id));
            }

            if let Some(existing) = load_version(&tx, id, version.index)? {
                return Ok(if existing == version {
                    InsertResult::AlreadyExists
                } else {
                    InsertResult::Conflict {
                        existing: existing.digest,
                    }
                });
            }

            let count = count_versions(&tx, id)?;
            if version.index != count {
                return Err(StoreError::NonContiguousVersion {
                    document_id: id,
                    expected: count,
                    got: version.index,
                });
            }

            write_version(&tx, id, &version)?;
            tx.commit()?;
            Ok(InsertResult::Inserted)
        })
        .await
    }

    async fn get_version(&self, id: DocumentId, index: u64) -> Result<Option<Version>> {
        self.run(move |conn| load_version(conn, id, index)).await
    }

    async fn latest_version(&self, id: DocumentId) -> Result<Option<Version>> {
        self.run(move |conn| {
            let Ok(key) = i64::try_from(id.get()) else {
                return Ok(None);
            };
            conn.query_row(
                &format!(
                    "SELECT {VERSION_COLUMNS} FROM versions WHERE document_id = ?1
                     ORDER BY idx DESC LIMIT 1"
                ),
                params![key],
                row_to_version,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn version_count(&self, id: DocumentId) -> Result<u64> {
        self.run(move |conn| count_versions(conn, id)).await
    }

    async fn get_versions_range(
        &self,
        id: DocumentId,
        start: u64,
        end: u64,
    ) -> Result<Vec<Version>> {
        self.run(move |conn| {
            let (Ok(key), Ok(start)) = (i64::try_from(id.get()), i64::try_from(start)) else {
                return Ok(Vec::new());
            };
            let end = i64::try_from(end).unwrap_or(i64::MAX);

            let mut stmt = conn.prepare(&format!(
                "SELECT {VERSION_COLUMNS} FROM versions
                 WHERE document_id = ?1 AND idx >= ?2 AND idx <= ?3
                 ORDER BY idx"
            ))?;

            let versions = stmt
                .query_map(
                    params![key, start, end],
                    row_to_version,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(versions)
        })
        .await
    }
}
