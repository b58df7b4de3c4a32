//! Transactional accessor over the `kv_entries` table.
//!
//! # Responsibility
//! - Wrap engine transactions as point get/put/delete and ordered prefix or
//!   range scans.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Reads run in a deferred transaction and observe one snapshot.
//! - Writes run in an immediate transaction; nothing is visible before
//!   [`WriteTx::commit`].
//! - Engine errors are returned unchanged; nothing here retries.

use super::DbResult;
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension, Rows, Transaction, TransactionBehavior};
use std::ops::ControlFlow;

const GET_SQL: &str = "SELECT value FROM kv_entries WHERE key = ?1;";
const PUT_SQL: &str = "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value;";
const DELETE_SQL: &str = "DELETE FROM kv_entries WHERE key = ?1;";
const SCAN_SQL: &str = "SELECT key, value FROM kv_entries WHERE key >= ?1 ORDER BY key ASC;";
const SCAN_RANGE_SQL: &str =
    "SELECT key, value FROM kv_entries WHERE key >= ?1 AND key < ?2 ORDER BY key ASC;";

/// Read primitives shared by read-only and read-write transactions.
pub trait KvRead {
    /// Point lookup. `Ok(None)` when the key is absent.
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>>;

    /// Visits every entry whose key starts with `prefix`, in ascending key
    /// order, until the visitor breaks or the prefix range ends.
    ///
    /// An empty prefix visits the whole table.
    fn scan_prefix<E, F>(&self, prefix: &[u8], visit: F) -> Result<(), E>
    where
        E: From<DbError>,
        F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>;

    /// Visits every entry with `start <= key < end`, in ascending key order,
    /// until the visitor breaks or the range ends.
    fn scan_range<E, F>(&self, start: &[u8], end: &[u8], visit: F) -> Result<(), E>
    where
        E: From<DbError>,
        F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>;
}

/// Read-only transaction. Dropping it ends the snapshot.
pub struct ReadTx<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> ReadTx<'conn> {
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        Ok(Self { tx })
    }
}

impl KvRead for ReadTx<'_> {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        get_value(&self.tx, key)
    }

    fn scan_prefix<E, F>(&self, prefix: &[u8], visit: F) -> Result<(), E>
    where
        E: From<DbError>,
        F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>,
    {
        scan_entries(&self.tx, prefix, visit)
    }

    fn scan_range<E, F>(&self, start: &[u8], end: &[u8], visit: F) -> Result<(), E>
    where
        E: From<DbError>,
        F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>,
    {
        scan_bounded(&self.tx, start, end, visit)
    }
}

/// Read-write transaction. Rolled back on drop unless committed.
pub struct WriteTx<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> WriteTx<'conn> {
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Self { tx })
    }

    /// Inserts or overwrites one entry.
    pub fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()> {
        let mut stmt = self.tx.prepare_cached(PUT_SQL)?;
        stmt.execute(params![key, value])?;
        Ok(())
    }

    /// Removes one entry. Returns whether a row existed.
    pub fn delete(&self, key: &[u8]) -> DbResult<bool> {
        let mut stmt = self.tx.prepare_cached(DELETE_SQL)?;
        let changed = stmt.execute([key])?;
        Ok(changed > 0)
    }

    pub fn commit(self) -> DbResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

impl KvRead for WriteTx<'_> {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        get_value(&self.tx, key)
    }

    fn scan_prefix<E, F>(&self, prefix: &[u8], visit: F) -> Result<(), E>
    where
        E: From<DbError>,
        F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>,
    {
        scan_entries(&self.tx, prefix, visit)
    }

    fn scan_range<E, F>(&self, start: &[u8], end: &[u8], visit: F) -> Result<(), E>
    where
        E: From<DbError>,
        F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>,
    {
        scan_bounded(&self.tx, start, end, visit)
    }
}

fn get_value(conn: &Connection, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
    let mut stmt = conn.prepare_cached(GET_SQL)?;
    let value = stmt
        .query_row([key], |row| row.get::<_, Vec<u8>>(0))
        .optional()?;
    Ok(value)
}

fn scan_entries<E, F>(conn: &Connection, prefix: &[u8], visit: F) -> Result<(), E>
where
    E: From<DbError>,
    F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>,
{
    let mut stmt = conn.prepare_cached(SCAN_SQL).map_err(DbError::from)?;
    let rows = stmt.query([prefix]).map_err(DbError::from)?;
    visit_rows(rows, |key| key.starts_with(prefix), visit)
}

fn scan_bounded<E, F>(conn: &Connection, start: &[u8], end: &[u8], visit: F) -> Result<(), E>
where
    E: From<DbError>,
    F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>,
{
    let mut stmt = conn.prepare_cached(SCAN_RANGE_SQL).map_err(DbError::from)?;
    let rows = stmt.query(params![start, end]).map_err(DbError::from)?;
    visit_rows(rows, |_| true, visit)
}

fn visit_rows<E, F>(
    mut rows: Rows<'_>,
    in_range: impl Fn(&[u8]) -> bool,
    mut visit: F,
) -> Result<(), E>
where
    E: From<DbError>,
    F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>, E>,
{
    while let Some(row) = rows.next().map_err(DbError::from)? {
        let key: Vec<u8> = row.get(0).map_err(DbError::from)?;
        if !in_range(&key) {
            break;
        }
        let value: Vec<u8> = row.get(1).map_err(DbError::from)?;

        if visit(&key, &value)?.is_break() {
            break;
        }
    }
    Ok(())
}
