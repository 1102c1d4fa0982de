//! # Submission store
//!
//! Persists accepted submissions into SQLite. The schema is applied when the store
//! is opened. Each submission is written inside its own transaction: the row insert
//! and, for incident reports, the ordered image rows either commit together or not
//! at all.
//!
//! The connection sits behind a mutex; holding the guard is what it means to have
//! the connection checked out, and dropping it (on success, error or panic) hands it
//! back for the next request.

pub mod row;

use crate::error::SubmissionError;
use row::InsertRow;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = include_str!("schema.sql");

/// Identity assigned by the store to a committed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub id: i64,
    pub created_at: String,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn checkout(&self) -> Result<MutexGuard<'_, Connection>, SubmissionError> {
        self.conn
            .lock()
            .map_err(|_| SubmissionError::PersistenceFailure("connection lock poisoned".into()))
    }

    /// Inserts `row` in a single transaction and returns the generated id and
    /// creation timestamp. Any failure rolls the transaction back.
    pub fn persist(&self, row: &InsertRow) -> Result<Receipt, SubmissionError> {
        let mut conn = self.checkout()?;
        let tx = conn.transaction()?;

        let receipt = tx.query_row(
            &row.insert_sql(),
            params_from_iter(row.columns.iter().map(|(_, value)| value)),
            |r| {
                Ok(Receipt {
                    id: r.get(0)?,
                    created_at: r.get(1)?,
                })
            },
        )?;

        if let Some(gallery) = &row.gallery {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}, position, image) VALUES (?1, ?2, ?3)",
                gallery.table, gallery.owner_column
            ))?;
            for (position, image) in gallery.images.iter().enumerate() {
                stmt.execute(params![receipt.id, position as i64, image])?;
            }
        }

        tx.commit()?;
        Ok(receipt)
    }

    /// Runs `f` against the checked-out connection.
    #[cfg(test)]
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, SubmissionError> {
        let conn = self.checkout()?;
        Ok(f(&*conn)?)
    }
}
