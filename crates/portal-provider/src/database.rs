// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All statements run on tokio-rusqlite's single background thread.

use std::fmt::Display;
use std::path::Path;

use portal_core::PortalError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Handle to the SQLite database holding override documents.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }

        let conn = Connection::open(path).await.map_err(storage_err)?;
        let db = Self { conn };
        db.configure(true).await?;
        debug!(path = %path.display(), "configuration database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied.
    pub async fn open_in_memory() -> Result<Self, PortalError> {
        let conn = Connection::open_in_memory().await.map_err(storage_err)?;
        let db = Self { conn };
        db.configure(false).await?;
        Ok(db)
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), PortalError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_call_err)
    }

    async fn configure(&self, wal: bool) -> Result<(), PortalError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn.execute_batch("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")
            })
            .await
            .map_err(map_call_err)?;

        self.conn
            .call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e: tokio_rusqlite::Error<refinery::Error>| storage_err(e))
    }
}

/// Map a failed `Connection::call` to a storage error.
pub(crate) fn map_call_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PortalError {
    storage_err(e)
}

pub(crate) fn storage_err(e: impl Display) -> PortalError {
    PortalError::Storage {
        source: e.to_string().into(),
    }
}
