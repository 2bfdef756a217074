// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Override document rows keyed by `(app, role)`.

use portal_core::PortalError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_call_err};

/// Get the document stored for exactly this app and role.
pub async fn get_conf(db: &Database, app: &str, role: &str) -> Result<Option<String>, PortalError> {
    let app = app.to_string();
    let role = role.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT conf FROM apps WHERE app = ?1 AND role = ?2",
                params![app, role],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_call_err)
}

/// Store or replace the document for an app and role.
#[cfg(test)]
pub(crate) async fn put_conf(db: &Database, app: &str, role: &str, conf: &str) -> Result<(), PortalError> {
    let app = app.to_string();
    let role = role.to_string();
    let conf = conf.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO apps (app, role, conf) VALUES (?1, ?2, ?3)
                 ON CONFLICT (app, role) DO UPDATE SET conf = excluded.conf",
                params![app, role, conf],
            )?;
            Ok(())
        })
        .await
        .map_err(map_call_err)
}

/// Roles that have a document for `app`, sorted.
pub async fn list_roles(db: &Database, app: &str) -> Result<Vec<String>, PortalError> {
    let app = app.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT role FROM apps WHERE app = ?1 ORDER BY role")?;
            let roles = stmt
                .query_map(params![app], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(roles)
        })
        .await
        .map_err(map_call_err)
}
