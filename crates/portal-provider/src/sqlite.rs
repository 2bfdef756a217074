// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed configuration provider.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, error};

use portal_core::{ConfigurationProvider, DEFAULT_ROLE, HealthStatus, PortalError};

use crate::database::{Database, map_call_err};
use crate::queries;

/// Reads override documents from the `apps(app, role, conf)` table.
///
/// Rows can change at any time, so documents are never cacheable.
pub struct SqliteConfigurationProvider {
    db: Database,
    default_role: String,
}

impl SqliteConfigurationProvider {
    /// Open the database at `path` and check that `app` has a default document.
    pub async fn open(path: impl AsRef<Path>, app: &str) -> Result<Self, PortalError> {
        let db = Database::open(path).await?;
        Self::with_database(db, app, DEFAULT_ROLE).await
    }

    /// Wrap an open database, checking that `app` has a `default_role` document.
    pub async fn with_database(
        db: Database,
        app: &str,
        default_role: &str,
    ) -> Result<Self, PortalError> {
        if queries::apps::get_conf(&db, app, default_role).await?.is_none() {
            error!(app, role = default_role, "no default configuration in database");
            return Err(PortalError::unavailable(
                app,
                default_role,
                "cannot obtain default configuration from database",
            ));
        }
        debug!(app, "sqlite configuration provider ready");
        Ok(Self {
            db,
            default_role: default_role.to_string(),
        })
    }

    /// The underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl ConfigurationProvider for SqliteConfigurationProvider {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn is_cacheable(&self) -> bool {
        false
    }

    fn default_role(&self) -> &str {
        &self.default_role
    }

    async fn lookup(&self, app: &str, role: &str) -> Result<Option<String>, PortalError> {
        let conf = queries::apps::get_conf(&self.db, app, role)
            .await
            .map_err(|e| PortalError::unavailable(app, role, e.to_string()))?;
        if conf.is_none() {
            debug!(app, role, "no configuration row");
        }
        Ok(conf)
    }

    async fn roles(&self, app: &str) -> Result<Vec<String>, PortalError> {
        queries::apps::list_roles(&self.db, app).await
    }

    async fn health_check(&self) -> Result<HealthStatus, PortalError> {
        let probe = self
            .db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_call_err);
        Ok(match probe {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}
