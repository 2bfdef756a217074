// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration providers for the portal.
//!
//! Two backends serve override documents by `(app, role)`: a directory of
//! JSON files and a SQLite `apps` table with embedded migrations. Cacheable
//! backends can be wrapped in a memoizing [`CachingProvider`].

pub mod cache;
pub mod database;
pub mod fs;
pub mod migrations;
pub mod queries;
pub mod sqlite;

use std::sync::Arc;

use portal_config::PortalConfig;
use portal_core::{ConfigurationProvider, PortalError, ProviderKind};
use tracing::info;

pub use cache::CachingProvider;
pub use database::Database;
pub use fs::FileConfigurationProvider;
pub use sqlite::SqliteConfigurationProvider;

/// Build the provider selected by `[provider]`.
pub async fn build_provider(
    config: &PortalConfig,
) -> Result<Arc<dyn ConfigurationProvider>, PortalError> {
    let provider = &config.provider;
    let portal = &config.portal;
    let built: Arc<dyn ConfigurationProvider> = match provider.kind {
        ProviderKind::File => {
            let files = FileConfigurationProvider::new(&provider.config_dir)
                .with_default_role(&portal.default_role);
            if provider.cache {
                Arc::new(CachingProvider::new(files))
            } else {
                Arc::new(files)
            }
        }
        ProviderKind::Sqlite => {
            let db = Database::open(&provider.database_path).await?;
            Arc::new(
                SqliteConfigurationProvider::with_database(db, &portal.app, &portal.default_role)
                    .await?,
            )
        }
    };
    info!(
        kind = %provider.kind,
        provider = built.name(),
        app = %portal.app,
        "configuration provider ready"
    );
    Ok(built)
}
