// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration provider trait for override document sources.

use async_trait::async_trait;
use tracing::debug;

use crate::error::PortalError;
use crate::types::{DEFAULT_ROLE, FetchedDocument, HealthStatus};

/// Source of raw override documents, keyed by application and role.
///
/// A document is the JSON text of an object mapping plugin names to
/// per-plugin override documents. Providers only hand out text; parsing and
/// merging belong to the merge engine.
#[async_trait]
pub trait ConfigurationProvider: Send + Sync + 'static {
    /// Returns the human-readable name of this provider.
    fn name(&self) -> &str;

    /// Whether documents returned by this provider may be cached.
    ///
    /// Providers whose documents can change without a redeploy (database
    /// rows) return `false`, forcing a fetch and merge on every request.
    fn is_cacheable(&self) -> bool;

    /// Role used when no role-specific document exists.
    fn default_role(&self) -> &str {
        DEFAULT_ROLE
    }

    /// Looks up the document stored for exactly this role.
    ///
    /// Returns `Ok(None)` when the backend is reachable but holds no such
    /// document, and `ConfigurationUnavailable` when it cannot be reached.
    async fn lookup(&self, app: &str, role: &str) -> Result<Option<String>, PortalError>;

    /// Roles that have a document of their own for `app`, sorted.
    async fn roles(&self, app: &str) -> Result<Vec<String>, PortalError>;

    /// Fetches the document for `role`, falling back to the default role.
    ///
    /// Fails with `ConfigurationUnavailable` when neither document exists:
    /// there is no safe configuration to serve without a default.
    async fn fetch(&self, app: &str, role: &str) -> Result<FetchedDocument, PortalError> {
        if let Some(text) = self.lookup(app, role).await? {
            return Ok(FetchedDocument {
                role: role.to_string(),
                text,
            });
        }

        let default_role = self.default_role();
        if role != default_role {
            debug!(
                provider = self.name(),
                app, role, default_role, "no role document, falling back to default role"
            );
            if let Some(text) = self.lookup(app, default_role).await? {
                return Ok(FetchedDocument {
                    role: default_role.to_string(),
                    text,
                });
            }
        }

        Err(PortalError::unavailable(
            app,
            role,
            format!("no document for this role and no default document (role `{default_role}`)"),
        ))
    }

    /// Performs a health check and returns the provider's current status.
    async fn health_check(&self) -> Result<HealthStatus, PortalError>;
}
