// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory-backed configuration provider.
//!
//! Documents live at `<root>/<app>/<role>.json`. They only change with a
//! redeploy, so the provider is cacheable.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use portal_core::{ConfigurationProvider, DEFAULT_ROLE, HealthStatus, PortalError};

/// Reads override documents from a directory tree.
pub struct FileConfigurationProvider {
    root: PathBuf,
    default_role: String,
}

impl FileConfigurationProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_role: DEFAULT_ROLE.to_string(),
        }
    }

    /// Use `role` instead of `default` as the fallback role.
    pub fn with_default_role(mut self, role: &str) -> Self {
        self.default_role = role.to_string();
        self
    }

    /// Root directory of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for an app and role, if both are safe path segments.
    pub fn document_path(&self, app: &str, role: &str) -> Option<PathBuf> {
        (is_segment(app) && is_segment(role))
            .then(|| self.root.join(app).join(format!("{role}.json")))
    }
}

/// A single, non-traversing path component.
fn is_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\', '\0'])
}

#[async_trait]
impl ConfigurationProvider for FileConfigurationProvider {
    fn name(&self) -> &str {
        "file"
    }

    fn is_cacheable(&self) -> bool {
        true
    }

    fn default_role(&self) -> &str {
        &self.default_role
    }

    async fn lookup(&self, app: &str, role: &str) -> Result<Option<String>, PortalError> {
        let Some(path) = self.document_path(app, role) else {
            debug!(app, role, "role is not a valid file name, treating as absent");
            return Ok(None);
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file");
                Ok(None)
            }
            Err(e) => Err(PortalError::unavailable(
                app,
                role,
                format!("cannot read {}: {e}", path.display()),
            )),
        }
    }

    async fn roles(&self, app: &str) -> Result<Vec<String>, PortalError> {
        if !is_segment(app) {
            return Ok(Vec::new());
        }
        let dir = self.root.join(app);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PortalError::Storage {
                    source: format!("cannot list {}: {e}", dir.display()).into(),
                });
            }
        };

        let mut roles = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PortalError::Storage { source: Box::new(e) })?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != std::ffi::OsStr::new("json")) {
                continue;
            }
            if let Some(role) = path.file_stem().and_then(|stem| stem.to_str()) {
                roles.push(role.to_string());
            }
        }
        roles.sort();
        Ok(roles)
    }

    async fn health_check(&self) -> Result<HealthStatus, PortalError> {
        Ok(match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Unhealthy(format!("{} is not a directory", self.root.display())),
            Err(e) => HealthStatus::Unhealthy(format!("{}: {e}", self.root.display())),
        })
    }
}
