// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memoizing wrapper for cacheable providers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use portal_core::{ConfigurationProvider, HealthStatus, PortalError};

type CacheKey = (String, String);

/// Remembers every document found by a cacheable provider until
/// [`CachingProvider::invalidate`] is called.
///
/// Only found documents are kept. Misses go to the inner provider every
/// time, so arbitrary role strings cannot grow the cache.
///
/// Wrapping a provider that is not cacheable is allowed; every lookup then
/// goes straight to it.
pub struct CachingProvider<P> {
    inner: P,
    name: String,
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl<P: ConfigurationProvider> CachingProvider<P> {
    pub fn new(inner: P) -> Self {
        let name = format!("cached-{}", inner.name());
        Self {
            inner,
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop every memoized document.
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        debug!(provider = %self.name, dropped = entries.len(), "configuration cache invalidated");
        entries.clear();
    }

    /// Number of memoized `(app, role)` documents.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl<P: ConfigurationProvider> ConfigurationProvider for CachingProvider<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_cacheable(&self) -> bool {
        self.inner.is_cacheable()
    }

    fn default_role(&self) -> &str {
        self.inner.default_role()
    }

    async fn lookup(&self, app: &str, role: &str) -> Result<Option<String>, PortalError> {
        if !self.inner.is_cacheable() {
            return self.inner.lookup(app, role).await;
        }

        let key = (app.to_string(), role.to_string());
        if let Some(hit) = self.entries.read().await.get(&key) {
            debug!(app, role, "configuration cache hit");
            return Ok(Some(hit.clone()));
        }

        let document = self.inner.lookup(app, role).await?;
        if let Some(text) = &document {
            self.entries.write().await.insert(key, text.clone());
        }
        Ok(document)
    }

    async fn roles(&self, app: &str) -> Result<Vec<String>, PortalError> {
        self.inner.roles(app).await
    }

    async fn health_check(&self) -> Result<HealthStatus, PortalError> {
        self.inner.health_check().await
    }
}
