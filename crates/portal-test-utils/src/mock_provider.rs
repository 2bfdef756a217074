// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock configuration provider for deterministic testing.
//!
//! `MockProvider` implements `ConfigurationProvider` over an in-memory map of
//! role to document text. Tests can take the backend down, slow it down, and
//! count how often it was asked.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use portal_core::{ConfigurationProvider, HealthStatus, PortalError};

/// A mock provider serving pre-configured documents by role.
///
/// The application name is ignored: every app sees the same documents.
/// Clones share state, so a test can keep a handle after moving the
/// provider into the code under test.
#[derive(Clone)]
pub struct MockProvider {
    documents: Arc<Mutex<HashMap<String, String>>>,
    unreachable: Arc<AtomicBool>,
    lookups: Arc<AtomicUsize>,
    delay: Option<Duration>,
    cacheable: bool,
}

impl MockProvider {
    /// Create a reachable, cacheable provider with no documents.
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
            unreachable: Arc::new(AtomicBool::new(false)),
            lookups: Arc::new(AtomicUsize::new(0)),
            delay: None,
            cacheable: true,
        }
    }

    /// Create a provider pre-loaded with `(role, document)` pairs.
    pub fn with_documents<I, R, D>(documents: I) -> Self
    where
        I: IntoIterator<Item = (R, D)>,
        R: Into<String>,
        D: Into<String>,
    {
        let provider = Self::new();
        let map = documents
            .into_iter()
            .map(|(role, doc)| (role.into(), doc.into()))
            .collect();
        Self {
            documents: Arc::new(Mutex::new(map)),
            ..provider
        }
    }

    /// Wait this long before answering each lookup.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set what `is_cacheable` reports.
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Store or replace the document for `role`.
    pub async fn set_document(&self, role: &str, document: &str) {
        self.documents
            .lock()
            .await
            .insert(role.to_string(), document.to_string());
    }

    /// Remove the document for `role`.
    pub async fn remove_document(&self, role: &str) {
        self.documents.lock().await.remove(role);
    }

    /// Make every following lookup fail (or succeed again).
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of lookups served so far, failed ones included.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigurationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    async fn lookup(&self, app: &str, role: &str) -> Result<Option<String>, PortalError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PortalError::unavailable(app, role, "mock backend is down"));
        }
        let document = self.documents.lock().await.get(role).cloned();
        debug!(app, role, found = document.is_some(), "mock lookup");
        Ok(document)
    }

    async fn roles(&self, app: &str) -> Result<Vec<String>, PortalError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PortalError::unavailable(app, "*", "mock backend is down"));
        }
        let mut roles: Vec<String> = self.documents.lock().await.keys().cloned().collect();
        roles.sort();
        Ok(roles)
    }

    async fn health_check(&self) -> Result<HealthStatus, PortalError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("mock backend is down".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}
