// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request configuration pipeline.
//!
//! For each request the configurator fetches the role's override document
//! (bounded by a timeout), takes a private copy of the shared registry, merges
//! the document into the copy, and hands back the enabled plugins together
//! with every non-fatal problem met on the way.
//!
//! The shared registry is never mutated by a request. It is only replaced
//! wholesale through [`PortalConfigurator::reload_plugins`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use portal_core::{ConfigurationProvider, PortalError};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::descriptor::PluginDescriptor;
use crate::payload::ClientPayload;
use crate::registry::{EnabledPlugin, MergeOutcome, PluginRegistry};

/// Whole-request document: plugin name to override document.
type RequestDocument = Map<String, Value>;

/// Where the override document of a request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Fetched from the provider for this request.
    Fresh,
    /// The provider failed; the last good document of `role` was used.
    Stale { role: String },
}

/// Outcome of configuring one request.
#[derive(Debug)]
pub struct RequestConfiguration {
    /// Role the request was configured for.
    pub role: String,
    pub source: DocumentSource,
    /// Enabled plugins with their effective configuration, in registration order.
    pub plugins: Vec<EnabledPlugin>,
    /// Malformed overrides and unknown plugin references. Never fatal.
    pub issues: Vec<PortalError>,
}

impl RequestConfiguration {
    /// Build the client payload for this request.
    pub fn payload(&self) -> ClientPayload {
        ClientPayload::from_enabled(&self.plugins)
    }

    /// Whether a stale document was used.
    pub fn is_stale(&self) -> bool {
        self.source != DocumentSource::Fresh
    }
}

/// Configures requests for one application against one provider.
pub struct PortalConfigurator {
    registry: ArcSwap<PluginRegistry>,
    provider: Arc<dyn ConfigurationProvider>,
    app: String,
    fetch_timeout: Duration,
    last_good: RwLock<HashMap<String, RequestDocument>>,
}

impl PortalConfigurator {
    pub fn new(
        registry: PluginRegistry,
        provider: Arc<dyn ConfigurationProvider>,
        app: impl Into<String>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            registry: ArcSwap::from_pointee(registry),
            provider,
            app: app.into(),
            fetch_timeout,
            last_good: RwLock::new(HashMap::new()),
        }
    }

    /// The application this configurator serves.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// The role used when a request carries none.
    pub fn default_role(&self) -> &str {
        self.provider.default_role()
    }

    /// Current shared registry.
    pub fn registry(&self) -> Arc<PluginRegistry> {
        self.registry.load_full()
    }

    /// Replace the shared registry with one built from `descriptors`.
    ///
    /// In-flight requests keep the registry they started with.
    pub fn reload_plugins<I>(&self, descriptors: I) -> Result<(), PortalError>
    where
        I: IntoIterator<Item = PluginDescriptor>,
    {
        let registry = PluginRegistry::new(descriptors)?;
        info!(app = %self.app, plugins = registry.len(), "plugin registry reloaded");
        self.registry.store(Arc::new(registry));
        Ok(())
    }

    /// Fetch the default role's document once, so later failures have a
    /// last good copy to fall back on.
    ///
    /// Fails with `ConfigurationUnavailable` when the default document
    /// cannot be obtained.
    pub async fn establish_default(&self) -> Result<(), PortalError> {
        let role = self.default_role().to_string();
        self.fetch_fresh(&role).await.map(|_| ())
    }

    /// Configure a request for `role`, or the default role when `None`.
    ///
    /// Fails only when neither a fresh nor a last good document is available.
    pub async fn configure(&self, role: Option<&str>) -> Result<RequestConfiguration, PortalError> {
        let role = role.unwrap_or(self.default_role()).to_string();
        let (document, source) = self.resolve_document(&role).await?;

        let mut registry = PluginRegistry::clone(&self.registry.load());
        let issues = registry.merge_document(&document);
        debug!(
            app = %self.app,
            role = %role,
            issues = issues.len(),
            "request configured"
        );

        Ok(RequestConfiguration {
            role,
            source,
            plugins: registry.get_enabled(),
            issues,
        })
    }

    /// Configure a request from already-split `(plugin, override text)` pairs.
    ///
    /// The provider is not consulted.
    pub fn configure_pairs<'a, I>(&self, role: &str, pairs: I) -> RequestConfiguration
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut registry = PluginRegistry::clone(&self.registry.load());
        let mut issues = Vec::new();
        for (plugin, raw) in pairs {
            match registry.merge_override_text(plugin, raw) {
                Ok(MergeOutcome::Applied) => {}
                Ok(MergeOutcome::UnknownPlugin) => {
                    issues.push(PortalError::UnknownPlugin {
                        name: plugin.to_string(),
                    });
                }
                Err(e) => {
                    warn!(plugin, error = %e, "override rejected, using defaults");
                    issues.push(e);
                }
            }
        }

        RequestConfiguration {
            role: role.to_string(),
            source: DocumentSource::Fresh,
            plugins: registry.get_enabled(),
            issues,
        }
    }

    async fn resolve_document(
        &self,
        role: &str,
    ) -> Result<(RequestDocument, DocumentSource), PortalError> {
        let err = match self.fetch_fresh(role).await {
            Ok(document) => return Ok((document, DocumentSource::Fresh)),
            Err(e) => e,
        };
        warn!(app = %self.app, role, error = %err, "configuration fetch failed");

        let last_good = self.last_good.read().await;
        let default_role = self.default_role();
        for candidate in [role, default_role] {
            if let Some(document) = last_good.get(candidate) {
                info!(app = %self.app, role, stale_role = candidate, "serving last good configuration");
                return Ok((
                    document.clone(),
                    DocumentSource::Stale {
                        role: candidate.to_string(),
                    },
                ));
            }
        }
        Err(err)
    }

    async fn fetch_fresh(&self, role: &str) -> Result<RequestDocument, PortalError> {
        let fetched = tokio::time::timeout(self.fetch_timeout, self.provider.fetch(&self.app, role))
            .await
            .map_err(|_| {
                PortalError::unavailable(
                    &self.app,
                    role,
                    format!("fetch timed out after {}ms", self.fetch_timeout.as_millis()),
                )
            })??;

        let document = parse_document(&self.app, role, &fetched.text)?;
        if fetched.role != role {
            debug!(app = %self.app, role, matched = %fetched.role, "using default role document");
        }

        // Keyed by the role that matched, so fallback roles share one entry.
        self.last_good
            .write()
            .await
            .insert(fetched.role, document.clone());
        Ok(document)
    }
}

/// Parse a whole-request document. A document that is not a JSON object is
/// treated like an unreachable backend.
fn parse_document(app: &str, role: &str, text: &str) -> Result<RequestDocument, PortalError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(PortalError::unavailable(
            app,
            role,
            "override document is not a JSON object",
        )),
        Err(e) => Err(PortalError::unavailable(
            app,
            role,
            format!("malformed override document: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use portal_test_utils::MockProvider;
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::descriptor::parse_plugin_descriptor;

    fn descriptors() -> Vec<PluginDescriptor> {
        vec![
            parse_plugin_descriptor(
                "base",
                r#"{ "default-conf": { "map": { "zoom": 3, "center": [0, 0] } } }"#,
            )
            .unwrap()
            .with_module("map"),
            parse_plugin_descriptor("layers", r#"{ "default-conf": { "layers": { "url": "/wms" } } }"#)
                .unwrap()
                .with_module("layers"),
        ]
    }

    fn configurator(provider: MockProvider) -> PortalConfigurator {
        PortalConfigurator::new(
            PluginRegistry::new(descriptors()).unwrap(),
            Arc::new(provider),
            "demo",
            Duration::from_millis(500),
        )
    }

    fn plugin<'a>(config: &'a RequestConfiguration, name: &str) -> Option<&'a EnabledPlugin> {
        config.plugins.iter().find(|p| p.name() == name)
    }

    #[tokio::test]
    async fn role_document_is_merged() {
        let provider = MockProvider::with_documents([
            ("default", "{}"),
            ("admin", r#"{ "base": { "map": { "zoom": 8 } }, "layers": { "_enabled": false } }"#),
        ]);
        let configured = configurator(provider).configure(Some("admin")).await.unwrap();

        assert_eq!(configured.role, "admin");
        assert_eq!(configured.source, DocumentSource::Fresh);
        assert!(configured.issues.is_empty());
        assert_eq!(configured.plugins.len(), 1);
        assert_eq!(
            Value::Object(configured.plugins[0].configuration.clone()),
            json!({ "map": { "zoom": 8, "center": [0, 0] } })
        );
    }

    #[tokio::test]
    async fn missing_role_uses_default() {
        let provider = MockProvider::with_documents([("default", r#"{ "layers": { "_enabled": false } }"#)]);
        let portal = configurator(provider);

        let anonymous = portal.configure(None).await.unwrap();
        assert_eq!(anonymous.role, "default");
        assert!(plugin(&anonymous, "layers").is_none());

        let guest = portal.configure(Some("guest")).await.unwrap();
        assert_eq!(guest.role, "guest");
        assert!(plugin(&guest, "layers").is_none());
    }

    #[tokio::test]
    async fn missing_default_document_is_unavailable() {
        let portal = configurator(MockProvider::new());
        for role in [None, Some("guest")] {
            let err = portal.configure(role).await.unwrap_err();
            assert!(matches!(err, PortalError::ConfigurationUnavailable { .. }));
        }
        assert!(portal.establish_default().await.is_err());
    }

    #[tokio::test]
    async fn removed_default_serves_last_good_default() {
        let provider = MockProvider::with_documents([("default", r#"{ "layers": { "_enabled": false } }"#)]);
        let handle = provider.clone();
        let portal = configurator(provider);
        portal.establish_default().await.unwrap();

        handle.remove_document("default").await;
        let configured = portal.configure(Some("guest")).await.unwrap();
        assert_eq!(
            configured.source,
            DocumentSource::Stale {
                role: "default".to_string()
            }
        );
        assert!(plugin(&configured, "layers").is_none());
    }

    #[tokio::test]
    async fn fallback_roles_share_the_default_entry() {
        let provider = MockProvider::with_documents([
            ("default", r#"{ "layers": { "_enabled": false } }"#),
            ("admin", "{}"),
        ]);
        let portal = configurator(provider);

        for i in 0..1000 {
            let role = format!("role-{i}");
            let configured = portal.configure(Some(role.as_str())).await.unwrap();
            assert!(plugin(&configured, "layers").is_none());
        }
        assert_eq!(portal.last_good.read().await.len(), 1);

        portal.configure(Some("admin")).await.unwrap();
        let last_good = portal.last_good.read().await;
        assert_eq!(last_good.len(), 2);
        assert!(last_good.contains_key("admin"));
    }

    #[tokio::test]
    async fn malformed_plugin_override_is_reported_not_fatal() {
        let provider = MockProvider::with_documents([(
            "default",
            r#"{ "base": { "_override": "yes" }, "layers": { "layers": { "url": "/ows" } }, "ghost": {} }"#,
        )]);
        let configured = configurator(provider).configure(None).await.unwrap();

        assert_eq!(configured.issues.len(), 2);
        assert_eq!(configured.issues[0].plugin(), Some("base"));
        assert!(matches!(configured.issues[1], PortalError::UnknownPlugin { .. }));
        assert_eq!(
            plugin(&configured, "base").unwrap().configuration["map"],
            json!({ "zoom": 3, "center": [0, 0] })
        );
        assert_eq!(
            plugin(&configured, "layers").unwrap().configuration["layers"],
            json!({ "url": "/ows" })
        );
    }

    #[tokio::test]
    async fn requests_do_not_leak_into_shared_registry() {
        let provider = MockProvider::with_documents([
            ("default", "{}"),
            ("admin", r#"{ "base": { "_override": true } }"#),
        ]);
        let portal = configurator(provider);

        let admin = portal.configure(Some("admin")).await.unwrap();
        assert!(plugin(&admin, "base").unwrap().configuration.is_empty());

        let anonymous = portal.configure(None).await.unwrap();
        assert_eq!(
            plugin(&anonymous, "base").unwrap().configuration["map"]["zoom"],
            json!(3)
        );
        assert_eq!(
            portal.registry().get("base").unwrap().configuration()["map"]["zoom"],
            json!(3)
        );
    }

    #[tokio::test]
    async fn concurrent_requests_are_isolated() {
        let provider = MockProvider::with_documents([
            ("default", "{}"),
            ("a", r#"{ "base": { "map": { "zoom": 1 } } }"#),
            ("b", r#"{ "base": { "map": { "zoom": 2 } } }"#),
        ]);
        let portal = Arc::new(configurator(provider));

        let mut handles = Vec::new();
        for i in 0..16 {
            let portal = Arc::clone(&portal);
            handles.push(tokio::spawn(async move {
                let role = if i % 2 == 0 { "a" } else { "b" };
                let configured = portal.configure(Some(role)).await.unwrap();
                (role, plugin(&configured, "base").unwrap().configuration["map"]["zoom"].clone())
            }));
        }
        for handle in handles {
            let (role, zoom) = handle.await.unwrap();
            let expected = if role == "a" { json!(1) } else { json!(2) };
            assert_eq!(zoom, expected);
        }
    }

    #[tokio::test]
    async fn unreachable_provider_without_history_is_fatal() {
        let provider = MockProvider::new();
        provider.set_unreachable(true);
        let err = configurator(provider).configure(None).await.unwrap_err();
        assert!(matches!(err, PortalError::ConfigurationUnavailable { .. }));
    }

    #[tokio::test]
    #[traced_test]
    async fn role_falls_back_to_its_own_stale_copy() {
        let provider = MockProvider::with_documents([
            ("default", "{}"),
            ("admin", r#"{ "layers": { "_enabled": false } }"#),
        ]);
        let handle = provider.clone();
        let portal = configurator(provider);
        portal.configure(Some("admin")).await.unwrap();

        handle.set_unreachable(true);
        let configured = portal.configure(Some("admin")).await.unwrap();
        assert_eq!(
            configured.source,
            DocumentSource::Stale {
                role: "admin".to_string()
            }
        );
        assert!(configured.is_stale());
        assert!(plugin(&configured, "layers").is_none());
        assert!(logs_contain("serving last good configuration"));
    }

    #[tokio::test]
    async fn role_without_history_falls_back_to_stale_default() {
        let provider = MockProvider::with_documents([("default", r#"{ "base": { "map": { "zoom": 5 } } }"#)]);
        let handle = provider.clone();
        let portal = configurator(provider);
        portal.establish_default().await.unwrap();

        handle.set_unreachable(true);
        let configured = portal.configure(Some("guest")).await.unwrap();
        assert_eq!(
            configured.source,
            DocumentSource::Stale {
                role: "default".to_string()
            }
        );
        assert_eq!(
            plugin(&configured, "base").unwrap().configuration["map"]["zoom"],
            json!(5)
        );
    }

    #[tokio::test]
    async fn malformed_document_uses_stale_copy() {
        let provider = MockProvider::with_documents([("default", r#"{ "layers": { "_enabled": false } }"#)]);
        let handle = provider.clone();
        let portal = configurator(provider);
        portal.establish_default().await.unwrap();

        handle.set_document("default", "[1, 2]").await;
        let configured = portal.configure(None).await.unwrap();
        assert!(configured.is_stale());
        assert!(plugin(&configured, "layers").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let provider = MockProvider::with_documents([("default", "{}")])
            .with_delay(Duration::from_secs(10));
        let err = configurator(provider).configure(None).await.unwrap_err();
        match err {
            PortalError::ConfigurationUnavailable { role, reason, .. } => {
                assert_eq!(role, "default");
                assert!(reason.contains("timed out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_cacheable_provider_is_asked_every_request() {
        let provider = MockProvider::with_documents([("default", "{}")]).cacheable(false);
        let handle = provider.clone();
        let portal = configurator(provider);

        portal.configure(None).await.unwrap();
        handle
            .set_document("default", r#"{ "layers": { "_enabled": false } }"#)
            .await;
        let configured = portal.configure(None).await.unwrap();

        assert!(plugin(&configured, "layers").is_none());
        assert_eq!(handle.lookup_count(), 2);
    }

    #[test]
    fn configure_pairs_merges_text_overrides() {
        let portal = configurator(MockProvider::new());
        let configured = portal.configure_pairs(
            "admin",
            [
                ("base", r#"{ "map": { "zoom": 9 } }"#),
                ("layers", "{ not json"),
                ("ghost", "{}"),
            ],
        );

        assert_eq!(configured.role, "admin");
        assert_eq!(configured.issues.len(), 2);
        assert_eq!(
            plugin(&configured, "base").unwrap().configuration["map"]["zoom"],
            json!(9)
        );
        assert_eq!(
            plugin(&configured, "layers").unwrap().configuration["layers"],
            json!({ "url": "/wms" })
        );
    }

    #[tokio::test]
    async fn reload_replaces_shared_registry() {
        let portal = configurator(MockProvider::with_documents([("default", "{}")]));
        portal
            .reload_plugins([PluginDescriptor::new("solo").with_module("solo")])
            .unwrap();

        let configured = portal.configure(None).await.unwrap();
        assert_eq!(configured.plugins.len(), 1);
        assert_eq!(configured.payload().modules, ["solo"]);

        let err = portal
            .reload_plugins([PluginDescriptor::new("x"), PluginDescriptor::new("x")])
            .unwrap_err();
        assert!(matches!(err, PortalError::DuplicatePlugin { .. }));
        assert_eq!(portal.registry().len(), 1);
    }
}
