// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the portal plugin framework.
//!
//! This crate provides the error type, the configuration provider trait and
//! the common types used throughout the portal workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PortalError;
pub use traits::ConfigurationProvider;
pub use types::{DEFAULT_ROLE, FetchedDocument, HealthStatus, ProviderKind};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tracing_test::traced_test;

    use super::*;

    /// Minimal in-memory provider keyed by role.
    struct RoleMap {
        docs: HashMap<String, String>,
        reachable: bool,
    }

    impl RoleMap {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                docs: entries
                    .iter()
                    .map(|(role, doc)| (role.to_string(), doc.to_string()))
                    .collect(),
                reachable: true,
            }
        }
    }

    #[async_trait]
    impl ConfigurationProvider for RoleMap {
        fn name(&self) -> &str {
            "role-map"
        }

        fn is_cacheable(&self) -> bool {
            true
        }

        async fn lookup(&self, app: &str, role: &str) -> Result<Option<String>, PortalError> {
            if !self.reachable {
                return Err(PortalError::unavailable(app, role, "backend down"));
            }
            Ok(self.docs.get(role).cloned())
        }

        async fn roles(&self, _app: &str) -> Result<Vec<String>, PortalError> {
            let mut roles: Vec<String> = self.docs.keys().cloned().collect();
            roles.sort();
            Ok(roles)
        }

        async fn health_check(&self) -> Result<HealthStatus, PortalError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[tokio::test]
    async fn fetch_prefers_role_document() {
        let provider = RoleMap::new(&[("default", "{}"), ("admin", r#"{"p1":{}}"#)]);
        let doc = provider.fetch("app", "admin").await.unwrap();
        assert_eq!(doc.role, "admin");
        assert_eq!(doc.text, r#"{"p1":{}}"#);
    }

    #[tokio::test]
    #[traced_test]
    async fn fetch_falls_back_to_default_role() {
        let provider = RoleMap::new(&[("default", "{}")]);
        let doc = provider.fetch("app", "guest").await.unwrap();
        assert_eq!(doc.role, DEFAULT_ROLE);
        assert_eq!(doc.text, "{}");
        assert!(logs_contain("falling back to default role"));
    }

    #[tokio::test]
    async fn fetch_without_default_document_is_unavailable() {
        let provider = RoleMap::new(&[("admin", "{}")]);
        for role in ["guest", DEFAULT_ROLE] {
            let err = provider.fetch("app", role).await.unwrap_err();
            match err {
                PortalError::ConfigurationUnavailable { role: failed, reason, .. } => {
                    assert_eq!(failed, role);
                    assert!(reason.contains("no default document"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(provider.roles("app").await.unwrap(), ["admin"]);
    }

    #[tokio::test]
    async fn fetch_propagates_unreachable_backend() {
        let mut provider = RoleMap::new(&[("default", "{}")]);
        provider.reachable = false;
        let err = provider.fetch("app", "guest").await.unwrap_err();
        assert!(matches!(err, PortalError::ConfigurationUnavailable { .. }));
    }

    #[test]
    fn provider_kind_parses_case_insensitively() {
        use std::str::FromStr;

        assert_eq!(ProviderKind::from_str("file").unwrap(), ProviderKind::File);
        assert_eq!(ProviderKind::from_str("SQLite").unwrap(), ProviderKind::Sqlite);
        assert_eq!(ProviderKind::Sqlite.to_string(), "sqlite");
        assert!(ProviderKind::from_str("postgres").is_err());
    }

    #[test]
    fn provider_kind_serialization() {
        let json = serde_json::to_string(&ProviderKind::File).expect("should serialize");
        assert_eq!(json, "\"file\"");
        let parsed: ProviderKind = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(parsed, ProviderKind::File);
    }

    #[test]
    fn error_plugin_attribution() {
        let parse = PortalError::parse("p1", "{", "EOF while parsing");
        assert_eq!(parse.plugin(), Some("p1"));
        assert!(parse.to_string().contains("p1"));

        let unknown = PortalError::UnknownPlugin { name: "ghost".into() };
        assert_eq!(unknown.plugin(), Some("ghost"));

        let unavailable = PortalError::unavailable("app", "default", "no row");
        assert_eq!(unavailable.plugin(), None);
        assert!(unavailable.to_string().contains("role `default`"));
    }
}
