// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registry holding descriptors and their per-plugin merge state.
//!
//! The registry is built once from the deployed descriptors. Descriptors are
//! shared behind `Arc`, so cloning a registry copies only the merge state;
//! request handling clones the shared registry and merges into the clone.
//!
//! Merging into the same registry instance more than once is
//! history-sensitive: each call merges into the current state, not into the
//! descriptor defaults.

use std::collections::HashMap;
use std::sync::Arc;

use portal_core::PortalError;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::descriptor::{ModuleConfigs, PluginDescriptor};
use crate::envelope::OverrideDocument;
use crate::merge::merge;

/// Result of applying an override to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The override was merged into the named plugin.
    Applied,
    /// No plugin with that name is registered; nothing changed.
    UnknownPlugin,
}

/// A registered plugin and its current merge state.
#[derive(Debug, Clone)]
pub struct PluginEntry {
    descriptor: Arc<PluginDescriptor>,
    enabled: bool,
    configuration: ModuleConfigs,
}

impl PluginEntry {
    fn seeded(descriptor: Arc<PluginDescriptor>) -> Self {
        let configuration = descriptor.default_configuration.clone();
        Self {
            descriptor,
            enabled: true,
            configuration,
        }
    }

    /// The plugin's descriptor.
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Whether the most recent override left the plugin enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The plugin's effective configuration.
    pub fn configuration(&self) -> &ModuleConfigs {
        &self.configuration
    }

    fn reset(&mut self) {
        self.enabled = true;
        self.configuration = self.descriptor.default_configuration.clone();
    }
}

/// An enabled plugin paired with its effective configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnabledPlugin {
    pub descriptor: Arc<PluginDescriptor>,
    pub configuration: ModuleConfigs,
}

impl EnabledPlugin {
    /// The plugin's name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Module ids this plugin offers to the client (none for pseudo-modules).
    pub fn root_modules(&self) -> &[String] {
        self.descriptor.root_modules()
    }
}

/// Registry of deployed plugins, keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    entries: Vec<PluginEntry>,
    index: HashMap<String, usize>,
}

impl PluginRegistry {
    /// Build a registry seeded with each descriptor's defaults, all enabled.
    ///
    /// Fails on duplicate plugin names.
    pub fn new<I>(descriptors: I) -> Result<Self, PortalError>
    where
        I: IntoIterator<Item = PluginDescriptor>,
    {
        let mut registry = Self::default();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        debug!(count = registry.len(), "plugin registry built");
        Ok(registry)
    }

    /// Register one more descriptor.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> Result<(), PortalError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(PortalError::DuplicatePlugin {
                name: descriptor.name,
            });
        }
        self.index
            .insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(PluginEntry::seeded(Arc::new(descriptor)));
        Ok(())
    }

    /// Get a plugin entry by name.
    pub fn get(&self, name: &str) -> Option<&PluginEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Apply a parsed override document to the named plugin only.
    ///
    /// Unknown names are ignored (logged at `warn`), so a deployment may carry
    /// overrides for plugins it does not ship.
    pub fn merge_override(&mut self, name: &str, doc: &OverrideDocument) -> MergeOutcome {
        let Some(&i) = self.index.get(name) else {
            warn!(plugin = name, "override references unknown plugin, ignoring");
            return MergeOutcome::UnknownPlugin;
        };
        let entry = &mut self.entries[i];
        entry.configuration = merge(&entry.configuration, doc);
        entry.enabled = doc.enabled;
        debug!(
            plugin = name,
            enabled = doc.enabled,
            replace = doc.replace,
            "override merged"
        );
        MergeOutcome::Applied
    }

    /// Parse and apply an override given as a JSON value.
    ///
    /// On a parse error the plugin is reset to its defaults and the error is
    /// returned for the caller to report.
    pub fn merge_override_value(
        &mut self,
        name: &str,
        value: &Value,
    ) -> Result<MergeOutcome, PortalError> {
        if !self.index.contains_key(name) {
            return Ok(self.merge_override(name, &OverrideDocument::default()));
        }
        match OverrideDocument::from_value(name, value) {
            Ok(doc) => Ok(self.merge_override(name, &doc)),
            Err(e) => {
                self.reset(name);
                Err(e)
            }
        }
    }

    /// Parse and apply an override given as JSON text.
    pub fn merge_override_text(&mut self, name: &str, raw: &str) -> Result<MergeOutcome, PortalError> {
        if !self.index.contains_key(name) {
            return Ok(self.merge_override(name, &OverrideDocument::default()));
        }
        match OverrideDocument::parse(name, raw) {
            Ok(doc) => Ok(self.merge_override(name, &doc)),
            Err(e) => {
                self.reset(name);
                Err(e)
            }
        }
    }

    /// Apply a whole-request document mapping plugin names to overrides.
    ///
    /// Returns the non-fatal problems met on the way: malformed per-plugin
    /// overrides and references to unknown plugins.
    pub fn merge_document(&mut self, document: &Map<String, Value>) -> Vec<PortalError> {
        let mut issues = Vec::new();
        for (name, value) in document {
            match self.merge_override_value(name, value) {
                Ok(MergeOutcome::Applied) => {}
                Ok(MergeOutcome::UnknownPlugin) => {
                    issues.push(PortalError::UnknownPlugin { name: name.clone() });
                }
                Err(e) => {
                    warn!(plugin = %name, error = %e, "override rejected, using defaults");
                    issues.push(e);
                }
            }
        }
        issues
    }

    /// Restore the named plugin to its descriptor defaults, enabled.
    ///
    /// Returns false if no such plugin is registered.
    pub fn reset(&mut self, name: &str) -> bool {
        match self.index.get(name) {
            Some(&i) => {
                self.entries[i].reset();
                true
            }
            None => false,
        }
    }

    /// Every enabled plugin with its effective configuration, in registration order.
    pub fn get_enabled(&self) -> Vec<EnabledPlugin> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| EnabledPlugin {
                descriptor: Arc::clone(&e.descriptor),
                configuration: e.configuration.clone(),
            })
            .collect()
    }

    /// Root module ids of the enabled plugins, pseudo-modules excluded.
    pub fn root_modules(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .flat_map(|e| e.descriptor.root_modules().iter().cloned())
            .collect()
    }

    /// List all plugin entries, sorted by name.
    pub fn list_all(&self) -> Vec<&PluginEntry> {
        let mut entries: Vec<&PluginEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.descriptor.name.cmp(&b.descriptor.name));
        entries
    }

    /// Returns the number of registered plugins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no plugins are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::descriptor::parse_plugin_descriptor;

    fn descriptor(name: &str, json: &str) -> PluginDescriptor {
        parse_plugin_descriptor(name, json).unwrap()
    }

    fn p1() -> PluginDescriptor {
        descriptor(
            "p1",
            r#"{ "default-conf": { "m1": { "a": 1, "b": 2 }, "m2": { "c": 1, "d": 2 } } }"#,
        )
        .with_modules(["m1", "m2"])
    }

    fn doc(value: Value) -> OverrideDocument {
        OverrideDocument::from_value("test", &value).unwrap()
    }

    #[test]
    fn defaults_survive_empty_override() {
        let mut registry = PluginRegistry::new([p1()]).unwrap();
        registry.merge_override("p1", &OverrideDocument::default());

        let enabled = registry.get_enabled();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].configuration, p1().default_configuration);
        assert_eq!(enabled[0].root_modules(), ["m1", "m2"]);
    }

    #[test]
    fn plugins_are_enabled_without_any_override() {
        let registry = PluginRegistry::new([p1()]).unwrap();
        assert_eq!(registry.get_enabled().len(), 1);
        assert!(registry.get("p1").unwrap().is_enabled());
    }

    #[test]
    fn disabled_plugins_are_not_returned() {
        let p2 = descriptor("p2", r#"{ "default-conf": { "m3": { "a": 1 } } }"#);
        let mut registry = PluginRegistry::new([p1(), p2]).unwrap();
        registry.merge_override(
            "p1",
            &doc(json!({ "_enabled": false, "m1": { "a": 1 }, "m2": { "c": 1 } })),
        );
        registry.merge_override("p2", &doc(json!({ "_enabled": true, "m3": { "b": 2 } })));

        let enabled = registry.get_enabled();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name(), "p2");
        let keys: Vec<&String> = enabled[0].configuration.keys().collect();
        assert_eq!(keys, ["m3"]);
    }

    #[test]
    fn absent_enabled_means_enabled() {
        let mut registry = PluginRegistry::new([p1()]).unwrap();
        registry.merge_override("p1", &doc(json!({ "_enabled": false })));
        assert!(registry.get_enabled().is_empty());
        registry.merge_override("p1", &doc(json!({ "m1": { "a": 3 } })));
        assert_eq!(registry.get_enabled().len(), 1);
    }

    #[test]
    fn default_configuration_is_merged() {
        let mut registry = PluginRegistry::new([p1()]).unwrap();
        registry.merge_override("p1", &doc(json!({ "_enabled": true, "m1": { "a": 10 } })));

        let conf = &registry.get_enabled()[0].configuration;
        assert_eq!(
            Value::Object(conf.clone()),
            json!({ "m1": { "a": 10, "b": 2 }, "m2": { "c": 1, "d": 2 } })
        );
    }

    #[test]
    fn default_configuration_is_overridden_when_requested() {
        let mut registry = PluginRegistry::new([p1()]).unwrap();
        registry.merge_override(
            "p1",
            &doc(json!({ "_override": true, "_enabled": true, "m1": { "a": 10 } })),
        );

        let conf = &registry.get_enabled()[0].configuration;
        assert_eq!(Value::Object(conf.clone()), json!({ "m1": { "a": 10 } }));
    }

    #[test]
    fn pseudo_modules_keep_configuration_but_not_root_entries() {
        let pseudo = descriptor(
            "p1",
            r#"{ "installInRoot": false, "default-conf": { "m1": { "a": 1, "b": 2 }, "m2": { "c": 1, "d": 2 } } }"#,
        )
        .with_modules(["m1", "m2"]);
        let mut registry = PluginRegistry::new([pseudo]).unwrap();
        registry.merge_override(
            "p1",
            &doc(json!({ "_override": false, "_enabled": true, "m1": { "a": 1, "b": 2 }, "m2": { "c": 1, "d": 2 } })),
        );

        let enabled = registry.get_enabled();
        assert_eq!(enabled.len(), 1);
        assert!(enabled[0].configuration.contains_key("m1"));
        assert!(enabled[0].configuration.contains_key("m2"));
        assert!(enabled[0].root_modules().is_empty());
        assert!(registry.root_modules().is_empty());
    }

    #[test]
    fn sibling_plugins_do_not_cross_contaminate() {
        let p2 = descriptor("p2", r#"{ "default-conf": { "m2": { "b": 20 } } }"#);
        let p3 = descriptor("p3", r#"{ "default-conf": { "m1": { "a": 1 } } }"#);
        let mut registry = PluginRegistry::new([p2, p3]).unwrap();
        registry.merge_override("p3", &doc(json!({ "m1": { "a": 10 } })));

        let enabled = registry.get_enabled();
        assert_eq!(enabled.len(), 2);
        assert_eq!(enabled[0].name(), "p2");
        assert_eq!(enabled[0].configuration["m2"], json!({ "b": 20 }));
        assert_eq!(enabled[1].configuration["m1"], json!({ "a": 10 }));
    }

    #[test]
    #[traced_test]
    fn unknown_plugin_is_ignored_and_logged() {
        let mut registry = PluginRegistry::new([p1()]).unwrap();
        let outcome = registry.merge_override("ghost", &doc(json!({ "m9": { "x": 1 } })));

        assert_eq!(outcome, MergeOutcome::UnknownPlugin);
        assert_eq!(registry.get_enabled().len(), 1);
        assert!(registry.get_enabled().iter().all(|p| p.name() != "ghost"));
        assert!(logs_contain("unknown plugin"));
    }

    #[test]
    fn malformed_override_falls_back_to_defaults() {
        let mut registry = PluginRegistry::new([p1()]).unwrap();
        registry
            .merge_override_text("p1", r#"{ "_enabled": false, "m1": { "a": 5 } }"#)
            .unwrap();
        assert!(registry.get_enabled().is_empty());

        let err = registry.merge_override_text("p1", "{ m1: ").unwrap_err();
        assert!(matches!(err, PortalError::ConfigParse { ref plugin, .. } if plugin == "p1"));

        let enabled = registry.get_enabled();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].configuration, p1().default_configuration);
    }

    #[test]
    fn merge_document_collects_issues_and_continues() {
        let p2 = descriptor("p2", r#"{ "default-conf": { "m3": { "a": 1 } } }"#);
        let mut registry = PluginRegistry::new([p1(), p2]).unwrap();
        let document = json!({
            "p1": { "_enabled": "maybe" },
            "ghost": { "m9": {} },
            "p2": { "m3": { "a": 2 } }
        });
        let Value::Object(document) = document else {
            unreachable!()
        };

        let issues = registry.merge_document(&document);
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], PortalError::ConfigParse { .. }));
        assert!(matches!(issues[1], PortalError::UnknownPlugin { ref name } if name == "ghost"));
        assert_eq!(registry.get("p2").unwrap().configuration()["m3"], json!({ "a": 2 }));
        assert!(registry.get("p1").unwrap().is_enabled());
    }

    #[test]
    fn unknown_plugin_with_malformed_text_is_only_unknown() {
        let mut registry = PluginRegistry::new([p1()]).unwrap();
        let outcome = registry.merge_override_text("ghost", "not json").unwrap();
        assert_eq!(outcome, MergeOutcome::UnknownPlugin);
    }

    #[test]
    fn clones_are_isolated_from_the_original() {
        let base = PluginRegistry::new([p1()]).unwrap();
        let mut request = base.clone();
        request.merge_override("p1", &doc(json!({ "_enabled": false })));

        assert!(request.get_enabled().is_empty());
        assert_eq!(base.get_enabled().len(), 1);
        assert_eq!(
            base.get("p1").unwrap().configuration(),
            &p1().default_configuration
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = PluginRegistry::new([p1(), p1()]).unwrap_err();
        assert!(matches!(err, PortalError::DuplicatePlugin { ref name } if name == "p1"));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut registry = PluginRegistry::new([p1()]).unwrap();
        registry.merge_override("p1", &doc(json!({ "_override": true, "_enabled": false })));
        assert!(registry.reset("p1"));
        assert!(!registry.reset("ghost"));
        assert_eq!(registry.get_enabled()[0].configuration, p1().default_configuration);
    }

    #[test]
    fn list_all_returns_sorted() {
        let registry = PluginRegistry::new([
            PluginDescriptor::new("zebra"),
            PluginDescriptor::new("alpha"),
            PluginDescriptor::new("middle"),
        ])
        .unwrap();

        let all = registry.list_all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].descriptor().name, "alpha");
        assert_eq!(all[1].descriptor().name, "middle");
        assert_eq!(all[2].descriptor().name, "zebra");
    }

    #[test]
    fn len_and_is_empty() {
        let mut registry = PluginRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);

        registry.register(PluginDescriptor::new("test")).unwrap();
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
    }
}
