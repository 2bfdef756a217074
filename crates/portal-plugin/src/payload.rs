// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client payload assembled from the enabled plugins of one request.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::descriptor::ModuleConfigs;
use crate::registry::EnabledPlugin;

/// Module id under which the client expects the root module list.
pub const CUSTOMIZATION_MODULE: &str = "customization";

/// What the client receives for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientPayload {
    /// Root module ids of the enabled plugins, pseudo-modules excluded.
    pub modules: Vec<String>,
    /// Module id to merged configuration, across all enabled plugins.
    pub config: ModuleConfigs,
    /// RequireJS `paths` of the enabled plugins.
    pub paths: Map<String, Value>,
    /// RequireJS `shim` of the enabled plugins.
    pub shim: Map<String, Value>,
    /// Stylesheets of the enabled plugins, in registration order.
    pub stylesheets: Vec<String>,
}

impl ClientPayload {
    /// Flatten the enabled plugins into one payload.
    ///
    /// When two plugins configure the same module id the later plugin wins.
    pub fn from_enabled(plugins: &[EnabledPlugin]) -> Self {
        let mut payload = Self::default();
        for plugin in plugins {
            payload
                .modules
                .extend(plugin.root_modules().iter().cloned());
            for (module, config) in &plugin.configuration {
                if payload.config.contains_key(module) {
                    warn!(
                        plugin = plugin.name(),
                        module = %module,
                        "module configured by more than one plugin, later plugin wins"
                    );
                }
                payload.config.insert(module.clone(), config.clone());
            }
            for (name, path) in &plugin.descriptor.requirejs_paths {
                payload.paths.insert(name.clone(), path.clone());
            }
            for (name, shim) in &plugin.descriptor.requirejs_shim {
                payload.shim.insert(name.clone(), shim.clone());
            }
            payload
                .stylesheets
                .extend(plugin.descriptor.stylesheets.iter().cloned());
        }
        payload
    }

    /// Render as a RequireJS configuration object.
    ///
    /// The root module list is published as `config.customization.modules`.
    pub fn to_requirejs_config(&self) -> Value {
        let mut config = self.config.clone();
        let customization = config
            .entry(CUSTOMIZATION_MODULE)
            .or_insert_with(|| Value::Object(Map::new()));
        match customization {
            Value::Object(object) => {
                object.insert("modules".to_string(), json!(self.modules));
            }
            other => {
                *other = json!({ "modules": self.modules });
            }
        }
        json!({
            "paths": self.paths,
            "shim": self.shim,
            "config": config,
        })
    }
}
