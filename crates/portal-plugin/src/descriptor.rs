// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptors and descriptor file parsing.
//!
//! A descriptor file is the JSON document a plugin ships next to its modules:
//!
//! ```json
//! {
//!   "installInRoot": true,
//!   "default-conf": { "layers": { "url": "/wms" } },
//!   "requirejs": { "paths": { "ol": "../jslib/ol" }, "shim": {} }
//! }
//! ```
//!
//! The module list and stylesheets come from the deployment (they are not in
//! the file) and are attached with the `with_*` builders.

use portal_core::PortalError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::is_reserved_key;

/// One module's configuration. Normally an object of properties, but arrays
/// and scalars are accepted and treated as opaque values.
pub type ModuleConfig = Value;

/// Module id to configuration, in insertion order.
pub type ModuleConfigs = Map<String, ModuleConfig>;

/// Static, plugin-scoped metadata. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDescriptor {
    /// Unique plugin name.
    pub name: String,
    /// Module ids contributed by this plugin, in declaration order.
    pub modules: Vec<String>,
    /// Built-in per-module defaults.
    pub default_configuration: ModuleConfigs,
    /// When false, this plugin's modules are pseudo-modules: they take part
    /// in merges but are never offered to the client as root modules.
    pub install_in_root: bool,
    /// Stylesheet paths, opaque to the merge engine.
    pub stylesheets: Vec<String>,
    /// RequireJS `paths` entries, opaque to the merge engine.
    pub requirejs_paths: Map<String, Value>,
    /// RequireJS `shim` entries, opaque to the merge engine.
    pub requirejs_shim: Map<String, Value>,
}

impl PluginDescriptor {
    /// Create a descriptor with no modules and no defaults, installed in root.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            modules: Vec::new(),
            default_configuration: Map::new(),
            install_in_root: true,
            stylesheets: Vec::new(),
            requirejs_paths: Map::new(),
            requirejs_shim: Map::new(),
        }
    }

    /// Append a module id, ignoring duplicates.
    pub fn with_module(mut self, module: &str) -> Self {
        if !self.modules.iter().any(|m| m == module) {
            self.modules.push(module.to_string());
        }
        self
    }

    /// Append several module ids, ignoring duplicates.
    pub fn with_modules<I, S>(self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        modules
            .into_iter()
            .fold(self, |descriptor, m| descriptor.with_module(m.as_ref()))
    }

    /// Append stylesheet paths.
    pub fn with_stylesheets<I, S>(mut self, stylesheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stylesheets
            .extend(stylesheets.into_iter().map(Into::into));
        self
    }

    /// Modules offered to the client: all of them, or none for pseudo-module plugins.
    pub fn root_modules(&self) -> &[String] {
        if self.install_in_root {
            &self.modules
        } else {
            &[]
        }
    }
}

/// Raw shape of a descriptor file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    #[serde(rename = "installInRoot", default = "default_install_in_root")]
    install_in_root: bool,
    #[serde(rename = "default-conf", default)]
    default_conf: Map<String, Value>,
    #[serde(default)]
    requirejs: RequireJsSection,
}

/// The `requirejs` section of a descriptor file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequireJsSection {
    #[serde(default)]
    paths: Map<String, Value>,
    #[serde(default)]
    shim: Map<String, Value>,
}

fn default_install_in_root() -> bool {
    true
}

/// Parse a plugin descriptor from the JSON content of its descriptor file.
///
/// Rejects empty names and default configurations that use the reserved
/// override keys as module ids.
pub fn parse_plugin_descriptor(name: &str, json: &str) -> Result<PluginDescriptor, PortalError> {
    if name.trim().is_empty() {
        return Err(PortalError::Descriptor {
            plugin: name.to_string(),
            message: "name must not be empty".to_string(),
        });
    }

    let file: DescriptorFile = serde_json::from_str(json).map_err(|e| PortalError::Descriptor {
        plugin: name.to_string(),
        message: format!("invalid descriptor JSON: {e}"),
    })?;

    if let Some(key) = file.default_conf.keys().find(|k| is_reserved_key(k)) {
        return Err(PortalError::Descriptor {
            plugin: name.to_string(),
            message: format!("default-conf must not use reserved key `{key}` as a module id"),
        });
    }

    Ok(PluginDescriptor {
        name: name.to_string(),
        modules: Vec::new(),
        default_configuration: file.default_conf,
        install_in_root: file.install_in_root,
        stylesheets: Vec::new(),
        requirejs_paths: file.requirejs.paths,
        requirejs_shim: file.requirejs.shim,
    })
}
