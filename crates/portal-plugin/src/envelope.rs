// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed envelope for per-plugin override documents.
//!
//! On the wire an override document mixes two reserved flags into the same
//! namespace as module ids:
//!
//! ```json
//! { "_enabled": true, "_override": false, "layers": { "url": "/wms" } }
//! ```
//!
//! [`OverrideDocument`] splits them apart once, at the boundary, so the merge
//! policy never looks at key names.

use portal_core::PortalError;
use serde_json::{Map, Value};

use crate::descriptor::ModuleConfigs;

/// Reserved key selecting whether the plugin is active. Defaults to `true`.
pub const ENABLED_KEY: &str = "_enabled";

/// Reserved key selecting wholesale replacement. Defaults to `false`.
pub const OVERRIDE_KEY: &str = "_override";

/// Whether `key` is one of the reserved envelope keys.
pub fn is_reserved_key(key: &str) -> bool {
    key == ENABLED_KEY || key == OVERRIDE_KEY
}

/// How an override document is applied to a plugin's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Merge each module's properties over the current ones.
    Merge,
    /// Replace the plugin's whole module set with the document's.
    Replace,
}

/// A parsed override document for one plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideDocument {
    /// Value of `_enabled`.
    pub enabled: bool,
    /// Value of `_override`.
    pub replace: bool,
    /// Every non-reserved key, in document order.
    pub modules: ModuleConfigs,
}

impl Default for OverrideDocument {
    fn default() -> Self {
        Self {
            enabled: true,
            replace: false,
            modules: Map::new(),
        }
    }
}

impl OverrideDocument {
    /// The strategy selected by `_override`.
    pub fn strategy(&self) -> MergeStrategy {
        if self.replace {
            MergeStrategy::Replace
        } else {
            MergeStrategy::Merge
        }
    }

    /// Parse an override document from JSON text.
    pub fn parse(plugin: &str, raw: &str) -> Result<Self, PortalError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| PortalError::parse(plugin, raw, e.to_string()))?;
        Self::from_value(plugin, &value)
    }

    /// Split an already-parsed JSON value into flags and module fragments.
    pub fn from_value(plugin: &str, value: &Value) -> Result<Self, PortalError> {
        let Value::Object(object) = value else {
            return Err(PortalError::parse(
                plugin,
                value.to_string(),
                format!("expected a JSON object, found {}", kind_of(value)),
            ));
        };

        let mut doc = OverrideDocument::default();
        for (key, entry) in object {
            match key.as_str() {
                ENABLED_KEY => doc.enabled = reserved_flag(plugin, value, key, entry)?,
                OVERRIDE_KEY => doc.replace = reserved_flag(plugin, value, key, entry)?,
                _ => {
                    doc.modules.insert(key.clone(), entry.clone());
                }
            }
        }
        Ok(doc)
    }
}

fn reserved_flag(plugin: &str, doc: &Value, key: &str, entry: &Value) -> Result<bool, PortalError> {
    entry.as_bool().ok_or_else(|| {
        PortalError::parse(
            plugin,
            doc.to_string(),
            format!("`{key}` must be a boolean, found {}", kind_of(entry)),
        )
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
