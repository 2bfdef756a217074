// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merge policy applying one override document to one plugin's configuration.
//!
//! Under [`MergeStrategy::Merge`] each module named by the document is merged
//! one level deep: the fragment's top-level properties replace the current
//! ones and every other property survives. Property values themselves are
//! replaced wholesale, whatever their type. If either side of a module is not
//! an object, the fragment replaces the module value.
//!
//! Under [`MergeStrategy::Replace`] the result is exactly the document's
//! module set.
//!
//! Ordering is stable: modules already present keep their position, new
//! modules are appended in document order.

use serde_json::Value;

use crate::descriptor::{ModuleConfig, ModuleConfigs};
use crate::envelope::{MergeStrategy, OverrideDocument};

/// Compute the configuration that results from applying `doc` to `current`.
///
/// `current` is not modified; callers decide where the result is stored.
pub fn merge(current: &ModuleConfigs, doc: &OverrideDocument) -> ModuleConfigs {
    match doc.strategy() {
        MergeStrategy::Replace => doc.modules.clone(),
        MergeStrategy::Merge => {
            let mut merged = current.clone();
            for (module, fragment) in &doc.modules {
                let value = match merged.get(module) {
                    Some(existing) => merge_module(existing, fragment),
                    None => fragment.clone(),
                };
                // Map::insert keeps the position of an existing key.
                merged.insert(module.clone(), value);
            }
            merged
        }
    }
}

/// Merge one module fragment over its current value.
fn merge_module(current: &ModuleConfig, fragment: &ModuleConfig) -> ModuleConfig {
    match (current, fragment) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut properties = base.clone();
            for (key, value) in overlay {
                properties.insert(key.clone(), value.clone());
            }
            Value::Object(properties)
        }
        _ => fragment.clone(),
    }
}
