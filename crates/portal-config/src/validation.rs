// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: non-empty names, usable
//! provider settings, unique plugin names.

use std::collections::HashSet;

use portal_core::ProviderKind;

use crate::diagnostic::ConfigError;
use crate::model::PortalConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &PortalConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let app = config.portal.app.trim();
    if app.is_empty() {
        fail("portal.app must not be empty".to_string());
    } else if app.contains(['/', '\\']) || app == "." || app == ".." {
        fail(format!("portal.app `{app}` must not contain path separators"));
    }

    if config.portal.default_role.trim().is_empty() {
        fail("portal.default_role must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.portal.log_level.as_str()) {
        fail(format!(
            "portal.log_level `{}` is not one of {}",
            config.portal.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.provider.fetch_timeout_ms == 0 {
        fail("provider.fetch_timeout_ms must be greater than zero".to_string());
    }

    match config.provider.kind {
        ProviderKind::File if config.provider.config_dir.trim().is_empty() => {
            fail("provider.config_dir must not be empty for the file provider".to_string());
        }
        ProviderKind::Sqlite if config.provider.database_path.trim().is_empty() => {
            fail("provider.database_path must not be empty for the sqlite provider".to_string());
        }
        _ => {}
    }

    let mut seen = HashSet::new();
    for (i, plugin) in config.plugins.iter().enumerate() {
        if plugin.name.trim().is_empty() {
            fail(format!("plugins[{i}].name must not be empty"));
        } else if !seen.insert(plugin.name.as_str()) {
            fail(format!(
                "duplicate plugin name `{}` in [[plugins]] array",
                plugin.name
            ));
        }
        if plugin.name.starts_with('_') {
            fail(format!(
                "plugins[{i}].name `{}` must not start with `_`",
                plugin.name
            ));
        }
        if let Some(descriptor) = &plugin.descriptor
            && descriptor.trim().is_empty()
        {
            fail(format!("plugins[{i}].descriptor must not be empty when set"));
        }
        if plugin.modules.iter().any(|m| m.trim().is_empty()) {
            fail(format!("plugins[{i}].modules must not contain empty ids"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
