// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `portal render` and `portal plugins` command implementations.

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use portal_config::PortalConfig;
use portal_core::PortalError;
use portal_plugin::PluginRegistry;

use crate::plugins::{build_configurator, load_descriptors};

/// Render the client configuration for `role` as JSON.
///
/// Per-plugin problems are logged and do not fail the command.
pub async fn render(
    config: &PortalConfig,
    base_dir: &Path,
    role: Option<&str>,
    pretty: bool,
) -> Result<String, PortalError> {
    let configurator = build_configurator(config, base_dir).await?;
    let configured = configurator.configure(role).await?;

    for issue in &configured.issues {
        warn!(plugin = issue.plugin().unwrap_or("-"), "{issue}");
    }
    if configured.is_stale() {
        warn!(role = %configured.role, "rendered from a stale configuration");
    }

    to_json(&configured.payload().to_requirejs_config(), pretty)
}

/// Describe the deployed plugins, one line each, sorted by name.
pub fn plugin_table(config: &PortalConfig, base_dir: &Path) -> Result<Vec<String>, PortalError> {
    let registry = PluginRegistry::new(load_descriptors(config, base_dir)?)?;
    Ok(registry
        .list_all()
        .into_iter()
        .map(|entry| {
            let descriptor = entry.descriptor();
            let modules = if descriptor.modules.is_empty() {
                "-".to_string()
            } else {
                descriptor.modules.join(", ")
            };
            let kind = if descriptor.install_in_root {
                "root"
            } else {
                "pseudo"
            };
            format!(
                "{:<20} {:<7} defaults: {:<3} modules: {modules}",
                descriptor.name,
                kind,
                descriptor.default_configuration.len()
            )
        })
        .collect())
}

fn to_json(value: &Value, pretty: bool) -> Result<String, PortalError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.map_err(|e| PortalError::Internal(format!("cannot serialize payload: {e}")))
}
