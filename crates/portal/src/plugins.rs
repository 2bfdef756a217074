// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning `[[plugins]]` entries into descriptors and a ready configurator.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use portal_config::PortalConfig;
use portal_core::PortalError;
use portal_plugin::{PluginDescriptor, PluginRegistry, PortalConfigurator, parse_plugin_descriptor};

/// Load one descriptor per `[[plugins]]` entry, in configuration order.
///
/// Relative descriptor paths resolve against `base_dir`.
pub fn load_descriptors(
    config: &PortalConfig,
    base_dir: &Path,
) -> Result<Vec<PluginDescriptor>, PortalError> {
    config
        .plugins
        .iter()
        .map(|plugin| {
            let descriptor = match &plugin.descriptor {
                Some(rel) => {
                    let path = base_dir.join(rel);
                    let text =
                        std::fs::read_to_string(&path).map_err(|e| PortalError::Descriptor {
                            plugin: plugin.name.clone(),
                            message: format!("cannot read {}: {e}", path.display()),
                        })?;
                    parse_plugin_descriptor(&plugin.name, &text)?
                }
                None => PluginDescriptor::new(&plugin.name),
            };
            debug!(plugin = %plugin.name, modules = plugin.modules.len(), "descriptor loaded");
            Ok(descriptor
                .with_modules(&plugin.modules)
                .with_stylesheets(plugin.stylesheets.iter().cloned()))
        })
        .collect()
}

/// Build the registry and provider and wire them into a configurator.
///
/// A default document that cannot be fetched yet is only a warning here;
/// requests report it if it persists.
pub async fn build_configurator(
    config: &PortalConfig,
    base_dir: &Path,
) -> Result<PortalConfigurator, PortalError> {
    let registry = PluginRegistry::new(load_descriptors(config, base_dir)?)?;
    let provider = portal_provider::build_provider(config).await?;
    let configurator = PortalConfigurator::new(
        registry,
        provider,
        config.portal.app.clone(),
        Duration::from_millis(config.provider.fetch_timeout_ms),
    );
    if let Err(e) = configurator.establish_default().await {
        warn!(error = %e, "default configuration not available yet");
    }
    Ok(configurator)
}
