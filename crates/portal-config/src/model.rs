// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the portal.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use portal_core::{DEFAULT_ROLE, ProviderKind};
use serde::{Deserialize, Serialize};

/// Top-level portal configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section has usable defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PortalConfig {
    /// Application identity and request defaults.
    #[serde(default)]
    pub portal: PortalSection,

    /// Where override documents come from.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Deployed plugins, in registration order.
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

/// The `[portal]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PortalSection {
    /// Application name used to look up override documents.
    #[serde(default = "default_app")]
    pub app: String,

    /// Role used when a request carries none.
    #[serde(default = "default_role")]
    pub default_role: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PortalSection {
    fn default() -> Self {
        Self {
            app: default_app(),
            default_role: default_role(),
            log_level: default_log_level(),
        }
    }
}

fn default_app() -> String {
    "portal".to_string()
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The `[provider]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Backend holding the override documents.
    #[serde(default = "default_kind")]
    pub kind: ProviderKind,

    /// Root of the `<app>/<role>.json` tree (file provider).
    #[serde(default = "default_config_dir")]
    pub config_dir: String,

    /// Path to the SQLite database file (sqlite provider).
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Upper bound for one document fetch, in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Memoize documents of cacheable providers.
    #[serde(default = "default_cache")]
    pub cache: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            config_dir: default_config_dir(),
            database_path: default_database_path(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            cache: default_cache(),
        }
    }
}

fn default_kind() -> ProviderKind {
    ProviderKind::File
}

fn default_config_dir() -> String {
    dirs::config_dir()
        .map(|p| p.join("portal").join("apps"))
        .unwrap_or_else(|| PathBuf::from("apps"))
        .to_string_lossy()
        .into_owned()
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("portal").join("portal.db"))
        .unwrap_or_else(|| PathBuf::from("portal.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_fetch_timeout_ms() -> u64 {
    2_000
}

fn default_cache() -> bool {
    true
}

/// One `[[plugins]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Unique plugin name, the key of its override documents.
    pub name: String,

    /// Path to the plugin's JSON descriptor file. Relative paths resolve
    /// against the directory of the configuration file. Without one the
    /// plugin has no defaults.
    #[serde(default)]
    pub descriptor: Option<String>,

    /// Module ids the plugin contributes, in declaration order.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Stylesheet paths the plugin contributes.
    #[serde(default)]
    pub stylesheets: Vec<String>,
}
