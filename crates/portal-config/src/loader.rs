// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./portal.toml` > `~/.config/portal/portal.toml` > `/etc/portal/portal.toml`
//! with environment variable overrides via `PORTAL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PortalConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/portal/portal.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "portal.toml";

/// User configuration file under the XDG config directory, if there is one.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("portal").join("portal.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/portal/portal.toml` (system-wide)
/// 3. `~/.config/portal/portal.toml` (user XDG config)
/// 4. `./portal.toml` (local directory)
/// 5. `PORTAL_*` environment variables
pub fn load_config() -> Result<PortalConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<PortalConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PortalConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PortalConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PortalConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG hierarchy, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PortalConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PORTAL_PROVIDER_FETCH_TIMEOUT_MS` must map to
/// `provider.fetch_timeout_ms`, not `provider.fetch.timeout.ms`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("PORTAL_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env var name to a config key path.
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ["portal", "provider"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
