// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the portal plugin framework.

use thiserror::Error;

/// The primary error type used across the merge engine, the configuration
/// providers and the request pipeline.
#[derive(Debug, Error)]
pub enum PortalError {
    /// An override document for a single plugin could not be parsed.
    ///
    /// Only the named plugin's merge is affected; it falls back to its
    /// default configuration.
    #[error("malformed override for plugin `{plugin}`: {reason}")]
    ConfigParse {
        plugin: String,
        raw: String,
        reason: String,
    },

    /// No override document could be obtained for the given application and role.
    #[error("configuration unavailable for app `{app}`, role `{role}`: {reason}")]
    ConfigurationUnavailable {
        app: String,
        role: String,
        reason: String,
    },

    /// An override referenced a plugin that is not registered.
    #[error("unknown plugin `{name}`")]
    UnknownPlugin { name: String },

    /// Two descriptors were registered under the same name.
    #[error("duplicate plugin `{name}`")]
    DuplicatePlugin { name: String },

    /// A plugin descriptor file is invalid.
    #[error("invalid descriptor for plugin `{plugin}`: {message}")]
    Descriptor { plugin: String, message: String },

    /// Storage backend errors (database connection, query failure, file I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortalError {
    /// Shorthand for [`PortalError::ConfigurationUnavailable`].
    pub fn unavailable(app: &str, role: &str, reason: impl Into<String>) -> Self {
        PortalError::ConfigurationUnavailable {
            app: app.to_string(),
            role: role.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`PortalError::ConfigParse`].
    pub fn parse(plugin: &str, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        PortalError::ConfigParse {
            plugin: plugin.to_string(),
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// The plugin an error is attributed to, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            PortalError::ConfigParse { plugin, .. } | PortalError::Descriptor { plugin, .. } => {
                Some(plugin)
            }
            PortalError::UnknownPlugin { name } | PortalError::DuplicatePlugin { name } => {
                Some(name)
            }
            _ => None,
        }
    }
}
