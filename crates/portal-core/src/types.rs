// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the providers, the merge engine and the binary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role used when a request carries no role, and the fallback for roles
/// without a document of their own.
pub const DEFAULT_ROLE: &str = "default";

/// A document handed out by a provider, with the role it is stored under.
///
/// After a fallback `role` is the default role, not the requested one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub role: String,
    pub text: String,
}

/// Health status reported by provider health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Provider is fully operational.
    Healthy,
    /// Provider answers but something is off (e.g. no default document).
    Degraded(String),
    /// Provider is not operational.
    Unhealthy(String),
}

/// Identifies a configuration provider backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// One JSON document per role on disk.
    File,
    /// Rows of an `apps` table in SQLite.
    Sqlite,
}
