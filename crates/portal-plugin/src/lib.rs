// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin merge engine for the portal framework.
//!
//! Provides plugin descriptors, the typed override envelope, the merge
//! policy, the plugin registry, the client payload and the per-request
//! configurator that ties them to a configuration provider.
//!
//! A request flows through:
//! 1. [`PortalConfigurator::configure`] fetches the role's document.
//! 2. The shared [`PluginRegistry`] is cloned for the request.
//! 3. Each plugin's [`OverrideDocument`] is merged by [`merge::merge`].
//! 4. [`PluginRegistry::get_enabled`] and [`ClientPayload`] shape the output.

pub mod configurator;
pub mod descriptor;
pub mod envelope;
pub mod merge;
pub mod payload;
pub mod registry;

pub use configurator::{DocumentSource, PortalConfigurator, RequestConfiguration};
pub use descriptor::{ModuleConfig, ModuleConfigs, PluginDescriptor, parse_plugin_descriptor};
pub use envelope::{ENABLED_KEY, MergeStrategy, OVERRIDE_KEY, OverrideDocument};
pub use payload::ClientPayload;
pub use registry::{EnabledPlugin, MergeOutcome, PluginEntry, PluginRegistry};
