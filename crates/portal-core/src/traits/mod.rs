// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams between the merge engine and its collaborators.
//!
//! Traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod provider;

pub use provider::ConfigurationProvider;
