// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for portal integration tests.
//!
//! Provides a scripted configuration provider for fast, deterministic tests
//! without a database or a configuration directory.
//!
//! # Components
//!
//! - [`MockProvider`] - In-memory provider with per-role documents, failure
//!   injection, artificial latency and lookup counting

pub mod mock_provider;

pub use mock_provider::MockProvider;
