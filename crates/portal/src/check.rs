// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `portal check` command implementation.
//!
//! Runs the deployment checks an operator needs before serving: plugin
//! descriptors, the configuration provider, the stored role documents and
//! the default document.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use portal_config::PortalConfig;
use portal_core::{ConfigurationProvider, HealthStatus};
use portal_plugin::PluginRegistry;

use crate::plugins::load_descriptors;

/// Status of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, started: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: started.elapsed(),
        }
    }
}

/// Run every check. Later checks are skipped when what they need failed.
pub async fn run_checks(config: &PortalConfig, base_dir: &Path) -> Vec<CheckResult> {
    let mut results = vec![CheckResult::new(
        "config",
        CheckStatus::Pass,
        format!(
            "app `{}`, {} plugin(s)",
            config.portal.app,
            config.plugins.len()
        ),
        Instant::now(),
    )];

    let (registry, result) = check_descriptors(config, base_dir);
    results.push(result);

    let (provider, result) = check_provider(config).await;
    results.push(result);

    if let Some(provider) = provider {
        results.push(check_health(provider.as_ref()).await);
        results.push(check_roles(config, provider.as_ref()).await);
        results.push(check_default_document(config, provider.as_ref(), registry).await);
    }
    results
}

fn check_descriptors(
    config: &PortalConfig,
    base_dir: &Path,
) -> (Option<PluginRegistry>, CheckResult) {
    let started = Instant::now();
    match load_descriptors(config, base_dir).and_then(PluginRegistry::new) {
        Ok(registry) => {
            let message = format!("{} descriptor(s) loaded", registry.len());
            (
                Some(registry),
                CheckResult::new("descriptors", CheckStatus::Pass, message, started),
            )
        }
        Err(e) => (
            None,
            CheckResult::new("descriptors", CheckStatus::Fail, e.to_string(), started),
        ),
    }
}

async fn check_provider(
    config: &PortalConfig,
) -> (Option<Arc<dyn ConfigurationProvider>>, CheckResult) {
    let started = Instant::now();
    match portal_provider::build_provider(config).await {
        Ok(provider) => {
            let message = format!(
                "{} ({})",
                provider.name(),
                if provider.is_cacheable() {
                    "cacheable"
                } else {
                    "fetched per request"
                }
            );
            (
                Some(provider),
                CheckResult::new("provider", CheckStatus::Pass, message, started),
            )
        }
        Err(e) => (
            None,
            CheckResult::new("provider", CheckStatus::Fail, e.to_string(), started),
        ),
    }
}

async fn check_health(provider: &dyn ConfigurationProvider) -> CheckResult {
    let started = Instant::now();
    let (status, message) = match provider.health_check().await {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (CheckStatus::Warn, reason),
        Ok(HealthStatus::Unhealthy(reason)) => (CheckStatus::Fail, reason),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult::new("health", status, message, started)
}

async fn check_roles(config: &PortalConfig, provider: &dyn ConfigurationProvider) -> CheckResult {
    let started = Instant::now();
    let (status, message) = match provider.roles(&config.portal.app).await {
        Ok(roles) if roles.is_empty() => (CheckStatus::Warn, "no role documents".to_string()),
        Ok(roles) => (CheckStatus::Pass, roles.join(", ")),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult::new("roles", status, message, started)
}

async fn check_default_document(
    config: &PortalConfig,
    provider: &dyn ConfigurationProvider,
    registry: Option<PluginRegistry>,
) -> CheckResult {
    let started = Instant::now();
    let name = "default document";
    let timeout = Duration::from_millis(config.provider.fetch_timeout_ms);
    let role = provider.default_role();

    let text = match tokio::time::timeout(timeout, provider.lookup(&config.portal.app, role)).await
    {
        Err(_) => {
            return CheckResult::new(name, CheckStatus::Fail, "fetch timed out", started);
        }
        Ok(Err(e)) => return CheckResult::new(name, CheckStatus::Fail, e.to_string(), started),
        Ok(Ok(None)) => {
            return CheckResult::new(
                name,
                CheckStatus::Fail,
                format!("no document for role `{role}`, requests cannot be configured"),
                started,
            );
        }
        Ok(Ok(Some(text))) => text,
    };

    let document = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(document)) => document,
        Ok(_) => {
            return CheckResult::new(name, CheckStatus::Fail, "not a JSON object", started);
        }
        Err(e) => return CheckResult::new(name, CheckStatus::Fail, e.to_string(), started),
    };

    let Some(mut registry) = registry else {
        return CheckResult::new(
            name,
            CheckStatus::Warn,
            "parsed, not merged (descriptors failed)",
            started,
        );
    };
    let issues = registry.merge_document(&document);
    if issues.is_empty() {
        CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{} override(s) merge cleanly", document.len()),
            started,
        )
    } else {
        let detail: Vec<String> = issues.iter().map(ToString::to_string).collect();
        CheckResult::new(name, CheckStatus::Warn, detail.join("; "), started)
    }
}

/// Run the `portal check` command and print the results.
///
/// Returns the number of failed checks.
pub async fn run_check(config: &PortalConfig, base_dir: &Path, plain: bool) -> usize {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = run_checks(config, base_dir).await;

    println!();
    println!("  portal check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_line(result, use_color));
    }
    println!();

    let fails = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let warns = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();
    match fails + warns {
        0 => println!("  All checks passed."),
        1 => println!("  1 issue found."),
        n => println!("  {n} issues found."),
    }
    println!();
    fails
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<18} {message} ({ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<18} {} ({ms}ms)", result.name, result.message)
    }
}
