// SPDX-FileCopyrightText: 2026 Portal Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Portal - plugin configuration for web map portals.
//!
//! This is the binary entry point. It loads `portal.toml`, builds the plugin
//! registry and configuration provider, and renders per-role client
//! configuration.

mod check;
mod plugins;
mod render;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use portal_config::PortalConfig;

/// Portal - plugin configuration for web map portals.
#[derive(Parser, Debug)]
#[command(name = "portal", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the client configuration for a role as JSON.
    Render {
        /// Role to configure for; the default role when omitted.
        #[arg(long)]
        role: Option<String>,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// List the deployed plugins.
    Plugins,
    /// Run deployment checks.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => portal_config::load_and_validate_path(path),
        None => portal_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            portal_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.portal.log_level);
    let base_dir = base_dir(cli.config.as_deref());

    match cli.command {
        Some(Commands::Render { role, pretty }) => {
            match render::render(&config, &base_dir, role.as_deref(), pretty).await {
                Ok(json) => println!("{json}"),
                Err(e) => fail(&e),
            }
        }
        Some(Commands::Plugins) => match render::plugin_table(&config, &base_dir) {
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Err(e) => fail(&e),
        },
        Some(Commands::Check { plain }) => {
            if check::run_check(&config, &base_dir, plain).await > 0 {
                std::process::exit(1);
            }
        }
        None => {
            print_summary(&config);
        }
    }
}

/// Descriptor paths in the configuration are relative to this directory.
fn base_dir(config_path: Option<&Path>) -> PathBuf {
    config_path
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_summary(config: &PortalConfig) {
    println!(
        "portal: app `{}`, {} provider, {} plugin(s); use --help for available commands",
        config.portal.app,
        config.provider.kind,
        config.plugins.len()
    );
}

fn fail(error: &portal_core::PortalError) -> ! {
    eprintln!("portal: {error}");
    std::process::exit(1);
}

/// Logs go to stderr so rendered JSON on stdout stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("portal={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
