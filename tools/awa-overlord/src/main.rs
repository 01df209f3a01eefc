// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! awa-overlord - start an Awa server and client pair and keep them up
//!
//! # Usage
//!
//! ```bash
//! # Spawn both daemons with the built-in settings
//! awa-overlord
//!
//! # Using a configuration file
//! awa-overlord --config overlord.toml
//!
//! # Write a starting configuration
//! awa-overlord gen-config --output overlord.toml
//! ```

use anyhow::{Context, Result};
use awa_ipc::{Harness, HarnessConfig, PortRotation};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Awa daemon supervisor
#[derive(Parser, Debug)]
#[command(name = "awa-overlord")]
#[command(about = "Spawn an Awa LWM2M server and client daemon pair")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Position in the IPC port pools to start from
    #[arg(long, default_value = "0")]
    port_index: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "overlord.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let config = load_config(args.config.as_ref())?;
    let mut rotation = PortRotation::starting_at(args.port_index);
    let harness = Harness::start(&config, &mut rotation).context("failed to start daemons")?;

    println!("Awa Overlord v{}", env!("CARGO_PKG_VERSION"));
    println!("=====================================");
    println!();
    print_daemon("Server", harness.server().and_then(|d| d.pid()), &harness.server_ipc());
    print_daemon("Client", harness.client().and_then(|d| d.pid()), &harness.client_ipc());
    println!("Endpoint: {}", harness.client_endpoint());
    println!();
    println!("Press Ctrl+C to stop...");

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, shutting down...");
        let _ = stop_tx.send(());
    })
    .context("failed to install Ctrl+C handler")?;

    let _ = stop_rx.recv();
    println!("\nShutting down...");
    harness.stop();
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(HarnessConfig::spawning()),
    }
}

fn print_daemon(name: &str, pid: Option<u32>, ipc: &awa_ipc::IpcChannel) {
    match pid {
        Some(pid) => println!("{}: pid {} on {}", name, pid, ipc),
        None => println!("{}: attached on {}", name, ipc),
    }
}

fn cmd_gen_config(output: PathBuf) -> Result<()> {
    let toml_str = HarnessConfig::spawning().to_toml()?;

    let content = format!(
        r#"# Awa Overlord Configuration
# Generated by awa-overlord gen-config

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<()> {
    match HarnessConfig::from_file(&config_path) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!(
                "Server: {} (IPC {:?}, CoAP {})",
                if config.spawn_server_daemon { "spawned" } else { "attached" },
                config.server_ipc_port,
                config.server_coap_port
            );
            println!(
                "Client: {} (IPC {:?}, CoAP {})",
                if config.spawn_client_daemon { "spawned" } else { "attached" },
                config.client_ipc_port,
                config.client_coap_port
            );
            println!("Endpoint: {}", config.client_endpoint_name);
            println!("Content type: {}", config.server_content_type);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_spawning_config() {
        let args = Args::parse_from(["awa-overlord"]);
        assert!(args.command.is_none());
        let config = load_config(args.config.as_ref()).unwrap();
        assert_eq!(config, HarnessConfig::spawning());
    }

    #[test]
    fn test_gen_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlord.toml");

        cmd_gen_config(path.clone()).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("# Awa Overlord Configuration"));
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded, HarnessConfig::spawning());
    }

    #[test]
    fn test_subcommand_parsing() {
        let args = Args::parse_from(["awa-overlord", "validate", "--config", "a.toml"]);
        assert!(matches!(args.command, Some(Commands::Validate { .. })));
        let args = Args::parse_from(["awa-overlord", "--port-index", "3"]);
        assert_eq!(args.port_index, 3);
    }
}
