// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! awa-ipc-send - push a raw XML request to a daemon IPC port
//!
//! # Usage
//!
//! ```bash
//! # Request from stdin, reply on stdout
//! echo '<Request><Type>ListClients</Type></Request>' | awa-ipc-send -i udp://127.0.0.1:54321
//!
//! # Request and reply files
//! awa-ipc-send get_timezone.xml reply.xml --ipc udp://127.0.0.1:12345
//! ```

use anyhow::{Context, Result};
use awa_ipc::{send_request_and_receive_response, IpcChannel};
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Send one XML document to an Awa daemon and print the reply
#[derive(Parser, Debug)]
#[command(name = "awa-ipc-send")]
#[command(about = "Send an XML request to an Awa daemon IPC channel")]
#[command(version)]
struct Args {
    /// Request file (stdin if omitted)
    infile: Option<PathBuf>,

    /// Reply file (stdout if omitted)
    outfile: Option<PathBuf>,

    /// IPC channel of the daemon
    #[arg(short, long, default_value = "udp://127.0.0.1:12345")]
    ipc: String,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Replies go to stdout, so logs stay on stderr.
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let channel = IpcChannel::parse(&args.ipc)
        .with_context(|| format!("invalid IPC channel '{}'", args.ipc))?;

    let request = read_request(args.infile.as_ref())?;
    tracing::info!(%channel, bytes = request.len(), "sending request");

    let reply = send_request_and_receive_response(
        &channel,
        &request,
        Duration::from_millis(args.timeout_ms),
    )
    .with_context(|| format!("no reply from {}", channel))?;

    write_reply(args.outfile.as_ref(), &reply)
}

fn read_request(infile: Option<&PathBuf>) -> Result<Vec<u8>> {
    let mut request = Vec::new();
    match infile {
        Some(path) => {
            request = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
        }
        None => {
            std::io::stdin()
                .read_to_end(&mut request)
                .context("failed to read request from stdin")?;
        }
    }
    Ok(request)
}

fn write_reply(outfile: Option<&PathBuf>, reply: &[u8]) -> Result<()> {
    match outfile {
        Some(path) => {
            std::fs::write(path, reply)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(reply)?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        }
    }
    Ok(())
}
