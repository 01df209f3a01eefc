// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP IPC transport.
//!
//! One datagram out, one datagram back. Each exchange uses a fresh
//! ephemeral socket, so replies cannot be confused across exchanges.

use crate::error::{IpcError, Result};
use crate::message::{Request, Response};
use std::fmt;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Largest reply accepted.
pub const MAX_DATAGRAM: usize = 65536;

/// Receive timeout of one readiness-probe attempt.
pub const PROBE_INTERVAL: Duration = Duration::from_millis(10);

/// Address of a daemon's IPC endpoint, written `udp://host:port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpcChannel {
    addr: SocketAddr,
}

impl IpcChannel {
    pub fn udp(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// `udp://127.0.0.1:port`
    pub fn localhost(port: u16) -> Self {
        Self::udp(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
    }

    /// Parse `udp://host:port`. Only the `udp` scheme exists.
    pub fn parse(channel: &str) -> Result<Self> {
        let (scheme, target) = channel
            .split_once("://")
            .ok_or_else(|| IpcError::InvalidArgument(format!("Invalid IPC channel: {}", channel)))?;
        if scheme != "udp" {
            return Err(IpcError::InvalidArgument("Invalid IPC protocol".to_string()));
        }
        let addr = target
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| IpcError::InvalidArgument(format!("Invalid IPC address: {}", target)))?;
        Ok(Self::udp(addr))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Serialize `request`, send it, and parse the reply against the
    /// request's own message type.
    pub fn exchange(&self, request: &Request, timeout: Duration) -> Result<Response> {
        let bytes = request.serialize()?;
        let reply = send_request_and_receive_response(self, &bytes, timeout)?;
        Response::parse(reply, *request.spec())
    }
}

impl fmt::Display for IpcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "udp://{}", self.addr)
    }
}

impl FromStr for IpcChannel {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn ephemeral_socket(peer: SocketAddr) -> Result<UdpSocket> {
    let local = match peer {
        SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
    };
    Ok(UdpSocket::bind(local)?)
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Send one datagram and return the single reply.
///
/// Datagrams from any other source are dropped. Fails with
/// [`IpcError::Timeout`] if no reply arrives within `timeout`.
pub fn send_request_and_receive_response(
    channel: &IpcChannel,
    request: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>> {
    let peer = channel.addr();
    let socket = ephemeral_socket(peer)?;
    socket.send_to(request, peer)?;
    tracing::debug!(%channel, bytes = request.len(), "ipc request sent");

    let deadline = Instant::now() + timeout;
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(IpcError::Timeout(format!("no response from {}", channel)));
        }
        socket.set_read_timeout(Some(remaining))?;

        match socket.recv_from(&mut buf) {
            Ok((len, src)) if src == peer => {
                tracing::debug!(%channel, bytes = len, "ipc response received");
                buf.truncate(len);
                return Ok(buf);
            }
            Ok((_, src)) => {
                tracing::warn!(%channel, %src, "dropping datagram from unexpected source");
            }
            Err(ref e) if is_timeout(e.kind()) => {
                return Err(IpcError::Timeout(format!("no response from {}", channel)));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Readiness probe: resend `request` every [`PROBE_INTERVAL`] until any
/// non-empty reply arrives.
///
/// Fails with [`IpcError::Timeout`] once `timeout` has elapsed.
pub fn wait_for_ipc(addr: SocketAddr, timeout: Duration, request: &[u8]) -> Result<()> {
    let socket = ephemeral_socket(addr)?;
    socket.set_read_timeout(Some(PROBE_INTERVAL))?;

    let started = Instant::now();
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut attempts = 0u32;
    while started.elapsed() < timeout {
        attempts += 1;
        socket.send_to(request, addr)?;
        match socket.recv_from(&mut buf) {
            Ok((len, _)) if len > 0 => {
                tracing::debug!(%addr, attempts, "ipc endpoint ready");
                return Ok(());
            }
            Ok(_) => {}
            Err(ref e) if is_timeout(e.kind()) => {}
            // Nothing bound yet: the kernel may report the ICMP unreachable.
            Err(ref e)
                if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset) =>
            {
                std::thread::sleep(PROBE_INTERVAL);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(IpcError::Timeout(format!(
        "IPC endpoint {} not ready after {} attempts",
        addr, attempts
    )))
}
