// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Test fixture: the configured daemons, started and ready.

use crate::catalog::{ClientOp, ServerOp};
use crate::config::{HarnessConfig, PortRotation, ResolvedConfig};
use crate::daemon::{Daemon, DaemonSpec};
use crate::error::{IpcError, Result};
use crate::message::{Request, Response};
use crate::path::Path;
use crate::transport::IpcChannel;
use std::time::{Duration, Instant};

/// Delay between two ListClients polls while waiting for registration.
pub const REGISTRATION_POLL: Duration = Duration::from_millis(10);

/// Upper bound on one ListClients exchange while polling.
const POLL_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(1);

/// Daemons for one test run.
///
/// Dropping the harness terminates the client daemon first, then the
/// server daemon.
#[derive(Debug)]
pub struct Harness {
    config: ResolvedConfig,
    client: Option<Daemon>,
    server: Option<Daemon>,
}

impl Harness {
    /// Resolve ports, spawn what the config asks for and wait until the
    /// client endpoint has registered with the server.
    pub fn start(config: &HarnessConfig, rotation: &mut PortRotation) -> Result<Self> {
        let config = config.resolve(rotation)?;
        let timeout = config.ipc_timeout();
        let mut harness = Self {
            config,
            client: None,
            server: None,
        };

        if harness.config.config().spawn_server_daemon {
            let server = Daemon::spawn(DaemonSpec::server(&harness.config.server_args()), true)?;
            server.wait_ready(timeout)?;
            harness.server = Some(server);
        }

        if harness.config.config().spawn_client_daemon {
            let client = Daemon::spawn(DaemonSpec::client(&harness.config.client_args()), true)?;
            client.wait_ready(timeout)?;
            harness.client = Some(client);

            wait_for_registration(
                harness.config.server_ipc(),
                &harness.config.config().client_endpoint_name,
                timeout,
            )?;
        }

        tracing::info!(
            server_ipc = %harness.server_ipc(),
            client_ipc = %harness.client_ipc(),
            "harness ready"
        );
        Ok(harness)
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn server_ipc(&self) -> IpcChannel {
        self.config.server_ipc()
    }

    pub fn client_ipc(&self) -> IpcChannel {
        self.config.client_ipc()
    }

    pub fn server(&self) -> Option<&Daemon> {
        self.server.as_ref()
    }

    pub fn client(&self) -> Option<&Daemon> {
        self.client.as_ref()
    }

    /// Endpoint name the client daemon registers under.
    pub fn client_endpoint(&self) -> &str {
        &self.config.config().client_endpoint_name
    }

    /// Build a client-daemon request for `path` (with `value`, if any),
    /// send it and parse the reply.
    pub fn send_client_request(
        &self,
        op: ClientOp,
        path: impl Into<Path>,
        value: Option<&str>,
    ) -> Result<Response> {
        let mut request = Request::new(op);
        if op.spec().accepts_paths() {
            match value {
                Some(value) => request.add(path, value)?,
                None => request.add_path(path)?,
            }
        }
        self.client_ipc().exchange(&request, self.config.ipc_timeout())
    }

    /// Server-daemon counterpart of [`Harness::send_client_request`],
    /// addressed to `client_id`.
    pub fn send_server_request(
        &self,
        op: ServerOp,
        client_id: &str,
        path: impl Into<Path>,
        value: Option<&str>,
    ) -> Result<Response> {
        let mut request = Request::new(op);
        if op.spec().accepts_paths() {
            match value {
                Some(value) => request.add_client(client_id, path, value)?,
                None => request.add_client_path(client_id, path)?,
            }
        }
        self.server_ipc().exchange(&request, self.config.ipc_timeout())
    }

    /// Terminate the daemons now rather than on drop.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.terminate();
        }
        if let Some(mut server) = self.server.take() {
            server.terminate();
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Poll ListClients on `server` until `endpoint` shows up.
pub fn wait_for_registration(server: IpcChannel, endpoint: &str, timeout: Duration) -> Result<()> {
    let request = Request::new(ServerOp::ListClients);
    let deadline = Instant::now() + timeout;
    let mut polls = 0u32;

    while Instant::now() < deadline {
        polls += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        match server.exchange(&request, remaining.min(POLL_EXCHANGE_TIMEOUT)) {
            Ok(response) if response.client_list().iter().any(|c| c.id == endpoint) => {
                tracing::info!(%endpoint, polls, "client registered");
                return Ok(());
            }
            Ok(_) => {}
            Err(e) if e.is_timeout() => continue,
            Err(e) => return Err(e),
        }
        std::thread::sleep(REGISTRATION_POLL);
    }
    Err(IpcError::Timeout(format!(
        "client {} did not register with {} after {} polls",
        endpoint, server, polls
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortSpec;
    use crate::content::{ClientInfo, Content};
    use crate::tree::ContentModel;
    use std::net::UdpSocket;
    use std::thread;

    fn bind() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    fn standalone(server_port: u16, client_port: u16) -> HarnessConfig {
        HarnessConfig {
            server_ipc_port: PortSpec::Single(server_port),
            client_ipc_port: PortSpec::Single(client_port),
            ipc_timeout_ms: 2000,
            ..HarnessConfig::standalone()
        }
    }

    #[test]
    fn test_standalone_start_spawns_nothing() {
        let mut rotation = PortRotation::new();
        let harness = Harness::start(&standalone(40001, 40002), &mut rotation).unwrap();
        assert!(harness.server().is_none());
        assert!(harness.client().is_none());
        assert_eq!(harness.server_ipc().port(), 40001);
        assert_eq!(harness.client_endpoint(), "TestClient");
        assert_eq!(rotation.index(), 1);
    }

    #[test]
    fn test_send_client_request() {
        let (socket, client_port) = bind();
        let mock = thread::spawn(move || {
            let mut buf = [0u8; 4096];
            let (len, src) = socket.recv_from(&mut buf).unwrap();
            let request = String::from_utf8(buf[..len].to_vec()).unwrap();
            let mut model = ContentModel::new();
            model.add(&Path::from([3, 0, 15]), Some("Europe/London".into()), None);
            let reply = Response::new(ClientOp::Get, 200u16)
                .with_content(Content::Objects(model))
                .serialize()
                .unwrap();
            socket.send_to(&reply, src).unwrap();
            request
        });

        let harness = Harness::start(&standalone(40003, client_port), &mut PortRotation::new()).unwrap();
        let response = harness.send_client_request(ClientOp::Get, [3, 0, 15], None).unwrap();
        assert_eq!(response.get_value([3, 0, 15]).unwrap(), Some("Europe/London"));

        let sent = mock.join().unwrap();
        assert!(sent.contains("<Type>Get</Type>"));
        assert!(!sent.contains("<Value>"));
    }

    #[test]
    fn test_send_server_request_rejects_bad_path() {
        let harness = Harness::start(&standalone(40005, 40006), &mut PortRotation::new()).unwrap();
        let err = harness
            .send_server_request(ServerOp::Delete, "imgClient", [3], None)
            .unwrap_err();
        assert!(matches!(err, IpcError::InvalidPath));
    }

    #[test]
    fn test_wait_for_registration() {
        let (socket, port) = bind();
        let mock = thread::spawn(move || {
            let mut buf = [0u8; 4096];
            for round in 0..3 {
                let (_, src) = socket.recv_from(&mut buf).unwrap();
                let clients = if round < 2 {
                    Vec::new()
                } else {
                    vec![ClientInfo::new("imgClient").with_status("Registered")]
                };
                let reply = Response::new(ServerOp::ListClients, 200u16)
                    .with_content(Content::ClientList(clients))
                    .serialize()
                    .unwrap();
                socket.send_to(&reply, src).unwrap();
            }
        });

        wait_for_registration(IpcChannel::localhost(port), "imgClient", Duration::from_secs(2)).unwrap();
        mock.join().unwrap();
    }

    #[test]
    fn test_wait_for_registration_times_out() {
        let (_socket, port) = bind();
        let err = wait_for_registration(
            IpcChannel::localhost(port),
            "imgClient",
            Duration::from_millis(50),
        )
        .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_invalid_config_fails_start() {
        let mut config = HarnessConfig::standalone();
        config.client_endpoint_name.clear();
        let err = Harness::start(&config, &mut PortRotation::new()).unwrap_err();
        assert!(matches!(err, IpcError::Config(_)));
    }
}
