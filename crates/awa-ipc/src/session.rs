// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Server-daemon session.
//!
//! The server daemon hands out a session id on `Connect`; later requests
//! carry it, and `Disconnect` releases it.

use crate::catalog::ServerOp;
use crate::content::ClientInfo;
use crate::error::Result;
use crate::message::{Request, Response};
use crate::transport::IpcChannel;
use std::time::Duration;

/// Default bound on one request/response exchange.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connected session with a server daemon.
///
/// # Example
///
/// ```rust,no_run
/// use awa_ipc::{IpcChannel, ServerSession};
///
/// # fn example() -> awa_ipc::Result<()> {
/// let session = ServerSession::connect(IpcChannel::localhost(54321))?;
/// for client in session.list_clients()? {
///     println!("{} {:?}", client.id, client.status);
/// }
/// session.close()
/// # }
/// ```
#[derive(Debug)]
pub struct ServerSession {
    channel: IpcChannel,
    timeout: Duration,
    session_id: Option<String>,
}

impl ServerSession {
    pub fn connect(channel: IpcChannel) -> Result<Self> {
        Self::connect_with_timeout(channel, DEFAULT_EXCHANGE_TIMEOUT)
    }

    pub fn connect_with_timeout(channel: IpcChannel, timeout: Duration) -> Result<Self> {
        let response = channel.exchange(&Request::new(ServerOp::Connect), timeout)?;
        response.check_success()?;

        let session_id = response
            .session_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        match &session_id {
            Some(id) => tracing::debug!(%channel, session_id = %id, "server session connected"),
            None => tracing::warn!(%channel, "server issued no session id"),
        }
        Ok(Self {
            channel,
            timeout,
            session_id,
        })
    }

    pub fn channel(&self) -> IpcChannel {
        self.channel
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Empty request of type `op`, stamped with this session's id.
    pub fn request(&self, op: ServerOp) -> Request {
        let request = Request::new(op);
        match &self.session_id {
            Some(id) => request.with_session_id(id.clone()),
            None => request,
        }
    }

    /// Send `request` and fail unless the reply code is 2xx.
    pub fn send(&self, request: &Request) -> Result<Response> {
        let response = self.channel.exchange(request, self.timeout)?;
        response.check_success()?;
        Ok(response)
    }

    /// Clients currently registered with the server.
    pub fn list_clients(&self) -> Result<Vec<ClientInfo>> {
        let response = self.send(&self.request(ServerOp::ListClients))?;
        Ok(response.client_list().to_vec())
    }

    /// Send `Disconnect` and consume the session.
    pub fn close(mut self) -> Result<()> {
        self.disconnect()
    }

    fn disconnect(&mut self) -> Result<()> {
        let Some(id) = self.session_id.take() else {
            return Ok(());
        };
        let request = Request::new(ServerOp::Disconnect).with_session_id(id.clone());
        self.send(&request)?;
        tracing::debug!(channel = %self.channel, session_id = %id, "server session closed");
        Ok(())
    }
}

impl Drop for ServerSession {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            tracing::warn!(channel = %self.channel, error = %e, "disconnect failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ClientInfo, Content};
    use crate::error::IpcError;
    use std::net::UdpSocket;
    use std::thread;

    /// `(message type, session id)` of a request document.
    fn describe(request: &[u8]) -> (String, Option<String>) {
        let text = std::str::from_utf8(request).unwrap();
        let doc = roxmltree::Document::parse(text).unwrap();
        let field = |tag: &str| {
            doc.root_element()
                .children()
                .find(|n| n.has_tag_name(tag))
                .and_then(|n| n.text())
                .map(str::to_string)
        };
        (field("Type").unwrap(), field("SessionID"))
    }

    /// Answers `exchanges` requests, returning what it saw.
    fn mock_server(
        exchanges: usize,
        session_id: Option<&'static str>,
    ) -> (IpcChannel, thread::JoinHandle<Vec<(String, Option<String>)>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let channel = IpcChannel::udp(socket.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            let mut buf = [0u8; 4096];
            for _ in 0..exchanges {
                let (len, src) = socket.recv_from(&mut buf).unwrap();
                let (msg_type, sid) = describe(&buf[..len]);
                let reply = match msg_type.as_str() {
                    "Connect" => {
                        let response = Response::new(ServerOp::Connect, 200u16);
                        match session_id {
                            Some(id) => response.with_session_id(id),
                            None => response,
                        }
                    }
                    "ListClients" => Response::new(ServerOp::ListClients, 200u16).with_content(
                        Content::ClientList(vec![ClientInfo::new("imgClient").with_status("Registered")]),
                    ),
                    "Disconnect" => Response::new(ServerOp::Disconnect, 200u16),
                    other => panic!("unexpected request {}", other),
                };
                socket.send_to(&reply.serialize().unwrap(), src).unwrap();
                seen.push((msg_type, sid));
            }
            seen
        });
        (channel, handle)
    }

    #[test]
    fn test_session_lifecycle() {
        let (channel, handle) = mock_server(3, Some("7"));
        let session = ServerSession::connect(channel).unwrap();
        assert_eq!(session.session_id(), Some("7"));

        let clients = session.list_clients().unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id, "imgClient");
        assert_eq!(clients[0].status.as_deref(), Some("Registered"));

        session.close().unwrap();
        let seen = handle.join().unwrap();
        assert_eq!(
            seen,
            vec![
                ("Connect".to_string(), None),
                ("ListClients".to_string(), Some("7".to_string())),
                ("Disconnect".to_string(), Some("7".to_string())),
            ]
        );
    }

    #[test]
    fn test_drop_disconnects() {
        let (channel, handle) = mock_server(2, Some("12"));
        drop(ServerSession::connect(channel).unwrap());
        let seen = handle.join().unwrap();
        assert_eq!(seen[1], ("Disconnect".to_string(), Some("12".to_string())));
    }

    #[test]
    fn test_no_session_id_skips_disconnect() {
        let (channel, handle) = mock_server(1, None);
        let session = ServerSession::connect(channel).unwrap();
        assert_eq!(session.session_id(), None);
        assert!(session.request(ServerOp::ListClients).session_id().is_none());
        session.close().unwrap();
        assert_eq!(handle.join().unwrap().len(), 1);
    }

    #[test]
    fn test_connect_timeout() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let channel = IpcChannel::udp(silent.local_addr().unwrap());
        let err = ServerSession::connect_with_timeout(channel, Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, IpcError::Timeout(_)));
    }
}
