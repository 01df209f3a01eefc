// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # awa-ipc
//!
//! IPC client library and test harness for the Awa LWM2M client and server
//! daemons.
//!
//! The daemons speak XML documents over UDP. Each document carries an
//! object tree addressed by OIRi paths (Object / ObjectInstance / Resource /
//! ResourceInstance); this crate models that tree, reads and writes the
//! wire format, and drives the daemons through their lifecycle.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use awa_ipc::{ClientOp, IpcChannel, Request, Result};
//! use std::time::Duration;
//!
//! fn main() -> Result<()> {
//!     let mut request = Request::new(ClientOp::Get);
//!     request.add_path([3, 0, 15])?;
//!
//!     let channel = IpcChannel::localhost(12345);
//!     let response = channel.exchange(&request, Duration::from_secs(2))?;
//!     println!("timezone: {:?}", response.get_value([3, 0, 15])?);
//!     Ok(())
//! }
//! ```
//!
//! ## Wire Format
//!
//! ```text
//! <Request>
//!   <Type>Set</Type>
//!   <Content>
//!     <Objects>
//!       <Object><ID>3</ID>
//!         <ObjectInstance><ID>0</ID>
//!           <Resource><ID>15</ID><Value>Europe/London</Value></Resource>
//!         </ObjectInstance>
//!       </Object>
//!     </Objects>
//!   </Content>
//! </Request>
//! ```
//!
//! ## Modules Overview
//!
//! - [`path`] - OIRi paths and the shapes each message type accepts
//! - [`tree`] - the path-addressed content tree
//! - [`content`] - message payloads (single tree, per-client trees, client list)
//! - [`catalog`] - the client and server message types
//! - [`message`] - Request / Response / Notification envelopes
//! - [`transport`] - UDP send/receive and readiness probing
//! - [`daemon`] - spawning and signalling the daemons
//! - [`config`] / [`harness`] - test fixture configuration and lifecycle
//! - [`session`] - server-daemon sessions

pub mod catalog;
mod codec;
pub mod config;
pub mod content;
pub mod daemon;
pub mod error;
pub mod harness;
pub mod label;
pub mod message;
pub mod path;
pub mod session;
pub mod transport;
pub mod tree;

pub use catalog::{ClientOp, MessageSpec, ServerOp};
pub use config::{ConfigError, HarnessConfig, PortRotation, PortSpec, ResolvedConfig};
pub use content::{ClientContent, ClientInfo, Content, ContentKind};
pub use daemon::{ContentType, Daemon, DaemonKind, DaemonSpec};
pub use error::{IpcError, Result};
pub use harness::Harness;
pub use label::Label;
pub use message::{Envelope, Request, Response, ResponseCode};
pub use path::{Path, PathShape, Segment};
pub use session::ServerSession;
pub use transport::{send_request_and_receive_response, wait_for_ipc, IpcChannel};
pub use tree::{ContentModel, TreeNode};
