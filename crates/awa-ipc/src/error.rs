// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for IPC message building, parsing and transport.
//!
//! Path-shape and envelope violations are programmer or peer errors and are
//! raised immediately. A lookup that finds nothing is not an error: the tree
//! accessors return `Ok(None)` for that case.

use thiserror::Error;

/// Result type for IPC operations.
pub type Result<T> = std::result::Result<T, IpcError>;

/// Errors raised by the content model, codec, transport and daemon layers.
#[derive(Debug, Error)]
pub enum IpcError {
    /// The path shape is not accepted by the message type.
    #[error("Unsupported path")]
    InvalidPath,

    /// An argument was outside what the operation accepts.
    #[error("{0}")]
    InvalidArgument(String),

    /// The document does not match the response envelope schema.
    #[error("{0}")]
    MalformedResponse(String),

    /// The tree is deeper than the wire format can express.
    #[error("Tree depth {0} exceeds serializer support")]
    DepthExceeded(usize),

    /// The XML text could not be read or written.
    #[error("XML error: {0}")]
    Xml(String),

    /// Socket or process I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The daemon answered with a non-success code.
    #[error("{message_type} failed with code {code}")]
    Rejected {
        message_type: &'static str,
        code: String,
    },

    /// A bounded wait ran out.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Harness configuration rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A daemon could not be started or controlled.
    #[error("Daemon error: {0}")]
    Daemon(String),
}

impl IpcError {
    pub(crate) fn malformed(msg: &str) -> Self {
        Self::MalformedResponse(msg.to_string())
    }

    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }

    /// True if a bounded wait ran out (socket receive or readiness probe).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<roxmltree::Error> for IpcError {
    fn from(e: roxmltree::Error) -> Self {
        Self::xml(e)
    }
}
