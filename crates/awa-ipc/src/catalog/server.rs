// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Operations understood by the server daemon. Paths are addressed per
//! client: `(client id, OIRi path)`.

use super::{MessageSpec, ALL_SHAPES};
use crate::content::ContentKind;
use crate::label::Label;
use crate::path::PathShape;
use std::fmt;

const CLIENTS: ContentKind = ContentKind::Clients;

const TO_RESOURCE: &[PathShape] = &[PathShape::O, PathShape::OI, PathShape::OIR];
const OBJECT_OR_INSTANCE: &[PathShape] = &[PathShape::O, PathShape::OI];
const INSTANCE_OR_RESOURCE: &[PathShape] = &[PathShape::OI, PathShape::OIR];

const CONNECT: MessageSpec = MessageSpec::new("Connect", &[], ContentKind::Null);
const DISCONNECT: MessageSpec = MessageSpec::new("Disconnect", &[], ContentKind::Null);
const LIST_CLIENTS: MessageSpec =
    MessageSpec::new("ListClients", &[], ContentKind::Null).responds_with(ContentKind::ClientList);
const WRITE: MessageSpec = MessageSpec::new("Write", ALL_SHAPES, CLIENTS);
const CREATE: MessageSpec = MessageSpec::new("Write", OBJECT_OR_INSTANCE, CLIENTS)
    .labelled(Label::Create)
    .path_only();
const READ: MessageSpec = MessageSpec::new("Read", TO_RESOURCE, CLIENTS).path_only();
const EXECUTE: MessageSpec = MessageSpec::new("Execute", ALL_SHAPES, CLIENTS);
const DELETE: MessageSpec = MessageSpec::new("Delete", INSTANCE_OR_RESOURCE, CLIENTS).path_only();
const OBSERVE: MessageSpec = MessageSpec::new("Observe", TO_RESOURCE, CLIENTS).path_only();
const CANCEL_OBSERVE: MessageSpec = MessageSpec::new("Observe", TO_RESOURCE, CLIENTS)
    .labelled(Label::CancelObserve)
    .path_only();
const OBSERVE_NOTIFICATION: MessageSpec = MessageSpec::new("Notify", &[], CLIENTS);

/// Server-daemon message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerOp {
    /// Open a session; the response carries the SessionID.
    Connect,
    Disconnect,
    ListClients,
    Write,
    /// Write carrying a `Create` marker.
    Create,
    Read,
    Execute,
    Delete,
    Observe,
    CancelObserve,
    /// Unsolicited; parsed only.
    ObserveNotification,
}

impl ServerOp {
    pub const ALL: [ServerOp; 11] = [
        Self::Connect,
        Self::Disconnect,
        Self::ListClients,
        Self::Write,
        Self::Create,
        Self::Read,
        Self::Execute,
        Self::Delete,
        Self::Observe,
        Self::CancelObserve,
        Self::ObserveNotification,
    ];

    pub const fn spec(self) -> MessageSpec {
        match self {
            Self::Connect => CONNECT,
            Self::Disconnect => DISCONNECT,
            Self::ListClients => LIST_CLIENTS,
            Self::Write => WRITE,
            Self::Create => CREATE,
            Self::Read => READ,
            Self::Execute => EXECUTE,
            Self::Delete => DELETE,
            Self::Observe => OBSERVE,
            Self::CancelObserve => CANCEL_OBSERVE,
            Self::ObserveNotification => OBSERVE_NOTIFICATION,
        }
    }
}

impl From<ServerOp> for MessageSpec {
    fn from(op: ServerOp) -> Self {
        op.spec()
    }
}

impl fmt::Display for ServerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{supports, Path};

    #[test]
    fn test_session_ops_carry_nothing() {
        for op in [ServerOp::Connect, ServerOp::Disconnect, ServerOp::ListClients] {
            let spec = op.spec();
            assert_eq!(spec.content, ContentKind::Null);
            assert!(!spec.accepts_paths());
        }
        assert_eq!(ServerOp::ListClients.spec().response_content, ContentKind::ClientList);
    }

    #[test]
    fn test_observe_family() {
        assert_eq!(ServerOp::Observe.spec().name, ServerOp::CancelObserve.spec().name);
        assert_eq!(ServerOp::CancelObserve.spec().label, Some(Label::CancelObserve));
        assert!(!supports(&Path::from([1, 2, 3, 4]), ServerOp::Observe.spec().shapes));
        assert!(supports(&Path::from([1]), ServerOp::CancelObserve.spec().shapes));
    }

    #[test]
    fn test_value_handling() {
        assert!(!ServerOp::Write.spec().discards_value);
        assert!(!ServerOp::Execute.spec().discards_value);
        assert!(ServerOp::Read.spec().discards_value);
        assert!(ServerOp::Delete.spec().discards_value);
        assert_eq!(ServerOp::Create.spec().name, "Write");
    }
}
