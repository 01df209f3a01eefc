// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Operations understood by the client daemon.

use super::{MessageSpec, ALL_SHAPES};
use crate::content::ContentKind;
use crate::label::Label;
use crate::path::PathShape;
use std::fmt;

const OBJECTS: ContentKind = ContentKind::Objects;

const RESOURCE_OR_INSTANCE: &[PathShape] = &[PathShape::OIR, PathShape::OIRi];
const INSTANCE_OR_RESOURCE: &[PathShape] = &[PathShape::OI, PathShape::OIR];
const RESOURCE: &[PathShape] = &[PathShape::OIR];

const GET: MessageSpec = MessageSpec::new("Get", ALL_SHAPES, OBJECTS);
const SET: MessageSpec = MessageSpec::new("Set", RESOURCE_OR_INSTANCE, OBJECTS);
const CREATE: MessageSpec =
    MessageSpec::new("Set", INSTANCE_OR_RESOURCE, OBJECTS).labelled(Label::Create);
const DELETE: MessageSpec = MessageSpec::new("Delete", INSTANCE_OR_RESOURCE, OBJECTS).path_only();
const SUBSCRIBE_TO_CHANGE: MessageSpec = MessageSpec::new("Subscribe", INSTANCE_OR_RESOURCE, OBJECTS)
    .labelled(Label::SubscribeToChange)
    .path_only();
const CANCEL_SUBSCRIBE_TO_CHANGE: MessageSpec =
    MessageSpec::new("Subscribe", INSTANCE_OR_RESOURCE, OBJECTS)
        .labelled(Label::CancelSubscribeToChange)
        .path_only();
const SUBSCRIBE_TO_EXECUTE: MessageSpec = MessageSpec::new("Subscribe", RESOURCE, OBJECTS)
    .labelled(Label::SubscribeToExecute)
    .path_only();
const CANCEL_SUBSCRIBE_TO_EXECUTE: MessageSpec = MessageSpec::new("Subscribe", RESOURCE, OBJECTS)
    .labelled(Label::CancelSubscribeToExecute)
    .path_only();
const CHANGE_NOTIFICATION: MessageSpec = MessageSpec::new("ChangeNotification", &[], OBJECTS);
const EXECUTE_NOTIFICATION: MessageSpec = MessageSpec::new("ExecuteNotification", &[], OBJECTS);

/// Client-daemon message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientOp {
    Get,
    Set,
    /// Set carrying a `Create` marker on the new instance or resource.
    Create,
    Delete,
    SubscribeToChange,
    CancelSubscribeToChange,
    SubscribeToExecute,
    CancelSubscribeToExecute,
    /// Unsolicited; parsed only.
    ChangeNotification,
    /// Unsolicited; parsed only.
    ExecuteNotification,
}

impl ClientOp {
    pub const ALL: [ClientOp; 10] = [
        Self::Get,
        Self::Set,
        Self::Create,
        Self::Delete,
        Self::SubscribeToChange,
        Self::CancelSubscribeToChange,
        Self::SubscribeToExecute,
        Self::CancelSubscribeToExecute,
        Self::ChangeNotification,
        Self::ExecuteNotification,
    ];

    pub const fn spec(self) -> MessageSpec {
        match self {
            Self::Get => GET,
            Self::Set => SET,
            Self::Create => CREATE,
            Self::Delete => DELETE,
            Self::SubscribeToChange => SUBSCRIBE_TO_CHANGE,
            Self::CancelSubscribeToChange => CANCEL_SUBSCRIBE_TO_CHANGE,
            Self::SubscribeToExecute => SUBSCRIBE_TO_EXECUTE,
            Self::CancelSubscribeToExecute => CANCEL_SUBSCRIBE_TO_EXECUTE,
            Self::ChangeNotification => CHANGE_NOTIFICATION,
            Self::ExecuteNotification => EXECUTE_NOTIFICATION,
        }
    }
}

impl From<ClientOp> for MessageSpec {
    fn from(op: ClientOp) -> Self {
        op.spec()
    }
}

impl fmt::Display for ClientOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{supports, Path};

    #[test]
    fn test_subscribe_family_shares_wire_type() {
        for op in [
            ClientOp::SubscribeToChange,
            ClientOp::CancelSubscribeToChange,
            ClientOp::SubscribeToExecute,
            ClientOp::CancelSubscribeToExecute,
        ] {
            assert_eq!(op.spec().name, "Subscribe");
            assert!(op.spec().label.is_some());
        }
    }

    #[test]
    fn test_shapes() {
        let resource = Path::from([3, 0, 4]);
        let instance = Path::from([3, 0]);
        let object = Path::from([3]);

        assert!(supports(&object, ClientOp::Get.spec().shapes));
        assert!(!supports(&instance, ClientOp::Set.spec().shapes));
        assert!(supports(&instance, ClientOp::Delete.spec().shapes));
        assert!(!supports(&object, ClientOp::Delete.spec().shapes));
        assert!(supports(&resource, ClientOp::SubscribeToExecute.spec().shapes));
        assert!(!supports(&instance, ClientOp::CancelSubscribeToExecute.spec().shapes));
    }

    #[test]
    fn test_notifications_take_no_paths() {
        assert!(!ClientOp::ChangeNotification.spec().accepts_paths());
        assert!(!ClientOp::ExecuteNotification.spec().accepts_paths());
        assert!(ClientOp::ALL
            .iter()
            .all(|op| op.spec().content == ContentKind::Objects));
    }
}
