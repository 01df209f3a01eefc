// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static per-operation message table.
//!
//! Every operation is one row: wire type name, accepted path shapes, payload
//! kind, and the label stamped on each added path. A single generic
//! [`Request`](crate::Request) / [`Response`](crate::Response) pair consumes
//! these rows.

mod client;
mod server;

pub use client::ClientOp;
pub use server::ServerOp;

use crate::content::ContentKind;
use crate::label::Label;
use crate::path::PathShape;

/// Paths accepted by operations that can address any depth.
pub(crate) const ALL_SHAPES: &[PathShape] = PathShape::ALL;

/// Configuration of one message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpec {
    /// `<Type>` text on the wire.
    pub name: &'static str,
    /// Path depths `add` accepts. Empty for messages that carry no paths.
    pub shapes: &'static [PathShape],
    /// Request payload kind.
    pub content: ContentKind,
    /// Payload kind of the matching response, when it differs.
    pub response_content: ContentKind,
    /// Label attached to every added path.
    pub label: Option<Label>,
    /// Values passed to `add` are dropped (the request addresses paths only).
    pub discards_value: bool,
}

impl MessageSpec {
    pub(crate) const fn new(name: &'static str, shapes: &'static [PathShape], content: ContentKind) -> Self {
        Self {
            name,
            shapes,
            content,
            response_content: content,
            label: None,
            discards_value: false,
        }
    }

    pub(crate) const fn labelled(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub(crate) const fn path_only(mut self) -> Self {
        self.discards_value = true;
        self
    }

    pub(crate) const fn responds_with(mut self, content: ContentKind) -> Self {
        self.response_content = content;
        self
    }

    /// Whether the message can carry paths at all.
    pub fn accepts_paths(&self) -> bool {
        !self.shapes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let spec = MessageSpec::new("Get", ALL_SHAPES, ContentKind::Objects);
        assert_eq!(spec.label, None);
        assert!(!spec.discards_value);
        assert_eq!(spec.response_content, ContentKind::Objects);
        assert!(spec.accepts_paths());

        let spec = MessageSpec::new("Observe", &[PathShape::O], ContentKind::Clients)
            .labelled(Label::CancelObserve)
            .path_only();
        assert_eq!(spec.label, Some(Label::CancelObserve));
        assert!(spec.discards_value);
    }

    #[test]
    fn test_no_shapes_no_paths() {
        let spec = MessageSpec::new("Connect", &[], ContentKind::Null);
        assert!(!spec.accepts_paths());
    }
}
