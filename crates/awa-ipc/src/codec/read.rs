// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XML -> tree.
//!
//! Reading is schema-directed: at each depth only elements named by the
//! level table are descended into. Everything else (`<Parameter>`,
//! `<DefaultWriteMode>`, ...) is skipped, except for label markers and the
//! `<Result>` / `<ChangeType>` annotations.

use super::{
    level, TAG_CHANGE_TYPE, TAG_CLIENT, TAG_CLIENTS, TAG_CONTENT, TAG_ERROR, TAG_ID, TAG_OBJECTS,
    TAG_RESULT, TAG_STATUS, TAG_VALUE,
};
use crate::content::{ClientContent, ClientInfo, Content, ContentKind};
use crate::error::{IpcError, Result};
use crate::label::Label;
use crate::path::{Segment, MAX_DEPTH};
use crate::tree::{ContentModel, TreeNode};
use roxmltree::Node;

/// First child element named `tag`.
pub(crate) fn child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

/// Text of the first child element named `tag`. An element without text
/// reads as the empty string.
pub(crate) fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    child_element(node, tag).map(|n| n.text().unwrap_or(""))
}

fn elements<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

/// Build the payload of `kind` from an envelope element.
///
/// An absent `<Content>` yields the empty payload of that kind (or
/// [`Content::Null`] for kinds that never carry one).
pub(crate) fn read_content(envelope: Node<'_, '_>, kind: ContentKind) -> Result<Content> {
    let Some(content) = child_element(envelope, TAG_CONTENT) else {
        return Ok(Content::empty(kind));
    };
    match kind {
        ContentKind::Null => Ok(Content::Null),
        ContentKind::Objects => Ok(Content::Objects(read_objects_under(content)?)),
        ContentKind::Clients => Ok(Content::Clients(read_clients(content)?)),
        ContentKind::ClientList => Ok(Content::ClientList(read_client_list(content)?)),
    }
}

/// Model for the `<Objects>` child of `parent`; empty if there is none.
fn read_objects_under(parent: Node<'_, '_>) -> Result<ContentModel> {
    match child_element(parent, TAG_OBJECTS) {
        Some(objects) => read_objects(objects),
        None => Ok(ContentModel::new()),
    }
}

/// Model for an `<Objects>` element. An `<Objects>` with no `<Object>`
/// children reads as an empty model.
pub(crate) fn read_objects(objects: Node<'_, '_>) -> Result<ContentModel> {
    let root = build_node(objects, 0)?;
    if root.is_leaf() {
        return Ok(ContentModel::new());
    }
    Ok(ContentModel::from_root(root))
}

fn read_clients(content: Node<'_, '_>) -> Result<ClientContent> {
    let mut clients = ClientContent::new();
    if let Some(list) = child_element(content, TAG_CLIENTS) {
        for client in elements(list, TAG_CLIENT) {
            let id = client_id(client)?;
            clients.insert(id, read_objects_under(client)?);
        }
    }
    Ok(clients)
}

fn read_client_list(content: Node<'_, '_>) -> Result<Vec<ClientInfo>> {
    let mut out = Vec::new();
    if let Some(list) = child_element(content, TAG_CLIENTS) {
        for client in elements(list, TAG_CLIENT) {
            let mut info = ClientInfo::new(client_id(client)?);
            info.status = child_text(client, TAG_STATUS).map(str::to_string);
            info.objects = read_objects_under(client)?;
            out.push(info);
        }
    }
    Ok(out)
}

fn client_id<'a>(client: Node<'a, '_>) -> Result<&'a str> {
    child_text(client, TAG_ID)
        .map(str::trim)
        .ok_or_else(|| IpcError::malformed("Client without ID"))
}

fn build_node(element: Node<'_, '_>, depth: usize) -> Result<TreeNode> {
    let mut node = if depth == 0 {
        TreeNode::root()
    } else {
        let id = child_text(element, TAG_ID).ok_or_else(|| {
            IpcError::MalformedResponse(format!(
                "Missing ID in <{}>",
                element.tag_name().name()
            ))
        })?;
        TreeNode::new(Segment::parse(id))
    };

    let has_value = level(depth).map_or(false, |l| l.has_value);
    if has_value {
        node.set_value(child_text(element, TAG_VALUE).map(str::to_string));
    }

    for child in element.children().filter(Node::is_element) {
        let tag = child.tag_name().name();
        if let Some(label) = Label::from_tag(tag) {
            node.set_label(Some(label));
        } else if tag == TAG_RESULT {
            node.set_result(child_text(child, TAG_ERROR).map(str::to_string));
        } else if tag == TAG_CHANGE_TYPE {
            node.set_change_type(Some(child.text().unwrap_or("").to_string()));
        }
    }

    if depth < MAX_DEPTH {
        if let Some(next) = level(depth + 1) {
            for child in elements(element, next.tag) {
                let built = build_node(child, depth + 1)?;
                tracing::trace!(depth = depth + 1, id = ?built.id(), "read node");
                node.add_child(built);
            }
        }
    }
    Ok(node)
}
