// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tree -> XML.

use super::{
    level, TAG_CLIENT, TAG_CLIENTS, TAG_CODE, TAG_CONTENT, TAG_ID, TAG_OBJECTS, TAG_SESSION_ID,
    TAG_STATUS, TAG_TYPE, TAG_VALUE,
};
use crate::content::{ClientContent, ClientInfo, Content};
use crate::error::{IpcError, Result};
use crate::path::MAX_DEPTH;
use crate::tree::{ContentModel, TreeNode};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Thin indenting writer over an in-memory buffer.
pub(crate) struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub(crate) fn new() -> Self {
        Self {
            inner: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    pub(crate) fn start(&mut self, tag: &str) -> Result<()> {
        self.inner
            .write_event(Event::Start(BytesStart::new(tag)))
            .map_err(IpcError::xml)
    }

    pub(crate) fn end(&mut self, tag: &str) -> Result<()> {
        self.inner
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(IpcError::xml)
    }

    /// `<tag/>`
    pub(crate) fn empty(&mut self, tag: &str) -> Result<()> {
        self.inner
            .write_event(Event::Empty(BytesStart::new(tag)))
            .map_err(IpcError::xml)
    }

    /// `<tag>text</tag>`, text escaped. Text holding a character XML 1.0
    /// cannot carry is rejected, since escaping cannot represent it.
    pub(crate) fn text_element(&mut self, tag: &str, text: &str) -> Result<()> {
        if let Some(bad) = text.chars().find(|&c| !is_xml_char(c)) {
            return Err(IpcError::InvalidArgument(format!(
                "<{}> text contains character {:?} not allowed in XML",
                tag, bad
            )));
        }
        self.start(tag)?;
        self.inner
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(IpcError::xml)?;
        self.end(tag)
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

/// XML 1.0 `Char` production. Surrogates cannot occur in a `char`.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Render one envelope document.
///
/// `SessionID` is omitted when `None`, `Code` is only written for responses,
/// and `Content` is omitted for [`Content::Null`].
pub(crate) fn write_envelope(
    envelope: &str,
    msg_type: &str,
    session_id: Option<&str>,
    code: Option<&str>,
    content: &Content,
) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new();
    w.start(envelope)?;
    w.text_element(TAG_TYPE, msg_type)?;
    if let Some(session_id) = session_id {
        w.text_element(TAG_SESSION_ID, session_id)?;
    }
    if let Some(code) = code {
        w.text_element(TAG_CODE, code)?;
    }
    write_content(&mut w, content)?;
    w.end(envelope)?;
    Ok(w.into_bytes())
}

fn write_content(w: &mut XmlWriter, content: &Content) -> Result<()> {
    match content {
        Content::Null => Ok(()),
        Content::Objects(model) => {
            w.start(TAG_CONTENT)?;
            write_objects(w, model)?;
            w.end(TAG_CONTENT)
        }
        Content::Clients(clients) => {
            w.start(TAG_CONTENT)?;
            write_clients(w, clients)?;
            w.end(TAG_CONTENT)
        }
        Content::ClientList(list) => {
            w.start(TAG_CONTENT)?;
            write_client_list(w, list)?;
            w.end(TAG_CONTENT)
        }
    }
}

fn write_clients(w: &mut XmlWriter, clients: &ClientContent) -> Result<()> {
    w.start(TAG_CLIENTS)?;
    for (id, model) in clients.iter() {
        w.start(TAG_CLIENT)?;
        w.text_element(TAG_ID, id)?;
        write_objects(w, model)?;
        w.end(TAG_CLIENT)?;
    }
    w.end(TAG_CLIENTS)
}

fn write_client_list(w: &mut XmlWriter, list: &[ClientInfo]) -> Result<()> {
    w.start(TAG_CLIENTS)?;
    for client in list {
        w.start(TAG_CLIENT)?;
        w.text_element(TAG_ID, &client.id)?;
        if let Some(status) = &client.status {
            w.text_element(TAG_STATUS, status)?;
        }
        if !client.objects.is_empty() {
            write_objects(w, &client.objects)?;
        }
        w.end(TAG_CLIENT)?;
    }
    w.end(TAG_CLIENTS)
}

/// `<Objects>` with the whole tree. Written even when the model is empty.
pub(crate) fn write_objects(w: &mut XmlWriter, model: &ContentModel) -> Result<()> {
    w.start(TAG_OBJECTS)?;
    if let Some(root) = model.root() {
        write_node(w, root, 0)?;
    }
    w.end(TAG_OBJECTS)
}

fn write_node(w: &mut XmlWriter, node: &TreeNode, depth: usize) -> Result<()> {
    if depth == 0 {
        for child in node.children() {
            write_node(w, child, 1)?;
        }
        return Ok(());
    }
    let level = match level(depth) {
        Some(level) if depth <= MAX_DEPTH => level,
        _ => return Err(IpcError::DepthExceeded(depth)),
    };
    // Unpopulated placeholder: neither it nor its subtree goes on the wire.
    let Some(id) = node.id() else {
        return Ok(());
    };

    w.start(level.tag)?;
    w.text_element(TAG_ID, &id.to_string())?;
    if level.has_value {
        if let Some(value) = node.value() {
            w.text_element(TAG_VALUE, value)?;
        }
    }
    if let Some(label) = node.label() {
        w.empty(label.as_str())?;
    }
    for child in node.children() {
        write_node(w, child, depth + 1)?;
    }
    w.end(level.tag)
}
