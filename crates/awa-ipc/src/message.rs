// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request / Response / Notification envelopes.
//!
//! One generic [`Request`] and one generic [`Response`] serve every
//! operation; behaviour differences come from the [`MessageSpec`] row the
//! message was created with.

use crate::catalog::MessageSpec;
use crate::codec::{self, child_text, read_content, write_envelope};
use crate::content::{ClientContent, ClientInfo, Content};
use crate::error::{IpcError, Result};
use crate::path::{self, Path};
use crate::tree::ContentModel;
use std::fmt;

/// Outer element of an IPC document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Request,
    Response,
    Notification,
}

impl Envelope {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Response => "Response",
            Self::Notification => "Notification",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Request" => Some(Self::Request),
            "Response" => Some(Self::Response),
            "Notification" => Some(Self::Notification),
            _ => None,
        }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing message, built by repeated `add` calls.
#[derive(Debug, Clone)]
pub struct Request {
    spec: MessageSpec,
    session_id: Option<String>,
    content: Content,
}

impl Request {
    pub fn new(spec: impl Into<MessageSpec>) -> Self {
        let spec = spec.into();
        Self {
            spec,
            session_id: None,
            content: Content::empty(spec.content),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn spec(&self) -> &MessageSpec {
        &self.spec
    }

    /// `<Type>` text.
    pub fn message_type(&self) -> &'static str {
        self.spec.name
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Address `path` with a value (client-daemon messages).
    pub fn add(&mut self, path: impl Into<Path>, value: &str) -> Result<()> {
        self.add_entry(None, path.into(), Some(value))
    }

    /// Address `path` without a value.
    pub fn add_path(&mut self, path: impl Into<Path>) -> Result<()> {
        self.add_entry(None, path.into(), None)
    }

    /// Address `path` of `client_id` with a value (server-daemon messages).
    pub fn add_client(&mut self, client_id: &str, path: impl Into<Path>, value: &str) -> Result<()> {
        self.add_entry(Some(client_id), path.into(), Some(value))
    }

    /// Address `path` of `client_id` without a value.
    pub fn add_client_path(&mut self, client_id: &str, path: impl Into<Path>) -> Result<()> {
        self.add_entry(Some(client_id), path.into(), None)
    }

    /// Every check runs before the tree is touched, so a rejected call
    /// leaves the request unchanged.
    fn add_entry(&mut self, client_id: Option<&str>, path: Path, value: Option<&str>) -> Result<()> {
        let spec = self.spec;
        if !spec.accepts_paths() {
            return Err(IpcError::InvalidArgument(format!(
                "{} does not carry paths",
                spec.name
            )));
        }
        path::validate(&path, spec.shapes)?;

        let value = if spec.discards_value {
            None
        } else {
            value.map(str::to_string)
        };
        match (&mut self.content, client_id) {
            (Content::Objects(model), None) => model.add(&path, value, spec.label),
            (Content::Clients(clients), Some(client_id)) => {
                clients.add(client_id, &path, value, spec.label)
            }
            (Content::Objects(_), Some(_)) => {
                return Err(IpcError::InvalidArgument(format!(
                    "{} is not addressed by client id",
                    spec.name
                )))
            }
            (_, None) => {
                return Err(IpcError::InvalidArgument(
                    "add requires a client id and a path".to_string(),
                ))
            }
            (_, Some(_)) => {
                return Err(IpcError::InvalidArgument(format!(
                    "{} does not carry paths",
                    spec.name
                )))
            }
        }
        Ok(())
    }

    /// Render the request document.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        write_envelope(
            Envelope::Request.as_str(),
            self.spec.name,
            self.session_id.as_deref(),
            None,
            &self.content,
        )
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", Envelope::Request, self.spec.name)?;
        if let Some(model) = self.content.model() {
            write!(f, " {}", model)?;
        }
        Ok(())
    }
}

/// Opaque result code. Daemons use HTTP-like numbers or error names, so no
/// fixed set is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseCode(String);

impl ResponseCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, if the code is a number.
    pub fn as_u16(&self) -> Option<u16> {
        self.0.trim().parse().ok()
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        matches!(self.as_u16(), Some(200..=299))
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u16> for ResponseCode {
    fn from(code: u16) -> Self {
        Self(code.to_string())
    }
}

impl From<&str> for ResponseCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl PartialEq<&str> for ResponseCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Parsed (or, for test daemons, built) reply or notification.
#[derive(Debug, Clone)]
pub struct Response {
    envelope: Envelope,
    spec: MessageSpec,
    session_id: Option<String>,
    code: ResponseCode,
    content: Content,
}

impl Response {
    /// Parse a reply to a request of type `spec`.
    ///
    /// Checks, in order: root element, `<Type>` presence and match,
    /// `<Code>` presence. `<SessionID>` is optional. A missing `<Content>`
    /// gives an empty payload.
    pub fn parse(xml: impl AsRef<[u8]>, spec: impl Into<MessageSpec>) -> Result<Self> {
        Self::parse_as(xml.as_ref(), spec.into(), &[Envelope::Response])
    }

    /// Parse an unsolicited push. Daemons send these with either root.
    pub fn parse_notification(xml: impl AsRef<[u8]>, spec: impl Into<MessageSpec>) -> Result<Self> {
        Self::parse_as(
            xml.as_ref(),
            spec.into(),
            &[Envelope::Notification, Envelope::Response],
        )
    }

    fn parse_as(xml: &[u8], spec: MessageSpec, roots: &[Envelope]) -> Result<Self> {
        let text = std::str::from_utf8(xml).map_err(IpcError::xml)?;
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();

        let envelope = Envelope::from_tag(root.tag_name().name())
            .filter(|e| roots.contains(e))
            .ok_or_else(|| IpcError::malformed("Invalid response"))?;

        let msg_type = child_text(root, codec::TAG_TYPE)
            .ok_or_else(|| IpcError::malformed("Missing message type"))?;
        if msg_type.trim() != spec.name {
            tracing::debug!(expected = spec.name, got = msg_type, "message type mismatch");
            return Err(IpcError::malformed("Invalid message type"));
        }

        let code = child_text(root, codec::TAG_CODE)
            .ok_or_else(|| IpcError::malformed("Missing response code"))?;

        let session_id = child_text(root, codec::TAG_SESSION_ID).map(|s| s.trim().to_string());
        if session_id.is_none() {
            tracing::debug!(msg_type = spec.name, "no session id in response");
        }

        let content = read_content(root, spec.response_content)?;
        Ok(Self {
            envelope,
            spec,
            session_id,
            code: ResponseCode::new(code.trim()),
            content,
        })
    }

    /// Reply to build and serialize (mock daemons, tools).
    pub fn new(spec: impl Into<MessageSpec>, code: impl Into<ResponseCode>) -> Self {
        let spec = spec.into();
        Self {
            envelope: Envelope::Response,
            spec,
            session_id: None,
            code: code.into(),
            content: Content::empty(spec.response_content),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    /// Send as `<Notification>` instead of `<Response>`.
    pub fn as_notification(mut self) -> Self {
        self.envelope = Envelope::Notification;
        self
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn message_type(&self) -> &'static str {
        self.spec.name
    }

    pub fn code(&self) -> &ResponseCode {
        &self.code
    }

    /// Fails with [`IpcError::Rejected`] unless the code is 2xx.
    pub fn check_success(&self) -> Result<()> {
        if self.code.is_success() {
            return Ok(());
        }
        Err(IpcError::Rejected {
            message_type: self.spec.name,
            code: self.code.to_string(),
        })
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    /// Single-tree payload, if this is a client-daemon message.
    pub fn model(&self) -> Option<&ContentModel> {
        self.content.model()
    }

    /// Per-client payload, if this is a server-daemon message.
    pub fn clients(&self) -> Option<&ClientContent> {
        self.content.clients()
    }

    /// ListClients entries.
    pub fn client_list(&self) -> &[ClientInfo] {
        match &self.content {
            Content::ClientList(list) => list,
            _ => &[],
        }
    }

    pub fn client_ids(&self) -> Vec<&str> {
        self.content.client_ids()
    }

    /// See [`ContentModel::get_value`].
    pub fn get_value(&self, path: impl Into<Path>) -> Result<Option<&str>> {
        self.content.get_value(&path.into())
    }

    /// See [`ClientContent::get_value`].
    pub fn get_client_value(&self, client_id: &str, path: impl Into<Path>) -> Result<Option<&str>> {
        self.content.get_client_value(client_id, &path.into())
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        write_envelope(
            self.envelope.as_str(),
            self.spec.name,
            self.session_id.as_deref(),
            Some(self.code.as_str()),
            &self.content,
        )
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} code {}", self.envelope, self.spec.name, self.code)?;
        if let Some(model) = self.content.model() {
            write!(f, " {}", model)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ClientOp, ServerOp};

    #[test]
    fn test_rejected_add_leaves_request_untouched() {
        let mut request = Request::new(ClientOp::Set);
        request.add([3, 0, 0], "x").unwrap();
        let before = request.serialize().unwrap();

        assert!(matches!(request.add([3, 0], "y"), Err(IpcError::InvalidPath)));
        assert!(matches!(request.add([3], "y"), Err(IpcError::InvalidPath)));
        assert!(matches!(
            request.add(Option::<[u32; 3]>::None, "y"),
            Err(IpcError::InvalidPath)
        ));
        assert_eq!(request.serialize().unwrap(), before);
    }

    #[test]
    fn test_wrong_addressing_mode() {
        let mut request = Request::new(ClientOp::Get);
        assert!(matches!(
            request.add_client_path("c", [3, 0]),
            Err(IpcError::InvalidArgument(_))
        ));

        let mut request = Request::new(ServerOp::Read);
        assert!(matches!(request.add_path([3, 0]), Err(IpcError::InvalidArgument(_))));

        let mut request = Request::new(ServerOp::Connect);
        assert!(matches!(
            request.add_client_path("c", [3]),
            Err(IpcError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_path_only_ops_drop_values() {
        let mut request = Request::new(ServerOp::Read);
        request.add_client("TestClient1", [1, 2, 3], "ignored").unwrap();
        let model = request.content().clients().unwrap().model("TestClient1").unwrap();
        assert_eq!(model.get_value(&Path::from([1, 2, 3])).unwrap(), None);
    }

    #[test]
    fn test_label_applied() {
        let mut request = Request::new(ClientOp::Create);
        request.add_path([3, 1]).unwrap();
        let node = request.content().model().unwrap().node(&Path::from([3, 1])).unwrap();
        assert_eq!(node.label(), Some(crate::label::Label::Create));
    }

    #[test]
    fn test_response_code() {
        let code = ResponseCode::from(205u16);
        assert!(code.is_success());
        assert_eq!(code, "205");
        let code = ResponseCode::from("non-numeric");
        assert_eq!(code.as_u16(), None);
        assert!(!code.is_success());

        assert!(Response::new(ServerOp::Connect, 200u16).check_success().is_ok());
        let err = Response::new(ServerOp::Connect, 403u16).check_success().unwrap_err();
        assert_eq!(err.to_string(), "Connect failed with code 403");
    }

    #[test]
    fn test_built_response_parses_back() {
        let mut model = ContentModel::new();
        model.add(&Path::from([3, 0, 15]), Some("Europe/London".into()), None);
        let bytes = Response::new(ClientOp::Get, 200u16)
            .with_content(Content::Objects(model))
            .serialize()
            .unwrap();

        let parsed = Response::parse(&bytes, ClientOp::Get).unwrap();
        assert_eq!(parsed.code(), &ResponseCode::from(200u16));
        assert_eq!(parsed.get_value([3, 0, 15]).unwrap(), Some("Europe/London"));
    }

    #[test]
    fn test_notification_roots() {
        let xml = "<Notification><Type>Notify</Type><Code>205</Code></Notification>";
        assert!(Response::parse_notification(xml, ServerOp::ObserveNotification).is_ok());
        let err = Response::parse(xml, ServerOp::ObserveNotification).unwrap_err();
        assert_eq!(err.to_string(), "Invalid response");
    }

    #[test]
    fn test_invalid_utf8() {
        let err = Response::parse([0xff, 0xfe, 0x00], ClientOp::Get).unwrap_err();
        assert!(matches!(err, IpcError::Xml(_)));
    }
}
