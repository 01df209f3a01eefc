// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `<Content>` payload variants.
//!
//! Client-daemon messages carry a single object tree. Server-daemon messages
//! address `(client id, path)` pairs and carry one tree per client. Session
//! control messages carry nothing, and ListClients responses carry the
//! registered client list.

use crate::error::{IpcError, Result};
use crate::label::Label;
use crate::path::Path;
use crate::tree::{check_value_path, ContentModel};

/// Which payload a message type carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// No `<Content>` element.
    Null,
    /// `<Content><Objects>`
    Objects,
    /// `<Content><Clients><Client><ID/><Objects>`
    Clients,
    /// `<Content><Clients><Client><ID/><Status/>` (ListClients response)
    ClientList,
}

/// Message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Null,
    Objects(ContentModel),
    Clients(ClientContent),
    ClientList(Vec<ClientInfo>),
}

impl Content {
    /// Empty payload of the given kind.
    pub fn empty(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Null => Self::Null,
            ContentKind::Objects => Self::Objects(ContentModel::new()),
            ContentKind::Clients => Self::Clients(ClientContent::new()),
            ContentKind::ClientList => Self::ClientList(Vec::new()),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Null => ContentKind::Null,
            Self::Objects(_) => ContentKind::Objects,
            Self::Clients(_) => ContentKind::Clients,
            Self::ClientList(_) => ContentKind::ClientList,
        }
    }

    pub fn model(&self) -> Option<&ContentModel> {
        match self {
            Self::Objects(model) => Some(model),
            _ => None,
        }
    }

    pub fn clients(&self) -> Option<&ClientContent> {
        match self {
            Self::Clients(clients) => Some(clients),
            _ => None,
        }
    }

    /// Client ids in document (or first-added) order. Empty for payloads
    /// without clients.
    pub fn client_ids(&self) -> Vec<&str> {
        match self {
            Self::Clients(clients) => clients.client_ids(),
            Self::ClientList(list) => list.iter().map(|c| c.id.as_str()).collect(),
            Self::Null | Self::Objects(_) => Vec::new(),
        }
    }

    /// Value lookup in a single-tree payload.
    pub fn get_value(&self, path: &Path) -> Result<Option<&str>> {
        match self {
            Self::Objects(model) => model.get_value(path),
            Self::Null => Ok(None),
            other => Err(IpcError::InvalidArgument(format!(
                "{:?} content is addressed by client id",
                other.kind()
            ))),
        }
    }

    /// Value lookup in a multi-client payload.
    pub fn get_client_value(&self, client_id: &str, path: &Path) -> Result<Option<&str>> {
        match self {
            Self::Clients(clients) => clients.get_value(client_id, path),
            Self::Null => Ok(None),
            other => Err(IpcError::InvalidArgument(format!(
                "{:?} content is not addressed by client id",
                other.kind()
            ))),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClientEntry {
    id: String,
    model: ContentModel,
}

/// One object tree per client id, kept in first-added order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContent {
    clients: Vec<ClientEntry>,
}

impl ClientContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Merge into the tree of `client_id`, creating it on first use.
    pub fn add(&mut self, client_id: &str, path: &Path, value: Option<String>, label: Option<Label>) {
        self.model_mut(client_id).add(path, value, label);
    }

    /// Tree for `client_id`, created empty if unknown.
    pub fn model_mut(&mut self, client_id: &str) -> &mut ContentModel {
        let index = match self.clients.iter().position(|c| c.id == client_id) {
            Some(index) => index,
            None => {
                self.clients.push(ClientEntry {
                    id: client_id.to_string(),
                    model: ContentModel::new(),
                });
                self.clients.len() - 1
            }
        };
        &mut self.clients[index].model
    }

    /// Replace the tree of `client_id`, keeping its position if already known.
    pub fn insert(&mut self, client_id: &str, model: ContentModel) {
        *self.model_mut(client_id) = model;
    }

    pub fn model(&self, client_id: &str) -> Option<&ContentModel> {
        self.clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| &c.model)
    }

    /// Value at `path` for `client_id`. An unknown client is `Ok(None)`.
    pub fn get_value(&self, client_id: &str, path: &Path) -> Result<Option<&str>> {
        match self.model(client_id) {
            Some(model) => model.get_value(path),
            None => check_value_path(path).map(|()| None),
        }
    }

    pub fn client_ids(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.id.as_str()).collect()
    }

    /// `(client id, tree)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContentModel)> {
        self.clients.iter().map(|c| (c.id.as_str(), &c.model))
    }
}

/// One entry of a ListClients response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Endpoint name.
    pub id: String,
    /// Registration status text, e.g. "Registered".
    pub status: Option<String>,
    /// Registered objects and instances.
    pub objects: ContentModel,
}

impl ClientInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_client_isolation() {
        let mut content = ClientContent::new();
        content.add("ClientA", &Path::from([1, 2, 3]), Some("x".into()), None);
        content.add("ClientB", &Path::from([1, 2, 3]), Some("y".into()), None);

        assert_eq!(content.get_value("ClientA", &Path::from([1, 2, 3])).unwrap(), Some("x"));
        assert_eq!(content.get_value("ClientB", &Path::from([1, 2, 3])).unwrap(), Some("y"));
        assert_eq!(content.client_ids(), vec!["ClientA", "ClientB"]);
    }

    #[test]
    fn test_unknown_client_is_not_found() {
        let content = ClientContent::new();
        assert_eq!(content.get_value("Nobody", &Path::from([1, 2, 3])).unwrap(), None);
        assert!(content.get_value("Nobody", &Path::from([1])).is_err());
    }

    #[test]
    fn test_client_order_is_first_added() {
        let mut content = ClientContent::new();
        content.add("Zed", &Path::from([1]), None, None);
        content.add("Alpha", &Path::from([1]), None, None);
        content.add("Zed", &Path::from([2]), None, None);
        assert_eq!(content.client_ids(), vec!["Zed", "Alpha"]);
        assert_eq!(content.len(), 2);
    }

    #[test]
    fn test_content_kind_dispatch() {
        let objects = Content::empty(ContentKind::Objects);
        assert_eq!(objects.get_value(&Path::from([1, 2, 3])).unwrap(), None);
        assert!(objects.get_client_value("c", &Path::from([1, 2, 3])).is_err());

        let clients = Content::empty(ContentKind::Clients);
        assert!(clients.get_value(&Path::from([1, 2, 3])).is_err());
        assert_eq!(clients.get_client_value("c", &Path::from([1, 2, 3])).unwrap(), None);

        assert!(Content::empty(ContentKind::Null).is_null());
    }

    #[test]
    fn test_client_list_ids() {
        let content = Content::ClientList(vec![
            ClientInfo::new("TestClient1").with_status("Registered"),
            ClientInfo::new("TestClient2"),
        ]);
        assert_eq!(content.client_ids(), vec!["TestClient1", "TestClient2"]);
    }
}
