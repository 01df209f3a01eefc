// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Operation-variant markers carried on tree nodes.
//!
//! On the wire a label is an empty element inside the node it annotates,
//! e.g. `<Resource><ID>4</ID><SubscribeToExecute/></Resource>`.

use crate::error::{IpcError, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    SubscribeToChange,
    CancelSubscribeToChange,
    SubscribeToExecute,
    CancelSubscribeToExecute,
    CancelObserve,
    Create,
}

impl Label {
    pub const ALL: [Label; 6] = [
        Self::SubscribeToChange,
        Self::CancelSubscribeToChange,
        Self::SubscribeToExecute,
        Self::CancelSubscribeToExecute,
        Self::CancelObserve,
        Self::Create,
    ];

    /// Marker element name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubscribeToChange => "SubscribeToChange",
            Self::CancelSubscribeToChange => "CancelSubscribeToChange",
            Self::SubscribeToExecute => "SubscribeToExecute",
            Self::CancelSubscribeToExecute => "CancelSubscribeToExecute",
            Self::CancelObserve => "CancelObserve",
            Self::Create => "Create",
        }
    }

    /// Label for a marker element name, if it is one.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == tag)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s).ok_or_else(|| IpcError::InvalidArgument(format!("Unknown label: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_round_trip() {
        for label in Label::ALL {
            assert_eq!(Label::from_tag(label.as_str()), Some(label));
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(Label::from_tag("Result"), None);
        let err = "Observe".parse::<Label>().unwrap_err();
        assert!(matches!(err, IpcError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "Unknown label: Observe");
        assert_eq!("CancelObserve".parse::<Label>().unwrap(), Label::CancelObserve);
    }
}
