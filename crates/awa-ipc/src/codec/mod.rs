// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XML wire codec for IPC content.
//!
//! Both directions are driven by one level table: depth 0 is the synthetic
//! root (no element), depths 1-4 are `Object`, `ObjectInstance`, `Resource`
//! and `ResourceInstance`. Every level below the root carries an `<ID>`;
//! only Resource and ResourceInstance carry a `<Value>`.
//!
//! ```text
//! <Objects>
//!   <Object><ID>3</ID>
//!     <ObjectInstance><ID>0</ID>
//!       <Resource><ID>0</ID><Value>v</Value></Resource>
//!       <Resource><ID>9</ID>
//!         <ResourceInstance><ID>1</ID><Value>w</Value></ResourceInstance>
//!       </Resource>
//!     </ObjectInstance>
//!   </Object>
//! </Objects>
//! ```

mod read;
mod write;

pub(crate) use read::{child_text, read_content};
pub(crate) use write::write_envelope;

pub const TAG_ID: &str = "ID";
pub const TAG_VALUE: &str = "Value";
pub const TAG_OBJECTS: &str = "Objects";
pub const TAG_CLIENTS: &str = "Clients";
pub const TAG_CLIENT: &str = "Client";
pub const TAG_CONTENT: &str = "Content";
pub const TAG_TYPE: &str = "Type";
pub const TAG_SESSION_ID: &str = "SessionID";
pub const TAG_CODE: &str = "Code";
pub const TAG_STATUS: &str = "Status";
pub const TAG_RESULT: &str = "Result";
pub const TAG_ERROR: &str = "Error";
pub const TAG_CHANGE_TYPE: &str = "ChangeType";

/// Shape of one tree level on the wire.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Level {
    /// Element name; empty for the root.
    pub tag: &'static str,
    /// Whether a `<Value>` child is read and written at this level.
    pub has_value: bool,
}

pub(crate) const LEVELS: [Level; 5] = [
    Level { tag: "", has_value: false },
    Level { tag: "Object", has_value: false },
    Level { tag: "ObjectInstance", has_value: false },
    Level { tag: "Resource", has_value: true },
    Level { tag: "ResourceInstance", has_value: true },
];

/// Level at `depth`, if the wire format has one.
pub(crate) fn level(depth: usize) -> Option<&'static Level> {
    LEVELS.get(depth)
}
