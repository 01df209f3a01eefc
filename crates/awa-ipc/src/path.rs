// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OIRi paths and path-shape validation.
//!
//! A path addresses one node of the Object / ObjectInstance / Resource /
//! ResourceInstance tree. Its length is its depth: `/3` is an Object,
//! `/3/0` an ObjectInstance, `/3/0/1` a Resource and `/3/0/1/2` a
//! ResourceInstance. Each message type accepts a fixed set of depths.

use crate::error::{IpcError, Result};
use std::fmt;
use std::str::FromStr;

/// Deepest path the wire format can carry (ResourceInstance).
pub const MAX_DEPTH: usize = 4;

/// One path segment: a numeric OIRi id, or an opaque name.
///
/// Numeric ids order numerically and sort before names, so sibling traversal
/// is ascending-id regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Id(u32),
    Name(String),
}

impl Segment {
    /// Interpret an `<ID>` text. Canonical decimal text becomes
    /// [`Segment::Id`] so that parsed trees can be queried with integer
    /// paths. Anything that would not write back identically (`03`, `+5`)
    /// stays a [`Segment::Name`].
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let canonical = !text.is_empty()
            && text.bytes().all(|b| b.is_ascii_digit())
            && (text == "0" || !text.starts_with('0'));
        match text.parse::<u32>() {
            Ok(id) if canonical => Self::Id(id),
            _ => Self::Name(text.to_string()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<u32> for Segment {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// An ordered sequence of segments, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The empty path. It matches no shape and stands in for "no path".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Shape matching this path's depth, if it has one.
    pub fn shape(&self) -> Option<PathShape> {
        PathShape::from_depth(self.len())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl<const N: usize> From<[u32; N]> for Path {
    fn from(ids: [u32; N]) -> Self {
        Self::new(ids.into_iter().map(Segment::Id).collect())
    }
}

impl From<&[u32]> for Path {
    fn from(ids: &[u32]) -> Self {
        Self::new(ids.iter().copied().map(Segment::Id).collect())
    }
}

impl From<Vec<u32>> for Path {
    fn from(ids: Vec<u32>) -> Self {
        Self::new(ids.into_iter().map(Segment::Id).collect())
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl<T: Into<Path>> From<Option<T>> for Path {
    fn from(path: Option<T>) -> Self {
        path.map(Into::into).unwrap_or_default()
    }
}

/// Parses `"/3/0/1"` (leading slash optional).
impl FromStr for Path {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }
        let mut segments = Vec::new();
        for part in trimmed.split('/') {
            let id = part
                .parse::<u32>()
                .map_err(|_| IpcError::InvalidArgument(format!("Invalid path segment '{}'", part)))?;
            segments.push(Segment::Id(id));
        }
        Ok(Self::new(segments))
    }
}

/// Addressing granularity of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathShape {
    /// Object
    O,
    /// Object / ObjectInstance
    OI,
    /// Object / ObjectInstance / Resource
    OIR,
    /// Object / ObjectInstance / Resource / ResourceInstance
    OIRi,
}

impl PathShape {
    pub const ALL: &'static [PathShape] = &[Self::O, Self::OI, Self::OIR, Self::OIRi];

    /// Path length this shape requires.
    pub const fn depth(self) -> usize {
        match self {
            Self::O => 1,
            Self::OI => 2,
            Self::OIR => 3,
            Self::OIRi => 4,
        }
    }

    pub fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(Self::O),
            2 => Some(Self::OI),
            3 => Some(Self::OIR),
            4 => Some(Self::OIRi),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::O => "O",
            Self::OI => "OI",
            Self::OIR => "OIR",
            Self::OIRi => "OIRi",
        }
    }
}

impl fmt::Display for PathShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathShape {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "O" => Ok(Self::O),
            "OI" => Ok(Self::OI),
            "OIR" => Ok(Self::OIR),
            "OIRi" => Ok(Self::OIRi),
            other => Err(IpcError::InvalidArgument(format!(
                "Invalid path spec: {}",
                other
            ))),
        }
    }
}

/// True if the path's length matches one of the allowed shapes.
pub fn supports(path: &Path, allowed: &[PathShape]) -> bool {
    allowed.iter().any(|shape| shape.depth() == path.len())
}

/// [`supports`], as a `Result` carrying [`IpcError::InvalidPath`].
pub fn validate(path: &Path, allowed: &[PathShape]) -> Result<()> {
    if supports(path, allowed) {
        Ok(())
    } else {
        tracing::debug!(path = %path, "path rejected by shape table");
        Err(IpcError::InvalidPath)
    }
}
