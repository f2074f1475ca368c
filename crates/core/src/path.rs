//! Oid paths
//!
//! A path addresses a node in a device's parameter tree using a
//! JSON-pointer-like syntax:
//!
//! - `/name`: a param, struct field or variant alternative
//!   (`[A-Za-z_]` followed by word characters)
//! - `/3`: an array element
//! - `/-`: one past the end of an array, used to append
//!
//! Inside names `~1` decodes to `/` and `~0` decodes to `~`.
//!
//! A path is consumed front to back while descending the tree. Consumed
//! segments are kept so that the walk can be rewound and the fully
//! qualified oid of the current node reconstructed.
//!
//! # Examples
//!
//! ```
//! use catena_core::path::{Index, Path};
//!
//! let mut path: Path = "/audio/channels/2/gain".parse().unwrap();
//! assert_eq!(path.front_as_name(), Some("audio"));
//! path.pop();
//! path.pop();
//! assert_eq!(path.front_as_index(), Some(Index::At(2)));
//! assert_eq!(path.walked(), 2);
//! ```

use crate::error::Error;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Position within an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    /// A concrete element position
    At(usize),
    /// One past the last element (the `-` segment)
    End,
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::At(i) => write!(f, "{}", i),
            Index::End => f.write_str("-"),
        }
    }
}

/// A single path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named member: param oid, struct field, variant alternative
    Name(String),
    /// Array position
    Index(Index),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => write!(f, "/{}", escape(name)),
            Segment::Index(idx) => write!(f, "/{}", idx),
        }
    }
}

/// Errors from parsing a path string
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Path does not start with a solidus
    #[error("path must start with '/' but found '{0}'")]
    MissingSolidus(char),
    /// Two solidi with nothing in between, or a trailing solidus
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
    /// Segment is neither a name, an index, nor '-'
    #[error("invalid segment '{segment}' at position {position}")]
    InvalidSegment {
        /// Raw segment text
        segment: String,
        /// Byte offset of the segment
        position: usize,
    },
    /// Index does not fit in usize
    #[error("index '{0}' is too large")]
    IndexOverflow(String),
}

impl From<PathParseError> for Error {
    fn from(e: PathParseError) -> Self {
        Error::invalid_argument(e.to_string())
    }
}

/// A parsed oid path with a movable front cursor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: SmallVec<[Segment; 4]>,
    front: usize,
}

impl Path {
    /// The empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path from already decoded segments
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Path {
            segments: segments.into_iter().collect(),
            front: 0,
        }
    }

    /// Parse a path, mapping failures to `InvalidArgument`
    pub fn parse_str(s: &str) -> crate::Result<Self> {
        s.parse::<Path>().map_err(Error::from)
    }

    /// Segments not yet walked
    pub fn len(&self) -> usize {
        self.segments.len() - self.front
    }

    /// True when every segment has been walked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of segments, walked or not
    pub fn total_len(&self) -> usize {
        self.segments.len()
    }

    /// Number of segments walked so far
    pub fn walked(&self) -> usize {
        self.front
    }

    /// Current front segment
    pub fn front(&self) -> Option<&Segment> {
        self.segments.get(self.front)
    }

    /// True if the front segment is a name
    pub fn front_is_name(&self) -> bool {
        matches!(self.front(), Some(Segment::Name(_)))
    }

    /// True if the front segment is an index (including `-`)
    pub fn front_is_index(&self) -> bool {
        matches!(self.front(), Some(Segment::Index(_)))
    }

    /// Front segment as a name
    pub fn front_as_name(&self) -> Option<&str> {
        match self.front() {
            Some(Segment::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Front segment as an index
    pub fn front_as_index(&self) -> Option<Index> {
        match self.front() {
            Some(Segment::Index(idx)) => Some(*idx),
            _ => None,
        }
    }

    /// Advance past the front segment. No-op on an empty path.
    pub fn pop(&mut self) {
        if self.front < self.segments.len() {
            self.front += 1;
        }
    }

    /// Step the front cursor back by one segment
    pub fn unpop(&mut self) {
        if self.front > 0 {
            self.front -= 1;
        }
    }

    /// Move the front cursor back to the first segment
    pub fn rewind(&mut self) {
        self.front = 0;
    }

    /// Last segment
    pub fn back(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// True if the last segment is a name
    pub fn back_is_name(&self) -> bool {
        matches!(self.back(), Some(Segment::Name(_)))
    }

    /// True if the last segment is an index (including `-`)
    pub fn back_is_index(&self) -> bool {
        matches!(self.back(), Some(Segment::Index(_)))
    }

    /// Last segment as an index
    pub fn back_as_index(&self) -> Option<Index> {
        match self.back() {
            Some(Segment::Index(idx)) => Some(*idx),
            _ => None,
        }
    }

    /// Last segment as a name
    pub fn back_as_name(&self) -> Option<&str> {
        match self.back() {
            Some(Segment::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Remove and return the last segment
    pub fn pop_back(&mut self) -> Option<Segment> {
        let seg = self.segments.pop();
        if self.front > self.segments.len() {
            self.front = self.segments.len();
        }
        seg
    }

    /// Append a segment
    pub fn push_back(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Fully qualified oid of every segment, walked or not
    pub fn fqoid(&self) -> String {
        self.segments.iter().map(|s| s.to_string()).collect()
    }

    /// Oid formed by the segments not yet walked
    pub fn remaining(&self) -> String {
        self.segments[self.front..]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Oid formed by the segments walked since `mark` (a previous `walked()`)
    pub fn walked_since(&self, mark: usize) -> String {
        let start = mark.min(self.front);
        self.segments[start..self.front]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Oid formed by the segments already walked
    pub fn walked_oid(&self) -> String {
        self.segments[..self.front]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = SmallVec::new();
        if s.is_empty() {
            return Ok(Path { segments, front: 0 });
        }
        let Some(rest) = s.strip_prefix('/') else {
            let c = s.chars().next().unwrap_or_default();
            return Err(PathParseError::MissingSolidus(c));
        };

        let mut position = 1;
        for raw in rest.split('/') {
            segments.push(parse_segment(raw, position)?);
            position += raw.len() + 1;
        }
        Ok(Path { segments, front: 0 })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

fn parse_segment(raw: &str, position: usize) -> Result<Segment, PathParseError> {
    let invalid = || PathParseError::InvalidSegment {
        segment: raw.to_string(),
        position,
    };

    if raw.is_empty() {
        return Err(PathParseError::EmptySegment(position));
    }
    if raw == "-" {
        return Ok(Segment::Index(Index::End));
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<usize>()
            .map(|i| Segment::Index(Index::At(i)))
            .map_err(|_| PathParseError::IndexOverflow(raw.to_string()));
    }

    let first = raw.as_bytes()[0];
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return Err(invalid());
    }
    let name = unescape(raw).ok_or_else(invalid)?;
    Ok(Segment::Name(name))
}

/// Decode `~0` and `~1`, rejecting any other character outside `\w`
fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '~' => match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            },
            c if c.is_ascii_alphanumeric() || c == '_' => out.push(c),
            _ => return None,
        }
    }
    Some(out)
}

fn escape(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}
