//! Attribute paths into JSON documents.
//!
//! A path is written in dotted form (`metadata.tags.0`). Segments made only of decimal digits are array
//! indices, everything else is an object key. There is no escaping, so a key containing `.` cannot be
//! expressed in dotted form; use [`AttributePath::from_segments`] for such keys.

use crate::error::FilterError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    fn parse(segment: &str) -> Self {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            // digit strings too large for usize stay keys
            if let Ok(index) = segment.parse::<usize>() {
                return PathSegment::Index(index);
            }
        }
        PathSegment::Key(segment.to_owned())
    }

    /// Follow this segment one level down, the way PostgreSQL's `#>` does.
    pub fn step<'a>(&self, value: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        match (self, value) {
            (PathSegment::Key(key), serde_json::Value::Object(map)) => map.get(key),
            (PathSegment::Key(key), serde_json::Value::Array(items)) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            (PathSegment::Index(index), serde_json::Value::Array(items)) => items.get(*index),
            (PathSegment::Index(index), serde_json::Value::Object(map)) => map.get(&index.to_string()),
            _ => None,
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self { PathSegment::Key(key.to_owned()) }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self { PathSegment::Index(index) }
}

/// Ordered sequence of segments addressing a value inside a JSON column. The empty path is the whole column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributePath(Vec<PathSegment>);

impl AttributePath {
    pub fn root() -> Self { Self(Vec::new()) }

    /// Split a dotted path. Never fails: the empty string is the root path.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        Self(path.split(SEPARATOR).map(PathSegment::parse).collect())
    }

    /// Build a path from already structured segments. Strings are taken verbatim as keys (never re-split),
    /// non-negative integers become indices.
    pub fn from_segments(segments: &[serde_json::Value]) -> Result<Self, FilterError> {
        segments
            .iter()
            .map(|segment| match segment {
                serde_json::Value::String(key) => Ok(PathSegment::Key(key.clone())),
                serde_json::Value::Number(n) => n
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .map(PathSegment::Index)
                    .ok_or_else(|| FilterError::MalformedPath(format!("{} is not a valid array index", n))),
                other => Err(FilterError::MalformedPath(format!("{} is neither a key nor an index", other))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn segments(&self) -> &[PathSegment] { &self.0 }

    pub fn is_root(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn push(&mut self, segment: impl Into<PathSegment>) { self.0.push(segment.into()); }

    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut child = self.clone();
        child.push(segment);
        child
    }

    /// The path as a PostgreSQL `text[]`, suitable for `#>` and `#>>`.
    pub fn to_text_array(&self) -> Vec<String> { self.0.iter().map(|s| s.to_string()).collect() }

    /// Locate the value at this path. `None` means the path does not exist, which is distinct from a stored `null`.
    pub fn navigate<'a>(&self, value: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        self.0.iter().try_fold(value, |current, segment| segment.step(current))
    }
}

impl Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for AttributePath {
    fn from(path: &str) -> Self { Self::parse(path) }
}

impl From<Vec<PathSegment>> for AttributePath {
    fn from(segments: Vec<PathSegment>) -> Self { Self(segments) }
}

impl FromIterator<PathSegment> for AttributePath {
    fn from_iter<T: IntoIterator<Item = PathSegment>>(iter: T) -> Self { Self(iter.into_iter().collect()) }
}

/// Walk a JSON tree and yield every scalar leaf with the path that reaches it.
///
/// Object entries are visited in key order so the output is identical across runs and hosts regardless of how
/// the map was built. Empty objects and arrays contribute nothing. A scalar root yields a single pair with the
/// root path.
pub fn flatten(value: &serde_json::Value) -> Flatten<'_> { Flatten { stack: vec![(AttributePath::root(), value)] } }

#[derive(Debug, Clone)]
pub struct Flatten<'a> {
    stack: Vec<(AttributePath, &'a serde_json::Value)>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = (AttributePath, &'a serde_json::Value);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, value)) = self.stack.pop() {
            match value {
                serde_json::Value::Object(map) => {
                    let mut keys: Vec<&String> = map.keys().collect();
                    keys.sort();
                    // reversed so the smallest key is popped first
                    for key in keys.into_iter().rev() {
                        self.stack.push((path.child(PathSegment::Key(key.clone())), &map[key]));
                    }
                }
                serde_json::Value::Array(items) => {
                    for (index, item) in items.iter().enumerate().rev() {
                        self.stack.push((path.child(index), item));
                    }
                }
                scalar => return Some((path, scalar)),
            }
        }
        None
    }
}
