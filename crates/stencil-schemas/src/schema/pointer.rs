//! Payload paths and their pointer rendering
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// One hop of a [`Pointer`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object property name
    Key(String),
    /// Array position
    Index(usize),
}

impl Segment {
    /// Step from `value` into the child this segment addresses
    pub fn step<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match (self, value) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Key(key), Value::Array(items)) => {
                key.parse::<usize>().ok().and_then(|index| items.get(index))
            }
            (Segment::Index(index), Value::Array(items)) => items.get(*index),
            (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
            _ => None,
        }
    }

    /// Mutable counterpart of [`Segment::step`]; hands `value` back when the
    /// child does not exist
    pub fn step_mut<'v>(&self, value: &'v mut Value) -> Result<&'v mut Value, &'v mut Value> {
        let key = self.key();
        let array_hit = match (self.array_index(), &*value) {
            (Some(index), Value::Array(items)) if index < items.len() => Some(index),
            _ => None,
        };
        let object_hit = matches!(&*value, Value::Object(map) if map.contains_key(&*key));
        if let Some(index) = array_hit {
            if let Value::Array(items) = value {
                return Ok(&mut items[index]);
            }
            unreachable!("array_hit implies an array value");
        }
        if object_hit {
            if let Value::Object(map) = value {
                return Ok(&mut map[&*key]);
            }
            unreachable!("object_hit implies an object value");
        }
        Err(value)
    }

    /// Property name this segment addresses in an object
    pub fn to_key(&self) -> String {
        self.key().into_owned()
    }

    fn key(&self) -> Cow<'_, str> {
        match self {
            Segment::Key(key) => Cow::Borrowed(key),
            Segment::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    fn array_index(&self) -> Option<usize> {
        match self {
            Segment::Key(key) => key.parse().ok(),
            Segment::Index(index) => Some(*index),
        }
    }
}

/// Follow `hops` from `value` as far as they exist.
///
/// Returns the deepest value reached and the number of hops taken.
pub fn descend<'v>(mut current: &'v mut Value, hops: &[&Segment]) -> (&'v mut Value, usize) {
    for (taken, segment) in hops.iter().enumerate() {
        match segment.step_mut(current) {
            Ok(next) => current = next,
            Err(stuck) => return (stuck, taken),
        }
    }
    (current, hops.len())
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key.replace('~', "~0").replace('/', "~1")),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Ordered path from the payload (or schema) root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    segments: Vec<Segment>,
}

impl Pointer {
    /// The root path
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a pointer from a slash-delimited fragment such as `/contacts/email`.
    ///
    /// Empty segments are skipped and `~1`/`~0` escapes are decoded.
    pub fn parse(fragment: &str) -> Self {
        let segments = fragment
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| Segment::Key(segment.replace("~1", "/").replace("~0", "~")))
            .collect();
        Self { segments }
    }

    /// A new pointer one hop deeper
    pub fn join(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walk `root` hop by hop; any hop into an absent value yields `None`.
    pub fn locate<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| segment.step(current))
    }

    /// Render the pointer, `/` for the root
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl FromIterator<Segment> for Pointer {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
