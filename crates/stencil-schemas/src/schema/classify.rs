//! Value classification
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::schema::pointer::Pointer;
use serde_json::Value;
use std::fmt;

/// Kind a payload value can be classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    String,
    Number,
    Integer,
    Boolean,
    Array,
    /// Array whose elements are all numbers or strings
    Binary,
    Object,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Integer => "integer",
            Kind::Boolean => "boolean",
            Kind::Array => "array",
            Kind::Binary => "binary",
            Kind::Object => "object",
        }
    }

    /// Parse a `type` keyword name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Kind::Null),
            "string" => Some(Kind::String),
            "number" => Some(Kind::Number),
            "integer" => Some(Kind::Integer),
            "boolean" => Some(Kind::Boolean),
            "array" => Some(Kind::Array),
            "binary" => Some(Kind::Binary),
            "object" => Some(Kind::Object),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-set, size and property list of a located value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Empty for an absent value
    pub kinds: Vec<Kind>,
    /// Character count, element count or key count
    pub size: usize,
    /// Own property names, objects only
    pub properties: Vec<String>,
}

impl Classification {
    pub fn of(value: Option<&Value>) -> Self {
        let mut classification = Self::default();
        let Some(value) = value else {
            return classification;
        };

        match value {
            Value::Null => classification.kinds.push(Kind::Null),
            Value::String(text) => {
                classification.kinds.push(Kind::String);
                classification.size = text.chars().count();
            }
            Value::Number(number) => {
                classification.kinds.push(Kind::Number);
                classification.size = 1;
                if is_integral(number) {
                    classification.kinds.push(Kind::Integer);
                }
            }
            Value::Bool(_) => {
                classification.kinds.push(Kind::Boolean);
                classification.size = 1;
            }
            Value::Array(items) => {
                classification.kinds.push(Kind::Array);
                classification.size = items.len();
                if items.iter().all(|item| item.is_number() || item.is_string()) {
                    classification.kinds.push(Kind::Binary);
                }
            }
            Value::Object(map) => {
                classification.kinds.push(Kind::Object);
                classification.size = map.len();
                classification.properties = map.keys().cloned().collect();
            }
        }

        classification
    }

    pub fn has(&self, kind: Kind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn is_absent(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Kinds rendered as `'number','integer'` for error messages
    pub fn describe_kinds(&self) -> String {
        self.kinds
            .iter()
            .map(|kind| format!("'{}'", kind))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn is_integral(number: &serde_json::Number) -> bool {
    if number.is_i64() || number.is_u64() {
        return true;
    }
    number.as_f64().map(|n| n.fract() == 0.0).unwrap_or(false)
}

/// A value located by [`resolve`] together with its classification
#[derive(Debug, Clone)]
pub struct Resolved<'v> {
    pub classification: Classification,
    pub value: Option<&'v Value>,
}

/// Locate the value at `path` under `root` and classify it
pub fn resolve<'v>(path: &Pointer, root: &'v Value) -> Resolved<'v> {
    let value = path.locate(root);
    Resolved {
        classification: Classification::of(value),
        value,
    }
}
