//! Typed schema tree
//!
//! A resolved raw schema (`serde_json::Value`) is compiled once into a
//! [`Schema`] so the evaluator dispatches on variants instead of probing
//! keywords on every call. Compilation is lenient: keyword values of the
//! wrong shape are dropped with a warning, mirroring how an unknown keyword
//! is ignored.
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

pub mod classify;
pub mod pointer;

pub use classify::{resolve, Classification, Kind, Resolved};
pub use pointer::{descend, Pointer, Segment};

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Keyword view over one raw node (or the shallow union of several)
type Keywords<'a> = BTreeMap<&'a str, &'a Value>;

/// Compiled schema node
#[derive(Debug, Clone)]
pub enum Schema {
    /// `true` passes any present value, `false` rejects it
    Bool(bool),
    /// `$ref` left unresolved
    Reference(String),
    /// `$merge` left unresolved
    Merge,
    Node(Box<SchemaNode>),
}

/// Members of an `enum` keyword
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValues {
    List(Vec<Value>),
    /// `enum` was not a list; reported when evaluated
    Malformed,
}

/// A `pattern` keyword; `regex` is `None` when the source does not compile
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    pub regex: Option<Regex>,
}

impl Pattern {
    fn new(source: &str) -> Self {
        let regex = match Regex::new(source) {
            Ok(regex) => Some(regex),
            Err(e) => {
                log::warn!("pattern '{}' does not compile, it will never match: {}", source, e);
                None
            }
        };
        Self {
            source: source.to_string(),
            regex,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().map(|regex| regex.is_match(text)).unwrap_or(false)
    }
}

/// Keyword families of one schema node
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    /// Declared `type` names, empty when undeclared
    pub types: Vec<String>,

    pub not: Option<Schema>,
    pub one_of: Option<Vec<Schema>>,
    pub any_of: Option<Vec<Schema>>,
    /// `allOf` branches pre-merged into one synthetic node
    pub all_of: Option<Schema>,

    pub items: Option<Schema>,

    pub properties: Option<Vec<(String, Schema)>>,
    pub additional_properties: Option<Schema>,
    pub unevaluated_properties: Option<Schema>,
    pub required: Option<Vec<String>>,
    pub min_properties: Option<f64>,
    pub max_properties: Option<f64>,

    pub constant: Option<Value>,
    pub enumeration: Option<EnumValues>,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub pattern: Option<Pattern>,

    pub default: Option<Value>,
    pub error_message: Option<String>,
}

impl SchemaNode {
    pub fn has_type(&self) -> bool {
        !self.types.is_empty()
    }

    /// Whether `type` names `kind`
    pub fn declares(&self, kind: Kind) -> bool {
        self.types.iter().any(|name| name == kind.as_str())
    }

    /// Whether any declared type is among the value's kinds
    pub fn type_matches(&self, classification: &Classification) -> bool {
        self.types
            .iter()
            .filter_map(|name| Kind::from_name(name))
            .any(|kind| classification.has(kind))
    }

    pub fn describe_types(&self) -> String {
        self.types.join("|")
    }
}

impl Schema {
    /// Compile a raw schema tree
    pub fn compile(raw: &Value) -> Schema {
        compile_value(raw, None)
    }

    pub fn node(&self) -> Option<&SchemaNode> {
        match self {
            Schema::Node(node) => Some(node),
            _ => None,
        }
    }
}

/// `oneOf`/`anyOf` branches inherit the parent's `type` unless they declare their own.
fn compile_value<'a>(raw: &'a Value, inherited_type: Option<&'a Value>) -> Schema {
    match (raw, inherited_type) {
        (Value::Object(map), _) => {
            let mut keywords: Keywords<'a> =
                map.iter().map(|(key, value)| (key.as_str(), value)).collect();
            if let Some(kind) = inherited_type {
                keywords.entry("type").or_insert(kind);
            }
            compile_keywords(&keywords)
        }
        (Value::Bool(flag), None) => Schema::Bool(*flag),
        (_, Some(kind)) => {
            let mut keywords = Keywords::new();
            keywords.insert("type", kind);
            compile_keywords(&keywords)
        }
        (other, None) => {
            log::warn!("ignoring non-object schema node: {}", other);
            Schema::Node(Box::default())
        }
    }
}

fn compile_keywords(keywords: &Keywords<'_>) -> Schema {
    if let Some(reference) = keywords.get("$ref").and_then(|value| value.as_str()) {
        return Schema::Reference(reference.to_string());
    }
    if keywords.contains_key("$merge") {
        return Schema::Merge;
    }

    let declared_type = keywords.get("type").copied();
    let node = SchemaNode {
        types: type_names(declared_type),
        not: keywords.get("not").map(|raw| compile_value(raw, None)),
        one_of: branches(keywords, "oneOf", declared_type),
        any_of: branches(keywords, "anyOf", declared_type),
        all_of: keywords
            .get("allOf")
            .and_then(|raw| merge_all_of(raw, declared_type)),
        items: keywords.get("items").map(|raw| compile_value(raw, None)),
        properties: properties(keywords),
        additional_properties: keywords
            .get("additionalProperties")
            .map(|raw| compile_value(raw, None)),
        unevaluated_properties: keywords
            .get("unevaluatedProperties")
            .map(|raw| compile_value(raw, None)),
        required: required(keywords),
        min_properties: number(keywords, "minProperties"),
        max_properties: number(keywords, "maxProperties"),
        constant: keywords.get("const").map(|value| (*value).clone()),
        enumeration: keywords.get("enum").map(|value| match value {
            Value::Array(members) => EnumValues::List(members.clone()),
            _ => EnumValues::Malformed,
        }),
        min_length: number(keywords, "minLength"),
        max_length: number(keywords, "maxLength"),
        minimum: number(keywords, "minimum"),
        maximum: number(keywords, "maximum"),
        exclusive_minimum: number(keywords, "exclusiveMinimum"),
        exclusive_maximum: number(keywords, "exclusiveMaximum"),
        multiple_of: number(keywords, "multipleOf"),
        pattern: keywords.get("pattern").and_then(|value| match value.as_str() {
            Some(source) => Some(Pattern::new(source)),
            None => {
                log::warn!("ignoring non-string pattern: {}", value);
                None
            }
        }),
        default: keywords.get("default").map(|value| (*value).clone()),
        error_message: keywords
            .get("errorMessage")
            .and_then(|value| value.as_str())
            .map(str::to_string),
    };

    Schema::Node(Box::new(node))
}

fn type_names(declared: Option<&Value>) -> Vec<String> {
    match declared {
        None => Vec::new(),
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect(),
        Some(other) => {
            log::warn!("ignoring malformed type keyword: {}", other);
            Vec::new()
        }
    }
}

fn branches<'a>(
    keywords: &Keywords<'a>,
    keyword: &str,
    declared_type: Option<&'a Value>,
) -> Option<Vec<Schema>> {
    match keywords.get(keyword)? {
        Value::Array(candidates) => Some(
            candidates
                .iter()
                .map(|candidate| compile_value(candidate, declared_type))
                .collect(),
        ),
        other => {
            log::warn!("ignoring {} that is not a list: {}", keyword, other);
            None
        }
    }
}

/// Shallow union of every `allOf` candidate; later keys override earlier ones.
fn merge_all_of<'a>(raw: &'a Value, declared_type: Option<&'a Value>) -> Option<Schema> {
    let Value::Array(candidates) = raw else {
        log::warn!("ignoring allOf that is not a list: {}", raw);
        return None;
    };

    let mut merged = Keywords::new();
    if let Some(kind) = declared_type {
        merged.insert("type", kind);
    }
    for candidate in candidates {
        if let Value::Object(map) = candidate {
            merged.extend(map.iter().map(|(key, value)| (key.as_str(), value)));
        }
    }
    Some(compile_keywords(&merged))
}

fn properties(keywords: &Keywords<'_>) -> Option<Vec<(String, Schema)>> {
    match keywords.get("properties")? {
        Value::Object(map) => Some(
            map.iter()
                .map(|(name, raw)| (name.clone(), compile_value(raw, None)))
                .collect(),
        ),
        other => {
            log::warn!("ignoring properties that is not an object: {}", other);
            None
        }
    }
}

fn required(keywords: &Keywords<'_>) -> Option<Vec<String>> {
    match keywords.get("required")? {
        Value::Array(names) => Some(
            names
                .iter()
                .filter_map(|name| name.as_str().map(str::to_string))
                .collect(),
        ),
        other => {
            log::warn!("ignoring required that is not a list: {}", other);
            None
        }
    }
}

fn number(keywords: &Keywords<'_>, keyword: &str) -> Option<f64> {
    let value = keywords.get(keyword)?;
    let parsed = value.as_f64();
    if parsed.is_none() {
        log::warn!("ignoring non-numeric {}: {}", keyword, value);
    }
    parsed
}

/// Deepest container nesting of `value`, measured without recursion
pub fn nesting_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(value, 1usize)];
    while let Some((current, depth)) = pending.pop() {
        deepest = deepest.max(depth);
        match current {
            Value::Object(map) => pending.extend(map.values().map(|child| (child, depth + 1))),
            Value::Array(items) => pending.extend(items.iter().map(|child| (child, depth + 1))),
            _ => {}
        }
    }
    deepest
}
