//! Definition registry: retrieval identifier to raw sub-schema
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::schema::Pointer;
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// Reserved registry key for `$defs` hoisted off the primary schema
pub const DEFS_KEY: &str = "$defs";

/// Split a `$ref` into its retrieval identifier and the pointer inside that definition.
///
/// `customer#/address/street` yields `("customer", /address/street)`; a reference
/// without a fragment addresses the whole definition.
pub fn parse_ref(reference: &str) -> LoaderResult<(String, Pointer)> {
    let (id, fragment) = reference.split_once('#').unwrap_or((reference, ""));
    if id.is_empty() {
        return Err(LoaderError::reference_error(
            reference,
            "reference has no retrieval identifier before '#'",
        ));
    }
    Ok((id.to_string(), Pointer::parse(fragment)))
}

/// Registered sub-schemas, keyed by retrieval identifier
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    entries: HashMap<String, Value>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the retrieval identifier from a `$id` URI: its final path segment.
    ///
    /// `http://example.com/schemas/customer` yields `customer`.
    pub fn retrieval_id(id: &str) -> LoaderResult<String> {
        let url = Url::parse(id).map_err(|e| LoaderError::InvalidId {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        let last = url.path().rsplit('/').next().unwrap_or_default();
        if last.is_empty() {
            return Err(LoaderError::InvalidId {
                id: id.to_string(),
                reason: "URI path has no final segment".to_string(),
            });
        }
        Ok(last.to_string())
    }

    /// Register a sub-schema under the retrieval identifier derived from its `$id`
    pub fn register(&mut self, sub_schema: Value) -> LoaderResult<String> {
        let id = match sub_schema.get("$id") {
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(LoaderError::InvalidId {
                    id: other.to_string(),
                    reason: "$id must be a string".to_string(),
                })
            }
            None => {
                let keys = sub_schema
                    .as_object()
                    .map(|map| map.keys().cloned().collect::<Vec<_>>().join(", "))
                    .unwrap_or_default();
                return Err(LoaderError::MissingId { keys });
            }
        };

        let retrieval_id = Self::retrieval_id(&id)?;
        if self.entries.contains_key(&retrieval_id) {
            return Err(LoaderError::DuplicateId { id, retrieval_id });
        }

        log::debug!("registered sub-schema '{}' as '{}'", id, retrieval_id);
        self.entries.insert(retrieval_id.clone(), sub_schema);
        Ok(retrieval_id)
    }

    /// Move `$defs` off `schema` into the registry; returns whether there were any
    pub fn hoist_defs(&mut self, schema: &mut Value) -> bool {
        let Some(defs) = schema.as_object_mut().and_then(|map| map.remove(DEFS_KEY)) else {
            return false;
        };
        log::debug!("hoisted $defs into the definition registry");
        self.entries.insert(DEFS_KEY.to_string(), defs);
        true
    }

    /// Find the fragment a `$ref` points at
    pub fn lookup(&self, reference: &str) -> LoaderResult<&Value> {
        let (id, pointer) = parse_ref(reference)?;
        let definition = self.entries.get(&id).ok_or_else(|| {
            LoaderError::reference_error(reference, format!("unknown definition '{}'", id))
        })?;
        pointer.locate(definition).ok_or_else(|| {
            LoaderError::reference_error(
                reference,
                format!("definition '{}' has nothing at '{}'", id, pointer),
            )
        })
    }

    pub fn get(&self, retrieval_id: &str) -> Option<&Value> {
        self.entries.get(retrieval_id)
    }

    pub fn contains(&self, retrieval_id: &str) -> bool {
        self.entries.contains_key(retrieval_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
