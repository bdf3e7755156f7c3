//! `$ref` and `$merge` resolution
//!
//! This module handles:
//! - `$ref` substitution from the definition registry, expanding the
//!   substituted content before moving on
//! - `$merge` deep merging, spliced into the root or replacing nested nodes
//! - Cycle detection over the chain of references being expanded
//! - Fixed-point passes, capped as a backstop against runaway rewrites
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::registry::{parse_ref, DefinitionRegistry};
use serde_json::Value;

/// Default limit on rewrite passes before a schema is declared circular
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Rewrites a raw schema tree until no `$ref`/`$merge` directives remain
#[derive(Debug)]
pub struct ReferenceResolver<'r> {
    registry: &'r DefinitionRegistry,
    max_passes: usize,
}

impl<'r> ReferenceResolver<'r> {
    pub fn new(registry: &'r DefinitionRegistry) -> Self {
        Self {
            registry,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Resolve `schema` in place; returns the number of passes it took.
    ///
    /// A `$merge` at the root is spliced into the root object, everywhere else
    /// the directive node is replaced by its result.
    pub fn resolve(&self, schema: &mut Value) -> LoaderResult<usize> {
        let mut chain = Vec::new();
        let passes = self.settle(schema, true, &mut chain)?;
        log::debug!("schema resolved after {} pass(es)", passes);
        Ok(passes)
    }

    fn settle(&self, value: &mut Value, at_root: bool, chain: &mut Vec<String>) -> LoaderResult<usize> {
        for pass in 1..=self.max_passes {
            let substitutions = if at_root {
                self.rewrite_root(value, chain)?
            } else {
                self.rewrite(value, chain)?
            };
            if substitutions == 0 {
                return Ok(pass);
            }
            log::trace!("resolution pass {} made {} substitution(s)", pass, substitutions);
        }
        Err(LoaderError::CircularReference {
            passes: self.max_passes,
        })
    }

    fn rewrite_root(&self, schema: &mut Value, chain: &mut Vec<String>) -> LoaderResult<usize> {
        let Some(root) = schema.as_object_mut() else {
            return self.rewrite(schema, chain);
        };
        let Some(directive) = root.remove("$merge") else {
            return self.rewrite(schema, chain);
        };

        match self.merge(directive, chain)? {
            Value::Object(merged) => {
                root.extend(merged);
                Ok(1)
            }
            other => Err(LoaderError::invalid_merge(format!(
                "a $merge at the schema root must produce an object, got {}",
                other
            ))),
        }
    }

    /// One depth-first pass. Substituted `$ref` content is expanded right away
    /// with the reference pushed on `chain`, so a definition that leads back
    /// to itself is caught no matter how long the chain is.
    fn rewrite(&self, node: &mut Value, chain: &mut Vec<String>) -> LoaderResult<usize> {
        if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
            let reference = reference.to_string();
            *node = self.expand(&reference, chain)?;
            return Ok(1);
        }
        if let Some(directive) = node.as_object_mut().and_then(|map| map.remove("$merge")) {
            *node = self.merge(directive, chain)?;
            return Ok(1);
        }

        let mut substitutions = 0;
        match node {
            Value::Object(map) => {
                for child in map.values_mut() {
                    substitutions += self.rewrite(child, chain)?;
                }
            }
            Value::Array(items) => {
                for child in items.iter_mut() {
                    substitutions += self.rewrite(child, chain)?;
                }
            }
            _ => {}
        }
        Ok(substitutions)
    }

    /// The fully resolved content `reference` points at
    fn expand(&self, reference: &str, chain: &mut Vec<String>) -> LoaderResult<Value> {
        let (id, pointer) = parse_ref(reference)?;
        let key = format!("{}#{}", id, pointer);
        if let Some(start) = chain.iter().position(|seen| *seen == key) {
            let mut cycle = chain[start..].to_vec();
            cycle.push(key);
            return Err(LoaderError::ReferenceCycle {
                chain: cycle.join(" -> "),
            });
        }

        let mut target = self.registry.lookup(reference)?.clone();
        chain.push(key);
        let settled = self.settle(&mut target, false, chain);
        chain.pop();
        settled?;
        Ok(target)
    }

    /// Both operands are resolved before merging so a `$ref` operand is not
    /// mistaken for a plain object.
    fn merge(&self, directive: Value, chain: &mut Vec<String>) -> LoaderResult<Value> {
        let Value::Object(mut operands) = directive else {
            return Err(LoaderError::invalid_merge(format!(
                "expected {{\"source\", \"with\"}}, got {}",
                directive
            )));
        };

        let mut source = operands
            .remove("source")
            .ok_or_else(|| LoaderError::invalid_merge("missing 'source'"))?;
        let mut with = operands
            .remove("with")
            .ok_or_else(|| LoaderError::invalid_merge("missing 'with'"))?;

        self.settle(&mut source, false, chain)?;
        self.settle(&mut with, false, chain)?;
        Ok(deep_merge(source, with))
    }
}

/// Deep merge: arrays concatenate, objects union key-wise, anything else
/// takes the right-hand side.
pub fn deep_merge(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Array(mut left), Value::Array(right)) => {
            left.extend(right);
            Value::Array(left)
        }
        (Value::Object(mut left), Value::Object(right)) => {
            for (key, right_value) in right {
                let merged = match left.remove(&key) {
                    Some(left_value) => deep_merge(left_value, right_value),
                    None => right_value,
                };
                left.insert(key, merged);
            }
            Value::Object(left)
        }
        (_, right) => right,
    }
}
