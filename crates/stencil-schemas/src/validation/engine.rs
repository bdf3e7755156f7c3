//! Recursive schema evaluator
//!
//! Every call returns the number of payload locations the schema matched,
//! or the first failure. Keywords are evaluated in a fixed order:
//! `not`, `oneOf`, `anyOf`, `allOf`, then array, object or scalar checks,
//! and finally defaults for absent values.
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::schema::{Classification, EnumValues, Kind, Schema, SchemaNode};
use crate::validation::base::{BranchState, EvaluatedPaths, Mode, PathTable, Place, Scope};
use crate::validation::defaults::{self, PendingDefault};
use crate::validation::error::{ErrorKind, ValidationError, ValidationResult};
use crate::validation::report::Reporter;
use crate::validation::ValidatorOptions;
use serde_json::Value;

/// Matches and queued defaults gathered from a branch scan
#[derive(Debug, Default)]
struct BranchOutcome {
    matched: usize,
    defaults: Vec<PendingDefault>,
}

/// State of one `validate` call
#[derive(Debug)]
pub struct Evaluator {
    pub(super) apply_defaults: bool,
    pub(super) reporter: Reporter,
    pub(super) paths: PathTable,
}

impl Evaluator {
    pub fn new(options: &ValidatorOptions) -> Self {
        Self {
            apply_defaults: options.apply_defaults,
            reporter: Reporter::new(options),
            paths: PathTable::new(),
        }
    }

    /// Validate `payload` against `schema` from the root
    pub fn run(mut self, schema: &Schema, payload: &mut Value) -> ValidationResult<()> {
        let mut evaluated = EvaluatedPaths::new();
        let mut pending = Vec::new();
        let mut scope = Scope::new(Place::root(payload), Mode::default(), &mut evaluated, &mut pending);
        let matched = self.evaluate(schema, &mut scope)?;
        log::trace!("payload accepted with {} match(es)", matched);
        Ok(())
    }

    pub fn evaluate(&mut self, schema: &Schema, scope: &mut Scope<'_>) -> ValidationResult<usize> {
        let node = match schema {
            Schema::Node(node) => node,
            Schema::Bool(allowed) => return self.evaluate_literal(*allowed, scope),
            Schema::Reference(reference) => {
                return Err(ValidationError::new(
                    ErrorKind::Reference,
                    self.here(scope),
                    format!("Could not resolve '{}'", reference),
                ))
            }
            Schema::Merge => {
                let here = self.here(scope);
                return Err(ValidationError::new(
                    ErrorKind::Reference,
                    here.clone(),
                    format!("Unresolved $merge at '{}'", here),
                ));
            }
        };

        if let Some(inner) = &node.not {
            self.evaluate_not(node, inner, scope)?;
        }
        if let Some(branches) = &node.one_of {
            return self.evaluate_one_of(node, branches, scope);
        }
        if let Some(branches) = &node.any_of {
            return self.evaluate_any_of(node, branches, scope);
        }
        if let Some(merged) = &node.all_of {
            if !self.evaluate_all_of(merged, scope)? {
                return Ok(0);
            }
        }

        let classification = Classification::of(scope.place.get(&self.paths));

        let iterable = classification.is_absent()
            || (classification.has(Kind::Array)
                && !classification.has(Kind::Binary)
                && !classification.has(Kind::String));
        if node.declares(Kind::Array) && iterable {
            return self.evaluate_items(node, scope, classification.size);
        }

        if node.declares(Kind::Object) || node.properties.is_some() {
            if !classification.is_absent()
                && node.declares(Kind::Object)
                && !node.type_matches(&classification)
            {
                return Err(self.type_mismatch(node, scope, &classification));
            }
            let matched = self.evaluate_object(node, scope, &classification)?;
            return Ok(usize::from(matched));
        }

        if !classification.is_absent() {
            return self.evaluate_scalar(node, scope, &classification);
        }

        if self.apply_defaults {
            if let Some(value) = &node.default {
                defaults::offer(scope, &self.paths, value);
            }
        }
        Ok(0)
    }

    /// Rendered pointer of the scope's path
    pub(super) fn here(&self, scope: &Scope<'_>) -> String {
        self.paths.render(scope.path())
    }

    /// `true` and `false` schemas
    fn evaluate_literal(&mut self, allowed: bool, scope: &mut Scope<'_>) -> ValidationResult<usize> {
        if scope.place.get(&self.paths).is_none() {
            return Ok(0);
        }
        if !allowed {
            let here = self.here(scope);
            return Err(self.reporter.fail(
                ErrorKind::TypeMismatch,
                &here,
                scope.mode,
                None,
                format!("'{}' is not allowed by a false schema", here),
            ));
        }
        scope.carry_forward();
        Ok(1)
    }

    /// Any outcome of `inner` short of a failure fails the node, including a
    /// match on an absent value.
    fn evaluate_not(
        &mut self,
        node: &SchemaNode,
        inner: &Schema,
        scope: &mut Scope<'_>,
    ) -> ValidationResult<()> {
        let mut branch = BranchState::fork(&*scope.evaluated);
        let outcome = {
            let mut isolated = branch.scope(scope.place.reborrow(), Mode::branch());
            self.evaluate(inner, &mut isolated)
        };

        match outcome {
            Ok(_) => {
                let here = self.here(scope);
                Err(self.reporter.fail(
                    ErrorKind::Composition,
                    &here,
                    scope.mode,
                    node.error_message.as_deref(),
                    format!("not at '{}' not met", here),
                ))
            }
            Err(error) if error.is_fatal() => Err(error),
            Err(_) => Ok(()),
        }
    }

    fn evaluate_one_of(
        &mut self,
        node: &SchemaNode,
        branches: &[Schema],
        scope: &mut Scope<'_>,
    ) -> ValidationResult<usize> {
        let outcome = self.scan_branches(branches, scope, 2)?;
        log::trace!(
            "oneOf: {} of {} branch(es) matched",
            outcome.matched,
            branches.len()
        );

        if outcome.matched == 1 {
            defaults::commit(scope, &self.paths, outcome.defaults);
            return Ok(1);
        }
        if scope.is_root() {
            let here = self.here(scope);
            return Err(self.reporter.fail(
                ErrorKind::Composition,
                &here,
                scope.mode,
                node.error_message.as_deref(),
                format!("oneOf at '{}' not met, {} matches", here, outcome.matched),
            ));
        }
        Ok(0)
    }

    fn evaluate_any_of(
        &mut self,
        node: &SchemaNode,
        branches: &[Schema],
        scope: &mut Scope<'_>,
    ) -> ValidationResult<usize> {
        let outcome = self.scan_branches(branches, scope, 1)?;
        log::trace!(
            "anyOf: {} of {} branch(es) matched",
            outcome.matched,
            branches.len()
        );

        if outcome.matched > 0 {
            defaults::commit(scope, &self.paths, outcome.defaults);
            return Ok(1);
        }
        if scope.is_root() {
            let here = self.here(scope);
            return Err(self.reporter.fail(
                ErrorKind::Composition,
                &here,
                scope.mode,
                node.error_message.as_deref(),
                format!("anyOf at '{}' not met", here),
            ));
        }
        Ok(0)
    }

    /// Evaluate candidates in isolated scopes until `enough` of them matched.
    ///
    /// Failures are absorbed into the trail unless they are fatal. The queued
    /// defaults of every matching candidate are returned; callers only commit
    /// them when the scan produced an accepted outcome.
    fn scan_branches(
        &mut self,
        branches: &[Schema],
        scope: &mut Scope<'_>,
        enough: usize,
    ) -> ValidationResult<BranchOutcome> {
        let mut outcome = BranchOutcome::default();
        for branch in branches {
            let mut state = BranchState::fork(&*scope.evaluated);
            let result = {
                let mut isolated = state.scope(scope.place.reborrow(), Mode::branch());
                self.evaluate(branch, &mut isolated)
            };

            match result {
                Ok(0) => {}
                Ok(_) => {
                    outcome.matched += 1;
                    outcome.defaults.append(&mut state.pending);
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => self.reporter.absorb(&error),
            }

            if outcome.matched >= enough {
                break;
            }
        }
        Ok(outcome)
    }

    /// Returns false when a failure below the root was absorbed
    fn evaluate_all_of(&mut self, merged: &Schema, scope: &mut Scope<'_>) -> ValidationResult<bool> {
        let result = {
            let mut carrying = scope.with_mode(scope.mode.carrying());
            self.evaluate(merged, &mut carrying)
        };

        match result {
            Ok(_) => Ok(true),
            Err(error) if error.is_fatal() || scope.is_root() => Err(error),
            Err(error) => {
                self.reporter.absorb(&error);
                Ok(false)
            }
        }
    }

    fn evaluate_items(
        &mut self,
        node: &SchemaNode,
        scope: &mut Scope<'_>,
        len: usize,
    ) -> ValidationResult<usize> {
        let mut matched = 0;
        for index in 0..len {
            let mut element = scope.child(&mut self.paths, index);
            let Some(items) = &node.items else {
                let here = self.here(&element);
                return Err(self.reporter.fail(
                    ErrorKind::Structural,
                    &here,
                    element.mode,
                    None,
                    format!("No schema for path '{}'", here),
                ));
            };
            matched += self.evaluate(items, &mut element)?;
        }
        Ok(matched)
    }

    fn evaluate_scalar(
        &mut self,
        node: &SchemaNode,
        scope: &mut Scope<'_>,
        classification: &Classification,
    ) -> ValidationResult<usize> {
        let Some(value) = scope.place.get(&self.paths) else {
            return Ok(0);
        };
        let custom = node.error_message.as_deref();

        if let Some(expected) = &node.constant {
            if !json_equal(value, expected) {
                let here = self.here(scope);
                return Err(self.reporter.fail(
                    ErrorKind::ConstEnum,
                    &here,
                    scope.mode,
                    custom,
                    format!("const {} doesn't match {} at '{}'", value, expected, here),
                ));
            }
            if !node.has_type() {
                scope.carry_forward();
                return Ok(1);
            }
        }

        if let Some(members) = &node.enumeration {
            let EnumValues::List(members) = members else {
                let here = self.here(scope);
                return Err(self.reporter.fail(
                    ErrorKind::ConstEnum,
                    &here,
                    scope.mode,
                    custom,
                    format!("enum should be an array at '{}'", here),
                ));
            };
            if !members.iter().any(|member| json_equal(value, member)) {
                let here = self.here(scope);
                return Err(self.reporter.fail(
                    ErrorKind::ConstEnum,
                    &here,
                    scope.mode,
                    custom,
                    format!(
                        "enum {} not in {} at '{}'",
                        value,
                        Value::Array(members.clone()),
                        here
                    ),
                ));
            }
            if !node.has_type() {
                scope.carry_forward();
                return Ok(1);
            }
        }

        if node.has_type() && !node.type_matches(classification) {
            return Err(self.type_mismatch(node, scope, classification));
        }

        if classification.has(Kind::String) {
            self.check_length(node, scope, classification.size)?;
        }
        if let Some(number) = value.as_f64() {
            self.check_bounds(node, scope, number)?;
        }

        if let Some(pattern) = &node.pattern {
            let matched = match value {
                Value::String(text) => pattern.is_match(text),
                other => pattern.is_match(&other.to_string()),
            };
            if !matched {
                let here = self.here(scope);
                return Err(self.reporter.fail(
                    ErrorKind::Pattern,
                    &here,
                    scope.mode,
                    custom,
                    format!("'{}' failed test {} pattern", here, pattern.source),
                ));
            }
        }

        scope.carry_forward();
        Ok(1)
    }

    fn check_length(
        &self,
        node: &SchemaNode,
        scope: &Scope<'_>,
        length: usize,
    ) -> ValidationResult<()> {
        let length = length as f64;
        let violation = match (node.max_length, node.min_length) {
            (Some(max), _) if length > max => Some(format!("<= {}", max)),
            (_, Some(min)) if length < min => Some(format!(">= {}", min)),
            _ => None,
        };
        match violation {
            Some(bound) => {
                let here = self.here(scope);
                Err(self.reporter.fail(
                    ErrorKind::Range,
                    &here,
                    scope.mode,
                    node.error_message.as_deref(),
                    format!("Length of '{}' must be {}", here, bound),
                ))
            }
            None => Ok(()),
        }
    }

    fn check_bounds(&self, node: &SchemaNode, scope: &Scope<'_>, number: f64) -> ValidationResult<()> {
        let violation = if node.minimum.is_some_and(|min| number < min) {
            node.minimum.map(|min| format!("must be >= {}", min))
        } else if node.exclusive_minimum.is_some_and(|min| number <= min) {
            node.exclusive_minimum.map(|min| format!("must be > {}", min))
        } else if node.maximum.is_some_and(|max| number > max) {
            node.maximum.map(|max| format!("must be <= {}", max))
        } else if node.exclusive_maximum.is_some_and(|max| number >= max) {
            node.exclusive_maximum.map(|max| format!("must be < {}", max))
        } else if node.multiple_of.is_some_and(|factor| number % factor != 0.0) {
            node.multiple_of.map(|factor| format!("must be multiple of {}", factor))
        } else {
            None
        };

        match violation {
            Some(rule) => {
                let here = self.here(scope);
                Err(self.reporter.fail(
                    ErrorKind::Range,
                    &here,
                    scope.mode,
                    node.error_message.as_deref(),
                    format!("'{}' {}", here, rule),
                ))
            }
            None => Ok(()),
        }
    }

    fn type_mismatch(
        &self,
        node: &SchemaNode,
        scope: &Scope<'_>,
        classification: &Classification,
    ) -> ValidationError {
        let here = self.here(scope);
        self.reporter.fail(
            ErrorKind::TypeMismatch,
            &here,
            scope.mode,
            node.error_message.as_deref(),
            format!(
                "Type mismatch of '{}', '{}' not in {}",
                here,
                node.describe_types(),
                classification.describe_kinds()
            ),
        )
    }
}

/// Structural equality where numbers compare by value, so `1` equals `1.0`
pub fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
                return left == right;
            }
            if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
                return left == right;
            }
            left.as_f64() == right.as_f64()
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right).all(|(left, right)| json_equal(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, value)| right.get(key).is_some_and(|other| json_equal(value, other)))
        }
        (left, right) => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(schema: Value, payload: &mut Value, options: &ValidatorOptions) -> ValidationResult<()> {
        Evaluator::new(options).run(&Schema::compile(&schema), payload)
    }

    fn check(schema: Value, mut payload: Value) -> ValidationResult<()> {
        run(schema, &mut payload, &ValidatorOptions::default())
    }

    #[test]
    fn test_json_equal_is_numeric() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!json_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!json_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn test_unresolved_reference_is_fatal_inside_branches() {
        let err = check(
            json!({"oneOf": [{"$ref": "customer#/name"}, {"type": "string"}]}),
            json!("x"),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Reference);
        assert_eq!(err.message, "Could not resolve 'customer#/name'");
    }

    #[test]
    fn test_items_without_schema() {
        let err = check(json!({"type": "array"}), json!([{"a": 1}])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.message, "No schema for path '/0'");

        assert!(check(json!({"type": "array"}), json!([])).is_ok());
        assert!(check(json!({"type": "array"}), json!([1, "two"])).is_ok());
    }

    #[test]
    fn test_bounds_messages() {
        let schema = json!({
            "type": "object",
            "properties": {"n": {"type": "number", "minimum": 1, "exclusiveMaximum": 10, "multipleOf": 3}}
        });
        let message = |n: Value| check(schema.clone(), json!({"n": n})).unwrap_err().message;
        assert_eq!(message(json!(0)), "'/n' must be >= 1");
        assert_eq!(message(json!(12)), "'/n' must be < 10");
        assert_eq!(message(json!(4)), "'/n' must be multiple of 3");
        assert!(check(schema.clone(), json!({"n": 9})).is_ok());
    }

    #[test]
    fn test_not_fails_when_inner_schema_accepts() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"not": {"type": "string"}}}
        });
        assert!(check(schema.clone(), json!({"a": 1})).is_ok());

        let err = check(schema.clone(), json!({"a": "text"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Composition);
        assert_eq!(err.message, "not at '/a' not met");

        // an absent value matches the inner schema vacuously
        let err = check(schema, json!({})).unwrap_err();
        assert_eq!(err.message, "not at '/a' not met");
        assert_eq!(err.path, "/a");
    }

    #[test]
    fn test_rejected_branch_defaults_are_discarded() {
        let schema = json!({
            "type": "object",
            "oneOf": [
                {"properties": {"a": {"type": "string"}, "b": {"type": "number", "default": 1}}, "required": ["a"]},
                {"properties": {"c": {"type": "string"}, "d": {"type": "number", "default": 2}}, "required": ["c"]}
            ]
        });
        let options = ValidatorOptions::default().with_apply_defaults(true);
        let mut payload = json!({"c": "x"});
        run(schema, &mut payload, &options).unwrap();
        assert_eq!(payload, json!({"c": "x", "d": 2}));
    }
}
