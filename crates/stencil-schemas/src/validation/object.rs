//! Object evaluation: properties, extra properties, size bounds and `required`
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::schema::{Classification, Kind, Schema, SchemaNode};
use crate::validation::base::{EvaluatedPaths, Mode, PathId, Scope};
use crate::validation::engine::Evaluator;
use crate::validation::error::{ErrorKind, ValidationResult};

impl Evaluator {
    /// Returns whether any property of the object matched
    pub(super) fn evaluate_object(
        &mut self,
        node: &SchemaNode,
        scope: &mut Scope<'_>,
        classification: &Classification,
    ) -> ValidationResult<bool> {
        if classification.has(Kind::Object) {
            self.check_size(node, scope, classification.size)?;
        }

        let mut own = EvaluatedPaths::new();
        let mut matched = 0;

        if let Some(properties) = &node.properties {
            for (name, schema) in properties {
                let mut child = scope.child(&mut self.paths, name.as_str());
                let path = child.path();
                if self.evaluate(schema, &mut child)? > 0 {
                    own.insert(path);
                    matched += 1;
                }
            }
        }

        let parent = scope.path();
        let names = &classification.properties;

        if let Some(extra) = &node.additional_properties {
            let candidates = self.unevaluated(parent, names, |path| own.contains(&path));
            let accepted = self.evaluate_extra(extra, "additionalProperties", scope, candidates)?;
            matched += accepted.len();
            scope.evaluated.extend(accepted);
        }

        let mut widened = EvaluatedPaths::new();
        if let Some(extra) = &node.unevaluated_properties {
            let evaluated = &*scope.evaluated;
            let candidates = self.unevaluated(parent, names, |path| {
                evaluated.contains(&path) || own.contains(&path)
            });
            let accepted = self.evaluate_extra(extra, "unevaluatedProperties", scope, candidates)?;
            matched += accepted.len();
            widened.extend(accepted);
        }

        if let Some(required) = &node.required {
            let missing: Vec<&str> = required
                .iter()
                .filter(|name| {
                    let path = self.paths.child(parent, name.as_str());
                    !scope.evaluated.contains(&path) && !own.contains(&path) && !widened.contains(&path)
                })
                .map(String::as_str)
                .collect();

            if !missing.is_empty() {
                let here = self.here(scope);
                return Err(self.reporter.fail(
                    ErrorKind::Required,
                    &here,
                    scope.mode,
                    node.error_message.as_deref(),
                    format!(
                        "required properties at '{}' are '{}', missing '{}'",
                        here,
                        required.join(","),
                        missing.join(",")
                    ),
                ));
            }
        }

        Ok(matched > 0)
    }

    fn check_size(&self, node: &SchemaNode, scope: &Scope<'_>, size: usize) -> ValidationResult<()> {
        let count = size as f64;
        let violation = match (node.min_properties, node.max_properties) {
            (Some(min), _) if count < min => Some(("minProperties", min)),
            (_, Some(max)) if count > max => Some(("maxProperties", max)),
            _ => None,
        };
        match violation {
            Some((keyword, bound)) => {
                let here = self.here(scope);
                Err(self.reporter.fail(
                    ErrorKind::Range,
                    &here,
                    scope.mode,
                    node.error_message.as_deref(),
                    format!("{} at '{}' is {}, got {}", keyword, here, bound, size),
                ))
            }
            None => Ok(()),
        }
    }

    /// Properties of the object at `parent` that `seen` does not account for
    fn unevaluated<'n>(
        &mut self,
        parent: PathId,
        names: &'n [String],
        seen: impl Fn(PathId) -> bool,
    ) -> Vec<(PathId, &'n str)> {
        names
            .iter()
            .map(|name| (self.paths.child(parent, name.as_str()), name.as_str()))
            .filter(|(path, _)| !seen(*path))
            .collect()
    }

    /// Evaluate the object's unaccounted properties against `schema`.
    ///
    /// A `false` schema rejects them all at once. Otherwise each one is
    /// evaluated on its own and the paths of those that matched are returned.
    fn evaluate_extra(
        &mut self,
        schema: &Schema,
        keyword: &str,
        scope: &mut Scope<'_>,
        candidates: Vec<(PathId, &str)>,
    ) -> ValidationResult<Vec<PathId>> {
        if let Schema::Bool(false) = schema {
            if candidates.is_empty() {
                return Ok(Vec::new());
            }
            let listed: Vec<String> = candidates
                .iter()
                .map(|(path, _)| self.paths.render(*path))
                .collect();
            let here = self.here(scope);
            return Err(self.reporter.fail(
                ErrorKind::AdditionalProperty,
                &here,
                scope.mode,
                None,
                format!("{} '{}' at '{}' not allowed", keyword, listed.join(","), here),
            ));
        }

        let mode = Mode {
            carry: false,
            ..scope.mode
        };
        let mut accepted = Vec::new();
        for (path, name) in candidates {
            let mut fresh = EvaluatedPaths::new();
            let place = scope.place.child(&mut self.paths, name);
            let mut isolated = Scope::new(place, mode, &mut fresh, &mut *scope.pending);
            if self.evaluate(schema, &mut isolated)? > 0 {
                accepted.push(path);
            }
        }
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::Schema;
    use crate::validation::engine::Evaluator;
    use crate::validation::error::{ErrorKind, ValidationResult};
    use crate::validation::ValidatorOptions;
    use serde_json::{json, Value};

    fn check(schema: Value, mut payload: Value) -> ValidationResult<()> {
        Evaluator::new(&ValidatorOptions::default()).run(&Schema::compile(&schema), &mut payload)
    }

    #[test]
    fn test_size_bounds_apply_to_objects_only() {
        let schema = json!({"type": "object", "minProperties": 1, "maxProperties": 2});
        assert!(check(schema.clone(), json!({"a": 1})).is_ok());

        let err = check(schema.clone(), json!({})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Range);
        assert_eq!(err.message, "minProperties at '/' is 1, got 0");

        let err = check(schema, json!({"a": 1, "b": 2, "c": 3})).unwrap_err();
        assert_eq!(err.message, "maxProperties at '/' is 2, got 3");

        let nested = json!({"properties": {"o": {"minProperties": 1}}});
        assert!(check(nested, json!({})).is_ok());
    }

    #[test]
    fn test_additional_properties_schema() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "additionalProperties": {"type": "number"}
        });
        assert!(check(schema.clone(), json!({"name": "a", "x": 1, "y": 2})).is_ok());

        let err = check(schema, json!({"name": "a", "x": "one"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.path, "/x");
    }

    #[test]
    fn test_additional_properties_false_names_every_path() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "additionalProperties": false
        });
        let err = check(schema, json!({"name": "a", "x": 1, "y": 2})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AdditionalProperty);
        assert_eq!(err.message, "additionalProperties '/x,/y' at '/' not allowed");
    }

    #[test]
    fn test_required_counts_extra_matches() {
        let schema = json!({
            "type": "object",
            "additionalProperties": {"type": "string"},
            "required": ["nick"]
        });
        assert!(check(schema.clone(), json!({"nick": "n"})).is_ok());

        let err = check(schema, json!({"other": "n"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Required);
        assert_eq!(err.message, "required properties at '/' are 'nick', missing 'nick'");
    }
}
