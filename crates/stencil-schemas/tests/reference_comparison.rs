//! Agreement with the `jsonschema` crate on the keyword subset both support
//!
//! Only cases where the two evaluators share semantics are compared: arrays
//! made only of numbers and strings are accepted without visiting their items
//! here, and nested `oneOf`/`anyOf` failures yield no match instead of an
//! error, so neither appears below.

use proptest::prelude::*;
use serde_json::{json, Value};
use stencil_schemas::{Validator, ValidatorOptions};

fn assert_agreement(schema: Value, instances: &[Value]) {
    let reference = jsonschema::validator_for(&schema).unwrap();
    let validator = Validator::new(schema.clone(), ValidatorOptions::default()).unwrap();
    for instance in instances {
        assert_eq!(
            validator.check(instance).is_ok(),
            reference.is_valid(instance),
            "schema {} disagrees on {}",
            schema,
            instance
        );
    }
}

#[cfg(test)]
mod scalars {
    use super::*;

    #[test]
    fn test_string_constraints() {
        assert_agreement(
            json!({"type": "string", "minLength": 2, "maxLength": 5, "pattern": "^[a-z]+$"}),
            &[
                json!("ab"),
                json!("abcde"),
                json!("a"),
                json!("abcdef"),
                json!("AB"),
                json!("déjà"),
                json!(12),
                json!(null),
            ],
        );
    }

    #[test]
    fn test_numeric_constraints() {
        assert_agreement(
            json!({"type": "number", "minimum": -10, "exclusiveMaximum": 100, "multipleOf": 5}),
            &[
                json!(-10),
                json!(-15),
                json!(0),
                json!(95),
                json!(100),
                json!(7),
                json!(2.5),
                json!("5"),
            ],
        );
    }

    #[test]
    fn test_integer_type() {
        assert_agreement(
            json!({"type": "integer", "exclusiveMinimum": 0}),
            &[json!(1), json!(1.0), json!(0), json!(1.5), json!(true)],
        );
    }

    #[test]
    fn test_type_lists() {
        assert_agreement(
            json!({"type": ["string", "null"]}),
            &[json!("x"), json!(null), json!(0), json!(false), json!({})],
        );
    }

    #[test]
    fn test_const_and_enum() {
        assert_agreement(
            json!({"const": {"kind": "fixed", "n": 1}}),
            &[json!({"kind": "fixed", "n": 1}), json!({"kind": "fixed", "n": 1.0}), json!({"kind": "fixed"})],
        );
        assert_agreement(
            json!({"enum": ["red", 3, null, [1, 2]]}),
            &[json!("red"), json!(3), json!(3.0), json!(null), json!([1, 2]), json!("blue"), json!([2, 1])],
        );
    }
}

#[cfg(test)]
mod objects {
    use super::*;

    #[test]
    fn test_properties_and_required() {
        assert_agreement(
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "integer", "minimum": 0},
                    "tags": {"type": "array", "items": {"type": "object", "required": ["id"]}}
                },
                "required": ["name"],
                "additionalProperties": false
            }),
            &[
                json!({"name": "ada"}),
                json!({"name": "ada", "age": 36}),
                json!({"name": "ada", "age": -1}),
                json!({"age": 36}),
                json!({"name": "ada", "extra": true}),
                json!({"name": "ada", "tags": [{"id": 1}, {"id": 2}]}),
                json!({"name": "ada", "tags": [{"id": 1}, {"label": "x"}]}),
                json!("ada"),
            ],
        );
    }

    #[test]
    fn test_property_counts() {
        assert_agreement(
            json!({"type": "object", "minProperties": 1, "maxProperties": 2}),
            &[json!({}), json!({"a": 1}), json!({"a": 1, "b": 2}), json!({"a": 1, "b": 2, "c": 3})],
        );
    }

    #[test]
    fn test_unevaluated_properties_through_all_of() {
        assert_agreement(
            json!({
                "allOf": [{"properties": {"a": {"type": "string"}}}],
                "properties": {"b": {"type": "number"}},
                "unevaluatedProperties": false
            }),
            &[json!({"a": "x", "b": 1}), json!({"a": "x"}), json!({"a": "x", "c": true})],
        );
    }
}

#[cfg(test)]
mod composition {
    use super::*;

    #[test]
    fn test_root_one_of() {
        assert_agreement(
            json!({"oneOf": [{"type": "number", "multipleOf": 5}, {"type": "number", "multipleOf": 3}]}),
            &[json!(5), json!(9), json!(15), json!(7), json!("5")],
        );
    }

    #[test]
    fn test_root_any_of() {
        assert_agreement(
            json!({"anyOf": [{"type": "string", "maxLength": 3}, {"type": "boolean"}]}),
            &[json!("abc"), json!("abcd"), json!(true), json!(1)],
        );
    }

    #[test]
    fn test_not() {
        assert_agreement(
            json!({"not": {"type": "string"}}),
            &[json!(1), json!("x"), json!({}), json!(null)],
        );
    }
}

proptest! {
    /// Property: inclusive and exclusive bounds match the reference validator
    #[test]
    fn prop_bounds_agree(n in -200i64..200, low in -100i64..0, high in 0i64..100, exclusive in any::<bool>()) {
        let schema = if exclusive {
            json!({"type": "integer", "exclusiveMinimum": low, "exclusiveMaximum": high})
        } else {
            json!({"type": "integer", "minimum": low, "maximum": high})
        };
        let reference = jsonschema::validator_for(&schema).unwrap();
        let validator = Validator::new(schema, ValidatorOptions::default()).unwrap();
        let instance = json!(n);
        prop_assert_eq!(validator.check(&instance).is_ok(), reference.is_valid(&instance));
    }

    /// Property: string length bounds match the reference validator
    #[test]
    fn prop_lengths_agree(text in "\\PC{0,12}", max in 0usize..10) {
        let schema = json!({"type": "string", "maxLength": max});
        let reference = jsonschema::validator_for(&schema).unwrap();
        let validator = Validator::new(schema, ValidatorOptions::default()).unwrap();
        let instance = json!(text);
        prop_assert_eq!(validator.check(&instance).is_ok(), reference.is_valid(&instance));
    }
}
