//! Common unit tests for scalar validation
//!
//! Covers value types, string and numeric refinements, patterns, `const`,
//! `enum`, and the literal `true`/`false` schemas.

use serde_json::{json, Value};
use stencil_schemas::{ErrorKind, Validator, ValidatorOptions};

fn validator(schema: Value) -> Validator {
    Validator::new(schema, ValidatorOptions::default()).unwrap()
}

#[cfg(test)]
mod basics {
    use super::*;

    #[test]
    fn test_empty_schema_accepts_everything() {
        let validator = validator(json!({}));
        for payload in [
            json!({}),
            json!(null),
            json!(42),
            json!("text"),
            json!([1, {"a": [true]}]),
            json!({"nested": {"deeper": [null]}}),
        ] {
            assert!(validator.check(&payload).is_ok(), "{} should pass", payload);
        }
    }

    #[test]
    fn test_validate_leaves_payload_untouched_without_defaults() {
        let validator = validator(json!({
            "type": "object",
            "properties": {"n": {"type": "number", "default": 3}}
        }));
        let mut payload = json!({});
        validator.validate(&mut payload).unwrap();
        assert_eq!(payload, json!({}));
    }
}

#[cfg(test)]
mod types {
    use super::*;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "string": {"type": "string", "minLength": 1, "maxLength": 20},
                "number": {"type": "number", "minimum": 0, "maximum": 20},
                "null": {"type": "null"}
            }
        })
    }

    #[test]
    fn test_string_property() {
        let validator = validator(schema());
        assert!(validator.check(&json!({"string": "valid string"})).is_ok());

        for bad in [json!(10), json!({}), json!([])] {
            let err = validator.check(&json!({"string": bad})).unwrap_err();
            assert_eq!(err.kind, ErrorKind::TypeMismatch);
            assert_eq!(err.path, "/string");
        }
    }

    #[test]
    fn test_null_property() {
        let validator = validator(schema());
        assert!(validator.check(&json!({"null": null})).is_ok());
        assert!(validator.check(&json!({"null": false})).is_err());
        assert!(validator.check(&json!({"null": 0})).is_err());
        assert!(validator.check(&json!({"null": ""})).is_err());
    }

    #[test]
    fn test_type_mismatch_message_lists_kinds() {
        let err = validator(schema()).check(&json!({"string": 10})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type mismatch of '/string', 'string' not in 'number','integer'"
        );
    }

    #[test]
    fn test_integer_accepts_integral_floats() {
        let validator = validator(json!({"type": "integer"}));
        assert!(validator.check(&json!(42)).is_ok());
        assert!(validator.check(&json!(1.0)).is_ok());
        assert!(validator.check(&json!(3.1415926)).is_err());
        assert!(validator.check(&json!("42")).is_err());
    }

    #[test]
    fn test_type_list() {
        let validator = validator(json!({"type": ["string", "null"], "minLength": 2}));
        assert!(validator.check(&json!("ab")).is_ok());
        assert!(validator.check(&json!(null)).is_ok());
        assert!(validator.check(&json!("a")).is_err());
        assert!(validator.check(&json!(1)).is_err());
    }

    #[test]
    fn test_binary_arrays_are_not_iterated() {
        let validator = validator(json!({
            "type": "object",
            "properties": {"image": {"type": "array", "items": {"type": "string"}}}
        }));
        // numbers and strings only: accepted as a whole without visiting items
        assert!(validator.check(&json!({"image": [1, 2, 3]})).is_ok());
        assert!(validator.check(&json!({"image": [{"x": 1}]})).is_err());
    }

    #[test]
    fn test_object_type_on_scalar() {
        let validator = validator(json!({
            "type": "object",
            "properties": {"child": {"type": "object", "properties": {"a": {"type": "string"}}}}
        }));
        let err = validator.check(&json!({"child": "not an object"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.path, "/child");
    }
}

#[cfg(test)]
mod strings_and_numbers {
    use super::*;

    #[test]
    fn test_length_counts_characters() {
        let validator = validator(json!({"type": "string", "maxLength": 7}));
        assert!(validator.check(&json!("Déjà vu")).is_ok());

        let err = validator.check(&json!("Déjà vu!")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Range);
        assert_eq!(err.to_string(), "Length of '/' must be <= 7");
    }

    #[test]
    fn test_min_length() {
        let validator = validator(json!({"type": "string", "minLength": 1}));
        assert_eq!(
            validator.check(&json!("")).unwrap_err().to_string(),
            "Length of '/' must be >= 1"
        );
    }

    #[test]
    fn test_exclusive_bounds() {
        let validator = validator(json!({"type": "number", "exclusiveMinimum": 0, "maximum": 1.5}));
        assert!(validator.check(&json!(0.5)).is_ok());
        assert!(validator.check(&json!(1.5)).is_ok());
        assert_eq!(
            validator.check(&json!(0)).unwrap_err().to_string(),
            "'/' must be > 0"
        );
        assert_eq!(
            validator.check(&json!(2)).unwrap_err().to_string(),
            "'/' must be <= 1.5"
        );
    }

    #[test]
    fn test_multiple_of_fractional() {
        let validator = validator(json!({"type": "number", "multipleOf": 0.5}));
        assert!(validator.check(&json!(2.5)).is_ok());
        assert!(validator.check(&json!(2.25)).is_err());
    }
}

#[cfg(test)]
mod patterns {
    use super::*;

    #[test]
    fn test_phone_pattern() {
        let validator = validator(json!({
            "type": "string",
            "pattern": "^(\\([0-9]{3}\\))?[0-9]{3}-[0-9]{4}$"
        }));
        assert!(validator.check(&json!("555-1212")).is_ok());
        assert!(validator.check(&json!("(888)555-1212")).is_ok());

        let err = validator.check(&json!("(888)555-1212 ext. 532")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Pattern);
        assert!(err.to_string().starts_with("'/' failed test"));
    }

    #[test]
    fn test_multiline_pattern() {
        let validator = validator(json!({"type": "string", "pattern": "^\\{\\{(.|[\\r\\n])*\\}\\}$"}));
        assert!(validator.check(&json!("{{ foo\nbar }}")).is_ok());
        assert!(validator.check(&json!("{ foo }")).is_err());
    }

    #[test]
    fn test_pattern_on_numbers_tests_their_text() {
        let validator = validator(json!({"type": "number", "pattern": "^4"}));
        assert!(validator.check(&json!(42)).is_ok());
        assert!(validator.check(&json!(24)).is_err());
    }

    #[test]
    fn test_malformed_pattern_never_matches() {
        let validator = validator(json!({"type": "string", "pattern": "(unclosed"}));
        assert!(validator.check(&json!("(unclosed")).is_err());
    }
}

#[cfg(test)]
mod const_and_enum {
    use super::*;

    #[test]
    fn test_const() {
        let validator = validator(json!({"type": "string", "const": "red"}));
        assert!(validator.check(&json!("red")).is_ok());

        let err = validator.check(&json!("blue")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConstEnum);
        assert_eq!(err.to_string(), "const \"blue\" doesn't match \"red\" at '/'");
    }

    #[test]
    fn test_const_without_type() {
        let validator = validator(json!({"const": "red"}));
        assert!(validator.check(&json!("red")).is_ok());
        assert!(validator.check(&json!("blue")).is_err());
    }

    #[test]
    fn test_const_compares_numbers_by_value() {
        let validator = validator(json!({"const": {"n": 1}}));
        assert!(validator.check(&json!({"n": 1.0})).is_ok());
        assert!(validator.check(&json!({"n": 2})).is_err());
    }

    #[test]
    fn test_enum() {
        let validator = validator(json!({"type": "string", "enum": ["red", "amber", "green"]}));
        assert!(validator.check(&json!("red")).is_ok());
        assert_eq!(
            validator.check(&json!("blue")).unwrap_err().kind,
            ErrorKind::ConstEnum
        );
    }

    #[test]
    fn test_enum_without_type() {
        let validator = validator(json!({"enum": ["red", "amber", "green", null, 42]}));
        assert!(validator.check(&json!("red")).is_ok());
        assert!(validator.check(&json!(null)).is_ok());
        assert!(validator.check(&json!(42)).is_ok());
        assert!(validator.check(&json!(0)).is_err());
    }

    #[test]
    fn test_malformed_enum() {
        let err = validator(json!({"enum": "red"})).check(&json!("red")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConstEnum);
        assert_eq!(err.to_string(), "enum should be an array at '/'");
    }
}

#[cfg(test)]
mod literal_schemas {
    use super::*;

    #[test]
    fn test_true_property_accepts_anything() {
        let validator = validator(json!({"type": "object", "properties": {"any": true}}));
        assert!(validator.check(&json!({"any": [1, {"x": null}]})).is_ok());
        assert!(validator.check(&json!({})).is_ok());
    }

    #[test]
    fn test_false_property_rejects_presence() {
        let validator = validator(json!({"type": "object", "properties": {"never": false}}));
        assert!(validator.check(&json!({})).is_ok());

        let err = validator.check(&json!({"never": 1})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.path, "/never");
    }
}
