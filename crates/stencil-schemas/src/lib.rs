//! Stencil Schemas - a JSON Schema subset validator
//!
//! Validates arbitrary `serde_json::Value` payloads against a declarative
//! schema tree. Beyond plain type and range checks it supports:
//!
//! - **Composition**: `allOf`, `anyOf`, `oneOf` and `not`
//! - **Cross-schema references**: `$id`, `$ref` and `$defs`
//! - **Schema merging**: `$merge` with `source` and `with` operands
//! - **Evaluated-property tracking**: `additionalProperties`,
//!   `unevaluatedProperties` and `required` see what composition matched
//! - **Default injection**: absent properties receive their `default`,
//!   including inside the `oneOf`/`anyOf` branch that was selected
//! - **Custom messages**: a node's `errorMessage` can replace generated text
//!
//! ## Quick Start
//!
//! ```rust
//! use stencil_schemas::{Validator, ValidatorOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "prompt": {"type": "string", "maxLength": 1000},
//!         "stream": {"type": "boolean", "default": false}
//!     },
//!     "required": ["prompt"],
//!     "additionalProperties": false
//! });
//!
//! let validator = Validator::new(schema, ValidatorOptions::default().with_apply_defaults(true)).unwrap();
//!
//! let mut payload = json!({"prompt": "Hello, world!"});
//! match validator.validate(&mut payload) {
//!     Ok(_) => assert_eq!(payload["stream"], json!(false)),
//!     Err(e) => println!("Validation error: {}", e),
//! }
//! ```
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use loader::{DefinitionRegistry, LoaderError, LoaderResult, SchemaLoader};
pub use schema::{Pointer, Schema};
pub use validation::{
    validate_batch, BatchConfig, ErrorKind, ValidationError, ValidationErrors, ValidationResult,
    Validator, ValidatorOptions,
};
