//! Validation of payloads against a resolved schema
//!
//! A [`Validator`] owns the primary schema, the registry of sub-schemas it may
//! reference and the options that shape evaluation. Resolution of `$ref` and
//! `$merge` happens when the validator is built (and when a sub-schema is
//! added with `combine`), never per payload.
//!
//! # Example
//!
//! ```rust
//! use stencil_schemas::validation::{Validator, ValidatorOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "prompt": {"type": "string"},
//!         "max_tokens": {"type": "number", "default": 256}
//!     },
//!     "required": ["prompt"]
//! });
//! let validator = Validator::new(schema, ValidatorOptions::default().with_apply_defaults(true)).unwrap();
//!
//! let mut payload = json!({"prompt": "tell me a joke"});
//! validator.validate(&mut payload).unwrap();
//! assert_eq!(payload["max_tokens"], json!(256));
//! ```
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

pub mod base;
pub mod defaults;
pub mod engine;
pub mod error;
mod object;
pub mod report;

pub use base::{run_with_stack, EvaluatedPaths, Mode, PathId, PathTable, Place, Scope, INLINE_DEPTH};
pub use defaults::PendingDefault;
pub use engine::{json_equal, Evaluator};
pub use error::{ErrorKind, ValidationError, ValidationErrors, ValidationResult};

use crate::loader::error::LoaderResult;
use crate::loader::parser::SchemaParser;
use crate::loader::registry::DefinitionRegistry;
use crate::loader::resolver::{ReferenceResolver, DEFAULT_MAX_PASSES};
use crate::schema::{nesting_depth, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Options that shape construction and evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorOptions {
    /// Write `default` values for absent properties into the payload
    pub apply_defaults: bool,
    /// Resolve `$merge` directives when the validator is built
    pub use_merge: bool,
    /// Replace generated failure text with the failing node's `errorMessage`
    pub error_messages: bool,
    /// Append the messages absorbed from composition branches
    pub full_errors: bool,
    /// Sub-schemas registered at construction, each carrying a `$id`
    pub sub_schemas: Vec<Value>,
    /// Resolution passes before a schema is declared circular
    pub max_resolution_passes: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            apply_defaults: false,
            use_merge: false,
            error_messages: false,
            full_errors: true,
            sub_schemas: Vec::new(),
            max_resolution_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl ValidatorOptions {
    /// Read options from a JSON or YAML file
    pub fn from_file(path: &Path) -> LoaderResult<Self> {
        SchemaParser::new().parse_file_as(path)
    }

    pub fn with_apply_defaults(mut self, apply_defaults: bool) -> Self {
        self.apply_defaults = apply_defaults;
        self
    }

    pub fn with_merge(mut self, use_merge: bool) -> Self {
        self.use_merge = use_merge;
        self
    }

    pub fn with_error_messages(mut self, error_messages: bool) -> Self {
        self.error_messages = error_messages;
        self
    }

    pub fn with_full_errors(mut self, full_errors: bool) -> Self {
        self.full_errors = full_errors;
        self
    }

    pub fn with_sub_schema(mut self, sub_schema: Value) -> Self {
        self.sub_schemas.push(sub_schema);
        self
    }

    pub fn with_max_resolution_passes(mut self, passes: usize) -> Self {
        self.max_resolution_passes = passes;
        self
    }
}

/// Schema validator; shareable across threads once built
#[derive(Debug, Clone)]
pub struct Validator {
    raw: Value,
    compiled: Schema,
    depth: usize,
    registry: DefinitionRegistry,
    options: ValidatorOptions,
}

impl Validator {
    /// Build a validator.
    ///
    /// `$defs` are hoisted off the schema and `sub_schemas` are registered.
    /// The schema is resolved when merging is enabled or any definitions exist.
    pub fn new(schema: Value, options: ValidatorOptions) -> LoaderResult<Self> {
        let mut raw = schema;
        let mut registry = DefinitionRegistry::new();
        let hoisted = registry.hoist_defs(&mut raw);
        for sub_schema in &options.sub_schemas {
            registry.register(sub_schema.clone())?;
        }

        let resolve = options.use_merge || hoisted || !options.sub_schemas.is_empty();
        let mut validator = Self {
            raw,
            compiled: Schema::Bool(true),
            depth: 0,
            registry,
            options,
        };

        if resolve {
            validator.combine()?;
        } else {
            validator.recompile();
        }
        log::debug!(
            "validator ready: {} definition(s), schema depth {}",
            validator.registry.len(),
            validator.depth
        );
        Ok(validator)
    }

    /// Register a sub-schema; with `combine` the schema is resolved again so
    /// references to it take effect.
    pub fn add_schema(&mut self, sub_schema: Value, combine: bool) -> LoaderResult<()> {
        self.registry.register(sub_schema)?;
        if combine {
            self.combine()?;
        }
        Ok(())
    }

    /// The schema as it stands after resolution
    pub fn get_schema(&self) -> &Value {
        &self.raw
    }

    /// Replace the schema; no resolution is performed
    pub fn set_schema(&mut self, schema: Value) {
        self.raw = schema;
        self.recompile();
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Replace the options.
    ///
    /// Only evaluation flags take effect: sub-schemas are registered at
    /// construction or through [`Validator::add_schema`].
    pub fn set_options(&mut self, options: ValidatorOptions) {
        self.options = options;
    }

    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// Validate `payload`, writing defaults into it when enabled
    pub fn validate(&self, payload: &mut Value) -> ValidationResult<()> {
        let schema = &self.compiled;
        let evaluator = Evaluator::new(&self.options);
        run_with_stack(self.depth, move || evaluator.run(schema, payload))
    }

    /// Validate a copy of `payload`, leaving the original untouched
    pub fn check(&self, payload: &Value) -> ValidationResult<()> {
        let mut copy = payload.clone();
        self.validate(&mut copy)
    }

    fn combine(&mut self) -> LoaderResult<()> {
        let depth = nesting_depth(&self.raw);
        let resolver = ReferenceResolver::new(&self.registry)
            .with_max_passes(self.options.max_resolution_passes);
        let raw = &mut self.raw;
        run_with_stack(depth, move || resolver.resolve(raw))?;
        self.recompile();
        Ok(())
    }

    fn recompile(&mut self) {
        self.depth = nesting_depth(&self.raw);
        let raw = &self.raw;
        self.compiled = run_with_stack(self.depth, move || Schema::compile(raw));
    }
}

/// Batch validation settings
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// Stop at the first failing payload
    pub fail_fast: bool,
    /// Maximum number of errors to collect (0 = unlimited)
    pub max_errors: usize,
}

impl BatchConfig {
    /// Enable fail-fast mode
    pub fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Set maximum number of errors to collect
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

/// Validate several payloads with one validator, collecting failures by index
pub fn validate_batch(
    validator: &Validator,
    payloads: &mut [Value],
    config: &BatchConfig,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for (index, payload) in payloads.iter_mut().enumerate() {
        if let Err(error) = validator.validate(payload) {
            errors.add(index, error);

            if config.fail_fast {
                break;
            }

            if config.max_errors > 0 && errors.len() >= config.max_errors {
                break;
            }
        }
    }

    errors.into_result()
}
