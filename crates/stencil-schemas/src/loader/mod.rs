//! Schema loading, registration and resolution
//!
//! This module provides:
//! - YAML and JSON parsing of schemas and validator options
//! - The definition registry that `$ref` targets are looked up in
//! - Fixed-point `$ref`/`$merge` resolution with circular reference detection
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use stencil_schemas::loader::SchemaLoader;
//! use stencil_schemas::validation::ValidatorOptions;
//! use std::path::Path;
//!
//! let loader = SchemaLoader::new();
//! let validator = loader.load_validator(
//!     Path::new("schema.yaml"),
//!     Some(Path::new("definitions")),
//!     ValidatorOptions::default(),
//! )?;
//! let mut payload = serde_json::json!({"prompt": "hello"});
//! validator.validate(&mut payload)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod schema_loader;

pub use error::{LoaderError, LoaderResult};
pub use parser::{Format, SchemaParser};
pub use registry::{parse_ref, DefinitionRegistry, DEFS_KEY};
pub use resolver::{deep_merge, ReferenceResolver, DEFAULT_MAX_PASSES};
pub use schema_loader::{LoaderConfig, SchemaLoader};
