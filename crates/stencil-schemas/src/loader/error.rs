//! Error types for schema loading, registration and reference resolution
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::validation::error::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Configuration-time failures; these are never absorbed by composition branches
#[derive(Error, Debug)]
pub enum LoaderError {
    /// File I/O errors
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing errors
    #[error("Failed to parse YAML file '{path}': {source}")]
    YamlParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing errors
    #[error("Failed to parse JSON file '{path}': {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Unsupported file format
    #[error("Unsupported file format for '{path}'. Expected .yaml, .yml, or .json")]
    UnsupportedFormat { path: PathBuf },

    /// Sub-schema registered without `$id`
    #[error("subSchemas need $id, got a schema with keys [{keys}]")]
    MissingId { keys: String },

    /// `$id` is not a usable retrieval URI
    #[error("subSchemas need a valid retrieval URI $id, '{id}' is not one: {reason}")]
    InvalidId { id: String, reason: String },

    /// Two sub-schemas map to the same retrieval identifier
    #[error("Retrieval identifier '{retrieval_id}' from $id '{id}' is already registered")]
    DuplicateId { id: String, retrieval_id: String },

    /// `$ref` names an unknown definition or a missing path inside one
    #[error("Could not resolve '{reference}': {reason}")]
    ReferenceError { reference: String, reason: String },

    /// `$merge` is not shaped `{source, with}` or cannot be spliced
    #[error("Invalid $merge: {reason}")]
    InvalidMerge { reason: String },

    /// A `$ref` leads back to itself; `chain` lists the references involved
    #[error("Circular reference detected: {chain}")]
    ReferenceCycle { chain: String },

    /// Resolution did not reach a fixed point
    #[error("Circular reference detected: schema still unresolved after {passes} passes")]
    CircularReference { passes: usize },
}

impl From<std::io::Error> for LoaderError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::from("<unknown>"),
            source: error,
        }
    }
}

impl LoaderError {
    /// Create an I/O error with path context
    pub fn io_error(path: PathBuf, error: std::io::Error) -> Self {
        Self::IoError {
            path,
            source: error,
        }
    }

    /// Create a YAML parsing error with path context
    pub fn yaml_parse_error(path: PathBuf, error: serde_yaml::Error) -> Self {
        Self::YamlParseError {
            path,
            source: error,
        }
    }

    /// Create a JSON parsing error with path context
    pub fn json_parse_error(path: PathBuf, error: serde_json::Error) -> Self {
        Self::JsonParseError {
            path,
            source: error,
        }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(path: PathBuf) -> Self {
        Self::UnsupportedFormat { path }
    }

    /// Create a reference resolution error
    pub fn reference_error(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReferenceError {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid merge error
    pub fn invalid_merge(reason: impl Into<String>) -> Self {
        Self::InvalidMerge {
            reason: reason.into(),
        }
    }

    /// Get the file path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::IoError { path, .. } => Some(path),
            Self::YamlParseError { path, .. } => Some(path),
            Self::JsonParseError { path, .. } => Some(path),
            Self::UnsupportedFormat { path } => Some(path),
            _ => None,
        }
    }

    /// Where this error sits in the validation error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReferenceError { .. }
            | Self::InvalidMerge { .. }
            | Self::ReferenceCycle { .. }
            | Self::CircularReference { .. } => ErrorKind::Reference,
            _ => ErrorKind::Configuration,
        }
    }
}
