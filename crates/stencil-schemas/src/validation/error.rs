//! Validation error types
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure taxonomy shared by validation and configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No schema for a payload path
    Structural,
    /// Unresolvable `$ref` or bad `$merge`
    Reference,
    /// Sub-schema missing or carrying an invalid `$id`, unreadable files
    Configuration,
    TypeMismatch,
    /// Length, size or numeric bound
    Range,
    ConstEnum,
    Pattern,
    Required,
    AdditionalProperty,
    /// `not`, `oneOf`, `anyOf` or `allOf` not met
    Composition,
}

impl ErrorKind {
    /// Fatal kinds propagate through composition branches instead of being absorbed
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Reference | ErrorKind::Configuration)
    }
}

/// Schema validation failure with path context and absorbed branch messages
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ErrorKind,
    /// Pointer to the failing payload location
    pub path: String,
    /// Human-readable error message
    pub message: String,
    /// Messages absorbed from composition branches
    pub branches: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.branches.is_empty() {
            write!(f, ": {}", self.branches.join(", "))?;
        }
        Ok(())
    }
}

impl ValidationError {
    /// Create a new validation error
    pub fn new<P, M>(kind: ErrorKind, path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
            branches: Vec::new(),
        }
    }

    /// Attach absorbed branch messages
    pub fn with_branches(mut self, branches: Vec<String>) -> Self {
        self.branches = branches;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Failures collected from a batch, each tagged with its payload index
#[derive(Debug, Error, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<(usize, ValidationError)>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multiple validation errors occurred:")?;
        for (i, (index, error)) in self.errors.iter().enumerate() {
            write!(f, "\n{}. payload[{}]: {}", i + 1, index, error)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    /// Create a new validation errors collection
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add the error raised by the payload at `index`
    pub fn add(&mut self, index: usize, error: ValidationError) {
        self.errors.push((index, error));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Ok if no errors, Err if any errors exist
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Default for ValidationErrors {
    fn default() -> Self {
        Self::new()
    }
}
