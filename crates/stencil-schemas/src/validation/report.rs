//! Error reporting for the evaluator
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::validation::base::Mode;
use crate::validation::error::{ErrorKind, ValidationError};
use crate::validation::ValidatorOptions;

/// Builds failures and keeps the trail of messages absorbed from branches
#[derive(Debug, Default)]
pub struct Reporter {
    full_errors: bool,
    error_messages: bool,
    trail: Vec<String>,
}

impl Reporter {
    pub fn new(options: &ValidatorOptions) -> Self {
        Self {
            full_errors: options.full_errors,
            error_messages: options.error_messages,
            trail: Vec::new(),
        }
    }

    /// Build the failure raised at `path`.
    ///
    /// `custom` is the failing node's `errorMessage`; it replaces the generated
    /// text, and the branch trail with it, when custom messages are enabled.
    pub fn fail(
        &self,
        kind: ErrorKind,
        path: &str,
        mode: Mode,
        custom: Option<&str>,
        message: String,
    ) -> ValidationError {
        if self.error_messages {
            if let Some(custom) = custom {
                return ValidationError::new(kind, path, custom);
            }
        }

        let error = ValidationError::new(kind, path, message);
        if self.full_errors && !mode.absorb && !self.trail.is_empty() {
            error.with_branches(self.trail.clone())
        } else {
            error
        }
    }

    /// Keep the text of an error swallowed by a composition branch
    pub fn absorb(&mut self, error: &ValidationError) {
        let text = error.to_string();
        log::trace!("absorbed branch failure: {}", text);
        if !self.trail.contains(&text) {
            self.trail.push(text);
        }
    }

    pub fn trail(&self) -> &[String] {
        &self.trail
    }
}
