//! Crate-level error type
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::loader::LoaderError;
use crate::validation::{ErrorKind, ValidationError};
use thiserror::Error;

/// Any failure raised while building a validator or validating a payload
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Loader(error) => error.kind(),
            Error::Validation(error) => error.kind,
        }
    }
}

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;
