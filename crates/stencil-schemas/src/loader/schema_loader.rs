//! File-backed construction of validators
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::loader::{
    error::{LoaderError, LoaderResult},
    parser::{Format, SchemaParser},
};
use crate::validation::{Validator, ValidatorOptions};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Configuration for schema loader behavior
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Base directory for relative paths
    pub base_dir: Option<PathBuf>,
    /// Descend into subdirectories when loading a sub-schema directory
    pub recursive: bool,
}

/// Loads schemas, sub-schemas and options from JSON or YAML files
#[derive(Debug, Default)]
pub struct SchemaLoader {
    config: LoaderConfig,
    parser: SchemaParser,
}

impl SchemaLoader {
    /// Create a new schema loader with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new schema loader with custom configuration
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            config,
            parser: SchemaParser::new(),
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a raw schema from file
    pub fn load_schema(&self, path: &Path) -> LoaderResult<Value> {
        let path = self.locate(path);
        let schema = self.parser.parse_file(&path)?;
        log::debug!("loaded schema from {}", path.display());
        Ok(schema)
    }

    /// Load validator options from file
    pub fn load_options(&self, path: &Path) -> LoaderResult<ValidatorOptions> {
        ValidatorOptions::from_file(&self.locate(path))
    }

    /// Load every schema file in `dir`, sorted by path.
    ///
    /// Files with other extensions are skipped; a schema file that fails to
    /// parse is an error.
    pub fn load_directory(&self, dir: &Path) -> LoaderResult<Vec<Value>> {
        let dir = self.locate(dir);
        let mut paths = Vec::new();
        self.collect_schema_files(&dir, &mut paths)?;
        paths.sort();

        paths
            .iter()
            .map(|path| self.parser.parse_file(path))
            .collect()
    }

    /// Build a validator from a schema file, registering every schema found in
    /// `sub_schema_dir` on top of the sub-schemas already in `options`.
    pub fn load_validator(
        &self,
        schema_path: &Path,
        sub_schema_dir: Option<&Path>,
        mut options: ValidatorOptions,
    ) -> LoaderResult<Validator> {
        let schema = self.load_schema(schema_path)?;
        if let Some(dir) = sub_schema_dir {
            options.sub_schemas.extend(self.load_directory(dir)?);
        }
        Validator::new(schema, options)
    }

    fn collect_schema_files(&self, dir: &Path, paths: &mut Vec<PathBuf>) -> LoaderResult<()> {
        let entries =
            std::fs::read_dir(dir).map_err(|e| LoaderError::io_error(dir.to_path_buf(), e))?;

        for entry in entries {
            let entry = entry.map_err(|e| LoaderError::io_error(dir.to_path_buf(), e))?;
            let path = entry.path();

            if path.is_file() {
                if Format::from_path(&path).is_ok() {
                    paths.push(path);
                } else {
                    log::debug!("skipping non-schema file {}", path.display());
                }
            } else if path.is_dir() && self.config.recursive {
                self.collect_schema_files(&path, paths)?;
            }
        }
        Ok(())
    }

    fn locate(&self, path: &Path) -> PathBuf {
        match &self.config.base_dir {
            Some(base_dir) if path.is_relative() => base_dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}
