//! Schema parsing for YAML and JSON files
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// Supported file formats for schema parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML format (.yaml, .yml)
    Yaml,
    /// JSON format (.json)
    Json,
}

impl Format {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> LoaderResult<Self> {
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            match extension.to_lowercase().as_str() {
                "yaml" | "yml" => Ok(Format::Yaml),
                "json" => Ok(Format::Json),
                _ => Err(LoaderError::unsupported_format(path.to_path_buf())),
            }
        } else {
            Err(LoaderError::unsupported_format(path.to_path_buf()))
        }
    }

    /// Get file extensions for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Yaml => &["yaml", "yml"],
            Format::Json => &["json"],
        }
    }
}

/// Schema parser with support for multiple formats
#[derive(Debug, Default)]
pub struct SchemaParser;

impl SchemaParser {
    /// Create a new schema parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a schema file, detecting format from extension
    pub fn parse_file(&self, path: &Path) -> LoaderResult<Value> {
        self.parse_file_as(path)
    }

    /// Parse a file into any deserializable type, detecting format from extension
    pub fn parse_file_as<T: DeserializeOwned>(&self, path: &Path) -> LoaderResult<T> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| LoaderError::io_error(path.to_path_buf(), e))?;

        self.parse_content(&content, format, path)
    }

    /// Parse content with explicit format
    pub fn parse_content<T: DeserializeOwned>(
        &self,
        content: &str,
        format: Format,
        path: &Path,
    ) -> LoaderResult<T> {
        match format {
            Format::Yaml => self.parse_yaml(content, path),
            Format::Json => self.parse_json(content, path),
        }
    }

    /// Parse YAML content
    pub fn parse_yaml<T: DeserializeOwned>(&self, content: &str, path: &Path) -> LoaderResult<T> {
        // Go through a YAML value first so YAML-specific errors keep their location
        let yaml_value: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| LoaderError::yaml_parse_error(path.to_path_buf(), e))?;

        serde_yaml::from_value(yaml_value)
            .map_err(|e| LoaderError::yaml_parse_error(path.to_path_buf(), e))
    }

    /// Parse JSON content
    pub fn parse_json<T: DeserializeOwned>(&self, content: &str, path: &Path) -> LoaderResult<T> {
        serde_json::from_str(content)
            .map_err(|e| LoaderError::json_parse_error(path.to_path_buf(), e))
    }
}
