use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use super::DocumentFormat;
use crate::options::FieldOptions;

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).with_context(|| "failed to parse JSON document")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(contents).with_context(|| "failed to parse YAML document")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => toml::from_str::<toml::Table>(contents)
            .with_context(|| "failed to parse TOML document")
            .and_then(|table| {
                serde_json::to_value(table).context("failed to convert TOML to JSON")
            }),
    }
}

/// Parse an options document into a field options bag.
pub fn load_options_str(contents: &str, format: DocumentFormat) -> Result<FieldOptions> {
    let value = parse_document_str(contents, format)?;
    FieldOptions::from_value(value).with_context(|| format!("invalid {format} options document"))
}

/// Read an options document from disk, picking the format from the extension.
pub fn load_options_file(path: &Path) -> Result<FieldOptions> {
    let format = DocumentFormat::from_path(path)?;
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read options from {}", path.display()))?;
    load_options_str(&contents, format)
}
