use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
#[cfg(feature = "toml")]
use serde_json::Value;

use super::DocumentFormat;
use crate::field::FieldReport;

/// Where a rendered report is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTarget {
    Stdout,
    File(PathBuf),
}

/// Renders field reports in one format and writes them to every target.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    format: DocumentFormat,
    compact: bool,
    targets: Vec<ReportTarget>,
}

impl ReportWriter {
    /// A writer with no targets yet.
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            compact: false,
            targets: Vec::new(),
        }
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn target(mut self, target: ReportTarget) -> Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn targets(&self) -> &[ReportTarget] {
        &self.targets
    }

    pub fn render(&self, report: &FieldReport) -> Result<String> {
        match self.format {
            DocumentFormat::Json if self.compact => {
                serde_json::to_string(report).context("failed to render report as JSON")
            }
            DocumentFormat::Json => {
                serde_json::to_string_pretty(report).context("failed to render report as JSON")
            }
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => {
                serde_yaml::to_string(report).context("failed to render report as YAML")
            }
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => {
                // TOML has no null: unset ids, labels and values are left out.
                let table = without_nulls(
                    serde_json::to_value(report).context("failed to convert report")?,
                );
                if self.compact {
                    toml::to_string(&table).context("failed to render report as TOML")
                } else {
                    toml::to_string_pretty(&table).context("failed to render report as TOML")
                }
            }
        }
    }

    /// Renders `report` once and writes it to each target in turn.
    pub fn write(&self, report: &FieldReport) -> Result<()> {
        if self.targets.is_empty() {
            return Ok(());
        }
        let rendered = self.render(report)?;
        for target in &self.targets {
            match target {
                ReportTarget::Stdout => {
                    let mut stdout = io::stdout().lock();
                    writeln!(stdout, "{rendered}")
                        .and_then(|()| stdout.flush())
                        .context("failed to write report to stdout")?;
                }
                ReportTarget::File(path) => fs::write(path, format!("{rendered}\n"))
                    .with_context(|| format!("failed to write report to {}", path.display()))?,
            }
        }
        Ok(())
    }
}

#[cfg(feature = "toml")]
fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .filter(|(_, entry)| !entry.is_null())
                .map(|(key, entry)| (key, without_nulls(entry)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(without_nulls)
                .collect(),
        ),
        other => other,
    }
}
