//! Command-line harness for `labeled-fields`.
//!
//! Builds one field from an options document, binds it to a control holding
//! `--value`, optionally types `--input` into it as a user would, drains the
//! deferred updates and prints the resulting field report.

use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use serde_json::Value;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use labeled_fields::io::{DocumentFormat, ReportTarget, ReportWriter, parse_document_str};
use labeled_fields::prelude::*;

#[derive(Debug, Parser)]
#[command(
    name = "labeled-fields",
    version,
    about = "Build a labeled field from an options document and print its report"
)]
struct Cli {
    /// Field kind to build
    #[arg(short = 'k', long = "kind", value_enum, default_value_t = KindArg::Text)]
    kind: KindArg,

    /// Options spec: file path, inline payload, or "-" for stdin
    #[arg(short = 'p', long = "options", value_name = "SPEC")]
    options: Option<String>,

    /// Initial model value (JSON; anything else is taken as a string)
    #[arg(short = 'v', long = "value", value_name = "JSON")]
    value: Option<String>,

    /// Value typed by the user after set-up (JSON; anything else is a string)
    #[arg(short = 'i', long = "input", value_name = "JSON")]
    input: Option<String>,

    /// Name of the bound control, used as the field id
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    name: Option<String>,

    /// Put a required validator on the bound control
    #[arg(short = 'r', long = "required")]
    required: bool,

    /// Mark the field as touched before reporting
    #[arg(long = "touch")]
    touch: bool,

    /// Report destinations ("-" writes to stdout). Accepts multiple values per flag use.
    #[arg(short = 'o', long = "output", value_name = "DEST", num_args = 1.., action = ArgAction::Append)]
    outputs: Vec<String>,

    /// Report format when it cannot be inferred from an output file
    #[arg(long = "format", value_name = "FORMAT")]
    format: Option<String>,

    /// Emit compact JSON/TOML rather than pretty formatting
    #[arg(long = "no-pretty")]
    no_pretty: bool,

    /// Overwrite output files even if they already exist
    #[arg(short = 'f', long = "force", short_alias = 'y', alias = "yes")]
    force: bool,

    /// Log field activity to stderr
    #[arg(long = "debug")]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Text,
    Select,
    PlainText,
}

impl KindArg {
    fn builder(self) -> FieldBuilder {
        match self {
            KindArg::Text => FieldBuilder::text(),
            KindArg::Select => FieldBuilder::select(),
            KindArg::PlainText => FieldBuilder::plain_text(),
        }
    }
}

#[derive(Debug)]
enum InputSource {
    File(PathBuf),
    Stdin,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("labeled_fields=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(io::stderr)
        .init();

    let mut diagnostics = DiagnosticCollector::default();

    let options = load_options(cli.options.as_deref(), &mut diagnostics);
    let writer = build_report_writer(&cli, &mut diagnostics);
    if let Some(writer) = writer.as_ref() {
        ensure_output_paths_available(writer, cli.force, &mut diagnostics);
    }
    diagnostics.into_result()?;

    let report = run_field(&cli, options)?;
    if let Some(writer) = writer {
        writer.write(&report).map_err(|err| eyre!("{err:#}"))?;
    }
    Ok(())
}

fn run_field(cli: &Cli, options: Option<FieldOptions>) -> Result<FieldReport> {
    let queue = Rc::new(MicrotaskQueue::new());
    let context = FieldContext::new().with_queue(queue.clone());

    let initial = cli.value.as_deref().map(parse_value).unwrap_or(Value::Null);
    let validators = if cli.required {
        vec![Validator::required()]
    } else {
        Vec::new()
    };
    let outer = FieldControl::new(initial, validators);

    let mut builder = cli.kind.builder().context(context);
    builder = match cli.name.as_ref() {
        Some(name) => builder.bind_named(&outer, name.clone()),
        None => builder.bind(&outer),
    };
    if let Some(options) = options {
        builder = builder.inputs(options);
    }
    let field = builder.build();
    let ran = queue.run_until_idle();
    debug!(ran, "set-up updates drained");

    if let Some(raw) = cli.input.as_deref() {
        if !field.input(parse_value(raw)) {
            warn!(input = raw, "input was rejected by the field");
        }
        queue.run_until_idle();
    }
    if cli.touch {
        field.touch();
    }

    let report = field.report();
    field.destroy();
    Ok(report)
}

/// JSON when it parses, a plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn load_options(
    spec: Option<&str>,
    diagnostics: &mut DiagnosticCollector,
) -> Option<FieldOptions> {
    let spec = spec?;
    let format = if spec == "-" {
        DocumentFormat::Json
    } else {
        match probe_format(Path::new(spec)) {
            Ok(format) => format.unwrap_or(DocumentFormat::Json),
            Err(message) => {
                diagnostics.push_input("options", message);
                return None;
            }
        }
    };
    let value = match load_value(spec, format) {
        Ok(value) => value,
        Err(err) => {
            diagnostics.push_input("options", format!("{err:#}"));
            return None;
        }
    };
    match FieldOptions::from_value(value) {
        Ok(options) => Some(options),
        Err(err) => {
            diagnostics.push_input("options", err.to_string());
            None
        }
    }
}

fn load_value(spec: &str, format: DocumentFormat) -> Result<Value> {
    if spec == "-" {
        let contents = read_from_source(&InputSource::Stdin)?;
        return parse_contents(&contents, format, "options");
    }

    let path = PathBuf::from(spec);
    match read_from_source(&InputSource::File(path.clone())) {
        Ok(contents) => parse_contents(&contents, format, "options"),
        Err(err) => {
            if is_not_found(&err) {
                return parse_contents(spec, format, "inline options");
            }
            Err(err.wrap_err(format!("failed to load options from {}", path.display())))
        }
    }
}

fn read_from_source(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .wrap_err("failed to read from stdin")?;
            Ok(buffer)
        }
        InputSource::File(path) => fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read file {}", path.display())),
    }
}

fn is_not_found(err: &Report) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|io_err| io_err.kind() == io::ErrorKind::NotFound)
}

fn parse_contents(contents: &str, format: DocumentFormat, label: &str) -> Result<Value> {
    match parse_document_str(contents, format) {
        Ok(value) => Ok(value),
        Err(primary) => {
            for candidate in DocumentFormat::available() {
                if candidate == format {
                    continue;
                }
                if let Ok(value) = parse_document_str(contents, candidate) {
                    return Ok(value);
                }
            }
            Err(eyre!(
                "failed to parse {label}: tried {} (first error: {primary:#})",
                format_list()
            ))
        }
    }
}

fn format_list() -> String {
    DocumentFormat::available()
        .into_iter()
        .map(|format| format.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Ok(None)` when the path has no extension worth reading; inline payloads
/// end up here too.
fn probe_format(path: &Path) -> std::result::Result<Option<DocumentFormat>, String> {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return Ok(None);
    };
    match ext.to_ascii_lowercase().as_str() {
        "json" | "yaml" | "yml" | "toml" => DocumentFormat::from_extension(ext)
            .map(Some)
            .map_err(|_| {
                format!(
                    "'{}' needs {ext} support, but this build lacks that feature",
                    path.display()
                )
            }),
        _ => Ok(None),
    }
}

#[derive(Default)]
struct DiagnosticCollector {
    messages: Vec<String>,
}

impl DiagnosticCollector {
    fn push_input(&mut self, label: &str, message: impl Into<String>) {
        self.messages
            .push(format!("input ({label}): {}", message.into()));
    }

    fn push_output(&mut self, message: impl Into<String>) {
        self.messages.push(format!("output: {}", message.into()));
    }

    fn into_result(self) -> Result<()> {
        if self.messages.is_empty() {
            return Ok(());
        }
        let mut body = String::from("encountered input/output issues:\n");
        for (idx, msg) in self.messages.iter().enumerate() {
            let _ = writeln!(body, "  {}. {}", idx + 1, msg);
        }
        Err(eyre!(body))
    }
}

fn build_report_writer(cli: &Cli, diagnostics: &mut DiagnosticCollector) -> Option<ReportWriter> {
    let mut targets = Vec::new();
    for raw in &cli.outputs {
        if raw.trim().is_empty() {
            diagnostics.push_output("output destination cannot be empty");
            continue;
        }
        if raw == "-" {
            targets.push(ReportTarget::Stdout);
        } else {
            targets.push(ReportTarget::File(PathBuf::from(raw)));
        }
    }
    if targets.is_empty() {
        targets.push(ReportTarget::Stdout);
    }

    let explicit = match cli.format.as_deref().map(str::parse::<DocumentFormat>) {
        Some(Ok(format)) => Some(format),
        Some(Err(err)) => {
            diagnostics.push_output(err.to_string());
            return None;
        }
        None => None,
    };

    let mut detected: Option<DocumentFormat> = None;
    for target in &targets {
        let ReportTarget::File(path) = target else {
            continue;
        };
        match probe_format(path) {
            Ok(Some(format)) => match detected {
                Some(existing) if existing != format => diagnostics.push_output(format!(
                    "output file {} uses {format} but other destinations use {existing}; align extensions",
                    path.display()
                )),
                _ => detected = Some(format),
            },
            Ok(None) if explicit.is_some() => {}
            Ok(None) => diagnostics.push_output(format!(
                "cannot infer format from output file {}; use .json/.yaml/.toml or --format",
                path.display()
            )),
            Err(message) => diagnostics.push_output(message),
        }
    }

    let format = explicit.or(detected).unwrap_or(DocumentFormat::Json);
    let writer = targets
        .into_iter()
        .fold(ReportWriter::new(format).compact(cli.no_pretty), ReportWriter::target);
    Some(writer)
}

fn ensure_output_paths_available(
    writer: &ReportWriter,
    force: bool,
    diagnostics: &mut DiagnosticCollector,
) {
    if force {
        return;
    }
    for target in writer.targets() {
        if let ReportTarget::File(path) = target
            && path.exists()
        {
            diagnostics.push_output(format!(
                "file {} already exists (pass --force to overwrite)",
                path.display()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn values_fall_back_to_strings() {
        assert_eq!(parse_value("5"), json!(5));
        assert_eq!(parse_value("[1, 2]"), json!([1, 2]));
        assert_eq!(parse_value("hello"), json!("hello"));
    }

    #[test]
    fn inline_paths_have_no_format() {
        assert_eq!(probe_format(Path::new(r#"{"label": "x"}"#)), Ok(None));
        assert_eq!(
            probe_format(Path::new("field.json")),
            Ok(Some(DocumentFormat::Json))
        );
    }

    #[test]
    fn select_run_reports_replacement() {
        let cli = Cli::parse_from([
            "labeled-fields",
            "--kind",
            "select",
            "--value",
            "5",
            "--options",
            r#"{"items": [{"id": 1}, {"id": 2}], "bindValue": "id", "allowInvalid": false}"#,
        ]);
        let mut diagnostics = DiagnosticCollector::default();
        let options = load_options(cli.options.as_deref(), &mut diagnostics);
        assert!(diagnostics.messages.is_empty());

        let report = run_field(&cli, options).unwrap();
        assert_eq!(report.value, json!(1));
        assert_eq!(report.status, ControlStatus::Valid);
        assert!(!report.dirty);
    }
}
