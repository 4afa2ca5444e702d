//! Reading options documents and writing field reports.

mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{load_options_file, load_options_str, parse_document_str};
pub use output::{ReportTarget, ReportWriter};
