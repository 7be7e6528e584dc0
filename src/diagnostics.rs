//! Diagnostics: line-local notes, file-located records and the log sink.
//!
//! Parsing and policy code push [`Diagnostic`]s into a [`Notes`] buffer for the
//! line being processed. The driver stamps them with a line number and the
//! enclosing type name, and hands them to a [`DiagnosticLog`], which writes the
//! log file, mirrors each record to `tracing` and keeps the run counters.

use crate::parse::FieldError;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

/// A message about one line, positioned by byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Byte offset into the line the caret points at
    pub column: Option<usize>,
    pub message: String,
    /// Set for errors that forbid rewriting the whole file
    pub structural: bool,
}

/// Diagnostics collected while processing a single line.
#[derive(Debug, Default)]
pub struct Notes {
    items: Vec<Diagnostic>,
}

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, column: Option<usize>, message: String) {
        self.items.push(Diagnostic {
            severity,
            column,
            message,
            structural: false,
        });
    }

    pub fn info(&mut self, column: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Info, column, message.into());
    }

    pub fn warning(&mut self, column: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Warning, column, message.into());
    }

    /// Record a field-level parse failure.
    pub fn fail(&mut self, error: &FieldError) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            column: Some(error.column()),
            message: error.to_string(),
            structural: error.is_structural(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// A diagnostic placed in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostic {
    /// 1-based line number
    pub line: usize,
    /// Name of the enclosing type block, if any
    pub context: Option<String>,
    pub diagnostic: Diagnostic,
}

/// Running totals of recorded diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub info: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl Counts {
    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
        }
    }
}

/// Expand tabs to `tab_width` spaces each.
pub fn expand_tabs(text: &str, tab_width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\t' {
            out.extend(std::iter::repeat(' ').take(tab_width));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Visual column of byte offset `column` once tabs are expanded.
pub fn visual_column(line: &str, column: usize, tab_width: usize) -> usize {
    let mut end = column.min(line.len());
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    line[..end]
        .chars()
        .map(|ch| if ch == '\t' { tab_width } else { 1 })
        .sum()
}

/// Render one record the way it appears in the log file.
///
/// ```text
/// WARNING: api/types.go:12:21: unknown short namespace 'foo' in tag (type Device struct)
///     Name string `xml:"foo:Name"`
///     --------------------^
/// ```
pub fn render(path: &Path, line_text: &str, record: &FileDiagnostic, tab_width: usize) -> String {
    let diag = &record.diagnostic;
    let mut out = format!("{}: {}:{}", diag.severity, path.display(), record.line);
    if let Some(column) = diag.column {
        out.push_str(&format!(":{}", visual_column(line_text, column, tab_width) + 1));
    }
    out.push_str(": ");
    out.push_str(&diag.message);
    if let Some(context) = &record.context {
        out.push_str(&format!(" (type {context} struct)"));
    }
    out.push('\n');
    out.push_str(&expand_tabs(line_text.trim_end_matches('\r'), tab_width));
    if let Some(column) = diag.column {
        out.push('\n');
        out.push_str(&"-".repeat(visual_column(line_text, column, tab_width)));
        out.push('^');
    }
    out
}

/// Log sink for a run: plain-text file plus `tracing` mirror.
pub struct DiagnosticLog {
    writer: Option<Box<dyn Write>>,
    tab_width: usize,
    counts: Counts,
    write_error: Option<io::Error>,
}

impl DiagnosticLog {
    /// Open (truncate) the log file at `path`.
    pub fn create(path: &Path, tab_width: usize) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_writer(Box::new(BufWriter::new(file)), tab_width))
    }

    pub fn with_writer(writer: Box<dyn Write>, tab_width: usize) -> Self {
        Self {
            writer: Some(writer),
            tab_width,
            counts: Counts::default(),
            write_error: None,
        }
    }

    /// A sink that only counts and traces.
    pub fn discard(tab_width: usize) -> Self {
        Self {
            writer: None,
            tab_width,
            counts: Counts::default(),
            write_error: None,
        }
    }

    fn write_line(&mut self, text: &str) {
        if self.write_error.is_some() {
            return;
        }
        if let Some(writer) = self.writer.as_mut() {
            if let Err(err) = writeln!(writer, "{text}") {
                self.write_error = Some(err);
            }
        }
    }

    /// Free-form line without severity, e.g. the run header.
    pub fn banner(&mut self, text: &str) {
        self.write_line(text);
    }

    /// Record a line diagnostic for `path`.
    pub fn record(&mut self, path: &Path, line_text: &str, record: &FileDiagnostic) {
        let diag = &record.diagnostic;
        self.counts.bump(diag.severity);
        let file = path.display();
        match diag.severity {
            Severity::Info => {
                tracing::info!(%file, line = record.line, "{}", diag.message)
            }
            Severity::Warning => {
                tracing::warn!(%file, line = record.line, "{}", diag.message)
            }
            Severity::Error => {
                tracing::error!(%file, line = record.line, structural = diag.structural, "{}", diag.message)
            }
        }
        let rendered = render(path, line_text, record, self.tab_width);
        self.write_line("");
        self.write_line(&rendered);
    }

    /// Record a file-level event (I/O, formatter, skipped file).
    pub fn file_event(&mut self, severity: Severity, path: &Path, message: &str) {
        self.counts.bump(severity);
        let file = path.display();
        match severity {
            Severity::Info => tracing::info!(%file, "{message}"),
            Severity::Warning => tracing::warn!(%file, "{message}"),
            Severity::Error => tracing::error!(%file, "{message}"),
        }
        self.write_line(&format!("{severity}: {file}: {message}"));
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Write the summary line and flush.
    pub fn finish(mut self) -> io::Result<Counts> {
        let counts = self.counts;
        self.write_line("");
        self.write_line(&format!(
            "Summary: {} info, {} warnings, {} errors",
            counts.info, counts.warnings, counts.errors
        ));
        if let Some(err) = self.write_error.take() {
            return Err(err);
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(counts)
    }
}
