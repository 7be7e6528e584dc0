//! File driver: runs the line pipeline over whole files and writes results.
//!
//! [`process_source`] is pure text in, text out. [`FileDriver`] adds the file
//! system around it: reading, the write gate, backups, atomic replacement,
//! the formatter and logging.

use crate::config::RetagConfig;
use crate::diagnostics::{Counts, DiagnosticLog, FileDiagnostic, Notes, Severity};
use crate::format::Formatter;
use crate::namespace::WarnedNamespaces;
use crate::parse::StructScanner;
use crate::policy::PolicyEngine;
use crate::rewrite::rewrite_field;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create backup {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl DriverError {
    pub fn path(&self) -> &Path {
        match self {
            DriverError::Read { path, .. }
            | DriverError::Backup { path, .. }
            | DriverError::Write { path, .. }
            | DriverError::Walk { path, .. } => path,
        }
    }
}

/// Result of running the pipeline over one source text.
#[derive(Debug, Clone, Default)]
pub struct SourceOutcome {
    pub text: String,
    pub changed_lines: usize,
    pub diagnostics: Vec<FileDiagnostic>,
    pub errors: usize,
    pub structural_errors: usize,
}

impl SourceOutcome {
    pub fn changed(&self) -> bool {
        self.changed_lines > 0
    }
}

/// Run one line through scanner, engine and rewriter.
///
/// Field-level failures become error notes; the line is then left alone.
pub fn process_line(
    line: &str,
    scanner: &mut StructScanner,
    engine: &PolicyEngine<'_>,
    warned: &mut WarnedNamespaces,
    notes: &mut Notes,
) -> Option<String> {
    let decl = match scanner.scan_line(line, notes) {
        Ok(Some(decl)) => decl,
        Ok(None) => return None,
        Err(err) => {
            notes.fail(&err);
            return None;
        }
    };
    match engine.optimize(line, &decl, warned, notes) {
        Ok(new_tag) => rewrite_field(line, &decl, new_tag.as_deref(), engine.policy()),
        Err(err) => {
            notes.fail(&err);
            None
        }
    }
}

/// Process a whole file's text. Line endings are preserved byte for byte.
pub fn process_source(
    source: &str,
    engine: &PolicyEngine<'_>,
    warned: &mut WarnedNamespaces,
) -> SourceOutcome {
    let mut scanner = StructScanner::new();
    let mut outcome = SourceOutcome {
        text: String::with_capacity(source.len()),
        ..Default::default()
    };

    for (index, line) in source.split('\n').enumerate() {
        if index > 0 {
            outcome.text.push('\n');
        }
        let context = scanner.current_type().map(str::to_string);
        let mut notes = Notes::new();
        match process_line(line, &mut scanner, engine, warned, &mut notes) {
            Some(rewritten) => {
                outcome.text.push_str(&rewritten);
                outcome.changed_lines += 1;
            }
            None => outcome.text.push_str(line),
        }

        for diagnostic in notes.into_vec() {
            if diagnostic.severity == Severity::Error {
                outcome.errors += 1;
                if diagnostic.structural {
                    outcome.structural_errors += 1;
                }
            }
            outcome.diagnostics.push(FileDiagnostic {
                line: index + 1,
                context: context.clone(),
                diagnostic,
            });
        }
    }
    outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Unchanged,
    Rewritten,
    /// Would be rewritten, but this is a dry run
    WouldRewrite,
    /// Has changes that the write gate refused
    Blocked,
    /// Binary or not UTF-8
    Skipped,
}

/// Before and after text of a file with changes.
#[derive(Debug, Clone)]
pub struct TextChange {
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub changed_lines: usize,
    pub change: Option<TextChange>,
}

impl FileReport {
    fn new(path: &Path, status: FileStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            status,
            changed_lines: 0,
            change: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverOptions {
    pub dry_run: bool,
    pub backup: bool,
    pub strict: bool,
}

/// Totals for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub scanned: usize,
    pub rewritten: usize,
    pub would_rewrite: usize,
    pub unchanged: usize,
    pub blocked: usize,
    pub skipped: usize,
    pub failed: usize,
    pub diagnostics: Counts,
}

impl RunSummary {
    fn tally(&mut self, status: FileStatus) {
        match status {
            FileStatus::Unchanged => self.unchanged += 1,
            FileStatus::Rewritten => self.rewritten += 1,
            FileStatus::WouldRewrite => self.would_rewrite += 1,
            FileStatus::Blocked => self.blocked += 1,
            FileStatus::Skipped => self.skipped += 1,
        }
    }

    /// Files with pending or applied changes.
    pub fn changed(&self) -> usize {
        self.rewritten + self.would_rewrite
    }
}

pub struct FileDriver<'p> {
    engine: PolicyEngine<'p>,
    options: DriverOptions,
    formatter: Option<Formatter>,
}

impl<'p> FileDriver<'p> {
    pub fn new(engine: PolicyEngine<'p>, options: DriverOptions, formatter: Option<Formatter>) -> Self {
        Self {
            engine,
            options,
            formatter,
        }
    }

    /// Driver configured from a loaded config file's `[run]` and `[formatter]`.
    pub fn from_config(engine: PolicyEngine<'p>, config: &RetagConfig, dry_run: bool) -> Self {
        let options = DriverOptions {
            dry_run,
            backup: config.run.backup,
            strict: config.run.strict,
        };
        Self::new(engine, options, Formatter::from_settings(&config.formatter))
    }

    pub fn process_file(
        &self,
        path: &Path,
        warned: &mut WarnedNamespaces,
        log: &mut DiagnosticLog,
    ) -> Result<FileReport, DriverError> {
        let bytes = fs::read(path).map_err(|source| DriverError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.contains(&0) {
            log.file_event(Severity::Warning, path, "binary file skipped");
            return Ok(FileReport::new(path, FileStatus::Skipped));
        }
        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(_) => {
                log.file_event(Severity::Warning, path, "file is not valid UTF-8, skipped");
                return Ok(FileReport::new(path, FileStatus::Skipped));
            }
        };

        let outcome = process_source(&source, &self.engine, warned);
        let lines: Vec<&str> = source.split('\n').collect();
        for record in &outcome.diagnostics {
            let line_text = lines.get(record.line - 1).copied().unwrap_or("");
            log.record(path, line_text, record);
        }

        if !outcome.changed() {
            return Ok(FileReport::new(path, FileStatus::Unchanged));
        }

        let mut report = FileReport {
            path: path.to_path_buf(),
            status: FileStatus::Blocked,
            changed_lines: outcome.changed_lines,
            change: None,
        };
        if outcome.structural_errors > 0 {
            log.file_event(
                Severity::Warning,
                path,
                "file not rewritten: structural errors",
            );
            return Ok(report);
        }
        if self.options.strict && outcome.errors > 0 {
            log.file_event(
                Severity::Warning,
                path,
                "file not rewritten: errors in strict mode",
            );
            return Ok(report);
        }

        if self.options.dry_run {
            report.status = FileStatus::WouldRewrite;
        } else {
            if self.options.backup {
                write_backup(path)?;
            }
            atomic_write(path, outcome.text.as_bytes()).map_err(|source| DriverError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            if let Err(err) = filetime::set_file_mtime(path, filetime::FileTime::now()) {
                log.file_event(
                    Severity::Warning,
                    path,
                    &format!("failed to update mtime: {err}"),
                );
            }
            if let Some(formatter) = &self.formatter {
                if let Err(err) = formatter.run(path) {
                    log.file_event(Severity::Warning, path, &err.to_string());
                }
            }
            report.status = FileStatus::Rewritten;
        }
        tracing::info!(
            file = %path.display(),
            lines = outcome.changed_lines,
            dry_run = self.options.dry_run,
            "tags rewritten"
        );
        report.change = Some(TextChange {
            before: source,
            after: outcome.text,
        });
        Ok(report)
    }

    /// Process every file in `paths`, reporting each one to `on_report`.
    ///
    /// A path that cannot be walked, or a file that fails to read or write, is
    /// logged as an error and the run moves on.
    pub fn run(
        &self,
        paths: &[PathBuf],
        extensions: &[String],
        warned: &mut WarnedNamespaces,
        log: &mut DiagnosticLog,
        mut on_report: impl FnMut(&FileReport),
    ) -> RunSummary {
        let discovery = discover_files(paths, extensions);
        let mut summary = RunSummary::default();
        for err in &discovery.failures {
            summary.failed += 1;
            log.file_event(Severity::Error, err.path(), &err.to_string());
        }
        for path in &discovery.files {
            summary.scanned += 1;
            match self.process_file(path, warned, log) {
                Ok(report) => {
                    summary.tally(report.status);
                    on_report(&report);
                }
                Err(err) => {
                    summary.failed += 1;
                    log.file_event(Severity::Error, path, &err.to_string());
                }
            }
        }
        summary.diagnostics = log.counts();
        summary
    }
}

/// Files found under the command-line paths, plus the entries that could not
/// be walked.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub failures: Vec<DriverError>,
}

/// Expand `paths` into the sorted list of files to process.
///
/// Files named explicitly are always taken. Directories are walked for files
/// with one of `extensions`, skipping hidden directories. Walk errors are
/// collected and the walk continues.
pub fn discover_files(paths: &[PathBuf], extensions: &[String]) -> Discovery {
    let mut files = Vec::new();
    let mut failures = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(source) => failures.push(DriverError::Walk {
                    path: source.path().map_or_else(|| root.clone(), Path::to_path_buf),
                    source,
                }),
            }
        }
    }
    files.sort();
    files.dedup();
    Discovery { files, failures }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want == ext))
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// Copy `path` to `<path>.bak` unless a backup is already there.
fn write_backup(path: &Path) -> Result<(), DriverError> {
    let backup = backup_path(path);
    if backup.exists() {
        return Ok(());
    }
    fs::copy(path, &backup).map_err(|source| DriverError::Backup {
        path: backup.clone(),
        source,
    })?;
    Ok(())
}

/// Tempfile in the same directory, fsync, rename over the target.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
