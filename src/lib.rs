//! go-retag: struct-tag rewriting for Go sources
//!
//! Scans Go files for `type NAME struct { ... }` blocks, parses each field's
//! backtick tag into `xml`/`json`/`toml`/... sub-tags and reconciles them under
//! an [`OptimizationPolicy`]: dropping redundant names, shortening XML
//! namespaces, deriving `json` keys from `xml` names and so on.
//!
//! # Architecture
//!
//! Everything is line-oriented. A [`Lexer`](lexer::Lexer) tokenizes one line,
//! the [`StructScanner`] tracks which type block the line belongs to, the
//! field and tag parsers extract the pieces, the [`PolicyEngine`] computes the
//! new tag and [`rewrite_field`] splices it back. Only the tag and comment
//! region of a line is ever regenerated; every other byte is copied through.
//!
//! # Safety
//!
//! - Files with structural errors (inline structs, unbalanced brackets) are
//!   never written
//! - Atomic file writes (tempfile + fsync + rename)
//! - Optional `.bak` backup before the first rewrite
//! - Idempotent: a second run over its own output changes nothing
//!
//! # Example
//!
//! ```
//! use go_retag::{process_source, NamespaceRegistry, OptimizationPolicy, PolicyEngine, WarnedNamespaces};
//!
//! let registry = NamespaceRegistry::builtin();
//! let engine = PolicyEngine::new(OptimizationPolicy::complete(), &registry);
//! let mut warned = WarnedNamespaces::new();
//!
//! let source = "type Device struct {\n\tName string `xml:\"Name,omitempty\"`\n}\n";
//! let outcome = process_source(source, &engine, &mut warned);
//! assert_eq!(
//!     outcome.text,
//!     "type Device struct {\n\tName string `xml:\",omitempty\" json:\",omitempty\"`\n}\n"
//! );
//! ```

pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod format;
pub mod lexer;
pub mod namespace;
pub mod parse;
pub mod policy;
pub mod rewrite;

// Re-exports
pub use config::{
    load_from_path, load_from_str, ConfigError, OptimizationPolicy, Preset, RetagConfig,
};
pub use diagnostics::{Counts, DiagnosticLog, FileDiagnostic, Severity};
pub use driver::{
    discover_files, process_source, Discovery, DriverError, DriverOptions, FileDriver, FileReport,
    FileStatus, RunSummary, SourceOutcome,
};
pub use format::{FormatError, Formatter};
pub use namespace::{NamespaceRegistry, WarnedNamespaces};
pub use parse::{FieldDeclaration, FieldError, StructScanner};
pub use policy::PolicyEngine;
pub use rewrite::rewrite_field;
