use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Effective configuration: a resolved policy plus run and formatter settings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetagConfig {
    pub policy: OptimizationPolicy,
    pub run: RunSettings,
    pub formatter: FormatterSettings,
}

/// Named switches controlling how sub-tags are rewritten.
///
/// Read once at startup; immutable for the duration of a run.
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizationPolicy {
    /// Drop a tag name equal to the field's declared name.
    pub omit_redundant_name: bool,
    /// Rewrite long namespace URIs to registered short prefixes.
    pub transform_namespace: bool,
    /// Deduplicate and sort the option list.
    pub sort_options: bool,
    /// Secondary sub-tags (json) adopt the primary (xml) name.
    pub derive_secondary_from_primary: bool,
    /// An explicit secondary name is kept instead of the derived one.
    pub allow_override_by_secondary: bool,
    /// Force `-` for internal reflection types such as `xml.Name`.
    pub hide_internal_types: bool,
    /// Copy `omitempty` from the primary sub-tag.
    pub derive_omit_empty: bool,
    /// Add `omitempty` to pointer, slice, map and interface fields.
    pub add_omit_empty_for_optional: bool,
    /// Keep the replaced tag in an `origin:` comment.
    pub preserve_original_as_comment: bool,
}

impl OptimizationPolicy {
    /// Every switch off: tags are parsed and checked but never optimized.
    pub fn none() -> Self {
        Self::default()
    }

    /// All optimizations that are safe to apply unattended.
    pub fn complete() -> Self {
        Self {
            omit_redundant_name: true,
            transform_namespace: true,
            sort_options: true,
            derive_secondary_from_primary: true,
            allow_override_by_secondary: false,
            hide_internal_types: true,
            derive_omit_empty: true,
            add_omit_empty_for_optional: true,
            preserve_original_as_comment: false,
        }
    }

    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::None => Self::none(),
            Preset::Complete => Self::complete(),
        }
    }
}

/// Built-in policy presets, selectable with `--preset` or a top-level
/// `preset = "..."` key.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    None,
    Complete,
}

/// How files are selected and written.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// File extensions (without dot) to process
    pub extensions: Vec<String>,
    /// Copy the original to `<path>.bak` before the first rewrite
    pub backup: bool,
    /// Refuse to rewrite a file that produced any error
    pub strict: bool,
    /// Column width of a tab when rendering diagnostics
    pub tab_width: usize,
    /// Diagnostic log path
    pub log_file: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["go".to_string()],
            backup: false,
            strict: false,
            tab_width: 4,
            log_file: PathBuf::from("go-retag.log"),
        }
    }
}

/// External formatter invoked after a file is rewritten.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterSettings {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "gofmt".to_string(),
            args: vec!["-w".to_string()],
            timeout_secs: 10,
        }
    }
}

impl FormatterSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetagConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.run.extensions.is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "run.extensions",
            });
        }
        for ext in &self.run.extensions {
            if ext.trim().is_empty() || ext.starts_with('.') {
                issues.push(ValidationIssue::InvalidValue {
                    field: "run.extensions",
                    message: format!("extension '{ext}' must be non-empty and without a leading dot"),
                });
            }
        }
        if self.run.tab_width == 0 {
            issues.push(ValidationIssue::InvalidValue {
                field: "run.tab_width",
                message: "must be at least 1".to_string(),
            });
        }
        if self.run.log_file.as_os_str().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "run.log_file",
            });
        }
        if self.formatter.enabled {
            if self.formatter.command.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: "formatter.command",
                });
            }
            if self.formatter.timeout_secs == 0 {
                issues.push(ValidationIssue::InvalidValue {
                    field: "formatter.timeout_secs",
                    message: "must be at least 1".to_string(),
                });
            }
        }
        if self.policy.preserve_original_as_comment && !self.policy.has_rewrites() {
            issues.push(ValidationIssue::InvalidCombo {
                message: "preserve_original_as_comment has no effect when every rewrite switch is off"
                    .to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

impl OptimizationPolicy {
    /// True when at least one switch can change a tag.
    pub fn has_rewrites(&self) -> bool {
        self.omit_redundant_name
            || self.transform_namespace
            || self.sort_options
            || self.derive_secondary_from_primary
            || self.hide_internal_types
            || self.derive_omit_empty
            || self.add_omit_empty_for_optional
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
    InvalidCombo {
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid value for '{field}': {message}")
            }
            ValidationIssue::InvalidCombo { message } => {
                write!(f, "invalid configuration: {message}")
            }
        }
    }
}
