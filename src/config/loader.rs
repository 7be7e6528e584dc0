use crate::config::schema::{
    FormatterSettings, OptimizationPolicy, Preset, RetagConfig, RunSettings, ValidationError,
};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    /// Both a `preset` key and a `[policy]` table were given.
    PresetConflict {
        path: Option<PathBuf>,
        preset: Preset,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            ConfigError::PresetConflict { path: None, preset } => ConfigError::PresetConflict {
                path: Some(path),
                preset,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse config TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid config ({}): {}", path.display(), source),
                None => write!(f, "invalid config: {}", source),
            },
            ConfigError::PresetConflict { path, preset } => {
                let preset = match preset {
                    Preset::None => "none",
                    Preset::Complete => "complete",
                };
                match path {
                    Some(path) => write!(
                        f,
                        "config ({}) sets both preset = \"{}\" and a [policy] table",
                        path.display(),
                        preset
                    ),
                    None => write!(
                        f,
                        "config sets both preset = \"{}\" and a [policy] table",
                        preset
                    ),
                }
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::PresetConflict { .. } => None,
        }
    }
}

/// On-disk layout. The policy comes either from `preset` or from `[policy]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    preset: Option<Preset>,
    policy: Option<OptimizationPolicy>,
    #[serde(default)]
    run: RunSettings,
    #[serde(default)]
    formatter: FormatterSettings,
}

impl ConfigFile {
    fn resolve(self) -> Result<RetagConfig, ConfigError> {
        let policy = match (self.preset, self.policy) {
            (Some(preset), Some(_)) => {
                return Err(ConfigError::PresetConflict { path: None, preset })
            }
            (Some(preset), None) => OptimizationPolicy::from_preset(preset),
            (None, policy) => policy.unwrap_or_default(),
        };
        Ok(RetagConfig {
            policy,
            run: self.run,
            formatter: self.formatter,
        })
    }
}

pub fn load_from_str(input: &str) -> Result<RetagConfig, ConfigError> {
    let file: ConfigFile = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    let config = file.resolve()?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RetagConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}
