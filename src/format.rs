//! Post-rewrite formatter (`gofmt -w` by default).

use crate::config::FormatterSettings;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to spawn formatter '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("formatter '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("formatter '{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("I/O error while waiting for formatter: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs an external formatter on one file at a time, with a time limit.
#[derive(Debug, Clone)]
pub struct Formatter {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Formatter {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    /// Build from settings; `None` when formatting is disabled.
    pub fn from_settings(settings: &FormatterSettings) -> Option<Self> {
        settings.enabled.then(|| {
            Self::new(
                settings.command.clone(),
                settings.args.clone(),
                settings.timeout(),
            )
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run `command args... path`, killing the child once the timeout passes.
    pub fn run(&self, path: &Path) -> Result<(), FormatError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FormatError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Drained while the child runs so a chatty formatter cannot fill the pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                // The child may have exited between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(FormatError::Timeout {
                    command: self.command.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        if status.success() {
            tracing::debug!(command = %self.command, file = %path.display(), "formatter finished");
            return Ok(());
        }

        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        Err(FormatError::Failed {
            command: self.command.clone(),
            status,
            stderr: stderr.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_settings_yield_no_formatter() {
        let settings = FormatterSettings {
            enabled: false,
            ..Default::default()
        };
        assert!(Formatter::from_settings(&settings).is_none());
        let formatter = Formatter::from_settings(&FormatterSettings::default()).unwrap();
        assert_eq!(formatter.command(), "gofmt");
    }

    #[test]
    fn test_missing_command_is_spawn_error() {
        let formatter = Formatter::new(
            "go-retag-no-such-formatter",
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = formatter.run(Path::new("x.go")).unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_and_failure_status() {
        let ok = Formatter::new("true", Vec::new(), Duration::from_secs(5));
        assert!(ok.run(Path::new("x.go")).is_ok());
        let failing = Formatter::new("false", Vec::new(), Duration::from_secs(5));
        assert!(matches!(
            failing.run(Path::new("x.go")),
            Err(FormatError::Failed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_stderr_reported_as_failure() {
        // Well past a pipe buffer before exiting non-zero.
        let noisy = Formatter::new(
            "sh",
            vec![
                "-c".to_string(),
                "head -c 200000 /dev/zero | tr '\\0' x >&2; exit 3".to_string(),
            ],
            Duration::from_secs(5),
        );
        match noisy.run(Path::new("x.go")) {
            Err(FormatError::Failed { stderr, .. }) => assert_eq!(stderr.len(), 200000),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let slow = Formatter::new("sleep", vec!["5".to_string()], Duration::from_millis(100));
        let started = Instant::now();
        let err = slow.run(Path::new("1")).unwrap_err();
        assert!(matches!(err, FormatError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
