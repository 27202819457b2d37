//! Structured logging handle.
//!
//! There is no process-wide logger. A [`Logger`] owns a `tracing`
//! dispatcher and is passed to the [`Program`](crate::Program) and
//! [`Executor`](crate::Executor) explicitly; every thread they spawn enters
//! it with [`Logger::enter`], so events land in the right subscriber even
//! when several programs share a process.
//!
//! Output goes to stderr by default, or to a file. The terminal backend
//! owns the screen, so a log file is the useful choice there.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::dispatcher::{self, DefaultGuard};
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Enables debug level when set to any non-empty value.
pub const DEBUG_ENV: &str = "BUBBLEGUM_DEBUG";
/// `off` disables logging, `json` selects JSON output.
pub const LOG_ENV: &str = "BUBBLEGUM_LOG";
/// Path of a file to append log lines to instead of stderr.
pub const LOG_FILE_ENV: &str = "BUBBLEGUM_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Master switch. A disabled logger discards everything.
    pub enabled: bool,
    /// Most verbose level recorded.
    pub level: LevelFilter,
    /// Output format.
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LevelFilter::INFO,
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl LogConfig {
    /// Read settings from `BUBBLEGUM_DEBUG`, `BUBBLEGUM_LOG` and
    /// `BUBBLEGUM_LOG_FILE`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if get(DEBUG_ENV).is_some_and(|v| !v.is_empty()) {
            config.level = LevelFilter::DEBUG;
        }
        match get(LOG_ENV).as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("off") => config.enabled = false,
            Some(v) if v.eq_ignore_ascii_case("json") => config.format = LogFormat::Json,
            _ => {}
        }
        config.file = get(LOG_FILE_ENV).filter(|v| !v.is_empty()).map(PathBuf::from);
        config
    }

    /// Same settings at a different level (builder pattern).
    #[must_use]
    pub const fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Same settings with a different format (builder pattern).
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// A cloneable logging handle.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Build a logger from explicit settings.
    ///
    /// Fails only if the configured log file cannot be opened.
    pub fn new(config: &LogConfig) -> std::io::Result<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let filter = EnvFilter::default().add_directive(config.level.into());
        let registry = tracing_subscriber::registry().with(filter);
        let debug = config.level >= LevelFilter::DEBUG;

        let dispatch = match (&config.file, config.format) {
            (None, LogFormat::Text) => Dispatch::new(
                registry.with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_names(true)
                        .with_file(debug)
                        .with_line_number(debug),
                ),
            ),
            (None, LogFormat::Json) => {
                Dispatch::new(registry.with(fmt::layer().json().with_writer(std::io::stderr)))
            }
            (Some(path), LogFormat::Text) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Dispatch::new(
                    registry.with(
                        fmt::layer()
                            .with_writer(Mutex::new(file))
                            .with_ansi(false)
                            .with_target(true)
                            .with_thread_names(true)
                            .with_file(debug)
                            .with_line_number(debug),
                    ),
                )
            }
            (Some(path), LogFormat::Json) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Dispatch::new(registry.with(fmt::layer().json().with_writer(Mutex::new(file))))
            }
        };

        Ok(Self { dispatch })
    }

    /// A logger that records nothing.
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Build a logger from the environment.
    ///
    /// If the log file cannot be opened, falls back to stderr.
    pub fn from_env() -> Self {
        let config = LogConfig::from_env();
        match Self::new(&config) {
            Ok(logger) => logger,
            Err(err) => {
                let fallback = LogConfig {
                    file: None,
                    ..config
                };
                let logger = Self::new(&fallback).unwrap_or_else(|_| Self::disabled());
                logger.in_scope(|| tracing::warn!(error = %err, "cannot open log file, using stderr"));
                logger
            }
        }
    }

    /// Wrap an existing dispatcher, e.g. one carrying a test subscriber.
    pub const fn from_dispatch(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Make this logger the current thread's default until the guard drops.
    #[must_use = "the logger is only active while the guard is alive"]
    pub fn enter(&self) -> DefaultGuard {
        dispatcher::set_default(&self.dispatch)
    }

    /// Run `f` with this logger as the current default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }

    /// The underlying dispatcher.
    pub const fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::from_env()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> LogConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LogConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn log_format_default() {
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }

    #[test]
    fn config_defaults_without_env() {
        let config = config_from(&[]);
        assert!(config.enabled);
        assert_eq!(config.level, LevelFilter::INFO);
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.file.is_none());
    }

    #[test]
    fn debug_env_raises_level() {
        assert_eq!(config_from(&[(DEBUG_ENV, "1")]).level, LevelFilter::DEBUG);
        assert_eq!(config_from(&[(DEBUG_ENV, "")]).level, LevelFilter::INFO);
    }

    #[test]
    fn log_env_selects_format_or_disables() {
        assert!(!config_from(&[(LOG_ENV, "off")]).enabled);
        assert_eq!(config_from(&[(LOG_ENV, "JSON")]).format, LogFormat::Json);
        assert_eq!(
            config_from(&[(LOG_FILE_ENV, "/tmp/x.log")]).file,
            Some(PathBuf::from("/tmp/x.log"))
        );
    }

    #[test]
    fn disabled_logger_builds_without_io() {
        let logger = Logger::new(&LogConfig {
            enabled: false,
            file: Some(PathBuf::from("/nonexistent/dir/never-opened.log")),
            ..LogConfig::default()
        });
        assert!(logger.is_ok());
    }

    #[test]
    fn missing_log_directory_is_an_error() {
        let config = LogConfig {
            file: Some(PathBuf::from("/nonexistent/dir/bubblegum.log")),
            ..LogConfig::default()
        };
        assert!(Logger::new(&config).is_err());
    }

    #[test]
    fn in_scope_returns_closure_value() {
        let logger = Logger::disabled();
        let value = logger.in_scope(|| {
            tracing::info!("swallowed");
            7
        });
        assert_eq!(value, 7);
        let _guard = logger.enter();
        tracing::debug!("also swallowed");
    }
}
