use std::path::PathBuf;

use thiserror::Error;

/// Top-level error taxonomy for the styler core.
///
/// Each variant maps to an exit code understood by the CLI binary; see
/// `ExitCode::from` below.
#[derive(Error, Debug)]
pub enum StylerError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {0}", path = .path.display())]
    Parse {
        path: PathBuf,
        errors: Vec<crate::parser::ParseError>,
    },

    #[error("format error in {path} (rule {rule_id}): {message}")]
    Format {
        path: PathBuf,
        rule_id: String,
        message: String,
    },

    #[error("execution timed out after {elapsed_ms}ms in {path}")]
    ExecutionTimeout { path: PathBuf, elapsed_ms: u64 },

    #[error("security limit exceeded in {path}: {0}", path = .path.display())]
    Security { path: PathBuf, detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not find a config file starting from {0}")]
    NotFound(PathBuf),

    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration for rule '{rule_id}': {}", .messages.join("; "))]
    InvalidRuleConfig {
        rule_id: String,
        messages: Vec<String>,
    },

    #[error("unknown rule '{0}' referenced in configuration")]
    UnknownRule(String),
}

/// Process exit codes, per the CLI contract (§6.1 of SPEC_FULL.md).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    ViolationsFound = 1,
    UsageError = 2,
    ConfigError = 3,
    SecurityError = 4,
    IoError = 5,
    InternalError = 6,
    Help = 7,
}

impl From<&StylerError> for ExitCode {
    fn from(err: &StylerError) -> Self {
        match err {
            StylerError::Usage(_) => ExitCode::UsageError,
            StylerError::Config(_) => ExitCode::ConfigError,
            StylerError::Io { .. } => ExitCode::IoError,
            StylerError::Parse { .. } => ExitCode::ViolationsFound,
            StylerError::Format { .. } => ExitCode::InternalError,
            StylerError::ExecutionTimeout { .. } => ExitCode::SecurityError,
            StylerError::Security { .. } => ExitCode::SecurityError,
            StylerError::Internal(_) => ExitCode::InternalError,
        }
    }
}
