use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Error produced by a [`Parser`](super::Parser) collaborator.
pub type ParseFailure = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("the {0} environment variable is not set")]
    MissingEnvVar(String),

    #[error("the '{0}' path setting is not set")]
    MissingPath(String),

    #[error("path at '{0}' does not exist")]
    PathNotFound(PathBuf),

    #[error("{type_name} has no setting '{key}'")]
    UnknownKey { type_name: String, key: String },

    #[error("descriptor has no label; declare it through a schema builder")]
    UnlabeledDescriptor,

    #[error("cannot merge {found} into '{target}', expected a mapping")]
    NotAMapping { target: String, found: &'static str },

    #[error("path setting '{label}' expects a string, found {found}")]
    InvalidPath { label: String, found: &'static str },

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError { path: PathBuf, source: ParseFailure },

    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot resolve the working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

impl ConfigError {
    /// Returns `true` for the "missing required value" family: an unset
    /// required environment variable, an unset required path, or a path that
    /// is still absent after the creation attempt.
    pub fn is_missing_required(&self) -> bool {
        matches!(
            self,
            Self::MissingEnvVar(_) | Self::MissingPath(_) | Self::PathNotFound(_)
        )
    }
}

/// Non-fatal diagnostics. These are reported through `tracing` and never
/// interrupt the operation that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Advisory {
    #[error("the {0} environment variable is not set")]
    MissingSetting(String),

    #[error("path at '{0}' does not exist")]
    PathNotFound(PathBuf),
}

impl Advisory {
    pub(crate) fn emit(&self) {
        warn!(advisory = self.kind(), "{}", self);
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::MissingSetting(_) => "missing_setting",
            Self::PathNotFound(_) => "path_not_found",
        }
    }
}
