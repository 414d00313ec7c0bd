use crate::config::ConfigError;
use thiserror::Error;

/// Errors from the application-facing surface: loading settings into an
/// [`AppContext`](crate::AppContext) or building one.
///
/// Lower-level operations on a [`Settings`](crate::Settings) return
/// [`ConfigError`] directly; `?` lifts them into this type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Declaring, loading, or merging settings failed.
    #[error("settings error: {0}")]
    Config(#[from] ConfigError),

    /// [`AppContextBuilder::build`](crate::context::AppContextBuilder::build)
    /// was called before any settings were attached or loaded.
    #[error("application context built without settings; call load() or with_settings() first")]
    MissingSettings,
}
