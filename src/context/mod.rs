//! Application context owning the loaded settings.

use std::sync::Arc;

use crate::config::{Schema, Settings};
use crate::Error;

/// Central application context holding the settings loaded at startup.
///
/// Built once by the caller and passed to whatever needs configuration,
/// instead of a process-wide global.
///
/// ## Example
///
/// ```no_run
/// use dragon_settings::{AppContext, Schema};
///
/// let schema = Schema::builder("AppConfiguration")
///     .with_search_path("conf/app.yaml")
///     .setting("workers", 4)
///     .build();
///
/// let ctx = AppContext::builder().load(&schema)?.build()?;
/// let workers = &ctx.settings()["workers"];
/// # Ok::<(), dragon_settings::Error>(())
/// ```
#[derive(Debug)]
pub struct AppContext {
    settings: Settings,
}

impl AppContext {
    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder { settings: None }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Consumes the context, handing back ownership of the settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

/// Builder for constructing an [`AppContext`].
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    settings: Option<Settings>,
}

impl AppContextBuilder {
    /// Attaches settings that were loaded or assembled elsewhere.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Loads `schema` from its search paths and attaches the result.
    pub fn load(self, schema: &Arc<Schema>) -> Result<Self, Error> {
        Ok(self.with_settings(schema.load()?))
    }

    /// Builds the `AppContext`.
    ///
    /// Returns an error if no settings were provided.
    pub fn build(self) -> Result<AppContext, Error> {
        Ok(AppContext {
            settings: self.settings.ok_or(Error::MissingSettings)?,
        })
    }
}
