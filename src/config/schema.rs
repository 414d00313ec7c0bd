use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::builder::SchemaBuilder;
use super::descriptor::Descriptor;
use super::env::EnvOverlay;
use super::file::{read_config_file, Parser, Yaml};
use super::{ConfigError, Settings, Value};

/// A settings type: its defaults, descriptor slots, methods, and the files
/// it is loaded from.
///
/// A schema is immutable once built. Each [`load`](Self::load) or
/// [`instantiate`](Self::instantiate) produces a fresh [`Settings`] that
/// starts from these defaults.
///
/// ```no_run
/// use dragon_settings::{environ_setting, Schema};
///
/// let database = Schema::builder("Database")
///     .setting("host", "localhost")
///     .setting("port", 5432)
///     .setting("password", environ_setting("DATABASE_PASSWORD", Some(""), true)?)
///     .build();
///
/// let app = Schema::builder("App")
///     .with_search_path("/etc/myapp.yaml")
///     .with_search_path("conf/myapp.yaml")
///     .setting("debug", true)
///     .setting("database", database.instantiate())
///     .build();
///
/// let settings = app.load()?;
/// assert_eq!(settings["database"]["port"], 5432);
/// # Ok::<(), dragon_settings::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct Schema {
    pub(super) name: String,
    pub(super) search_paths: Vec<PathBuf>,
    pub(super) env: Option<EnvOverlay>,
    pub(super) defaults: BTreeMap<String, Value>,
    pub(super) slots: BTreeMap<String, Arc<dyn Descriptor>>,
    pub(super) methods: BTreeMap<String, Method>,
}

impl Schema {
    /// Starts declaring a new settings type called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Starts a subtype that inherits every declaration of `self`.
    pub fn extend(&self, name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::extending(name, self)
    }

    /// The type name given to the builder.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Files consulted by [`load`](Self::load), lowest priority first.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// The declared default for `name`, if it is a plain setting.
    pub fn default_value(&self, name: &str) -> Option<&Value> {
        self.defaults.get(&setting_key(name))
    }

    /// The descriptor declared under `name`, if any.
    pub fn descriptor(&self, name: &str) -> Option<&dyn Descriptor> {
        self.slots.get(&setting_key(name)).map(|d| &**d)
    }

    /// A fresh instance holding only the declared defaults.
    pub fn instantiate(self: &Arc<Self>) -> Settings {
        Settings::new(self)
    }

    /// Instantiates and merges every search path that exists, in order, then
    /// the environment overlay if one was declared.
    pub fn load(self: &Arc<Self>) -> Result<Settings, ConfigError> {
        self.load_with(&Yaml)
    }

    /// Like [`load`](Self::load), parsing files with `parser`.
    pub fn load_with(self: &Arc<Self>, parser: &dyn Parser) -> Result<Settings, ConfigError> {
        let mut settings = self.instantiate();

        for path in &self.search_paths {
            if let Some(conf) = read_config_file(path, parser)? {
                debug!(schema = %self.name, path = %path.display(), "merging settings file");
                settings.configure(&conf)?;
            }
        }

        if let Some(env) = &self.env {
            settings.configure(&env.collect())?;
        }

        Ok(settings)
    }
}

pub(crate) type MethodFn = dyn Fn(&Settings) -> Value + Send + Sync;

/// A callable declared on a schema. Never visible as a setting.
#[derive(Clone)]
pub(crate) struct Method(pub(super) Arc<MethodFn>);

impl Method {
    pub(super) fn call(&self, settings: &Settings) -> Value {
        (self.0)(settings)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Method(..)")
    }
}

/// Names starting with an underscore, or written entirely in upper case, are
/// reserved: they are stored but never surface as settings.
pub(crate) fn is_reserved(name: &str) -> bool {
    name.starts_with('_')
        || (name.chars().any(char::is_uppercase) && !name.chars().any(char::is_lowercase))
}

/// Storage key for a setting name. Settings are case-insensitive and stored
/// lower-cased; reserved names are kept verbatim.
pub(crate) fn setting_key(name: &str) -> String {
    if is_reserved(name) {
        name.to_owned()
    } else {
        name.to_lowercase()
    }
}
