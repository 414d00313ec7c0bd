//! Class-style application settings: declared defaults, layered YAML files,
//! environment lookups, and validated filesystem paths.
//!
//! ```no_run
//! use dragon_settings::{environ_setting, AppContext, PathSetting, Schema};
//!
//! let database = Schema::builder("DatabaseConfiguration")
//!     .setting("host", "localhost")
//!     .setting("port", 5432)
//!     .setting("password", environ_setting("DATABASE_PASSWORD", None, false)?)
//!     .build();
//!
//! let app = Schema::builder("AppConfiguration")
//!     .with_search_path("/etc/myapp.yaml")
//!     .with_search_path("conf/myapp.yaml")
//!     .setting("debug", false)
//!     .setting("database", database.instantiate())
//!     .descriptor("logs", PathSetting::new().mkdirs(true))
//!     .build();
//!
//! let ctx = AppContext::builder().load(&app)?.build()?;
//! println!("{}", ctx.settings());
//! # Ok::<(), dragon_settings::Error>(())
//! ```

pub mod config;
pub mod context;
mod error;

pub use config::{
    environ_setting, ConfigError, Mapping, PathSetting, Schema, SchemaBuilder, Settings, Value,
};
pub use context::AppContext;
pub use error::Error;
