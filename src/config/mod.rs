//! Declarative settings types and the engine that loads and merges them.

mod builder;
mod descriptor;
mod env;
mod error;
mod file;
mod path;
mod schema;
mod settings;
mod value;

#[cfg(test)]
mod test_support;

pub use builder::SchemaBuilder;
pub use descriptor::{Descriptor, SettingDescriptor, Slots};
pub use env::environ_setting;
pub use error::{Advisory, ConfigError, ParseFailure};
pub use file::{conventional_search_paths, Parser, Toml, Yaml};
pub use path::PathSetting;
pub use schema::Schema;
pub use settings::{Options, Settings};
pub use value::{Mapping, Value};
