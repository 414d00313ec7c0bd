//! Settings files: where they are looked for and how they are parsed.

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::ParseFailure;
use super::{ConfigError, Value};

/// Turns the text of a settings file into a [`Value`], normally a mapping.
pub trait Parser: fmt::Debug {
    fn parse(&self, text: &str) -> Result<Value, ParseFailure>;
}

/// Restricted YAML: plain scalars, sequences, and mappings only. A document
/// that tags a node (`!Type ...`) is rejected, never interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

impl Parser for Yaml {
    fn parse(&self, text: &str) -> Result<Value, ParseFailure> {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

impl Parser for Toml {
    fn parse(&self, text: &str) -> Result<Value, ParseFailure> {
        Ok(toml::from_str(text)?)
    }
}

/// The conventional search path for `app`, lowest priority first:
/// `/etc/<app>.yaml`, `~/.<app>.yaml`, then `conf/<app>.yaml` under the
/// working directory. Locations that cannot be determined are left out.
pub fn conventional_search_paths(app: &str) -> Vec<PathBuf> {
    let mut paths = vec![Path::new("/etc").join(format!("{app}.yaml"))];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{app}.yaml")));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("conf").join(format!("{app}.yaml")));
    }
    paths
}

/// Reads and parses a settings file.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub(crate) fn read_config_file(
    path: &Path,
    parser: &dyn Parser,
) -> Result<Option<Value>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let value = parser
                .parse(&contents)
                .map_err(|source| ConfigError::ParseError {
                    path: path.to_path_buf(),
                    source,
                })?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
