use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use super::descriptor::Slots;
use super::schema::{is_reserved, setting_key, Schema};
use super::{ConfigError, Mapping, Value};

const REPORT_WIDTH: usize = 76;
const KEY_WIDTH: usize = 10;

static NULL: Value = Value::Null;

/// An instance of a settings type.
///
/// Keys are case-insensitive. Reads resolve, in order, through the type's
/// descriptor slots, values assigned on this instance, and the type's
/// defaults. Reserved names (a leading underscore, or all upper-case) and
/// methods are never visible as settings.
#[derive(Clone)]
pub struct Settings {
    schema: Arc<Schema>,
    values: BTreeMap<String, Value>,
    slots: Slots,
}

impl Settings {
    /// Nested section defaults are copied into the instance so merges never
    /// touch the schema or a sibling instance.
    pub fn new(schema: &Arc<Schema>) -> Self {
        let values = schema
            .defaults
            .iter()
            .filter(|(_, value)| matches!(value, Value::Section(_)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            schema: Arc::clone(schema),
            values,
            slots: Slots::default(),
        }
    }

    /// The settings type this instance was created from.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Name of the settings type, as used in error messages.
    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    /// Indexed access.
    ///
    /// Fails with [`ConfigError::UnknownKey`] when `key` is not a visible
    /// setting, and with the descriptor's error when a descriptor slot cannot
    /// be read. A setting explicitly holding `Null` is returned as such.
    pub fn lookup(&self, key: &str) -> Result<&Value, ConfigError> {
        let key = key.to_lowercase();
        if !key.starts_with('_') {
            if let Some(descriptor) = self.schema.slots.get(&key) {
                return Ok(descriptor.read(&self.slots)?.unwrap_or(&NULL));
            }
            if let Some(value) = self
                .values
                .get(&key)
                .or_else(|| self.schema.defaults.get(&key))
            {
                return Ok(value);
            }
        }

        Err(ConfigError::UnknownKey {
            type_name: self.schema.name.clone(),
            key,
        })
    }

    /// Returns the setting, or `None` when it is unknown, unset, or cannot be
    /// read. Never fails.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.lookup(key).ok().filter(|value| !value.is_null())
    }

    /// Like [`get`](Self::get), falling back to `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// Whether `key` names an active setting.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The nested settings under `key`, if that setting is a section.
    pub fn section(&self, key: &str) -> Option<&Settings> {
        self.get(key)?.as_section()
    }

    /// Mutable access to a nested section held by this instance.
    pub fn section_mut(&mut self, key: &str) -> Option<&mut Settings> {
        let key = key.to_lowercase();
        if key.starts_with('_') || self.schema.slots.contains_key(&key) {
            return None;
        }
        self.values.get_mut(&key)?.as_section_mut()
    }

    /// Reads a reserved name. Only exact spellings match.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        if !is_reserved(name) {
            return None;
        }
        self.values
            .get(name)
            .or_else(|| self.schema.defaults.get(name))
    }

    /// The unprocessed value last written to a descriptor slot.
    pub fn original(&self, key: &str) -> Option<&str> {
        let descriptor = self.schema.slots.get(&key.to_lowercase())?;
        self.slots.original(descriptor.label()?)
    }

    /// Invokes a method declared on the schema.
    pub fn call(&self, name: &str) -> Result<Value, ConfigError> {
        match self.schema.methods.get(&name.to_lowercase()) {
            Some(method) => Ok(method.call(self)),
            None => Err(ConfigError::UnknownKey {
                type_name: self.schema.name.clone(),
                key: name.to_lowercase(),
            }),
        }
    }

    /// Assigns a setting on this instance. Descriptor slots run their own
    /// write logic; any other name, declared or not, is stored as given.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let key = setting_key(key);
        let value = value.into();
        match self.schema.slots.get(&key) {
            Some(descriptor) => descriptor.write(&mut self.slots, value),
            None => {
                self.values.insert(key, value);
                Ok(())
            }
        }
    }

    /// Removes this instance's value so the declared default shows through
    /// again. A nested section is reset to a fresh copy of its default.
    pub fn clear(&mut self, key: &str) -> Result<(), ConfigError> {
        let key = setting_key(key);
        match self.schema.slots.get(&key) {
            Some(descriptor) => descriptor.clear(&mut self.slots),
            None => {
                match self.schema.defaults.get(&key) {
                    Some(section @ Value::Section(_)) => {
                        self.values.insert(key, section.clone());
                    }
                    _ => {
                        self.values.remove(&key);
                    }
                }
                Ok(())
            }
        }
    }

    /// Merges `conf` into this instance.
    ///
    /// `conf` may be a mapping or another settings instance. An empty value
    /// of any kind (see [`Value::is_empty`]) is a no-op. Keys naming an
    /// existing nested section are merged into it recursively; every other
    /// key is assigned with [`set`](Self::set), whether or not it was
    /// declared. An empty sequence or mapping replaces a non-empty plain
    /// value, but merging one into a section changes nothing.
    pub fn configure(&mut self, conf: &Value) -> Result<(), ConfigError> {
        match conf {
            empty if empty.is_empty() => Ok(()),
            Value::Mapping(map) => {
                for (key, value) in map {
                    self.merge_entry(key, value)?;
                }
                Ok(())
            }
            Value::Section(other) => self.configure_from(other),
            other => Err(ConfigError::NotAMapping {
                target: self.schema.name.clone(),
                found: other.kind(),
            }),
        }
    }

    /// Merges the active settings of `other`, as listed by its
    /// [`options`](Self::options).
    pub fn configure_from(&mut self, other: &Settings) -> Result<(), ConfigError> {
        for (key, value) in other.to_mapping() {
            self.merge_entry(&key, &value)?;
        }
        Ok(())
    }

    fn merge_entry(&mut self, key: &str, value: &Value) -> Result<(), ConfigError> {
        let key = setting_key(key);

        if !self.schema.slots.contains_key(&key) {
            if let Some(Value::Section(nested)) = self.values.get_mut(&key) {
                return match value {
                    Value::Mapping(_) | Value::Section(_) => nested.configure(value),
                    empty if empty.is_empty() => Ok(()),
                    other => Err(ConfigError::NotAMapping {
                        target: key,
                        found: other.kind(),
                    }),
                };
            }
        }

        self.set(&key, value.clone())
    }

    /// Active settings as `(name, value)` pairs, sorted by name.
    ///
    /// Covers declared defaults, descriptor slots, and values assigned on the
    /// instance, skipping reserved names, methods, and anything that reads as
    /// unset. Values are resolved lazily; call again to restart.
    pub fn options(&self) -> Options<'_> {
        let names: BTreeSet<&str> = self
            .schema
            .defaults
            .keys()
            .chain(self.schema.slots.keys())
            .chain(self.values.keys())
            .map(String::as_str)
            .filter(|name| !is_reserved(name))
            .collect();

        Options {
            settings: self,
            names: names.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }

    /// Collects [`options`](Self::options) into an owned mapping.
    pub fn to_mapping(&self) -> Mapping {
        self.options()
            .map(|(name, value)| (name.to_owned(), value.clone()))
            .collect()
    }
}

/// Iterator returned by [`Settings::options`].
#[derive(Debug, Clone)]
pub struct Options<'a> {
    settings: &'a Settings,
    names: std::vec::IntoIter<&'a str>,
}

impl<'a> Iterator for Options<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let settings = self.settings;
        self.names
            .by_ref()
            .find_map(|name| settings.get(name).map(|value| (name, value)))
    }
}

impl Index<&str> for Settings {
    type Output = Value;

    /// Panics with the [`ConfigError`] that [`Settings::lookup`] returns.
    fn index(&self, key: &str) -> &Value {
        match self.lookup(key) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name && self.options().eq(other.options())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("type", &self.schema.name)
            .field("values", &self.values)
            .field("slots", &self.slots)
            .finish()
    }
}

/// A `key = value` line per active setting, for diagnostics. Long values are
/// cut short with `...`.
impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.options().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }

            let width = REPORT_WIDTH.saturating_sub(name.len().max(KEY_WIDTH));
            let mut rendered = value.to_string();
            if rendered.chars().count() > width {
                rendered = rendered.chars().take(width.saturating_sub(3)).collect();
                rendered.push_str("...");
            }
            write!(f, "{name:<KEY_WIDTH$} = {rendered}")?;
        }
        Ok(())
    }
}
