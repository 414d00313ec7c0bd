//! Named slots with custom read, write, and clear behavior.
//!
//! A descriptor is declared once per settings type and keeps no per-instance
//! state of its own: every owner carries a [`Slots`] store, and the descriptor
//! keys its entries there by its label. The label is assigned when the owning
//! type is built (see [`SchemaBuilder::build`](super::SchemaBuilder::build));
//! a descriptor that never went through that step refuses every operation.

use std::collections::BTreeMap;
use std::fmt;

use super::{ConfigError, Value};

pub trait Descriptor: fmt::Debug + Send + Sync {
    fn label(&self) -> Option<&str>;

    fn set_label(&mut self, label: String);

    /// Reads the owner's value. `Ok(None)` means unset and not required.
    fn read<'a>(&'a self, slots: &'a Slots) -> Result<Option<&'a Value>, ConfigError>;

    fn write(&self, slots: &mut Slots, raw: Value) -> Result<(), ConfigError>;

    fn clear(&self, slots: &mut Slots) -> Result<(), ConfigError>;

    fn require_label(&self) -> Result<&str, ConfigError> {
        self.label().ok_or(ConfigError::UnlabeledDescriptor)
    }
}

/// Per-owner descriptor storage. Dropping the owner drops its entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slots {
    entries: BTreeMap<String, SlotEntry>,
}

#[derive(Debug, Clone, PartialEq)]
struct SlotEntry {
    value: Value,
    original: Option<String>,
}

impl Slots {
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.entries.get(label).map(|entry| &entry.value)
    }

    /// The unprocessed input a descriptor was last written with, if it kept one.
    pub fn original(&self, label: &str) -> Option<&str> {
        self.entries.get(label)?.original.as_deref()
    }

    pub fn insert(&mut self, label: &str, value: Value, original: Option<String>) {
        self.entries
            .insert(label.to_owned(), SlotEntry { value, original });
    }

    pub fn remove(&mut self, label: &str) -> Option<Value> {
        self.entries.remove(label).map(|entry| entry.value)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }
}

/// The base descriptor: stores whatever it is given and reads back `None`
/// until written.
#[derive(Debug, Clone, Default)]
pub struct SettingDescriptor {
    label: Option<String>,
}

impl SettingDescriptor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Descriptor for SettingDescriptor {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }

    fn read<'a>(&'a self, slots: &'a Slots) -> Result<Option<&'a Value>, ConfigError> {
        let label = self.require_label()?;
        Ok(slots.get(label))
    }

    fn write(&self, slots: &mut Slots, raw: Value) -> Result<(), ConfigError> {
        let label = self.require_label()?;
        slots.insert(label, raw, None);
        Ok(())
    }

    fn clear(&self, slots: &mut Slots) -> Result<(), ConfigError> {
        let label = self.require_label()?;
        slots.remove(label);
        Ok(())
    }
}
