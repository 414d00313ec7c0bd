use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::descriptor::Descriptor;
use super::env::EnvOverlay;
use super::schema::{setting_key, Method, Schema};
use super::{Settings, Value};

/// Builder for declaring a settings type.
///
/// Every declaration is keyed case-insensitively, and a later declaration of
/// a name replaces an earlier one of any kind. [`build`](Self::build) is the
/// registration step: it stamps each descriptor declared on this builder with
/// the name it was declared under, so the descriptor can key its per-instance
/// storage. Descriptors inherited through [`Schema::extend`] keep the label
/// their own type gave them.
///
/// ## Example
///
/// ```no_run
/// use dragon_settings::{PathSetting, Schema, Value};
///
/// let base = Schema::builder("Base")
///     .setting("debug", false)
///     .descriptor("datadir", PathSetting::new().default_value("/tmp/data"))
///     .build();
///
/// let app = base
///     .extend("App")
///     .with_search_path("/etc/app.yaml")
///     .setting("workers", 4)
///     .setting("SCHEMA_VERSION", 2)
///     .method("summary", |s| Value::from(format!("{} workers", s["workers"])))
///     .build();
///
/// let settings = app.load()?;
/// # Ok::<(), dragon_settings::ConfigError>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct SchemaBuilder {
    name: String,
    search_paths: Vec<PathBuf>,
    env: Option<EnvOverlay>,
    defaults: BTreeMap<String, Value>,
    inherited: BTreeMap<String, Arc<dyn Descriptor>>,
    declared: BTreeMap<String, Box<dyn Descriptor>>,
    methods: BTreeMap<String, Method>,
}

impl SchemaBuilder {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            search_paths: Vec::new(),
            env: None,
            defaults: BTreeMap::new(),
            inherited: BTreeMap::new(),
            declared: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }

    pub(super) fn extending(name: impl Into<String>, parent: &Schema) -> Self {
        Self {
            name: name.into(),
            search_paths: parent.search_paths.clone(),
            env: parent.env.clone(),
            defaults: parent.defaults.clone(),
            inherited: parent.slots.clone(),
            declared: BTreeMap::new(),
            methods: parent.methods.clone(),
        }
    }

    /// Adds a file to the search path.
    ///
    /// Files are merged in registration order, so later files override
    /// earlier ones. Files that do not exist are skipped.
    pub fn with_search_path(mut self, path: impl AsRef<Path>) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.search_paths
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Drops every search path declared so far, including inherited ones.
    pub fn without_search_paths(mut self) -> Self {
        self.search_paths.clear();
        self
    }

    /// Applies prefixed environment variables after all files.
    ///
    /// `MYAPP__DATABASE__HOST=db` with prefix `MYAPP` and separator `__`
    /// overrides `database.host`. Path segments are lower-cased and values are
    /// coerced to the most specific of boolean, integer, float, or string.
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.env = Some(EnvOverlay::new(prefix, separator));
        self
    }

    /// Declares a setting and its default value.
    ///
    /// A [`Settings`] default becomes a nested section: every instance gets
    /// its own copy, and merged mappings update it key by key instead of
    /// replacing it. Upper-case and underscore-prefixed names are stored as
    /// constants (see [`Settings::constant`]).
    pub fn setting(mut self, name: &str, value: impl Into<Value>) -> Self {
        let key = self.forget(name);
        self.defaults.insert(key, value.into());
        self
    }

    pub fn descriptor(mut self, name: &str, descriptor: impl Descriptor + 'static) -> Self {
        let key = self.forget(name);
        self.declared.insert(key, Box::new(descriptor));
        self
    }

    /// Declares a callable. It can be invoked with [`Settings::call`] but is
    /// never visible as a setting.
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Settings) -> Value + Send + Sync + 'static,
    {
        let key = self.forget(name);
        self.methods.insert(key, Method(Arc::new(f)));
        self
    }

    pub fn build(self) -> Arc<Schema> {
        let mut slots = self.inherited;
        for (name, mut descriptor) in self.declared {
            if descriptor.label().is_none() {
                descriptor.set_label(name.clone());
            }
            slots.insert(name, Arc::from(descriptor));
        }

        Arc::new(Schema {
            name: self.name,
            search_paths: self.search_paths,
            env: self.env,
            defaults: self.defaults,
            slots,
            methods: self.methods,
        })
    }

    fn forget(&mut self, name: &str) -> String {
        let key = setting_key(name);
        self.defaults.remove(&key);
        self.inherited.remove(&key);
        self.declared.remove(&key);
        self.methods.remove(&key);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathSetting, SettingDescriptor};

    #[test]
    fn test_descriptors_are_labeled() {
        let schema = Schema::builder("Mock")
            .descriptor("test_setting", SettingDescriptor::new())
            .descriptor("Standard_Path", PathSetting::new())
            .build();

        assert_eq!(
            schema.descriptor("test_setting").and_then(|d| d.label()),
            Some("test_setting")
        );
        assert_eq!(
            schema.descriptor("standard_path").and_then(|d| d.label()),
            Some("standard_path")
        );
    }

    #[test]
    fn test_existing_label_is_kept() {
        let mut descriptor = SettingDescriptor::new();
        descriptor.set_label("stored_as".to_owned());

        let schema = Schema::builder("Mock")
            .descriptor("declared_as", descriptor)
            .build();
        assert_eq!(
            schema.descriptor("declared_as").and_then(|d| d.label()),
            Some("stored_as")
        );
    }

    #[test]
    fn test_subtype_labels_its_own_descriptors() {
        let parent = Schema::builder("Mock")
            .descriptor("test_setting", SettingDescriptor::new())
            .build();
        let child = parent
            .extend("SubMock")
            .descriptor("subtest_setting", SettingDescriptor::new())
            .build();

        assert_eq!(
            child.descriptor("test_setting").and_then(|d| d.label()),
            Some("test_setting")
        );
        assert_eq!(
            child.descriptor("subtest_setting").and_then(|d| d.label()),
            Some("subtest_setting")
        );
        assert!(parent.descriptor("subtest_setting").is_none());
    }

    #[test]
    fn test_inherited_descriptor_is_shared_not_relabeled() {
        let parent = Schema::builder("Mock")
            .descriptor("test_setting", SettingDescriptor::new())
            .build();
        let child = parent.extend("SubMock").setting("other", 1).build();

        let from_parent = parent.descriptor("test_setting").unwrap();
        let from_child = child.descriptor("test_setting").unwrap();
        assert!(std::ptr::addr_eq(from_parent, from_child));
    }

    #[test]
    fn test_later_declaration_replaces_earlier() {
        let schema = Schema::builder("Mock")
            .setting("value", 1)
            .descriptor("VALUE", SettingDescriptor::new())
            .build();

        assert!(schema.default_value("value").is_none());
        assert!(schema.descriptor("value").is_some());

        let child = schema.extend("Child").setting("value", 2).build();
        assert!(child.descriptor("value").is_none());
        assert_eq!(child.default_value("value"), Some(&Value::from(2)));
    }

    #[test]
    fn test_subtype_inherits_search_paths_and_defaults() {
        let parent = Schema::builder("Base")
            .with_search_path("/etc/base.yaml")
            .setting("debug", false)
            .build();
        let child = parent
            .extend("App")
            .with_search_path("/etc/app.yaml")
            .build();

        assert_eq!(child.search_paths().len(), 2);
        assert_eq!(child.default_value("debug"), Some(&Value::from(false)));

        let reset = parent.extend("Isolated").without_search_paths().build();
        assert!(reset.search_paths().is_empty());
    }
}
