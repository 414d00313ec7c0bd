//! Filesystem path settings.
//!
//! On write, a [`PathSetting`] runs the raw string through a fixed pipeline:
//!
//! 1. expand a leading `~` to the home directory
//! 2. expand `$VAR` / `${VAR}` references (unknown variables are left as is)
//! 3. normalize `.` and `..` segments lexically
//! 4. if `absolute`, resolve against the working directory
//!
//! then optionally creates the directory and checks that the result exists.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::descriptor::{Descriptor, Slots};
use super::{Advisory, ConfigError, Value};

/// A descriptor for a path on the local filesystem.
///
/// ```no_run
/// use dragon_settings::{PathSetting, Schema};
///
/// let schema = Schema::builder("App")
///     .descriptor("datadir", PathSetting::new().mkdirs(true))
///     .descriptor("logfile", PathSetting::new().raises(false).required(false))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct PathSetting {
    label: Option<String>,
    default: Option<Value>,
    absolute: bool,
    mkdirs: bool,
    raises: bool,
    required: bool,
}

impl Default for PathSetting {
    fn default() -> Self {
        Self {
            label: None,
            default: None,
            absolute: true,
            mkdirs: false,
            raises: true,
            required: true,
        }
    }
}

impl PathSetting {
    /// A required, absolute path that must exist when assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returned verbatim while the owner has no value. It is not expanded,
    /// normalized, or checked.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(Value::String(default.into()));
        self
    }

    /// Whether relative paths are resolved against the working directory.
    pub fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }

    /// Whether a missing path is created as a directory, parents included.
    pub fn mkdirs(mut self, mkdirs: bool) -> Self {
        self.mkdirs = mkdirs;
        self
    }

    /// Whether a path still missing after the creation attempt is an error
    /// (`true`) or an advisory (`false`).
    pub fn raises(mut self, raises: bool) -> Self {
        self.raises = raises;
        self
    }

    /// Whether reading an unset path without a default is an error.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// See [`absolute`](Self::absolute).
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// See [`mkdirs`](Self::mkdirs).
    pub fn is_mkdirs(&self) -> bool {
        self.mkdirs
    }

    /// See [`raises`](Self::raises).
    pub fn is_raises(&self) -> bool {
        self.raises
    }

    /// See [`required`](Self::required).
    pub fn is_required(&self) -> bool {
        self.required
    }

    fn resolve(&self, raw: &str) -> Result<PathBuf, ConfigError> {
        let expanded = expand(raw, home_dir, |name| {
            std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
        });
        let path = normalize(Path::new(&expanded));
        if self.absolute {
            absolutize(&path)
        } else {
            Ok(path)
        }
    }
}

impl Descriptor for PathSetting {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }

    fn read<'a>(&'a self, slots: &'a Slots) -> Result<Option<&'a Value>, ConfigError> {
        let label = self.require_label()?;
        match slots.get(label).or(self.default.as_ref()) {
            Some(value) => Ok(Some(value)),
            None if self.required => Err(ConfigError::MissingPath(label.to_owned())),
            None => Ok(None),
        }
    }

    fn write(&self, slots: &mut Slots, raw: Value) -> Result<(), ConfigError> {
        let label = self.require_label()?;
        let original = match raw {
            Value::Null => return self.clear(slots),
            Value::String(s) => s,
            Value::Path(p) => p.to_string_lossy().into_owned(),
            other => {
                return Err(ConfigError::InvalidPath {
                    label: label.to_owned(),
                    found: other.kind(),
                })
            }
        };

        let path = self.resolve(&original)?;

        if self.mkdirs && !path.exists() {
            std::fs::create_dir_all(&path).map_err(|source| ConfigError::CreateDir {
                path: path.clone(),
                source,
            })?;
            debug!(label, path = %path.display(), "created directory");
        }

        if !path.exists() {
            if self.raises {
                return Err(ConfigError::PathNotFound(path));
            }
            Advisory::PathNotFound(path.clone()).emit();
        }

        slots.insert(label, Value::Path(path), Some(original));
        Ok(())
    }

    fn clear(&self, slots: &mut Slots) -> Result<(), ConfigError> {
        let label = self.require_label()?;
        slots.remove(label);
        Ok(())
    }
}

fn home_dir() -> Option<String> {
    dirs::home_dir().map(|home| home.to_string_lossy().into_owned())
}

/// Steps 1 and 2 of the pipeline, with the home directory and variable
/// lookups supplied by the caller.
fn expand<H, V>(raw: &str, home: H, var: V) -> String
where
    H: FnOnce() -> Option<String>,
    V: FnMut(&str) -> Option<String>,
{
    let tilde = shellexpand::tilde_with_context(raw, home);
    shellexpand::env_with_context_no_errors(&tilde, var).into_owned()
}

/// Lexical normalization: drops `.` segments and trailing separators, and
/// folds `..` into the preceding segment. `..` directly under the root is
/// dropped; leading `..` on a relative path is kept.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
    Ok(normalize(&cwd.join(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::{capture_warnings, lock_home, with_home};

    fn labeled(name: &str, setting: PathSetting) -> PathSetting {
        let mut setting = setting;
        setting.set_label(name.to_owned());
        setting
    }

    fn read_path<'a>(setting: &'a PathSetting, slots: &'a Slots) -> Option<&'a Path> {
        setting.read(slots).unwrap().and_then(Value::as_path)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c/")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("../x/..")), PathBuf::from(".."));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(
            normalize(Path::new("path/to/test.txt")),
            PathBuf::from("path/to/test.txt")
        );
    }

    #[test]
    fn test_pipeline_home_and_parent_segments() {
        let expanded = expand(
            "~/sub/../x",
            || Some("/home/u".to_owned()),
            |_| None::<String>,
        );
        let path = absolutize(&normalize(Path::new(&expanded))).unwrap();
        assert_eq!(path, PathBuf::from("/home/u/x"));
    }

    #[test]
    fn test_write_resolves_home_and_parent_segments() {
        let setting = labeled("home_path", PathSetting::new().raises(false));
        let mut slots = Slots::default();

        let (result, warnings) = with_home("/home/u", || {
            capture_warnings(|| setting.write(&mut slots, Value::from("~/sub/../x")))
        });

        result.unwrap();
        assert_eq!(read_path(&setting, &slots), Some(Path::new("/home/u/x")));
        assert_eq!(slots.original("home_path"), Some("~/sub/../x"));
        assert!(warnings.contains("/home/u/x"), "got: {warnings}");
    }

    #[test]
    fn test_expand_variables() {
        let expanded = expand(
            "$ROOT/${LEAF}/$UNKNOWN",
            || None::<String>,
            |name| match name {
                "ROOT" => Some("/srv".to_owned()),
                "LEAF" => Some("data".to_owned()),
                _ => None,
            },
        );
        assert_eq!(expanded, "/srv/data/$UNKNOWN");
    }

    #[test]
    fn test_vars_expansion_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("DRAGON_PATH_TEST_VARDIR", dir.path());

        let setting = labeled("standard_path", PathSetting::new());
        let mut slots = Slots::default();
        setting
            .write(&mut slots, Value::from("$DRAGON_PATH_TEST_VARDIR"))
            .unwrap();

        assert_eq!(read_path(&setting, &slots), Some(dir.path()));
        assert_eq!(
            slots.original("standard_path"),
            Some("$DRAGON_PATH_TEST_VARDIR")
        );
    }

    #[test]
    fn test_user_expansion() {
        let _home = lock_home();
        let setting = labeled("dont_raise_path", PathSetting::new().raises(false));
        let mut slots = Slots::default();

        capture_warnings(|| setting.write(&mut slots, Value::from("~/path/to/test")))
            .0
            .unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(
            read_path(&setting, &slots),
            Some(home.join("path/to/test").as_path())
        );
    }

    #[test]
    fn test_absolute_path() {
        let setting = labeled("dont_raise_path", PathSetting::new().raises(false));
        let mut slots = Slots::default();
        capture_warnings(|| setting.write(&mut slots, Value::from("path/to/test.txt")))
            .0
            .unwrap();

        let expected = std::env::current_dir().unwrap().join("path/to/test.txt");
        assert_eq!(read_path(&setting, &slots), Some(expected.as_path()));
    }

    #[test]
    fn test_not_absolute_path() {
        let setting = labeled(
            "not_absolute",
            PathSetting::new().absolute(false).raises(false),
        );
        let mut slots = Slots::default();
        capture_warnings(|| setting.write(&mut slots, Value::from("path/to/test.txt")))
            .0
            .unwrap();

        assert_eq!(
            read_path(&setting, &slots),
            Some(Path::new("path/to/test.txt"))
        );
    }

    #[test]
    fn test_normpath_on_write() {
        let root = tempfile::tempdir().unwrap();
        let sub = root.path().join("subdir");
        std::fs::create_dir(&sub).unwrap();

        let setting = labeled("standard_path", PathSetting::new());
        let mut slots = Slots::default();
        setting
            .write(&mut slots, Value::Path(sub.join("..")))
            .unwrap();

        assert_eq!(read_path(&setting, &slots), Some(root.path()));
    }

    #[test]
    fn test_required_unset_path_fails() {
        let setting = labeled("standard_path", PathSetting::new());
        let slots = Slots::default();

        let err = setting.read(&slots).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPath(ref label) if label == "standard_path"));
        assert!(err.is_missing_required());
    }

    #[test]
    fn test_not_required_unset_path_is_none() {
        let setting = labeled("not_required_path", PathSetting::new().required(false));
        let slots = Slots::default();
        assert_eq!(setting.read(&slots).unwrap(), None);
    }

    #[test]
    fn test_default_returned_verbatim() {
        let setting = labeled(
            "default_path",
            PathSetting::new().default_value("/tmp/d/../d/"),
        );
        let slots = Slots::default();

        assert_eq!(
            setting.read(&slots).unwrap(),
            Some(&Value::from("/tmp/d/../d/"))
        );
    }

    #[test]
    fn test_default_returns_after_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = tempfile::NamedTempFile::new_in(dir.path()).unwrap();

        let setting = labeled(
            "default_path",
            PathSetting::new().default_value("/tmp/data/"),
        );
        let mut slots = Slots::default();

        setting
            .write(&mut slots, Value::Path(file.path().to_path_buf()))
            .unwrap();
        assert_eq!(read_path(&setting, &slots), Some(file.path()));

        setting.clear(&mut slots).unwrap();
        assert_eq!(setting.read(&slots).unwrap(), Some(&Value::from("/tmp/data/")));
        assert_eq!(slots.original("default_path"), None);
    }

    #[test]
    fn test_clear_required_path_fails_on_read() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let setting = labeled("standard_path", PathSetting::new());
        let mut slots = Slots::default();

        setting
            .write(&mut slots, Value::Path(file.path().to_path_buf()))
            .unwrap();
        assert_eq!(read_path(&setting, &slots), Some(file.path()));

        setting.clear(&mut slots).unwrap();
        assert!(matches!(
            setting.read(&slots),
            Err(ConfigError::MissingPath(_))
        ));
    }

    #[test]
    fn test_mkdirs_creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing/path/to/dir");

        let setting = labeled("mkdirs_path", PathSetting::new().mkdirs(true));
        let mut slots = Slots::default();
        setting
            .write(&mut slots, Value::Path(missing.clone()))
            .unwrap();

        assert!(missing.is_dir());
        assert_eq!(read_path(&setting, &slots), Some(missing.as_path()));
    }

    #[test]
    fn test_no_mkdirs_by_default() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing/path/to/dir");

        let setting = labeled(
            "silent_path",
            PathSetting::new().raises(false).required(false),
        );
        let mut slots = Slots::default();
        capture_warnings(|| setting.write(&mut slots, Value::Path(missing.clone())))
            .0
            .unwrap();

        assert!(!missing.exists());
    }

    #[test]
    fn test_raises_on_missing_path() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing/path/to/dir");

        for setting in [
            PathSetting::new(),
            PathSetting::new().default_value("/tmp"),
            PathSetting::new().required(false),
        ] {
            let setting = labeled("raising", setting);
            let mut slots = Slots::default();
            let err = setting
                .write(&mut slots, Value::Path(missing.clone()))
                .unwrap_err();
            assert!(matches!(err, ConfigError::PathNotFound(_)));
            assert!(!slots.contains("raising"));
        }
    }

    #[test]
    fn test_missing_path_advisory_when_not_raising() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing/path/to/dir");

        let setting = labeled("dont_raise_path", PathSetting::new().raises(false));
        let mut slots = Slots::default();
        let (result, warnings) =
            capture_warnings(|| setting.write(&mut slots, Value::Path(missing.clone())));

        result.unwrap();
        assert!(warnings.contains("does not exist"), "got: {warnings}");
        assert_eq!(read_path(&setting, &slots), Some(missing.as_path()));
    }

    #[test]
    fn test_null_clears_and_non_string_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let setting = labeled("not_required_path", PathSetting::new().required(false));
        let mut slots = Slots::default();

        setting
            .write(&mut slots, Value::Path(file.path().to_path_buf()))
            .unwrap();
        setting.write(&mut slots, Value::Null).unwrap();
        assert_eq!(setting.read(&slots).unwrap(), None);

        let err = setting.write(&mut slots, Value::from(42)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { found: "integer", .. }));
    }

    #[test]
    fn test_unlabeled_path_setting() {
        let setting = PathSetting::new();
        let mut slots = Slots::default();
        assert!(matches!(
            setting.write(&mut slots, Value::from("/tmp")),
            Err(ConfigError::UnlabeledDescriptor)
        ));
    }
}
