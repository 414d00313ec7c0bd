//! Environment lookups: single settings resolved at declaration time, and the
//! prefixed overlay applied at the end of a load.

use tracing::debug;

use super::{Advisory, ConfigError, Mapping, Value};

/// Resolves a setting from the process environment.
///
/// | set | `default` | `required` | result |
/// |---|---|---|---|
/// | yes | any | any | the variable's value |
/// | no | `None` | `true` | [`ConfigError::MissingEnvVar`] |
/// | no | `None` | `false` | `None`, with an [`Advisory::MissingSetting`] |
/// | no | `Some(d)` | any | `d` |
///
/// Typically evaluated once, while a schema is declared:
///
/// ```no_run
/// use dragon_settings::{environ_setting, Schema};
///
/// let schema = Schema::builder("Database")
///     .setting("password", environ_setting("DATABASE_PASSWORD", None, true)?)
///     .build();
/// # Ok::<(), dragon_settings::ConfigError>(())
/// ```
pub fn environ_setting(
    name: &str,
    default: Option<&str>,
    required: bool,
) -> Result<Option<String>, ConfigError> {
    if let Some(value) = std::env::var_os(name) {
        return Ok(Some(value.to_string_lossy().into_owned()));
    }

    match default {
        Some(default) => Ok(Some(default.to_owned())),
        None if required => Err(ConfigError::MissingEnvVar(name.to_owned())),
        None => {
            Advisory::MissingSetting(name.to_owned()).emit();
            Ok(None)
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EnvOverlay {
    prefix: String,
    separator: String,
}

impl EnvOverlay {
    pub(crate) fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    /// Collects every matching variable into a nested mapping, ready to be
    /// merged with [`Settings::configure`](super::Settings::configure).
    pub(crate) fn collect(&self) -> Value {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut overlay = Mapping::new();
        let mut count = 0usize;

        for (key, value) in std::env::vars_os() {
            let (Some(key), Some(value)) = (key.to_str(), value.to_str()) else {
                continue;
            };
            let Some(path_str) = key.strip_prefix(&prefix_with_sep) else {
                continue;
            };
            if path_str.is_empty() {
                continue;
            }

            let path: Vec<String> = path_str
                .split(&self.separator)
                .map(|s| s.to_lowercase())
                .collect();

            insert_at_path(&mut overlay, &path, coerce_value(value));
            count += 1;
        }

        debug!(prefix = %self.prefix, count, "collected environment overlay");
        Value::Mapping(overlay)
    }
}

fn insert_at_path(map: &mut Mapping, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        map.insert(first.clone(), value);
        return;
    }

    if !matches!(map.get(first), Some(Value::Mapping(_))) {
        map.insert(first.clone(), Value::Mapping(Mapping::new()));
    }

    if let Some(Value::Mapping(nested)) = map.get_mut(first) {
        insert_at_path(nested, rest, value);
    }
}

fn coerce_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    // Only an optional minus followed by digits counts as an integer.
    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::capture_warnings;

    const ENVKEY: &str = "DRAGON_ENV_TEST_SETTING";
    const MISSING: &str = "DRAGON_ENV_TEST_MISSING_SETTING";

    #[test]
    fn test_environ_setting_present() {
        std::env::set_var(ENVKEY, "42");

        assert_eq!(environ_setting(ENVKEY, None, true).unwrap().as_deref(), Some("42"));
        assert_eq!(
            environ_setting(ENVKEY, Some("15"), true).unwrap().as_deref(),
            Some("42")
        );
        assert_eq!(environ_setting(ENVKEY, None, false).unwrap().as_deref(), Some("42"));
        assert_eq!(
            environ_setting(ENVKEY, Some("15"), false).unwrap().as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_required_missing_fails() {
        let err = environ_setting(MISSING, None, true).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref name) if name == MISSING));
        assert!(err.is_missing_required());
    }

    #[test]
    fn test_optional_missing_warns_and_returns_none() {
        let (result, warnings) = capture_warnings(|| environ_setting(MISSING, None, false));

        assert_eq!(result.unwrap(), None);
        assert!(warnings.contains(MISSING), "got: {warnings}");
        assert!(warnings.contains("WARN"), "got: {warnings}");
    }

    #[test]
    fn test_default_when_missing() {
        assert_eq!(
            environ_setting(MISSING, Some("d"), true).unwrap().as_deref(),
            Some("d")
        );
        assert_eq!(
            environ_setting(MISSING, Some("15"), false).unwrap().as_deref(),
            Some("15")
        );
    }

    #[test]
    fn test_default_does_not_warn() {
        let (_, warnings) = capture_warnings(|| environ_setting(MISSING, Some("d"), false));
        assert!(warnings.is_empty(), "got: {warnings}");
    }

    #[test]
    fn test_overlay_builds_nested_mapping() {
        std::env::set_var("DRAGON_OVERLAY_TEST__DATABASE__HOST", "db.local");
        std::env::set_var("DRAGON_OVERLAY_TEST__DATABASE__PORT", "5433");
        std::env::set_var("DRAGON_OVERLAY_TEST__DEBUG", "TRUE");

        let overlay = EnvOverlay::new("DRAGON_OVERLAY_TEST", "__").collect();

        assert_eq!(overlay["database"]["host"], "db.local");
        assert_eq!(overlay["database"]["port"], 5433);
        assert_eq!(overlay["debug"], true);
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value("true"), Value::Bool(true));
        assert_eq!(coerce_value("False"), Value::Bool(false));
        assert_eq!(coerce_value("-12"), Value::Integer(-12));
        assert_eq!(coerce_value("1.5"), Value::Float(1.5));
        assert_eq!(coerce_value("1e3"), Value::from("1e3"));
        assert_eq!(coerce_value("localhost"), Value::from("localhost"));
    }

    #[test]
    fn test_insert_at_path_replaces_scalars() {
        let mut map = Mapping::new();
        insert_at_path(&mut map, &["a".to_owned()], Value::from(1));
        insert_at_path(&mut map, &["a".to_owned(), "b".to_owned()], Value::from(2));
        assert_eq!(Value::Mapping(map)["a"]["b"], 2);
    }

    #[test]
    #[should_panic(expected = "separator must not be empty")]
    fn test_empty_separator_panics() {
        let _ = EnvOverlay::new("APP", "");
    }
}
