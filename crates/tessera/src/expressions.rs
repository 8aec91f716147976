//! Expression dictionary.
//!
//! An [`Expressions`] dictionary maps names to replacement text. After each
//! level of an attribute stack is evaluated, a value equal to a dictionary
//! key (compared case-insensitively) is replaced by the entry. This lets a
//! template say `:title="greeting"` and keep the actual format string, say
//! `Hello, %s!`, in a separate file.
//!
//! Dictionaries load from INI or YAML. Sections (INI) and nested maps
//! (YAML) produce dotted keys:
//!
//! ```ini
//! [book]
//! byline = "%s by %s"
//! ```
//!
//! ```yaml
//! book:
//!   byline: "%s by %s"
//! ```
//!
//! Both define `book.byline`.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ConfigError;

/// Case-insensitive name to text dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expressions {
    entries: HashMap<String, String>,
}

impl Expressions {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an INI document into a new dictionary.
    pub fn from_ini(source: &str) -> Result<Self, ConfigError> {
        let mut expressions = Self::new();
        expressions.load_ini(source)?;
        Ok(expressions)
    }

    /// Parses a YAML document into a new dictionary.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let mut expressions = Self::new();
        expressions.load_yaml(source)?;
        Ok(expressions)
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, name: impl AsRef<str>, text: impl Into<String>) {
        self.entries.insert(name.as_ref().to_lowercase(), text.into());
    }

    /// Looks up an entry, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Returns true if `name` has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names (lowercased), sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Merges entries from a file, picking the parser by extension
    /// (`.ini`, `.yaml`, `.yml`).
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let source = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let before = self.len();
        match extension.as_deref() {
            Some("ini") => self.load_ini(&source()?)?,
            Some("yaml" | "yml") => self.load_yaml(&source()?)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
        debug!(path = %path.display(), added = self.len() - before, "loaded expressions");
        Ok(())
    }

    /// Merges entries from an INI document.
    ///
    /// `;` and `#` start comment lines. Unquoted values end at an inline
    /// `;`; quote a value to keep one.
    pub fn load_ini(&mut self, source: &str) -> Result<(), ConfigError> {
        let mut section: Option<String> = None;

        for (index, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| ConfigError::Ini {
                    line: index + 1,
                    message: "unterminated section header".to_string(),
                })?;
                section = Some(name.trim().to_string()).filter(|s| !s.is_empty());
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Ini {
                line: index + 1,
                message: "expected `key = value`".to_string(),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Ini {
                    line: index + 1,
                    message: "empty key".to_string(),
                });
            }

            let name = match &section {
                Some(section) => format!("{section}.{key}"),
                None => key.to_string(),
            };
            self.insert(name, ini_value(value.trim()));
        }
        Ok(())
    }

    /// Merges entries from a YAML document. The document must be a map.
    pub fn load_yaml(&mut self, source: &str) -> Result<(), ConfigError> {
        let document: serde_yaml::Value = serde_yaml::from_str(source)?;
        match document {
            serde_yaml::Value::Null => Ok(()),
            serde_yaml::Value::Mapping(map) => self.flatten_yaml("", &map),
            _ => Err(ConfigError::Invalid(
                "expression YAML must be a map at the top level".to_string(),
            )),
        }
    }

    fn flatten_yaml(&mut self, prefix: &str, map: &serde_yaml::Mapping) -> Result<(), ConfigError> {
        for (key, value) in map {
            let key = yaml_scalar(key).ok_or_else(|| {
                ConfigError::Invalid(format!("expression keys must be scalars under {prefix:?}"))
            })?;
            let name = if prefix.is_empty() {
                key
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                serde_yaml::Value::Mapping(nested) => self.flatten_yaml(&name, nested)?,
                serde_yaml::Value::Null => self.insert(name, ""),
                other => match yaml_scalar(other) {
                    Some(text) => self.insert(name, text),
                    None => warn!(%name, "skipping non-scalar expression"),
                },
            }
        }
        Ok(())
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Expressions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut expressions = Self::new();
        for (name, text) in iter {
            expressions.insert(name, text);
        }
        expressions
    }
}

fn ini_value(raw: &str) -> String {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return raw[1..raw.len() - 1].to_string();
        }
    }
    match raw.split_once(';') {
        Some((value, _comment)) => value.trim_end().to_string(),
        None => raw.to_string(),
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let mut expressions = Expressions::new();
        expressions.insert("Greeting", "Hello, %s!");
        assert_eq!(expressions.get("greeting"), Some("Hello, %s!"));
        assert_eq!(expressions.get("GREETING"), Some("Hello, %s!"));
        assert_eq!(expressions.get("farewell"), None);
    }

    #[test]
    fn test_from_iterator() {
        let expressions: Expressions = [("a", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(expressions.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_ini_sections_and_comments() {
        let source = "\
; leading comment
top = plain
[book]
# another comment
byline = \"%s by %s\"
price = %.2f ; trailing comment
quoted = 'a;b'
";
        let expressions = Expressions::from_ini(source).unwrap();
        assert_eq!(expressions.get("top"), Some("plain"));
        assert_eq!(expressions.get("book.byline"), Some("%s by %s"));
        assert_eq!(expressions.get("book.price"), Some("%.2f"));
        assert_eq!(expressions.get("book.quoted"), Some("a;b"));
        assert_eq!(expressions.len(), 4);
    }

    #[test]
    fn test_ini_errors_carry_line() {
        let err = Expressions::from_ini("a = 1\nbroken\n").unwrap_err();
        assert!(matches!(err, ConfigError::Ini { line: 2, .. }));

        let err = Expressions::from_ini("[open\n").unwrap_err();
        assert!(matches!(err, ConfigError::Ini { line: 1, .. }));
    }

    #[test]
    fn test_yaml_nested_keys() {
        let source = "
greeting: Hello
book:
  byline: '%s by %s'
  meta:
    pages: 300
    draft: false
empty:
";
        let expressions = Expressions::from_yaml(source).unwrap();
        assert_eq!(expressions.get("greeting"), Some("Hello"));
        assert_eq!(expressions.get("book.byline"), Some("%s by %s"));
        assert_eq!(expressions.get("book.meta.pages"), Some("300"));
        assert_eq!(expressions.get("book.meta.draft"), Some("false"));
        assert_eq!(expressions.get("empty"), Some(""));
    }

    #[test]
    fn test_yaml_must_be_map() {
        assert!(matches!(
            Expressions::from_yaml("- a\n- b\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("words.ini");
        let yaml = dir.path().join("more.yml");
        std::fs::write(&ini, "hello = Hi %s\n").unwrap();
        std::fs::write(&yaml, "bye: Bye %s\n").unwrap();

        let mut expressions = Expressions::new();
        expressions.load_file(&ini).unwrap();
        expressions.load_file(&yaml).unwrap();
        assert_eq!(expressions.get("hello"), Some("Hi %s"));
        assert_eq!(expressions.get("bye"), Some("Bye %s"));
    }

    #[test]
    fn test_load_file_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.toml");
        std::fs::write(&path, "a = 1").unwrap();
        let mut expressions = Expressions::new();
        assert!(matches!(
            expressions.load_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
