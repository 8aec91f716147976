//! Selector resolution.
//!
//! A selector addresses a value in the render data:
//!
//! | Selector   | Resolves to                                   |
//! |------------|-----------------------------------------------|
//! | `""`       | the local value itself                        |
//! | `a/b`      | `local["a"]["b"]`                             |
//! | `/a/b`     | `global["a"]["b"]`                            |
//! | `items/0`  | first element of `local["items"]`             |
//! | `a,b/c`    | the list `[local["a"], local["b"]["c"]]`      |
//!
//! Misses resolve to `None`. They are never errors.

use std::borrow::Cow;

use serde_json::Value;
use tracing::trace;

/// Resolves selectors with a given pair of separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver<'c> {
    nesting: &'c str,
    listing: &'c str,
}

impl Default for Resolver<'static> {
    fn default() -> Self {
        Self {
            nesting: "/",
            listing: ",",
        }
    }
}

impl<'c> Resolver<'c> {
    /// Creates a resolver. Both separators must be non-empty.
    pub fn new(nesting: &'c str, listing: &'c str) -> Self {
        Self { nesting, listing }
    }

    /// Resolves `selector` against the two scopes.
    ///
    /// Values found inside the data are borrowed; list selectors build a
    /// new array in which misses become `null`.
    pub fn resolve<'v>(
        &self,
        selector: &str,
        global: &'v Value,
        local: &'v Value,
    ) -> Option<Cow<'v, Value>> {
        if selector.is_empty() {
            return present(local).map(Cow::Borrowed);
        }

        if !self.listing.is_empty() && selector.contains(self.listing) {
            let items = selector
                .split(self.listing)
                .map(|part| {
                    self.resolve(part, global, local)
                        .map(Cow::into_owned)
                        .unwrap_or(Value::Null)
                })
                .collect();
            return Some(Cow::Owned(Value::Array(items)));
        }

        let found = self.walk(selector, global, local);
        trace!(selector, found = found.is_some(), "resolved selector");
        found.map(Cow::Borrowed)
    }

    fn walk<'v>(&self, selector: &str, global: &'v Value, local: &'v Value) -> Option<&'v Value> {
        if self.nesting.is_empty() {
            return match local {
                Value::Object(map) => map.get(selector).and_then(present),
                _ => None,
            };
        }

        let (mut current, path) = match selector.strip_prefix(self.nesting) {
            Some(rest) => (global, rest),
            None => (local, selector),
        };
        for segment in path.split(self.nesting).filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))?,
                _ => return None,
            };
        }
        present(current)
    }
}

/// Resolves `selector` with the default separators (`/` and `,`).
pub fn resolve<'v>(selector: &str, global: &'v Value, local: &'v Value) -> Option<Cow<'v, Value>> {
    Resolver::default().resolve(selector, global, local)
}

fn present(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Value {
        json!({
            "title": "Home",
            "user": {"name": "Ada", "tags": ["x", "y"]},
            "items": [{"n": 1}, {"n": 2}],
            "nothing": null
        })
    }

    #[test]
    fn test_empty_selector_is_local() {
        let global = data();
        let local = json!("here");
        assert_eq!(resolve("", &global, &local).as_deref(), Some(&json!("here")));
    }

    #[test]
    fn test_empty_selector_null_local_is_absent() {
        let global = data();
        assert!(resolve("", &global, &Value::Null).is_none());
    }

    #[test]
    fn test_nested_path() {
        let global = data();
        assert_eq!(
            resolve("user/name", &global, &global).as_deref(),
            Some(&json!("Ada"))
        );
        assert_eq!(
            resolve("user/tags/1", &global, &global).as_deref(),
            Some(&json!("y"))
        );
    }

    #[test]
    fn test_leading_separator_reads_global() {
        let global = data();
        let local = json!({"title": "Local"});
        assert_eq!(resolve("title", &global, &local).as_deref(), Some(&json!("Local")));
        assert_eq!(resolve("/title", &global, &local).as_deref(), Some(&json!("Home")));
        assert_eq!(resolve("/", &global, &local).as_deref(), Some(&global));
    }

    #[test]
    fn test_trailing_and_doubled_separators_skipped() {
        let global = data();
        assert_eq!(
            resolve("user//name/", &global, &global).as_deref(),
            Some(&json!("Ada"))
        );
    }

    #[test]
    fn test_misses() {
        let global = data();
        assert!(resolve("missing", &global, &global).is_none());
        assert!(resolve("title/length", &global, &global).is_none());
        assert!(resolve("items/9", &global, &global).is_none());
        assert!(resolve("items/first", &global, &global).is_none());
        assert!(resolve("nothing", &global, &global).is_none());
    }

    #[test]
    fn test_list_selector() {
        let global = data();
        let found = resolve("title,missing,user/name", &global, &global).unwrap();
        assert_eq!(*found, json!(["Home", null, "Ada"]));
    }

    #[test]
    fn test_list_selector_empty_part_is_local() {
        let global = data();
        let local = json!("me");
        let found = resolve(",/title", &global, &local).unwrap();
        assert_eq!(*found, json!(["me", "Home"]));
    }

    #[test]
    fn test_custom_separators() {
        let global = data();
        let resolver = Resolver::new(".", "|");
        assert_eq!(
            resolver.resolve("user.name", &global, &global).as_deref(),
            Some(&json!("Ada"))
        );
        assert_eq!(
            resolver.resolve("title|.title", &global, &global).as_deref(),
            Some(&json!(["Home", "Home"]))
        );
    }

    #[test]
    fn test_found_values_are_borrowed() {
        let global = data();
        assert!(matches!(resolve("user", &global, &global), Some(Cow::Borrowed(_))));
    }
}
