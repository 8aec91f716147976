use serde_json::{Map, Value};
use tracing::debug;

use crate::stack::AttributeStack;
use crate::walker::Scope;

/// Grafts the local scope into a copy of the global scope under each
/// level's name. The copy is visible to this element and its descendants.
pub(super) fn apply(stack: &AttributeStack, scope: &mut Scope<'_>) {
    for (_, name) in stack.levels() {
        if name.is_empty() {
            continue;
        }
        let mut global = match scope.global() {
            Value::Object(map) => Value::Object(map.clone()),
            Value::Null => Value::Object(Map::new()),
            _ => {
                debug!(name, "global scope is not a map, skipping export");
                continue;
            }
        };
        if let Value::Object(map) = &mut global {
            map.insert(name.to_string(), scope.local().clone());
        }
        scope.set_global(global);
    }
}
