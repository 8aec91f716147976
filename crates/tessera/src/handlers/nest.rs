use std::borrow::Cow;

use serde_json::Value;
use tracing::trace;

use crate::stack::AttributeStack;
use crate::walker::{Expander, Scope};

/// Rebinds the local scope through each level's selector in turn.
///
/// A miss makes the local scope absent; later levels then resolve against
/// nothing unless they start at the global root.
pub(super) fn apply(expander: &Expander<'_>, stack: &AttributeStack, scope: &mut Scope<'_>) {
    let resolver = expander.resolver();
    for (level, selector) in stack.levels() {
        let next = resolver
            .resolve(selector, scope.global(), scope.local())
            .map(Cow::into_owned)
            .unwrap_or(Value::Null);
        trace!(level, selector, absent = next.is_null(), "nested scope");
        scope.set_local(next);
    }
}
