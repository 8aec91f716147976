use tracing::debug;

use super::Flow;
use crate::stack::AttributeStack;
use crate::value;
use crate::walker::{Expander, Scope};

/// `with` (`require = true`) and `without` (`require = false`).
///
/// Level 0 is the value every selector is compared against; without it a
/// selector holds when its datum is non-empty. A lone level 0 is itself the
/// selector. `with` keeps the element only if every selector holds and
/// `without` keeps it only if none does. Evaluation stops at the first
/// selector that decides the outcome.
pub(super) fn apply(
    expander: &Expander<'_>,
    stack: &AttributeStack,
    scope: &Scope<'_>,
    require: bool,
) -> Flow {
    let resolver = expander.resolver();
    let bare = stack.len() == 1 && stack.has_literal();
    let mut expected: Option<&str> = None;

    for (level, text) in stack.levels() {
        if level == 0 && !bare {
            expected = Some(text);
            continue;
        }
        let datum = resolver.resolve(text, scope.global(), scope.local());
        let holds = match expected {
            Some(expected) => value::loosely_equals(datum.as_deref(), expected),
            None => !value::is_empty(datum.as_deref()),
        };
        if holds != require {
            debug!(selector = text, holds, require, "condition removes element");
            return Flow::Remove;
        }
    }
    Flow::Continue
}
