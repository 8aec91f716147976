use tessera_markup::Document;

use super::Visit;
use crate::stack::AttributeStack;
use crate::walker::{Expander, Scope};

/// Replaces the element's content with the text stack's value.
///
/// Elements with children keep them unless level 0 was given, either
/// explicitly or from a sole text child.
pub(super) fn apply(
    expander: &Expander<'_>,
    doc: &mut Document,
    visit: &Visit<'_>,
    stack: &AttributeStack,
    scope: &Scope<'_>,
) {
    let name = &expander.config().text_attribute;
    let value = expander.process_value(stack, name, scope);
    if doc.children(visit.node).is_empty() || stack.has_literal() {
        doc.set_text(visit.node, value.unwrap_or_default());
    }
}
