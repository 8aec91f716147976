use serde_json::Value;
use tessera_markup::Document;
use tracing::{debug, warn};

use super::{Flow, Visit};
use crate::error::RenderError;
use crate::stack::AttributeStack;
use crate::walker::{Expander, Scope};

/// Repeats the element once per item, inserting each processed copy before
/// the template element, which is then removed.
///
/// Items start as the local scope. A level-0 value replaces them with a
/// JSON array literal. Each higher level replaces every item by the list
/// found at its selector (an object contributes its values), or keeps the
/// item when there is none.
pub(super) fn apply(
    expander: &Expander<'_>,
    doc: &mut Document,
    visit: &Visit<'_>,
    stack: &AttributeStack,
    scope: &Scope<'_>,
) -> Result<Flow, RenderError> {
    let resolver = expander.resolver();
    let mut items = vec![scope.local().clone()];

    for (level, text) in stack.levels() {
        if level == 0 {
            items = parse_source(text);
            continue;
        }
        let mut next = Vec::with_capacity(items.len());
        for item in items {
            let found: Option<Vec<Value>> = match resolver
                .resolve(text, scope.global(), &item)
                .as_deref()
            {
                Some(Value::Array(sub)) => Some(sub.clone()),
                Some(Value::Object(map)) => Some(map.values().cloned().collect()),
                _ => None,
            };
            match found {
                Some(sub) => next.extend(sub),
                None => next.push(item),
            }
        }
        items = next;
    }

    debug!(count = items.len(), "repeating element");
    for item in items {
        let copy = doc.deep_clone(visit.node);
        if !doc.insert_before(copy, visit.node) {
            break;
        }
        let remove = expander.process_node(
            doc,
            copy,
            visit.stacks.clone(),
            scope.with_local(item),
            visit.depth,
        )?;
        if remove {
            doc.detach(copy);
        }
    }
    Ok(Flow::Remove)
}

fn parse_source(text: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
        Ok(_) => {
            warn!(source = text, "repetition source is not a list, repeating nothing");
            Vec::new()
        }
        Err(err) => {
            warn!(source = text, %err, "unparsable repetition source, repeating nothing");
            Vec::new()
        }
    }
}
