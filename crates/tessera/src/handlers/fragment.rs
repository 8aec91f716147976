use tessera_markup::{Document, NodeId, NodeKind};
use tracing::debug;

use super::{Flow, Visit};
use crate::error::RenderError;
use crate::stack::{extract_stacks, AttributeStack};
use crate::walker::{Expander, Scope};

/// Appends the named fragment as the element's last child.
pub(super) fn append(
    expander: &Expander<'_>,
    doc: &mut Document,
    visit: &Visit<'_>,
    stack: &AttributeStack,
    scope: &Scope<'_>,
) -> Result<Flow, RenderError> {
    let Some(name) = fragment_name(expander, stack, "append", scope) else {
        return Ok(Flow::Continue);
    };
    let Some((fragment, root)) = load(expander, &name, visit.depth)? else {
        return Ok(Flow::Continue);
    };

    let child = doc.import(&fragment, root);
    doc.append_child(visit.node, child);
    if process(expander, doc, child, scope, visit.depth + 1)? {
        doc.detach(child);
    }
    Ok(Flow::Continue)
}

/// Replaces the element with the named fragment.
pub(super) fn include(
    expander: &Expander<'_>,
    doc: &mut Document,
    visit: &Visit<'_>,
    stack: &AttributeStack,
    scope: &Scope<'_>,
) -> Result<Flow, RenderError> {
    let Some(name) = fragment_name(expander, stack, "include", scope) else {
        return Ok(Flow::Continue);
    };
    let Some((fragment, root)) = load(expander, &name, visit.depth)? else {
        return Ok(Flow::Remove);
    };

    let child = doc.import(&fragment, root);
    if doc.insert_before(child, visit.node)
        && process(expander, doc, child, scope, visit.depth + 1)?
    {
        doc.detach(child);
    }
    Ok(Flow::Remove)
}

fn fragment_name(
    expander: &Expander<'_>,
    stack: &AttributeStack,
    directive: &str,
    scope: &Scope<'_>,
) -> Option<String> {
    let name = expander.process_value(stack, directive, scope)?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Loads a fragment and finds its single root. `Ok(None)` for blank sources.
fn load(
    expander: &Expander<'_>,
    name: &str,
    depth: usize,
) -> Result<Option<(Document, NodeId)>, RenderError> {
    let limit = expander.config().max_include_depth;
    if depth >= limit {
        return Err(RenderError::RecursionLimit {
            name: name.to_string(),
            limit,
        });
    }

    let source = expander.loader().load_source(name)?;
    if source.trim().is_empty() {
        debug!(name, "fragment is empty");
        return Ok(None);
    }

    let fragment = expander.config().parse(&source);
    let roots: Vec<NodeId> = fragment
        .children(fragment.root())
        .iter()
        .copied()
        .filter(|&id| match fragment.kind(id) {
            NodeKind::Element(_) => true,
            NodeKind::Text(text) => !text.trim().is_empty(),
            _ => false,
        })
        .collect();
    match roots.as_slice() {
        [root] => {
            debug!(name, depth, "loaded fragment");
            let root = *root;
            Ok(Some((fragment, root)))
        }
        _ => Err(RenderError::MalformedFragment {
            name: name.to_string(),
            found: roots.len(),
        }),
    }
}

fn process(
    expander: &Expander<'_>,
    doc: &mut Document,
    node: NodeId,
    scope: &Scope<'_>,
    depth: usize,
) -> Result<bool, RenderError> {
    let stacks = extract_stacks(doc, node, expander.config());
    expander.process_node(doc, node, stacks, scope.reborrow(), depth)
}
