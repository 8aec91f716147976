//! Directive handlers.
//!
//! Each [`Directive`] consumes the attribute stack of the same name and
//! rewrites the element, the tree around it, or the data scope seen by later
//! handlers and by the element's children. Handlers run in the order of
//! [`Config::pipeline`](crate::Config::pipeline); one returning
//! [`Flow::Remove`] ends processing of the element, which its parent then
//! detaches.
//!
//! | Directive | Attribute       | Effect                                         |
//! |-----------|-----------------|------------------------------------------------|
//! | `nest`    | `:` `::` ...    | rebind the local scope through selectors       |
//! | `foreach` | `foreach`       | repeat the element once per item               |
//! | `with`    | `with`          | keep the element only if all conditions hold   |
//! | `without` | `without`       | drop the element if all conditions hold        |
//! | `as`      | `as`            | publish the local scope under a global name    |
//! | `text`    | text attribute  | replace the element's text                     |
//! | `append`  | `append`        | append a fragment as last child                |
//! | `include` | `include`       | replace the element with a fragment            |

mod condition;
mod export;
mod foreach;
mod fragment;
mod nest;
mod text;

use serde::{Deserialize, Serialize};
use tessera_markup::{Document, NodeId};

use crate::config::Config;
use crate::error::RenderError;
use crate::stack::{AttributeStack, Stacks};
use crate::walker::{Expander, Scope};

/// A directive handler, identified by the attribute it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directive {
    Nest,
    Foreach,
    With,
    Without,
    As,
    Text,
    Append,
    Include,
}

/// What the walker does with an element after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going: later handlers, leftover attributes, children.
    Continue,
    /// Stop and remove the element.
    Remove,
}

/// The element being processed.
pub(crate) struct Visit<'a> {
    pub node: NodeId,
    /// Stacks not yet consumed by this or earlier handlers.
    pub stacks: &'a Stacks,
    /// Fragment nesting depth.
    pub depth: usize,
}

impl Directive {
    /// The pipeline used when none is configured.
    pub const DEFAULT_PIPELINE: [Directive; 8] = [
        Directive::Nest,
        Directive::Foreach,
        Directive::With,
        Directive::Without,
        Directive::As,
        Directive::Text,
        Directive::Append,
        Directive::Include,
    ];

    /// Attribute (stack) name this directive consumes.
    pub fn attribute<'c>(&self, config: &'c Config) -> &'c str {
        match self {
            Directive::Nest => "",
            Directive::Foreach => "foreach",
            Directive::With => "with",
            Directive::Without => "without",
            Directive::As => "as",
            Directive::Text => &config.text_attribute,
            Directive::Append => "append",
            Directive::Include => "include",
        }
    }

    pub(crate) fn apply(
        self,
        expander: &Expander<'_>,
        doc: &mut Document,
        visit: &Visit<'_>,
        stack: AttributeStack,
        scope: &mut Scope<'_>,
    ) -> Result<Flow, RenderError> {
        match self {
            Directive::Nest => {
                nest::apply(expander, &stack, scope);
                Ok(Flow::Continue)
            }
            Directive::Foreach => foreach::apply(expander, doc, visit, &stack, scope),
            Directive::With => Ok(condition::apply(expander, &stack, scope, true)),
            Directive::Without => Ok(condition::apply(expander, &stack, scope, false)),
            Directive::As => {
                export::apply(&stack, scope);
                Ok(Flow::Continue)
            }
            Directive::Text => {
                text::apply(expander, doc, visit, &stack, scope);
                Ok(Flow::Continue)
            }
            Directive::Append => fragment::append(expander, doc, visit, &stack, scope),
            Directive::Include => fragment::include(expander, doc, visit, &stack, scope),
        }
    }
}
