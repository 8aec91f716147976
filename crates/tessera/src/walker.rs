//! Tree walking and stack evaluation.
//!
//! [`Expander`] drives an expansion: it walks the document depth-first,
//! turns each element's attributes into stacks, runs the directive pipeline
//! over them, writes the remaining stacks back as plain attributes and then
//! descends into the children with the scope the handlers left behind.
//!
//! Elements whose removal is requested are detached only after their
//! siblings have all been visited, so handlers may insert siblings (as
//! `foreach` and `include` do) without disturbing the walk.

use std::borrow::Cow;

use serde_json::Value;
use tessera_markup::{Document, NodeId};
use tracing::trace;

use crate::config::Config;
use crate::error::RenderError;
use crate::expressions::Expressions;
use crate::format;
use crate::handlers::{Flow, Visit};
use crate::loader::TemplateLoader;
use crate::selector::Resolver;
use crate::stack::{extract_stacks, AttributeStack, Stacks};
use crate::value;

/// The data visible to an element: the global root and the local value
/// selectors resolve against by default.
///
/// Both sides start borrowed from the render data. Handlers that rebind a
/// side store an owned value; children receive cheap borrowed views.
#[derive(Debug, Clone)]
pub struct Scope<'d> {
    global: Cow<'d, Value>,
    local: Cow<'d, Value>,
}

impl<'d> Scope<'d> {
    /// Scope for the document root: global and local are both `data`.
    pub fn new(data: &'d Value) -> Self {
        Self {
            global: Cow::Borrowed(data),
            local: Cow::Borrowed(data),
        }
    }

    pub fn global(&self) -> &Value {
        &self.global
    }

    pub fn local(&self) -> &Value {
        &self.local
    }

    pub fn set_global(&mut self, global: Value) {
        self.global = Cow::Owned(global);
    }

    pub fn set_local(&mut self, local: Value) {
        self.local = Cow::Owned(local);
    }

    /// A view of this scope for a child element.
    pub fn reborrow(&self) -> Scope<'_> {
        Scope {
            global: Cow::Borrowed(&*self.global),
            local: Cow::Borrowed(&*self.local),
        }
    }

    /// A view with the same global scope and a new local value.
    pub fn with_local(&self, local: Value) -> Scope<'_> {
        Scope {
            global: Cow::Borrowed(&*self.global),
            local: Cow::Owned(local),
        }
    }
}

/// Expands directive-annotated documents.
pub struct Expander<'r> {
    config: &'r Config,
    expressions: &'r Expressions,
    loader: &'r dyn TemplateLoader,
}

impl<'r> Expander<'r> {
    pub fn new(
        config: &'r Config,
        expressions: &'r Expressions,
        loader: &'r dyn TemplateLoader,
    ) -> Self {
        Self {
            config,
            expressions,
            loader,
        }
    }

    pub fn config(&self) -> &'r Config {
        self.config
    }

    pub fn loader(&self) -> &'r dyn TemplateLoader {
        self.loader
    }

    pub fn resolver(&self) -> Resolver<'r> {
        self.config.resolver()
    }

    /// Expands `doc` in place against `data`.
    pub fn expand(&self, doc: &mut Document, data: &Value) -> Result<(), RenderError> {
        let root = doc.root();
        self.process_children(doc, root, &Scope::new(data), 0)
    }

    /// Processes every element child of `parent`, then detaches those that
    /// asked to be removed.
    pub fn process_children(
        &self,
        doc: &mut Document,
        parent: NodeId,
        scope: &Scope<'_>,
        depth: usize,
    ) -> Result<(), RenderError> {
        let children = doc.children(parent).to_vec();
        self.process_listed(doc, parent, children, scope, depth)
    }

    /// Processes the listed children that are still elements under `parent`.
    fn process_listed(
        &self,
        doc: &mut Document,
        parent: NodeId,
        children: Vec<NodeId>,
        scope: &Scope<'_>,
        depth: usize,
    ) -> Result<(), RenderError> {
        let mut removed = Vec::new();
        for child in children {
            if !doc.is_element(child) || doc.parent(child) != Some(parent) {
                continue;
            }
            let stacks = extract_stacks(doc, child, self.config);
            if self.process_node(doc, child, stacks, scope.reborrow(), depth)? {
                removed.push(child);
            }
        }
        for child in removed {
            doc.detach(child);
        }
        Ok(())
    }

    /// Runs the pipeline on one element and descends into its children.
    ///
    /// Only children present before the pipeline ran are descended into;
    /// handlers process whatever they add themselves. Returns true when the
    /// caller should detach `node`. Non-element nodes are left alone.
    pub fn process_node(
        &self,
        doc: &mut Document,
        node: NodeId,
        mut stacks: Stacks,
        mut scope: Scope<'_>,
        depth: usize,
    ) -> Result<bool, RenderError> {
        if !doc.is_element(node) {
            return Ok(false);
        }
        let existing = doc.children(node).to_vec();

        for directive in &self.config.pipeline {
            let Some(stack) = stacks.take(directive.attribute(self.config)) else {
                continue;
            };
            let visit = Visit {
                node,
                stacks: &stacks,
                depth,
            };
            if directive.apply(self, doc, &visit, stack, &mut scope)? == Flow::Remove {
                trace!(?directive, "element removed");
                return Ok(true);
            }
        }

        for (name, stack) in stacks {
            if let Some(text) = self.process_value(&stack, &name, &scope) {
                doc.set_attribute(node, name, text);
            }
        }

        self.process_listed(doc, node, existing, &scope, depth)?;

        if doc.element_name(node) == Some(self.config.wrapper_tag().as_str()) {
            doc.unwrap(node);
            return Ok(true);
        }
        Ok(false)
    }

    /// Evaluates a stack level by level.
    ///
    /// Level 0 seeds the value. Every higher level is an assignment that
    /// formats data into the value so far (see
    /// [`process_assignment`](Self::process_assignment)). After each level,
    /// a value naming an expression is replaced by that expression.
    pub fn process_value(
        &self,
        stack: &AttributeStack,
        default_selector: &str,
        scope: &Scope<'_>,
    ) -> Option<String> {
        let mut current: Option<String> = None;
        for (level, text) in stack.levels() {
            current = if level == 0 {
                Some(text.to_string())
            } else {
                self.process_assignment(current.as_deref(), text, default_selector, scope)
            };
            if let Some(expression) = current.as_deref().and_then(|c| self.expressions.get(c)) {
                current = Some(expression.to_string());
            }
        }
        current
    }

    /// One assignment step.
    ///
    /// The datum is found at `selector`, or when that is empty at
    /// `default_selector`, falling back to the local value itself if it is
    /// printable. A non-empty `template` formats the datum; otherwise a
    /// printable scalar datum is used as is.
    pub fn process_assignment(
        &self,
        template: Option<&str>,
        selector: &str,
        default_selector: &str,
        scope: &Scope<'_>,
    ) -> Option<String> {
        let resolver = self.resolver();
        let datum = if selector.is_empty() {
            resolver
                .resolve(default_selector, scope.global(), scope.local())
                .or_else(|| {
                    let local = scope.local();
                    let printable = value::is_scalar(local)
                        || local.is_array()
                        || value::temporal(local).is_some();
                    printable.then_some(Cow::Borrowed(local))
                })
        } else {
            resolver.resolve(selector, scope.global(), scope.local())
        };
        let datum = datum?;

        match template {
            Some(template) if !template.is_empty() => format::evaluate(template, &datum),
            _ if matches!(*datum, Value::Bool(false)) => None,
            _ => value::scalar_text(&datum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::TemplateRegistry;
    use serde_json::json;

    fn expand_with(html: &str, data: Value, expressions: &Expressions) -> String {
        let config = Config::default();
        let registry = TemplateRegistry::new();
        let expander = Expander::new(&config, expressions, &registry);
        let mut doc = tessera_markup::parse(html);
        expander.expand(&mut doc, &data).unwrap();
        doc.to_html()
    }

    fn expand(html: &str, data: Value) -> String {
        expand_with(html, data, &Expressions::new())
    }

    fn stack(levels: &[(usize, &str)]) -> AttributeStack {
        levels
            .iter()
            .fold(AttributeStack::new(), |stack, &(level, text)| stack.with(level, text))
    }

    fn with_expander<R>(expressions: Expressions, f: impl FnOnce(&Expander<'_>) -> R) -> R {
        let config = Config::default();
        let registry = TemplateRegistry::new();
        let expander = Expander::new(&config, &expressions, &registry);
        f(&expander)
    }

    // =========================================================================
    // Scope
    // =========================================================================

    #[test]
    fn test_scope_views_share_global() {
        let data = json!({"a": 1});
        let mut scope = Scope::new(&data);
        scope.set_local(json!("x"));
        let child = scope.with_local(json!("y"));
        assert_eq!(child.global(), &data);
        assert_eq!(child.local(), &json!("y"));
        assert_eq!(scope.reborrow().local(), &json!("x"));
    }

    // =========================================================================
    // process_value / process_assignment
    // =========================================================================

    #[test]
    fn test_literal_only() {
        let data = json!({});
        let result = with_expander(Expressions::new(), |e| {
            e.process_value(&stack(&[(0, "plain")]), "class", &Scope::new(&data))
        });
        assert_eq!(result.as_deref(), Some("plain"));
    }

    #[test]
    fn test_selector_assignment() {
        let data = json!({"color": "red"});
        let result = with_expander(Expressions::new(), |e| {
            e.process_value(&stack(&[(1, "color")]), "class", &Scope::new(&data))
        });
        assert_eq!(result.as_deref(), Some("red"));
    }

    #[test]
    fn test_template_then_selector() {
        let data = json!({"name": "World"});
        let result = with_expander(Expressions::new(), |e| {
            e.process_value(
                &stack(&[(0, "Hello, %s!"), (1, "name")]),
                "title",
                &Scope::new(&data),
            )
        });
        assert_eq!(result.as_deref(), Some("Hello, World!"));
    }

    #[test]
    fn test_default_selector_is_stack_name() {
        let data = json!({"class": "from-data"});
        let result = with_expander(Expressions::new(), |e| {
            e.process_value(&stack(&[(1, "")]), "class", &Scope::new(&data))
        });
        assert_eq!(result.as_deref(), Some("from-data"));
    }

    #[test]
    fn test_default_selector_falls_back_to_scalar_local() {
        let data = json!("red");
        let result = with_expander(Expressions::new(), |e| {
            e.process_value(&stack(&[(1, "")]), "class", &Scope::new(&data))
        });
        assert_eq!(result.as_deref(), Some("red"));
    }

    #[test]
    fn test_missing_datum_is_absent() {
        let data = json!({});
        let result = with_expander(Expressions::new(), |e| {
            e.process_value(&stack(&[(0, "x"), (1, "missing")]), "class", &Scope::new(&data))
        });
        assert_eq!(result, None);
    }

    #[test]
    fn test_false_datum_is_absent() {
        let data = json!({"flag": false});
        let result = with_expander(Expressions::new(), |e| {
            e.process_value(&stack(&[(1, "flag")]), "class", &Scope::new(&data))
        });
        assert_eq!(result, None);
    }

    #[test]
    fn test_expression_substitution() {
        let data = json!({"name": "Ada"});
        let expressions: Expressions = [("greeting", "Hi %s")].into_iter().collect();
        let result = with_expander(expressions, |e| {
            e.process_value(
                &stack(&[(0, "GREETING"), (1, "name")]),
                "title",
                &Scope::new(&data),
            )
        });
        assert_eq!(result.as_deref(), Some("Hi Ada"));
    }

    #[test]
    fn test_three_levels_chain() {
        let data = json!({"first": "%s!", "second": "wow"});
        let result = with_expander(Expressions::new(), |e| {
            e.process_value(
                &stack(&[(0, "[%s]"), (1, "first"), (2, "second")]),
                "x",
                &Scope::new(&data),
            )
        });
        assert_eq!(result.as_deref(), Some("[wow!]"));
    }

    // =========================================================================
    // Walking
    // =========================================================================

    #[test]
    fn test_leftover_attribute_written_back() {
        let html = expand(r#"<span :class="color">x</span>"#, json!({"color": "red"}));
        assert_eq!(html, r#"<span class="red">x</span>"#);
    }

    #[test]
    fn test_plain_attributes_survive() {
        let html = expand(r#"<a href="/home" id="x">Home</a>"#, json!({}));
        assert_eq!(html, r#"<a href="/home" id="x">Home</a>"#);
    }

    #[test]
    fn test_absent_value_drops_attribute() {
        let html = expand(r#"<p title="keep" :title="nope"></p>"#, json!({}));
        assert_eq!(html, "<p></p>");
    }

    #[test]
    fn test_wrapper_is_unwrapped() {
        let html = expand("<div><:><b>a</b><i>b</i></:></div>", json!({}));
        assert_eq!(html, "<div><b>a</b><i>b</i></div>");
    }

    #[test]
    fn test_children_see_nested_scope() {
        let html = expand(
            r#"<div :="user"><span :text="name"></span></div>"#,
            json!({"user": {"name": "Ada"}}),
        );
        assert_eq!(html, "<div><span>Ada</span></div>");
    }

    #[test]
    fn test_removed_siblings_do_not_stop_walk() {
        let html = expand(
            r#"<ul><li :with="a">a</li><li :with="b">b</li><li :text="c"></li></ul>"#,
            json!({"a": false, "b": true, "c": "c"}),
        );
        assert_eq!(html, "<ul><li>b</li><li>c</li></ul>");
    }
}
