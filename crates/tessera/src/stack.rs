//! Attribute stacks.
//!
//! Every attribute of an element is read as one level of a named stack. The
//! number of leading marker characters is the level, the rest is the stack
//! name:
//!
//! ```html
//! <a href="%s.html" :href="slug" ::class="">
//! ```
//!
//! gives the stack `href` with level 0 `%s.html` and level 1 `slug`, and
//! the stack `class` with only level 2. Level 0 holds plain attribute
//! values; higher levels hold selectors evaluated in turn.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tessera_markup::{Document, NodeId};

use crate::config::Config;

/// The levels of one attribute, ordered by level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeStack {
    levels: BTreeMap<usize, String>,
}

impl AttributeStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text at `level`.
    pub fn insert(&mut self, level: usize, text: impl Into<String>) {
        self.levels.insert(level, text.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, level: usize, text: impl Into<String>) -> Self {
        self.insert(level, text);
        self
    }

    /// Text at `level`.
    pub fn get(&self, level: usize) -> Option<&str> {
        self.levels.get(&level).map(String::as_str)
    }

    /// The level-0 (plain attribute) value.
    pub fn literal(&self) -> Option<&str> {
        self.get(0)
    }

    /// Returns true if the stack has a level-0 value.
    pub fn has_literal(&self) -> bool {
        self.levels.contains_key(&0)
    }

    /// Levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = (usize, &str)> {
        self.levels.iter().map(|(&level, text)| (level, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// All stacks of one element, in the order their names first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stacks {
    entries: IndexMap<String, AttributeStack>,
}

impl Stacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack named `name`, if any level of it was present.
    pub fn get(&self, name: &str) -> Option<&AttributeStack> {
        self.entries.get(name)
    }

    /// Removes and returns the stack named `name`, keeping the order of
    /// the rest.
    pub fn take(&mut self, name: &str) -> Option<AttributeStack> {
        self.entries.shift_remove(name)
    }

    /// Mutable access to a stack, creating it if needed.
    pub fn entry(&mut self, name: impl Into<String>) -> &mut AttributeStack {
        self.entries.entry(name.into()).or_default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Stacks {
    type Item = (String, AttributeStack);
    type IntoIter = indexmap::map::IntoIter<String, AttributeStack>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Reads every attribute of `node` into stacks and strips the attributes.
///
/// When the element's only child is a text node, that text becomes level 0
/// of the text-attribute stack unless a plain attribute of that name
/// already supplied one. Non-element nodes yield no stacks.
pub fn extract_stacks(doc: &mut Document, node: NodeId, config: &Config) -> Stacks {
    let mut stacks = Stacks::new();
    let Some(element) = doc.element_mut(node) else {
        return stacks;
    };

    for (name, text) in std::mem::take(&mut element.attributes) {
        let level = name.chars().take_while(|&c| c == config.marker).count();
        let base = name.trim_start_matches(config.marker);
        stacks.entry(base).insert(level, text);
    }

    if let [only] = doc.children(node) {
        if let Some(text) = doc.text(*only) {
            let stack = stacks.entry(config.text_attribute.as_str());
            if !stack.has_literal() {
                stack.insert(0, text);
            }
        }
    }
    stacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_markup::parse;

    fn first_element(doc: &Document) -> NodeId {
        doc.children(doc.root())
            .iter()
            .copied()
            .find(|&id| doc.is_element(id))
            .unwrap()
    }

    fn extract(html: &str) -> (Document, NodeId, Stacks) {
        let mut doc = parse(html);
        let node = first_element(&doc);
        let stacks = extract_stacks(&mut doc, node, &Config::default());
        (doc, node, stacks)
    }

    #[test]
    fn test_levels_from_marker_count() {
        let (_, _, stacks) = extract(r##"<a href="#" :href="%s.html" ::href="slug"></a>"##);
        let href = stacks.get("href").unwrap();
        assert_eq!(href.get(0), Some("#"));
        assert_eq!(href.get(1), Some("%s.html"));
        assert_eq!(href.get(2), Some("slug"));
        assert_eq!(href.len(), 3);
    }

    #[test]
    fn test_attributes_are_consumed() {
        let (doc, node, stacks) = extract(r#"<p class="x" :title="t"></p>"#);
        assert!(doc.element(node).unwrap().attributes.is_empty());
        // Parsed attributes arrive ordered by name, marker prefixes first
        assert_eq!(stacks.names().collect::<Vec<_>>(), vec!["title", "class"]);
    }

    #[test]
    fn test_bare_marker_is_nesting_stack() {
        let (_, _, stacks) = extract(r#"<div :="user" ::="address"></div>"#);
        let nest = stacks.get("").unwrap();
        assert_eq!(nest.levels().collect::<Vec<_>>(), vec![(1, "user"), (2, "address")]);
        assert!(!nest.has_literal());
    }

    #[test]
    fn test_levels_iterate_in_order_regardless_of_source_order() {
        let (_, _, stacks) = extract(r#"<b :::x="c" x="a" :x="b"></b>"#);
        let levels: Vec<_> = stacks.get("x").unwrap().levels().collect();
        assert_eq!(levels, vec![(0, "a"), (1, "b"), (3, "c")]);
    }

    #[test]
    fn test_single_text_child_becomes_text_literal() {
        let (_, _, stacks) = extract(r#"<span :text="name">placeholder</span>"#);
        let text = stacks.get("text").unwrap();
        assert_eq!(text.literal(), Some("placeholder"));
        assert_eq!(text.get(1), Some("name"));
    }

    #[test]
    fn test_text_attribute_wins_over_content() {
        let (_, _, stacks) = extract(r#"<span text="attr">content</span>"#);
        assert_eq!(stacks.get("text").unwrap().literal(), Some("attr"));
    }

    #[test]
    fn test_mixed_children_give_no_text_stack() {
        let (_, _, stacks) = extract("<p>a<b>b</b></p>");
        assert!(stacks.get("text").is_none());
    }

    #[test]
    fn test_take_keeps_order() {
        let (_, _, mut stacks) = extract(r#"<p a="1" b="2" c="3"></p>"#);
        assert!(stacks.take("b").is_some());
        assert!(stacks.take("b").is_none());
        let names: Vec<String> = stacks.into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_custom_marker() {
        let config = Config::default().with_marker('@');
        let mut doc = parse(r#"<p @@class="c" :class="plain"></p>"#);
        let node = first_element(&doc);
        let stacks = extract_stacks(&mut doc, node, &config);
        assert_eq!(stacks.get("class").unwrap().get(2), Some("c"));
        assert_eq!(stacks.get(":class").unwrap().literal(), Some("plain"));
    }
}
