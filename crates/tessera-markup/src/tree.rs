//! Arena-backed document tree.
//!
//! Nodes live in a single `Vec` owned by the [`Document`] and are addressed
//! by [`NodeId`]. Detaching a node only unlinks it from its parent: the node
//! and its subtree stay in the arena, so ids held by a caller never dangle
//! while a tree is being rewritten. Detached subtrees are simply unreachable
//! from the root and are never serialized.

/// Handle to a node inside a [`Document`].
///
/// Ids are only meaningful for the document that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element: tag name plus ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name (lowercase).
    pub name: String,
    /// Attributes as (name, decoded value) pairs. Parsed elements list them
    /// by name; later inserts go last.
    pub attributes: Vec<(String, String)>,
}

impl Element {
    /// Creates an element without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Returns the value of an attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Removes an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(pos).1)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Only ever the node at index 0.
    Document,
    /// `<!DOCTYPE ...>`; holds the declaration body.
    Doctype(String),
    /// `<!-- ... -->`; holds the comment body.
    Comment(String),
    /// Decoded character data.
    Text(String),
    /// An element with attributes and children.
    Element(Element),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Returns the root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Creates a detached node.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Creates a detached element without attributes.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Element(Element::new(name)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Text(text.into()))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    /// Returns the element data if the node is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns mutable element data if the node is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Returns the tag name if the node is an element.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Returns the text if the node is a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Returns an attribute value of an element node.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get(name))
    }

    /// Sets an attribute on an element node. No-op for other node kinds.
    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.set(name, value);
        }
    }

    /// Removes an attribute from an element node, returning its value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|e| e.remove(name))
    }

    /// Unlinks a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Appends text to `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        let id = self.create_text(text);
        self.append_child(parent, id);
    }

    /// Inserts `node` as the previous sibling of `reference`.
    ///
    /// Returns `false` (and leaves `node` detached) when `reference` has no parent.
    pub fn insert_before(&mut self, node: NodeId, reference: NodeId) -> bool {
        self.detach(node);
        let Some(parent) = self.nodes[reference.0].parent else {
            return false;
        };
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(pos, node);
        self.nodes[node.0].parent = Some(parent);
        true
    }

    /// Deep-copies a subtree within this document. The copy is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let copy = self.create_node(kind);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.nodes[copy.0].children.push(child_copy);
            self.nodes[child_copy.0].parent = Some(copy);
        }
        copy
    }

    /// Deep-copies a subtree from another document into this one. The copy is detached.
    pub fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.create_node(other.kind(id).clone());
        for &child in other.children(id) {
            let child_copy = self.import(other, child);
            self.nodes[copy.0].children.push(child_copy);
            self.nodes[child_copy.0].parent = Some(copy);
        }
        copy
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) | NodeKind::Document => {
                for &child in &self.nodes[id.0].children {
                    self.collect_text(child, out);
                }
            }
            NodeKind::Doctype(_) | NodeKind::Comment(_) => {}
        }
    }

    /// Replaces all children of `id` with a single text node.
    ///
    /// An empty `text` leaves the node without children.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
        let text = text.into();
        if !text.is_empty() {
            let text_id = self.create_text(text);
            self.append_child(id, text_id);
        }
    }

    /// Moves all children of `id` to its position in the parent, in order.
    ///
    /// `id` itself stays in place, now empty. Returns `false` when `id`
    /// has no parent, in which case nothing moves.
    pub fn unwrap(&mut self, id: NodeId) -> bool {
        if self.nodes[id.0].parent.is_none() {
            return false;
        }
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
            self.insert_before(child, id);
        }
        true
    }

    /// Number of nodes ever allocated in the arena (attached or not).
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .iter()
            .map(|&c| match doc.kind(c) {
                NodeKind::Element(e) => e.name.clone(),
                NodeKind::Text(t) => format!("#{}", t),
                _ => "?".to_string(),
            })
            .collect()
    }

    #[test]
    fn append_and_insert_before() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("a");
        let c = doc.create_element("c");
        doc.append_child(root, a);
        doc.append_child(root, c);
        let b = doc.create_element("b");
        assert!(doc.insert_before(b, c));
        assert_eq!(names(&doc, root), vec!["a", "b", "c"]);
        assert_eq!(doc.parent(b), Some(root));
    }

    #[test]
    fn insert_before_detached_reference_fails() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        assert!(!doc.insert_before(b, a));
        assert_eq!(doc.parent(b), None);
    }

    #[test]
    fn detach_keeps_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("a");
        doc.append_child(root, a);
        doc.append_text(a, "hi");
        doc.detach(a);
        assert!(doc.children(root).is_empty());
        assert_eq!(doc.text_content(a), "hi");
    }

    #[test]
    fn deep_clone_is_independent() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("a");
        doc.append_child(root, a);
        doc.set_attribute(a, "class", "x");
        doc.append_text(a, "hi");

        let copy = doc.deep_clone(a);
        assert_eq!(doc.parent(copy), None);
        doc.set_attribute(copy, "class", "y");
        doc.set_text(copy, "bye");

        assert_eq!(doc.attribute(a, "class"), Some("x"));
        assert_eq!(doc.text_content(a), "hi");
        assert_eq!(doc.text_content(copy), "bye");
    }

    #[test]
    fn import_from_other_document() {
        let mut other = Document::new();
        let oroot = other.root();
        let p = other.create_element("p");
        other.append_child(oroot, p);
        other.append_text(p, "x");

        let mut doc = Document::new();
        let copy = doc.import(&other, p);
        let root = doc.root();
        doc.append_child(root, copy);
        assert_eq!(doc.element_name(copy), Some("p"));
        assert_eq!(doc.text_content(root), "x");
    }

    #[test]
    fn append_text_merges() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.append_text(root, "a");
        doc.append_text(root, "b");
        assert_eq!(doc.children(root).len(), 1);
        assert_eq!(doc.text_content(root), "ab");
    }

    #[test]
    fn set_text_replaces_children() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(root, a);
        doc.append_child(a, b);
        doc.set_text(a, "t");
        assert_eq!(names(&doc, a), vec!["#t"]);
        assert_eq!(doc.parent(b), None);

        doc.set_text(a, "");
        assert!(doc.children(a).is_empty());
    }

    #[test]
    fn unwrap_splices_children_in_place() {
        let mut doc = Document::new();
        let root = doc.root();
        let first = doc.create_element("first");
        let wrapper = doc.create_element(":");
        let last = doc.create_element("last");
        doc.append_child(root, first);
        doc.append_child(root, wrapper);
        doc.append_child(root, last);
        let x = doc.create_element("x");
        let y = doc.create_element("y");
        doc.append_child(wrapper, x);
        doc.append_child(wrapper, y);

        assert!(doc.unwrap(wrapper));
        assert_eq!(names(&doc, root), vec!["first", "x", "y", ":", "last"]);
        assert!(doc.children(wrapper).is_empty());
    }

    #[test]
    fn attribute_order_is_preserved() {
        let mut element = Element::new("a");
        element.set("b", "1");
        element.set("a", "2");
        element.set("b", "3");
        assert_eq!(
            element.attributes,
            vec![("b".to_string(), "3".to_string()), ("a".to_string(), "2".to_string())]
        );
        assert_eq!(element.remove("b"), Some("3".to_string()));
        assert_eq!(element.remove("b"), None);
    }
}
