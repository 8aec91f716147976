//! Markup serialization for [`Document`].

use std::fmt::Write;

use crate::tree::{Document, NodeId, NodeKind};
use crate::{is_raw_text_element, is_void_element};

impl Document {
    /// Serializes the whole document to markup.
    pub fn to_html(&self) -> String {
        self.node_to_html(self.root())
    }

    /// Serializes one node and its subtree. For the root this is the
    /// concatenation of its children.
    pub fn node_to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Document => self.write_children(id, out),
            NodeKind::Doctype(body) => {
                out.push_str("<!");
                out.push_str(body);
                out.push('>');
            }
            NodeKind::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            NodeKind::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|p| self.element_name(p))
                    .is_some_and(is_raw_text_element);
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&html_escape::encode_text(text));
                }
            }
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (name, value) in &element.attributes {
                    if value.is_empty() {
                        let _ = write!(out, " {}", name);
                    } else {
                        let _ = write!(
                            out,
                            " {}=\"{}\"",
                            name,
                            html_escape::encode_double_quoted_attribute(value)
                        );
                    }
                }
                out.push('>');
                if is_void_element(&element.name) {
                    return;
                }
                self.write_children(id, out);
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }

    fn write_children(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            self.write_node(child, out);
        }
    }
}
