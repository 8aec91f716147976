//! Lenient markup handling for directive templates.
//!
//! This crate provides the three pieces a template expander needs from an
//! HTML toolkit, and nothing more:
//!
//! - [`parse`]: a forgiving tree builder over the `html5gum` tokenizer that
//!   never rejects input
//! - [`Document`]: an arena-backed tree that can be rewritten while it is
//!   being walked (clone, insert before, detach, unwrap)
//! - [`Document::to_html`]: serialization back to markup
//!
//! # Example
//!
//! ```rust
//! use tessera_markup::parse;
//!
//! let mut doc = parse("<ul><li :foreach=\"items\">x</li></ul>");
//! let ul = doc.children(doc.root())[0];
//! let li = doc.children(ul)[0];
//!
//! // Repeat the item, then drop the template node
//! for _ in 0..2 {
//!     let copy = doc.deep_clone(li);
//!     doc.remove_attribute(copy, ":foreach");
//!     doc.insert_before(copy, li);
//! }
//! doc.detach(li);
//!
//! assert_eq!(doc.to_html(), "<ul><li>x</li><li>x</li></ul>");
//! ```
//!
//! # Wrapper Elements
//!
//! A template can group nodes in an element named by a bare marker
//! character (`<:>...</:>`). [`parse`] reads `:` wrappers and
//! [`parse_with_wrapper`] takes any other marker. Tag and attribute names
//! are lowercased, and attributes come out ordered by name.

mod parser;
mod serialize;
mod tree;

pub use parser::{parse, parse_with_wrapper, DEFAULT_WRAPPER, WRAPPER_PLACEHOLDER};
pub use tree::{Document, Element, NodeId, NodeKind};

/// HTML void elements that cannot have children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text (not decoded, not escaped).
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Checks whether `name` is a void element.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Checks whether `name` is a raw-text element.
pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}
