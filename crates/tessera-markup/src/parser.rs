//! Tree builder on top of the `html5gum` tokenizer.
//!
//! Parsing never fails. Malformed input produces whatever tree the
//! recovery rules below yield:
//!
//! - Void elements never receive children; a self-closing start tag closes
//!   any element immediately.
//! - An end tag closes the nearest open element with that name, implicitly
//!   closing everything opened after it.
//! - An end tag with no open counterpart is dropped.
//! - Elements still open at end of input are closed there.
//!
//! Unlike a browser, no `html`, `head` or `body` elements are implied, so a
//! fragment parses to exactly the nodes it spells out.

use std::borrow::Cow;

use html5gum::{State, Token, Tokenizer};

use crate::is_void_element;
use crate::tree::{Document, Element, NodeId, NodeKind};

/// Marker used for wrapper elements by [`parse`].
pub const DEFAULT_WRAPPER: char = ':';

/// Tag name that wrapper elements carry while they pass through the
/// tokenizer. Markup that spells it out literally is read as a wrapper too.
pub const WRAPPER_PLACEHOLDER: &str = "tessera-wrapper";

/// Parses markup into a [`Document`], reading `<:>` as a wrapper element.
///
/// Character references in text and attribute values are decoded; the
/// content of raw-text elements (`script`, `style`) is kept verbatim.
///
/// # Example
///
/// ```rust
/// use tessera_markup::parse;
///
/// let doc = parse("<p class=\"greeting\">Hi &amp; bye</p>");
/// let p = doc.children(doc.root())[0];
/// assert_eq!(doc.attribute(p, "class"), Some("greeting"));
/// assert_eq!(doc.text_content(p), "Hi & bye");
/// ```
pub fn parse(input: &str) -> Document {
    parse_with_wrapper(input, DEFAULT_WRAPPER)
}

/// Parses markup, reading `<M>...</M>` as a wrapper element named `M` for
/// the given marker character.
///
/// A WHATWG tokenizer only opens tags on an ASCII letter, so wrapper tags
/// are renamed to [`WRAPPER_PLACEHOLDER`] before tokenizing and get their
/// marker name back in the tree.
///
/// ```rust
/// use tessera_markup::parse_with_wrapper;
///
/// let doc = parse_with_wrapper("<@><b>1</b></@>", '@');
/// let wrapper = doc.children(doc.root())[0];
/// assert_eq!(doc.element_name(wrapper), Some("@"));
/// ```
pub fn parse_with_wrapper(input: &str, marker: char) -> Document {
    let source = mask_wrappers(input, marker);
    let wrapper = marker.to_string();

    let mut doc = Document::new();
    let root = doc.root();
    let mut open: Vec<NodeId> = vec![root];
    let mut tokenizer = Tokenizer::new(&*source);

    while let Some(token) = tokenizer.next().and_then(Result::ok) {
        let current = open.last().copied().unwrap_or(root);
        match token {
            Token::StartTag(tag) => {
                let name = tag_name(&tag.name, &wrapper);
                let mut element = Element::new(name.clone());
                element.attributes = tag
                    .attributes
                    .iter()
                    .map(|(k, v)| {
                        (
                            String::from_utf8_lossy(k).into_owned(),
                            String::from_utf8_lossy(v).into_owned(),
                        )
                    })
                    .collect();
                let id = doc.create_node(NodeKind::Element(element));
                doc.append_child(current, id);

                if tag.self_closing || is_void_element(&name) {
                    continue;
                }
                match name.as_str() {
                    "script" | "style" => tokenizer.set_state(State::ScriptData),
                    "textarea" | "title" => tokenizer.set_state(State::RcData),
                    _ => {}
                }
                open.push(id);
            }
            Token::EndTag(tag) => {
                let name = tag_name(&tag.name, &wrapper);
                // Index 0 is the document root and never matches
                if let Some(pos) = (1..open.len())
                    .rev()
                    .find(|&i| doc.element_name(open[i]) == Some(name.as_str()))
                {
                    open.truncate(pos);
                }
            }
            Token::String(text) => doc.append_text(current, &String::from_utf8_lossy(&text)),
            Token::Comment(body) => {
                let body = String::from_utf8_lossy(&body).into_owned();
                let id = doc.create_node(NodeKind::Comment(body));
                doc.append_child(current, id);
            }
            Token::Doctype(doctype) => {
                let name = String::from_utf8_lossy(&doctype.name).to_ascii_lowercase();
                let body = if name.is_empty() {
                    "DOCTYPE".to_string()
                } else {
                    format!("DOCTYPE {}", name)
                };
                let id = doc.create_node(NodeKind::Doctype(body));
                doc.append_child(current, id);
            }
            Token::Error(_) => {}
        }
    }

    doc
}

fn tag_name(raw: &[u8], wrapper: &str) -> String {
    let name = String::from_utf8_lossy(raw).to_ascii_lowercase();
    if name == WRAPPER_PLACEHOLDER {
        wrapper.to_string()
    } else {
        name
    }
}

/// Renames `<M`, `</M` to the placeholder tag when `M` is followed by `>`,
/// `/` or whitespace.
fn mask_wrappers(input: &str, marker: char) -> Cow<'_, str> {
    let mut out = String::new();
    let mut last = 0;

    for (start, _) in input.match_indices('<') {
        let after_lt = &input[start + 1..];
        let (closing, rest) = match after_lt.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, after_lt),
        };
        let Some(after) = rest.strip_prefix(marker) else {
            continue;
        };
        if !after.starts_with(|c: char| c == '>' || c == '/' || c.is_ascii_whitespace()) {
            continue;
        }
        let name_at = start + 1 + usize::from(closing);
        out.push_str(&input[last..name_at]);
        out.push_str(WRAPPER_PLACEHOLDER);
        last = name_at + marker.len_utf8();
    }

    if last == 0 {
        Cow::Borrowed(input)
    } else {
        out.push_str(&input[last..]);
        Cow::Owned(out)
    }
}
