//! # Tessera - directive-driven HTML templates
//!
//! Tessera expands plain HTML documents against JSON-shaped data. Templates
//! stay valid HTML: all logic lives in attributes prefixed with a marker
//! character (`:` by default), and every marker attribute is consumed
//! during expansion, so the output carries no trace of the template
//! language.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//!
//! let template = r#"
//! <ul>
//!   <li :foreach="items" :text=""></li>
//! </ul>"#;
//!
//! let html = tessera::render(template, &json!({"items": ["a", "b"]})).unwrap();
//! assert!(html.contains("<li>a</li>"));
//! assert!(html.contains("<li>b</li>"));
//! ```
//!
//! ## Attribute Stacks
//!
//! Attributes are grouped by name with leading marker characters stripped.
//! The number of markers is the attribute's level:
//!
//! ```html
//! <a href="/books/%s.html" :href="slug" title="%s by %s" :title="name,author">link</a>
//! ```
//!
//! Level 0 (`href="/books/%s.html"`) seeds the value. Each higher level is
//! a selector whose datum is formatted into the value so far, so with
//! `{"slug": "dune", "name": "Dune", "author": "Herbert"}` this yields
//! `href="/books/dune.html"` and `title="Dune by Herbert"`. A level whose
//! datum is missing drops the attribute.
//!
//! ## Directives
//!
//! Some attribute names are directives handled by the [`Directive`]
//! pipeline rather than written back: the bare marker (`:`) nests the
//! data scope, `foreach` repeats, `with`/`without` filter, `as` exports the
//! scope under a global name, `text` sets content, and `append`/`include`
//! pull in fragments from the [`TemplateLoader`].
//!
//! A `<:>` element is a wrapper: it is processed like any element and then
//! replaced by its children.
//!
//! ## Selectors
//!
//! `a/b` reads from the local scope, `/a/b` from the global root, `a,b`
//! builds a list. See [`selector`].
//!
//! ## Modules
//!
//! - [`config`]: [`Config`] and YAML loading
//! - [`expressions`]: the named-expression dictionary
//! - [`format`]: printf-style formatting
//! - [`loader`]: [`TemplateLoader`] and [`TemplateRegistry`]
//! - [`walker`]: the tree walker ([`Expander`])

pub mod config;
pub mod error;
pub mod expressions;
pub mod format;
pub mod handlers;
pub mod loader;
mod renderer;
pub mod selector;
pub mod stack;
pub mod value;
pub mod walker;

pub use config::Config;
pub use error::{ConfigError, RenderError};
pub use expressions::Expressions;
pub use format::{evaluate, sprintf, FormatError};
pub use handlers::{Directive, Flow};
pub use loader::{
    walk_template_dir, RegistryError, ResolvedTemplate, TemplateFile, TemplateLoader,
    TemplateRegistry, TEMPLATE_EXTENSIONS,
};
pub use renderer::{render, Renderer};
pub use selector::{resolve, Resolver};
pub use stack::{extract_stacks, AttributeStack, Stacks};
pub use walker::{Expander, Scope};

pub use tessera_markup::{parse, Document, NodeId};
