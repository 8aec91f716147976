//! Render entry points.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tessera_markup::Document;
use tracing::debug;

use crate::config::Config;
use crate::error::RenderError;
use crate::expressions::Expressions;
use crate::loader::{TemplateLoader, TemplateRegistry};
use crate::walker::Expander;

/// Renders named or inline templates against serializable data.
///
/// # Example
///
/// ```rust
/// use tessera::{Config, Renderer};
/// use serde_json::json;
///
/// let mut renderer = Renderer::new(Config::default()).unwrap();
/// renderer.add_template("greeting", r#"<p :text="name">Hello, %s!</p>"#);
///
/// let html = renderer.render("greeting", &json!({"name": "Ada"})).unwrap();
/// assert_eq!(html, "<p>Hello, Ada!</p>");
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    config: Config,
    expressions: Expressions,
    registry: TemplateRegistry,
}

impl Renderer {
    /// Creates a renderer, registering `template-folder` when configured.
    pub fn new(config: Config) -> Result<Self, RenderError> {
        config.validate()?;
        let mut registry = TemplateRegistry::new();
        if let Some(folder) = &config.template_folder {
            registry.add_template_dir(folder)?;
        }
        Ok(Self {
            config,
            expressions: Expressions::new(),
            registry,
        })
    }

    /// Reads a YAML configuration file and creates a renderer from it.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        Self::new(Config::from_file(path)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Adds an inline template, shadowing any file of the same name.
    pub fn add_template(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.registry.add_inline(name, source);
    }

    /// Registers another template directory.
    pub fn add_template_dir(&mut self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        self.registry.add_template_dir(path)?;
        Ok(())
    }

    /// Merges an INI or YAML expression file into the dictionary.
    pub fn load_expressions(&mut self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        self.expressions.load_file(path)?;
        Ok(())
    }

    pub fn expressions(&self) -> &Expressions {
        &self.expressions
    }

    pub fn expressions_mut(&mut self) -> &mut Expressions {
        &mut self.expressions
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Renders the named template.
    pub fn render<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String, RenderError> {
        let doc = self.registry.load_document(name, &self.config)?;
        debug!(template = name, "rendering template");
        self.expand(doc, data)
    }

    /// Renders a template given as source text.
    pub fn render_str<T: Serialize + ?Sized>(
        &self,
        source: &str,
        data: &T,
    ) -> Result<String, RenderError> {
        self.expand(self.config.parse(source), data)
    }

    /// Renders the named template into `writer`.
    pub fn render_to<T: Serialize + ?Sized, W: Write>(
        &self,
        name: &str,
        data: &T,
        mut writer: W,
    ) -> Result<(), RenderError> {
        let html = self.render(name, data)?;
        writer.write_all(html.as_bytes())?;
        Ok(())
    }

    fn expand<T: Serialize + ?Sized>(&self, mut doc: Document, data: &T) -> Result<String, RenderError> {
        let data: Value = serde_json::to_value(data)?;
        Expander::new(&self.config, &self.expressions, &self.registry).expand(&mut doc, &data)?;
        Ok(doc.to_html())
    }
}

/// Renders template source against `data` with the default configuration.
///
/// Fragments cannot be loaded since no template folder is set.
pub fn render<T: Serialize + ?Sized>(source: &str, data: &T) -> Result<String, RenderError> {
    let config = Config::default();
    let expressions = Expressions::new();
    let registry = TemplateRegistry::new();
    let mut doc = config.parse(source);
    let data = serde_json::to_value(data)?;
    Expander::new(&config, &expressions, &registry).expand(&mut doc, &data)?;
    Ok(doc.to_html())
}
