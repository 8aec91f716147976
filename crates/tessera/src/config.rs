//! Engine configuration.
//!
//! A [`Config`] holds the tunables of an expansion: the marker character
//! that prefixes directive attributes, the two selector separators, the
//! name of the implicit text attribute, where fragments are loaded from,
//! and the ordered directive pipeline. It deserializes from YAML with
//! kebab-case keys; every key is optional.
//!
//! ```yaml
//! marker: ":"
//! nesting-separator: "/"
//! listing-separator: ","
//! text-attribute: text
//! template-folder: templates
//! max-include-depth: 32
//! pipeline: [nest, foreach, with, without, as, text, append, include]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tessera_markup::Document;

use crate::error::ConfigError;
use crate::handlers::Directive;
use crate::selector::Resolver;

/// Characters that end or quote an attribute name in markup.
const RESERVED_MARKERS: &[char] = &['<', '>', '/', '=', '"', '\''];

/// Default nesting limit for `append` / `include`.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Expansion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Character prefixing directive attributes. Also the tag name of
    /// wrapper elements (`<:>`), which are replaced by their children.
    pub marker: char,
    /// Separates selector path segments (`a/b/c`).
    pub nesting_separator: String,
    /// Separates selectors that together yield a list (`a,b`).
    pub listing_separator: String,
    /// Attribute name receiving an element's literal text content.
    pub text_attribute: String,
    /// Directory fragments and named templates are loaded from.
    pub template_folder: Option<PathBuf>,
    /// Directive handlers, in the order they run on each element.
    pub pipeline: Vec<Directive>,
    /// Maximum nesting of fragment inclusion before rendering fails.
    pub max_include_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker: ':',
            nesting_separator: "/".to_string(),
            listing_separator: ",".to_string(),
            text_attribute: "text".to_string(),
            template_folder: None,
            pipeline: Directive::DEFAULT_PIPELINE.to_vec(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a YAML configuration document.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML configuration file.
    ///
    /// A relative `template-folder` is resolved against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&source)?;
        if let (Some(folder), Some(base)) = (&config.template_folder, path.parent()) {
            if folder.is_relative() {
                config.template_folder = Some(base.join(folder));
            }
        }
        Ok(config)
    }

    /// Sets the fragment directory.
    pub fn with_template_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.template_folder = Some(folder.into());
        self
    }

    /// Replaces the directive pipeline.
    pub fn with_pipeline(mut self, pipeline: impl IntoIterator<Item = Directive>) -> Self {
        self.pipeline = pipeline.into_iter().collect();
        self
    }

    /// Sets the directive marker character.
    pub fn with_marker(mut self, marker: char) -> Self {
        self.marker = marker;
        self
    }

    /// Checks the settings for combinations the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_alphanumeric()
            || self.marker.is_whitespace()
            || RESERVED_MARKERS.contains(&self.marker)
        {
            return Err(ConfigError::Invalid(format!(
                "marker must be a punctuation character, got {:?}",
                self.marker
            )));
        }
        if self.nesting_separator.is_empty() || self.listing_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "selector separators must not be empty".to_string(),
            ));
        }
        if self.nesting_separator == self.listing_separator {
            return Err(ConfigError::Invalid(format!(
                "nesting and listing separators must differ, both are {:?}",
                self.nesting_separator
            )));
        }
        if self.text_attribute.is_empty() {
            return Err(ConfigError::Invalid(
                "text-attribute must not be empty".to_string(),
            ));
        }
        if self.max_include_depth == 0 {
            return Err(ConfigError::Invalid(
                "max-include-depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Tag name of wrapper elements.
    pub fn wrapper_tag(&self) -> String {
        self.marker.to_string()
    }

    /// Parses template markup, reading wrapper elements named by the marker.
    pub fn parse(&self, source: &str) -> Document {
        tessera_markup::parse_with_wrapper(source, self.marker)
    }

    /// Selector resolver using this configuration's separators.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.nesting_separator, &self.listing_separator)
    }
}
