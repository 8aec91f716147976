//! Template loading.
//!
//! Templates and fragments are fetched by name through the
//! [`TemplateLoader`] trait. [`TemplateRegistry`] is the provided
//! implementation: it resolves names against inline sources and any number
//! of template directories.
//!
//! # Template Resolution
//!
//! 1. Inline templates (added via [`TemplateRegistry::add_inline`]) have
//!    highest priority
//! 2. File templates are searched across registered directories
//! 3. Names can be given with or without extension: both `"row"` and
//!    `"row.html"` resolve, as do nested paths such as `"parts/row"`
//!
//! # Supported Extensions
//!
//! | Priority | Extension |
//! |----------|-----------|
//! | 1 (highest) | `.html` |
//! | 2 | `.htm` |
//! | 3 | `.xhtml` |
//! | 4 (lowest) | `.tpl` |
//!
//! When `row.html` and `row.tpl` sit in the same directory, `"row"` is
//! `row.html`. The same name in two different directories is a
//! [`RegistryError::Collision`].
//!
//! File content is read on every load, so edits show up without rebuilding
//! the registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tessera_markup::Document;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::error::RenderError;

/// Recognized template file extensions in priority order.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".html", ".htm", ".xhtml", ".tpl"];

/// Source of templates and fragments.
pub trait TemplateLoader {
    /// Returns the raw markup of `name`.
    fn load_source(&self, name: &str) -> Result<String, RenderError>;

    /// Returns `name` parsed into a document, with wrapper elements named by
    /// the configured marker. Parsing never fails.
    fn load_document(&self, name: &str, config: &Config) -> Result<Document, RenderError> {
        let source = self.load_source(name)?;
        Ok(config.parse(&source))
    }
}

/// A template file discovered during directory walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Resolution name without extension (e.g. `"parts/row"`)
    pub name: String,
    /// Resolution name with extension (e.g. `"parts/row.html"`)
    pub name_with_ext: String,
    /// Absolute path to the file
    pub absolute_path: PathBuf,
    /// The template directory this file was found in
    pub source_dir: PathBuf,
}

impl TemplateFile {
    pub fn new(
        name: impl Into<String>,
        name_with_ext: impl Into<String>,
        absolute_path: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            name_with_ext: name_with_ext.into(),
            absolute_path: absolute_path.into(),
            source_dir: source_dir.into(),
        }
    }

    /// Returns the extension priority (lower is higher priority), or
    /// `usize::MAX` for unrecognized extensions.
    pub fn extension_priority(&self) -> usize {
        TEMPLATE_EXTENSIONS
            .iter()
            .position(|ext| self.name_with_ext.ends_with(ext))
            .unwrap_or(usize::MAX)
    }
}

/// Where a resolved template's content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTemplate {
    /// Content held in memory.
    Inline(String),
    /// Content read from this path on demand.
    File(PathBuf),
}

/// Error type for template registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two template directories contain files that resolve to the same name.
    #[error(
        "template collision detected for \"{name}\":\n  - {} (from {})\n  - {} (from {})",
        .existing_path.display(),
        .existing_dir.display(),
        .conflicting_path.display(),
        .conflicting_dir.display()
    )]
    Collision {
        name: String,
        existing_path: PathBuf,
        existing_dir: PathBuf,
        conflicting_path: PathBuf,
        conflicting_dir: PathBuf,
    },

    /// Template not found in registry.
    #[error("template not found: \"{name}\"")]
    NotFound { name: String },

    /// Failed to read a template file or directory.
    #[error("failed to read template \"{}\": {message}", .path.display())]
    ReadError { path: PathBuf, message: String },
}

/// Registry resolving template names to inline or on-disk sources.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    inline: HashMap<String, String>,
    files: HashMap<String, PathBuf>,
    /// name → (path, source_dir), for collision detection.
    sources: HashMap<String, (PathBuf, PathBuf)>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inline template. Inline templates shadow files of the same name.
    pub fn add_inline(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.inline.insert(name.into(), content.into());
    }

    /// Registers every template file under `path`, recursively.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ReadError`] if the directory cannot be read
    /// and [`RegistryError::Collision`] if a name is already provided by
    /// another directory.
    pub fn add_template_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RegistryError> {
        let files = walk_template_dir(path.as_ref())?;
        debug!(dir = %path.as_ref().display(), count = files.len(), "registered template directory");
        self.add_from_files(files)
    }

    /// Registers discovered files under both their names.
    pub fn add_from_files(&mut self, files: Vec<TemplateFile>) -> Result<(), RegistryError> {
        let mut sorted_files = files;
        sorted_files.sort_by_key(|f| f.extension_priority());

        for file in sorted_files {
            if let Some((existing_path, existing_dir)) = self.sources.get(&file.name) {
                if existing_dir != &file.source_dir {
                    return Err(RegistryError::Collision {
                        name: file.name.clone(),
                        existing_path: existing_path.clone(),
                        existing_dir: existing_dir.clone(),
                        conflicting_path: file.absolute_path.clone(),
                        conflicting_dir: file.source_dir.clone(),
                    });
                }
                // Same directory, lower-priority extension: reachable by full name only.
                self.files
                    .insert(file.name_with_ext.clone(), file.absolute_path);
                continue;
            }

            self.sources.insert(
                file.name.clone(),
                (file.absolute_path.clone(), file.source_dir.clone()),
            );
            self.files
                .insert(file.name.clone(), file.absolute_path.clone());
            self.files.insert(file.name_with_ext, file.absolute_path);
        }
        Ok(())
    }

    /// Looks up a template by name.
    pub fn get(&self, name: &str) -> Result<ResolvedTemplate, RegistryError> {
        if let Some(content) = self.inline.get(name) {
            return Ok(ResolvedTemplate::Inline(content.clone()));
        }
        if let Some(path) = self.files.get(name) {
            return Ok(ResolvedTemplate::File(path.clone()));
        }
        Err(RegistryError::NotFound {
            name: name.to_string(),
        })
    }

    /// Gets the content of a template, reading from disk if necessary.
    pub fn get_content(&self, name: &str) -> Result<String, RegistryError> {
        match self.get(name)? {
            ResolvedTemplate::Inline(content) => Ok(content),
            ResolvedTemplate::File(path) => {
                std::fs::read_to_string(&path).map_err(|e| RegistryError::ReadError {
                    path,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Number of registered names (a file counts once per name).
    pub fn len(&self) -> usize {
        self.inline.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.files.is_empty()
    }

    /// All registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inline
            .keys()
            .chain(self.files.keys())
            .map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.inline.clear();
        self.files.clear();
        self.sources.clear();
    }
}

impl TemplateLoader for TemplateRegistry {
    fn load_source(&self, name: &str) -> Result<String, RenderError> {
        Ok(self.get_content(name)?)
    }
}

/// Walks a template directory and collects template files.
///
/// The result is unsorted; see [`TemplateFile::extension_priority`].
pub fn walk_template_dir(root: impl AsRef<Path>) -> Result<Vec<TemplateFile>, RegistryError> {
    let root = root.as_ref();
    let root = root.canonicalize().map_err(|e| RegistryError::ReadError {
        path: root.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut files = Vec::new();
    walk_recursive(&root, &root, &mut files)?;
    Ok(files)
}

fn walk_recursive(
    current: &Path,
    root: &Path,
    files: &mut Vec<TemplateFile>,
) -> Result<(), RegistryError> {
    let read_error = |e: std::io::Error| RegistryError::ReadError {
        path: current.to_path_buf(),
        message: e.to_string(),
    };

    for entry in std::fs::read_dir(current).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_dir() {
            walk_recursive(&path, root, files)?;
        } else if path.is_file() {
            if let Some(file) = template_file(&path, root) {
                files.push(file);
            }
        }
    }
    Ok(())
}

fn template_file(path: &Path, root: &Path) -> Option<TemplateFile> {
    let relative = path.strip_prefix(root).ok()?;
    let name_with_ext = relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/");
    let extension = TEMPLATE_EXTENSIONS
        .iter()
        .find(|ext| name_with_ext.ends_with(*ext))?;
    let name = name_with_ext.strip_suffix(extension)?.to_string();
    Some(TemplateFile::new(name, name_with_ext, path, root))
}
