//! Error types for template expansion.
//!
//! [`RenderError`] is the single error a render can fail with. Selector
//! misses are never errors; they surface as absent values and silently drop
//! the attribute, text or node that depended on them.

use std::path::PathBuf;

use thiserror::Error;

use crate::loader::RegistryError;

/// Error type for render operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template or fragment not found by the loader.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Loader failure other than a missing name (collision, unreadable file).
    #[error(transparent)]
    Registry(RegistryError),

    /// An included fragment does not have exactly one usable root node.
    #[error("fragment \"{name}\" must have exactly one root node, found {found}")]
    MalformedFragment {
        /// Fragment name as requested by the template.
        name: String,
        /// Number of usable root nodes found.
        found: usize,
    },

    /// Fragment inclusion nested deeper than the configured limit.
    #[error("fragment inclusion deeper than {limit} levels while loading \"{name}\"")]
    RecursionLimit {
        /// Fragment that would have exceeded the limit.
        name: String,
        /// Configured `max-include-depth`.
        limit: usize,
    },

    /// Render data could not be converted to JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration or expression file problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing rendered output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RegistryError> for RenderError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { name } => RenderError::TemplateNotFound(name),
            other => RenderError::Registry(other),
        }
    }
}

/// Error type for configuration and expression dictionary loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax or shape error.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// INI syntax error.
    #[error("line {line}: {message}")]
    Ini { line: usize, message: String },

    /// Expression file with an extension no loader handles.
    #[error("unsupported expression file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Semantically invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::TemplateNotFound("page.html".to_string());
        assert!(err.to_string().contains("template not found"));
        assert!(err.to_string().contains("page.html"));
    }

    #[test]
    fn test_registry_not_found_maps_to_template_not_found() {
        let err: RenderError = RegistryError::NotFound {
            name: "x".to_string(),
        }
        .into();
        assert!(matches!(err, RenderError::TemplateNotFound(name) if name == "x"));
    }

    #[test]
    fn test_malformed_fragment_display() {
        let err = RenderError::MalformedFragment {
            name: "row.html".into(),
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "fragment \"row.html\" must have exactly one root node, found 2"
        );
    }

    #[test]
    fn test_config_error_wraps() {
        let err: RenderError = ConfigError::Ini {
            line: 3,
            message: "expected `key = value`".into(),
        }
        .into();
        assert_eq!(err.to_string(), "line 3: expected `key = value`");
    }
}
