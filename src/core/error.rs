//! Error handling for the mcpforge generation pipeline.
//!
//! This module defines the crate-wide `Error` type and its `Result` alias, plus
//! the two domain errors the pipeline distinguishes explicitly:
//!
//! - [`MalformedSpecError`]: a required field is missing from the raw spec. Fatal.
//! - [`TemplateInjectionError`]: a template could not be read, compiled or rendered.
//!   Carries the template path so callers can recover with a placeholder.
//!
//! # Examples
//!
//! ```
//! use mcpforge::core::error::{Error, MalformedSpecError, Result};
//!
//! fn check(name: Option<&str>) -> Result<()> {
//!     name.ok_or_else(|| MalformedSpecError::missing("project.name"))?;
//!     Ok(())
//! }
//!
//! assert!(matches!(check(None), Err(Error::MalformedSpec(_))));
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Result type for mcpforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause attached to a [`TemplateInjectionError`]
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for mcpforge operations
#[derive(Debug, Error)]
pub enum Error {
    /// The raw spec document is missing required data
    #[error(transparent)]
    MalformedSpec(#[from] MalformedSpecError),

    /// A template failed to load, compile or render
    #[error(transparent)]
    TemplateInjection(#[from] TemplateInjectionError),

    /// The pattern dependency graph contains a cycle
    #[error("Dependency cycle between patterns: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the spec document itself
    pub fn is_malformed_spec(&self) -> bool {
        matches!(self, Self::MalformedSpec(_))
    }
}

/// A required field is absent from (or invalid in) the raw spec document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed spec: `{field}` {reason}")]
pub struct MalformedSpecError {
    /// Dotted path of the offending field, e.g. `tools[2].name`
    pub field: String,
    /// Human-readable reason
    pub reason: String,
}

impl MalformedSpecError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// A required field is missing
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// Template could not be loaded, compiled or rendered
#[derive(Debug, Error)]
#[error("Template injection failed for '{template}' ({}): {message}", .template_path.display())]
pub struct TemplateInjectionError {
    /// Logical template name, e.g. `error-types`
    pub template: String,
    /// Resolved template path under the template root
    pub template_path: PathBuf,
    /// Short description of the failing step
    pub message: String,
    /// Underlying cause
    #[source]
    pub cause: Option<BoxedCause>,
}

impl TemplateInjectionError {
    pub fn new(
        template: impl Into<String>,
        template_path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            template_path: template_path.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }
}
