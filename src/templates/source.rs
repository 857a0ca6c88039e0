//! Template sources.
//!
//! Templates are looked up by target language and pattern name. The filesystem
//! source resolves them as `<root>/<language>/<name>.tera`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::core::error::TemplateInjectionError;
use crate::core::language::Language;

/// File extension of template files
pub const TEMPLATE_EXTENSION: &str = "tera";

/// Where template text comes from
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Path a template resolves to, used in diagnostics even when it does not exist
    fn template_path(&self, language: Language, name: &str) -> PathBuf;

    /// Read the raw template text
    async fn read(&self, language: Language, name: &str) -> Result<String, TemplateInjectionError>;
}

/// Reads templates from a directory tree on disk
#[derive(Debug, Clone)]
pub struct FileSystemTemplateSource {
    root: PathBuf,
}

impl FileSystemTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl TemplateSource for FileSystemTemplateSource {
    fn template_path(&self, language: Language, name: &str) -> PathBuf {
        self.root
            .join(language.as_str())
            .join(format!("{name}.{TEMPLATE_EXTENSION}"))
    }

    async fn read(&self, language: Language, name: &str) -> Result<String, TemplateInjectionError> {
        let path = self.template_path(language, name);
        debug!(template = name, path = %path.display(), "Reading template");

        fs::read_to_string(&path).await.map_err(|e| {
            TemplateInjectionError::new(name, &path, "template could not be read").with_cause(e)
        })
    }
}
