//! Template loading, compilation and rendering.
//!
//! Each template is compiled into its own [`Tera`] instance with the helper library
//! registered, then cached by `(language, name)` so later renders skip the read and
//! the parse. Every failure surfaces as a [`TemplateInjectionError`] naming the
//! template path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::{debug, error};

use crate::core::error::{Result, TemplateInjectionError};
use crate::core::language::Language;
use crate::patterns::kinds::Section;
use crate::patterns::manifest::{GlobalPatternSelection, ToolPatternSelection};

use super::cache::TemplateCache;
use super::helpers::register_helpers;
use super::source::{FileSystemTemplateSource, TemplateSource};

static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(import\s+.*?;?|from\s+\S+\s+import\s+.+?)[ \t]*$")
        .expect("import pattern is a valid regex")
});

/// A parsed template ready to render
#[derive(Debug)]
pub struct CompiledTemplate {
    name: String,
    path: PathBuf,
    tera: Tera,
}

impl CompiledTemplate {
    pub fn compile(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        text: &str,
    ) -> std::result::Result<Self, TemplateInjectionError> {
        let name = name.into();
        let path = path.into();

        let mut tera = Tera::default();
        register_helpers(&mut tera);
        tera.autoescape_on(vec![]);
        tera.add_raw_template(&name, text).map_err(|e| {
            TemplateInjectionError::new(&name, &path, describe("compile", &e)).with_cause(e)
        })?;

        Ok(Self { name, path, tera })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self, context: &Context) -> std::result::Result<String, TemplateInjectionError> {
        self.tera.render(&self.name, context).map_err(|e| {
            TemplateInjectionError::new(&self.name, &self.path, describe("render", &e))
                .with_cause(e)
        })
    }
}

/// Flatten a Tera error chain into one line; Tera keeps the useful part in `source()`
fn describe(step: &str, error: &tera::Error) -> String {
    let mut message = format!("failed to {step}: {error}");
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}

/// Rendered source code for one selected pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedFragment {
    pub pattern: String,
    pub tool_name: Option<String>,
    pub code: String,
    /// Import statements found in `code`, in order of appearance
    pub imports: Vec<String>,
    pub section: Section,
    pub output_file: String,
}

/// Line-level scan for import statements in rendered code
pub fn extract_imports(code: &str) -> Vec<String> {
    IMPORT_LINE
        .captures_iter(code)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

pub struct TemplateRenderer {
    source: Arc<dyn TemplateSource>,
    cache: Arc<TemplateCache>,
    language: Language,
}

impl TemplateRenderer {
    pub fn new(
        source: Arc<dyn TemplateSource>,
        cache: Arc<TemplateCache>,
        language: Language,
    ) -> Self {
        Self {
            source,
            cache,
            language,
        }
    }

    /// Renderer over `<template_dir>/<language>/` with its own cache
    pub fn from_dir(template_dir: impl Into<PathBuf>, language: Language) -> Self {
        Self::new(
            Arc::new(FileSystemTemplateSource::new(template_dir)),
            Arc::new(TemplateCache::new()),
            language,
        )
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    pub fn template_path(&self, name: &str) -> PathBuf {
        self.source.template_path(self.language, name)
    }

    /// Compiled template for `name`, read and compiled on first use
    pub async fn load_template(
        &self,
        name: &str,
    ) -> std::result::Result<Arc<CompiledTemplate>, TemplateInjectionError> {
        if let Some(template) = self.cache.get(self.language, name).await {
            debug!(template = name, language = %self.language, "Template cache hit");
            return Ok(template);
        }
        debug!(template = name, language = %self.language, "Template cache miss");

        let log_failure = |e: &TemplateInjectionError| {
            error!(template = name, error = %e, "Failed to load template")
        };
        let text = self
            .source
            .read(self.language, name)
            .await
            .inspect_err(&log_failure)?;
        let compiled = CompiledTemplate::compile(name, self.template_path(name), &text)
            .inspect_err(&log_failure)?;

        Ok(self.cache.insert(self.language, name, compiled).await)
    }

    pub async fn render(
        &self,
        name: &str,
        context: &Context,
    ) -> std::result::Result<String, TemplateInjectionError> {
        let template = self.load_template(name).await?;
        template
            .render(context)
            .inspect_err(|e| error!(template = name, error = %e, "Failed to render template"))
    }

    pub async fn render_global(
        &self,
        selection: &GlobalPatternSelection,
    ) -> Result<RenderedFragment> {
        let pattern = selection.pattern();
        let code = self
            .render(&selection.template, &selection.context.to_tera_context()?)
            .await?;

        Ok(RenderedFragment {
            pattern: pattern.id().to_string(),
            tool_name: None,
            imports: extract_imports(&code),
            section: pattern.section(),
            output_file: selection.output_path.clone(),
            code,
        })
    }

    pub async fn render_tool(&self, selection: &ToolPatternSelection) -> Result<RenderedFragment> {
        let code = self
            .render(&selection.template, &selection.context.to_tera_context()?)
            .await?;

        Ok(RenderedFragment {
            pattern: selection.pattern().id().to_string(),
            tool_name: Some(selection.tool_name().to_string()),
            imports: extract_imports(&code),
            section: Section::Functions,
            output_file: selection.output_path.clone(),
            code,
        })
    }
}
