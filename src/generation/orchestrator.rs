//! Generation orchestration - drives a spec through every pipeline stage

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::config::{FailureMode, GeneratorConfig, RenderStage};
use crate::core::error::{Error, Result};
use crate::infrastructure::output::{FileSystemOutput, OutputWriter};
use crate::patterns::{PatternSelectionManifest, PatternSelector};
use crate::spec::{NormalizedSpec, RawSpec, normalize};
use crate::templates::{
    FileSystemTemplateSource, RenderedFragment, TemplateCache, TemplateRenderer, TemplateSource,
};

use super::docs::readme;
use super::entry_point::entry_point;
use super::files::{GeneratedFile, GeneratedFileSet};
use super::scaffold::{dependencies, placeholder, project_files};
use super::test_stubs::test_stubs;

/// A normalized spec together with the patterns selected for it
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub spec: NormalizedSpec,
    pub manifest: PatternSelectionManifest,
}

/// Orchestrates the code generation workflow
pub struct Generator {
    config: GeneratorConfig,
    selector: PatternSelector,
    source: Arc<dyn TemplateSource>,
    cache: Arc<TemplateCache>,
    output: Arc<dyn OutputWriter>,
}

impl Generator {
    /// Generator reading templates from `config.template_dir` with its own cache
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            selector: PatternSelector::new(config.selector),
            source: Arc::new(FileSystemTemplateSource::new(config.template_dir.clone())),
            cache: Arc::new(TemplateCache::new()),
            output: Arc::new(FileSystemOutput::new()),
            config,
        }
    }

    /// Share a template cache with other generators
    pub fn with_cache(mut self, cache: Arc<TemplateCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_template_source(mut self, source: Arc<dyn TemplateSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_output(mut self, output: Arc<dyn OutputWriter>) -> Self {
        self.output = output;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    /// Normalize the spec and select its patterns without rendering anything
    pub fn plan(&self, raw: &RawSpec) -> Result<GenerationPlan> {
        let spec = normalize(raw)?;
        let manifest = self.selector.build_manifest(&spec)?;
        Ok(GenerationPlan { spec, manifest })
    }

    /// Run the full pipeline on an already-parsed spec. Nothing is written.
    pub async fn generate(&self, raw: &RawSpec) -> Result<GeneratedFileSet> {
        let GenerationPlan { spec, manifest } = self.plan(raw)?;
        let language = spec.language();
        info!(
            project = %spec.metadata.name,
            language = %language,
            tools = spec.tools.len(),
            globals = manifest.global_patterns.len(),
            "Starting generation"
        );

        let renderer = TemplateRenderer::new(self.source.clone(), self.cache.clone(), language);
        let mut files = Vec::new();

        for selection in &manifest.global_patterns {
            let rendered = renderer.render_global(selection).await;
            files.push(self.resolve(
                RenderStage::Global,
                selection.pattern().id(),
                &selection.output_path,
                rendered,
                &spec,
            )?);
        }

        for tool in &spec.tools {
            for selection in manifest.tool_selections(&tool.name) {
                let rendered = renderer.render_tool(selection).await;
                files.push(self.resolve(
                    RenderStage::Tool,
                    &selection.template,
                    &selection.output_path,
                    rendered,
                    &spec,
                )?);
            }
        }

        files.push(GeneratedFile::source(
            language.entry_point(),
            entry_point(&spec, &manifest),
        ));
        files.extend(project_files(&spec)?);

        if self.config.generate_docs {
            files.push(GeneratedFile::docs("README.md", readme(&spec, &manifest)));
        }
        if self.config.generate_tests {
            files.extend(test_stubs(&spec, &manifest));
        }

        let file_set = GeneratedFileSet {
            files,
            entry_point: PathBuf::from(language.entry_point()),
            dependencies: dependencies(&spec),
        };
        info!(
            project = %spec.metadata.name,
            files = file_set.len(),
            "Generation complete"
        );
        Ok(file_set)
    }

    /// Read, parse and generate a spec file
    pub async fn generate_from_file(&self, path: impl AsRef<Path>) -> Result<GeneratedFileSet> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading spec");
        let raw = RawSpec::from_file(path).await?;
        self.generate(&raw).await
    }

    /// Write a file set beneath `output_dir`, or the configured output directory
    pub async fn write_files(
        &self,
        file_set: &GeneratedFileSet,
        output_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        let root = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.output_dir.clone());
        self.output.ensure_directory(&root).await?;
        self.output.write_files(&file_set.files, &root).await?;
        Ok(root)
    }

    /// Generate, then write. A failed generation writes nothing.
    pub async fn generate_and_write(
        &self,
        raw: &RawSpec,
        output_dir: Option<&Path>,
    ) -> Result<GeneratedFileSet> {
        let file_set = self.generate(raw).await?;
        self.write_files(&file_set, output_dir).await?;
        Ok(file_set)
    }

    /// Turn a render outcome into a file, applying the stage's failure policy
    fn resolve(
        &self,
        stage: RenderStage,
        pattern: &str,
        output_path: &str,
        rendered: Result<RenderedFragment>,
        spec: &NormalizedSpec,
    ) -> Result<GeneratedFile> {
        match rendered {
            Ok(fragment) => Ok(GeneratedFile::source(fragment.output_file, fragment.code)),
            Err(Error::TemplateInjection(e))
                if self.config.policy.mode_for(stage) == FailureMode::Recover =>
            {
                warn!(
                    pattern,
                    path = output_path,
                    error = %e,
                    "Template unavailable, writing placeholder"
                );
                Ok(GeneratedFile::source(
                    output_path,
                    placeholder(pattern, spec.language()),
                ))
            }
            Err(e) => Err(e),
        }
    }
}
