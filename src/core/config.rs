//! Generator configuration.
//!
//! Every field has a default, so an empty (or absent) TOML file yields the stock
//! behavior. A typical `mcpforge.toml`:
//!
//! ```toml
//! template_dir = "templates"
//! output_dir = "out"
//! generate_tests = true
//!
//! [selector]
//! always_include_validation = false
//!
//! [policy]
//! global = "recover"
//! tool = "abort"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::Result;

/// Top-level generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Template root; templates live at `<root>/<language>/<pattern>.tera`
    pub template_dir: PathBuf,
    /// Default target directory for written output
    pub output_dir: PathBuf,
    /// Emit one test stub per tool
    pub generate_tests: bool,
    /// Emit a README describing the generated project
    pub generate_docs: bool,
    pub selector: SelectorConfig,
    pub policy: RenderPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("output"),
            generate_tests: true,
            generate_docs: true,
            selector: SelectorConfig::default(),
            policy: RenderPolicy::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a TOML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Loaded generator configuration");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Rule-level switches for the pattern selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Every tool gets error handling regardless of the spec
    pub always_include_error_handling: bool,
    /// Every tool gets input validation regardless of the spec
    pub always_include_validation: bool,
    /// Tools log even when the spec leaves logging off
    pub default_logging_enabled: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            always_include_error_handling: true,
            always_include_validation: true,
            default_logging_enabled: true,
        }
    }
}

/// What to do when rendering a pattern fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Substitute a marked placeholder file and keep going
    Recover,
    /// Abort the whole run with the render error
    Abort,
}

/// Pipeline stage a render belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Global,
    Tool,
}

/// Per-stage failure policy.
///
/// Global scaffolding may be incomplete; a broken tool implementation stops the
/// build. Both halves are configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPolicy {
    pub global: FailureMode,
    pub tool: FailureMode,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            global: FailureMode::Recover,
            tool: FailureMode::Abort,
        }
    }
}

impl RenderPolicy {
    pub fn mode_for(&self, stage: RenderStage) -> FailureMode {
        match stage {
            RenderStage::Global => self.global,
            RenderStage::Tool => self.tool,
        }
    }
}
