//! Target languages for generated MCP servers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Language a generated server is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Primary language, used whenever the spec names something unrecognized
    #[default]
    TypeScript,
    Python,
}

impl Language {
    /// Resolve the language from the spec's `project.sdk` field.
    ///
    /// Unrecognized or missing values fall back to TypeScript.
    pub fn from_sdk(sdk: Option<&str>) -> Self {
        match sdk.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("python") | Some("py") => Language::Python,
            _ => Language::TypeScript,
        }
    }

    /// Directory name under the template root
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Python => "python",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::TypeScript => "TypeScript",
            Language::Python => "Python",
        }
    }

    /// Source file extension, without the dot
    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::TypeScript => "ts",
            Language::Python => "py",
        }
    }

    /// Path of the generated entry point
    pub fn entry_point(&self) -> &'static str {
        match self {
            Language::TypeScript => "src/index.ts",
            Language::Python => "src/server.py",
        }
    }

    /// File name stem for a multi-word module, e.g. `error-types` / `error_types`
    pub fn module_stem(&self, name: &str) -> String {
        match self {
            Language::TypeScript => name.replace('_', "-"),
            Language::Python => name.replace('-', "_"),
        }
    }

    pub fn all() -> [Language; 2] {
        [Language::TypeScript, Language::Python]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
