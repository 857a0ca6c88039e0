//! The generated file set, the final artifact of a generation run.

use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Source,
    Test,
    Config,
    Docs,
}

/// One output file, with a path relative to the project root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind,
        }
    }

    pub fn source(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileKind::Source)
    }

    pub fn test(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileKind::Test)
    }

    pub fn config(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileKind::Config)
    }

    pub fn docs(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileKind::Docs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFileSet {
    pub files: Vec<GeneratedFile>,
    pub entry_point: PathBuf,
    /// Runtime packages the generated project depends on
    pub dependencies: Vec<String>,
}

impl GeneratedFileSet {
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&GeneratedFile> {
        let path = path.as_ref();
        self.files.iter().find(|f| f.path == path)
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.get(path).is_some()
    }

    pub fn of_kind(&self, kind: FileKind) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter().filter(move |f| f.kind == kind)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
