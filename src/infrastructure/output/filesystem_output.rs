//! Filesystem-based output writer

use std::path::Path;

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::OutputWriter;
use crate::core::error::Result;
use crate::generation::GeneratedFile;

/// Writes generated files beneath a root directory, overwriting existing files
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemOutput;

impl FileSystemOutput {
    pub fn new() -> Self {
        Self
    }

    async fn write_file(&self, file: &GeneratedFile, root: &Path) -> Result<()> {
        let path = root.join(&file.path);

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut handle = fs::File::create(&path).await?;
        handle.write_all(file.content.as_bytes()).await?;
        handle.flush().await?;

        debug!(path = %path.display(), bytes = file.content.len(), "Wrote file");
        Ok(())
    }
}

#[async_trait]
impl OutputWriter for FileSystemOutput {
    async fn write_files(&self, files: &[GeneratedFile], root: &Path) -> Result<()> {
        try_join_all(files.iter().map(|file| self.write_file(file, root))).await?;
        info!(count = files.len(), root = %root.display(), "Wrote generated files");
        Ok(())
    }

    async fn ensure_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await?;
        Ok(())
    }
}
