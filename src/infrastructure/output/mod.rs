//! Output writer implementations

use std::path::Path;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::generation::GeneratedFile;

pub mod filesystem_output;

pub use filesystem_output::*;

/// Destination for a generated file set
#[async_trait]
pub trait OutputWriter: Send + Sync {
    /// Write every file at `root.join(file.path)`, creating parent directories
    async fn write_files(&self, files: &[GeneratedFile], root: &Path) -> Result<()>;

    async fn ensure_directory(&self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_filesystem_output_write_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output = FileSystemOutput::new();

        let files = vec![
            GeneratedFile::source("src/index.ts", "console.log('hello');"),
            GeneratedFile::config("package.json", "{\"name\": \"test\"}"),
            GeneratedFile::source("src/tools/wrappers/fetch_retry.ts", "export {};"),
        ];

        output
            .write_files(&files, temp_dir.path())
            .await
            .expect("Failed to write files");

        assert!(temp_dir.path().join("package.json").exists());
        assert!(temp_dir.path().join("src/tools/wrappers/fetch_retry.ts").exists());

        let index = std::fs::read_to_string(temp_dir.path().join("src/index.ts"))
            .expect("Failed to read index.ts");
        assert_eq!(index, "console.log('hello');");
        assert!(logs_contain("Wrote generated files"));
    }

    #[tokio::test]
    async fn test_filesystem_output_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output = FileSystemOutput::new();
        std::fs::write(temp_dir.path().join("README.md"), "old content that is longer")
            .expect("Failed to seed file");

        output
            .write_files(&[GeneratedFile::docs("README.md", "# new")], temp_dir.path())
            .await
            .expect("Failed to write files");

        let readme = std::fs::read_to_string(temp_dir.path().join("README.md"))
            .expect("Failed to read README.md");
        assert_eq!(readme, "# new");
    }

    #[tokio::test]
    async fn test_filesystem_output_ensure_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output = FileSystemOutput::new();

        let nested_path = temp_dir.path().join("deeply/nested/directory");
        output
            .ensure_directory(&nested_path)
            .await
            .expect("Failed to create directory");

        assert!(nested_path.is_dir());
    }
}
