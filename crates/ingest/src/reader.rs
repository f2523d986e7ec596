use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::debug;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Reads raw document bytes. Decoding is left to the caller so that invalid
/// UTF-8 can be reported as rejected input rather than guessed at.
pub struct FileReader;

impl FileReader {
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
            .unwrap_or(false)
    }

    pub async fn read_file(path: &Path) -> Result<Vec<u8>> {
        if !Self::is_supported(path) {
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            anyhow::bail!("Unsupported file format: {}", extension);
        }

        let content = fs::read(path)
            .await
            .context(format!("Failed to read file: {:?}", path))?;
        debug!(path = %path.display(), bytes = content.len(), "read document");
        Ok(content)
    }

    /// Read every supported file in `dir` (non-recursive), sorted by path.
    pub async fn read_directory(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
        let mut files = Vec::new();

        let mut entries = fs::read_dir(dir)
            .await
            .context(format!("Failed to read directory: {:?}", dir))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if path.is_file() && Self::is_supported(&path) {
                let content = Self::read_file(&path).await?;
                let path_str = path.to_string_lossy().to_string();
                files.push((path_str, content));
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_directory_skips_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "Athens.").unwrap();
        std::fs::write(dir.path().join("a.md"), "Necromantia.").unwrap();
        std::fs::write(dir.path().join("c.csv"), "x,y").unwrap();

        let files = FileReader::read_directory(dir.path()).await.unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].0.ends_with("a.md"));
        assert_eq!(files[1].1, b"Athens.");
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.pdf");
        std::fs::write(&path, "x").unwrap();

        assert!(FileReader::read_file(&path).await.is_err());
    }
}
