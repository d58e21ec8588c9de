//! Source file representation.

use std::path::{Path, PathBuf};

use super::{Error, Result};

/// A Python source file with its content loaded.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path to the file.
    pub path: PathBuf,
    /// File content.
    pub content: String,
}

impl SourceFile {
    /// Load a source file from disk.
    ///
    /// The file is read fully and closed before this returns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::error!("File not found: {}", path.display());
            return Err(Error::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Create from existing content.
    pub fn from_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Count total lines.
    pub fn total_lines(&self) -> usize {
        self.content.lines().count()
    }
}

/// Check if a trimmed line is a comment.
pub fn is_comment_line(line: &str) -> bool {
    line.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_from_content() {
        let file = SourceFile::from_content("test.py", "def main():\n    print('hi')\n");
        assert_eq!(file.total_lines(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SourceFile::load("/definitely/not/here.py").unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }

    #[test]
    fn test_load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.py");
        std::fs::write(&path, "x = 1\n").unwrap();

        let file = SourceFile::load(&path).unwrap();
        assert_eq!(file.content, "x = 1\n");
        assert_eq!(file.path, path);
    }

    #[test]
    fn test_is_comment_line() {
        assert!(is_comment_line("# note"));
        assert!(!is_comment_line("x = 1  # trailing"));
    }
}
