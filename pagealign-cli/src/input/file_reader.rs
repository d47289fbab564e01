//! File reading utilities

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File reader with UTF-8 validation
pub struct FileReader;

impl FileReader {
    /// Read a file as UTF-8 text
    pub fn read_text(path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(content)
    }

    /// Whether a path looks like a layout page export
    pub fn is_layout_file(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }

    /// Layout files directly inside `dir`, in file name order
    pub fn layout_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to list directory: {}", dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list directory: {}", dir.display()))?
                .path();
            if Self::is_layout_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_text_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("doc.json");

        let content = "{\"text\": \"Één café\"}";
        fs::write(&file_path, content).unwrap();

        assert_eq!(FileReader::read_text(&file_path).unwrap(), content);
    }

    #[test]
    fn test_read_text_nonexistent_file() {
        let result = FileReader::read_text(Path::new("/nonexistent/file.json"));
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read file"));
    }

    #[test]
    fn test_layout_files_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["NL_1_0002.json", "NL_1_0001.JSON", "notes.txt"] {
            fs::write(temp_dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(temp_dir.path().join("nested.json")).unwrap();

        let files = FileReader::layout_files(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["NL_1_0001.JSON", "NL_1_0002.json"]);
    }

    #[test]
    fn test_layout_files_missing_dir() {
        let err = FileReader::layout_files(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(err.to_string().contains("Failed to list directory"));
    }
}
