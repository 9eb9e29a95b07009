use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// File extensions treated as outline documents
pub const OUTLINE_EXTENSIONS: [&str; 3] = ["txt", "md", "outline"];

/// Artifact written for the first-pass outline
pub const OUTLINE_FILE: &str = "outline.txt";
/// Artifact written for the refined outline
pub const REFINED_OUTLINE_FILE: &str = "refined_outline.txt";
/// Artifact written for the structured outline
pub const OUTLINE_JSON_FILE: &str = "outline.json";
/// Artifact written for the validation report
pub const VALIDATION_FILE: &str = "validation.json";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Whether a path has one of the outline extensions
    pub fn is_outline_file<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        path.is_file()
            && path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| OUTLINE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Find outline files below a directory, sorted by path
    pub fn find_outline_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            if Self::is_outline_file(entry.path()) {
                result.push(entry.path().to_path_buf());
            }
        }
        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Fail if any of `names` already exists in `dir`, unless overwriting is allowed
    pub fn check_overwrite<P: AsRef<Path>>(dir: P, names: &[&str], force_overwrite: bool) -> Result<()> {
        if force_overwrite {
            return Ok(());
        }
        let existing: Vec<String> = names
            .iter()
            .map(|name| dir.as_ref().join(name))
            .filter(|path| path.exists())
            .map(|path| path.display().to_string())
            .collect();
        if existing.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "Output already exists: {} (use -f to force overwrite)",
                existing.join(", ")
            ))
        }
    }
}
