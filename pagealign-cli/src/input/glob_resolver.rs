//! File pattern resolution using glob

use crate::error::CliError;
use anyhow::{Context, Result};
use glob::glob;
use std::path::{Path, PathBuf};

fn expand<F>(patterns: &[String], keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let mut found = Vec::new();

    for pattern in patterns {
        let paths = glob(pattern).map_err(|_| CliError::InvalidPattern(pattern.clone()))?;

        for path_result in paths {
            let path =
                path_result.with_context(|| format!("Error resolving pattern: {}", pattern))?;

            if keep(path.as_path()) && !found.contains(&path) {
                found.push(path);
            }
        }
    }

    Ok(found)
}

/// Resolve file patterns to actual file paths, sorted and deduplicated
pub fn resolve_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = expand(patterns, Path::is_file)?;

    if files.is_empty() {
        return Err(CliError::FileNotFound(patterns.join(", ")).into());
    }

    files.sort();
    Ok(files)
}

/// Resolve directory patterns, keeping the order in which they were given
pub fn resolve_directories(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let dirs = expand(patterns, Path::is_dir)?;

    if dirs.is_empty() {
        return Err(CliError::FileNotFound(patterns.join(", ")).into());
    }

    Ok(dirs)
}
