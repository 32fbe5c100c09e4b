use std::path::Path;

use crate::error::{ErrorLayer, Result, ToolError};

/// Create `dir` (and its parents) unless it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        ToolError::sticky(
            ErrorLayer::DataLayer,
            format!("Problem creating directory '{}': {}", dir.display(), e),
        )
    })
}

pub fn write_file_ensuring_parent_dir(file_path: &Path, contents: &[u8]) -> Result<()> {
    let parent_path = match file_path.parent() {
        Some(p) => p,
        None => {
            return Err(ToolError::sticky(
                ErrorLayer::DataLayer,
                format!("Problem getting parent of '{}'", file_path.display()),
            ));
        }
    };
    // A bare file name has an empty parent, meaning the working directory.
    if !parent_path.as_os_str().is_empty() {
        ensure_dir(parent_path)?;
    }
    std::fs::write(file_path, contents)?;
    Ok(())
}

/// Turn a class name into something safe to use as a file stem.  Class names
/// are plain identifiers in practice, but nothing in the archive format stops
/// one from containing a path separator.
pub fn sanitize_file_stem(name: &str) -> String {
    fn is_special_char(c: char) -> bool {
        matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
    }
    let sanitized: String = name.replace(is_special_char, "_");
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return format!("_{}", sanitized);
    }
    sanitized
}
