/*
Expands the user supplied `--files` arguments into the concrete list of level
archives to load.  Explicitly named files are always taken as-is; only
directory scans are filtered by extension.  Directory traversal uses
https://crates.io/crates/walkdir with the depth capped at 1 unless recursion
was requested.
*/

use std::path::{Path, PathBuf};

use tracing::{trace, warn};
use walkdir::WalkDir;

/// Extension of the level archives we look for in directory scans.
pub const LVL_EXTENSION: &str = ".lvl";

fn extension_matches(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case(wanted),
        None => false,
    }
}

/// Scan `dir` for files with the given extension.  Without `recursive` only
/// the direct entries of `dir` are considered.
pub fn files_in_directory(dir: &Path, extension: &str, recursive: bool) -> Vec<PathBuf> {
    let mut files = vec![];

    let mut walker = WalkDir::new(dir).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), err);
                continue;
            }
        };
        if entry.file_type().is_file() && extension_matches(entry.path(), extension) {
            trace!(path = %entry.path().display(), "discovered");
            files.push(entry.into_path());
        }
    }

    files
}

/// Expand a mixed list of files and directories into files.  Paths that do
/// not exist are reported and skipped; they never abort discovery of the rest.
pub fn discover_files(paths: &[PathBuf], extension: &str, recursive: bool) -> Vec<PathBuf> {
    let mut files = vec![];
    for path in paths {
        if !path.exists() {
            warn!("{} does not exist!", path.display());
            continue;
        }

        if path.is_dir() {
            files.extend(files_in_directory(path, extension, recursive));
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            warn!("{} is neither a file nor a directory, skipping", path.display());
        }
    }
    files
}
