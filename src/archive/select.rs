//! Document selection inside an extracted tree

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::config::SelectionPolicy;

/// Whether `path` has the given extension (case-insensitive, no leading dot)
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Find the first regular file under `root` with the target extension
///
/// The walk is depth-first. With [`SelectionPolicy::Sorted`] each directory's
/// entries are visited in file-name order; with
/// [`SelectionPolicy::FilesystemOrder`] they are visited as `read_dir` yields
/// them, which is not stable across filesystems. Symlinks are not followed.
///
/// # Errors
///
/// Returns error if a directory cannot be read
pub fn find_first_match(
    root: &Path,
    extension: &str,
    policy: SelectionPolicy,
) -> Result<Option<PathBuf>> {
    let mut entries = fs::read_dir(root)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;

    if policy == SelectionPolicy::Sorted {
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }

    for path in entries {
        let file_type = fs::symlink_metadata(&path)?.file_type();
        if file_type.is_dir() {
            if let Some(found) = find_first_match(&path, extension, policy)? {
                return Ok(Some(found));
            }
        } else if file_type.is_file() && has_extension(&path, extension) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}
