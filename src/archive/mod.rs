//! ZIP archive extraction into per-invocation temporary storage
//!
//! Every invocation gets its own randomly named archive file and extraction
//! directory, so concurrent invocations never share or delete each other's
//! files. Both are removed when the [`Workspace`] is closed or dropped.

pub mod select;

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use zip::ZipArchive;

use crate::config::ExtractConfig;
use crate::{Error, Result};

/// Prefix for downloaded archive files
const ARCHIVE_PREFIX: &str = "tg_unzip_";

/// Prefix for extraction directories
const EXTRACT_PREFIX: &str = "tg_extract_";

/// Total bytes one extraction may write, as a multiple of the size limit
pub const TOTAL_BUDGET_FACTOR: u64 = 4;

/// Result of looking for the target document in an archive
#[derive(Debug, PartialEq, Eq)]
pub enum Extraction {
    /// No file with the target extension in the archive
    NoMatch,
    /// The first match decompresses beyond the size limit
    TooLarge { file_name: String, size: u64 },
    /// The first match, read into memory
    Found(SelectedDocument),
}

/// The document chosen from an extracted tree
#[derive(Debug, PartialEq, Eq)]
pub struct SelectedDocument {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Counts from a single extraction run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Regular files written
    pub files: usize,
    /// Entries skipped (unsafe names, unreadable or encrypted entries)
    pub skipped: usize,
    /// Files cut off at the per-entry cap
    pub truncated: usize,
    /// Extraction stopped at the total budget
    pub budget_exhausted: bool,
}

/// Size caps applied while extracting one archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    /// Bytes kept per entry before it counts as truncated
    pub max_entry_size: u64,
    /// Bytes written across all entries
    pub max_total_size: u64,
}

impl ExtractLimits {
    /// Limits for a document size limit: the per-entry cap equals the limit
    /// and the total budget is [`TOTAL_BUDGET_FACTOR`] times it
    #[must_use]
    pub const fn for_file_size(max_file_size: u64) -> Self {
        Self {
            max_entry_size: max_file_size,
            max_total_size: max_file_size.saturating_mul(TOTAL_BUDGET_FACTOR),
        }
    }
}

/// Temporary archive file and extraction directory for one invocation
#[derive(Debug)]
pub struct Workspace {
    archive: NamedTempFile,
    extract_dir: TempDir,
}

impl Workspace {
    /// Create a uniquely named archive file and extraction directory
    ///
    /// # Errors
    ///
    /// Returns error if the temporary file or directory cannot be created
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let archive = match root {
            Some(root) => tempfile::Builder::new()
                .prefix(ARCHIVE_PREFIX)
                .suffix(".zip")
                .tempfile_in(root)?,
            None => tempfile::Builder::new()
                .prefix(ARCHIVE_PREFIX)
                .suffix(".zip")
                .tempfile()?,
        };

        let extract_dir = match root {
            Some(root) => tempfile::Builder::new()
                .prefix(EXTRACT_PREFIX)
                .tempdir_in(root)?,
            None => tempfile::Builder::new().prefix(EXTRACT_PREFIX).tempdir()?,
        };

        Ok(Self {
            archive,
            extract_dir,
        })
    }

    /// Path of the downloaded archive
    #[must_use]
    pub fn archive_path(&self) -> &Path {
        self.archive.path()
    }

    /// Directory the archive is extracted into
    #[must_use]
    pub fn extract_dir(&self) -> &Path {
        self.extract_dir.path()
    }

    /// Persist downloaded bytes to the archive file
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub fn write_archive(&mut self, data: &[u8]) -> Result<()> {
        let file = self.archive.as_file_mut();
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    /// Extract the archive and pick the target document
    fn select_document(&mut self, data: &[u8], config: &ExtractConfig) -> Result<Extraction> {
        self.write_archive(data)?;

        let limits = ExtractLimits::for_file_size(config.max_file_size);
        let summary = extract_zip(self.archive_path(), self.extract_dir(), limits)?;
        tracing::debug!(
            files = summary.files,
            skipped = summary.skipped,
            truncated = summary.truncated,
            budget_exhausted = summary.budget_exhausted,
            "archive extracted"
        );

        let Some(path) =
            select::find_first_match(self.extract_dir(), &config.target_extension, config.selection)?
        else {
            return Ok(Extraction::NoMatch);
        };

        let file_name = path.file_name().map_or_else(
            || format!("document.{}", config.target_extension),
            |n| n.to_string_lossy().into_owned(),
        );

        let size = fs::metadata(&path)?.len();
        if size > config.max_file_size {
            return Ok(Extraction::TooLarge { file_name, size });
        }

        let data = fs::read(&path)?;
        Ok(Extraction::Found(SelectedDocument { file_name, data }))
    }

    /// Remove the archive file and the extraction tree
    ///
    /// # Errors
    ///
    /// Returns error if either removal fails
    pub fn close(self) -> Result<()> {
        let dir_result = self.extract_dir.close();
        let file_result = self.archive.close();
        dir_result?;
        file_result?;
        Ok(())
    }
}

/// Write `data` to temporary storage, extract it and select the target document
///
/// The document is read into memory before returning, so no temporary file
/// outlives this call on any path.
///
/// # Errors
///
/// Returns [`Error::Archive`] if the bytes are not a readable ZIP archive, or
/// an IO error if temporary storage fails
pub fn extract_document(data: &[u8], config: &ExtractConfig) -> Result<Extraction> {
    let mut workspace = Workspace::create(config.tmp_dir.as_deref())?;
    let result = workspace.select_document(data, config);

    if let Err(e) = workspace.close() {
        tracing::warn!(error = %e, "failed to remove temporary files");
    }

    result
}

/// Extract every file of a ZIP archive under `dest`
///
/// Entry names are reduced to their normal components, so nothing is
/// written outside `dest`. Each file is decompressed through a reader capped
/// at `max_entry_size + 1` bytes; a file of that length was truncated. Once
/// `max_total_size` bytes are on disk extraction stops: an entry cut short by
/// the budget is removed and it and every later entry count as skipped.
///
/// # Errors
///
/// Returns [`Error::Archive`] if the archive cannot be opened or an entry
/// fails to decompress, or an IO error if writing fails
pub fn extract_zip(archive_path: &Path, dest: &Path, limits: ExtractLimits) -> Result<ExtractSummary> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| Error::Archive(format!("failed to open archive: {e}")))?;

    let cap = limits.max_entry_size.saturating_add(1);
    let mut remaining = limits.max_total_size;
    let mut summary = ExtractSummary::default();

    let total = archive.len();
    for i in 0..total {
        if remaining == 0 {
            let left = total - i;
            tracing::warn!(
                budget = limits.max_total_size,
                skipped = left,
                "extraction budget exhausted"
            );
            summary.skipped += left;
            summary.budget_exhausted = true;
            break;
        }

        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(index = i, error = %e, "skipping unreadable archive entry");
                summary.skipped += 1;
                continue;
            }
        };

        let raw_name = entry.name().to_string();
        let Some(relative) = sanitize_path(&raw_name) else {
            tracing::warn!(name = %raw_name, "skipping archive entry with unsafe path");
            summary.skipped += 1;
            continue;
        };

        let target = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let allowance = cap.min(remaining);
        let mut out = File::create(&target)?;
        let written = std::io::copy(&mut entry.by_ref().take(allowance), &mut out)
            .map_err(|e| Error::Archive(format!("failed to extract {raw_name}: {e}")))?;
        remaining -= written;

        if written == allowance && allowance < cap && has_more(&mut entry, &raw_name)? {
            drop(out);
            fs::remove_file(&target)?;
            let left = total - i;
            tracing::warn!(
                name = %raw_name,
                budget = limits.max_total_size,
                skipped = left,
                "extraction budget exhausted"
            );
            summary.skipped += left;
            summary.budget_exhausted = true;
            break;
        }

        if written == cap {
            tracing::warn!(name = %raw_name, cap = limits.max_entry_size, "archive entry truncated");
            summary.truncated += 1;
        }
        summary.files += 1;
    }

    Ok(summary)
}

/// Whether a partially copied entry still has bytes left
fn has_more(entry: &mut impl Read, name: &str) -> Result<bool> {
    let mut next = [0u8; 1];
    let n = entry
        .read(&mut next)
        .map_err(|e| Error::Archive(format!("failed to extract {name}: {e}")))?;
    Ok(n > 0)
}

/// Reduce an archive entry name to its normal path components
///
/// Drops `..`, `.`, root and drive prefixes. Returns `None` when nothing
/// is left.
#[must_use]
pub fn sanitize_path(name: &str) -> Option<PathBuf> {
    let sanitized: PathBuf = Path::new(name)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}
