//! Directory classification and file moving.
//!
//! A run enumerates the target directory exactly once, classifies every
//! regular file against the mapping table, resolves what to do with
//! uncategorized files (the misc policy, decided at most once per run),
//! then moves files into `<directory>/<category>/` one by one. Failures
//! are recorded per file and never abort the batch.

use crate::mapping::{MISC_CATEGORY, MappingTable};
use crate::prompt::{Confirmation, DecisionProvider};

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Paths at or beyond this length take the fallback route.
const MAX_PATH_LEN: usize = 4096;

/// Prefix for files parked in the temp directory by the fallback.
const FALLBACK_PREFIX: &str = "dirsort_overflow_";

/// Errors that abort a scan or organize run outright.
///
/// Everything else (a single rename failing, a category directory that
/// cannot be created) is recorded per file in the report instead.
#[derive(Debug)]
pub enum OrganizeError {
    /// The target path exists but is not a directory.
    NotADirectory { path: PathBuf },
    /// The target directory could not be read.
    DirectoryAccess { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotADirectory { path } => {
                write!(f, "{} is not a directory", path.display())
            }
            Self::DirectoryAccess { path, source } => {
                write!(f, "Cannot read directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A regular file found by [`scan`], classified once.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// On-disk file name, preserved byte-for-byte.
    pub name: OsString,
    pub path: PathBuf,
    /// Category from an explicit mapping; `None` means uncategorized.
    pub category: Option<String>,
}

/// Snapshot of one directory enumeration.
///
/// The organize pass iterates this same snapshot instead of re-reading
/// the directory, so both passes always see identical entries.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub files: Vec<ScannedFile>,
}

impl ScanReport {
    /// Files with an explicit category mapping.
    pub fn categorized_count(&self) -> usize {
        self.files.iter().filter(|f| f.category.is_some()).count()
    }

    /// Files no mapping claims.
    pub fn uncategorized(&self) -> impl Iterator<Item = &ScannedFile> {
        self.files.iter().filter(|f| f.category.is_none())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// What to do with files no mapping claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiscPolicy {
    /// Ask the decision provider once, if any file needs it.
    Ask,
    /// Move them into the misc category without asking.
    Bucket,
    /// Leave them where they are without asking.
    Leave,
}

/// Terminal state of one file in an organize run.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Renamed into its category directory.
    Moved {
        from: PathBuf,
        to: PathBuf,
        category: String,
    },
    /// Parked at the overflow location because a path was too long.
    FallbackMoved { from: PathBuf, to: PathBuf },
    /// The move failed; the file stays put and the batch continues.
    MoveFailed { path: PathBuf, reason: String },
    /// No category and no misc target; left untouched.
    SkippedUncategorized { path: PathBuf },
}

impl FileOutcome {
    /// The file's location before the run touched it.
    pub fn original_path(&self) -> &Path {
        match self {
            FileOutcome::Moved { from, .. } | FileOutcome::FallbackMoved { from, .. } => from,
            FileOutcome::MoveFailed { path, .. } | FileOutcome::SkippedUncategorized { path } => {
                path
            }
        }
    }
}

/// Everything an organize run did, file by file.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    pub outcomes: Vec<FileOutcome>,
}

impl OrganizeReport {
    pub fn moved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Moved { .. }))
            .count()
    }

    pub fn fallback_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::FallbackMoved { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::MoveFailed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::SkippedUncategorized { .. }))
            .count()
    }

    pub fn had_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Successful moves tallied per destination category.
    pub fn moves_by_category(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            if let FileOutcome::Moved { category, .. } = outcome {
                *counts.entry(category.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Enumerates a directory's immediate regular files and classifies them.
///
/// Directories, symlinks, and anything else that is not a regular file
/// are skipped and never moved. Classification happens here, once, so
/// later passes need no table access.
pub fn scan(directory: &Path, table: &MappingTable) -> OrganizeResult<ScanReport> {
    if directory.exists() && !directory.is_dir() {
        return Err(OrganizeError::NotADirectory {
            path: directory.to_path_buf(),
        });
    }
    let entries = fs::read_dir(directory).map_err(|source| OrganizeError::DirectoryAccess {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut report = ScanReport::default();
    for entry in entries.flatten() {
        if let Ok(file_type) = entry.file_type()
            && file_type.is_file()
        {
            // The lossy view is for extension matching only; moves use
            // the raw name.
            let name = entry.file_name();
            let category = table.classify(&name.to_string_lossy()).map(|c| c.to_string());
            report.files.push(ScannedFile {
                name,
                path: entry.path(),
                category,
            });
        }
    }
    Ok(report)
}

/// Moves every classified file into its category subdirectory.
///
/// Runs in two passes over a single enumeration snapshot: the first pass
/// scans and settles the misc policy (asking the decision provider at
/// most once, with one answer covering the whole run), the second moves
/// the files. `progress` is invoked after each file with
/// `(done, total, outcome)` so a caller can drive a progress bar.
///
/// # Examples
///
/// ```no_run
/// use dirsort::mapping::MappingTable;
/// use dirsort::organizer::{self, MiscPolicy};
/// use dirsort::prompt::Preset;
/// use std::path::Path;
///
/// let mut table = MappingTable::new();
/// table.push(".png", "Images");
/// let report = organizer::organize(
///     Path::new("/home/me/Downloads"),
///     &table,
///     MiscPolicy::Leave,
///     &mut Preset::no(),
///     |_, _, _| {},
/// )?;
/// println!("{} moved, {} left", report.moved_count(), report.skipped_count());
/// # Ok::<(), dirsort::organizer::OrganizeError>(())
/// ```
pub fn organize<F>(
    directory: &Path,
    table: &MappingTable,
    policy: MiscPolicy,
    decider: &mut dyn DecisionProvider,
    mut progress: F,
) -> OrganizeResult<OrganizeReport>
where
    F: FnMut(usize, usize, &FileOutcome),
{
    let scanned = scan(directory, table)?;
    let misc_target = resolve_misc_target(&scanned, table, policy, decider);

    let total = scanned.files.len();
    let mut report = OrganizeReport::default();
    for (index, file) in scanned.files.iter().enumerate() {
        let outcome = match file.category.as_deref().or(misc_target.as_deref()) {
            Some(category) => move_into_category(directory, file, category),
            None => FileOutcome::SkippedUncategorized {
                path: file.path.clone(),
            },
        };
        progress(index + 1, total, &outcome);
        report.outcomes.push(outcome);
    }
    Ok(report)
}

/// Settles where uncategorized files go for this run, if anywhere.
fn resolve_misc_target(
    scanned: &ScanReport,
    table: &MappingTable,
    policy: MiscPolicy,
    decider: &mut dyn DecisionProvider,
) -> Option<String> {
    match policy {
        MiscPolicy::Bucket => Some(MISC_CATEGORY.to_string()),
        MiscPolicy::Leave => None,
        MiscPolicy::Ask => {
            // A persisted wildcard sentinel answers for the user.
            if let Some(category) = table.wildcard_category() {
                return Some(category.to_string());
            }
            let uncategorized = scanned.uncategorized().count();
            if uncategorized == 0 {
                return None;
            }
            if decider.confirm(&Confirmation::MiscBucket { uncategorized }) {
                Some(MISC_CATEGORY.to_string())
            } else {
                None
            }
        }
    }
}

/// Moves one file into `<directory>/<category>/`, preserving its name.
fn move_into_category(directory: &Path, file: &ScannedFile, category: &str) -> FileOutcome {
    let category_dir = directory.join(category);
    let destination = category_dir.join(&file.name);

    if exceeds_path_limit(&file.path) || exceeds_path_limit(&destination) {
        let fallback = fallback_destination(&file.name);
        return match rename_or_copy(&file.path, &fallback) {
            Ok(()) => FileOutcome::FallbackMoved {
                from: file.path.clone(),
                to: fallback,
            },
            Err(e) => FileOutcome::MoveFailed {
                path: file.path.clone(),
                reason: format!("overflow fallback to {}: {}", fallback.display(), e),
            },
        };
    }

    if let Err(e) = fs::create_dir(&category_dir)
        && e.kind() != io::ErrorKind::AlreadyExists
    {
        return FileOutcome::MoveFailed {
            path: file.path.clone(),
            reason: format!("creating {}: {}", category_dir.display(), e),
        };
    }

    match fs::rename(&file.path, &destination) {
        Ok(()) => FileOutcome::Moved {
            from: file.path.clone(),
            to: destination,
            category: category.to_string(),
        },
        Err(e) => FileOutcome::MoveFailed {
            path: file.path.clone(),
            reason: e.to_string(),
        },
    }
}

fn exceeds_path_limit(path: &Path) -> bool {
    path.as_os_str().len() >= MAX_PATH_LEN
}

/// Overflow destination: temp dir, fixed prefix, original file name.
fn fallback_destination(file_name: &OsStr) -> PathBuf {
    let mut parked = OsString::from(FALLBACK_PREFIX);
    parked.push(file_name);
    std::env::temp_dir().join(parked)
}

/// Rename, falling back to copy+delete.
///
/// Only the overflow path uses this; the temp directory commonly sits on
/// a different filesystem where a plain rename cannot work.
fn rename_or_copy(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}
