//! JSON-backed category configuration store.
//!
//! Every category owns one `<Category>_config.json` file inside the
//! per-user config directory (`$HOME/.dirsort`). Keys are extensions,
//! values repeat the category name, and files are rewritten whole on
//! every change. A category file is created by the first `add` that
//! targets it and deleted again when its last extension is removed.
//!
//! # Configuration File Format
//!
//! UTF-8 JSON, pretty-printed with tab indentation:
//!
//! ```json
//! {
//! 	".txt": "Documents",
//! 	".pdf": "Documents"
//! }
//! ```

use crate::mapping::{MISC_CATEGORY, MappingTable, WILDCARD_EXTENSION, normalize_extension};
use crate::prompt::{Confirmation, DecisionProvider};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filename suffix shared by every category config file.
pub const CONFIG_FILE_SUFFIX: &str = "_config.json";

/// Name of the per-user config directory under `$HOME`.
pub const CONFIG_DIR_NAME: &str = ".dirsort";

/// Categories written by the bootstrap when no config exists yet.
const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    ("Documents", &[".txt", ".doc", ".pdf"]),
    ("Images", &[".jpg", ".png", ".gif"]),
    ("Audio", &[".mp3", ".wav", ".flac"]),
    ("Video", &[".mp4", ".avi", ".mkv"]),
];

/// Errors raised by the configuration store.
#[derive(Debug)]
pub enum ConfigError {
    /// `$HOME` is not set, so no config directory can be located.
    HomeNotFound,
    /// Reading or writing the config directory or one of its files failed.
    Io { path: PathBuf, source: io::Error },
    /// A config file holds something other than a JSON object of strings.
    Parse { path: PathBuf, reason: String },
    /// Bootstrap wrote the default categories but a retry still found none.
    BootstrapFailed { dir: PathBuf },
    /// An operation named a category with no config file on disk.
    UnknownCategory { category: String },
    /// The extension normalized to nothing usable.
    InvalidExtension { extension: String },
    /// The category is empty or not usable as a directory name.
    InvalidCategory { category: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::HomeNotFound => {
                write!(f, "HOME is not set; cannot locate the config directory")
            }
            ConfigError::Io { path, source } => {
                write!(f, "IO error on {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "Cannot parse {}: {}", path.display(), reason)
            }
            ConfigError::BootstrapFailed { dir } => {
                write!(
                    f,
                    "No config files in {} even after writing defaults",
                    dir.display()
                )
            }
            ConfigError::UnknownCategory { category } => {
                write!(f, "No config file for category '{}'", category)
            }
            ConfigError::InvalidExtension { extension } => {
                write!(f, "'{}' is not a usable extension", extension)
            }
            ConfigError::InvalidCategory { category } => {
                write!(f, "'{}' is not a usable category name", category)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// One category's config file as an editable JSON object.
///
/// Key order is preserved across read/modify/write cycles, so a rewritten
/// file diffs cleanly against its previous version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryFile {
    entries: Map<String, Value>,
}

impl CategoryFile {
    pub fn new() -> Self {
        Self {
            entries: Map::new(),
        }
    }

    /// Reads and parses a category file.
    pub fn read(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Writes the file back, tab-indented, replacing any previous content.
    pub fn write(&self, path: &Path) -> ConfigResult<()> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"\t");
        let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: io::Error::other(e),
            })?;
        fs::write(path, buffer).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Inserts a mapping, replacing any case variant of the key.
    pub fn insert(&mut self, extension: &str, category: &str) {
        self.remove(extension);
        self.entries
            .insert(extension.to_string(), Value::String(category.to_string()));
    }

    /// Removes a key case-insensitively. Returns whether anything left.
    pub fn remove(&mut self, extension: &str) -> bool {
        let existing = self
            .entries
            .keys()
            .find(|key| key.eq_ignore_ascii_case(extension))
            .cloned();
        if let Some(key) = existing {
            self.entries.shift_remove(&key);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.entries
            .keys()
            .any(|key| key.eq_ignore_ascii_case(extension))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key/value pairs in on-disk order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

/// Result of loading the whole config directory.
///
/// Files (or single pairs) that could not be used are collected in
/// `skipped` with the reason, instead of aborting the load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub table: MappingTable,
    pub skipped: Vec<(PathBuf, String)>,
}

/// What `add_extension` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The extension was new and is now mapped.
    Added,
    /// The extension already mapped to this exact category; nothing changed.
    AlreadyMapped,
    /// The extension was moved here from another category.
    Moved { previous: String },
    /// The extension stays in its current category; the move was declined.
    Declined { existing: String },
}

/// What `remove_extension` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The key was removed; other mappings remain in the file.
    Removed,
    /// The key was the last one, so the config file was deleted too.
    FileDeleted,
    /// The category file exists but never contained this extension.
    NotMapped,
}

/// Handle on the config directory and its category files.
///
/// Holds only the directory path; every operation re-reads the files it
/// needs, so there is no in-memory state to go stale between commands.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `$HOME/.dirsort`.
    pub fn default_location() -> ConfigResult<Self> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::HomeNotFound)?;
        Ok(Self::new(PathBuf::from(home).join(CONFIG_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the config directory if it does not exist yet.
    pub fn ensure_dir(&self) -> ConfigResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| ConfigError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    /// Path of the config file owning `category`.
    pub fn category_path(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{category}{CONFIG_FILE_SUFFIX}"))
    }

    /// All `*_config.json` paths, sorted.
    ///
    /// The sort pins lookup semantics: when two files claim the same
    /// extension, the first file in sorted order wins on every platform.
    pub fn config_files(&self) -> ConfigResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ConfigError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(OsStr::to_str)
                    .is_some_and(|name| name.ends_with(CONFIG_FILE_SUFFIX))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Loads every config file into one mapping table.
    ///
    /// A directory without any config files is bootstrapped with the
    /// default categories and enumerated once more; coming up empty twice
    /// is fatal. Unreadable or malformed individual files are skipped and
    /// reported through [`LoadReport::skipped`] rather than failing the
    /// load.
    pub fn load(&self) -> ConfigResult<LoadReport> {
        self.ensure_dir()?;
        let mut files = self.config_files()?;
        if files.is_empty() {
            self.write_defaults()?;
            files = self.config_files()?;
            if files.is_empty() {
                return Err(ConfigError::BootstrapFailed {
                    dir: self.dir.clone(),
                });
            }
        }

        let mut report = LoadReport::default();
        for path in files {
            match CategoryFile::read(&path) {
                Ok(file) => {
                    for (extension, value) in file.entries() {
                        match value.as_str() {
                            Some(category) => report.table.push(extension, category),
                            None => report.skipped.push((
                                path.clone(),
                                format!("category for '{extension}' is not a string"),
                            )),
                        }
                    }
                }
                Err(ConfigError::Parse { reason, .. }) => report.skipped.push((path, reason)),
                Err(ConfigError::Io { source, .. }) => {
                    report.skipped.push((path, source.to_string()))
                }
                Err(other) => return Err(other),
            }
        }
        Ok(report)
    }

    /// Maps an extension to a category, moving it if it lives elsewhere.
    ///
    /// An extension already mapped to a different category needs a yes
    /// from the decision provider before it moves; the old category file
    /// loses the key (and is deleted once empty). With no confirmation
    /// the store is left exactly as it was.
    pub fn add_extension(
        &self,
        extension: &str,
        category: &str,
        decider: &mut dyn DecisionProvider,
    ) -> ConfigResult<AddOutcome> {
        let extension = validate_extension(extension)?;
        validate_category(category)?;
        self.ensure_dir()?;

        let report = self.load()?;
        if let Some(existing) = report.table.category_for(&extension) {
            if existing == category {
                return Ok(AddOutcome::AlreadyMapped);
            }
            let existing = existing.to_string();
            let confirmation = Confirmation::MoveExtension {
                extension: &extension,
                from: &existing,
                to: category,
            };
            if !decider.confirm(&confirmation) {
                return Ok(AddOutcome::Declined { existing });
            }
            self.remove_extension(&extension, &existing)?;
            self.insert_mapping(&extension, category)?;
            return Ok(AddOutcome::Moved { previous: existing });
        }

        self.insert_mapping(&extension, category)?;
        Ok(AddOutcome::Added)
    }

    /// Deletes an extension from a category's config file.
    ///
    /// Removing the last key deletes the file itself, keeping the
    /// directory free of empty husks.
    pub fn remove_extension(&self, extension: &str, category: &str) -> ConfigResult<RemoveOutcome> {
        let extension = normalize_extension(extension);
        let path = self.category_path(category);
        if !path.exists() {
            return Err(ConfigError::UnknownCategory {
                category: category.to_string(),
            });
        }
        let mut file = CategoryFile::read(&path)?;
        if !file.remove(&extension) {
            return Ok(RemoveOutcome::NotMapped);
        }
        if file.is_empty() {
            fs::remove_file(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            return Ok(RemoveOutcome::FileDeleted);
        }
        file.write(&path)?;
        Ok(RemoveOutcome::Removed)
    }

    /// Writes the default category files, overwriting same-named ones.
    pub fn write_defaults(&self) -> ConfigResult<()> {
        for (category, extensions) in DEFAULT_CATEGORIES {
            let mut file = CategoryFile::new();
            for extension in *extensions {
                file.insert(extension, category);
            }
            file.write(&self.category_path(category))?;
        }
        Ok(())
    }

    /// Writes the catch-all sentinel (`{"*": "misc"}`).
    ///
    /// Its presence pre-decides the misc policy for every later run.
    pub fn write_misc_sentinel(&self) -> ConfigResult<()> {
        let mut file = CategoryFile::new();
        file.insert(WILDCARD_EXTENSION, MISC_CATEGORY);
        file.write(&self.category_path(MISC_CATEGORY))
    }

    /// Deletes every config file, returning how many were removed.
    pub fn reset(&self) -> ConfigResult<usize> {
        self.ensure_dir()?;
        let files = self.config_files()?;
        let mut removed = 0;
        for path in files {
            fs::remove_file(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            removed += 1;
        }
        Ok(removed)
    }

    fn insert_mapping(&self, extension: &str, category: &str) -> ConfigResult<()> {
        let path = self.category_path(category);
        let mut file = if path.exists() {
            // Never clobber an existing file we cannot parse.
            CategoryFile::read(&path)?
        } else {
            CategoryFile::new()
        };
        file.insert(extension, category);
        file.write(&path)
    }
}

fn validate_extension(raw: &str) -> ConfigResult<String> {
    let extension = normalize_extension(raw);
    if extension == "." {
        return Err(ConfigError::InvalidExtension {
            extension: raw.trim().to_string(),
        });
    }
    Ok(extension)
}

fn validate_category(category: &str) -> ConfigResult<()> {
    if category.trim().is_empty() || category.contains(['/', '\\']) {
        return Err(ConfigError::InvalidCategory {
            category: category.to_string(),
        });
    }
    Ok(())
}
