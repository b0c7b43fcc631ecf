/// Extension-to-category mapping table.
///
/// Categories here are user-chosen folder names loaded from the JSON
/// configuration files, not a fixed set. The table keeps entries in load
/// order and resolves lookups case-insensitively, so `.PNG` and `.png`
/// land in the same place.
///
/// # Examples
///
/// ```
/// use dirsort::mapping::MappingTable;
///
/// let mut table = MappingTable::new();
/// table.push(".png", "Images");
/// assert_eq!(table.category_for("PNG"), Some("Images"));
/// assert_eq!(table.classify("holiday.png"), Some("Images"));
/// assert_eq!(table.classify("README"), None);
/// ```

/// Key used by the catch-all sentinel config (`{"*": "misc"}`).
pub const WILDCARD_EXTENSION: &str = "*";

/// Default destination for files no category claims.
pub const MISC_CATEGORY: &str = "misc";

/// A single extension-to-category association.
///
/// The extension is stored as read from disk, leading dot included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMapping {
    pub extension: String,
    pub category: String,
}

/// Ordered collection of [`ExtensionMapping`] entries.
///
/// Built fresh by every load; nothing is cached across invocations. Order
/// matters: when two config files both claim an extension, the first entry
/// wins, so a deterministic load order yields deterministic lookups.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<ExtensionMapping>,
}

impl MappingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a mapping, preserving the extension and category as given.
    pub fn push(&mut self, extension: impl Into<String>, category: impl Into<String>) {
        self.entries.push(ExtensionMapping {
            extension: extension.into(),
            category: category.into(),
        });
    }

    /// Number of mappings in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no mappings are loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All mappings in load order.
    pub fn entries(&self) -> &[ExtensionMapping] {
        &self.entries
    }

    /// Looks up the category for an extension.
    ///
    /// The query is normalized (lower case, leading dot added if missing)
    /// and compared case-insensitively against stored entries. The first
    /// match wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::mapping::MappingTable;
    ///
    /// let mut table = MappingTable::new();
    /// table.push(".TxT", "Documents");
    /// assert_eq!(table.category_for("txt"), Some("Documents"));
    /// assert_eq!(table.category_for(".TXT"), Some("Documents"));
    /// assert_eq!(table.category_for(".xyz"), None);
    /// ```
    pub fn category_for(&self, extension: &str) -> Option<&str> {
        let wanted = normalize_extension(extension);
        self.entries
            .iter()
            .find(|mapping| mapping.extension.eq_ignore_ascii_case(&wanted))
            .map(|mapping| mapping.category.as_str())
    }

    /// Category claimed by the wildcard sentinel entry, if one is loaded.
    ///
    /// The wildcard never matches a concrete extension lookup; callers use
    /// it to decide the misc policy for a whole run.
    pub fn wildcard_category(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|mapping| mapping.extension == WILDCARD_EXTENSION)
            .map(|mapping| mapping.category.as_str())
    }

    /// Resolves a file name to its category via its extension.
    ///
    /// Returns `None` for names without an extension, including dotfiles.
    /// The wildcard sentinel is deliberately not consulted here.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::mapping::MappingTable;
    ///
    /// let mut table = MappingTable::new();
    /// table.push(".gz", "Archives");
    /// assert_eq!(table.classify("backup.tar.gz"), Some("Archives"));
    /// assert_eq!(table.classify(".bashrc"), None);
    /// ```
    pub fn classify(&self, file_name: &str) -> Option<&str> {
        let extension = extension_of(file_name)?;
        self.category_for(extension)
    }
}

/// Extracts a file name's extension, leading dot included.
///
/// The extension is the substring from the last `.` to the end of the
/// name. A name with no dot has no extension, and a name whose only dot
/// leads it (`.bashrc`) is a dotfile, not an extension.
///
/// # Examples
///
/// ```
/// use dirsort::mapping::extension_of;
///
/// assert_eq!(extension_of("photo.JPG"), Some(".JPG"));
/// assert_eq!(extension_of("backup.tar.gz"), Some(".gz"));
/// assert_eq!(extension_of("README"), None);
/// assert_eq!(extension_of(".bashrc"), None);
/// ```
pub fn extension_of(file_name: &str) -> Option<&str> {
    match file_name.rfind('.') {
        None | Some(0) => None,
        Some(index) => Some(&file_name[index..]),
    }
}

/// Normalizes a user-supplied extension for storage and lookup.
///
/// Trims whitespace, lower-cases, and adds the leading dot if missing.
/// The wildcard `*` passes through untouched so the sentinel key stays
/// addressable.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == WILDCARD_EXTENSION {
        return trimmed.to_string();
    }
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with('.') {
        lowered
    } else {
        format!(".{lowered}")
    }
}
