use dirsort::cli::{Command, run_command};
/// Integration tests for dirsort
///
/// These tests simulate real-world usage scenarios, testing the complete
/// end-to-end functionality of the dirsort utility against a throwaway
/// config directory and a throwaway target directory.
///
/// Test categories:
/// 1. Mapping management (add, list, reset, default)
/// 2. Basic organization workflows
/// 3. Uncategorized files and the misc policy
/// 4. Fresh-install flows
/// 5. Config robustness
/// 6. Edge cases and error scenarios
use dirsort::config::ConfigStore;
use dirsort::prompt::{DecisionProvider, Preset};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture that pairs a throwaway config directory with a
/// throwaway target directory to organize.
struct TestFixture {
    config_dir: TempDir,
    target_dir: TempDir,
    store: ConfigStore,
}

impl TestFixture {
    /// Create a fixture with an empty config directory.
    fn new() -> Self {
        let config_dir = TempDir::new().expect("Failed to create config directory");
        let target_dir = TempDir::new().expect("Failed to create target directory");
        let store = ConfigStore::new(config_dir.path());
        TestFixture {
            config_dir,
            target_dir,
            store,
        }
    }

    /// Create a fixture whose config directory holds the default categories.
    fn with_defaults() -> Self {
        let fixture = Self::new();
        fixture
            .store
            .ensure_dir()
            .expect("Failed to create config directory");
        fixture
            .store
            .write_defaults()
            .expect("Failed to write default configs");
        fixture
    }

    /// Get the path to the directory being organized.
    fn path(&self) -> &Path {
        self.target_dir.path()
    }

    /// Create a file with content in the target directory.
    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    /// Create a file with specific content (string version).
    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    /// Create multiple files at once.
    fn create_files(&self, files: &[(&str, &[u8])]) {
        for (name, content) in files {
            self.create_file(name, content);
        }
    }

    /// Create a subdirectory in the target directory.
    fn create_subdir(&self, name: &str) {
        let dir_path = self.path().join(name);
        fs::create_dir(&dir_path).expect("Failed to create subdirectory");
    }

    /// Organize the target directory, declining any prompt.
    fn organize(&self) -> Result<(), String> {
        self.organize_with(false, false, &mut Preset::no())
    }

    /// Organize the target directory with explicit flags and decider.
    fn organize_with(
        &self,
        misc: bool,
        no_misc: bool,
        decider: &mut dyn DecisionProvider,
    ) -> Result<(), String> {
        run_command(
            Command::Organize {
                directory: Some(self.path().to_path_buf()),
                misc,
                no_misc,
            },
            &self.store,
            decider,
            false,
        )
    }

    /// Map an extension to a category, auto-confirming moves.
    fn add(&self, extension: &str, category: &str) -> Result<(), String> {
        run_command(
            Command::Add {
                extension: extension.to_string(),
                category: category.to_string(),
                yes: true,
            },
            &self.store,
            &mut Preset::no(),
            false,
        )
    }

    /// Read a category config file's raw content.
    fn read_config(&self, category: &str) -> String {
        fs::read_to_string(self.store.category_path(category)).expect("Failed to read config file")
    }

    /// Assert that a directory exists under the target directory.
    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_dir(),
            "Directory should exist: {}",
            path.display()
        );
    }

    /// Assert that a file exists at the given relative path.
    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    /// Assert that a file does NOT exist at the given relative path.
    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Count files in the target directory root (non-recursive).
    fn count_files(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| {
                entry
                    .ok()
                    .and_then(|e| e.metadata().ok()?.is_file().then_some(()))
            })
            .count()
    }

    /// Count directories in the target directory root (non-recursive).
    fn count_dirs(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| {
                entry
                    .ok()
                    .and_then(|e| e.metadata().ok()?.is_dir().then_some(()))
            })
            .count()
    }

    /// List all files in the target directory recursively.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(&self.path().to_path_buf(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &PathBuf, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }
}

// ============================================================================
// Test Suite 1: Mapping Management
// ============================================================================

#[test]
fn test_add_creates_tab_indented_config_file() {
    let fixture = TestFixture::new();

    fixture.add(".zip", "Archives").expect("add should succeed");

    assert_eq!(
        fixture.read_config("Archives"),
        "{\n\t\".zip\": \"Archives\"\n}"
    );
    // The first command against a fresh store also seeds the defaults.
    assert!(fixture.store.category_path("Documents").exists());
}

#[test]
fn test_add_without_leading_dot_is_normalized() {
    let fixture = TestFixture::with_defaults();

    fixture.add("ZIP", "Archives").expect("add should succeed");

    assert_eq!(
        fixture.read_config("Archives"),
        "{\n\t\".zip\": \"Archives\"\n}"
    );
}

#[test]
fn test_add_same_mapping_twice_changes_nothing() {
    let fixture = TestFixture::with_defaults();

    fixture.add(".zip", "Archives").expect("add should succeed");
    let before = fixture.read_config("Archives");
    fixture.add(".ZIP", "Archives").expect("add should succeed");

    assert_eq!(fixture.read_config("Archives"), before);
}

#[test]
fn test_add_moves_extension_between_categories() {
    let fixture = TestFixture::with_defaults();

    // .txt starts out under Documents; the -y flag confirms the move.
    fixture.add("txt", "Notes").expect("add should succeed");

    assert!(fixture.store.category_path("Notes").exists());
    assert!(!fixture.read_config("Documents").contains(".txt"));
    assert_eq!(fixture.read_config("Notes"), "{\n\t\".txt\": \"Notes\"\n}");
}

#[test]
fn test_add_declined_move_keeps_existing_mapping() {
    let fixture = TestFixture::with_defaults();

    run_command(
        Command::Add {
            extension: ".txt".to_string(),
            category: "Notes".to_string(),
            yes: false,
        },
        &fixture.store,
        &mut Preset::no(),
        false,
    )
    .expect("add should succeed");

    assert!(!fixture.store.category_path("Notes").exists());
    assert!(fixture.read_config("Documents").contains(".txt"));
}

#[test]
fn test_default_writes_the_four_starter_categories() {
    let fixture = TestFixture::new();

    run_command(Command::Default, &fixture.store, &mut Preset::no(), false)
        .expect("default should succeed");

    for category in ["Documents", "Images", "Audio", "Video"] {
        assert!(
            fixture.store.category_path(category).exists(),
            "Missing starter config for {}",
            category
        );
    }
    let report = fixture.store.load().expect("load should succeed");
    assert_eq!(report.table.len(), 12);
}

#[test]
fn test_reset_removes_all_config_files() {
    let fixture = TestFixture::with_defaults();
    fixture.add(".zip", "Archives").expect("add should succeed");

    run_command(Command::Reset, &fixture.store, &mut Preset::no(), false)
        .expect("reset should succeed");

    assert!(
        fixture
            .store
            .config_files()
            .expect("config_files should succeed")
            .is_empty()
    );
}

#[test]
fn test_list_succeeds_on_populated_store() {
    let fixture = TestFixture::with_defaults();
    let result = run_command(Command::List, &fixture.store, &mut Preset::no(), false);
    assert!(result.is_ok());
}

// ============================================================================
// Test Suite 2: Basic Organization
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::with_defaults();

    let result = fixture.organize();

    assert!(result.is_ok(), "Should succeed on empty directory");
    assert_eq!(fixture.count_dirs(), 0, "Should have no subdirectories");
}

#[test]
fn test_organize_single_document() {
    let fixture = TestFixture::with_defaults();
    fixture.create_text_file("report.pdf", "pdf bytes");

    let result = fixture.organize();

    assert!(result.is_ok());
    fixture.assert_dir_exists("Documents");
    fixture.assert_file_exists("Documents/report.pdf");
    fixture.assert_file_not_exists("report.pdf");
}

#[test]
fn test_organize_downloads_folder_simulation() {
    let fixture = TestFixture::with_defaults();

    fixture.create_files(&[
        ("wallpaper.jpg", b"jpg".as_slice()),
        ("photo.png", b"png".as_slice()),
        ("animation.gif", b"gif".as_slice()),
        ("notes.txt", b"text".as_slice()),
        ("cv.doc", b"doc".as_slice()),
        ("ebook.pdf", b"pdf".as_slice()),
        ("song.mp3", b"mp3".as_slice()),
        ("voice.wav", b"wav".as_slice()),
        ("track.flac", b"flac".as_slice()),
        ("clip.mp4", b"mp4".as_slice()),
        ("movie.mkv", b"mkv".as_slice()),
        ("installer.xyz", b"???".as_slice()),
    ]);

    let result = fixture.organize();
    assert!(result.is_ok());

    fixture.assert_file_exists("Images/wallpaper.jpg");
    fixture.assert_file_exists("Images/photo.png");
    fixture.assert_file_exists("Images/animation.gif");
    fixture.assert_file_exists("Documents/notes.txt");
    fixture.assert_file_exists("Documents/cv.doc");
    fixture.assert_file_exists("Documents/ebook.pdf");
    fixture.assert_file_exists("Audio/song.mp3");
    fixture.assert_file_exists("Audio/voice.wav");
    fixture.assert_file_exists("Audio/track.flac");
    fixture.assert_file_exists("Video/clip.mp4");
    fixture.assert_file_exists("Video/movie.mkv");

    // The unknown extension stays put when the prompt is declined.
    fixture.assert_file_exists("installer.xyz");
    assert_eq!(fixture.count_files(), 1, "Only installer.xyz should remain");
}

#[test]
fn test_organize_mixed_case_extensions() {
    let fixture = TestFixture::with_defaults();
    fixture.create_files(&[
        ("photo.PNG", b"png".as_slice()),
        ("report.Pdf", b"pdf".as_slice()),
    ]);

    fixture.organize().expect("organize should succeed");

    // Matching is case-insensitive; the original name is preserved.
    fixture.assert_file_exists("Images/photo.PNG");
    fixture.assert_file_exists("Documents/report.Pdf");
}

#[test]
fn test_organize_files_with_multiple_dots() {
    let fixture = TestFixture::with_defaults();
    fixture.create_files(&[
        ("photo.backup.png", b"png".as_slice()),
        ("report.final.pdf", b"pdf".as_slice()),
    ]);

    fixture.organize().expect("organize should succeed");

    fixture.assert_file_exists("Images/photo.backup.png");
    fixture.assert_file_exists("Documents/report.final.pdf");
}

#[test]
fn test_organize_preserves_file_content() {
    let fixture = TestFixture::with_defaults();
    fixture.create_text_file("notes.txt", "the content to keep");

    fixture.organize().expect("organize should succeed");

    let moved = fixture.path().join("Documents").join("notes.txt");
    assert_eq!(
        fs::read_to_string(&moved).expect("Failed to read moved file"),
        "the content to keep"
    );
}

#[test]
fn test_organize_idempotent() {
    let fixture = TestFixture::with_defaults();
    fixture.create_files(&[
        ("photo.png", b"png".as_slice()),
        ("report.pdf", b"pdf".as_slice()),
    ]);

    fixture.organize().expect("first organize should succeed");
    let files_after_first = fixture.list_files_recursive();

    fixture.organize().expect("second organize should succeed");
    let files_after_second = fixture.list_files_recursive();

    assert_eq!(
        files_after_first, files_after_second,
        "Organizing again should not change anything"
    );
}

#[test]
fn test_organize_with_existing_category_directories() {
    let fixture = TestFixture::with_defaults();
    fixture.create_subdir("Images");
    fixture.create_file("Images/existing.png", b"png");
    fixture.create_file("new_photo.png", b"png");

    fixture.organize().expect("organize should succeed");

    fixture.assert_file_exists("Images/existing.png");
    fixture.assert_file_exists("Images/new_photo.png");
}

#[test]
fn test_organize_then_add_files_then_organize_again() {
    let fixture = TestFixture::with_defaults();
    fixture.create_file("photo1.png", b"png");

    fixture.organize().expect("first organize should succeed");
    fixture.assert_file_exists("Images/photo1.png");

    fixture.create_file("photo2.png", b"png");
    fixture.organize().expect("second organize should succeed");

    fixture.assert_file_exists("Images/photo1.png");
    fixture.assert_file_exists("Images/photo2.png");
}

#[test]
fn test_new_mapping_takes_effect_on_next_run() {
    let fixture = TestFixture::with_defaults();
    fixture.create_file("notes.org", b"org");

    fixture.organize().expect("organize should succeed");
    fixture.assert_file_exists("notes.org");

    fixture.add(".org", "Documents").expect("add should succeed");
    fixture.organize().expect("organize should succeed");

    fixture.assert_file_exists("Documents/notes.org");
}

// ============================================================================
// Test Suite 3: Uncategorized Files and the Misc Policy
// ============================================================================

#[test]
fn test_uncategorized_left_in_place_when_declined() {
    let fixture = TestFixture::with_defaults();
    fixture.create_file("mystery.xyz", b"???");

    fixture
        .organize_with(false, false, &mut Preset::no())
        .expect("organize should succeed");

    fixture.assert_file_exists("mystery.xyz");
    fixture.assert_file_not_exists("misc");
}

#[test]
fn test_uncategorized_bucketed_when_confirmed() {
    let fixture = TestFixture::with_defaults();
    fixture.create_file("mystery.xyz", b"???");

    fixture
        .organize_with(false, false, &mut Preset::yes())
        .expect("organize should succeed");

    fixture.assert_file_exists("misc/mystery.xyz");
}

#[test]
fn test_misc_flag_buckets_without_prompting() {
    let fixture = TestFixture::with_defaults();
    fixture.create_file("mystery.xyz", b"???");

    // Preset::no would decline a prompt, so this passing proves
    // the flag bypasses it.
    fixture
        .organize_with(true, false, &mut Preset::no())
        .expect("organize should succeed");

    fixture.assert_file_exists("misc/mystery.xyz");
}

#[test]
fn test_no_misc_flag_leaves_without_prompting() {
    let fixture = TestFixture::with_defaults();
    fixture.create_file("mystery.xyz", b"???");

    fixture
        .organize_with(false, true, &mut Preset::yes())
        .expect("organize should succeed");

    fixture.assert_file_exists("mystery.xyz");
    fixture.assert_file_not_exists("misc");
}

#[test]
fn test_wildcard_sentinel_buckets_without_prompting() {
    let fixture = TestFixture::with_defaults();
    fixture.add("*", "misc").expect("add should succeed");
    fixture.create_file("mystery.xyz", b"???");

    fixture
        .organize_with(false, false, &mut Preset::no())
        .expect("organize should succeed");

    fixture.assert_file_exists("misc/mystery.xyz");
}

#[test]
fn test_dotfiles_count_as_extensionless() {
    let fixture = TestFixture::with_defaults();
    fixture.create_files(&[
        (".bashrc", b"rc".as_slice()),
        ("README", b"readme".as_slice()),
    ]);

    fixture
        .organize_with(false, true, &mut Preset::no())
        .expect("organize should succeed");
    fixture.assert_file_exists(".bashrc");
    fixture.assert_file_exists("README");

    fixture
        .organize_with(true, false, &mut Preset::no())
        .expect("organize should succeed");
    fixture.assert_file_exists("misc/.bashrc");
    fixture.assert_file_exists("misc/README");
}

// ============================================================================
// Test Suite 4: Fresh-Install Flows
// ============================================================================

#[test]
fn test_fresh_install_decline_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("mystery.bin", b"???");

    fixture
        .organize_with(false, false, &mut Preset::no())
        .expect("organize should exit cleanly");

    assert!(
        fixture
            .store
            .config_files()
            .expect("config_files should succeed")
            .is_empty(),
        "Declining the offer must not create config files"
    );
    fixture.assert_file_exists("mystery.bin");
    assert_eq!(fixture.count_dirs(), 0);
}

#[test]
fn test_fresh_install_accept_writes_only_the_sentinel() {
    let fixture = TestFixture::new();
    fixture.create_file("mystery.bin", b"???");

    fixture
        .organize_with(false, false, &mut Preset::yes())
        .expect("organize should succeed");

    let sentinel = fixture.config_dir.path().join("misc_config.json");
    assert!(sentinel.exists());
    assert_eq!(
        fs::read_to_string(&sentinel).expect("Failed to read sentinel"),
        "{\n\t\"*\": \"misc\"\n}"
    );
    assert!(!fixture.store.category_path("Documents").exists());
    fixture.assert_file_exists("misc/mystery.bin");
}

#[test]
fn test_fresh_install_list_seeds_the_defaults() {
    let fixture = TestFixture::new();

    run_command(Command::List, &fixture.store, &mut Preset::no(), false)
        .expect("list should succeed");

    assert_eq!(
        fixture
            .store
            .config_files()
            .expect("config_files should succeed")
            .len(),
        4
    );
}

// ============================================================================
// Test Suite 5: Config Robustness
// ============================================================================

#[test]
fn test_malformed_config_is_skipped_not_fatal() {
    let fixture = TestFixture::with_defaults();
    fs::write(fixture.store.category_path("Broken"), "{ not json")
        .expect("Failed to write broken config");
    fixture.create_file("photo.png", b"png");

    fixture.organize().expect("organize should still succeed");

    fixture.assert_file_exists("Images/photo.png");
}

#[test]
fn test_duplicate_extension_resolved_in_sorted_file_order() {
    let fixture = TestFixture::new();
    fixture
        .store
        .ensure_dir()
        .expect("Failed to create config directory");
    fs::write(
        fixture.store.category_path("Alpha"),
        "{\n\t\".ps\": \"Alpha\"\n}",
    )
    .expect("Failed to write config");
    fs::write(
        fixture.store.category_path("Zulu"),
        "{\n\t\".ps\": \"Zulu\"\n}",
    )
    .expect("Failed to write config");
    fixture.create_file("figure.ps", b"ps");

    fixture.organize().expect("organize should succeed");

    fixture.assert_file_exists("Alpha/figure.ps");
    fixture.assert_file_not_exists("Zulu/figure.ps");
}

#[test]
fn test_non_string_value_skips_pair_but_keeps_rest() {
    let fixture = TestFixture::new();
    fixture
        .store
        .ensure_dir()
        .expect("Failed to create config directory");
    fs::write(
        fixture.store.category_path("Mixed"),
        "{\n\t\".ok\": \"Mixed\",\n\t\".bad\": 7\n}",
    )
    .expect("Failed to write config");
    fixture.create_files(&[("a.ok", b"ok".as_slice()), ("b.bad", b"bad".as_slice())]);

    fixture
        .organize_with(false, true, &mut Preset::no())
        .expect("organize should succeed");

    fixture.assert_file_exists("Mixed/a.ok");
    fixture.assert_file_exists("b.bad");
}

// ============================================================================
// Test Suite 6: Edge Cases and Error Scenarios
// ============================================================================

#[test]
fn test_directories_are_never_moved() {
    let fixture = TestFixture::with_defaults();
    // A directory whose name looks like an image file.
    fixture.create_subdir("vacation.png");
    fixture.create_file("photo.png", b"png");

    fixture.organize().expect("organize should succeed");

    fixture.assert_dir_exists("vacation.png");
    fixture.assert_file_exists("Images/photo.png");
    fixture.assert_file_not_exists("Images/vacation.png");
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_left_alone() {
    let fixture = TestFixture::with_defaults();
    fixture.create_file("real.txt", b"text");
    std::os::unix::fs::symlink(
        fixture.path().join("real.txt"),
        fixture.path().join("link.txt"),
    )
    .expect("Failed to create symlink");

    fixture.organize().expect("organize should succeed");

    fixture.assert_file_exists("Documents/real.txt");
    // The symlink stays behind, now dangling; it was never a move candidate.
    assert!(fixture.path().join("link.txt").symlink_metadata().is_ok());
    fixture.assert_file_not_exists("Documents/link.txt");
}

#[test]
fn test_failed_move_does_not_abort_the_batch() {
    let fixture = TestFixture::with_defaults();
    // A plain file squatting on a category name makes that rename fail.
    fixture.create_file("Images", b"not a directory");
    fixture.create_file("photo.png", b"png");
    fixture.create_file("notes.txt", b"text");

    let result = fixture.organize();

    // Per-file failures are reported, not fatal.
    assert!(result.is_ok());
    fixture.assert_file_exists("photo.png");
    fixture.assert_file_exists("Documents/notes.txt");
}

#[test]
fn test_organize_special_characters_in_filename() {
    let fixture = TestFixture::with_defaults();
    fixture.create_files(&[
        ("photo (1).png", b"png".as_slice()),
        ("report - final.pdf", b"pdf".as_slice()),
        ("song [remix].mp3", b"mp3".as_slice()),
    ]);

    fixture.organize().expect("organize should succeed");

    fixture.assert_file_exists("Images/photo (1).png");
    fixture.assert_file_exists("Documents/report - final.pdf");
    fixture.assert_file_exists("Audio/song [remix].mp3");
}

#[test]
fn test_organize_missing_directory_is_an_error() {
    let fixture = TestFixture::with_defaults();
    let missing = fixture.path().join("does_not_exist");

    let result = run_command(
        Command::Organize {
            directory: Some(missing),
            misc: false,
            no_misc: false,
        },
        &fixture.store,
        &mut Preset::no(),
        false,
    );

    assert!(result.is_err(), "A missing target directory is fatal");
}

#[test]
fn test_trailing_dot_maps_to_the_bare_dot_extension() {
    let fixture = TestFixture::with_defaults();
    fixture.create_file("weird.", b"???");

    fixture
        .organize_with(false, true, &mut Preset::no())
        .expect("organize should succeed");
    // "weird." has the extension "." which no default category maps.
    fixture.assert_file_exists("weird.");
}
