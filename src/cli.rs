//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and validation
//! - Misc policy resolution from flags
//! - Organization orchestration
//! - Mapping management commands (add, list, reset, default)

use crate::config::{AddOutcome, ConfigStore};
use crate::mapping::normalize_extension;
use crate::organizer::{self, FileOutcome, MiscPolicy};
use crate::output::OutputFormatter;
use crate::prompt::{Confirmation, DecisionProvider, InteractivePrompter, Preset};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dirsort")]
#[command(about = "Sort the files in a directory into category subfolders")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Print a line for every file while organizing
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Organize a directory's files into category subfolders
    Organize {
        /// Directory to organize (defaults to the current directory)
        directory: Option<PathBuf>,

        /// Move uncategorized files into misc/ without asking
        #[arg(long, conflicts_with = "no_misc")]
        misc: bool,

        /// Leave uncategorized files in place without asking
        #[arg(long)]
        no_misc: bool,
    },
    /// Map a file extension to a category
    Add {
        /// Extension to map, with or without the leading dot
        extension: String,

        /// Category the extension should sort into
        category: String,

        /// Answer yes if the extension must move from another category
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// List every mapping, grouped by category
    List,
    /// Delete all category config files
    Reset,
    /// Write the default category config files
    Default,
}

/// Runs the CLI application with parsed arguments.
///
/// This is the main entry point for CLI operations. It resolves the
/// per-user config directory, wires up the interactive prompter, and
/// dispatches to the requested command. Invoking the binary without a
/// subcommand organizes the current directory.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Args, run};
///
/// let args = Args::parse_from(["dirsort", "add", ".png", "Images", "--yes"]);
/// if let Err(e) = run(args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run(args: Args) -> Result<(), String> {
    let store = ConfigStore::default_location().map_err(|e| e.to_string())?;
    let command = args.command.unwrap_or(Command::Organize {
        directory: None,
        misc: false,
        no_misc: false,
    });
    run_command(command, &store, &mut InteractivePrompter, args.verbose)
}

/// Runs one command against an explicit store and decision provider.
///
/// # Arguments
///
/// * `command` - The command to execute
/// * `store` - The config store to read and write
/// * `decider` - Answers any confirmation the command raises
/// * `verbose` - Whether to print per-file detail
pub fn run_command(
    command: Command,
    store: &ConfigStore,
    decider: &mut dyn DecisionProvider,
    verbose: bool,
) -> Result<(), String> {
    match command {
        Command::Organize {
            directory,
            misc,
            no_misc,
        } => {
            let directory = match directory {
                Some(directory) => directory,
                None => env::current_dir()
                    .map_err(|e| format!("Cannot resolve current directory: {}", e))?,
            };
            let policy = if misc {
                MiscPolicy::Bucket
            } else if no_misc {
                MiscPolicy::Leave
            } else {
                MiscPolicy::Ask
            };
            organize_directory(&directory, policy, store, decider, verbose)
        }
        Command::Add {
            extension,
            category,
            yes,
        } => add_mapping(store, &extension, &category, yes, decider),
        Command::List => list_mappings(store),
        Command::Reset => reset_mappings(store),
        Command::Default => create_defaults(store),
    }
}

/// Organizes a directory's files into category subdirectories.
///
/// This function:
/// 1. Settles the catch-all sentinel when no config exists yet, asking
///    only if no misc flag already answered
/// 2. Loads every category config file into one mapping table
/// 3. Reports config files that had to be skipped
/// 4. Moves the files, driving a progress bar
/// 5. Prints per-file problems and the category summary
fn organize_directory(
    directory: &Path,
    policy: MiscPolicy,
    store: &ConfigStore,
    decider: &mut dyn DecisionProvider,
    verbose: bool,
) -> Result<(), String> {
    OutputFormatter::info(&format!("Organizing directory: {}", directory.display()));

    store.ensure_dir().map_err(|e| e.to_string())?;
    let existing = store.config_files().map_err(|e| e.to_string())?;
    if existing.is_empty() {
        // An explicit misc flag already answers the sentinel question.
        let adopt = match policy {
            MiscPolicy::Bucket => true,
            MiscPolicy::Leave => false,
            MiscPolicy::Ask => decider.confirm(&Confirmation::MiscBootstrap),
        };
        if adopt {
            store.write_misc_sentinel().map_err(|e| e.to_string())?;
        } else {
            OutputFormatter::plain("No mappings configured, nothing to organize.");
            OutputFormatter::plain(
                "Run 'dirsort default' for the starter mappings, or 'dirsort add <extension> <category>' to define your own.",
            );
            return Ok(());
        }
    }

    let loaded = store.load().map_err(|e| e.to_string())?;
    for (path, reason) in &loaded.skipped {
        OutputFormatter::warning(&format!("Skipping {}: {}", path.display(), reason));
    }

    let bar = OutputFormatter::create_progress_bar(0);
    let report = organizer::organize(
        directory,
        &loaded.table,
        policy,
        decider,
        |done, total, outcome| {
            bar.set_length(total as u64);
            if let Some(name) = outcome.original_path().file_name() {
                bar.set_message(name.to_string_lossy().into_owned());
            }
            bar.set_position(done as u64);
        },
    )
    .map_err(|e| e.to_string())?;
    bar.finish_and_clear();

    if report.outcomes.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Moved { from, category, .. } => {
                if verbose && let Some(name) = from.file_name() {
                    OutputFormatter::detail(&format!(
                        "{} → {}/",
                        name.to_string_lossy(),
                        category
                    ));
                }
            }
            FileOutcome::FallbackMoved { from, to } => {
                OutputFormatter::warning(&format!(
                    "Path too long, parked {} at {}",
                    from.display(),
                    to.display()
                ));
            }
            FileOutcome::MoveFailed { path, reason } => {
                OutputFormatter::error(&format!("Could not move {}: {}", path.display(), reason));
            }
            FileOutcome::SkippedUncategorized { path } => {
                if verbose && let Some(name) = path.file_name() {
                    OutputFormatter::detail(&format!("{} left in place", name.to_string_lossy()));
                }
            }
        }
    }

    OutputFormatter::summary(&report.moves_by_category(), report.moved_count());

    if report.skipped_count() > 0 {
        OutputFormatter::warning(&format!(
            "{} file(s) left in place with no matching category",
            report.skipped_count()
        ));
    }
    if report.had_failures() {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be moved, review the errors above",
            report.failed_count()
        ));
    } else {
        OutputFormatter::success("Organization complete!");
    }
    Ok(())
}

/// Maps an extension to a category, confirming any move between categories.
fn add_mapping(
    store: &ConfigStore,
    extension: &str,
    category: &str,
    assume_yes: bool,
    decider: &mut dyn DecisionProvider,
) -> Result<(), String> {
    let outcome = if assume_yes {
        store.add_extension(extension, category, &mut Preset::yes())
    } else {
        store.add_extension(extension, category, decider)
    }
    .map_err(|e| e.to_string())?;

    let shown = normalize_extension(extension);
    match outcome {
        AddOutcome::Added => {
            OutputFormatter::success(&format!("Mapped {} to {}", shown, category));
        }
        AddOutcome::AlreadyMapped => {
            OutputFormatter::info(&format!("{} is already mapped to {}", shown, category));
        }
        AddOutcome::Moved { previous } => {
            OutputFormatter::success(&format!("Moved {} from {} to {}", shown, previous, category));
        }
        AddOutcome::Declined { existing } => {
            OutputFormatter::plain(&format!("{} stays mapped to {}", shown, existing));
        }
    }
    Ok(())
}

/// Prints every mapping, grouped by category in sorted order.
fn list_mappings(store: &ConfigStore) -> Result<(), String> {
    let loaded = store.load().map_err(|e| e.to_string())?;
    for (path, reason) in &loaded.skipped {
        OutputFormatter::warning(&format!("Skipping {}: {}", path.display(), reason));
    }
    if loaded.table.is_empty() {
        OutputFormatter::plain("No mappings configured.");
        return Ok(());
    }

    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for entry in loaded.table.entries() {
        grouped
            .entry(entry.category.as_str())
            .or_default()
            .push(entry.extension.as_str());
    }
    for (category, extensions) in &grouped {
        OutputFormatter::header(category);
        for extension in extensions {
            OutputFormatter::plain(&format!("  {}", extension));
        }
    }
    Ok(())
}

/// Deletes every category config file.
fn reset_mappings(store: &ConfigStore) -> Result<(), String> {
    let removed = store.reset().map_err(|e| e.to_string())?;
    if removed == 0 {
        OutputFormatter::plain("No config files to remove.");
    } else {
        OutputFormatter::success(&format!(
            "Removed {} config file(s) from {}",
            removed,
            store.dir().display()
        ));
    }
    Ok(())
}

/// Writes the default category config files.
fn create_defaults(store: &ConfigStore) -> Result<(), String> {
    store.ensure_dir().map_err(|e| e.to_string())?;
    store.write_defaults().map_err(|e| e.to_string())?;
    OutputFormatter::success(&format!(
        "Default mappings written to {}",
        store.dir().display()
    ));
    Ok(())
}
