//! dirsort - A directory sorting utility
//!
//! This library provides utilities for mapping file extensions to categories,
//! persisting those mappings as per-category JSON config files, and sorting a
//! directory's files into category subfolders in a single pass.

pub mod cli;
pub mod config;
pub mod mapping;
pub mod organizer;
pub mod output;
pub mod prompt;

pub use config::{AddOutcome, ConfigError, ConfigStore, LoadReport, RemoveOutcome};
pub use mapping::{ExtensionMapping, MappingTable};
pub use organizer::{FileOutcome, MiscPolicy, OrganizeError, OrganizeReport};
pub use prompt::{Confirmation, DecisionProvider, InteractivePrompter, Preset};

pub use cli::{Args, Command, run, run_command};
