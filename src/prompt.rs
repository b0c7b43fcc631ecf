/// Yes/no confirmation plumbing.
///
/// Every confirmation the tool needs flows through [`DecisionProvider`],
/// so business logic never reads stdin directly. The CLI installs an
/// interactive prompter; tests and headless flags install a [`Preset`].
use crate::mapping::MISC_CATEGORY;

use dialoguer::Confirm;

/// Context for a single yes/no question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation<'a> {
    /// An extension is already mapped elsewhere; move it?
    MoveExtension {
        extension: &'a str,
        from: &'a str,
        to: &'a str,
    },
    /// Some scanned files have no category; bucket them into misc?
    MiscBucket { uncategorized: usize },
    /// Fresh install with no categories; send everything to misc?
    MiscBootstrap,
}

impl Confirmation<'_> {
    /// Renders the question a human would be asked.
    pub fn message(&self) -> String {
        match self {
            Confirmation::MoveExtension {
                extension,
                from,
                to,
            } => {
                format!("'{extension}' is already mapped to '{from}'. Move it to '{to}'?")
            }
            Confirmation::MiscBucket { uncategorized } => {
                let files = if *uncategorized == 1 {
                    "file has"
                } else {
                    "files have"
                };
                format!("{uncategorized} {files} no category. Move them into '{MISC_CATEGORY}/'?")
            }
            Confirmation::MiscBootstrap => {
                format!("No categories are configured. Put everything in '{MISC_CATEGORY}'?")
            }
        }
    }
}

/// Supplies yes/no answers for [`Confirmation`] contexts.
pub trait DecisionProvider {
    fn confirm(&mut self, confirmation: &Confirmation<'_>) -> bool;
}

/// Asks the user on the terminal via a dialoguer prompt.
pub struct InteractivePrompter;

impl DecisionProvider for InteractivePrompter {
    fn confirm(&mut self, confirmation: &Confirmation<'_>) -> bool {
        // An unanswerable prompt (no tty, closed stdin) means "no":
        // every confirmation defaults to leaving state unchanged.
        Confirm::new()
            .with_prompt(confirmation.message())
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Answers every question the same way, without a terminal.
///
/// Backs the `--yes` / `--misc` / `--no-misc` flags and deterministic
/// tests.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    answer: bool,
}

impl Preset {
    pub fn yes() -> Self {
        Self { answer: true }
    }

    pub fn no() -> Self {
        Self { answer: false }
    }
}

impl DecisionProvider for Preset {
    fn confirm(&mut self, _confirmation: &Confirmation<'_>) -> bool {
        self.answer
    }
}
