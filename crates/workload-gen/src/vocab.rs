//! Attribute vocabulary: the fixed catalogs of simulated entities that the
//! simulator samples from.
//!
//! The sets are immutable after startup. An empty set is a configuration
//! fault caught during STARTING, never a runtime condition to recover from.

use thiserror::Error;

/// Errors from vocabulary validation.
#[derive(Debug, Error)]
pub enum VocabError {
    /// One of the catalogs has no entries.
    #[error("vocabulary set `{0}` must not be empty")]
    EmptySet(&'static str),
}

/// Catalogs of users, operations, error kinds, and background-task kinds.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Simulated user identifiers; each request is attributed to one.
    pub users: Vec<String>,
    /// Operation names; requests open a `handle_<operation>` span.
    pub operations: Vec<String>,
    /// Error kinds used by the error-injection branch.
    pub error_kinds: Vec<String>,
    /// Background-task kinds; tasks open a `background_<kind>` span.
    pub background_kinds: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            users: strings(&["alice", "bob", "charlie", "diana"]),
            operations: strings(&["login", "search", "purchase", "update"]),
            error_kinds: strings(&["timeout", "validation_error", "network_error"]),
            background_kinds: strings(&["cleanup", "sync", "backup"]),
        }
    }
}

impl Vocabulary {
    /// Ensure every catalog has at least one entry.
    ///
    /// # Errors
    ///
    /// Returns [`VocabError::EmptySet`] naming the first empty catalog.
    pub fn validate(&self) -> Result<(), VocabError> {
        if self.users.is_empty() {
            return Err(VocabError::EmptySet("users"));
        }
        if self.operations.is_empty() {
            return Err(VocabError::EmptySet("operations"));
        }
        if self.error_kinds.is_empty() {
            return Err(VocabError::EmptySet("error_kinds"));
        }
        if self.background_kinds.is_empty() {
            return Err(VocabError::EmptySet("background_kinds"));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
