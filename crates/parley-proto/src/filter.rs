//! Author-based message filter.

use std::{collections::BTreeSet, fmt};

use crate::Message;

/// Predicate accepting messages from a selected set of authors.
///
/// An inactive filter, or one with no authors selected, accepts everything.
/// An active filter with authors accepts only messages whose author is in the
/// set; author-less messages are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorFilter {
    authors: BTreeSet<String>,
    filtering: bool,
}

impl AuthorFilter {
    /// Inactive filter with no authors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inactive filter pre-populated with `authors` (typically the names
    /// currently selected in a participant list).
    pub fn from_authors<I, S>(authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { authors: authors.into_iter().map(Into::into).collect(), filtering: false }
    }

    /// Add an author. Returns `false` if already present.
    pub fn add(&mut self, author: impl Into<String>) -> bool {
        self.authors.insert(author.into())
    }

    /// Remove an author. Returns `true` if it was present.
    pub fn remove(&mut self, author: &str) -> bool {
        self.authors.remove(author)
    }

    /// Remove every author. Returns `true` if the set was non-empty.
    pub fn clear(&mut self) -> bool {
        if self.authors.is_empty() {
            return false;
        }
        self.authors.clear();
        true
    }

    /// Whether `author` is selected.
    pub fn contains(&self, author: &str) -> bool {
        self.authors.contains(author)
    }

    /// Number of selected authors.
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    /// True when no author is selected.
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    /// Selected authors, sorted.
    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.authors.iter().map(String::as_str)
    }

    /// Whether filtering is active.
    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    /// Turn filtering on or off. The author set is kept either way.
    pub fn set_filtering(&mut self, filtering: bool) {
        self.filtering = filtering;
    }

    /// Evaluate the predicate on `message`.
    pub fn test(&self, message: &Message) -> bool {
        if !self.filtering || self.authors.is_empty() {
            return true;
        }
        message.author().is_some_and(|author| self.authors.contains(author))
    }
}

impl fmt::Display for AuthorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filtering ")?;
        for (i, author) in self.authors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(author)?;
        }
        Ok(())
    }
}
