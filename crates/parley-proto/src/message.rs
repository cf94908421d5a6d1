//! Chat message record.
//!
//! A [`Message`] is what the server relays to every participant: when it was
//! received, what it says, and who said it. Server notices (joins, kicks,
//! replayed history headers) carry no author.
//!
//! # Invariants
//!
//! - Content is never absent: a record decoded without a `content` field gets
//!   the empty string.
//! - Date is never absent: a record decoded without a `date` field gets the
//!   decode time.
//! - Equality and hashing are structural over all three fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used by [`Message::formatted_date`] and the display form.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Immutable chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "Utc::now")]
    date: DateTime<Utc>,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
}

impl Message {
    /// Create a message with an explicit date and optional author.
    pub fn with_date(
        date: DateTime<Utc>,
        content: impl Into<String>,
        author: Option<String>,
    ) -> Self {
        Self { date, content: content.into(), author }
    }

    /// Create a message dated now.
    pub fn new(content: impl Into<String>, author: Option<String>) -> Self {
        Self::with_date(Utc::now(), content, author)
    }

    /// Create an author-less message dated now, as the server sends for its
    /// own notices.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(content, None)
    }

    /// Create a message from `author` dated now.
    pub fn from_author(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self::new(content, Some(author.into()))
    }

    /// Date the message was received by the server.
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Date rendered as `yyyy/MM/dd HH:mm:ss`.
    pub fn formatted_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Message text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Author name, absent on server notices.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Whether the message has an author.
    pub fn has_author(&self) -> bool {
        self.author.is_some()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.formatted_date())?;
        if let Some(author) = &self.author {
            write!(f, "{author} : ")?;
        }
        f.write_str(&self.content)
    }
}
