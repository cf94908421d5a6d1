//! Message ordering criteria.
//!
//! [`OrderCriteria`] is an ordered set of [`MessageOrder`] keys. Comparing two
//! messages walks the keys in priority order and the first key that tells the
//! messages apart decides. With no keys every message compares equal, so a
//! stable sort keeps arrival order.
//!
//! The criteria are a plain value owned by whoever displays messages.
//! Changing the order means mutating that value (or building a new
//! [`comparator`]) and re-sorting; nothing here is shared process-wide.
//!
//! # Invariants
//!
//! - Each key appears at most once.
//! - [`OrderCriteria::add`] is idempotent and reports whether it changed the
//!   set; [`OrderCriteria::remove`] reports whether the key was present.

use std::{cmp::Ordering, fmt};

use crate::Message;

/// A single comparison key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageOrder {
    /// Author name. A message with an author sorts after one without.
    Author,
    /// Reception date.
    Date,
    /// Message text, lexically.
    Content,
}

impl MessageOrder {
    /// All keys, in declaration order.
    pub const ALL: [Self; 3] = [Self::Author, Self::Date, Self::Content];

    /// Three-way comparison of `a` and `b` on this key alone.
    pub fn compare(self, a: &Message, b: &Message) -> Ordering {
        match self {
            Self::Author => match (a.author(), b.author()) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            },
            Self::Date => a.date().cmp(&b.date()),
            Self::Content => a.content().cmp(b.content()),
        }
    }
}

impl fmt::Display for MessageOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Author => "Author",
            Self::Date => "Date",
            Self::Content => "Content",
        };
        f.write_str(name)
    }
}

/// Compare two messages under an explicit list of keys.
///
/// Keys are tried in slice order; the first non-equal result wins.
pub fn compare_by(criteria: &[MessageOrder], a: &Message, b: &Message) -> Ordering {
    criteria
        .iter()
        .map(|key| key.compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Build a comparator over a snapshot of `criteria`.
///
/// The returned closure owns its keys, so later changes to the source do not
/// affect a sort already in progress.
pub fn comparator(criteria: &[MessageOrder]) -> impl Fn(&Message, &Message) -> Ordering + use<> {
    let keys = criteria.to_vec();
    move |a, b| compare_by(&keys, a, b)
}

/// Ordered set of comparison keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderCriteria {
    keys: Vec<MessageOrder>,
}

impl OrderCriteria {
    /// Empty criteria: all messages compare equal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key` with the lowest priority if it is not already present.
    ///
    /// Returns `true` if the set changed.
    pub fn add(&mut self, key: MessageOrder) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    /// Remove `key`, keeping the relative order of the others.
    ///
    /// Returns `true` if the key was present.
    pub fn remove(&mut self, key: MessageOrder) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| *k != key);
        debug_assert!(before - self.keys.len() <= 1);
        self.keys.len() != before
    }

    /// Whether `key` is part of the criteria.
    pub fn contains(&self, key: MessageOrder) -> bool {
        self.keys.contains(&key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no key is set.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drop every key.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Keys in priority order.
    pub fn iter(&self) -> impl Iterator<Item = MessageOrder> + '_ {
        self.keys.iter().copied()
    }

    /// Keys in priority order, as a slice.
    pub fn as_slice(&self) -> &[MessageOrder] {
        &self.keys
    }

    /// Three-way comparison under the current keys.
    pub fn compare(&self, a: &Message, b: &Message) -> Ordering {
        compare_by(&self.keys, a, b)
    }

    /// Comparator over a snapshot of the current keys.
    pub fn comparator(&self) -> impl Fn(&Message, &Message) -> Ordering + use<> {
        comparator(&self.keys)
    }

    /// Stable in-place sort of `messages` under the current keys.
    pub fn sort(&self, messages: &mut [Message]) {
        messages.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for OrderCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str("}")
    }
}
