//! Payload modes.

use std::{fmt, str::FromStr};

/// Frame shape used on one direction of a stream.
///
/// Chosen once when a session (or a bridge) is built; it selects the
/// read/write functions used for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PayloadMode {
    /// Newline-terminated text lines.
    Text,
    /// Length-prefixed CBOR [`Message`](crate::Message) records.
    #[default]
    Structured,
}

impl PayloadMode {
    /// 1-based index: `Text` = 1, `Structured` = 2.
    pub const fn to_index(self) -> u8 {
        match self {
            Self::Text => 1,
            Self::Structured => 2,
        }
    }

    /// Mode from a 1-based index, clamped: anything `<= 1` is `Text`, anything
    /// `>= 2` is `Structured`.
    pub const fn from_index(index: i64) -> Self {
        if index <= 1 { Self::Text } else { Self::Structured }
    }

    /// Lower-case name, as accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Structured => "structured",
        }
    }
}

impl fmt::Display for PayloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payload mode '{0}' (expected 'text' or 'structured')")]
pub struct ParseModeError(String);

impl FromStr for PayloadMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "structured" => Ok(Self::Structured),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_clamped() {
        assert_eq!(PayloadMode::from_index(-4), PayloadMode::Text);
        assert_eq!(PayloadMode::from_index(1), PayloadMode::Text);
        assert_eq!(PayloadMode::from_index(2), PayloadMode::Structured);
        assert_eq!(PayloadMode::from_index(99), PayloadMode::Structured);
    }

    #[test]
    fn index_round_trips() {
        for mode in [PayloadMode::Text, PayloadMode::Structured] {
            assert_eq!(PayloadMode::from_index(i64::from(mode.to_index())), mode);
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("Text".parse(), Ok(PayloadMode::Text));
        assert_eq!("structured".parse(), Ok(PayloadMode::Structured));
        assert!("binary".parse::<PayloadMode>().is_err());
        assert!("object".parse::<PayloadMode>().is_err());
    }

    #[test]
    fn default_is_structured() {
        assert_eq!(PayloadMode::default(), PayloadMode::Structured);
    }
}
