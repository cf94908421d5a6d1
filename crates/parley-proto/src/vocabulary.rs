//! Reserved command vocabulary.
//!
//! Commands travel as ordinary text lines; the server gives them meaning. The
//! client only acts on [`BYE`], which also ends its outbound relay.

/// Graceful disconnect.
pub const BYE: &str = "bye";

/// Privileged: ask the server to remove a participant (`kick <name>`).
pub const KICK: &str = "kick";

/// Privileged: ask the server to shut down.
pub const KILL: &str = "kill";

/// Ask the server to replay its recorded history.
pub const CATCHUP: &str = "catchup";

/// Every reserved keyword.
pub const COMMANDS: [&str; 4] = [BYE, KICK, KILL, CATCHUP];

/// A recognized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `bye`
    Bye,
    /// `kick <name>`
    Kick {
        /// Participant to remove.
        name: String,
    },
    /// `kill`
    Kill,
    /// `catchup`
    Catchup,
}

impl Command {
    /// Parse a line into a command. Keywords are case-insensitive; anything
    /// else (including `kick` without a name) is plain chat text.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (trimmed, ""),
        };

        match keyword.to_ascii_lowercase().as_str() {
            BYE if rest.is_empty() => Some(Self::Bye),
            KILL if rest.is_empty() => Some(Self::Kill),
            CATCHUP if rest.is_empty() => Some(Self::Catchup),
            KICK if !rest.is_empty() => Some(Self::Kick { name: rest.to_string() }),
            _ => None,
        }
    }
}

/// Whether `line` is the termination keyword. Exact match, ignoring case.
pub fn is_bye(line: &str) -> bool {
    line.eq_ignore_ascii_case(BYE)
}
