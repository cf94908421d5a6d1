//! Client error types.
//!
//! Only setup can fail loudly. Once a session runs, relay failures are logged
//! and turned into a loop exit plus a [`RunFlag`](crate::RunFlag) stop; they
//! never surface as a [`ClientError`].

use std::{fmt, io};

use parley_proto::{PayloadMode, ProtocolError};
use thiserror::Error;

/// Setup failure kinds, each with a documented process exit status.
///
/// Statuses are stable: scripts driving the client rely on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Failure {
    /// Port is reserved (must be > 1024).
    InvalidPort = 2,
    /// Participant name is empty.
    NoUserName = 3,
    /// Host name could not be resolved.
    UnknownHost = 7,
    /// Host resolved but the connection failed.
    ClientConnection = 8,
    /// Input stream from the server could not be set up.
    ClientInputStream = 9,
    /// Output stream to the server could not be set up (includes the
    /// handshake line).
    ClientOutputStream = 10,
    /// Local input could not be set up.
    UserInputStream = 11,
    /// Local output could not be set up.
    UserOutputStream = 12,
    /// Session was used while not ready.
    ClientNotReady = 17,
    /// Anything else.
    Other = 18,
}

impl Failure {
    /// Process exit status for this failure.
    pub const fn exit_code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InvalidPort => "Port number should be > 1024",
            Self::NoUserName => "Empty user name",
            Self::UnknownHost => "Unknown host",
            Self::ClientConnection => "Couldn't get I/O for connection to host",
            Self::ClientInputStream => "Could not get input stream from server",
            Self::ClientOutputStream => "Could not get output stream to server",
            Self::UserInputStream => "Could not get input stream from user",
            Self::UserOutputStream => "Could not get output stream to user",
            Self::ClientNotReady => "Client not ready",
            Self::Other => "Other cause",
        };
        f.write_str(text)
    }
}

/// Errors raised while building or starting a session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Host name did not resolve to any address.
    #[error("unknown host '{host}': {source}")]
    UnknownHost {
        /// Host as configured.
        host: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },

    /// Every resolved address refused or failed the connection.
    #[error("connection to {host}:{port} failed: {source}")]
    Connection {
        /// Host as configured.
        host: String,
        /// Port as configured.
        port: u16,
        /// Last connect error.
        #[source]
        source: io::Error,
    },

    /// Socket streams could not be obtained after connecting.
    #[error("could not set up server streams: {0}")]
    Streams(#[source] io::Error),

    /// Handshake line could not be written.
    #[error("could not send participant name to server: {0}")]
    Handshake(#[source] ProtocolError),

    /// Local output shape cannot be produced from the server's wire shape.
    #[error("cannot project {wire} server frames into {local} local output")]
    UnsupportedProjection {
        /// Server wire shape.
        wire: PayloadMode,
        /// Requested local output shape.
        local: PayloadMode,
    },

    /// Port is reserved.
    #[error("invalid port {0}: port number should be > 1024")]
    InvalidPort(u16),

    /// Participant name is empty.
    #[error("participant name is empty")]
    NoUserName,

    /// Participant name contains control characters, which would split the
    /// handshake line.
    #[error("participant name {0:?} contains control characters")]
    InvalidUserName(String),

    /// Session was run while not ready (never connected, or already run).
    #[error("session not ready")]
    NotReady,
}

impl ClientError {
    /// Failure kind, which determines the process exit status.
    pub fn failure(&self) -> Failure {
        match self {
            Self::UnknownHost { .. } => Failure::UnknownHost,
            Self::Connection { .. } => Failure::ClientConnection,
            Self::Streams(_) => Failure::ClientInputStream,
            Self::Handshake(_) => Failure::ClientOutputStream,
            Self::UnsupportedProjection { .. } => Failure::UserOutputStream,
            Self::InvalidPort(_) => Failure::InvalidPort,
            Self::NoUserName | Self::InvalidUserName(_) => Failure::NoUserName,
            Self::NotReady => Failure::ClientNotReady,
        }
    }

    /// Shorthand for `self.failure().exit_code()`.
    pub fn exit_code(&self) -> u8 {
        self.failure().exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_setup_cause() {
        let errors = [
            ClientError::UnknownHost { host: "nowhere".into(), source: io::ErrorKind::NotFound.into() },
            ClientError::Connection {
                host: "localhost".into(),
                port: 4000,
                source: io::ErrorKind::ConnectionRefused.into(),
            },
            ClientError::Streams(io::ErrorKind::NotConnected.into()),
            ClientError::Handshake(ProtocolError::Io(io::ErrorKind::BrokenPipe.into())),
            ClientError::UnsupportedProjection {
                wire: PayloadMode::Text,
                local: PayloadMode::Structured,
            },
        ];

        let mut codes: Vec<u8> = errors.iter().map(ClientError::exit_code).collect();
        assert_eq!(codes, vec![7, 8, 9, 10, 12]);
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn failure_display_is_human_readable() {
        assert_eq!(Failure::UnknownHost.to_string(), "Unknown host");
        assert_eq!(Failure::ClientNotReady.exit_code(), 17);
    }

    #[test]
    fn unusable_names_share_the_empty_name_status() {
        assert_eq!(ClientError::NoUserName.exit_code(), 3);
        assert_eq!(ClientError::InvalidUserName("a\nb".into()).exit_code(), 3);
    }
}
