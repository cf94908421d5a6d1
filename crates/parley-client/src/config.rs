//! Session configuration.

use parley_proto::PayloadMode;

use crate::ClientError;

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 1394;

/// Ports at or below this value are reserved.
pub const RESERVED_PORT_MAX: u16 = 1024;

/// Where to connect and how the server frames its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Server host name or address.
    pub host: String,
    /// Server TCP port.
    pub port: u16,
    /// Participant display name, sent as the handshake line.
    pub name: String,
    /// Shape of frames arriving from the server.
    pub wire_mode: PayloadMode,
}

impl SessionConfig {
    /// Config for `name` against the default host and port.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Replace the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Replace the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replace the server wire mode.
    pub fn with_wire_mode(mut self, mode: PayloadMode) -> Self {
        self.wire_mode = mode;
        self
    }

    /// Reject configs that can never yield a usable session.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidPort`] if the port is reserved
    /// - [`ClientError::NoUserName`] if the name is blank
    /// - [`ClientError::InvalidUserName`] if the name holds control characters
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.port <= RESERVED_PORT_MAX {
            return Err(ClientError::InvalidPort(self.port));
        }
        if self.name.trim().is_empty() {
            return Err(ClientError::NoUserName);
        }
        if self.name.chars().any(char::is_control) {
            return Err(ClientError::InvalidUserName(self.name.clone()));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            name: String::new(),
            wire_mode: PayloadMode::Structured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1394);
        assert_eq!(config.wire_mode, PayloadMode::Structured);
    }

    #[test]
    fn reserved_port_is_rejected() {
        let config = SessionConfig::new("alice").with_port(1024);
        assert!(matches!(config.validate(), Err(ClientError::InvalidPort(1024))));
        assert!(config.with_port(1025).validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(matches!(SessionConfig::new("  ").validate(), Err(ClientError::NoUserName)));
    }

    #[test]
    fn name_with_line_break_is_rejected() {
        for name in ["alice\nkill", "alice\r", "bob\u{7}"] {
            let err = SessionConfig::new(name).validate().unwrap_err();
            assert!(matches!(err, ClientError::InvalidUserName(_)), "{name:?} accepted");
            assert_eq!(err.exit_code(), 3);
        }
        assert!(SessionConfig::new("zoë").validate().is_ok());
    }
}
