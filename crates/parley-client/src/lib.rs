//! Parley client session
//!
//! One TCP connection to a Parley chat server, relayed in both directions by
//! two tokio tasks that share a cooperative shutdown flag.
//!
//! # Architecture
//!
//! ```text
//! LineSource ──► OutboundRelay ──► socket ──► server
//!                                              │
//! FrameSink  ◄── InboundRelay  ◄── socket ◄────┘
//!
//!        both relays share one RunFlag
//! ```
//!
//! The local ends are traits: the console client plugs stdin and stdout in
//! directly, a presentation layer plugs in the in-memory channels of a
//! loopback bridge.
//!
//! # Failure model
//!
//! Setup errors are returned from [`ConnectionManager::connect`] and carry a
//! [`Failure`] with a process exit status. Once running, nothing is returned
//! as an error: a relay that hits end of stream, a decode failure, or a write
//! failure logs it, stops the shared [`RunFlag`], and exits; its partner
//! follows on its next read.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod connection;
mod error;
mod io;
pub mod relay;
mod run_flag;

pub use config::{DEFAULT_HOST, DEFAULT_PORT, RESERVED_PORT_MAX, SessionConfig};
pub use connection::{ConnectionManager, SessionReport, SessionState};
pub use error::{ClientError, Failure};
pub use io::{ChannelSink, FrameSink, LineReader, LineSource};
pub use relay::{InboundRelay, OutboundRelay, RelayError, RelayExit};
pub use run_flag::RunFlag;
