//! Parley presentation bridge
//!
//! Connects a running session to a presentation layer without letting the
//! presentation code touch sockets or share a task with socket I/O.
//!
//! # Components
//!
//! - [`MessageHandler`]: what a presentation layer implements
//! - [`LoopbackBridge`]: decodes relayed frames into handler calls
//! - [`TextSender`]: the presentation layer's "send text" handle
//! - [`ColorCache`]: stable per-participant colors for one session

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bridge;
mod color;
mod error;
mod handler;
mod sender;

pub use bridge::{BRIDGE_CAPACITY, BridgeSink, BridgeSource, LoopbackBridge};
pub use color::{ColorCache, Rgb};
pub use error::BridgeError;
pub use handler::MessageHandler;
pub use sender::TextSender;
