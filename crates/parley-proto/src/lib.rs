//! Parley protocol
//!
//! Message model and wire codec shared by every Parley component. Pure values
//! and framing only: no sockets, no tasks, no logging.
//!
//! # Components
//!
//! - [`Message`]: the relayed chat record
//! - [`OrderCriteria`] / [`MessageOrder`]: composable message ordering
//! - [`AuthorFilter`]: author-based message predicate
//! - [`PayloadMode`]: text lines vs structured records
//! - [`FrameReader`] / [`FrameWriter`]: mode-bound async codec halves
//! - [`vocabulary`]: reserved command lines (`bye`, `kick`, `kill`,
//!   `catchup`)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod errors;
mod filter;
mod message;
mod mode;
mod order;
pub mod vocabulary;

pub use codec::{
    Frame, FrameReader, FrameWriter, MAX_LINE_SIZE, MAX_RECORD_SIZE, ReadOutcome, decode_record,
    encode_record, read_text_line,
};
pub use errors::ProtocolError;
pub use filter::AuthorFilter;
pub use message::{DATE_FORMAT, Message};
pub use mode::{ParseModeError, PayloadMode};
pub use order::{MessageOrder, OrderCriteria, compare_by, comparator};
