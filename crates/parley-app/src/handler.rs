//! Presentation-layer contract.

use parley_proto::Message;

/// Receives decoded server traffic on behalf of a presentation layer.
///
/// Calls arrive from the bridge task, one at a time, in server order. An
/// implementation should return quickly: the bridge does not read the next
/// frame until the current call returns.
pub trait MessageHandler: Send {
    /// A structured record arrived.
    fn receive_message(&mut self, message: Message);

    /// A text line arrived.
    fn receive_text(&mut self, line: String);

    /// A record named a participant (non-empty author).
    fn receive_participant(&mut self, name: &str);

    /// The handler's view should be redrawn from scratch.
    fn request_full_rerender(&mut self);
}

impl<H: MessageHandler + ?Sized> MessageHandler for Box<H> {
    fn receive_message(&mut self, message: Message) {
        (**self).receive_message(message);
    }

    fn receive_text(&mut self, line: String) {
        (**self).receive_text(line);
    }

    fn receive_participant(&mut self, name: &str) {
        (**self).receive_participant(name);
    }

    fn request_full_rerender(&mut self) {
        (**self).request_full_rerender();
    }
}
