//! Event sink forwarding into a Tokio channel.

use lane_defence_core::{Event, EventSink};
use tokio::sync::mpsc;

/// Sink that forwards every event into an unbounded channel.
///
/// Events published after the receiver is dropped are discarded.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    /// Creates a sink together with the receiver draining it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}
