//! Consumer side of the unsolicited event stream.

use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::message::Message;

/// Outcome of a bounded wait on the event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPoll {
    /// An event arrived.
    Event(Message),
    /// The wait elapsed with no event.
    Empty,
    /// The dispatch loop has stopped and the queue is drained.
    Closed,
}

/// Handle on the ordered stream of uncorrelated events.
///
/// Clones share one queue: every event is delivered to exactly one of them.
/// Fan-out, if needed, is the consumer's job.
#[derive(Debug, Clone)]
pub struct Events {
    receiver: Receiver<Message>,
}

impl Events {
    pub(crate) const fn new(receiver: Receiver<Message>) -> Self {
        Self { receiver }
    }

    /// Blocks until the next event, or `None` once the stream has ended.
    #[must_use]
    pub fn recv(&self) -> Option<Message> {
        self.receiver.recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> EventPoll {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => EventPoll::Event(event),
            Err(RecvTimeoutError::Timeout) => EventPoll::Empty,
            Err(RecvTimeoutError::Disconnected) => EventPoll::Closed,
        }
    }

    /// Returns an already queued event without blocking.
    #[must_use]
    pub fn try_recv(&self) -> EventPoll {
        match self.receiver.try_recv() {
            Ok(event) => EventPoll::Event(event),
            Err(TryRecvError::Empty) => EventPoll::Empty,
            Err(TryRecvError::Disconnected) => EventPoll::Closed,
        }
    }

    /// Number of events currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no events are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Blocking iterator that ends with the stream.
    pub fn iter(&self) -> impl Iterator<Item = Message> + '_ {
        self.receiver.iter()
    }
}

impl IntoIterator for Events {
    type Item = Message;
    type IntoIter = crossbeam::channel::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.receiver.into_iter()
    }
}
