//! Registry of requests awaiting a correlated reply.
//!
//! Each entry maps a correlation tag to the sending half of a single-slot
//! channel whose receiving half is held by the waiting caller. An entry leaves
//! the registry exactly once: claimed by the dispatch loop for delivery, or
//! removed by the caller on timeout or send failure. Whichever removal wins
//! owns the terminal transition.

use crossbeam::channel::{self, Receiver, Sender};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::message::Message;

/// Length of generated correlation tags.
pub const TAG_LENGTH: usize = 32;

/// Generates a random alphanumeric correlation tag.
#[must_use]
pub fn generate_tag() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TAG_LENGTH)
        .map(char::from)
        .collect()
}

/// Concurrent map from correlation tag to delivery channel.
#[derive(Debug, Default)]
pub(crate) struct PendingRegistry {
    entries: DashMap<String, Sender<Message>>,
}

impl PendingRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh tag that is not currently pending.
    pub(crate) fn register(&self) -> (String, Receiver<Message>) {
        loop {
            let tag = generate_tag();
            if let Some(receiver) = self.register_tag(&tag) {
                return (tag, receiver);
            }
        }
    }

    /// Registers `tag`, or returns `None` if it is already pending.
    pub(crate) fn register_tag(&self, tag: &str) -> Option<Receiver<Message>> {
        match self.entries.entry(tag.to_owned()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let (sender, receiver) = channel::bounded(1);
                slot.insert(sender);
                Some(receiver)
            }
        }
    }

    /// Atomically removes the entry for `tag`, handing its sender to the caller.
    pub(crate) fn claim(&self, tag: &str) -> Option<Sender<Message>> {
        self.entries.remove(tag).map(|(_, sender)| sender)
    }

    /// Whether `tag` is pending.
    pub(crate) fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Number of pending requests.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops every entry, waking all waiters with a disconnection.
    pub(crate) fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn generated_tags_are_long_and_alphanumeric() {
        let tag = generate_tag();

        assert_eq!(tag.len(), TAG_LENGTH);
        assert!(tag.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(tag, generate_tag());
    }

    #[rstest]
    fn duplicate_tags_are_refused() {
        let registry = PendingRegistry::new();

        assert!(registry.register_tag("dup").is_some());
        assert!(registry.register_tag("dup").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn claim_removes_exactly_once() {
        let registry = PendingRegistry::new();
        let (tag, receiver) = registry.register();

        let sender = registry.claim(&tag).expect("first claim succeeds");
        assert!(registry.claim(&tag).is_none());
        assert!(!registry.contains(&tag));

        sender
            .try_send(Message::new("ok"))
            .expect("single slot accepts one message");
        drop(sender);
        assert_eq!(receiver.recv().ok(), Some(Message::new("ok")));
        assert!(receiver.recv().is_err(), "channel closes after delivery");
    }

    #[rstest]
    fn clear_disconnects_waiters() {
        let registry = PendingRegistry::new();
        let (_, receiver) = registry.register();

        registry.clear();

        assert_eq!(registry.len(), 0);
        assert!(receiver.recv().is_err());
    }
}
