//! In-memory [`Transport`] for exercising the engine without the native
//! library.
//!
//! A [`ScriptedTransport`] is a cheap cloneable handle: keep one clone in the
//! test and move another into the client. Messages pushed through the handle
//! come out of `receive` in order; everything the client sends or executes
//! is recorded for inspection.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::errors::TransportError;
use crate::message::Message;
use crate::transport::Transport;

type Responder = Box<dyn Fn(&Message) -> Option<Message> + Send + Sync>;

enum Inbound {
    Payload(Vec<u8>),
    Failure(TransportError),
}

struct Inner {
    inbound_tx: Sender<Inbound>,
    inbound_rx: Receiver<Inbound>,
    sent_tx: Sender<Message>,
    sent_rx: Receiver<Message>,
    sent: Mutex<Vec<Message>>,
    executed: Mutex<Vec<Message>>,
    responder: Mutex<Option<Responder>>,
    execute_responder: Mutex<Option<Responder>>,
    send_failure: Mutex<Option<String>>,
}

/// Scripted transport double.
#[derive(Clone)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("queued", &self.inner.inbound_rx.len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedTransport {
    /// Creates a silent transport with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = channel::unbounded();
        let (sent_tx, sent_rx) = channel::unbounded();
        Self {
            inner: Arc::new(Inner {
                inbound_tx,
                inbound_rx,
                sent_tx,
                sent_rx,
                sent: Mutex::new(Vec::new()),
                executed: Mutex::new(Vec::new()),
                responder: Mutex::new(None),
                execute_responder: Mutex::new(None),
                send_failure: Mutex::new(None),
            }),
        }
    }

    /// Answers every tagged request for which `responder` returns a reply.
    ///
    /// The reply is stamped with the request's `@extra` and queued for
    /// `receive`, as the native library would.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        *lock(&self.inner.responder) = Some(Box::new(responder));
    }

    /// Decides what `execute` returns. Without one, `execute` answers `ok`.
    pub fn set_execute_responder<F>(&self, responder: F)
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        *lock(&self.inner.execute_responder) = Some(Box::new(responder));
    }

    /// Makes every subsequent `send` fail with `message`.
    pub fn fail_sends(&self, message: impl Into<String>) {
        *lock(&self.inner.send_failure) = Some(message.into());
    }

    /// Queues a message for the next `receive`.
    pub fn push(&self, message: &Message) {
        let payload = message.to_string().into_bytes();
        self.push_raw(payload);
    }

    /// Queues raw bytes for the next `receive`.
    pub fn push_raw(&self, payload: impl Into<Vec<u8>>) {
        // The handle owns the receiver too, so the channel cannot disconnect.
        let _ = self.inner.inbound_tx.send(Inbound::Payload(payload.into()));
    }

    /// Queues a reply correlated with `request`.
    pub fn reply_to(&self, request: &Message, mut reply: Message) {
        if let Some(tag) = request.extra() {
            reply.set_extra(tag);
        }
        self.push(&reply);
    }

    /// Makes the `receive` that reaches this point fail with `error`.
    pub fn fail_receive(&self, error: TransportError) {
        let _ = self.inner.inbound_tx.send(Inbound::Failure(error));
    }

    /// Number of queued inbound items not yet received.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.inbound_rx.len()
    }

    /// Waits up to `timeout` for the next message the client sends.
    #[must_use]
    pub fn next_sent(&self, timeout: Duration) -> Option<Message> {
        self.inner.sent_rx.recv_timeout(timeout).ok()
    }

    /// Every message sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<Message> {
        lock(&self.inner.sent).clone()
    }

    /// Every message executed so far, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<Message> {
        lock(&self.inner.executed).clone()
    }

    fn decode_request(payload: &[u8]) -> Message {
        Message::decode(payload).unwrap_or_else(|_| Message::empty())
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        if let Some(message) = lock(&self.inner.send_failure).clone() {
            return Err(TransportError::Native { message });
        }

        let request = Self::decode_request(payload);
        lock(&self.inner.sent).push(request.clone());
        let reply = lock(&self.inner.responder)
            .as_ref()
            .and_then(|responder| responder(&request));
        if let Some(reply) = reply {
            self.reply_to(&request, reply);
        }
        let _ = self.inner.sent_tx.send(request);
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        match self.inner.inbound_rx.recv_timeout(timeout) {
            Ok(Inbound::Payload(payload)) => Ok(Some(payload)),
            Ok(Inbound::Failure(error)) => Err(error),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    fn execute(&self, payload: &[u8]) -> Result<Option<Vec<u8>>, TransportError> {
        let request = Self::decode_request(payload);
        lock(&self.inner.executed).push(request.clone());
        let reply = match lock(&self.inner.execute_responder).as_ref() {
            Some(responder) => responder(&request),
            None => Some(Message::new("ok")),
        };
        Ok(reply.map(|message| message.to_string().into_bytes()))
    }
}
