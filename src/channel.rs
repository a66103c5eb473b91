//! Outgoing side of the per-view connection
//!
//! A view owns exactly one channel from mount until it is torn down. The
//! transport behind it (a socket, a test outbox) is not this crate's
//! concern; views only hand it intents and close it when they go away.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::Intent;

/// Trait for sending intents to the server
///
/// Implementations forward intents over whatever connection the embedding
/// application maintains.
pub trait Channel {
    /// Sends an intent to the server
    fn send_intent(&self, intent: &Intent);

    /// Closes the channel
    ///
    /// Called exactly once, when the owning view is torn down.
    fn close(self);
}

impl Channel for UnboundedSender<Intent> {
    fn send_intent(&self, intent: &Intent) {
        if self.send(intent.clone()).is_err() {
            warn!(?intent, "channel receiver dropped");
        }
    }

    fn close(self) {
        debug!("channel closed");
    }
}

/// A channel that records every intent, for inspection
///
/// Clones share the same record, so a test can keep one clone while a view
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    sent: Rc<RefCell<Vec<Intent>>>,
    closed: Rc<Cell<bool>>,
}

impl Outbox {
    /// Creates an empty outbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Every intent sent so far
    pub fn sent(&self) -> Vec<Intent> {
        self.sent.borrow().clone()
    }

    /// Removes and returns every intent sent so far
    pub fn drain(&self) -> Vec<Intent> {
        self.sent.borrow_mut().drain(..).collect()
    }

    /// Whether the owning view closed the channel
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl Channel for Outbox {
    fn send_intent(&self, intent: &Intent) {
        if self.is_closed() {
            warn!(?intent, "intent sent on closed outbox");
            return;
        }
        self.sent.borrow_mut().push(intent.clone());
    }

    fn close(self) {
        self.closed.set(true);
    }
}
