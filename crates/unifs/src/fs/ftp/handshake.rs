//! One-shot arbiter for connection handshakes.
//!
//! Connecting races several signals: the handshake task reports ready or
//! error, and an optional timer reports a timeout. The first signal settles
//! the handshake; every later one is ignored.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use unifs_types::FsResult;

pub(crate) struct Handshake<T> {
    slot: Mutex<Option<oneshot::Sender<FsResult<T>>>>,
}

impl<T> Handshake<T> {
    /// Create an arbiter and the receiver that observes its outcome.
    pub(crate) fn new() -> (Arc<Self>, oneshot::Receiver<FsResult<T>>) {
        let (tx, rx) = oneshot::channel();
        let handshake = Arc::new(Self {
            slot: Mutex::new(Some(tx)),
        });
        (handshake, rx)
    }

    /// Offer an outcome. Returns `true` if it was the one that settled.
    pub(crate) fn settle(&self, outcome: FsResult<T>) -> bool {
        let sender = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        match self.slot.lock() {
            Ok(slot) => slot.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}
