//! Connection state tracking for remote adapters.

use std::sync::atomic::{AtomicU8, Ordering};

use unifs_types::{ConnectionState, FsError, FsResult};

/// Lock-free cell holding a [`ConnectionState`].
#[derive(Debug)]
pub(crate) struct SessionState {
    state: AtomicU8,
}

impl SessionState {
    pub(crate) fn new(initial: ConnectionState) -> Self {
        Self {
            state: AtomicU8::new(encode(initial)),
        }
    }

    pub(crate) fn get(&self) -> ConnectionState {
        decode(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, next: ConnectionState) {
        let previous = decode(self.state.swap(encode(next), Ordering::AcqRel));
        if previous != next {
            tracing::debug!("session state {} -> {}", previous, next);
        }
    }

    /// Fail with `NotConnected` unless the session is `Ready`.
    pub(crate) fn ensure_ready(&self) -> FsResult<()> {
        match self.get() {
            ConnectionState::Ready => Ok(()),
            state => Err(FsError::NotConnected { state }),
        }
    }

    /// Move `Ready` to `Closed`.
    ///
    /// Returns `false` when the session was not ready (already closed or
    /// never connected), in which case there is nothing to release.
    pub(crate) fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(
                encode(ConnectionState::Ready),
                encode(ConnectionState::Closed),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

fn encode(state: ConnectionState) -> u8 {
    match state {
        ConnectionState::Unconnected => 0,
        ConnectionState::Connecting => 1,
        ConnectionState::Ready => 2,
        ConnectionState::Failed => 3,
        ConnectionState::Closed => 4,
    }
}

fn decode(raw: u8) -> ConnectionState {
    match raw {
        1 => ConnectionState::Connecting,
        2 => ConnectionState::Ready,
        3 => ConnectionState::Failed,
        4 => ConnectionState::Closed,
        _ => ConnectionState::Unconnected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_accepts_operations() {
        let state = SessionState::new(ConnectionState::Ready);
        assert!(state.ensure_ready().is_ok());
    }

    #[test]
    fn test_not_ready_rejects_operations() {
        for initial in [
            ConnectionState::Unconnected,
            ConnectionState::Connecting,
            ConnectionState::Failed,
            ConnectionState::Closed,
        ] {
            let state = SessionState::new(initial);
            match state.ensure_ready() {
                Err(FsError::NotConnected { state }) => assert_eq!(state, initial),
                other => panic!("expected NotConnected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_close_happens_once() {
        let state = SessionState::new(ConnectionState::Ready);
        assert!(state.begin_close());
        assert!(!state.begin_close());
        assert_eq!(state.get(), ConnectionState::Closed);
    }

    #[test]
    fn test_failed_session_has_nothing_to_close() {
        let state = SessionState::new(ConnectionState::Connecting);
        state.set(ConnectionState::Failed);
        assert!(!state.begin_close());
        assert_eq!(state.get(), ConnectionState::Failed);
    }
}
