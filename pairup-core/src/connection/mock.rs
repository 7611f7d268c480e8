//! Mock connection for testing
//!
//! MockConnection records every notice it is sent and lets a test flip
//! its liveness, enabling deterministic coordinator tests without sockets.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use super::traits::Connection;
use crate::error::MatchError;
use crate::events::Notice;

/// Mock implementation of Connection for testing
pub struct MockConnection {
    id: String,
    connected: AtomicBool,
    closed: AtomicBool,
    sent: Mutex<Vec<Notice>>,
}

impl MockConnection {
    /// Create a new connected MockConnection with a generated ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            connected: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Simulate the transport dropping without a close event
    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Whether `close()` was called on this connection
    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// All notices delivered so far
    pub fn notices(&self) -> Vec<Notice> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Drain and return the notices delivered so far
    pub fn take_notices(&self) -> Vec<Notice> {
        self.sent
            .lock()
            .map(|mut sent| std::mem::take(&mut *sent))
            .unwrap_or_default()
    }

    /// Number of delivered notices matching a predicate
    pub fn count_where(&self, predicate: impl Fn(&Notice) -> bool) -> usize {
        self.notices().iter().filter(|n| predicate(n)).count()
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MockConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send(&self, notice: Notice) -> Result<(), MatchError> {
        if !self.is_connected() {
            return Err(MatchError::TransportGone(self.id.clone()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notice);
        }
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }
}
