//! Grace timer bookkeeping
//!
//! The timer task itself is spawned by the presence controller; this module
//! only tracks which identifiers have one pending and which ticket is live.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::participant::{Identifier, SessionId};

/// A pending grace period for one dropped participant
#[derive(Debug)]
pub struct GraceTimer {
    pub identifier: Identifier,
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    ticket: Uuid,
    cancel: CancellationToken,
}

impl GraceTimer {
    pub fn ticket(&self) -> Uuid {
        self.ticket
    }
}

/// At most one pending timer per identifier
#[derive(Debug, Default)]
pub struct GraceTimers {
    timers: HashMap<Identifier, GraceTimer>,
}

impl GraceTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.timers.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&GraceTimer> {
        self.timers.get(identifier)
    }

    /// Record a new timer; returns its ticket
    ///
    /// Any previous timer for the identifier is cancelled first.
    pub fn start(
        &mut self,
        identifier: &str,
        session_id: &str,
        cancel: CancellationToken,
    ) -> Uuid {
        self.cancel(identifier);
        let ticket = Uuid::new_v4();
        self.timers.insert(
            identifier.to_string(),
            GraceTimer {
                identifier: identifier.to_string(),
                session_id: session_id.to_string(),
                started_at: Utc::now(),
                ticket,
                cancel,
            },
        );
        ticket
    }

    /// Cancel and forget the pending timer, if any
    pub fn cancel(&mut self, identifier: &str) -> Option<GraceTimer> {
        let timer = self.timers.remove(identifier)?;
        timer.cancel.cancel();
        Some(timer)
    }

    /// Cancel the identifier's timer only if it belongs to `session_id`
    pub fn cancel_for_session(&mut self, identifier: &str, session_id: &str) -> bool {
        if self
            .timers
            .get(identifier)
            .is_some_and(|t| t.session_id == session_id)
        {
            self.cancel(identifier);
            return true;
        }
        false
    }

    /// Claim a fired timer; None if it was cancelled or replaced
    pub fn take_if(&mut self, identifier: &str, ticket: Uuid) -> Option<GraceTimer> {
        if self.timers.get(identifier)?.ticket != ticket {
            return None;
        }
        self.timers.remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
