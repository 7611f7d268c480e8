//! Session struct and state machine
//!
//! A session is strictly two-party. Losing either party ends it for the
//! other; the presence set only tracks who is currently attached so that a
//! second exit does not produce a second notification.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::{Identifier, Participant, SessionId};

/// State of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created by the match engine, participants not yet notified
    Forming,
    /// Both participants notified
    Active,
    /// Over; removed from the table
    Ended,
}

/// One active pairing of two participants
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    participants: [Participant; 2],
    present: HashSet<Identifier>,
    created_at: DateTime<Utc>,
    state: SessionState,
}

impl Session {
    /// Create a new session in `Forming` with both participants present
    pub fn new(first: Participant, second: Participant) -> Self {
        let present = HashSet::from([first.identifier.clone(), second.identifier.clone()]);
        Self {
            id: Uuid::new_v4().to_string(),
            participants: [first, second],
            present,
            created_at: Utc::now(),
            state: SessionState::Forming,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn participants(&self) -> &[Participant; 2] {
        &self.participants
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn activate(&mut self) {
        if self.state == SessionState::Forming {
            self.state = SessionState::Active;
        }
    }

    pub fn end(&mut self) {
        self.state = SessionState::Ended;
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.participants.iter().any(|p| p.identifier == identifier)
    }

    /// The other participant, if `identifier` is a member
    pub fn partner_of(&self, identifier: &str) -> Option<&Participant> {
        if !self.contains(identifier) {
            return None;
        }
        self.participants.iter().find(|p| p.identifier != identifier)
    }

    pub fn participant(&self, identifier: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.identifier == identifier)
    }

    pub fn is_present(&self, identifier: &str) -> bool {
        self.present.contains(identifier)
    }

    /// Returns true if `identifier` was present
    pub fn mark_absent(&mut self, identifier: &str) -> bool {
        self.present.remove(identifier)
    }

    pub fn mark_present(&mut self, identifier: &str) {
        if self.contains(identifier) {
            self.present.insert(identifier.to_string());
        }
    }

    pub fn present_count(&self) -> usize {
        self.present.len()
    }
}
