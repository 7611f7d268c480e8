//! SessionTable for tracking active sessions
//!
//! Indexes sessions by ID and by member identifier so an identifier can
//! belong to at most one session at a time.

use std::collections::HashMap;

use crate::participant::{Identifier, SessionId};

use super::state::Session;

#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<SessionId, Session>,
    by_member: HashMap<Identifier, SessionId>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session and index both members
    pub fn insert(&mut self, session: Session) {
        let id = session.id().to_string();
        for participant in session.participants() {
            self.by_member
                .insert(participant.identifier.clone(), id.clone());
        }
        self.sessions.insert(id, session);
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Session the identifier currently belongs to
    pub fn session_of(&self, identifier: &str) -> Option<&Session> {
        self.by_member
            .get(identifier)
            .and_then(|id| self.sessions.get(id))
    }

    pub fn session_id_of(&self, identifier: &str) -> Option<SessionId> {
        self.by_member.get(identifier).cloned()
    }

    /// Remove a session and drop its member index entries
    pub fn remove(&mut self, id: &str) -> Option<Session> {
        let mut session = self.sessions.remove(id)?;
        for participant in session.participants() {
            if self.by_member.get(&participant.identifier).map(String::as_str) == Some(id) {
                self.by_member.remove(&participant.identifier);
            }
        }
        session.end();
        Some(session)
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
