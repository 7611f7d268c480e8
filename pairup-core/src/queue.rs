//! FIFO wait queue with idempotent insert

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::participant::{Identifier, Participant};

/// One identifier waiting to be paired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub identifier: Identifier,
    pub display_name: String,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(participant: Participant) -> Self {
        Self {
            identifier: participant.identifier,
            display_name: participant.display_name,
            enqueued_at: Utc::now(),
        }
    }

    pub fn participant(&self) -> Participant {
        Participant::new(self.identifier.clone(), self.display_name.clone())
    }
}

/// Ordered list of waiting identifiers
///
/// At most one entry per identifier: `upsert` removes any existing entry
/// before pushing to the back.
#[derive(Debug, Default)]
pub struct WaitQueue {
    entries: VecDeque<QueueEntry>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove-then-push; returns the 1-based position
    pub fn upsert(&mut self, entry: QueueEntry) -> usize {
        self.remove(&entry.identifier);
        self.entries.push_back(entry);
        self.entries.len()
    }

    /// Remove the entry for `identifier`; false if it was not queued
    pub fn remove(&mut self, identifier: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.identifier != identifier);
        self.entries.len() != before
    }

    /// 1-based position of `identifier`
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.identifier == identifier)
            .map(|i| i + 1)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|e| e.identifier == identifier)
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<QueueEntry> {
        self.entries.remove(index)
    }

    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    pub fn identifiers(&self) -> Vec<Identifier> {
        self.entries.iter().map(|e| e.identifier.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
