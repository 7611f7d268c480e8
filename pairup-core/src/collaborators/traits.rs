//! External collaborator interfaces
//!
//! The coordinator never implements moderation, quota or profile logic
//! itself; it calls out to these services and treats them as opaque.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::participant::{Identifier, Participant};

/// Ban state reported by the moderation service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BanStatus {
    pub banned: bool,
    pub until: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

impl BanStatus {
    pub fn banned(until: Option<DateTime<Utc>>, reason: Option<String>) -> Self {
        Self {
            banned: true,
            until,
            reason,
        }
    }

    /// A ban whose end time has passed no longer applies
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.banned && self.until.is_none_or(|until| until > now)
    }
}

/// Remaining matches for an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remaining {
    Limited(u32),
    Unlimited,
}

impl Remaining {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Remaining::Limited(0))
    }
}

/// Ban and block lookups
#[async_trait]
pub trait ModerationService: Send + Sync {
    /// Current ban state for an identifier
    async fn ban_status(&self, identifier: &str) -> Result<BanStatus, CollaboratorError>;

    /// Identifiers this identifier must never be paired with, in either direction
    async fn blocked_ids(&self, identifier: &str) -> Result<HashSet<Identifier>, CollaboratorError>;
}

/// Per-identifier match quota
#[async_trait]
pub trait QuotaGate: Send + Sync {
    async fn remaining(&self, identifier: &str) -> Result<Remaining, CollaboratorError>;

    /// Charge one match
    async fn decrement(&self, identifier: &str) -> Result<(), CollaboratorError>;

    /// Return one match (the party did not choose to end the session)
    async fn refund(&self, identifier: &str) -> Result<(), CollaboratorError>;
}

/// Public profile lookup
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn lookup(&self, identifier: &str) -> Result<Participant, CollaboratorError>;
}
