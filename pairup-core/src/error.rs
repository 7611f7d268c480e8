//! Error types for pairup-core

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::participant::{Identifier, SessionId};

/// Errors surfaced by coordinator operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Banned from matching{}", format_ban(.until, .reason))]
    Banned {
        until: Option<DateTime<Utc>>,
        reason: Option<String>,
    },

    #[error("No matches remaining")]
    QuotaExhausted,

    #[error("Session no longer exists: {0}")]
    StaleSession(SessionId),

    #[error("Connection gone for {0}")]
    TransportGone(Identifier),

    #[error("Identifier not registered: {0}")]
    NotRegistered(Identifier),
}

impl MatchError {
    /// Wire code for errors the client maps to UI
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Banned { .. } => "banned",
            MatchError::QuotaExhausted => "quota_exhausted",
            MatchError::StaleSession(_) => "stale_session",
            MatchError::TransportGone(_) => "transport_gone",
            MatchError::NotRegistered(_) => "not_registered",
        }
    }
}

fn format_ban(until: &Option<DateTime<Utc>>, reason: &Option<String>) -> String {
    let mut out = String::new();
    if let Some(until) = until {
        out.push_str(&format!(" until {}", until.to_rfc3339()));
    }
    if let Some(reason) = reason {
        out.push_str(&format!(": {}", reason));
    }
    out
}

/// Errors from external collaborators (moderation, quota, profiles)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
