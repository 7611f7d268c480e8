//! WebSocket protocol message types
//!
//! Clients send `type`-tagged JSON objects. Everything the coordinator
//! delivers is a [`Notice`]; protocol failures are answered with an
//! `error` object.

use pairup_core::{EndReason, Notice};
use serde::{Deserialize, Serialize};

fn default_skip_reason() -> EndReason {
    EndReason::Skip
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind this socket to an identifier
    Register { identifier: String },

    /// Enter the wait queue
    JoinQueue,

    /// Leave the wait queue
    LeaveQueue,

    /// End the session and look for someone new (or leave entirely with `exit`)
    SkipPartner {
        session_id: String,
        #[serde(default = "default_skip_reason")]
        reason: EndReason,
    },

    /// End the session without re-queueing
    LeaveSession { session_id: String },

    /// Chat message for the partner
    SendMessage {
        session_id: String,
        message: String,
        #[serde(default)]
        reply_to: Option<String>,
    },

    /// Emoji reaction to a message
    AddReaction {
        session_id: String,
        message_id: String,
        emoji: String,
    },

    /// The page is going away; the next close should not wait for a reconnect
    PageUnload,

    /// Ask whether a session is still alive
    CheckActiveSession { session_id: String },

    /// Keepalive
    Heartbeat,
}

/// Protocol-level error reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub message: String,
    pub code: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            msg_type: "error".to_string(),
            message: message.into(),
            code: code.into(),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ServerMessage {
    Notice(Notice),
    Error(ErrorMessage),
}

impl From<Notice> for ServerMessage {
    fn from(notice: Notice) -> Self {
        ServerMessage::Notice(notice)
    }
}
