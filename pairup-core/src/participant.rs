//! Identity types shared by every component

use serde::{Deserialize, Serialize};

/// Opaque unique key for a user, independent of display name
pub type Identifier = String;

/// Unique identifier for a paired session
pub type SessionId = String;

/// Public information about one side of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub identifier: Identifier,
    pub display_name: String,
}

impl Participant {
    pub fn new(identifier: impl Into<Identifier>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
        }
    }
}
