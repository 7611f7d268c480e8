//! Identifier to connection directory
//!
//! Holds at most one current connection per identifier. Superseding an older
//! connection is the coordinator's job; the directory only binds and answers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::connection::Connection;
use crate::events::Notice;
use crate::participant::Identifier;

#[derive(Default)]
pub struct Directory {
    connections: HashMap<Identifier, Arc<dyn Connection>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<&Arc<dyn Connection>> {
        self.connections.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.connections.contains_key(identifier)
    }

    /// Bind `identifier` to `connection`, returning the previous handle
    pub fn bind(
        &mut self,
        identifier: &str,
        connection: Arc<dyn Connection>,
    ) -> Option<Arc<dyn Connection>> {
        self.connections.insert(identifier.to_string(), connection)
    }

    /// Remove the mapping only if it still points at `connection_id`
    ///
    /// Returns false when a newer connection already replaced the caller.
    pub fn unregister(&mut self, identifier: &str, connection_id: &str) -> bool {
        match self.connections.get(identifier) {
            Some(current) if current.id() == connection_id => {
                self.connections.remove(identifier);
                true
            }
            _ => false,
        }
    }

    /// Whether `connection_id` is the current handle for `identifier`
    pub fn is_current(&self, identifier: &str, connection_id: &str) -> bool {
        self.connections
            .get(identifier)
            .is_some_and(|c| c.id() == connection_id)
    }

    /// Remove the mapping if its transport is no longer connected
    pub fn remove_if_dead(&mut self, identifier: &str) -> bool {
        if self.connections.get(identifier).is_some_and(|c| !c.is_connected()) {
            self.connections.remove(identifier);
            return true;
        }
        false
    }

    pub fn is_live(&self, identifier: &str) -> bool {
        self.connections
            .get(identifier)
            .is_some_and(|c| c.is_connected())
    }

    /// Deliver a notice; a dead or missing transport drops it silently
    pub fn notify(&self, identifier: &str, notice: Notice) -> bool {
        let Some(connection) = self.connections.get(identifier) else {
            trace!(identifier = %identifier, "No connection for notice");
            return false;
        };
        match connection.send(notice) {
            Ok(()) => true,
            Err(e) => {
                trace!(identifier = %identifier, error = %e, "Dropped notice");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
