//! Connection trait definition

use crate::error::MatchError;
use crate::events::Notice;

/// One live transport-level handle for one identifier
///
/// Implementations must be cheap to call from inside the coordinator's
/// critical section: `send` queues the notice and returns immediately.
pub trait Connection: Send + Sync {
    /// Unique ID of this handle (distinct across reconnects)
    fn id(&self) -> &str;

    /// Whether the underlying transport still reports connected
    fn is_connected(&self) -> bool;

    /// Queue a notice for delivery
    ///
    /// Returns `MatchError::TransportGone` if the transport is closed.
    fn send(&self, notice: Notice) -> Result<(), MatchError>;

    /// Force-close the transport (used when a newer connection supersedes this one)
    fn close(&self);
}
