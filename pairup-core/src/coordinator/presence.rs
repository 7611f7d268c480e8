//! Presence and grace controller
//!
//! Ends sessions on skip, leave and disconnect. An unexpected disconnect
//! gets a grace period during which a re-registration restores the session;
//! only when the timer fires does the partner hear that the session is over.

use std::sync::Arc;

use tracing::{debug, info, trace};
use uuid::Uuid;

use super::{Coordinator, CoordinatorState};
use crate::error::MatchError;
use crate::events::{EndReason, Notice, PartnerStatus};
use crate::participant::{Identifier, SessionId};

/// Follow-up for a session that just ended, run with the lock released
#[derive(Debug)]
pub(crate) struct Ended {
    pub session_id: SessionId,
    /// Remaining party; refunded one match
    pub partner: Identifier,
    /// Identifiers to put back into the queue, in order
    pub requeue: Vec<Identifier>,
}

impl CoordinatorState {
    /// End `session_id` because `by` left it
    ///
    /// Notifies the partner once and removes the session. Returns None when
    /// the session is gone or `by` is not a member.
    pub(crate) fn end_session(
        &mut self,
        session_id: &str,
        by: &str,
        reason: EndReason,
    ) -> Option<Ended> {
        let partner = self
            .sessions
            .get(session_id)?
            .partner_of(by)?
            .identifier
            .clone();
        self.sessions.remove(session_id)?;
        self.grace.cancel_for_session(by, session_id);
        self.grace.cancel_for_session(&partner, session_id);

        let should_requeue = reason.requeues_partner();
        self.directory.notify(
            &partner,
            Notice::PartnerEnded {
                session_id: session_id.to_string(),
                reason,
                should_requeue,
                by_identifier: by.to_string(),
            },
        );
        info!(
            session_id = %session_id,
            by = %by,
            partner = %partner,
            reason = reason.as_str(),
            "Session ended"
        );

        let requeue = if should_requeue {
            vec![partner.clone()]
        } else {
            Vec::new()
        };
        Some(Ended {
            session_id: session_id.to_string(),
            partner,
            requeue,
        })
    }

    /// Remove every trace of `identifier` from queue and session
    pub(crate) fn purge(&mut self, identifier: &str) -> Option<Ended> {
        self.queue.remove(identifier);
        self.blocks.evict(identifier);
        self.grace.cancel(identifier);
        self.unloading.remove(identifier);
        let session_id = self.sessions.session_id_of(identifier)?;
        self.end_session(&session_id, identifier, EndReason::Leave)
    }

    /// Re-attach `identifier` to its session after a reconnect
    ///
    /// Cancels any pending grace timer, re-sends the pairing and tells the
    /// partner the identifier is back online.
    pub(crate) fn restore(&mut self, identifier: &str) -> bool {
        let had_timer = self.grace.cancel(identifier).is_some();
        let Some(session_id) = self.sessions.session_id_of(identifier) else {
            return false;
        };
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return false;
        };

        session.mark_present(identifier);
        let participants = session.participants().to_vec();
        let partner = session.partner_of(identifier).map(|p| p.identifier.clone());

        self.directory.notify(
            identifier,
            Notice::SessionPaired {
                session_id: session_id.clone(),
                participants,
                restored: true,
            },
        );
        if let Some(partner) = partner {
            self.directory.notify(
                &partner,
                Notice::PartnerStatus {
                    session_id: session_id.clone(),
                    status: PartnerStatus::Online,
                },
            );
        }
        info!(identifier = %identifier, session_id = %session_id, had_timer, "Session restored");
        true
    }
}

impl Coordinator {
    /// End the session for the partner and requeue as the reason dictates
    ///
    /// The partner is requeued unless the reason is `exit`; the caller is
    /// requeued after the partner, also unless the reason is `exit`.
    pub async fn skip(
        &self,
        identifier: &str,
        session_id: &str,
        reason: EndReason,
    ) -> Result<(), MatchError> {
        let ended = self
            .state
            .lock()
            .await
            .end_session(session_id, identifier, reason);
        let Some(mut ended) = ended else {
            debug!(identifier = %identifier, session_id = %session_id, "Skip for vanished session");
            return Err(MatchError::StaleSession(session_id.to_string()));
        };

        if reason != EndReason::Exit {
            ended.requeue.push(identifier.to_string());
        }
        self.finish_ended(Some(ended)).await;
        Ok(())
    }

    /// Leave the session; the partner is requeued, the caller is not
    pub async fn leave_session(&self, identifier: &str, session_id: &str) -> Result<(), MatchError> {
        let ended = self
            .state
            .lock()
            .await
            .end_session(session_id, identifier, EndReason::Leave);
        let Some(ended) = ended else {
            debug!(identifier = %identifier, session_id = %session_id, "Leave for vanished session");
            return Err(MatchError::StaleSession(session_id.to_string()));
        };
        self.finish_ended(Some(ended)).await;
        Ok(())
    }

    /// Mark that the client is unloading; its next disconnect skips the grace period
    pub async fn page_unload(&self, identifier: &str) {
        let mut state = self.state.lock().await;
        if state.directory.contains(identifier) {
            state.unloading.insert(identifier.to_string());
            debug!(identifier = %identifier, "Page unload announced");
        }
    }

    /// Answer a client asking whether its session still exists
    ///
    /// Returns true and re-sends the pairing if so; otherwise replies with
    /// a stale `partner_ended`.
    pub async fn check_active_session(&self, identifier: &str, session_id: &str) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        match state.sessions.get_mut(session_id) {
            Some(session) if session.contains(identifier) => {
                session.mark_present(identifier);
                state.directory.notify(
                    identifier,
                    Notice::SessionPaired {
                        session_id: session_id.to_string(),
                        participants: session.participants().to_vec(),
                        restored: true,
                    },
                );
                true
            }
            _ => {
                debug!(identifier = %identifier, session_id = %session_id, "Session check found stale session");
                state.directory.notify(
                    identifier,
                    Notice::PartnerEnded {
                        session_id: session_id.to_string(),
                        reason: EndReason::Stale,
                        should_requeue: false,
                        by_identifier: identifier.to_string(),
                    },
                );
                false
            }
        }
    }

    /// Handle the transport of `connection_id` closing
    ///
    /// Ignored if a newer connection already replaced it. A queued entry is
    /// always removed. Mid-session, the partner is told the identifier is
    /// reconnecting and a grace timer starts, unless the client announced a
    /// page unload, in which case the session ends at once.
    pub async fn disconnect(self: &Arc<Self>, identifier: &str, connection_id: &str) {
        let ended = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;

            if !state.directory.unregister(identifier, connection_id) {
                debug!(
                    identifier = %identifier,
                    connection = %connection_id,
                    "Ignoring close of superseded connection"
                );
                return;
            }
            state.queue.remove(identifier);
            state.blocks.evict(identifier);
            let unloading = state.unloading.remove(identifier);

            let Some(session_id) = state.sessions.session_id_of(identifier) else {
                debug!(identifier = %identifier, "Disconnected outside a session");
                return;
            };

            if unloading {
                info!(identifier = %identifier, session_id = %session_id, "Page unloaded, ending session");
                state.end_session(&session_id, identifier, EndReason::Disconnect)
            } else {
                if !state.grace.contains(identifier) {
                    self.start_grace(state, identifier, &session_id);
                }
                None
            }
        };

        self.finish_ended(ended).await;
    }

    fn start_grace(self: &Arc<Self>, state: &mut CoordinatorState, identifier: &str, session_id: &str) {
        let partner = state.sessions.get_mut(session_id).and_then(|session| {
            session.mark_absent(identifier);
            session.partner_of(identifier).map(|p| p.identifier.clone())
        });
        if let Some(partner) = partner {
            state.directory.notify(
                &partner,
                Notice::PartnerStatus {
                    session_id: session_id.to_string(),
                    status: PartnerStatus::Reconnecting,
                },
            );
        }

        let cancel = self.shutdown.child_token();
        let ticket = state.grace.start(identifier, session_id, cancel.clone());
        let grace = self.config.grace_period();
        info!(
            identifier = %identifier,
            session_id = %session_id,
            grace_secs = grace.as_secs(),
            "Grace period started"
        );

        let coordinator = Arc::clone(self);
        let identifier = identifier.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    trace!(identifier = %identifier, "Grace timer cancelled");
                }
                _ = tokio::time::sleep(grace) => {
                    coordinator.expire_grace(&identifier, ticket).await;
                }
            }
        });
    }

    /// End the session of an identifier whose grace period ran out
    async fn expire_grace(&self, identifier: &str, ticket: Uuid) {
        let ended = {
            let mut state = self.state.lock().await;
            let Some(timer) = state.grace.take_if(identifier, ticket) else {
                trace!(identifier = %identifier, "Stale grace timer ignored");
                return;
            };
            info!(
                identifier = %identifier,
                session_id = %timer.session_id,
                started_at = %timer.started_at,
                "Grace period expired"
            );
            state.end_session(&timer.session_id, identifier, EndReason::Disconnect)
        };

        self.finish_ended(ended).await;
    }
}
