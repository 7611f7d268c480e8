//! Match engine
//!
//! Pairs the first two live, mutually unblocked entries of the wait queue
//! until no such pair remains. Passes are single-flight: a trigger that
//! arrives during a pass sets `rerun` and the running pass loops again.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace, warn};

use super::{Coordinator, CoordinatorState};
use crate::events::Notice;
use crate::participant::{Identifier, SessionId};
use crate::session::Session;

/// A session formed by one match pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub session_id: SessionId,
    pub members: [Identifier; 2],
}

impl CoordinatorState {
    /// Run the pairing loop to a fixed point
    ///
    /// Dead entries are dropped head first. A second entry blocked by (or
    /// blocking) the head is dropped without re-insertion and scanning
    /// continues with the next one.
    pub(crate) fn form_sessions(&mut self) -> Vec<Pairing> {
        let mut formed = Vec::new();

        while self.queue.len() >= 2 {
            let Some(head) = self.queue.get(0).map(|e| e.identifier.clone()) else {
                break;
            };
            if !self.directory.is_live(&head) {
                self.queue.pop_front();
                self.forget(&head);
                debug!(identifier = %head, "Dropped dead queue head");
                continue;
            }

            let Some(second) = self.queue.get(1).map(|e| e.identifier.clone()) else {
                break;
            };
            if !self.directory.is_live(&second) {
                self.queue.remove_at(1);
                self.forget(&second);
                debug!(identifier = %second, "Dropped dead queue entry");
                continue;
            }

            if self.blocks.blocks_either(&head, &second) {
                self.queue.remove_at(1);
                debug!(head = %head, dropped = %second, "Dropped blocked queue entry");
                continue;
            }

            let (Some(first), Some(other)) = (self.queue.pop_front(), self.queue.pop_front())
            else {
                break;
            };

            let mut session = Session::new(first.participant(), other.participant());
            let notice = Notice::SessionPaired {
                session_id: session.id().to_string(),
                participants: session.participants().to_vec(),
                restored: false,
            };
            self.directory.notify(&first.identifier, notice.clone());
            self.directory.notify(&other.identifier, notice);
            session.activate();

            info!(
                session_id = %session.id(),
                first = %first.identifier,
                second = %other.identifier,
                "Session formed"
            );
            formed.push(Pairing {
                session_id: session.id().to_string(),
                members: [first.identifier, other.identifier],
            });
            self.sessions.insert(session);
        }

        formed
    }
}

/// Clears the in-flight flag even if the pass is dropped mid-way
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Coordinator {
    /// Trigger a match pass
    ///
    /// Returns immediately if another pass is in flight; that pass picks the
    /// request up before it finishes. Quota is charged after the in-flight
    /// flag is released, so a slow quota service never holds up other pairs.
    pub async fn run_matching(&self) {
        self.rerun.store(true, Ordering::Release);
        let mut formed = Vec::new();

        loop {
            if self
                .matching
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                trace!("Match pass in flight, rerun recorded");
                break;
            }

            {
                let _guard = PassGuard(&self.matching);
                while self.rerun.swap(false, Ordering::AcqRel) {
                    formed.extend(self.state.lock().await.form_sessions());
                }
            }

            // A trigger may have landed between the last swap and the release
            if !self.rerun.load(Ordering::Acquire) {
                break;
            }
        }

        self.charge(&formed).await;
    }

    /// Decrement quota for both members of each new session
    async fn charge(&self, formed: &[Pairing]) {
        for pairing in formed {
            for identifier in &pairing.members {
                if let Err(e) = self.quota.decrement(identifier).await {
                    warn!(
                        identifier = %identifier,
                        session_id = %pairing.session_id,
                        error = %e,
                        "Quota decrement failed"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::config::CoordinatorConfig;
    use crate::connection::MockConnection;
    use crate::participant::Participant;
    use crate::queue::QueueEntry;

    fn state_with(ids: &[&str]) -> (CoordinatorState, Vec<Arc<MockConnection>>) {
        let mut state = CoordinatorState::new();
        let mut conns = Vec::new();
        for id in ids {
            let conn = Arc::new(MockConnection::new());
            state.directory.bind(id, conn.clone());
            state.queue.upsert(QueueEntry::new(Participant::new(*id, *id)));
            conns.push(conn);
        }
        (state, conns)
    }

    #[test]
    fn pairs_in_fifo_order() {
        let (mut state, _conns) = state_with(&["a", "b", "c"]);

        let formed = state.form_sessions();

        assert_eq!(formed.len(), 1);
        assert_eq!(formed[0].members, ["a".to_string(), "b".to_string()]);
        assert_eq!(state.queue.identifiers(), vec!["c"]);
    }

    #[test]
    fn dead_head_is_dropped_first() {
        let (mut state, conns) = state_with(&["a", "b", "c"]);
        conns[0].drop_link();

        let formed = state.form_sessions();

        assert_eq!(formed[0].members, ["b".to_string(), "c".to_string()]);
        assert!(!state.directory.contains("a"));
        assert!(state.queue.is_empty());
    }

    #[test]
    fn dead_second_is_skipped() {
        let (mut state, conns) = state_with(&["a", "b", "c"]);
        conns[1].drop_link();

        let formed = state.form_sessions();

        assert_eq!(formed[0].members, ["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn blocked_second_is_dropped_not_reinserted() {
        let (mut state, _conns) = state_with(&["a", "b", "c"]);
        state.blocks.refresh("b", HashSet::from(["a".to_string()]));

        let formed = state.form_sessions();

        assert_eq!(formed[0].members, ["a".to_string(), "c".to_string()]);
        assert!(state.queue.is_empty());
        assert!(state.sessions.session_of("b").is_none());
    }

    #[test]
    fn both_members_notified_with_same_session() {
        let (mut state, conns) = state_with(&["a", "b"]);

        let formed = state.form_sessions();
        let session_id = formed[0].session_id.clone();

        for conn in &conns {
            assert!(conn.notices().iter().any(|n| matches!(
                n,
                Notice::SessionPaired { session_id: s, restored: false, .. } if *s == session_id
            )));
        }
    }

    #[test]
    fn single_entry_forms_nothing() {
        let (mut state, _conns) = state_with(&["a"]);
        assert!(state.form_sessions().is_empty());
        assert_eq!(state.queue.len(), 1);
    }

    #[tokio::test]
    async fn trigger_during_pass_is_served_by_running_pass() {
        let coordinator = Arc::new(Coordinator::in_memory(CoordinatorConfig::default()));
        let mut conns = Vec::new();
        for id in ["a", "b", "c", "d"] {
            let conn = Arc::new(MockConnection::new());
            coordinator.register(id, conn.clone()).await;
            conns.push(conn);
        }

        // Holding the state lock keeps the first pass in flight
        let mut guard = coordinator.state.lock().await;
        for id in ["a", "b"] {
            guard.queue.upsert(QueueEntry::new(Participant::new(id, id)));
        }
        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.run_matching().await })
        };
        while !coordinator.matching.load(Ordering::Acquire) {
            tokio::task::yield_now().await;
        }

        for id in ["c", "d"] {
            guard.queue.upsert(QueueEntry::new(Participant::new(id, id)));
        }
        coordinator.run_matching().await;
        assert!(coordinator.rerun.load(Ordering::Acquire));
        assert!(guard.sessions.is_empty());

        drop(guard);
        first.await.unwrap();

        assert!(!coordinator.matching.load(Ordering::Acquire));
        assert!(!coordinator.rerun.load(Ordering::Acquire));
        {
            let state = coordinator.state.lock().await;
            assert_eq!(state.sessions.len(), 2);
            assert!(state.queue.is_empty());
            assert_eq!(state.sessions.session_id_of("c"), state.sessions.session_id_of("d"));
        }
        for conn in &conns {
            assert_eq!(
                conn.count_where(|n| matches!(n, Notice::SessionPaired { .. })),
                1
            );
        }
    }

    #[tokio::test]
    async fn flag_is_released_after_pass() {
        let coordinator = Coordinator::in_memory(CoordinatorConfig::default());

        coordinator.run_matching().await;
        coordinator.run_matching().await;

        assert!(!coordinator.matching.load(Ordering::Acquire));
        assert!(!coordinator.rerun.load(Ordering::Acquire));
    }
}
