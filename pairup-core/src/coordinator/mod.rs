//! Matchmaking and session coordinator
//!
//! All mutable state (directory, wait queue, block cache, session table and
//! grace timers) lives in one [`CoordinatorState`] behind a single async
//! mutex. Collaborator calls are made with the lock released, so every
//! operation re-validates what it read before acting on it.

mod grace;
mod janitor;
mod matching;
mod presence;

pub use grace::{GraceTimer, GraceTimers};
pub use matching::Pairing;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::blocks::BlockFilter;
use crate::collaborators::{
    BanStatus, MemoryModeration, MemoryProfiles, MemoryQuota, ModerationService,
    ProfileDirectory, QuotaGate, Remaining,
};
use crate::config::CoordinatorConfig;
use crate::connection::Connection;
use crate::directory::Directory;
use crate::error::MatchError;
use crate::events::{ChatMessage, EndReason, Notice};
use crate::participant::{Identifier, Participant};
use crate::queue::{QueueEntry, WaitQueue};
use crate::session::{Session, SessionTable};

use presence::Ended;

/// Everything the coordinator mutates, guarded by one lock
#[derive(Default)]
pub struct CoordinatorState {
    pub(crate) directory: Directory,
    pub(crate) queue: WaitQueue,
    pub(crate) blocks: BlockFilter,
    pub(crate) sessions: SessionTable,
    pub(crate) grace: GraceTimers,
    /// Identifiers whose client announced a page unload
    pub(crate) unloading: HashSet<Identifier>,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop directory, block and unload bookkeeping for an identifier whose transport died
    pub(crate) fn forget(&mut self, identifier: &str) {
        self.directory.remove_if_dead(identifier);
        self.blocks.evict(identifier);
        self.unloading.remove(identifier);
    }

    /// Refresh the block set and append to the queue
    ///
    /// The caller must already have cleared any session membership.
    fn enqueue(&mut self, admission: Admission) -> Result<usize, MatchError> {
        let identifier = admission.participant.identifier.clone();
        if !self.directory.is_live(&identifier) {
            return Err(MatchError::TransportGone(identifier));
        }

        self.blocks.refresh(&identifier, admission.blocked);
        let position = self.queue.upsert(QueueEntry::new(admission.participant));
        self.directory
            .notify(&identifier, Notice::QueueJoined { position });
        debug!(identifier = %identifier, position, "Queued");
        Ok(position)
    }
}

/// Outcome of the collaborator checks for a join
struct Admission {
    participant: Participant,
    blocked: HashSet<Identifier>,
}

/// Owns the matchmaking state and the collaborators it consults
///
/// Operations that may start timers or background tasks take `self: &Arc<Self>`.
pub struct Coordinator {
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
    moderation: Arc<dyn ModerationService>,
    quota: Arc<dyn QuotaGate>,
    profiles: Arc<dyn ProfileDirectory>,
    /// A match pass is running
    matching: AtomicBool,
    /// A match pass was requested since the running one started
    rerun: AtomicBool,
    shutdown: CancellationToken,
}

impl Coordinator {
    /// Create a coordinator over the given collaborators
    pub fn new(
        config: CoordinatorConfig,
        moderation: Arc<dyn ModerationService>,
        quota: Arc<dyn QuotaGate>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            config,
            state: Mutex::new(CoordinatorState::new()),
            moderation,
            quota,
            profiles,
            matching: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a coordinator backed by in-memory collaborators
    pub fn in_memory(config: CoordinatorConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryModeration::new()),
            Arc::new(MemoryQuota::unlimited()),
            Arc::new(MemoryProfiles::new()),
        )
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Bind `connection` as the current handle for `identifier`
    ///
    /// A different connection that is still live is superseded: the
    /// identifier is purged from queue and session with leave semantics and
    /// the old connection is closed. If the identifier still belongs to a
    /// session (typically during a grace period) the session is restored.
    pub async fn register(&self, identifier: &str, connection: Arc<dyn Connection>) {
        let ended = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;

            let mut ended = None;
            if let Some(previous) = state.directory.get(identifier).cloned() {
                if previous.id() != connection.id() && previous.is_connected() {
                    info!(
                        identifier = %identifier,
                        old_connection = %previous.id(),
                        new_connection = %connection.id(),
                        "Superseding live connection"
                    );
                    ended = state.purge(identifier);
                    previous.close();
                }
            }

            state.directory.bind(identifier, connection);
            state.unloading.remove(identifier);
            state.directory.notify(
                identifier,
                Notice::RegistrationConfirmed {
                    identifier: identifier.to_string(),
                },
            );
            state.restore(identifier);
            ended
        };

        self.finish_ended(ended).await;
    }

    /// Join the wait queue; returns the 1-based position right after insertion
    ///
    /// Joining from inside a session leaves that session first. Returns
    /// `None` when the identifier was paired while its checks were running.
    /// A refused join is also reported to the caller as `match_error`.
    pub async fn join(&self, identifier: &str) -> Result<Option<usize>, MatchError> {
        let previous_session = {
            let state = self.state.lock().await;
            if !state.directory.contains(identifier) {
                return Err(MatchError::NotRegistered(identifier.to_string()));
            }
            state.sessions.session_id_of(identifier)
        };

        let admission = match self.admit(identifier).await {
            Ok(admission) => admission,
            Err(e) => {
                self.reject(identifier, &e).await;
                return Err(e);
            }
        };

        let (position, ended) = {
            let mut state = self.state.lock().await;
            let current_session = state.sessions.session_id_of(identifier);
            if current_session.is_some() && current_session != previous_session {
                debug!(identifier = %identifier, "Paired during join, not queued");
                return Ok(None);
            }
            let ended = current_session
                .and_then(|session_id| state.end_session(&session_id, identifier, EndReason::Leave));
            let position = state.enqueue(admission);
            (position, ended)
        };

        self.finish_ended(ended).await;
        let position = position?;
        self.run_matching().await;
        Ok(Some(position))
    }

    /// Remove from the wait queue; false if the identifier was not queued
    pub async fn leave_queue(&self, identifier: &str) -> bool {
        let removed = self.state.lock().await.queue.remove(identifier);
        if removed {
            debug!(identifier = %identifier, "Left queue");
        }
        removed
    }

    /// Relay a chat message to both members of the sender's session
    pub async fn send_message(
        &self,
        identifier: &str,
        session_id: &str,
        message: String,
        reply_to: Option<String>,
    ) -> Result<ChatMessage, MatchError> {
        let state = self.state.lock().await;
        let session = member_session(&state, identifier, session_id)?;
        let display_name = session
            .participant(identifier)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| self.config.placeholder_name.clone());

        let chat = ChatMessage {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            message,
            identifier: identifier.to_string(),
            display_name,
            timestamp: Utc::now().timestamp_millis(),
            reply_to,
        };
        for participant in session.participants() {
            state
                .directory
                .notify(&participant.identifier, Notice::NewMessage(chat.clone()));
        }
        Ok(chat)
    }

    /// Relay a reaction to both members of the sender's session
    pub async fn add_reaction(
        &self,
        identifier: &str,
        session_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), MatchError> {
        let state = self.state.lock().await;
        let session = member_session(&state, identifier, session_id)?;
        let notice = Notice::MessageReaction {
            session_id: session_id.to_string(),
            message_id: message_id.to_string(),
            emoji: emoji.to_string(),
            identifier: identifier.to_string(),
        };
        for participant in session.participants() {
            state.directory.notify(&participant.identifier, notice.clone());
        }
        Ok(())
    }

    /// Number of waiting identifiers
    pub async fn queue_len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// 1-based queue position
    pub async fn queue_position(&self, identifier: &str) -> Option<usize> {
        self.state.lock().await.queue.position(identifier)
    }

    pub async fn is_queued(&self, identifier: &str) -> bool {
        self.state.lock().await.queue.contains(identifier)
    }

    /// Copy of the queue in FIFO order
    pub async fn queue_snapshot(&self) -> Vec<QueueEntry> {
        self.state.lock().await.queue.iter().cloned().collect()
    }

    /// Copy of the session the identifier belongs to
    pub async fn session_of(&self, identifier: &str) -> Option<Session> {
        self.state.lock().await.sessions.session_of(identifier).cloned()
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.directory.len()
    }

    pub async fn is_registered(&self, identifier: &str) -> bool {
        self.state.lock().await.directory.contains(identifier)
    }

    pub async fn has_grace_timer(&self, identifier: &str) -> bool {
        self.state.lock().await.grace.contains(identifier)
    }

    /// Ban, quota, block and profile checks, made without holding the lock
    ///
    /// Collaborator failures never refuse a join: a failed ban check counts
    /// as not banned, a failed quota check as unlimited.
    async fn admit(&self, identifier: &str) -> Result<Admission, MatchError> {
        let ban = match self.moderation.ban_status(identifier).await {
            Ok(status) => status,
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "Ban check failed, treating as not banned");
                BanStatus::default()
            }
        };
        if ban.is_active(Utc::now()) {
            return Err(MatchError::Banned {
                until: ban.until,
                reason: ban.reason,
            });
        }

        let remaining = match self.quota.remaining(identifier).await {
            Ok(remaining) => remaining,
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "Quota check failed, treating as unlimited");
                Remaining::Unlimited
            }
        };
        if remaining.is_exhausted() {
            return Err(MatchError::QuotaExhausted);
        }

        let blocked = match self.moderation.blocked_ids(identifier).await {
            Ok(blocked) => blocked,
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "Block lookup failed");
                HashSet::new()
            }
        };

        let display_name = match self.profiles.lookup(identifier).await {
            Ok(profile) => profile.display_name,
            Err(e) => {
                debug!(identifier = %identifier, error = %e, "Profile lookup failed, using placeholder");
                self.config.placeholder_name.clone()
            }
        };

        Ok(Admission {
            participant: Participant::new(identifier, display_name),
            blocked,
        })
    }

    async fn reject(&self, identifier: &str, error: &MatchError) {
        info!(identifier = %identifier, code = error.code(), "Join refused");
        self.state
            .lock()
            .await
            .directory
            .notify(identifier, Notice::match_error(error));
    }

    /// Put identifiers back into the queue in order, then run a match pass
    ///
    /// Identifiers that meanwhile re-joined, got paired or went away are
    /// skipped.
    async fn requeue_all(&self, identifiers: Vec<Identifier>) {
        if identifiers.is_empty() {
            return;
        }

        for identifier in identifiers {
            if !self.state.lock().await.directory.is_live(&identifier) {
                debug!(identifier = %identifier, "Not requeued, connection gone");
                continue;
            }

            let admission = match self.admit(&identifier).await {
                Ok(admission) => admission,
                Err(e) => {
                    self.reject(&identifier, &e).await;
                    continue;
                }
            };

            let mut state = self.state.lock().await;
            if state.sessions.session_of(&identifier).is_some() || state.queue.contains(&identifier)
            {
                debug!(identifier = %identifier, "Not requeued, already busy");
                continue;
            }
            if let Err(e) = state.enqueue(admission) {
                debug!(identifier = %identifier, error = %e, "Requeue dropped");
            }
        }

        self.run_matching().await;
    }

    /// Refund the remaining party of each ended session and requeue as asked
    async fn finish_ended(&self, ended: impl IntoIterator<Item = Ended>) {
        let mut requeue = Vec::new();
        for outcome in ended {
            if let Err(e) = self.quota.refund(&outcome.partner).await {
                warn!(
                    identifier = %outcome.partner,
                    session_id = %outcome.session_id,
                    error = %e,
                    "Quota refund failed"
                );
            }
            requeue.extend(outcome.requeue);
        }
        self.requeue_all(requeue).await;
    }
}

fn member_session<'a>(
    state: &'a CoordinatorState,
    identifier: &str,
    session_id: &str,
) -> Result<&'a Session, MatchError> {
    state
        .sessions
        .get(session_id)
        .filter(|session| session.contains(identifier))
        .ok_or_else(|| {
            debug!(identifier = %identifier, session_id = %session_id, "Not a member of session");
            MatchError::StaleSession(session_id.to_string())
        })
}
