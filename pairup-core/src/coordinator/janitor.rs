//! Queue janitor and periodic background tasks

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::{Coordinator, CoordinatorState};
use crate::participant::Identifier;

impl CoordinatorState {
    /// Remove every queued identifier whose connection is missing or dead
    pub(crate) fn sweep_dead(&mut self) -> Vec<Identifier> {
        let dead: Vec<Identifier> = self
            .queue
            .iter()
            .filter(|entry| !self.directory.is_live(&entry.identifier))
            .map(|entry| entry.identifier.clone())
            .collect();

        for identifier in &dead {
            self.queue.remove(identifier);
            self.forget(identifier);
        }
        dead
    }
}

impl Coordinator {
    /// Evict dead queue entries; returns how many were removed
    ///
    /// Never forms sessions and never notifies anyone.
    pub async fn sweep(&self) -> usize {
        let dead = self.state.lock().await.sweep_dead();
        if !dead.is_empty() {
            debug!(count = dead.len(), identifiers = ?dead, "Janitor evicted dead queue entries");
        }
        dead.len()
    }

    /// Spawn the queue janitor and the safety-net match ticker
    ///
    /// Both stop when [`Coordinator::shutdown`] is called.
    pub fn spawn_background_tasks(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let janitor = {
            let coordinator = Arc::clone(self);
            let period = self.config.janitor_interval();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = coordinator.shutdown.cancelled() => {
                            debug!("Queue janitor stopping");
                            break;
                        }
                        _ = ticker.tick() => {
                            coordinator.sweep().await;
                        }
                    }
                }
            })
        };

        let matcher = {
            let coordinator = Arc::clone(self);
            let period = self.config.match_interval();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = coordinator.shutdown.cancelled() => {
                            debug!("Match ticker stopping");
                            break;
                        }
                        _ = ticker.tick() => {
                            coordinator.run_matching().await;
                        }
                    }
                }
            })
        };

        info!(
            janitor_secs = self.config.janitor_interval().as_secs(),
            match_secs = self.config.match_interval().as_secs(),
            "Coordinator background tasks started"
        );
        vec![janitor, matcher]
    }

    /// Stop background tasks and cancel every pending grace timer
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
