use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::registry::SessionRegistry;

/// Periodically saves every open session in a registry.
///
/// Saves go through each session's lock, so an autosave never interleaves
/// with a round being recorded on the same game. Failures are logged and
/// the next tick tries again.
#[derive(Clone, Debug)]
pub struct Autosaver {
    registry: Arc<SessionRegistry>,
    interval: Duration,
}

impl Autosaver {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

    pub fn new(registry: Arc<SessionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the autosave task on the current tokio runtime.
    pub fn spawn(self) -> AutosaveHandle {
        info!(interval_secs = self.interval.as_secs_f64(), "autosave started");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; nothing has changed yet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let registry = Arc::clone(&self.registry);
                match tokio::task::spawn_blocking(move || registry.save_all()).await {
                    Ok(Ok(summary)) => {
                        debug!(saved = summary.saved, failed = summary.failed, "autosave tick")
                    }
                    Ok(Err(e)) => warn!(error = %e, "autosave failed"),
                    Err(e) => warn!(error = %e, "autosave task panicked"),
                }
            }
        });
        AutosaveHandle { task }
    }
}

/// Handle to a running autosave task.
#[derive(Debug)]
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Stop the task. A save already in progress runs to completion.
    pub fn stop(self) {
        self.task.abort();
        debug!("autosave stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
