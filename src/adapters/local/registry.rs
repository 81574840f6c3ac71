use crate::domain::job::{JobId, ProgressUpdate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Fan-out capacity per job. A subscriber that lags behind this many
/// updates misses the oldest ones but keeps receiving.
const SUBSCRIBER_BUFFER: usize = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("job {0} already exists")]
    Duplicate(JobId),
}

/// A live subscription: the state snapshot at attach time, then every
/// subsequent update on the receiver. Unsubscribing is dropping the
/// receiver, which is naturally idempotent.
pub struct Subscription {
    pub snapshot: ProgressUpdate,
    pub updates: broadcast::Receiver<ProgressUpdate>,
}

#[derive(Debug)]
struct JobEntry {
    state: Mutex<ProgressUpdate>,
    sender: broadcast::Sender<ProgressUpdate>,
}

/// In-memory table of in-flight jobs with per-job progress broadcast.
///
/// The outer lock guards only entry lookup/insert/removal; each entry owns
/// its own state lock and broadcast sender, so updates to different jobs
/// never contend and a push to one broken subscriber cannot affect the
/// others (broadcast delivery is per-receiver).
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Arc<JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record in the `starting` state with no subscribers.
    pub fn create(&self, job_id: &str) -> Result<(), RegistryError> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(job_id) {
            return Err(RegistryError::Duplicate(job_id.to_owned()));
        }
        let (sender, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        jobs.insert(
            job_id.to_owned(),
            Arc::new(JobEntry {
                state: Mutex::new(ProgressUpdate::starting()),
                sender,
            }),
        );
        Ok(())
    }

    /// Attach a subscriber. None when the id is unknown - expired, never
    /// existed, or already reaped - which the caller must treat as
    /// terminal.
    pub fn subscribe(&self, job_id: &str) -> Option<Subscription> {
        let entry = self.entry(job_id)?;
        // Snapshot and receiver are taken under the same state lock so no
        // update can slip between them.
        let state = entry.state.lock().unwrap();
        Some(Subscription {
            snapshot: state.clone(),
            updates: entry.sender.subscribe(),
        })
    }

    /// Record and broadcast an update. A no-op when the job no longer
    /// exists (protecting in-flight updates racing a reap) or has already
    /// reached a terminal state (protecting it from stragglers still
    /// draining a stage's progress channel).
    pub fn update(&self, job_id: &str, update: ProgressUpdate) {
        let Some(entry) = self.entry(job_id) else {
            return;
        };
        {
            let mut state = entry.state.lock().unwrap();
            if state.stage.is_terminal() {
                return;
            }
            *state = update.clone();
        }
        // Err means no subscribers are currently attached.
        let _ = entry.sender.send(update);
    }

    /// Drop a job record. Subscribers' receivers close once the entry's
    /// sender is gone.
    pub fn remove(&self, job_id: &str) {
        self.jobs.lock().unwrap().remove(job_id);
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.jobs.lock().unwrap().contains_key(job_id)
    }

    /// Currently attached subscribers for a job (0 for unknown ids).
    pub fn subscriber_count(&self, job_id: &str) -> usize {
        self.entry(job_id)
            .map(|entry| entry.sender.receiver_count())
            .unwrap_or(0)
    }

    fn entry(&self, job_id: &str) -> Option<Arc<JobEntry>> {
        self.jobs.lock().unwrap().get(job_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::Stage;

    #[test]
    fn create_rejects_duplicates() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        assert_eq!(
            registry.create("a"),
            Err(RegistryError::Duplicate(String::from("a")))
        );
    }

    #[test]
    fn subscribe_unknown_job_is_none() {
        let registry = JobRegistry::new();
        assert!(registry.subscribe("missing").is_none());
    }

    #[tokio::test]
    async fn subscriber_gets_snapshot_then_updates() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        registry.update("a", ProgressUpdate::new(5, Stage::Preparing, "prep"));

        let mut subscription = registry.subscribe("a").unwrap();
        assert_eq!(subscription.snapshot.percent, 5);
        assert_eq!(subscription.snapshot.stage, Stage::Preparing);

        registry.update("a", ProgressUpdate::new(40, Stage::Capturing, "frames"));
        let update = subscription.updates.recv().await.unwrap();
        assert_eq!(update.percent, 40);
        assert_eq!(update.stage, Stage::Capturing);
    }

    #[tokio::test]
    async fn update_after_unsubscribe_is_not_an_error() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        let subscription = registry.subscribe("a").unwrap();
        assert_eq!(registry.subscriber_count("a"), 1);

        drop(subscription);
        assert_eq!(registry.subscriber_count("a"), 0);

        // Must not panic or error with no listeners attached.
        registry.update("a", ProgressUpdate::new(50, Stage::Capturing, "still going"));
    }

    #[tokio::test]
    async fn fanout_reaches_every_subscriber() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        let mut first = registry.subscribe("a").unwrap();
        let mut second = registry.subscribe("a").unwrap();

        registry.update("a", ProgressUpdate::new(80, Stage::Encoding, "mux"));
        assert_eq!(first.updates.recv().await.unwrap().percent, 80);
        assert_eq!(second.updates.recv().await.unwrap().percent, 80);
    }

    #[tokio::test]
    async fn terminal_state_is_final() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        registry.update("a", ProgressUpdate::failed("browser crashed"));

        // A straggling capture update must not resurrect the job.
        registry.update("a", ProgressUpdate::new(45, Stage::Capturing, "late"));

        let subscription = registry.subscribe("a").unwrap();
        assert_eq!(subscription.snapshot.stage, Stage::Error);
        assert_eq!(subscription.snapshot.message, "browser crashed");
    }

    #[test]
    fn update_on_reaped_job_is_a_noop() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        registry.remove("a");
        registry.update("a", ProgressUpdate::new(99, Stage::Encoding, "late"));
        assert!(!registry.contains("a"));
    }

    #[tokio::test]
    async fn removal_closes_subscriber_streams() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        let mut subscription = registry.subscribe("a").unwrap();
        registry.remove("a");
        assert!(matches!(
            subscription.updates.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[test]
    fn jobs_are_independent() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        registry.create("b").unwrap();
        let sub_a = registry.subscribe("a").unwrap();

        registry.update("b", ProgressUpdate::new(30, Stage::Capturing, "b frames"));
        registry.remove("b");

        assert!(registry.contains("a"));
        assert_eq!(sub_a.snapshot.stage, Stage::Starting);
    }
}
