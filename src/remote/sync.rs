//! Best-effort mirroring of local writes to the remote backend.
//!
//! Local state is written first and never rolled back. Dispatched writes are
//! queued to a single worker task and reach the backend in dispatch order; each
//! outcome is recorded in the sync history, sent on the outcome channel and
//! returned through the `JoinHandle` handed out at dispatch.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::client::{ProgressSnapshot, RemoteBackend, RemoteSession};
use super::error::RemoteError;
use crate::db::{Database, SyncStatus};
use crate::models::{JournalEntry, Settings, Trade, Transaction, UserProfile};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOperation {
    CreateTrade(Trade),
    DeleteTrade(String),
    CreateTransaction(Transaction),
    SaveJournal { date: String, entry: JournalEntry },
    DeleteJournal(String),
    SaveSettings(Settings),
    SaveMilestones(Vec<i64>),
    SaveProgress(ProgressSnapshot),
    SaveProfile {
        name: String,
        email: String,
        profile: UserProfile,
    },
}

impl SyncOperation {
    pub fn name(&self) -> &'static str {
        match self {
            SyncOperation::CreateTrade(_) => "create_trade",
            SyncOperation::DeleteTrade(_) => "delete_trade",
            SyncOperation::CreateTransaction(_) => "create_transaction",
            SyncOperation::SaveJournal { .. } => "save_journal",
            SyncOperation::DeleteJournal(_) => "delete_journal",
            SyncOperation::SaveSettings(_) => "save_settings",
            SyncOperation::SaveMilestones(_) => "save_milestones",
            SyncOperation::SaveProgress(_) => "save_progress",
            SyncOperation::SaveProfile { .. } => "save_profile",
        }
    }

    async fn apply(&self, backend: &dyn RemoteBackend, session: &RemoteSession) -> Result<(), RemoteError> {
        match self {
            SyncOperation::CreateTrade(trade) => backend.create_trade(session, trade).await,
            SyncOperation::DeleteTrade(id) => backend.delete_trade(session, id).await,
            SyncOperation::CreateTransaction(t) => backend.create_transaction(session, t).await,
            SyncOperation::SaveJournal { date, entry } => backend.upsert_journal_entry(session, date, entry).await,
            SyncOperation::DeleteJournal(date) => backend.delete_journal_entry(session, date).await,
            SyncOperation::SaveSettings(settings) => backend.upsert_settings(session, settings).await,
            SyncOperation::SaveMilestones(values) => backend.upsert_milestones(session, values).await,
            SyncOperation::SaveProgress(progress) => backend.upsert_progress(session, progress).await,
            SyncOperation::SaveProfile { name, email, profile } => {
                backend.update_profile(session, name, email, profile).await
            }
        }
    }
}

/// Result of one remote write.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub operation: &'static str,
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

struct QueuedWrite {
    operation: SyncOperation,
    session: RemoteSession,
    reply: oneshot::Sender<SyncOutcome>,
}

pub struct RemoteSync {
    backend: Arc<dyn RemoteBackend>,
    history: Option<Arc<Database>>,
    outcomes: UnboundedSender<SyncOutcome>,
    queue: UnboundedSender<QueuedWrite>,
    runtime: Handle,
}

impl RemoteSync {
    /// Returns the dispatcher and the receiving end of its outcome channel.
    /// The write worker runs on `runtime` until the dispatcher is dropped.
    pub fn new(
        backend: Arc<dyn RemoteBackend>,
        history: Option<Arc<Database>>,
        runtime: Handle,
    ) -> (Self, UnboundedReceiver<SyncOutcome>) {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        let (queue, jobs) = mpsc::unbounded_channel();
        runtime.spawn(run_worker(Arc::clone(&backend), history.clone(), outcomes.clone(), jobs));

        let sync = Self {
            backend,
            history,
            outcomes,
            queue,
            runtime,
        };
        (sync, receiver)
    }

    pub fn backend(&self) -> &Arc<dyn RemoteBackend> {
        &self.backend
    }

    /// Queues the write behind every earlier one and returns immediately.
    pub fn dispatch(&self, operation: SyncOperation, session: RemoteSession) -> JoinHandle<SyncOutcome> {
        let name = operation.name();
        let (reply, done) = oneshot::channel();
        log::debug!("Queueing {} for {}", name, self.backend.backend_name());

        let queued = QueuedWrite {
            operation,
            session,
            reply,
        };
        if self.queue.send(queued).is_err() {
            log::error!("Sync worker stopped, {} not sent", name);
        }

        self.runtime.spawn(async move {
            done.await.unwrap_or_else(|_| SyncOutcome {
                operation: name,
                error: Some("sync worker stopped".to_string()),
            })
        })
    }

    /// Runs the write on the caller's task and returns its error, if any.
    pub async fn execute(&self, operation: &SyncOperation, session: &RemoteSession) -> Result<(), RemoteError> {
        let result = operation.apply(self.backend.as_ref(), session).await;
        finish(self.history.as_deref(), &self.outcomes, operation.name(), &result);
        result
    }
}

async fn run_worker(
    backend: Arc<dyn RemoteBackend>,
    history: Option<Arc<Database>>,
    outcomes: UnboundedSender<SyncOutcome>,
    mut jobs: UnboundedReceiver<QueuedWrite>,
) {
    while let Some(job) = jobs.recv().await {
        let result = job.operation.apply(backend.as_ref(), &job.session).await;
        let outcome = finish(history.as_deref(), &outcomes, job.operation.name(), &result);
        // The caller may have dropped its handle.
        let _ = job.reply.send(outcome);
    }
    log::debug!("Sync worker for {} finished", backend.backend_name());
}

fn finish(
    history: Option<&Database>,
    outcomes: &UnboundedSender<SyncOutcome>,
    operation: &'static str,
    result: &Result<(), RemoteError>,
) -> SyncOutcome {
    let error = result.as_ref().err().map(|e| e.to_string());
    match &error {
        None => log::info!("Remote {} succeeded", operation),
        Some(e) => log::error!("Remote {} failed: {}", operation, e),
    }

    if let Some(db) = history {
        let status = if error.is_none() { SyncStatus::Success } else { SyncStatus::Failed };
        if let Err(e) = db.record_sync(operation, status, error.as_deref()) {
            log::warn!("Failed to record sync history for {}: {}", operation, e);
        }
    }

    let outcome = SyncOutcome { operation, error };
    // Nobody listening is fine; the handle still carries the outcome.
    let _ = outcomes.send(outcome.clone());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TradeResult};
    use crate::remote::mock::MockBackend;
    use chrono::Utc;

    fn session() -> RemoteSession {
        RemoteSession {
            uid: "uid-1".into(),
            id_token: "token".into(),
            refresh_token: String::new(),
            email: "a@b.io".into(),
            display_name: None,
        }
    }

    fn trade() -> Trade {
        Trade::new("EURUSD".into(), Direction::Call, TradeResult::Win, 10.0, 85.0, Utc::now())
    }

    #[tokio::test]
    async fn test_dispatch_success_is_recorded() {
        let backend = Arc::new(MockBackend::default());
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (sync, mut rx) = RemoteSync::new(backend.clone(), Some(db.clone()), Handle::current());

        let t = trade();
        let outcome = sync.dispatch(SyncOperation::CreateTrade(t.clone()), session()).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(rx.recv().await.unwrap().operation, "create_trade");
        assert_eq!(backend.data().trades[0].id, t.id);

        let records = db.recent_syncs(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, SyncStatus::Success);
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_reported_not_raised() {
        let backend = Arc::new(MockBackend::default());
        backend.fail_on("delete_trade");
        let db = Arc::new(Database::open_in_memory().unwrap());
        let (sync, mut rx) = RemoteSync::new(backend, Some(db.clone()), Handle::current());

        let outcome = sync
            .dispatch(SyncOperation::DeleteTrade("TRADE-1".into()), session())
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert!(rx.recv().await.unwrap().error.is_some());
        let records = db.recent_syncs(10).unwrap();
        assert_eq!(records[0].status, SyncStatus::Failed);
        assert!(records[0].error_message.is_some());
    }

    #[tokio::test]
    async fn test_execute_returns_error() {
        let backend = Arc::new(MockBackend::default());
        backend.fail_on("save_settings");
        let (sync, _rx) = RemoteSync::new(backend.clone(), None, Handle::current());

        let result = sync
            .execute(&SyncOperation::SaveSettings(Settings::default()), &session())
            .await;
        assert!(result.is_err());

        sync.execute(&SyncOperation::SaveMilestones(vec![100, 200]), &session())
            .await
            .unwrap();
        assert_eq!(backend.data().milestones, Some(vec![100, 200]));
    }

    #[tokio::test]
    async fn test_dispatched_writes_keep_their_order() {
        let backend = Arc::new(MockBackend::default());
        let (sync, _rx) = RemoteSync::new(backend.clone(), None, Handle::current());
        let t = trade();

        let created = sync.dispatch(SyncOperation::CreateTrade(t.clone()), session());
        let deleted = sync.dispatch(SyncOperation::DeleteTrade(t.id.clone()), session());
        let progress: Vec<_> = (1..=5)
            .map(|xp| {
                sync.dispatch(
                    SyncOperation::SaveProgress(ProgressSnapshot {
                        xp,
                        level: 1,
                        updated_at: None,
                    }),
                    session(),
                )
            })
            .collect();

        // Awaited out of order on purpose.
        assert!(deleted.await.unwrap().is_success());
        assert!(created.await.unwrap().is_success());
        for handle in progress.into_iter().rev() {
            handle.await.unwrap();
        }

        let data = backend.data();
        assert!(data.trades.is_empty());
        assert_eq!(data.progress.as_ref().map(|p| p.xp), Some(5));
        assert_eq!(
            &data.calls[..3],
            &["create_trade", "delete_trade", "save_progress"]
        );
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(SyncOperation::DeleteJournal("2024-06-10".into()).name(), "delete_journal");
        assert_eq!(
            SyncOperation::SaveProgress(ProgressSnapshot {
                xp: 10,
                level: 1,
                updated_at: None
            })
            .name(),
            "save_progress"
        );
    }
}
