//! The session context every user action runs against.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::db::{Database, SyncRecord};
use crate::error::Result;
use crate::gamification::{Achievement, GamificationState, Level, XpEvent};
use crate::models::{Theme, TradingGoals, UserIdentity, UserProfile};
use crate::persistence::Persistence;
use crate::remote::{FirebaseBackend, ProgressSnapshot, RemoteBackend, RemoteSession, RemoteSync, SyncOperation, SyncOutcome};
use crate::store::JournalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No remote backend configured.
    Offline,
    /// Backend configured, nobody signed in to it.
    Disconnected,
    Connected,
}

/// What a saving action changed besides the record itself.
#[derive(Debug)]
pub struct Saved<T> {
    pub record: T,
    pub xp_awarded: u64,
    pub unlocked: Vec<&'static Achievement>,
    /// Set when the action moved the user into a higher level.
    pub leveled_up: Option<&'static Level>,
    /// The remote write, when one was dispatched.
    pub sync: Option<JoinHandle<SyncOutcome>>,
}

pub struct Journal {
    pub(crate) store: JournalStore,
    pub(crate) gamification: GamificationState,
    pub(crate) persistence: Persistence,
    pub(crate) db: Option<Arc<Database>>,
    pub(crate) remote: Option<RemoteSync>,
    pub(crate) outcomes: Option<UnboundedReceiver<SyncOutcome>>,
    pub(crate) session: Option<RemoteSession>,
    pub(crate) current_user: Option<UserIdentity>,
    pub(crate) theme: Theme,
    pub(crate) profile: UserProfile,
    pub(crate) goals: TradingGoals,
}

impl Journal {
    /// Opens the SQLite store under `config.data_dir` and, when Firebase is
    /// configured and a tokio runtime is available, the remote backend.
    pub fn open(config: &AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let path = config.database_path();
        let db = Arc::new(Database::new(&path.to_string_lossy())?);
        log::info!("Opened journal database at {}", path.display());

        let backend: Option<Arc<dyn RemoteBackend>> = config.remote().map(|firebase| {
            Arc::new(FirebaseBackend::new(firebase, config.rate_limit())) as Arc<dyn RemoteBackend>
        });
        if backend.is_none() {
            log::info!("Firebase not configured, running in offline mode");
        }

        let persistence = Persistence::new(db.clone());
        Ok(Self::with_parts(persistence, Some(db), backend))
    }

    /// Ephemeral journal with no remote backend.
    pub fn in_memory() -> Self {
        Self::with_parts(Persistence::in_memory(), None, None)
    }

    /// Builds a journal over an existing store. `backend` is only used when
    /// called from inside a tokio runtime.
    pub fn with_parts(
        persistence: Persistence,
        db: Option<Arc<Database>>,
        backend: Option<Arc<dyn RemoteBackend>>,
    ) -> Self {
        let (remote, outcomes) = match (backend, Handle::try_current()) {
            (Some(backend), Ok(runtime)) => {
                let (sync, rx) = RemoteSync::new(backend, db.clone(), runtime);
                (Some(sync), Some(rx))
            }
            (Some(backend), Err(_)) => {
                log::warn!(
                    "No async runtime available, {} sync disabled",
                    backend.backend_name()
                );
                (None, None)
            }
            (None, _) => (None, None),
        };

        let mut journal = Self {
            store: JournalStore::default(),
            gamification: GamificationState::default(),
            persistence,
            db,
            remote,
            outcomes,
            session: None,
            current_user: None,
            theme: Theme::default(),
            profile: UserProfile::default(),
            goals: TradingGoals::default(),
        };
        journal.reload();
        journal
    }

    /// Re-reads every collection from local storage.
    pub fn reload(&mut self) {
        self.store = JournalStore::load(&self.persistence);
        self.gamification = GamificationState::new(
            self.persistence.load_xp(),
            self.persistence.load_unlocked_achievements(),
        );
        self.current_user = self.persistence.load_current_user();
        self.theme = self.persistence.load_theme();
        self.profile = self.persistence.load_profile();
        self.goals = self.persistence.load_goals();
        log::debug!(
            "Loaded {} trades, {} transactions, {} journal entries",
            self.store.trades.len(),
            self.store.transactions.len(),
            self.store.journal.len()
        );
    }

    pub fn store(&self) -> &JournalStore {
        &self.store
    }

    pub fn gamification(&self) -> &GamificationState {
        &self.gamification
    }

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.current_user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn remote_session(&self) -> Option<&RemoteSession> {
        self.session.as_ref()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        match (&self.remote, &self.session) {
            (None, _) => ConnectionStatus::Offline,
            (Some(_), None) => ConnectionStatus::Disconnected,
            (Some(_), Some(_)) => ConnectionStatus::Connected,
        }
    }

    /// Receiver for the outcome of every remote write. Can be taken once.
    pub fn take_sync_outcomes(&mut self) -> Option<UnboundedReceiver<SyncOutcome>> {
        self.outcomes.take()
    }

    /// Most recent remote write attempts; empty without a database.
    pub fn sync_history(&self, limit: usize) -> Result<Vec<SyncRecord>> {
        match &self.db {
            Some(db) => db.recent_syncs(limit),
            None => Ok(Vec::new()),
        }
    }

    /// Sends `operation` to the remote backend when signed in to one.
    pub(crate) fn dispatch(&self, operation: SyncOperation) -> Option<JoinHandle<SyncOutcome>> {
        let remote = self.remote.as_ref()?;
        let session = self.session.as_ref()?;
        Some(remote.dispatch(operation, session.clone()))
    }

    /// Applies `change` to a copy of the store and persists it with `save`.
    /// The in-memory store is only replaced once `save` succeeds.
    pub(crate) fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut JournalStore) -> Result<T>,
        save: impl FnOnce(&Persistence, &JournalStore) -> Result<()>,
    ) -> Result<T> {
        let mut staged = self.store.clone();
        let value = change(&mut staged)?;
        save(&self.persistence, &staged)?;
        self.store = staged;
        Ok(value)
    }

    pub(crate) fn progress_snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            xp: self.gamification.xp,
            level: u32::from(self.gamification.level().level),
            updated_at: None,
        }
    }

    /// Writes XP and unlocked achievements locally and mirrors the progress
    /// remotely. A failed local write is logged, not returned: the record that
    /// earned the XP is already committed.
    pub(crate) fn persist_progress(&self) {
        let saved = self
            .persistence
            .save_xp(self.gamification.xp)
            .and_then(|()| self.persistence.save_unlocked_achievements(&self.gamification.unlocked));
        if let Err(e) = saved {
            log::error!("Failed to save progress ({} XP): {}", self.gamification.xp, e);
        }
        self.dispatch(SyncOperation::SaveProgress(self.progress_snapshot()));
    }

    /// Awards `event` (if any), runs the achievement pass and persists the
    /// result. Returns the XP gained, the new unlocks and any level change.
    pub(crate) fn reward(&mut self, event: Option<XpEvent>) -> (u64, Vec<&'static Achievement>, Option<&'static Level>) {
        let xp_before = self.gamification.xp;
        let level_before = self.gamification.level().level;

        if let Some(event) = event {
            self.gamification.record(event);
        }
        let unlocked = self.gamification.unlock_pass(&self.store);

        if self.gamification.xp != xp_before {
            self.persist_progress();
        }

        let level = self.gamification.level();
        let leveled_up = if level.level > level_before {
            log::info!("Level up: {} ({})", level.level, level.title);
            Some(level)
        } else {
            None
        };
        (self.gamification.xp - xp_before, unlocked, leveled_up)
    }
}
