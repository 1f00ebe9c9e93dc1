use serde::Serialize;
use std::sync::Arc;

use crate::db::SyncStatus;
use crate::error::Result;
use crate::remote::{RemoteError, SyncOperation};
use crate::state::Journal;

/// What a cloud load replaced locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudLoad {
    pub trades: usize,
    pub transactions: usize,
    pub journal_entries: usize,
    pub settings: bool,
    pub milestones: bool,
    pub xp: Option<u64>,
}

impl Journal {
    /// Every local record as the remote writes that would recreate it.
    fn full_sync_plan(&self) -> Vec<SyncOperation> {
        let mut plan = vec![SyncOperation::SaveSettings(self.store.settings.clone())];
        plan.extend(self.store.trades.iter().cloned().map(SyncOperation::CreateTrade));
        plan.extend(
            self.store
                .transactions
                .iter()
                .cloned()
                .map(SyncOperation::CreateTransaction),
        );
        plan.extend(self.store.journal.iter().map(|(date, entry)| SyncOperation::SaveJournal {
            date: date.clone(),
            entry: entry.clone(),
        }));
        plan.push(SyncOperation::SaveMilestones(self.store.milestones.clone()));
        plan.push(SyncOperation::SaveProgress(self.progress_snapshot()));
        plan
    }

    /// Pushes everything to the remote backend in order, stopping at the first
    /// failed write. Returns the number of writes made.
    pub async fn sync_all(&self) -> Result<usize> {
        self.require_session()?;
        let (Some(remote), Some(session)) = (&self.remote, &self.session) else {
            return Err(RemoteError::NotSignedIn.into());
        };

        let plan = self.full_sync_plan();
        log::info!("Syncing {} records to {}", plan.len(), remote.backend().backend_name());
        for operation in &plan {
            remote.execute(operation, session).await?;
        }
        log::info!("All data synced to cloud");
        Ok(plan.len())
    }

    /// Pulls every collection concurrently and replaces the local copies.
    /// Collections are always replaced; settings, milestones and progress
    /// only when the remote document exists.
    pub async fn load_from_cloud(&mut self) -> Result<CloudLoad> {
        self.require_session()?;
        let (Some(remote), Some(session)) = (&self.remote, self.session.clone()) else {
            return Err(RemoteError::NotSignedIn.into());
        };
        let backend = Arc::clone(remote.backend());

        let fetched = futures::try_join!(
            backend.get_settings(&session),
            backend.list_trades(&session),
            backend.list_transactions(&session),
            backend.list_journal(&session),
            backend.get_milestones(&session),
            backend.get_progress(&session),
        );
        if let Some(db) = &self.db {
            let (status, error) = match &fetched {
                Ok(_) => (SyncStatus::Success, None),
                Err(e) => (SyncStatus::Failed, Some(e.to_string())),
            };
            if let Err(e) = db.record_sync("load_from_cloud", status, error.as_deref()) {
                log::warn!("Failed to record sync history: {}", e);
            }
        }
        let (settings, mut trades, transactions, journal, milestones, progress) = fetched?;

        trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let mut loaded = CloudLoad {
            trades: trades.len(),
            transactions: transactions.len(),
            journal_entries: journal.len(),
            ..Default::default()
        };

        self.persistence.save_trades(&trades)?;
        self.store.trades = trades;
        self.persistence.save_transactions(&transactions)?;
        self.store.transactions = transactions;
        self.persistence.save_journal(&journal)?;
        self.store.journal = journal;

        if let Some(settings) = settings {
            self.persistence.save_settings(&settings)?;
            self.store.settings = settings;
            loaded.settings = true;
        }
        if let Some(values) = milestones {
            self.store.set_milestones(values);
            self.persistence.save_milestones(&self.store.milestones)?;
            loaded.milestones = true;
        }
        if let Some(progress) = progress {
            self.gamification.xp = progress.xp;
            self.persistence.save_xp(progress.xp)?;
            loaded.xp = Some(progress.xp);
        }

        log::info!(
            "Loaded from cloud: {} trades, {} transactions, {} journal entries",
            loaded.trades,
            loaded.transactions,
            loaded.journal_entries
        );
        Ok(loaded)
    }
}
