use crate::analytics::{metrics, reports};
use crate::error::Result;
use crate::remote::SyncOperation;
use crate::state::Journal;

impl Journal {
    pub fn milestones(&self) -> &[i64] {
        &self.store.milestones
    }

    /// Adds a positive, not yet present target.
    pub fn add_milestone(&mut self, value: i64) -> Result<()> {
        self.commit(
            |store| Ok(store.add_milestone(value)?),
            |persistence, store| persistence.save_milestones(&store.milestones),
        )?;
        self.dispatch_milestones();
        Ok(())
    }

    /// Returns false when `value` was not a milestone.
    pub fn remove_milestone(&mut self, value: i64) -> Result<bool> {
        if !self.store.milestones.contains(&value) {
            return Ok(false);
        }
        self.commit(
            |store| Ok(store.remove_milestone(value)),
            |persistence, store| persistence.save_milestones(&store.milestones),
        )?;
        self.dispatch_milestones();
        Ok(true)
    }

    pub fn milestone_progress(&self) -> Vec<reports::MilestoneProgress> {
        reports::milestone_progress(&self.store.milestones, metrics::total_pl(&self.store.trades))
    }

    fn dispatch_milestones(&self) {
        self.dispatch(SyncOperation::SaveMilestones(self.store.milestones.clone()));
    }
}
