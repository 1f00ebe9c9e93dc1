use tokio::task::JoinHandle;

use crate::analytics::reports::{self, JournalQuery, JournalStats};
use crate::error::{JournalError, Result, ValidationError};
use crate::gamification::XpEvent;
use crate::models::{parse_journal_date, JournalEntry};
use crate::remote::{SyncOperation, SyncOutcome};
use crate::state::{Journal, Saved};

impl Journal {
    /// Saves (or overwrites) the entry for `date` (`YYYY-MM-DD`). Every save earns XP.
    pub fn save_journal_entry(&mut self, date: &str, entry: JournalEntry) -> Result<Saved<JournalEntry>> {
        let key = date.trim();
        if parse_journal_date(key).is_none() {
            return Err(ValidationError::InvalidDate(date.to_string()).into());
        }
        let entry = entry.normalized();

        let previous = self.commit(
            |store| Ok(store.put_journal_entry(key.to_string(), entry.clone())),
            |persistence, store| persistence.save_journal(&store.journal),
        )?;
        log::info!(
            "{} journal entry for {}",
            if previous.is_some() { "Updated" } else { "Saved" },
            key
        );

        let sync = self.dispatch(SyncOperation::SaveJournal {
            date: key.to_string(),
            entry: entry.clone(),
        });
        let (xp_awarded, unlocked, leveled_up) = self.reward(Some(XpEvent::JournalSaved));

        Ok(Saved {
            record: entry,
            xp_awarded,
            unlocked,
            leveled_up,
            sync,
        })
    }

    pub fn delete_journal_entry(&mut self, date: &str) -> Result<Option<JoinHandle<SyncOutcome>>> {
        self.commit(
            |store| {
                store
                    .remove_journal_entry(date)
                    .ok_or_else(|| JournalError::NotFound(format!("Journal entry {}", date)))
            },
            |persistence, store| persistence.save_journal(&store.journal),
        )?;
        log::info!("Deleted journal entry for {}", date);

        Ok(self.dispatch(SyncOperation::DeleteJournal(date.to_string())))
    }

    pub fn journal_entry(&self, date: &str) -> Option<&JournalEntry> {
        self.store.journal.get(date)
    }

    pub fn query_journal(&self, query: &JournalQuery) -> Vec<(&str, &JournalEntry)> {
        reports::filter_journal(&self.store.journal, query)
    }

    pub fn journal_stats(&self) -> JournalStats {
        reports::journal_stats(&self.store.journal, chrono::Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::flaky_journal;

    fn entry(mood: u8) -> JournalEntry {
        JournalEntry {
            pre: "Plan the London open".into(),
            mood,
            ..Default::default()
        }
    }

    #[test]
    fn test_save_awards_xp_each_time() {
        let mut journal = Journal::in_memory();
        let first = journal.save_journal_entry("2024-06-10", entry(4)).unwrap();
        assert_eq!(first.xp_awarded, 10);

        let again = journal.save_journal_entry("2024-06-10", entry(5)).unwrap();
        assert_eq!(again.xp_awarded, 10);
        assert_eq!(journal.store().journal.len(), 1);
        assert_eq!(journal.journal_entry("2024-06-10").map(|e| e.mood), Some(5));
        assert_eq!(journal.gamification().xp, 20);
    }

    #[test]
    fn test_invalid_date_rejected() {
        let mut journal = Journal::in_memory();
        for bad in ["10/06/2024", "2024-13-01", ""] {
            let err = journal.save_journal_entry(bad, entry(3)).unwrap_err();
            assert!(matches!(err, JournalError::Validation(ValidationError::InvalidDate(_))));
        }
        assert_eq!(journal.gamification().xp, 0);
    }

    #[test]
    fn test_out_of_range_ratings_normalized() {
        let mut journal = Journal::in_memory();
        let saved = journal
            .save_journal_entry(
                "2024-06-11",
                JournalEntry {
                    mood: 9,
                    discipline: 0,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(saved.record.mood, 3);
        assert_eq!(saved.record.discipline, 5);
    }

    #[test]
    fn test_seventh_entry_unlocks_journal_week() {
        let mut journal = Journal::in_memory();
        for day in 1..=6 {
            let saved = journal
                .save_journal_entry(&format!("2024-06-{:02}", day), entry(3))
                .unwrap();
            assert!(saved.unlocked.is_empty());
        }
        let seventh = journal.save_journal_entry("2024-06-07", entry(3)).unwrap();
        assert_eq!(seventh.unlocked[0].id, "journal_week");
        assert_eq!(seventh.xp_awarded, 35);
    }

    #[test]
    fn test_delete_and_query() {
        let mut journal = Journal::in_memory();
        journal.save_journal_entry("2024-06-10", entry(2)).unwrap();
        journal.save_journal_entry("2024-06-12", entry(5)).unwrap();

        let hits = journal.query_journal(&JournalQuery {
            search: Some("london".into()),
            ..Default::default()
        });
        assert_eq!(hits.len(), 2);

        journal.delete_journal_entry("2024-06-10").unwrap();
        assert!(journal.journal_entry("2024-06-10").is_none());
        assert!(journal.delete_journal_entry("2024-06-10").is_err());
        assert_eq!(journal.journal_stats().entries, 1);
    }

    #[test]
    fn test_failed_write_leaves_store_untouched() {
        let (mut journal, disk) = flaky_journal();
        journal.save_journal_entry("2024-06-10", entry(4)).unwrap();
        disk.break_key("journal");

        assert!(journal.save_journal_entry("2024-06-10", entry(1)).is_err());
        assert!(journal.save_journal_entry("2024-06-11", entry(2)).is_err());
        assert!(journal.delete_journal_entry("2024-06-10").is_err());

        assert_eq!(journal.store().journal.len(), 1);
        assert_eq!(journal.journal_entry("2024-06-10").map(|e| e.mood), Some(4));
        assert_eq!(journal.gamification().xp, 10);
    }
}
