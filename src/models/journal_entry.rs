use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::de;

pub const MOOD_LABELS: [&str; 5] = ["Poor", "Low", "Neutral", "Good", "Great"];

fn default_mood() -> u8 {
    3
}
fn default_discipline() -> u8 {
    5
}

/// One day's psychology notes. Stored under its `YYYY-MM-DD` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(default)]
    pub pre: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub mistakes: String,
    #[serde(default = "default_mood", deserialize_with = "de::lenient")]
    pub mood: u8, // 1-5
    #[serde(default = "default_discipline", deserialize_with = "de::lenient")]
    pub discipline: u8, // 1-10
}

/// Date-keyed journal. BTreeMap keeps keys in calendar order.
pub type JournalMap = BTreeMap<String, JournalEntry>;

impl Default for JournalEntry {
    fn default() -> Self {
        Self {
            pre: String::new(),
            goals: String::new(),
            post: String::new(),
            mistakes: String::new(),
            mood: default_mood(),
            discipline: default_discipline(),
        }
    }
}

impl JournalEntry {
    /// Clamps ordinals into range; out-of-range form values fall back to the defaults.
    pub fn normalized(mut self) -> Self {
        if !(1..=5).contains(&self.mood) {
            self.mood = default_mood();
        }
        if !(1..=10).contains(&self.discipline) {
            self.discipline = default_discipline();
        }
        self
    }

    pub fn mood_label(&self) -> &'static str {
        MOOD_LABELS
            .get(usize::from(self.mood).wrapping_sub(1))
            .copied()
            .unwrap_or("Neutral")
    }

    pub fn discipline_percent(&self) -> u32 {
        u32::from(self.discipline) * 10
    }

    pub fn is_blank(&self) -> bool {
        [&self.pre, &self.goals, &self.post, &self.mistakes]
            .iter()
            .all(|s| s.trim().is_empty())
    }

    /// Free-text search across all four sections.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.pre, &self.goals, &self.post, &self.mistakes]
            .iter()
            .any(|s| s.to_lowercase().contains(&needle))
    }
}

/// Parses a journal key. Keys are always `YYYY-MM-DD`.
pub fn parse_journal_date(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}
