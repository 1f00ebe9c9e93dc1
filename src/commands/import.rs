//! JSON backup/restore and CSV trade export.

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{JournalError, Result};
use crate::models::{parse_journal_date, JournalEntry, JournalMap, Settings, Trade, Transaction};
use crate::persistence::keys;
use crate::state::Journal;

const CSV_HEADER: [&str; 9] = ["Date", "Asset", "Direction", "Stake", "Payout", "Result", "P/L", "Session", "Strategy"];

/// Inclusive range on the trade's UTC calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, trade: &Trade) -> bool {
        let day = trade.timestamp.date_naive();
        day >= self.start && day <= self.end
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    trades: Vec<&'a Trade>,
    transactions: &'a [Transaction],
    journal: &'a JournalMap,
    milestones: &'a [i64],
    settings: &'a Settings,
    xp: u64,
    unlocked_achievements: &'a [String],
    export_date: String,
    version: &'static str,
}

/// Every key is optional; only present keys are restored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    trades: Option<Vec<Trade>>,
    transactions: Option<Vec<Transaction>>,
    journal: Option<BTreeMap<String, JournalEntry>>,
    milestones: Option<Vec<i64>>,
    settings: Option<Settings>,
    xp: Option<Value>,
    unlocked_achievements: Option<Vec<String>>,
}

/// What an import replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub trades: Option<usize>,
    pub transactions: Option<usize>,
    pub journal_entries: Option<usize>,
    pub milestones: bool,
    pub settings: bool,
    pub xp: Option<u64>,
    /// Imported trades whose `pl` disagrees with result/stake/payout.
    pub inconsistent_trades: usize,
}

fn parse_xp(value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|xp| xp.is_finite())
        .map(|xp| xp.max(0.0).floor() as u64)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid xp value: {}", value)))
        .map_err(JournalError::Serialization)
}

impl Journal {
    fn export_trades(&self, range: Option<DateRange>) -> Vec<&Trade> {
        self.store
            .trades
            .iter()
            .filter(|t| range.is_none_or(|r| r.contains(t)))
            .collect()
    }

    /// Pretty-printed JSON backup. `range` only filters trades.
    pub fn export_json(&self, range: Option<DateRange>) -> Result<String> {
        let document = ExportDocument {
            trades: self.export_trades(range),
            transactions: &self.store.transactions,
            journal: &self.store.journal,
            milestones: &self.store.milestones,
            settings: &self.store.settings,
            xp: self.gamification.xp,
            unlocked_achievements: &self.gamification.unlocked,
            export_date: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn export_csv(&self, range: Option<DateRange>) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;

        for trade in self.export_trades(range) {
            writer.write_record([
                trade.timestamp.with_timezone(&Local).format("%Y-%m-%d").to_string(),
                trade.asset.clone(),
                serde_plain(&trade.direction)?,
                trade.stake.to_string(),
                format!("{}%", trade.payout),
                trade.result.as_str().to_string(),
                format!("{:.2}", trade.pl),
                trade.session.clone(),
                trade.strategy.clone(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| JournalError::Io(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| JournalError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Restores a JSON backup. Each present key replaces its collection;
    /// missing keys leave state untouched. An `xp` of zero counts as missing.
    /// A document that fails to parse changes nothing.
    pub fn import_json(&mut self, raw: &str) -> Result<ImportSummary> {
        let document: ImportDocument = serde_json::from_str(raw)?;
        let xp = document.xp.as_ref().map(parse_xp).transpose()?.filter(|&xp| xp > 0);
        let mut summary = ImportSummary::default();

        if let Some(trades) = document.trades {
            summary.inconsistent_trades = trades.iter().filter(|t| !t.pl_is_consistent()).count();
            if summary.inconsistent_trades > 0 {
                log::warn!(
                    "{} imported trades have a P/L that does not match their stake and payout",
                    summary.inconsistent_trades
                );
            }
            self.persistence.save_trades(&trades)?;
            summary.trades = Some(trades.len());
            self.store.trades = trades;
        }

        if let Some(transactions) = document.transactions {
            self.persistence.save_transactions(&transactions)?;
            summary.transactions = Some(transactions.len());
            self.store.transactions = transactions;
        }

        if let Some(journal) = document.journal {
            let journal: JournalMap = journal
                .into_iter()
                .filter(|(date, _)| {
                    let valid = parse_journal_date(date).is_some();
                    if !valid {
                        log::warn!("Skipping journal entry with invalid date '{}'", date);
                    }
                    valid
                })
                .map(|(date, entry)| (date, entry.normalized()))
                .collect();
            self.persistence.save_journal(&journal)?;
            summary.journal_entries = Some(journal.len());
            self.store.journal = journal;
        }

        if let Some(milestones) = document.milestones {
            self.store.set_milestones(milestones);
            self.persistence.save_milestones(&self.store.milestones)?;
            summary.milestones = true;
        }

        if let Some(settings) = document.settings {
            self.persistence.save_settings(&settings)?;
            self.store.settings = settings;
            summary.settings = true;
        }

        if let Some(unlocked) = document.unlocked_achievements {
            self.persistence.save_unlocked_achievements(&unlocked)?;
            self.gamification.unlocked = unlocked;
        }

        if let Some(xp) = xp {
            self.persistence.save_xp(xp)?;
            self.gamification.xp = xp;
            summary.xp = Some(xp);
        }

        log::info!("Import complete: {:?}", summary);
        Ok(summary)
    }

    /// Empties trades, transactions and the journal, restores default
    /// milestones and zeroes progress. Settings and the signed-in user stay.
    pub fn clear_all_data(&mut self) -> Result<()> {
        self.store.reset_activity();
        self.gamification.reset();

        self.persistence.remove(keys::TRADES)?;
        self.persistence.remove(keys::TRANSACTIONS)?;
        self.persistence.remove(keys::JOURNAL)?;
        self.persistence.remove(keys::UNLOCKED_ACHIEVEMENTS)?;
        self.persistence.save_milestones(&self.store.milestones)?;
        self.persistence.save_xp(0)?;

        log::info!("All journal data cleared");
        Ok(())
    }
}

/// Serializes a unit enum to its bare wire name, e.g. `CALL`.
fn serde_plain<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::trade_input;
    use crate::models::{CreateTransactionInput, TradeResult, TransactionType, DEFAULT_MILESTONES};
    use chrono::TimeZone;

    fn seeded() -> Journal {
        let mut journal = Journal::in_memory();
        let june_10 = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let june_20 = Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap();
        journal.save_trade_at(trade_input(TradeResult::Win, 100.0), june_10).unwrap();
        journal.save_trade_at(trade_input(TradeResult::Loss, 50.0), june_20).unwrap();
        journal
            .save_transaction(CreateTransactionInput {
                kind: Some(TransactionType::Withdrawal),
                amount: Some(20.0),
                note: None,
            })
            .unwrap();
        journal.save_journal_entry("2024-06-10", JournalEntry::default()).unwrap();
        journal
    }

    #[test]
    fn test_export_then_import_restores_state() {
        let source = seeded();
        let backup = source.export_json(None).unwrap();

        let mut target = Journal::in_memory();
        let summary = target.import_json(&backup).unwrap();

        assert_eq!(summary.trades, Some(2));
        assert_eq!(summary.transactions, Some(1));
        assert_eq!(summary.journal_entries, Some(1));
        assert_eq!(summary.xp, Some(source.gamification().xp));
        assert_eq!(summary.inconsistent_trades, 0);
        assert_eq!(target.trades(), source.trades());
        assert_eq!(target.gamification().unlocked, source.gamification().unlocked);

        target.reload();
        assert_eq!(target.trades().len(), 2);
    }

    #[test]
    fn test_import_without_xp_keeps_xp() {
        let mut journal = seeded();
        let xp = journal.gamification().xp;

        let summary = journal.import_json(r#"{"trades": []}"#).unwrap();
        assert_eq!(summary.trades, Some(0));
        assert_eq!(summary.xp, None);
        assert!(journal.trades().is_empty());
        assert_eq!(journal.gamification().xp, xp);
        assert_eq!(journal.transactions().len(), 1);
    }

    #[test]
    fn test_import_zero_xp_keeps_xp() {
        let mut journal = seeded();
        let xp = journal.gamification().xp;
        assert!(xp > 0);

        for raw in [r#"{"xp": 0}"#, r#"{"xp": "0"}"#] {
            let summary = journal.import_json(raw).unwrap();
            assert_eq!(summary.xp, None);
            assert_eq!(journal.gamification().xp, xp);
        }
        journal.reload();
        assert_eq!(journal.gamification().xp, xp);
    }

    #[test]
    fn test_malformed_import_changes_nothing() {
        let mut journal = seeded();
        let before = journal.store().clone();

        assert!(journal.import_json("{not json").is_err());
        assert!(journal.import_json(r#"{"trades": [{"asset": 1}]}"#).is_err());
        assert!(journal.import_json(r#"{"trades": [], "xp": [1]}"#).is_err());
        assert_eq!(journal.store(), &before);
    }

    #[test]
    fn test_import_legacy_xp_and_flags_stale_pl() {
        let mut journal = Journal::in_memory();
        let raw = r#"{
            "xp": "340",
            "milestones": [500, 100, 100, -5],
            "trades": [{"id": 1718000000000, "asset": "EURUSD", "direction": "CALL",
                        "result": "WIN", "stake": 10, "payout": 85, "pl": 99,
                        "timestamp": "2024-06-10T08:13:20.000Z"}]
        }"#;
        let summary = journal.import_json(raw).unwrap();
        assert_eq!(summary.xp, Some(340));
        assert_eq!(summary.inconsistent_trades, 1);
        assert_eq!(journal.milestones(), &[100, 500]);
        assert_eq!(journal.trades()[0].pl, 99.0);
        assert_eq!(journal.gamification().level().title, "Apprentice");
    }

    #[test]
    fn test_export_date_range() {
        let journal = seeded();
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        };
        let json: Value = serde_json::from_str(&journal.export_json(Some(range)).unwrap()).unwrap();
        assert_eq!(json["trades"].as_array().unwrap().len(), 1);
        assert_eq!(json["transactions"].as_array().unwrap().len(), 1);
        assert!(json["exportDate"].is_string());
        assert!(json["unlockedAchievements"].is_array());
    }

    #[test]
    fn test_csv_export() {
        let journal = seeded();
        let csv = journal.export_csv(None).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Date,Asset,Direction,Stake,Payout,Result,P/L,Session,Strategy");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",EURUSD,CALL,50,85%,LOSS,-50.00,London,Support/Resistance"));
        assert!(lines[2].contains(",WIN,85.00,"));
    }

    #[test]
    fn test_clear_all_data_keeps_settings() {
        let mut journal = seeded();
        journal
            .save_settings(Settings {
                balance: 300.0,
                ..Default::default()
            })
            .unwrap();
        journal.clear_all_data().unwrap();
        journal.reload();

        assert!(journal.trades().is_empty());
        assert!(journal.transactions().is_empty());
        assert!(journal.store().journal.is_empty());
        assert_eq!(journal.milestones(), &DEFAULT_MILESTONES);
        assert_eq!(journal.gamification().xp, 0);
        assert!(journal.gamification().unlocked.is_empty());
        assert_eq!(journal.settings().balance, 300.0);
    }
}
