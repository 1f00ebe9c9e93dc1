use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::{JournalError, Result, ValidationError};
use crate::gamification::XpEvent;
use crate::models::{CreateTradeInput, Trade, TradeResult, DEFAULT_PAYOUT};
use crate::remote::{SyncOperation, SyncOutcome};
use crate::state::{Journal, Saved};

/// Which trades the screenshot gallery shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFilter {
    #[default]
    All,
    Wins,
    Losses,
}

impl Journal {
    /// Checks the form in field order and builds the trade. Nothing is stored.
    fn build_trade(&self, input: &CreateTradeInput, now: DateTime<Utc>) -> Result<Trade> {
        let asset = input
            .asset
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(ValidationError::MissingAsset)?;
        let direction = input.direction.ok_or(ValidationError::MissingDirection)?;
        let result = input.result.ok_or(ValidationError::MissingResult)?;

        let stake = input.stake.unwrap_or(0.0);
        if !(stake.is_finite() && stake > 0.0) {
            return Err(ValidationError::NonPositiveStake.into());
        }
        let available = self.store.available_balance();
        if stake > available {
            return Err(ValidationError::StakeExceedsBalance { stake, available }.into());
        }

        let payout = input
            .payout
            .filter(|p| p.is_finite() && *p != 0.0)
            .unwrap_or(DEFAULT_PAYOUT);

        Ok(Trade::new(asset.to_string(), direction, result, stake, payout, now).with_metadata(input))
    }

    pub fn save_trade(&mut self, input: CreateTradeInput) -> Result<Saved<Trade>> {
        self.save_trade_at(input, Utc::now())
    }

    /// Validates, stores (most recent first), mirrors remotely, then awards
    /// XP and runs the achievement pass.
    pub fn save_trade_at(&mut self, input: CreateTradeInput, now: DateTime<Utc>) -> Result<Saved<Trade>> {
        let trade = self.build_trade(&input, now)?;

        self.commit(
            |store| {
                store.add_trade(trade.clone());
                Ok(())
            },
            |persistence, store| persistence.save_trades(&store.trades),
        )?;
        log::info!(
            "Saved trade {} {} {:?} stake {:.2} pl {:.2}",
            trade.id,
            trade.asset,
            trade.result,
            trade.stake,
            trade.pl
        );

        let sync = self.dispatch(SyncOperation::CreateTrade(trade.clone()));
        let (xp_awarded, unlocked, leveled_up) = self.reward(Some(XpEvent::TradeSaved(trade.result)));

        Ok(Saved {
            record: trade,
            xp_awarded,
            unlocked,
            leveled_up,
            sync,
        })
    }

    /// Removes a trade locally and remotely. XP and achievements are kept.
    pub fn delete_trade(&mut self, id: &str) -> Result<Option<JoinHandle<SyncOutcome>>> {
        let removed = self.commit(
            |store| {
                store
                    .remove_trade(id)
                    .ok_or_else(|| JournalError::NotFound(format!("Trade {}", id)))
            },
            |persistence, store| persistence.save_trades(&store.trades),
        )?;
        log::info!("Deleted trade {} ({})", removed.id, removed.asset);

        Ok(self.dispatch(SyncOperation::DeleteTrade(removed.id)))
    }

    pub fn trades(&self) -> &[Trade] {
        &self.store.trades
    }

    pub fn trade(&self, id: &str) -> Option<&Trade> {
        self.store.find_trade(id)
    }

    /// Case-insensitive asset search plus an optional result filter.
    /// Storage order (most recent first) is kept.
    pub fn filter_trades(&self, search: &str, result: Option<TradeResult>) -> Vec<&Trade> {
        let needle = search.trim().to_lowercase();
        self.store
            .trades
            .iter()
            .filter(|t| needle.is_empty() || t.asset.to_lowercase().contains(&needle))
            .filter(|t| result.is_none_or(|r| t.result == r))
            .collect()
    }

    pub fn recent_trades(&self, count: usize) -> &[Trade] {
        let end = count.min(self.store.trades.len());
        &self.store.trades[..end]
    }

    /// Trades with an attached screenshot.
    pub fn screenshots(&self, filter: ScreenshotFilter) -> Vec<&Trade> {
        self.store
            .trades
            .iter()
            .filter(|t| t.screenshot.is_some())
            .filter(|t| match filter {
                ScreenshotFilter::All => true,
                ScreenshotFilter::Wins => t.is_win(),
                ScreenshotFilter::Losses => t.is_loss(),
            })
            .collect()
    }
}
