use serde::Serialize;
use tokio::task::JoinHandle;

use crate::analytics::metrics;
use crate::commands::auth::validate_email;
use crate::error::{JournalError, Result};
use crate::models::{Screenshot, TradeResult, TradingGoals, UserIdentity, UserProfile};
use crate::remote::{SyncOperation, SyncOutcome};
use crate::state::Journal;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_trades: usize,
    pub win_rate: f64,
    pub best_streak: usize,
    pub level: u8,
    pub level_title: &'static str,
    /// e.g. "June 2024"; empty when nobody is signed in.
    pub member_since: String,
}

impl Journal {
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn goals(&self) -> &TradingGoals {
        &self.goals
    }

    pub fn save_goals(&mut self, goals: TradingGoals) -> Result<()> {
        self.persistence.save_goals(&goals)?;
        self.goals = goals;
        log::info!("Trading goals saved");
        Ok(())
    }

    fn signed_in_user(&self) -> Result<UserIdentity> {
        self.current_user
            .clone()
            .ok_or_else(|| JournalError::Auth("Please login first".to_string()))
    }

    /// Rewrites the identity's name and email along with the profile details.
    /// A blank name keeps the current one.
    pub fn update_profile(
        &mut self,
        name: &str,
        email: &str,
        profile: UserProfile,
    ) -> Result<Option<JoinHandle<SyncOutcome>>> {
        let mut user = self.signed_in_user()?;
        let email = email.trim();
        validate_email(email)?;

        if !name.trim().is_empty() {
            user.name = name.trim().to_string();
        }
        user.email = email.to_string();

        self.persistence.save_current_user(Some(&user))?;
        self.persistence.save_profile(&profile)?;
        self.profile = profile.clone();
        log::info!("Profile updated for {}", user.email);

        let operation = SyncOperation::SaveProfile {
            name: user.name.clone(),
            email: user.email.clone(),
            profile,
        };
        self.current_user = Some(user);
        Ok(self.dispatch(operation))
    }

    pub fn update_profile_pic(&mut self, picture: &Screenshot) -> Result<()> {
        let mut user = self.signed_in_user()?;
        user.pic = Some(picture.to_data_url());
        self.persistence.save_current_user(Some(&user))?;
        self.current_user = Some(user);
        Ok(())
    }

    pub fn profile_stats(&self) -> ProfileStats {
        let trades = &self.store.trades;
        let level = self.gamification.level();
        ProfileStats {
            total_trades: trades.len(),
            win_rate: metrics::win_rate(trades),
            best_streak: metrics::max_streak(trades, TradeResult::Win),
            level: level.level,
            level_title: level.title,
            member_since: self
                .current_user
                .as_ref()
                .map(|u| u.created_at.format("%B %Y").to_string())
                .unwrap_or_default(),
        }
    }
}
