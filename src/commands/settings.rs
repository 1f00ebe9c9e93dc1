use tokio::task::JoinHandle;

use crate::error::{Result, ValidationError};
use crate::models::{Settings, Theme};
use crate::remote::{SyncOperation, SyncOutcome};
use crate::state::Journal;

fn validate_settings(settings: &Settings) -> std::result::Result<(), ValidationError> {
    if !(settings.balance.is_finite() && settings.balance > 0.0) {
        return Err(ValidationError::InvalidSettings("starting balance must be positive".into()));
    }
    if !(settings.tp.is_finite() && settings.tp >= 0.0) {
        return Err(ValidationError::InvalidSettings("take profit must not be negative".into()));
    }
    if !(settings.sl.is_finite() && settings.sl >= 0.0) {
        return Err(ValidationError::InvalidSettings("stop loss must not be negative".into()));
    }
    Ok(())
}

impl Journal {
    pub fn settings(&self) -> &Settings {
        &self.store.settings
    }

    /// Replaces the settings wholesale.
    pub fn save_settings(&mut self, settings: Settings) -> Result<Option<JoinHandle<SyncOutcome>>> {
        validate_settings(&settings)?;

        self.persistence.save_settings(&settings)?;
        self.store.settings = settings.clone();
        log::info!(
            "Settings saved: balance {:.2}, tp {}%, sl {}%",
            settings.balance,
            settings.tp,
            settings.sl
        );

        Ok(self.dispatch(SyncOperation::SaveSettings(settings)))
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.persistence.save_theme(theme)?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.theme.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }
}
