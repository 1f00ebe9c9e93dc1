use chrono::{DateTime, Utc};

use crate::error::{Result, ValidationError};
use crate::models::{CreateTransactionInput, Transaction};
use crate::remote::SyncOperation;
use crate::state::{Journal, Saved};

impl Journal {
    pub fn save_transaction(&mut self, input: CreateTransactionInput) -> Result<Saved<Transaction>> {
        self.save_transaction_at(input, Utc::now())
    }

    /// Records a deposit or withdrawal. No XP, but the achievement pass runs
    /// (withdrawals unlock one).
    pub fn save_transaction_at(
        &mut self,
        input: CreateTransactionInput,
        now: DateTime<Utc>,
    ) -> Result<Saved<Transaction>> {
        let amount = input.amount.unwrap_or(0.0);
        if !(amount.is_finite() && amount > 0.0) {
            return Err(ValidationError::NonPositiveAmount.into());
        }

        let transaction = Transaction::new(
            input.kind.unwrap_or_default(),
            amount,
            input.note.unwrap_or_default(),
            now,
        );

        self.commit(
            |store| {
                store.add_transaction(transaction.clone());
                Ok(())
            },
            |persistence, store| persistence.save_transactions(&store.transactions),
        )?;
        log::info!("Saved {:?} of {:.2}", transaction.kind, transaction.amount);

        let sync = self.dispatch(SyncOperation::CreateTransaction(transaction.clone()));
        let (xp_awarded, unlocked, leveled_up) = self.reward(None);

        Ok(Saved {
            record: transaction,
            xp_awarded,
            unlocked,
            leveled_up,
            sync,
        })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.store.transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JournalError;
    use crate::commands::test_support::flaky_journal;
    use crate::models::TransactionType;

    fn input(kind: TransactionType, amount: f64) -> CreateTransactionInput {
        CreateTransactionInput {
            kind: Some(kind),
            amount: Some(amount),
            note: None,
        }
    }

    #[test]
    fn test_withdrawal_unlocks_achievement() {
        let mut journal = Journal::in_memory();
        let deposit = journal.save_transaction(input(TransactionType::Deposit, 500.0)).unwrap();
        assert!(deposit.unlocked.is_empty());
        assert_eq!(deposit.xp_awarded, 0);

        let withdrawal = journal.save_transaction(input(TransactionType::Withdrawal, 50.0)).unwrap();
        assert_eq!(withdrawal.unlocked[0].id, "first_withdrawal");
        assert_eq!(withdrawal.xp_awarded, 25);
        assert_eq!(journal.transactions()[0].id, withdrawal.record.id);
    }

    #[test]
    fn test_amount_must_be_positive() {
        let mut journal = Journal::in_memory();
        for amount in [0.0, -5.0, f64::INFINITY] {
            let err = journal.save_transaction(input(TransactionType::Deposit, amount)).unwrap_err();
            assert!(matches!(err, JournalError::Validation(ValidationError::NonPositiveAmount)));
        }
        let missing = CreateTransactionInput::default();
        assert!(journal.save_transaction(missing).is_err());
        assert!(journal.transactions().is_empty());
    }

    #[test]
    fn test_kind_defaults_to_deposit() {
        let mut journal = Journal::in_memory();
        let saved = journal
            .save_transaction(CreateTransactionInput {
                kind: None,
                amount: Some(10.0),
                note: Some("top up".into()),
            })
            .unwrap();
        assert_eq!(saved.record.kind, TransactionType::Deposit);
        assert_eq!(saved.record.note, "top up");
    }

    #[test]
    fn test_failed_write_leaves_store_untouched() {
        let (mut journal, disk) = flaky_journal();
        disk.break_key("transactions");

        assert!(journal.save_transaction(input(TransactionType::Deposit, 100.0)).is_err());
        assert!(journal.transactions().is_empty());
        assert_eq!(journal.gamification().xp, 0);
    }
}
