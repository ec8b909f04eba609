//! Account ledger
//!
//! Holds one account's balance and ordered transaction history. The only way
//! to move the balance is `commit`, which applies a transfer in one step or
//! not at all.

use crate::error::AssistantError;
use crate::models::{
    Account, AccountSnapshot, SecurityCheckResult, Transaction, TransactionStatus,
    TransferRequest,
};
use crate::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

impl Account {
    pub fn new(
        account_id: impl Into<String>,
        holder_name: impl Into<String>,
        opening_balance: Decimal,
    ) -> Result<Self> {
        Self::restore(account_id, holder_name, opening_balance, Vec::new())
    }

    /// Rebuild an account from previously recorded state
    pub fn restore(
        account_id: impl Into<String>,
        holder_name: impl Into<String>,
        balance: Decimal,
        transactions: Vec<Transaction>,
    ) -> Result<Self> {
        let account_id = account_id.into();

        if balance < Decimal::ZERO {
            return Err(AssistantError::InvalidInput(format!(
                "account {} cannot open with a negative balance",
                account_id
            )));
        }
        if transactions
            .windows(2)
            .any(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(AssistantError::InvalidInput(format!(
                "account {} history is not in chronological order",
                account_id
            )));
        }

        Ok(Self {
            account_id,
            holder_name: holder_name.into(),
            balance,
            transactions,
        })
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Newest first
    pub fn recent_transactions(&self, count: usize) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().rev().take(count)
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            account_id: self.account_id.clone(),
            holder_name: self.holder_name.clone(),
            balance: self.balance,
            transactions: self.transactions.clone(),
        }
    }

    /// Apply an approved transfer.
    ///
    /// Refuses with `LedgerInconsistency` if the balance would go negative,
    /// even though the balance check should already have blocked it. On error
    /// the account is left untouched.
    pub fn commit(
        &mut self,
        request: &TransferRequest,
        security_checks: Vec<SecurityCheckResult>,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        if request.amount <= Decimal::ZERO {
            return Err(AssistantError::InvalidInput(format!(
                "cannot commit a non-positive amount {}",
                request.amount
            )));
        }

        if request.amount > self.balance {
            warn!(
                account_id = %self.account_id,
                amount = %request.amount,
                balance = %self.balance,
                "Commit refused: balance would go negative"
            );
            return Err(AssistantError::LedgerInconsistency(format!(
                "transfer of {} exceeds balance {} on account {}",
                request.amount, self.balance, self.account_id
            )));
        }

        if let Some(last) = self.transactions.last() {
            if now < last.timestamp {
                return Err(AssistantError::LedgerInconsistency(format!(
                    "commit time {} precedes last recorded transaction at {}",
                    now, last.timestamp
                )));
            }
        }

        let transaction =
            request.to_transaction(TransactionStatus::Completed, security_checks, now);

        self.balance -= request.amount;
        self.transactions.push(transaction.clone());

        debug!(
            account_id = %self.account_id,
            transaction_id = %transaction.transaction_id,
            balance = %self.balance,
            "Transfer committed"
        );

        Ok(transaction)
    }
}

impl TryFrom<AccountSnapshot> for Account {
    type Error = AssistantError;

    fn try_from(snapshot: AccountSnapshot) -> Result<Self> {
        Self::restore(
            snapshot.account_id,
            snapshot.holder_name,
            snapshot.balance,
            snapshot.transactions,
        )
    }
}
