//! Account storage
//!
//! Accounts live behind their own mutex so that a read-evaluate-commit
//! sequence can hold one account exclusively while other accounts proceed.
//! Currently in-memory; the trait is the seam for a persistent backend.

use crate::error::AssistantError;
use crate::models::{Account, AccountSnapshot, TransactionStatus, TransferRequest};
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Exclusive access to one account
pub type AccountHandle = Arc<Mutex<Account>>;

/// Trait for account persistence
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: Account) -> Result<()>;
    async fn get(&self, account_id: &str) -> Result<AccountSnapshot>;
    async fn handle(&self, account_id: &str) -> Result<AccountHandle>;
    async fn list_ids(&self) -> Result<Vec<String>>;
}

/// In-memory account store for development and the demo binary
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<String, AccountHandle>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {

    async fn insert(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&account.account_id) {
            return Err(AssistantError::InvalidInput(format!(
                "account {} already exists",
                account.account_id
            )));
        }

        accounts.insert(account.account_id.clone(), Arc::new(Mutex::new(account)));
        Ok(())
    }

    async fn get(&self, account_id: &str) -> Result<AccountSnapshot> {
        let handle = self.handle(account_id).await?;
        let account = handle.lock().await;
        Ok(account.snapshot())
    }

    async fn handle(&self, account_id: &str) -> Result<AccountHandle> {
        // Outer map lock is released before the caller locks the account
        let accounts = self.accounts.read().await;
        accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| AssistantError::AccountNotFound(account_id.to_string()))
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let accounts = self.accounts.read().await;
        let mut ids: Vec<String> = accounts.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// Demo account: 2,500,000 balance and a few transfers well outside the
/// 30-day and 1-hour windows
pub fn seed_demo_account(
    account_id: &str,
    holder_name: &str,
    now: DateTime<Utc>,
) -> Result<Account> {
    let history = vec![
        TransferRequest::new("GTBank", "0123456789", dec!(15000), "Electricity bill")
            .to_transaction(TransactionStatus::Completed, vec![], now - Duration::days(45)),
        TransferRequest::new("Access Bank", "0987654321", dec!(250000), "Rent contribution")
            .to_transaction(TransactionStatus::Completed, vec![], now - Duration::days(40)),
        TransferRequest::new("Zenith Bank", "1122334455", dec!(7500), "Data subscription")
            .to_transaction(TransactionStatus::Completed, vec![], now - Duration::days(35)),
    ];

    Account::restore(account_id, holder_name, dec!(2500000), history)
}
