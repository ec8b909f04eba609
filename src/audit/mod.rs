//! Audit trail of transfer decisions
//!
//! Every evaluated transfer is recorded, allowed or not. Blocked attempts never
//! reach the ledger, so this is the only place they are kept.

use crate::models::{Decision, Transaction};
use crate::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: Uuid,
    pub account_id: String,
    pub decision: Decision,
    /// Completed when committed, Blocked otherwise; carries the check results
    pub transaction: Transaction,
    pub balance_after: Decimal,
    pub integrity_hash: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        account_id: impl Into<String>,
        decision: Decision,
        transaction: Transaction,
        balance_after: Decimal,
    ) -> Self {
        let mut record = Self {
            audit_id: Uuid::new_v4(),
            account_id: account_id.into(),
            decision,
            transaction,
            balance_after,
            integrity_hash: String::new(),
            recorded_at: Utc::now(),
        };
        record.integrity_hash = compute_record_hash(&record);
        record
    }
}

/// Every record field except the hash itself
#[derive(Serialize)]
struct HashedFields<'a> {
    audit_id: &'a Uuid,
    account_id: &'a str,
    decision: &'a Decision,
    transaction: &'a Transaction,
    balance_after: &'a Decimal,
    recorded_at: &'a DateTime<Utc>,
}

/// Audit trail storage
pub struct AuditLog {
    records: Arc<RwLock<HashMap<Uuid, AuditRecord>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a record
    pub async fn record(&self, record: AuditRecord) -> Result<Uuid> {
        let audit_id = record.audit_id;
        let mut records = self.records.write().await;
        records.insert(audit_id, record);
        Ok(audit_id)
    }

    pub async fn get(&self, audit_id: Uuid) -> Result<Option<AuditRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&audit_id).cloned())
    }

    /// All records for an account, oldest transaction first
    pub async fn list_for_account(&self, account_id: &str) -> Result<Vec<AuditRecord>> {
        let records = self.records.read().await;

        let mut items: Vec<AuditRecord> = records
            .values()
            .filter(|record| record.account_id == account_id)
            .cloned()
            .collect();

        items.sort_by_key(|record| (record.transaction.timestamp, record.recorded_at));

        Ok(items)
    }

    /// Recompute the hash of a stored record and compare
    pub async fn verify_integrity(&self, audit_id: Uuid) -> Result<bool> {
        let records = self.records.read().await;

        if let Some(record) = records.get(&audit_id) {
            let current_hash = compute_record_hash(record);
            Ok(current_hash == record.integrity_hash)
        } else {
            Ok(false)
        }
    }

    #[cfg(test)]
    async fn tamper(&self, audit_id: Uuid, edit: impl FnOnce(&mut AuditRecord)) {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&audit_id) {
            edit(record);
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 of a record's JSON form, streamed into the hasher
pub fn compute_record_hash(record: &AuditRecord) -> String {
    let fields = HashedFields {
        audit_id: &record.audit_id,
        account_id: &record.account_id,
        decision: &record.decision,
        transaction: &record.transaction,
        balance_after: &record.balance_after,
        recorded_at: &record.recorded_at,
    };
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), &fields).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
