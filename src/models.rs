//! Core data models for the banking assistant

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Blocked,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Warning,
    Blocked,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Block,
}

//
// ================= Account =================
//

/// A single user's account. Balance only changes through `Account::commit`.
/// Deserializing goes through `Account::restore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AccountSnapshot")]
pub struct Account {
    pub account_id: String,
    pub holder_name: String,
    pub(crate) balance: Decimal,
    /// Insertion order is chronological order
    pub(crate) transactions: Vec<Transaction>,
}

/// Read-only view of an account at a point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub holder_name: String,
    pub balance: Decimal,
    pub transactions: Vec<Transaction>,
}

//
// ================= Transaction =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub bank_name: String,
    pub account_number: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    pub description: String,
    #[serde(default)]
    pub security_checks: Vec<SecurityCheckResult>,
}

/// A proposed transfer out of the current account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferRequest {
    pub bank_name: String,
    pub account_number: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

impl TransferRequest {
    pub fn new(
        bank_name: impl Into<String>,
        account_number: impl Into<String>,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            bank_name: bank_name.into(),
            account_number: account_number.into(),
            amount,
            description: description.into(),
        }
    }

    /// Build the transaction record this request would produce
    pub fn to_transaction(
        &self,
        status: TransactionStatus,
        security_checks: Vec<SecurityCheckResult>,
        timestamp: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            transaction_id: Uuid::new_v4(),
            bank_name: self.bank_name.clone(),
            account_number: self.account_number.clone(),
            amount: self.amount,
            timestamp,
            status,
            description: self.description.clone(),
            security_checks,
        }
    }
}

//
// ================= Security Checks =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityCheckResult {
    pub check_name: String,
    pub status: CheckStatus,
    pub details: String,
    pub is_blocking: bool,
}

impl SecurityCheckResult {
    pub fn passed(check_name: &str, details: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            status: CheckStatus::Passed,
            details: details.into(),
            is_blocking: false,
        }
    }

    pub fn warning(check_name: &str, details: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            status: CheckStatus::Warning,
            details: details.into(),
            is_blocking: false,
        }
    }

    pub fn blocked(check_name: &str, details: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            status: CheckStatus::Blocked,
            details: details.into(),
            is_blocking: true,
        }
    }
}

/// Outcome of running every security check against one transfer request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    pub checks: Vec<SecurityCheckResult>,
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }

    /// Checks that triggered a block, in evaluation order
    pub fn blocking_checks(&self) -> impl Iterator<Item = &SecurityCheckResult> {
        self.checks.iter().filter(|c| c.is_blocking)
    }

    pub fn check(&self, check_name: &str) -> Option<&SecurityCheckResult> {
        self.checks.iter().find(|c| c.check_name == check_name)
    }
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Blocked => "Blocked",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckStatus::Passed => "Passed",
            CheckStatus::Warning => "Warning",
            CheckStatus::Blocked => "Blocked",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Allow => "Allow",
            Decision::Block => "Block",
        };
        write!(f, "{}", s)
    }
}
