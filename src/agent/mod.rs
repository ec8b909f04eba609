//! Banking agent - runs transfers end to end
//!
//! LOCK → SNAPSHOT → EVALUATE → COMMIT? → AUDIT
//!
//! The account stays locked from the moment its history is read until the
//! transfer is committed or rejected, so two requests can never both pass the
//! balance check against the same stale balance.

use crate::audit::{AuditLog, AuditRecord};
use crate::models::{
    AccountSnapshot, CheckStatus, Decision, Evaluation, Transaction, TransactionStatus,
    TransferRequest,
};
use crate::risk::RiskEvaluator;
use crate::store::AccountStore;
use crate::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of one transfer attempt, allowed or blocked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub audit_id: Uuid,
    pub evaluation: Evaluation,
    /// Completed if committed, Blocked otherwise
    pub transaction: Transaction,
    pub balance_after: Decimal,
}

impl TransferOutcome {
    pub fn is_completed(&self) -> bool {
        self.transaction.status == TransactionStatus::Completed
    }
}

/// Coordinates evaluator, account store and audit trail
pub struct BankingAgent {
    evaluator: RiskEvaluator,
    store: Arc<dyn AccountStore>,
    audit_log: AuditLog,
}

impl BankingAgent {
    pub fn new(
        evaluator: RiskEvaluator,
        store: Arc<dyn AccountStore>,
        audit_log: AuditLog,
    ) -> Self {
        Self {
            evaluator,
            store,
            audit_log,
        }
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_log
    }

    /// Evaluate and, if allowed, commit a transfer out of `account_id`
    pub async fn transfer(
        &self,
        account_id: &str,
        request: TransferRequest,
    ) -> Result<TransferOutcome> {
        let handle = self.store.handle(account_id).await?;

        let (evaluation, transaction, balance_after) = {
            let mut account = handle.lock().await;
            let now = Utc::now();

            let evaluation = self.evaluator.evaluate(
                &request,
                account.transactions(),
                account.balance(),
                now,
            )?;

            let transaction = match evaluation.decision {
                Decision::Allow => account.commit(&request, evaluation.checks.clone(), now)?,
                Decision::Block => request.to_transaction(
                    TransactionStatus::Blocked,
                    evaluation.checks.clone(),
                    now,
                ),
            };

            (evaluation, transaction, account.balance())
        };

        let record = AuditRecord::new(
            account_id,
            evaluation.decision,
            transaction.clone(),
            balance_after,
        );
        let audit_id = self.audit_log.record(record).await?;

        if evaluation.is_allowed() {
            info!(
                account_id,
                transaction_id = %transaction.transaction_id,
                amount = %transaction.amount,
                balance_after = %balance_after,
                "Transfer completed"
            );
        } else {
            warn!(
                account_id,
                transaction_id = %transaction.transaction_id,
                amount = %transaction.amount,
                "Transfer rejected"
            );
        }

        Ok(TransferOutcome {
            audit_id,
            evaluation,
            transaction,
            balance_after,
        })
    }

    /// Run the checks without committing or auditing
    pub async fn preview(&self, account_id: &str, request: &TransferRequest) -> Result<Evaluation> {
        let handle = self.store.handle(account_id).await?;
        let account = handle.lock().await;

        let evaluation = self.evaluator.evaluate(
            request,
            account.transactions(),
            account.balance(),
            Utc::now(),
        )?;
        Ok(evaluation)
    }

    pub async fn account_summary(&self, account_id: &str) -> Result<AccountSnapshot> {
        self.store.get(account_id).await
    }

    /// Newest first
    pub async fn recent_transactions(
        &self,
        account_id: &str,
        count: usize,
    ) -> Result<Vec<Transaction>> {
        let handle = self.store.handle(account_id).await?;
        let account = handle.lock().await;
        let transactions: Vec<Transaction> = account.recent_transactions(count).cloned().collect();
        Ok(transactions)
    }
}

/// Conversational summary of a transfer attempt
pub fn narrate(outcome: &TransferOutcome) -> String {
    let tx = &outcome.transaction;
    let mut out = String::new();

    if outcome.is_completed() {
        out.push_str(&format!(
            "✅ Your transfer of {} to {} ({}) went through. Your new balance is {}.\n",
            format_naira(tx.amount),
            tx.bank_name,
            tx.account_number,
            format_naira(outcome.balance_after),
        ));
    } else {
        let bank = if tx.bank_name.trim().is_empty() {
            "an unnamed bank"
        } else {
            tx.bank_name.as_str()
        };
        out.push_str(&format!(
            "🚫 I couldn't send {} to {} ({}). Your balance is unchanged at {}.\n",
            format_naira(tx.amount),
            bank,
            tx.account_number,
            format_naira(outcome.balance_after),
        ));

        let reasons: Vec<String> = outcome
            .evaluation
            .blocking_checks()
            .map(|c| format!("{}: {}", c.check_name, c.details))
            .collect();
        out.push_str(&format!("Reason: {}\n", reasons.join("; ")));
    }

    out.push_str("\nSecurity checks:\n");
    for check in &outcome.evaluation.checks {
        let icon = match check.status {
            CheckStatus::Passed => "✔",
            CheckStatus::Warning => "⚠️",
            CheckStatus::Blocked => "✖",
        };
        out.push_str(&format!("  {} {}: {}\n", icon, check.check_name, check.details));
    }

    out
}

/// `₦1,900,000.00`
pub fn format_naira(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}₦{}.{}", if negative { "-" } else { "" }, grouped, frac)
}
