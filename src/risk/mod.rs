//! Transfer risk evaluation
//!
//! Every registered check runs against the proposed transfer, the account's
//! history and its balance. Nothing is short-circuited, so the caller always
//! gets the full list of results. Evaluation is a pure function of its inputs:
//! the evaluation instant is passed in rather than read from the clock.

pub mod checks;

pub use checks::{
    AmountClassificationCheck, BalanceCheck, FraudPatternCheck, VelocityCheck,
    AMOUNT_CLASSIFICATION, BALANCE_CHECK, FRAUD_PATTERN_CHECK, VELOCITY_CHECK,
};

use crate::config::RiskConfig;
use crate::error::AssistantError;
use crate::models::{Decision, Evaluation, SecurityCheckResult, Transaction, TransferRequest};
use crate::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Largest number of decimal places a currency amount may carry
const CURRENCY_SCALE: u32 = 2;

/// Everything a check may look at
pub struct CheckContext<'a> {
    pub request: &'a TransferRequest,
    pub history: &'a [Transaction],
    pub balance: Decimal,
    pub now: DateTime<Utc>,
}

/// Trait for a single security check
pub trait SecurityCheck: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &CheckContext<'_>) -> SecurityCheckResult;
}

/// Runs the security checks and aggregates their verdicts
pub struct RiskEvaluator {
    checks: Vec<Box<dyn SecurityCheck>>,
}

impl RiskEvaluator {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Evaluator with the four standard checks in reporting order
    pub fn with_config(config: &RiskConfig) -> Self {
        let mut evaluator = Self::new();
        evaluator.add_check(Box::new(AmountClassificationCheck::new(config)));
        evaluator.add_check(Box::new(FraudPatternCheck::new(config)));
        evaluator.add_check(Box::new(BalanceCheck));
        evaluator.add_check(Box::new(VelocityCheck::new(config)));
        evaluator
    }

    pub fn add_check(&mut self, check: Box<dyn SecurityCheck>) {
        self.checks.push(check);
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Evaluate a proposed transfer.
    ///
    /// Returns `InvalidInput` when the amount or the history cannot be
    /// trusted; such requests are neither allowed nor blocked.
    pub fn evaluate(
        &self,
        request: &TransferRequest,
        history: &[Transaction],
        balance: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Evaluation> {
        validate_amount(request.amount)?;
        validate_history(history, now)?;

        let ctx = CheckContext {
            request,
            history,
            balance,
            now,
        };

        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let result = check.run(&ctx);
            debug!(
                check = check.name(),
                status = %result.status,
                details = %result.details,
                "Security check evaluated"
            );
            results.push(result);
        }

        let decision = if results.iter().any(|r| r.is_blocking) {
            Decision::Block
        } else {
            Decision::Allow
        };

        match decision {
            Decision::Allow => info!(
                amount = %request.amount,
                bank = %request.bank_name,
                check_count = results.len(),
                "Transfer allowed"
            ),
            Decision::Block => warn!(
                amount = %request.amount,
                bank = %request.bank_name,
                blocking = ?results
                    .iter()
                    .filter(|r| r.is_blocking)
                    .map(|r| r.check_name.as_str())
                    .collect::<Vec<_>>(),
                "Transfer blocked"
            ),
        }

        Ok(Evaluation {
            decision,
            checks: results,
            evaluated_at: now,
        })
    }
}

impl Default for RiskEvaluator {
    fn default() -> Self {
        Self::with_config(&RiskConfig::default())
    }
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(AssistantError::InvalidInput(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    if amount.normalize().scale() > CURRENCY_SCALE {
        return Err(AssistantError::InvalidInput(format!(
            "amount {} has more than {} decimal places",
            amount, CURRENCY_SCALE
        )));
    }
    Ok(())
}

/// History must be chronological and must not contain future timestamps
fn validate_history(history: &[Transaction], now: DateTime<Utc>) -> Result<()> {
    if let Some(future) = history.iter().find(|t| t.timestamp > now) {
        return Err(AssistantError::InvalidInput(format!(
            "transaction {} is dated {} which is after the evaluation time {}",
            future.transaction_id, future.timestamp, now
        )));
    }

    if let Some(pair) = history
        .windows(2)
        .find(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        return Err(AssistantError::InvalidInput(format!(
            "transaction history is out of order at {}",
            pair[1].transaction_id
        )));
    }

    Ok(())
}

/// Parse a user-supplied amount such as `"₦25,000"` or `"NGN 1500000.50"`
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    let without_prefix = trimmed
        .strip_prefix('₦')
        .or_else(|| trimmed.strip_prefix("NGN"))
        .or_else(|| trimmed.strip_prefix("ngn"))
        .unwrap_or(trimmed)
        .trim();
    if without_prefix.is_empty() {
        return Err(AssistantError::InvalidInput(
            "amount is empty".to_string(),
        ));
    }

    let cleaned = strip_thousands_separators(without_prefix).ok_or_else(|| {
        AssistantError::InvalidInput(format!("amount {:?} has misplaced commas", raw))
    })?;

    Decimal::from_str(&cleaned).map_err(|_| {
        AssistantError::InvalidInput(format!("amount {:?} is not a number", raw))
    })
}

/// Commas are only accepted between groups of three digits in the integer
/// part, e.g. `1,500,000.50`
fn strip_thousands_separators(amount: &str) -> Option<String> {
    if !amount.contains(',') {
        return Some(amount.to_string());
    }

    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (amount, None),
    };
    if fraction.map_or(false, |f| f.contains(',')) {
        return None;
    }

    let mut groups = integer.split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !first.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }

    if let Some(fraction) = fraction {
        digits.push('.');
        digits.push_str(fraction);
    }
    Some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckStatus, TransactionStatus};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn past(amount: Decimal, ago: Duration) -> Transaction {
        TransferRequest::new("Access Bank", "2222222222", amount, "past transfer")
            .to_transaction(TransactionStatus::Completed, vec![], now() - ago)
    }

    fn evaluator() -> RiskEvaluator {
        RiskEvaluator::default()
    }

    #[test]
    fn test_checks_registered_in_order() {
        assert_eq!(
            evaluator().check_names(),
            vec![AMOUNT_CLASSIFICATION, FRAUD_PATTERN_CHECK, BALANCE_CHECK, VELOCITY_CHECK]
        );
    }

    #[test]
    fn test_excessive_amount_scenario() {
        let request = TransferRequest::new("GTBank", "0123456789", dec!(1500000), "rent");
        let evaluation = evaluator()
            .evaluate(&request, &[], dec!(2500000), now())
            .unwrap();

        assert_eq!(evaluation.decision, Decision::Block);
        let amount = evaluation.check(AMOUNT_CLASSIFICATION).unwrap();
        assert_eq!(amount.details, "Blocked (excessive amount)");
        assert!(amount.is_blocking);

        // Only the amount classification blocks; the round-amount warning is advisory
        assert_eq!(evaluation.blocking_checks().count(), 1);
        assert_eq!(evaluation.check(BALANCE_CHECK).unwrap().status, CheckStatus::Passed);
        assert_eq!(evaluation.check(VELOCITY_CHECK).unwrap().status, CheckStatus::Passed);
        assert!(!evaluation.check(FRAUD_PATTERN_CHECK).unwrap().is_blocking);
    }

    #[test]
    fn test_blank_bank_scenario() {
        let request = TransferRequest::new("", "0123456789", dec!(25000), "school fees");
        let evaluation = evaluator()
            .evaluate(&request, &[], dec!(2500000), now())
            .unwrap();

        assert_eq!(evaluation.decision, Decision::Block);
        let fraud = evaluation.check(FRAUD_PATTERN_CHECK).unwrap();
        assert_eq!(fraud.status, CheckStatus::Blocked);
        assert_eq!(fraud.details, "Blocked (invalid bank)");
    }

    #[test]
    fn test_high_value_allowed_scenario() {
        let request = TransferRequest::new("UBA", "1111111111", dec!(600000), "car");
        let evaluation = evaluator()
            .evaluate(&request, &[], dec!(2500000), now())
            .unwrap();

        assert_eq!(evaluation.decision, Decision::Allow);
        let amount = evaluation.check(AMOUNT_CLASSIFICATION).unwrap();
        assert_eq!(amount.details, "High value");
        assert!(!amount.is_blocking);
    }

    #[test]
    fn test_excessive_amount_blocked_regardless_of_history() {
        let history: Vec<_> = (1..=3)
            .rev()
            .map(|d| past(dec!(1000), Duration::days(d * 40)))
            .collect();

        for amount in [dec!(1000000), dec!(1000000.01), dec!(9999999)] {
            let request = TransferRequest::new("GTBank", "0123456789", amount, "");
            let evaluation = evaluator()
                .evaluate(&request, &history, dec!(50000000), now())
                .unwrap();
            assert_eq!(
                evaluation.check(AMOUNT_CLASSIFICATION).unwrap().status,
                CheckStatus::Blocked
            );
            assert_eq!(evaluation.decision, Decision::Block);
        }
    }

    #[test]
    fn test_insufficient_funds_always_blocks() {
        let request = TransferRequest::new("Zenith", "0123456789", dec!(10001), "");
        let evaluation = evaluator()
            .evaluate(&request, &[], dec!(10000), now())
            .unwrap();

        assert_eq!(evaluation.decision, Decision::Block);
        let balance = evaluation.check(BALANCE_CHECK).unwrap();
        assert_eq!(balance.details, "Blocked (insufficient funds)");
        assert_eq!(evaluation.blocking_checks().count(), 1);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let history = vec![past(dec!(7000), Duration::minutes(30))];
        let request = TransferRequest::new("Zenith", "0123456789", dec!(7000), "");
        let e = evaluator();

        let first = e.evaluate(&request, &history, dec!(100000), now()).unwrap();
        let second = e.evaluate(&request, &history, dec!(100000), now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_checks_reported_when_several_block() {
        let request = TransferRequest::new("unknown bank", "12345", dec!(2000000), "");
        let evaluation = evaluator()
            .evaluate(&request, &[], dec!(100), now())
            .unwrap();

        assert_eq!(evaluation.checks.len(), 4);
        assert_eq!(evaluation.blocking_checks().count(), 3);
    }

    #[test]
    fn test_invalid_amounts_are_input_errors() {
        for amount in [dec!(0), dec!(-50), dec!(10.001)] {
            let request = TransferRequest::new("GTBank", "0123456789", amount, "");
            let err = evaluator()
                .evaluate(&request, &[], dec!(1000), now())
                .unwrap_err();
            assert!(matches!(err, AssistantError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_future_history_cannot_be_evaluated() {
        let mut tx = past(dec!(100), Duration::minutes(5));
        tx.timestamp = now() + Duration::minutes(5);

        let request = TransferRequest::new("GTBank", "0123456789", dec!(100), "");
        let err = evaluator()
            .evaluate(&request, &[tx], dec!(1000), now())
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_unordered_history_cannot_be_evaluated() {
        let history = vec![
            past(dec!(100), Duration::minutes(5)),
            past(dec!(100), Duration::minutes(50)),
        ];

        let request = TransferRequest::new("GTBank", "0123456789", dec!(100), "");
        let err = evaluator()
            .evaluate(&request, &history, dec!(1000), now())
            .unwrap_err();
        assert!(matches!(err, AssistantError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("25000").unwrap(), dec!(25000));
        assert_eq!(parse_amount(" ₦1,500,000 ").unwrap(), dec!(1500000));
        assert_eq!(parse_amount("NGN 600,000.50").unwrap(), dec!(600000.50));
        assert!(matches!(
            parse_amount("twenty thousand"),
            Err(AssistantError::InvalidInput(_))
        ));
        assert!(parse_amount("  ").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_misplaced_commas() {
        assert_eq!(parse_amount("999,999.99").unwrap(), dec!(999999.99));
        assert_eq!(parse_amount("1,000").unwrap(), dec!(1000));

        for raw in ["25,00", "1,2,3", "1,5", ",500", "1000,000", "1,000,00", "1,000.5,0", "-1,000", "1,"] {
            assert!(
                matches!(parse_amount(raw), Err(AssistantError::InvalidInput(_))),
                "{} should be rejected",
                raw
            );
        }
    }
}
