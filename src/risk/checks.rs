//! The four standard transfer checks

use super::{CheckContext, SecurityCheck};
use crate::config::RiskConfig;
use crate::models::SecurityCheckResult;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

pub const AMOUNT_CLASSIFICATION: &str = "Amount Classification";
pub const FRAUD_PATTERN_CHECK: &str = "Fraud Pattern Check";
pub const BALANCE_CHECK: &str = "Balance Check";
pub const VELOCITY_CHECK: &str = "Velocity Check";

/// Bank names containing this marker are treated as unverifiable
const UNKNOWN_BANK_MARKER: &str = "unknown";

/// Window membership is inclusive of the boundary instant. A window reaching
/// past the earliest representable instant covers all history.
fn within_window(timestamp: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    let after_start = match now.checked_sub_signed(window) {
        Some(start) => timestamp >= start,
        None => true,
    };
    after_start && timestamp <= now
}

//
// ================= Amount Classification =================
//

/// Coarse risk tier from the amount and recent repeats of the same amount
pub struct AmountClassificationCheck {
    max_transfer_amount: Decimal,
    high_value_amount: Decimal,
    repeat_amount_limit: usize,
    repeat_window: Duration,
}

impl AmountClassificationCheck {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            max_transfer_amount: config.max_transfer_amount,
            high_value_amount: config.high_value_amount,
            repeat_amount_limit: config.repeat_amount_limit,
            repeat_window: config.repeat_window,
        }
    }
}

impl SecurityCheck for AmountClassificationCheck {
    fn name(&self) -> &'static str {
        AMOUNT_CLASSIFICATION
    }

    fn run(&self, ctx: &CheckContext<'_>) -> SecurityCheckResult {
        let amount = ctx.request.amount;

        if amount >= self.max_transfer_amount {
            return SecurityCheckResult::blocked(self.name(), "Blocked (excessive amount)");
        }

        let repeats = ctx
            .history
            .iter()
            .filter(|t| t.amount == amount)
            .filter(|t| within_window(t.timestamp, ctx.now, self.repeat_window))
            .count();

        if repeats >= self.repeat_amount_limit {
            return SecurityCheckResult::blocked(self.name(), "Blocked (repeated amount pattern)");
        }

        if amount >= self.high_value_amount {
            SecurityCheckResult::passed(self.name(), "High value")
        } else {
            SecurityCheckResult::passed(self.name(), "Normal")
        }
    }
}

//
// ================= Fraud Pattern =================
//

/// Destination sanity and round-amount heuristics. First matching rule wins.
pub struct FraudPatternCheck {
    account_number_length: usize,
    round_amount_unit: Decimal,
    round_amount_floor: Decimal,
}

impl FraudPatternCheck {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            account_number_length: config.account_number_length,
            round_amount_unit: config.round_amount_unit,
            round_amount_floor: config.round_amount_floor,
        }
    }

    fn is_valid_bank(bank_name: &str) -> bool {
        let bank = bank_name.trim();
        !bank.is_empty() && !bank.to_lowercase().contains(UNKNOWN_BANK_MARKER)
    }

    fn is_valid_account_number(&self, account_number: &str) -> bool {
        account_number.chars().count() == self.account_number_length
            && account_number.chars().all(|c| c.is_ascii_digit())
    }

    fn is_round_amount(&self, amount: Decimal) -> bool {
        amount > self.round_amount_floor && (amount % self.round_amount_unit).is_zero()
    }
}

impl SecurityCheck for FraudPatternCheck {
    fn name(&self) -> &'static str {
        FRAUD_PATTERN_CHECK
    }

    fn run(&self, ctx: &CheckContext<'_>) -> SecurityCheckResult {
        let request = ctx.request;

        if !Self::is_valid_bank(&request.bank_name) {
            return SecurityCheckResult::blocked(self.name(), "Blocked (invalid bank)");
        }

        if !self.is_valid_account_number(&request.account_number) {
            return SecurityCheckResult::blocked(self.name(), "Blocked (invalid account number)");
        }

        if self.is_round_amount(request.amount) {
            return SecurityCheckResult::warning(self.name(), "Warning (round amount pattern)");
        }

        SecurityCheckResult::passed(self.name(), "Passed")
    }
}

//
// ================= Balance =================
//

pub struct BalanceCheck;

impl SecurityCheck for BalanceCheck {
    fn name(&self) -> &'static str {
        BALANCE_CHECK
    }

    fn run(&self, ctx: &CheckContext<'_>) -> SecurityCheckResult {
        if ctx.request.amount > ctx.balance {
            SecurityCheckResult::blocked(self.name(), "Blocked (insufficient funds)")
        } else {
            SecurityCheckResult::passed(self.name(), "Sufficient")
        }
    }
}

//
// ================= Velocity =================
//

/// Rate limit on transfers inside a trailing window
pub struct VelocityCheck {
    limit: usize,
    window: Duration,
}

impl VelocityCheck {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            limit: config.velocity_limit,
            window: config.velocity_window,
        }
    }
}

impl SecurityCheck for VelocityCheck {
    fn name(&self) -> &'static str {
        VELOCITY_CHECK
    }

    fn run(&self, ctx: &CheckContext<'_>) -> SecurityCheckResult {
        let count = ctx
            .history
            .iter()
            .filter(|t| within_window(t.timestamp, ctx.now, self.window))
            .count();

        if count >= self.limit {
            SecurityCheckResult::blocked(self.name(), "Blocked (exceeded hourly limit)")
        } else {
            SecurityCheckResult::passed(self.name(), format!("Passed ({}/{})", count, self.limit))
        }
    }
}
