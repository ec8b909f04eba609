//! Runtime configuration
//!
//! Thresholds default to the bank's published transfer policy and can be
//! overridden through environment variables (a `.env` file is honoured).

use crate::error::AssistantError;
use crate::Result;
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

/// Longest trailing window either check may look back over
const MAX_WINDOW_DAYS: i64 = 3650;

/// Thresholds used by the security checks
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    /// Transfers at or above this amount are always blocked
    pub max_transfer_amount: Decimal,
    /// Transfers at or above this amount are tagged "High value"
    pub high_value_amount: Decimal,
    /// Identical prior amounts inside `repeat_window` that trigger a block
    pub repeat_amount_limit: usize,
    pub repeat_window: Duration,
    /// Round-amount warning fires for exact multiples of this unit...
    pub round_amount_unit: Decimal,
    /// ...strictly above this floor
    pub round_amount_floor: Decimal,
    pub account_number_length: usize,
    /// Transfers allowed inside `velocity_window` before blocking
    pub velocity_limit: usize,
    pub velocity_window: Duration,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_transfer_amount: dec!(1000000),
            high_value_amount: dec!(500000),
            repeat_amount_limit: 3,
            repeat_window: Duration::days(30),
            round_amount_unit: dec!(1000),
            round_amount_floor: dec!(50000),
            account_number_length: 10,
            velocity_limit: 5,
            velocity_window: Duration::hours(1),
        }
    }
}

impl RiskConfig {
    /// Load from process environment, falling back to defaults per key
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            max_transfer_amount: read_or(&lookup, "ASSISTANT_MAX_TRANSFER_AMOUNT", defaults.max_transfer_amount)?,
            high_value_amount: read_or(&lookup, "ASSISTANT_HIGH_VALUE_AMOUNT", defaults.high_value_amount)?,
            repeat_amount_limit: read_or(&lookup, "ASSISTANT_REPEAT_AMOUNT_LIMIT", defaults.repeat_amount_limit)?,
            repeat_window: read_window(&lookup, "ASSISTANT_REPEAT_WINDOW_DAYS", 30, Duration::try_days)?,
            round_amount_unit: read_or(&lookup, "ASSISTANT_ROUND_AMOUNT_UNIT", defaults.round_amount_unit)?,
            round_amount_floor: read_or(&lookup, "ASSISTANT_ROUND_AMOUNT_FLOOR", defaults.round_amount_floor)?,
            account_number_length: read_or(&lookup, "ASSISTANT_ACCOUNT_NUMBER_LENGTH", defaults.account_number_length)?,
            velocity_limit: read_or(&lookup, "ASSISTANT_VELOCITY_LIMIT", defaults.velocity_limit)?,
            velocity_window: read_window(&lookup, "ASSISTANT_VELOCITY_WINDOW_MINUTES", 60, Duration::try_minutes)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.high_value_amount > self.max_transfer_amount {
            return Err(AssistantError::ConfigError(
                "high value amount must not exceed the maximum transfer amount".to_string(),
            ));
        }
        if self.round_amount_unit <= Decimal::ZERO {
            return Err(AssistantError::ConfigError(
                "round amount unit must be positive".to_string(),
            ));
        }
        if self.velocity_limit == 0 || self.account_number_length == 0 {
            return Err(AssistantError::ConfigError(
                "velocity limit and account number length must be non-zero".to_string(),
            ));
        }
        if self.repeat_window <= Duration::zero() || self.velocity_window <= Duration::zero() {
            return Err(AssistantError::ConfigError(
                "time windows must be positive".to_string(),
            ));
        }
        let max_window = Duration::days(MAX_WINDOW_DAYS);
        if self.repeat_window > max_window || self.velocity_window > max_window {
            return Err(AssistantError::ConfigError(format!(
                "time windows must not exceed {} days",
                MAX_WINDOW_DAYS
            )));
        }
        Ok(())
    }
}

/// Application-level settings for the demo binary
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub risk: RiskConfig,
    pub demo_account_id: String,
    pub demo_holder_name: String,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            risk: RiskConfig::from_env()?,
            demo_account_id: env::var("ASSISTANT_DEMO_ACCOUNT")
                .unwrap_or_else(|_| "ACC-001".to_string()),
            demo_holder_name: env::var("ASSISTANT_DEMO_HOLDER")
                .unwrap_or_else(|_| "Adaeze Okafor".to_string()),
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn read_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            AssistantError::ConfigError(format!("{} has an unparseable value: {:?}", key, raw))
        }),
        None => Ok(default),
    }
}

fn read_window<F>(
    lookup: &F,
    key: &str,
    default: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let value = read_or(lookup, key, default)?;
    to_duration(value).ok_or_else(|| {
        AssistantError::ConfigError(format!("{} is out of range: {}", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RiskConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, RiskConfig::default());
        assert_eq!(config.max_transfer_amount, dec!(1000000));
        assert_eq!(config.velocity_window, Duration::hours(1));
    }

    #[test]
    fn test_overrides() {
        let config = RiskConfig::from_lookup(lookup_from(&[
            ("ASSISTANT_VELOCITY_LIMIT", "3"),
            ("ASSISTANT_REPEAT_WINDOW_DAYS", "7"),
            ("ASSISTANT_HIGH_VALUE_AMOUNT", "250000.00"),
        ]))
        .unwrap();

        assert_eq!(config.velocity_limit, 3);
        assert_eq!(config.repeat_window, Duration::days(7));
        assert_eq!(config.high_value_amount, dec!(250000));
    }

    #[test]
    fn test_unparseable_value_is_config_error() {
        let err = RiskConfig::from_lookup(lookup_from(&[("ASSISTANT_VELOCITY_LIMIT", "five")]))
            .unwrap_err();
        assert!(matches!(err, AssistantError::ConfigError(_)));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let err = RiskConfig::from_lookup(lookup_from(&[("ASSISTANT_HIGH_VALUE_AMOUNT", "2000000")]))
            .unwrap_err();
        assert!(matches!(err, AssistantError::ConfigError(_)));
    }

    #[test]
    fn test_unrepresentable_window_is_config_error() {
        let err = RiskConfig::from_lookup(lookup_from(&[(
            "ASSISTANT_REPEAT_WINDOW_DAYS",
            "200000000000000",
        )]))
        .unwrap_err();
        assert!(matches!(err, AssistantError::ConfigError(_)));
    }

    #[test]
    fn test_oversized_windows_rejected() {
        for (key, value) in [
            ("ASSISTANT_REPEAT_WINDOW_DAYS", "100000000"),
            ("ASSISTANT_VELOCITY_WINDOW_MINUTES", "10000000"),
        ] {
            let err = RiskConfig::from_lookup(lookup_from(&[(key, value)])).unwrap_err();
            assert!(matches!(err, AssistantError::ConfigError(_)), "{}", key);
        }

        let config = RiskConfig::from_lookup(lookup_from(&[(
            "ASSISTANT_REPEAT_WINDOW_DAYS",
            "3650",
        )]))
        .unwrap();
        assert_eq!(config.repeat_window, Duration::days(3650));
    }
}
