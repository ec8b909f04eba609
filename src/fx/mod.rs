//! Currency conversion against a fixed naira rate table

use crate::error::AssistantError;
use crate::Result;
use lazy_static::lazy_static;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::HashMap;

lazy_static! {
    /// Naira per one unit of each currency
    static ref NGN_RATES: HashMap<&'static str, Decimal> = {
        let mut rates = HashMap::new();
        rates.insert("NGN", dec!(1));
        rates.insert("USD", dec!(1550));
        rates.insert("GBP", dec!(1960));
        rates.insert("EUR", dec!(1680));
        rates
    };
}

fn rate_for(code: &str) -> Result<Decimal> {
    NGN_RATES
        .get(code.trim().to_uppercase().as_str())
        .copied()
        .ok_or_else(|| AssistantError::InvalidInput(format!("unsupported currency {:?}", code)))
}

pub fn supported_currencies() -> Vec<&'static str> {
    let mut codes: Vec<_> = NGN_RATES.keys().copied().collect();
    codes.sort_unstable();
    codes
}

/// Convert via naira, rounded to two decimal places (midpoint away from zero)
pub fn convert(amount: Decimal, from: &str, to: &str) -> Result<Decimal> {
    if amount < Decimal::ZERO {
        return Err(AssistantError::InvalidInput(format!(
            "cannot convert a negative amount {}",
            amount
        )));
    }

    let from_rate = rate_for(from)?;
    let to_rate = rate_for(to)?;

    let naira = amount
        .checked_mul(from_rate)
        .ok_or_else(|| AssistantError::InvalidInput("amount too large to convert".to_string()))?;
    let converted = naira / to_rate;

    Ok(converted.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
