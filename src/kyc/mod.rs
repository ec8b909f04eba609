//! KYC onboarding checks
//!
//! Each screening step yields a signal; the signals are then combined into an
//! onboarding decision. Any signal that is not clear sends the customer to
//! manual review.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Length of a Bank Verification Number
const BVN_LENGTH: usize = 11;
const MINIMUM_AGE_YEARS: i32 = 18;

const FORGERY_MARKERS: &[&str] = &["forged"];
const BEHAVIOR_MARKERS: &[&str] = &["bot-like", "unusual"];

lazy_static! {
    static ref SANCTIONS_WATCHLIST: HashSet<&'static str> =
        ["John Doe", "Ali Khan"].into_iter().collect();
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KycSignal {
    Clear,
    Warning,
    Flagged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalResult {
    pub signal: KycSignal,
    pub message: String,
}

impl SignalResult {
    fn new(signal: KycSignal, message: impl Into<String>) -> Self {
        Self {
            signal,
            message: message.into(),
        }
    }

    pub fn is_clear(&self) -> bool {
        self.signal == KycSignal::Clear
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingAction {
    AutoApprove,
    ManualReview,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnboardingDecision {
    pub action: OnboardingAction,
    pub message: String,
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    markers.iter().any(|m| lowered.contains(m))
}

/// Flags documents whose description mentions forgery
pub fn validate_id_document(document_text: &str) -> SignalResult {
    if contains_any(document_text, FORGERY_MARKERS) {
        SignalResult::new(KycSignal::Flagged, "❌ Document invalid: suspected forgery.")
    } else {
        SignalResult::new(KycSignal::Clear, "✅ Document valid.")
    }
}

/// Exact-name match against the sanctions watchlist. Leading and trailing
/// whitespace is trimmed before matching; case and inner spacing must match.
pub fn screen_against_sanctions(full_name: &str) -> SignalResult {
    let name = full_name.trim();
    if SANCTIONS_WATCHLIST.contains(name) {
        SignalResult::new(
            KycSignal::Flagged,
            format!("❌ {} is on the sanctions list.", name),
        )
    } else {
        SignalResult::new(KycSignal::Clear, format!("✅ {} is clear.", name))
    }
}

pub fn assess_behavioral_risk(behavior_data: &str) -> SignalResult {
    if contains_any(behavior_data, BEHAVIOR_MARKERS) {
        SignalResult::new(KycSignal::Warning, "⚠️ Behavioral risk detected.")
    } else {
        SignalResult::new(KycSignal::Clear, "✅ Behavior appears normal.")
    }
}

pub fn combine_risk_signals(
    id_status: &SignalResult,
    sanctions_status: &SignalResult,
    behavior_status: &SignalResult,
) -> OnboardingDecision {
    let all_clear = [id_status, sanctions_status, behavior_status]
        .iter()
        .all(|s| s.is_clear());

    if all_clear {
        OnboardingDecision {
            action: OnboardingAction::AutoApprove,
            message: "✅ Low risk: onboarding auto-approved.".to_string(),
        }
    } else {
        OnboardingDecision {
            action: OnboardingAction::ManualReview,
            message: "🚨 High risk: escalated to manual review.".to_string(),
        }
    }
}

//
// ================= Field Validation =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycFields {
    pub full_name: String,
    pub bvn: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn field_error(field: &str, message: impl Into<String>) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Returns every field problem found; empty means the fields are acceptable
pub fn validate_kyc_fields(fields: &KycFields, today: NaiveDate) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if fields.full_name.trim().is_empty() {
        errors.push(field_error("full_name", "must not be blank"));
    }

    let bvn = fields.bvn.trim();
    if bvn.len() != BVN_LENGTH || !bvn.chars().all(|c| c.is_ascii_digit()) {
        errors.push(field_error(
            "bvn",
            format!("must be exactly {} digits", BVN_LENGTH),
        ));
    }

    match NaiveDate::parse_from_str(fields.date_of_birth.trim(), "%Y-%m-%d") {
        Ok(dob) if dob > today => {
            errors.push(field_error("date_of_birth", "is in the future"));
        }
        Ok(dob) if age_on(dob, today) < MINIMUM_AGE_YEARS => {
            errors.push(field_error(
                "date_of_birth",
                format!("customer must be at least {} years old", MINIMUM_AGE_YEARS),
            ));
        }
        Ok(_) => {}
        Err(_) => {
            errors.push(field_error("date_of_birth", "must be a date in YYYY-MM-DD format"));
        }
    }

    errors
}

fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let had_birthday = (today.month(), today.day()) >= (dob.month(), dob.day());
    today.year() - dob.year() - if had_birthday { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn fields(name: &str, bvn: &str, dob: &str) -> KycFields {
        KycFields {
            full_name: name.to_string(),
            bvn: bvn.to_string(),
            date_of_birth: dob.to_string(),
        }
    }

    #[test]
    fn test_document_validation() {
        assert_eq!(validate_id_document("Forged national ID").signal, KycSignal::Flagged);
        assert!(validate_id_document("International passport, issued 2021").is_clear());
    }

    #[test]
    fn test_sanctions_exact_match() {
        assert_eq!(screen_against_sanctions("John Doe").signal, KycSignal::Flagged);
        assert_eq!(screen_against_sanctions(" Ali Khan ").signal, KycSignal::Flagged);
        assert!(screen_against_sanctions("john doe").is_clear());
        assert!(screen_against_sanctions("John  Doe").is_clear());
        assert!(screen_against_sanctions("Chidi Nwosu").is_clear());
    }

    #[test]
    fn test_behavioral_risk() {
        let result = assess_behavioral_risk("Bot-like input pattern detected");
        assert_eq!(result.signal, KycSignal::Warning);
        assert!(assess_behavioral_risk("UNUSUAL login hours").signal == KycSignal::Warning);
        assert!(assess_behavioral_risk("steady typing cadence").is_clear());
    }

    #[test]
    fn test_combine_signals() {
        let clear = validate_id_document("passport");
        let sanctions = screen_against_sanctions("Chidi Nwosu");
        let behavior = assess_behavioral_risk("normal");
        assert_eq!(
            combine_risk_signals(&clear, &sanctions, &behavior).action,
            OnboardingAction::AutoApprove
        );

        let warning = assess_behavioral_risk("unusual");
        assert_eq!(
            combine_risk_signals(&clear, &sanctions, &warning).action,
            OnboardingAction::ManualReview
        );
    }

    #[test]
    fn test_valid_fields() {
        let errors = validate_kyc_fields(&fields("Chidi Nwosu", "22345678901", "1990-02-14"), today());
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_invalid_fields_all_reported() {
        let errors = validate_kyc_fields(&fields("  ", "1234", "14/02/1990"), today());
        let names: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(names, vec!["full_name", "bvn", "date_of_birth"]);
    }

    #[test]
    fn test_age_boundary() {
        assert!(validate_kyc_fields(&fields("A", "22345678901", "2006-06-01"), today()).is_empty());
        assert_eq!(
            validate_kyc_fields(&fields("A", "22345678901", "2006-06-02"), today()).len(),
            1
        );
        assert_eq!(
            validate_kyc_fields(&fields("A", "22345678901", "2030-01-01"), today())[0].message,
            "is in the future"
        );
    }
}
