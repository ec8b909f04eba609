//! KYC Banking Assistant core
//!
//! The deterministic side of a chat-driven banking assistant:
//! - Evaluates outgoing transfers against amount, fraud-pattern, balance and
//!   velocity checks
//! - Commits allowed transfers to a per-account ledger under an account lock
//! - Records every decision in a tamper-evident audit trail
//! - Screens onboarding customers (document, sanctions, behavior, fields)
//! - Exposes all of it as JSON tools for the conversational layer
//!
//! TRANSFER FLOW:
//! REQUEST → LOCK → EVALUATE → COMMIT? → AUDIT → NARRATE

pub mod agent;
pub mod audit;
pub mod config;
pub mod error;
pub mod fx;
pub mod kyc;
pub mod ledger;
pub mod models;
pub mod risk;
pub mod store;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::{BankingAgent, TransferOutcome};
pub use risk::RiskEvaluator;
