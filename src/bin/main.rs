use kyc_banking_assistant::{
    agent::{format_naira, narrate, BankingAgent},
    audit::AuditLog,
    config::AppConfig,
    models::{ToolInput, TransferRequest},
    risk::RiskEvaluator,
    store::{seed_demo_account, AccountStore, InMemoryAccountStore},
    tools::create_default_registry,
};
use chrono::Utc;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    info!("KYC Banking Assistant starting");

    // Create components
    let store = InMemoryAccountStore::new();
    store
        .insert(seed_demo_account(
            &config.demo_account_id,
            &config.demo_holder_name,
            Utc::now(),
        )?)
        .await?;

    let agent = Arc::new(BankingAgent::new(
        RiskEvaluator::with_config(&config.risk),
        Arc::new(store),
        AuditLog::new(),
    ));
    let registry = create_default_registry(agent.clone());

    info!(tools = ?registry.list(), "Tools registered");

    let account_id = config.demo_account_id.as_str();
    let opening = agent.account_summary(account_id).await?;
    println!(
        "\n=== ACCOUNT {} ({}) ===\nOpening balance: {}\n",
        opening.account_id,
        opening.holder_name,
        format_naira(opening.balance)
    );

    let scenarios = vec![
        TransferRequest::new("GTBank", "0123456789", dec!(1500000), "Land payment"),
        TransferRequest::new("", "0123456789", dec!(25000), "School fees"),
        TransferRequest::new("UBA", "1111111111", dec!(600000), "Car deposit"),
    ];

    for request in scenarios {
        info!(
            bank = %request.bank_name,
            amount = %request.amount,
            "Running transfer scenario"
        );

        match agent.transfer(account_id, request).await {
            Ok(outcome) => {
                println!("=== TRANSFER ===");
                println!("Audit ID: {}", outcome.audit_id);
                println!("{}", narrate(&outcome));
            }
            Err(e) => {
                eprintln!("Transfer could not be evaluated: {}", e);
            }
        }
    }

    // KYC onboarding, the way the chat layer would chain the tools
    let call = |tool_name: &str, parameters: serde_json::Value| ToolInput {
        tool_name: tool_name.to_string(),
        parameters,
    };

    let doc = registry
        .execute(&call("validate_id_document", json!({"document_text": "Forged national ID"})))
        .await?;
    let sanctions = registry
        .execute(&call("screen_against_sanctions", json!({"full_name": "John Doe"})))
        .await?;
    let behavior = registry
        .execute(&call(
            "assess_behavioral_risk",
            json!({"behavior_data": "Bot-like input pattern detected"}),
        ))
        .await?;
    let combined = registry
        .execute(&call(
            "combine_risk_signals",
            json!({
                "id_status": doc.data,
                "sanctions_status": sanctions.data,
                "behavior_status": behavior.data,
            }),
        ))
        .await?;

    println!("=== KYC EVALUATION ===");
    for output in [&doc, &sanctions, &behavior] {
        println!("{}", output.data["message"].as_str().unwrap_or_default());
    }
    println!("➡ {}\n", combined.data["message"].as_str().unwrap_or_default());

    let closing = agent.account_summary(account_id).await?;
    println!(
        "Closing balance: {} ({} transactions on record)",
        format_naira(closing.balance),
        closing.transactions.len()
    );

    Ok(())
}
