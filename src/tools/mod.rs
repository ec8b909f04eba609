//! Tool trait and registry
//!
//! Tools are the functions the chat layer may call. Each takes JSON
//! parameters and returns JSON data. Transfer tools never report a pass for
//! input they could not evaluate.

use crate::agent::{narrate, BankingAgent};
use crate::error::AssistantError;
use crate::fx;
use crate::kyc::{self, KycFields, SignalResult};
use crate::models::{ToolInput, ToolOutput, TransferRequest};
use crate::risk::parse_amount;
use crate::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

const DEFAULT_RECENT_LIMIT: usize = 5;

/// Trait for a single tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Look up `input.tool_name` and run it
    pub async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let tool = self
            .get(&input.tool_name)
            .ok_or_else(|| AssistantError::ToolNotFound(input.tool_name.clone()))?;
        tool.execute(input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//
// ================= Parameter Helpers =================
//

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(AssistantError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

fn require_str<'a>(input: &'a ToolInput, key: &str) -> Result<&'a str> {
    input
        .parameters
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            AssistantError::InvalidToolInput(format!("Expected string '{}' in tool_input", key))
        })
}

fn optional_str<'a>(input: &'a ToolInput, key: &str) -> &'a str {
    input
        .parameters
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
}

/// Accepts `"25,000"`, `"₦25000"` or a bare JSON number
fn require_amount(input: &ToolInput, key: &str) -> Result<Decimal> {
    match input.parameters.get(key) {
        Some(Value::String(raw)) => parse_amount(raw),
        Some(Value::Number(n)) => parse_amount(&n.to_string()),
        Some(other) => Err(AssistantError::InvalidInput(format!(
            "amount must be a number or numeric string, got {}",
            other
        ))),
        None => Err(AssistantError::InvalidToolInput(format!(
            "Expected '{}' in tool_input",
            key
        ))),
    }
}

fn transfer_request(input: &ToolInput) -> Result<TransferRequest> {
    ensure_object_parameters(input)?;

    Ok(TransferRequest {
        bank_name: optional_str(input, "bank_name").to_string(),
        account_number: optional_str(input, "account_number").to_string(),
        amount: require_amount(input, "amount")?,
        description: optional_str(input, "description").to_string(),
    })
}

fn ok(data: Value) -> ToolOutput {
    ToolOutput {
        success: true,
        data,
        error: None,
    }
}

/// Output for a transfer that could not be evaluated at all
fn cannot_evaluate(err: &AssistantError) -> ToolOutput {
    warn!(error = %err, "Transfer request could not be evaluated");
    ToolOutput {
        success: false,
        data: json!({
            "decision": "cannot_evaluate",
            "reason": err.to_string(),
        }),
        error: Some(err.to_string()),
    }
}

//
// ================= Banking Tools =================
//

/// Dry run of the security checks
pub struct EvaluateTransferTool {
    agent: Arc<BankingAgent>,
}

impl EvaluateTransferTool {
    pub fn new(agent: Arc<BankingAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait::async_trait]
impl Tool for EvaluateTransferTool {
    fn name(&self) -> &'static str {
        "evaluate_transfer"
    }

    fn description(&self) -> &'static str {
        "Run the transfer security checks without moving money"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let account_id = require_str(input, "account_id")?;

        let evaluation = match transfer_request(input) {
            Ok(request) => self.agent.preview(account_id, &request).await,
            Err(e) => Err(e),
        };

        match evaluation {
            Ok(evaluation) => Ok(ok(serde_json::to_value(&evaluation)?)),
            Err(e) if e.is_invalid_input() => Ok(cannot_evaluate(&e)),
            Err(e) => Err(e),
        }
    }
}

pub struct TransferFundsTool {
    agent: Arc<BankingAgent>,
}

impl TransferFundsTool {
    pub fn new(agent: Arc<BankingAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait::async_trait]
impl Tool for TransferFundsTool {
    fn name(&self) -> &'static str {
        "transfer_funds"
    }

    fn description(&self) -> &'static str {
        "Check and, if every security check allows it, send a transfer"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let account_id = require_str(input, "account_id")?;

        let outcome = match transfer_request(input) {
            Ok(request) => self.agent.transfer(account_id, request).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(outcome) => {
                let mut data = serde_json::to_value(&outcome)?;
                data["summary"] = json!(narrate(&outcome));
                Ok(ok(data))
            }
            Err(e) if e.is_invalid_input() => Ok(cannot_evaluate(&e)),
            Err(e) => Err(e),
        }
    }
}

pub struct GetAccountTool {
    agent: Arc<BankingAgent>,
}

impl GetAccountTool {
    pub fn new(agent: Arc<BankingAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait::async_trait]
impl Tool for GetAccountTool {
    fn name(&self) -> &'static str {
        "get_account"
    }

    fn description(&self) -> &'static str {
        "Fetch the account balance and full transaction history"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let account_id = require_str(input, "account_id")?;
        let snapshot = self.agent.account_summary(account_id).await?;
        Ok(ok(serde_json::to_value(&snapshot)?))
    }
}

pub struct RecentTransactionsTool {
    agent: Arc<BankingAgent>,
}

impl RecentTransactionsTool {
    pub fn new(agent: Arc<BankingAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait::async_trait]
impl Tool for RecentTransactionsTool {
    fn name(&self) -> &'static str {
        "recent_transactions"
    }

    fn description(&self) -> &'static str {
        "List the most recent transactions, newest first"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let account_id = require_str(input, "account_id")?;
        let limit = input
            .parameters
            .get("limit")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_RECENT_LIMIT);

        let transactions = self.agent.recent_transactions(account_id, limit).await?;
        Ok(ok(json!({
            "account_id": account_id,
            "transactions": transactions,
        })))
    }
}

pub struct ConvertCurrencyTool;

#[async_trait::async_trait]
impl Tool for ConvertCurrencyTool {
    fn name(&self) -> &'static str {
        "convert_currency"
    }

    fn description(&self) -> &'static str {
        "Convert an amount between NGN, USD, GBP and EUR"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let amount = require_amount(input, "amount")?;
        let from = require_str(input, "from")?;
        let to = require_str(input, "to")?;

        let converted = fx::convert(amount, from, to)?;
        Ok(ok(json!({
            "amount": amount,
            "from": from.to_uppercase(),
            "to": to.to_uppercase(),
            "converted": converted,
        })))
    }
}

//
// ================= KYC Tools =================
//

pub struct ValidateIdDocumentTool;

#[async_trait::async_trait]
impl Tool for ValidateIdDocumentTool {
    fn name(&self) -> &'static str {
        "validate_id_document"
    }

    fn description(&self) -> &'static str {
        "Check an identity document description for signs of forgery"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let text = require_str(input, "document_text")?;
        Ok(ok(serde_json::to_value(kyc::validate_id_document(text))?))
    }
}

pub struct ScreenSanctionsTool;

#[async_trait::async_trait]
impl Tool for ScreenSanctionsTool {
    fn name(&self) -> &'static str {
        "screen_against_sanctions"
    }

    fn description(&self) -> &'static str {
        "Screen a customer's full name against the sanctions watchlist"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let name = require_str(input, "full_name")?;
        Ok(ok(serde_json::to_value(kyc::screen_against_sanctions(name))?))
    }
}

pub struct AssessBehaviorTool;

#[async_trait::async_trait]
impl Tool for AssessBehaviorTool {
    fn name(&self) -> &'static str {
        "assess_behavioral_risk"
    }

    fn description(&self) -> &'static str {
        "Look for bot-like or unusual behavior in session telemetry"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let data = require_str(input, "behavior_data")?;
        Ok(ok(serde_json::to_value(kyc::assess_behavioral_risk(data))?))
    }
}

pub struct CombineRiskSignalsTool;

impl CombineRiskSignalsTool {
    fn signal(input: &ToolInput, key: &str) -> Result<SignalResult> {
        let value = input.parameters.get(key).cloned().ok_or_else(|| {
            AssistantError::InvalidToolInput(format!("Expected '{}' in tool_input", key))
        })?;
        serde_json::from_value(value).map_err(|e| {
            AssistantError::InvalidToolInput(format!("'{}' is not a KYC signal: {}", key, e))
        })
    }
}

#[async_trait::async_trait]
impl Tool for CombineRiskSignalsTool {
    fn name(&self) -> &'static str {
        "combine_risk_signals"
    }

    fn description(&self) -> &'static str {
        "Combine document, sanctions and behavior signals into an onboarding decision"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let id_status = Self::signal(input, "id_status")?;
        let sanctions_status = Self::signal(input, "sanctions_status")?;
        let behavior_status = Self::signal(input, "behavior_status")?;

        let decision = kyc::combine_risk_signals(&id_status, &sanctions_status, &behavior_status);
        Ok(ok(serde_json::to_value(decision)?))
    }
}

pub struct ValidateKycFieldsTool;

#[async_trait::async_trait]
impl Tool for ValidateKycFieldsTool {
    fn name(&self) -> &'static str {
        "validate_kyc_fields"
    }

    fn description(&self) -> &'static str {
        "Validate onboarding fields: full name, BVN and date of birth"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let fields: KycFields = serde_json::from_value(input.parameters.clone()).map_err(|e| {
            AssistantError::InvalidToolInput(format!("Invalid KYC fields: {}", e))
        })?;

        let errors = kyc::validate_kyc_fields(&fields, Utc::now().date_naive());
        Ok(ToolOutput {
            success: errors.is_empty(),
            data: json!({
                "valid": errors.is_empty(),
                "errors": errors,
            }),
            error: None,
        })
    }
}

/// Registry with every banking and KYC tool
pub fn create_default_registry(agent: Arc<BankingAgent>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(EvaluateTransferTool::new(agent.clone())));
    registry.register(Arc::new(TransferFundsTool::new(agent.clone())));
    registry.register(Arc::new(GetAccountTool::new(agent.clone())));
    registry.register(Arc::new(RecentTransactionsTool::new(agent)));
    registry.register(Arc::new(ConvertCurrencyTool));

    registry.register(Arc::new(ValidateIdDocumentTool));
    registry.register(Arc::new(ScreenSanctionsTool));
    registry.register(Arc::new(AssessBehaviorTool));
    registry.register(Arc::new(CombineRiskSignalsTool));
    registry.register(Arc::new(ValidateKycFieldsTool));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::risk::RiskEvaluator;
    use crate::store::{seed_demo_account, AccountStore, InMemoryAccountStore};

    async fn registry() -> ToolRegistry {
        let store = InMemoryAccountStore::new();
        store
            .insert(seed_demo_account("ACC-001", "Demo", Utc::now()).unwrap())
            .await
            .unwrap();
        let agent = Arc::new(BankingAgent::new(
            RiskEvaluator::default(),
            Arc::new(store),
            AuditLog::new(),
        ));
        create_default_registry(agent)
    }

    fn input(tool_name: &str, parameters: Value) -> ToolInput {
        ToolInput {
            tool_name: tool_name.to_string(),
            parameters,
        }
    }

    #[tokio::test]
    async fn test_all_tools_registered() {
        let registry = registry().await;
        assert_eq!(registry.list().len(), 10);
        assert!(registry.get("transfer_funds").is_some());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = registry().await;
        let err = registry.execute(&input("wire_money", json!({}))).await.unwrap_err();
        assert!(matches!(err, AssistantError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_transfer_with_string_amount() {
        let registry = registry().await;
        let output = registry
            .execute(&input(
                "transfer_funds",
                json!({
                    "account_id": "ACC-001",
                    "bank_name": "UBA",
                    "account_number": "1111111111",
                    "amount": "600,000",
                    "description": "Car deposit",
                }),
            ))
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.data["evaluation"]["decision"], "allow");
        assert_eq!(output.data["transaction"]["status"], "completed");
        assert!(output.data["summary"].as_str().unwrap().contains("₦1,900,000.00"));
    }

    #[tokio::test]
    async fn test_non_numeric_amount_cannot_be_evaluated() {
        let registry = registry().await;
        let output = registry
            .execute(&input(
                "transfer_funds",
                json!({
                    "account_id": "ACC-001",
                    "bank_name": "UBA",
                    "account_number": "1111111111",
                    "amount": "a lot",
                }),
            ))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.data["decision"], "cannot_evaluate");

        let account = registry
            .execute(&input("get_account", json!({"account_id": "ACC-001"})))
            .await
            .unwrap();
        assert_eq!(account.data["transactions"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_evaluate_reports_block_without_commit() {
        let registry = registry().await;
        let output = registry
            .execute(&input(
                "evaluate_transfer",
                json!({
                    "account_id": "ACC-001",
                    "bank_name": "",
                    "account_number": "0123456789",
                    "amount": 25000,
                }),
            ))
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.data["decision"], "block");

        let recent = registry
            .execute(&input("recent_transactions", json!({"account_id": "ACC-001", "limit": 10})))
            .await
            .unwrap();
        assert_eq!(recent.data["transactions"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_account_id_is_tool_input_error() {
        let registry = registry().await;
        let err = registry
            .execute(&input("transfer_funds", json!({"amount": "100"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::InvalidToolInput(_)));
    }

    #[tokio::test]
    async fn test_kyc_pipeline_through_tools() {
        let registry = registry().await;

        let doc = registry
            .execute(&input("validate_id_document", json!({"document_text": "Forged national ID"})))
            .await
            .unwrap();
        let sanctions = registry
            .execute(&input("screen_against_sanctions", json!({"full_name": "John Doe"})))
            .await
            .unwrap();
        let behavior = registry
            .execute(&input(
                "assess_behavioral_risk",
                json!({"behavior_data": "Bot-like input pattern detected"}),
            ))
            .await
            .unwrap();

        let combined = registry
            .execute(&input(
                "combine_risk_signals",
                json!({
                    "id_status": doc.data,
                    "sanctions_status": sanctions.data,
                    "behavior_status": behavior.data,
                }),
            ))
            .await
            .unwrap();

        assert_eq!(combined.data["action"], "manual_review");
    }

    #[tokio::test]
    async fn test_kyc_fields_tool() {
        let registry = registry().await;
        let output = registry
            .execute(&input(
                "validate_kyc_fields",
                json!({"full_name": "Chidi Nwosu", "bvn": "12", "date_of_birth": "1990-01-01"}),
            ))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.data["errors"][0]["field"], "bvn");
    }

    #[tokio::test]
    async fn test_convert_currency_tool() {
        let registry = registry().await;
        let output = registry
            .execute(&input("convert_currency", json!({"amount": "100", "from": "usd", "to": "NGN"})))
            .await
            .unwrap();

        assert_eq!(output.data["to"], "NGN");
        assert_eq!(
            output.data["converted"].as_str().map(|s| parse_amount(s).unwrap()),
            Some(Decimal::from(155000))
        );
    }
}
