use casevalue_core::money::format_currency;
use casevalue_core::valuation::ValuationEngine;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::commands::{load_config, CommandResult};

pub fn run(amount: Decimal, policy_limit: Option<Decimal>) -> CommandResult {
    if amount < Decimal::ZERO {
        return CommandResult::failure("propose", "query_input", "--amount must not be negative", 2);
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(failure) => return CommandResult::from_failure("propose", failure),
    };

    let engine = ValuationEngine::from_config(&config.valuation);
    let proposal = engine.propose(amount, policy_limit, Utc::now());

    let message = format!(
        "proposal {} (negotiation range {} to {}), valid until {}",
        format_currency(proposal.proposal),
        format_currency(proposal.range_low),
        format_currency(proposal.range_high),
        proposal.expires_on.format("%Y-%m-%d")
    );
    let data = serde_json::json!({
        "proposal": format_currency(proposal.proposal),
        "range_low": format_currency(proposal.range_low),
        "range_high": format_currency(proposal.range_high),
        "expires_on": proposal.expires_on.format("%Y-%m-%d").to_string(),
        "raw": proposal,
    });
    CommandResult::success_with_data("propose", message, Some(data))
}
