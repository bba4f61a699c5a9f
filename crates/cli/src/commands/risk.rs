use casevalue_core::money::format_currency;
use casevalue_core::valuation::{policy_exceedance_risk, RiskLevel};
use rust_decimal::Decimal;

use crate::commands::CommandResult;

pub fn run(settlement: Decimal, policy_limit: Option<Decimal>) -> CommandResult {
    if settlement < Decimal::ZERO {
        return CommandResult::failure(
            "risk",
            "query_input",
            "--settlement must not be negative",
            2,
        );
    }

    let risk = policy_exceedance_risk(settlement, policy_limit);
    let level = RiskLevel::from_percent(risk);
    let message = match policy_limit.filter(|limit| *limit > Decimal::ZERO) {
        Some(limit) => format!(
            "{risk}% chance that {} exceeds the {} policy limit ({})",
            format_currency(settlement),
            format_currency(limit),
            level.as_str()
        ),
        None => format!("{risk}% exceedance risk with no known policy limit ({})", level.as_str()),
    };

    let data = serde_json::json!({
        "risk_percent": risk,
        "level": level.as_str(),
    });
    CommandResult::success_with_data("risk", message, Some(data))
}
