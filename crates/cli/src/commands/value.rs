use std::path::Path;

use casevalue_core::domain::valuation::AggregationPolicy;
use casevalue_core::errors::ApplicationError;
use casevalue_core::valuation::{ScoredCase, ValuationEngine, ValuationRequest};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::commands::{
    load_config, load_corpus, query_failure, read_query, runtime, CommandFailure,
    CommandResult,
};

#[derive(Debug, Serialize)]
struct NearestCase {
    id: i64,
    score: f64,
    venue: String,
    surgery: String,
    settlement: String,
}

impl From<&ScoredCase> for NearestCase {
    fn from(scored: &ScoredCase) -> Self {
        Self {
            id: scored.case.id.0,
            score: scored.score,
            venue: scored.case.venue.clone(),
            surgery: scored.case.surgery.clone(),
            settlement: scored.case.settlement.clone(),
        }
    }
}

pub fn run(query_path: &Path, policy: Option<AggregationPolicy>) -> CommandResult {
    match execute(query_path, policy) {
        Ok(result) => result,
        Err(failure) => CommandResult::from_failure("value", failure),
    }
}

fn execute(
    query_path: &Path,
    policy: Option<AggregationPolicy>,
) -> Result<CommandResult, CommandFailure> {
    let config = load_config()?;
    let query = read_query(query_path).map_err(query_failure)?;
    let runtime = runtime()?;
    let corpus = runtime.block_on(load_corpus(&config))?;

    let now = Utc::now();
    let correlation_id = format!("cli-{}", now.timestamp_millis());
    let policy = policy.unwrap_or(config.valuation.default_policy);
    let engine = ValuationEngine::from_config(&config.valuation);
    let request =
        ValuationRequest::new(query, policy, now).with_correlation_id(correlation_id.clone());

    let valuation = engine.value_case(&request, &corpus).map_err(|error| {
        let error = ApplicationError::from(error);
        let reason_code = error.reason_code();
        let message = error.to_string();
        let interface = error.into_interface(correlation_id.as_str());
        warn!(
            event_name = "cli.value.failed",
            correlation_id = %correlation_id,
            reason_code,
            user_message = interface.user_message(),
            "valuation failed"
        );
        let exit_code: u8 = if reason_code == "invalid_query" { 2 } else { 7 };
        (reason_code, message, exit_code)
    })?;

    let nearest = engine
        .nearest_cases(&request.query, &corpus)
        .iter()
        .map(NearestCase::from)
        .collect::<Vec<_>>();
    let summary = valuation.summary();
    let message = if valuation.degenerate {
        format!("no comparable carried a usable settlement; proposal {}", summary.proposal)
    } else {
        format!(
            "proposal {} from evaluator amount {} ({})",
            summary.proposal, summary.evaluator_amount, summary.policy
        )
    };

    let data = serde_json::json!({
        "correlation_id": correlation_id,
        "summary": summary,
        "result": valuation,
        "nearest_cases": nearest,
    });
    Ok(CommandResult::success_with_data("value", message, Some(data)))
}
