use casevalue_core::errors::ApplicationError;
use casevalue_core::valuation::ValuationEngine;
use chrono::Utc;

use crate::commands::{load_config, load_corpus, runtime, to_data, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    match execute() {
        Ok(result) => result,
        Err(failure) => CommandResult::from_failure("weights", failure),
    }
}

fn execute() -> Result<CommandResult, CommandFailure> {
    let config = load_config()?;
    let corpus = runtime()?.block_on(load_corpus(&config))?;

    let engine = ValuationEngine::from_config(&config.valuation);
    let weights = engine.weights(&corpus, Utc::now()).map_err(|error| {
        let error = ApplicationError::from(error);
        (error.reason_code(), error.to_string(), 7u8)
    })?;

    let message = format!(
        "learned {} surgery and {} injection multiplier(s) from {} settled case(s)",
        weights.surgery_multipliers.len(),
        weights.injection_multipliers.len(),
        weights.sample_size
    );
    Ok(CommandResult::success_with_data("weights", message, to_data(&weights)))
}
