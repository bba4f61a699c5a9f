use std::path::Path;

use casevalue_core::valuation::{ScoredCase, ValuationEngine};
use serde::Serialize;

use crate::commands::{
    load_config, load_corpus, query_failure, read_query, runtime, to_data, CommandFailure,
    CommandResult,
};

#[derive(Debug, Serialize)]
struct ComparableRow<'a> {
    rank: usize,
    #[serde(flatten)]
    scored: &'a ScoredCase,
}

pub fn run(query_path: &Path, limit: Option<usize>) -> CommandResult {
    match execute(query_path, limit) {
        Ok(result) => result,
        Err(failure) => CommandResult::from_failure("comparables", failure),
    }
}

fn execute(query_path: &Path, limit: Option<usize>) -> Result<CommandResult, CommandFailure> {
    let config = load_config()?;
    let query = read_query(query_path).map_err(query_failure)?;
    let limit = match limit {
        Some(0) => return Err(("query_input", "--limit must be greater than zero".to_string(), 2)),
        Some(limit) => limit,
        None => config.valuation.nearest_limit,
    };

    let corpus = runtime()?.block_on(load_corpus(&config))?;
    let engine = ValuationEngine::from_config(&config.valuation);
    let ranked = engine.comparables(&query, &corpus, limit);

    let rows = ranked
        .iter()
        .enumerate()
        .map(|(index, scored)| ComparableRow { rank: index + 1, scored })
        .collect::<Vec<_>>();
    let message = format!("{} comparable(s) from a corpus of {}", rows.len(), corpus.len());
    Ok(CommandResult::success_with_data("comparables", message, to_data(&rows)))
}
