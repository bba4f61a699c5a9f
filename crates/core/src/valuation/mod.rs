//! Comparable matching and settlement valuation.
//!
//! Everything below [`ValuationEngine`] is a pure function of an in-memory corpus
//! slice. The weight cache is the only state kept between requests.

pub mod aggregation;
pub mod comparables;
pub mod corpus;
pub mod error;
pub mod mediator;
pub mod risk;
pub mod similarity;
pub mod weights;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::ValuationConfig;
use crate::domain::case::{HistoricalCase, QueryCase, TbiSeverity};
use crate::domain::valuation::{AggregationPolicy, MediatorProposal, ValuationResult};

pub use aggregation::{aggregate_range_median, aggregate_weighted_mean, AggregationOutcome};
pub use comparables::{ComparableSelector, ScoredCase, AGGREGATION_LIMIT, NEAREST_CASES_LIMIT};
pub use corpus::CaseCorpusProvider;
pub use error::ValuationError;
pub use mediator::{propose, MediatorPolicy};
pub use risk::{policy_exceedance_risk, RiskLevel};
pub use similarity::{DeterministicSimilarityScorer, ScoreComponents, SimilarityScorer};
pub use weights::{learn_weights, LearnedWeights, WeightLearner};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValuationRequest {
    pub query: QueryCase,
    pub policy: AggregationPolicy,
    pub correlation_id: String,
    pub now: DateTime<Utc>,
}

impl ValuationRequest {
    pub fn new(query: QueryCase, policy: AggregationPolicy, now: DateTime<Utc>) -> Self {
        Self { query, policy, correlation_id: "unassigned".to_string(), now }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

#[derive(Debug)]
pub struct ValuationEngine {
    selector: ComparableSelector,
    weights: WeightLearner,
    mediator: MediatorPolicy,
    nearest_limit: usize,
    aggregation_limit: usize,
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::from_config(&ValuationConfig::default())
    }
}

impl ValuationEngine {
    pub fn from_config(config: &ValuationConfig) -> Self {
        Self {
            selector: ComparableSelector::default(),
            weights: WeightLearner::new(Duration::hours(config.weights_ttl_hours)),
            mediator: MediatorPolicy {
                validity_days: config.proposal_validity_days,
                ..MediatorPolicy::default()
            },
            nearest_limit: config.nearest_limit,
            aggregation_limit: config.aggregation_limit,
        }
    }

    pub fn weight_learner(&self) -> &WeightLearner {
        &self.weights
    }

    pub fn mediator_policy(&self) -> &MediatorPolicy {
        &self.mediator
    }

    /// The handful of most similar cases, for display alongside a valuation.
    pub fn nearest_cases(&self, query: &QueryCase, corpus: &[HistoricalCase]) -> Vec<ScoredCase> {
        self.selector.select(query, corpus, self.nearest_limit)
    }

    pub fn comparables(
        &self,
        query: &QueryCase,
        corpus: &[HistoricalCase],
        limit: usize,
    ) -> Vec<ScoredCase> {
        self.selector.select(query, corpus, limit)
    }

    pub fn weights(
        &self,
        corpus: &[HistoricalCase],
        now: DateTime<Utc>,
    ) -> Result<LearnedWeights, ValuationError> {
        self.weights.get_weights(corpus, now)
    }

    pub fn propose(
        &self,
        evaluator_amount: Decimal,
        policy_limit: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> MediatorProposal {
        self.mediator.propose(evaluator_amount, policy_limit, now.date_naive())
    }

    /// Values one claim against the supplied corpus.
    ///
    /// An empty corpus fails with `NoDataAvailable`. Comparables that carry no
    /// usable settlement produce a zero-valued result flagged `degenerate`.
    pub fn value_case(
        &self,
        request: &ValuationRequest,
        corpus: &[HistoricalCase],
    ) -> Result<ValuationResult, ValuationError> {
        let query = &request.query;
        validate_query(query)?;

        if corpus.is_empty() {
            return Err(ValuationError::no_data("historical corpus is empty"));
        }

        let outcome = match request.policy {
            AggregationPolicy::RangeMedian => {
                let ranked = self.selector.rank_all(query, corpus);
                aggregate_range_median(query, &ranked, self.aggregation_limit)
            }
            AggregationPolicy::WeightedMean => {
                let top = self.selector.select(query, corpus, self.aggregation_limit);
                if top.iter().any(|scored| scored.case.positive_settlement().is_some()) {
                    let weights = self.weights.get_weights(corpus, request.now)?;
                    aggregate_weighted_mean(query, &top, self.aggregation_limit, &weights)
                } else {
                    AggregationOutcome::degenerate(AggregationPolicy::WeightedMean, top.len())
                }
            }
        };

        let policy_limit = query.known_policy_limit();
        let mediator = self.propose(outcome.evaluator_amount, policy_limit, request.now);
        let policy_exceedance_risk = match (outcome.degenerate, policy_limit) {
            (false, Some(limit)) => {
                Some(policy_exceedance_risk(outcome.evaluator_amount, Some(limit)))
            }
            _ => None,
        };

        if outcome.degenerate {
            warn!(
                event_name = "valuation.degenerate",
                correlation_id = %request.correlation_id,
                policy = outcome.policy.as_str(),
                comparable_count = outcome.comparable_count,
                "no comparable carried a usable settlement amount"
            );
        } else {
            info!(
                event_name = "valuation.completed",
                correlation_id = %request.correlation_id,
                policy = outcome.policy.as_str(),
                comparable_count = outcome.comparable_count,
                evaluator_amount = %outcome.evaluator_amount,
                proposal = %mediator.proposal,
                "claim valued"
            );
        }

        Ok(ValuationResult {
            policy: outcome.policy,
            evaluator_amount: outcome.evaluator_amount,
            mediator,
            rationale: outcome.rationale,
            source_case_ids: outcome.source_case_ids,
            settlement_range: outcome.settlement_range,
            confidence: None,
            policy_exceedance_risk,
            degenerate: outcome.degenerate,
            comparable_count: outcome.comparable_count,
            trace: outcome.trace,
            generated_at: request.now,
        })
    }

    /// Loads the corpus from `provider` in one pass, then values the claim.
    pub fn value_from_provider<P>(
        &self,
        request: &ValuationRequest,
        provider: &P,
    ) -> Result<ValuationResult, ValuationError>
    where
        P: CaseCorpusProvider + ?Sized,
    {
        let corpus = provider.load_corpus()?;
        self.value_case(request, &corpus)
    }
}

fn validate_query(query: &QueryCase) -> Result<(), ValuationError> {
    for (field, amount) in
        [("medical_specials", query.medical_specials), ("howell_specials", query.howell_specials)]
    {
        if amount.is_some_and(|amount| amount < Decimal::ZERO) {
            return Err(ValuationError::InvalidQuery {
                field,
                reason: "amount must not be negative".to_string(),
            });
        }
    }

    if let Some(level) = query.tbi_level {
        if TbiSeverity::from_level(level).is_none() {
            return Err(ValuationError::InvalidQuery {
                field: "tbi_level",
                reason: format!("level {level} is outside 1..=3"),
            });
        }
    }

    if let Some(label) = query.tbi_severity.as_deref().filter(|label| !label.trim().is_empty()) {
        if TbiSeverity::parse(label).is_none() {
            return Err(ValuationError::InvalidQuery {
                field: "tbi_severity",
                reason: format!("`{label}` is not one of mild|moderate|severe"),
            });
        }
    }

    Ok(())
}
