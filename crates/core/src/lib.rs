pub mod config;
pub mod domain;
pub mod errors;
pub mod money;
pub mod valuation;

pub use domain::case::{CaseId, HistoricalCase, QueryCase, TbiSeverity};
pub use domain::valuation::{
    AggregationPolicy, MediatorProposal, SettlementRange, ValuationResult, ValuationSummary,
};
pub use errors::{ApplicationError, InterfaceError};
pub use valuation::{
    CaseCorpusProvider, LearnedWeights, ScoredCase, ValuationEngine, ValuationError,
    ValuationRequest, WeightLearner,
};
