use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::case::CaseId;
use crate::money::format_currency;

/// How a comparable set is collapsed into a single evaluator figure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Median of the top comparables, adjusted, snapped to the closest real settlement.
    #[default]
    RangeMedian,
    /// Mean of the top comparables scaled by learned category multipliers.
    WeightedMean,
}

impl AggregationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RangeMedian => "range_median",
            Self::WeightedMean => "weighted_mean",
        }
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "range_median" | "median" => Ok(Self::RangeMedian),
            "weighted_mean" | "weighted" => Ok(Self::WeightedMean),
            other => Err(format!(
                "unsupported aggregation policy `{other}` (expected range_median|weighted_mean)"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRange {
    pub low: Decimal,
    pub high: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

impl ValuationTraceStep {
    pub fn new(stage: &str, detail: impl Into<String>, amount: Decimal) -> Self {
        Self { stage: stage.to_string(), detail: detail.into(), amount }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediatorProposal {
    pub proposal: Decimal,
    pub expires_on: NaiveDate,
    pub range_low: Decimal,
    pub range_high: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub policy: AggregationPolicy,
    pub evaluator_amount: Decimal,
    pub mediator: MediatorProposal,
    pub rationale: String,
    pub source_case_ids: Vec<CaseId>,
    pub settlement_range: Option<SettlementRange>,
    pub confidence: Option<u8>,
    pub policy_exceedance_risk: Option<u8>,
    pub degenerate: bool,
    pub comparable_count: usize,
    pub trace: Vec<ValuationTraceStep>,
    pub generated_at: DateTime<Utc>,
}

/// Boundary rendering of a [`ValuationResult`] with currency formatted for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub policy: String,
    pub proposal: String,
    pub evaluator_amount: String,
    pub rationale: String,
    pub source_case_ids: Vec<CaseId>,
    pub expires_on: String,
    pub negotiation_range: SettlementRangeSummary,
    pub settlement_range: Option<SettlementRangeSummary>,
    pub confidence: Option<u8>,
    pub policy_exceedance_risk: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRangeSummary {
    pub low: String,
    pub high: String,
}

impl ValuationResult {
    pub fn summary(&self) -> ValuationSummary {
        ValuationSummary {
            policy: self.policy.as_str().to_string(),
            proposal: format_currency(self.mediator.proposal),
            evaluator_amount: format_currency(self.evaluator_amount),
            rationale: self.rationale.clone(),
            source_case_ids: self.source_case_ids.clone(),
            expires_on: self.mediator.expires_on.format("%Y-%m-%d").to_string(),
            negotiation_range: SettlementRangeSummary {
                low: format_currency(self.mediator.range_low),
                high: format_currency(self.mediator.range_high),
            },
            settlement_range: self.settlement_range.map(|range| SettlementRangeSummary {
                low: format_currency(range.low),
                high: format_currency(range.high),
            }),
            confidence: self.confidence,
            policy_exceedance_risk: self.policy_exceedance_risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{
        AggregationPolicy, MediatorProposal, SettlementRange, ValuationResult,
    };
    use crate::domain::case::CaseId;

    #[test]
    fn aggregation_policy_parses_cli_spellings() {
        assert_eq!(AggregationPolicy::from_str("range-median"), Ok(AggregationPolicy::RangeMedian));
        assert_eq!(AggregationPolicy::from_str("WEIGHTED_MEAN"), Ok(AggregationPolicy::WeightedMean));
        assert!(AggregationPolicy::from_str("ai").is_err());
    }

    #[test]
    fn summary_renders_currency_at_the_boundary() {
        let result = ValuationResult {
            policy: AggregationPolicy::RangeMedian,
            evaluator_amount: Decimal::from(300_000),
            mediator: MediatorProposal {
                proposal: Decimal::from(297_000),
                expires_on: NaiveDate::from_ymd_opt(2026, 3, 8).expect("valid date"),
                range_low: Decimal::from(282_000),
                range_high: Decimal::from(311_500),
            },
            rationale: "closest comparable".to_string(),
            source_case_ids: vec![CaseId(12)],
            settlement_range: Some(SettlementRange {
                low: Decimal::from(50_000),
                high: Decimal::new(20_000_049, 2),
            }),
            confidence: None,
            policy_exceedance_risk: Some(60),
            degenerate: false,
            comparable_count: 25,
            trace: Vec::new(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid time"),
        };

        let summary = result.summary();
        assert_eq!(summary.proposal, "$297,000");
        assert_eq!(summary.evaluator_amount, "$300,000");
        assert_eq!(summary.expires_on, "2026-03-08");
        assert_eq!(summary.negotiation_range.low, "$282,000");
        let range = summary.settlement_range.expect("range should be rendered");
        assert_eq!(range.low, "$50,000");
        assert_eq!(range.high, "$200,000");
    }
}
