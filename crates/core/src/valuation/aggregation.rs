//! Collapses a ranked comparable set into one evaluator figure.
//!
//! Two deterministic policies are supported; see [`AggregationPolicy`]. Both
//! recover from unparseable settlements by excluding them, and report an empty
//! result as a degenerate zero outcome instead of failing.

use rust_decimal::Decimal;

use crate::domain::case::{CaseId, QueryCase};
use crate::domain::valuation::{AggregationPolicy, SettlementRange, ValuationTraceStep};
use crate::money::{format_currency, round_to_increment};
use crate::valuation::comparables::ScoredCase;
use crate::valuation::weights::{mean, LearnedWeights};

pub const ROUNDING_INCREMENT: i64 = 500;
/// Minimum number of surgical comparables before a non-surgical claim is discounted.
pub const SURGICAL_COMPARABLES_FOR_DISCOUNT: usize = 3;

pub fn policy_limit_escalation() -> Decimal {
    Decimal::new(115, 2)
}

pub fn no_surgery_discount() -> Decimal {
    Decimal::new(80, 2)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationOutcome {
    pub policy: AggregationPolicy,
    pub evaluator_amount: Decimal,
    pub settlement_range: Option<SettlementRange>,
    pub source_case_ids: Vec<CaseId>,
    pub rationale: String,
    pub trace: Vec<ValuationTraceStep>,
    pub comparable_count: usize,
    pub degenerate: bool,
}

impl AggregationOutcome {
    pub fn degenerate(policy: AggregationPolicy, comparable_count: usize) -> Self {
        let rationale = if comparable_count == 0 {
            "No comparable cases were found, so no settlement value could be derived.".to_string()
        } else {
            format!(
                "Found {comparable_count} comparable cases, but none had a usable settlement amount, so no settlement value could be derived."
            )
        };

        Self {
            policy,
            evaluator_amount: Decimal::ZERO,
            settlement_range: None,
            source_case_ids: Vec::new(),
            rationale,
            trace: Vec::new(),
            comparable_count,
            degenerate: true,
        }
    }
}

/// Median of the top comparables, adjusted, then snapped to the closest real settlement.
///
/// `ranked` is the full ranked comparable set. The median uses only its first
/// `limit` entries while both adjustment rules look at every supplied comparable.
pub fn aggregate_range_median(
    query: &QueryCase,
    ranked: &[ScoredCase],
    limit: usize,
) -> AggregationOutcome {
    let top = &ranked[..ranked.len().min(limit)];
    let settled = positive_settlements(top);
    if settled.is_empty() {
        return AggregationOutcome::degenerate(AggregationPolicy::RangeMedian, top.len());
    }

    let mut sorted = settled.iter().map(|(_, amount)| *amount).collect::<Vec<_>>();
    sorted.sort();
    let low = sorted[0];
    let high = sorted[sorted.len() - 1];
    let median = median_of_sorted(&sorted);

    let mut trace = vec![ValuationTraceStep::new(
        "median",
        format!("median of {} comparable settlements", sorted.len()),
        median,
    )];
    let mut adjusted = median;
    let mut adjustments = Vec::new();

    let max_comparable_limit = ranked
        .iter()
        .map(|scored| scored.case.policy_limit_amount().unwrap_or(Decimal::ZERO))
        .max()
        .unwrap_or(Decimal::ZERO);
    if let Some(query_limit) = query.known_policy_limit() {
        if query_limit > max_comparable_limit {
            adjusted = adjusted.saturating_mul(policy_limit_escalation());
            adjustments.push("policy-limit escalation (x1.15)");
            trace.push(ValuationTraceStep::new(
                "policy_limit_escalation",
                format!(
                    "policy limit {} exceeds every comparable limit (max {})",
                    format_currency(query_limit),
                    format_currency(max_comparable_limit)
                ),
                adjusted,
            ));
        }
    }

    let surgical_comparables = ranked.iter().filter(|scored| scored.case.has_surgery()).count();
    if !query.has_surgery() && surgical_comparables >= SURGICAL_COMPARABLES_FOR_DISCOUNT {
        adjusted = adjusted.saturating_mul(no_surgery_discount());
        adjustments.push("no-surgery discount (x0.80)");
        trace.push(ValuationTraceStep::new(
            "no_surgery_discount",
            format!("claim has no surgery while {surgical_comparables} comparables do"),
            adjusted,
        ));
    }

    let (chosen_id, chosen_amount) = closest_settlement(&settled, adjusted);
    trace.push(ValuationTraceStep::new(
        "closest_comparable",
        format!("settlement of case {chosen_id} is closest to the adjusted median"),
        chosen_amount,
    ));

    let adjustment_text = if adjustments.is_empty() {
        "no adjustments applied".to_string()
    } else {
        format!("adjusted to {} after {}", format_currency(adjusted), join_prose(&adjustments))
    };
    let rationale = format!(
        "Median of {} comparable settlements ranging from {} to {} is {}; {}. The closest comparable settlement is {} (case {}).",
        sorted.len(),
        format_currency(low),
        format_currency(high),
        format_currency(median),
        adjustment_text,
        format_currency(chosen_amount),
        chosen_id
    );

    AggregationOutcome {
        policy: AggregationPolicy::RangeMedian,
        evaluator_amount: chosen_amount,
        settlement_range: Some(SettlementRange { low, high }),
        source_case_ids: vec![chosen_id],
        rationale,
        trace,
        comparable_count: top.len(),
        degenerate: false,
    }
}

/// Mean of the top comparables scaled by learned multipliers plus specials.
///
/// `ranked` should already be truncated to the aggregation limit; only its first
/// `limit` entries are read either way.
pub fn aggregate_weighted_mean(
    query: &QueryCase,
    ranked: &[ScoredCase],
    limit: usize,
    weights: &LearnedWeights,
) -> AggregationOutcome {
    let top = &ranked[..ranked.len().min(limit)];
    let settled = positive_settlements(top);
    let Some(base) = mean(settled.iter().map(|(_, amount)| *amount)) else {
        return AggregationOutcome::degenerate(AggregationPolicy::WeightedMean, top.len());
    };

    let mut trace = vec![ValuationTraceStep::new(
        "mean",
        format!("mean of {} comparable settlements", settled.len()),
        base,
    )];
    let mut value = base;
    let mut factors = Vec::new();

    if let Some(label) = query.surgery_label() {
        if let Some(multiplier) = weights.surgery_multiplier(&label) {
            value = value.saturating_mul(multiplier);
            trace.push(ValuationTraceStep::new(
                "surgery_multiplier",
                format!("{label} x{}", multiplier.round_dp(4)),
                value,
            ));
            factors.push(format!("{label} surgery"));
        }
    }

    if let Some(label) = query.injection_label() {
        if let Some(multiplier) = weights.injection_multiplier(&label) {
            value = value.saturating_mul(multiplier);
            trace.push(ValuationTraceStep::new(
                "injection_multiplier",
                format!("{label} x{}", multiplier.round_dp(4)),
                value,
            ));
            factors.push(format!("{label} injections"));
        }
    }

    if let Some(severity) = query.tbi() {
        if let Some(multiplier) = weights.tbi_multiplier(severity) {
            value = value.saturating_mul(multiplier);
            trace.push(ValuationTraceStep::new(
                "tbi_multiplier",
                format!("{severity} TBI x{multiplier}"),
                value,
            ));
            factors.push(format!("{severity} TBI"));
        }
    }

    let mut specials = Vec::new();
    if let Some(medical) = query.medical_specials.filter(|amount| *amount > Decimal::ZERO) {
        value = value.saturating_add(medical.saturating_mul(weights.medical_specials_slope));
        trace.push(ValuationTraceStep::new(
            "medical_specials",
            format!("{} x{}", format_currency(medical), weights.medical_specials_slope),
            value,
        ));
        specials.push(format!("{} in medical specials", format_currency(medical)));
    }

    if let Some(howell) = query.howell_specials.filter(|amount| *amount > Decimal::ZERO) {
        value = value.saturating_add(howell.saturating_mul(weights.howell_specials_slope));
        trace.push(ValuationTraceStep::new(
            "howell_specials",
            format!("{} x{}", format_currency(howell), weights.howell_specials_slope),
            value,
        ));
        specials.push(format!("{} in Howell-adjusted specials", format_currency(howell)));
    }

    let rounded = round_to_increment(value, Decimal::from(ROUNDING_INCREMENT));
    trace.push(ValuationTraceStep::new("rounding", "nearest $500", rounded));

    let mut rationale = format!(
        "Based on {} comparable cases with an average settlement of {}",
        settled.len(),
        format_currency(base)
    );
    if !factors.is_empty() {
        rationale.push_str(&format!(", considering {}", join_prose(&factors)));
    }
    if !specials.is_empty() {
        rationale.push_str(&format!(", plus {}", join_prose(&specials)));
    }
    rationale.push_str(&format!(", the estimated settlement value is {}.", format_currency(rounded)));

    AggregationOutcome {
        policy: AggregationPolicy::WeightedMean,
        evaluator_amount: rounded,
        settlement_range: None,
        source_case_ids: settled.iter().map(|(id, _)| *id).collect(),
        rationale,
        trace,
        comparable_count: top.len(),
        degenerate: false,
    }
}

fn positive_settlements(comparables: &[ScoredCase]) -> Vec<(CaseId, Decimal)> {
    comparables
        .iter()
        .filter_map(|scored| scored.case.positive_settlement().map(|amount| (scored.case.id, amount)))
        .collect()
}

fn median_of_sorted(sorted: &[Decimal]) -> Decimal {
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let (lower, upper) = (sorted[middle - 1], sorted[middle]);
        lower + (upper - lower) / Decimal::from(2)
    } else {
        sorted[middle]
    }
}

/// Closest amount to `target`; equal distances resolve to the smaller amount,
/// then to the higher-ranked comparable.
fn closest_settlement(settled: &[(CaseId, Decimal)], target: Decimal) -> (CaseId, Decimal) {
    let mut best = settled[0];
    for candidate in &settled[1..] {
        let candidate_distance = (candidate.1 - target).abs();
        let best_distance = (best.1 - target).abs();
        if candidate_distance < best_distance
            || (candidate_distance == best_distance && candidate.1 < best.1)
        {
            best = *candidate;
        }
    }
    best
}

/// Joins items as prose: `a`, `a and b`, `a, b, and c`.
pub fn join_prose<T: AsRef<str>>(items: &[T]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [rest @ .., last] => {
            let head = rest.iter().map(|item| item.as_ref()).collect::<Vec<_>>().join(", ");
            format!("{head}, and {}", last.as_ref())
        }
    }
}
