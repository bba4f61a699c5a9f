//! Category multipliers learned from the corpus, cached for a fixed window.
//!
//! Surgery and injection multipliers are the ratio of a label's mean settlement to
//! the corpus-wide mean. TBI multipliers and the specials slopes are fixed,
//! reviewer-auditable constants rather than fitted values.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::case::{normalize_label, HistoricalCase, TbiSeverity};
use crate::valuation::error::ValuationError;

pub const DEFAULT_WEIGHTS_TTL_HOURS: i64 = 24;

/// Settlement dollars per dollar of billed medical specials.
pub fn medical_specials_slope() -> Decimal {
    Decimal::new(70, 2)
}

/// Settlement dollars per dollar of Howell/Hanif-adjusted specials.
pub fn howell_specials_slope() -> Decimal {
    Decimal::new(90, 2)
}

pub fn tbi_multiplier(severity: TbiSeverity) -> Decimal {
    match severity {
        TbiSeverity::Mild => Decimal::new(8, 1),
        TbiSeverity::Moderate => Decimal::new(11, 1),
        TbiSeverity::Severe => Decimal::new(14, 1),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedWeights {
    pub surgery_multipliers: BTreeMap<String, Decimal>,
    pub injection_multipliers: BTreeMap<String, Decimal>,
    pub tbi_multipliers: BTreeMap<String, Decimal>,
    pub medical_specials_slope: Decimal,
    pub howell_specials_slope: Decimal,
    pub overall_mean: Decimal,
    pub sample_size: usize,
    pub last_updated: DateTime<Utc>,
}

impl LearnedWeights {
    pub fn surgery_multiplier(&self, label: &str) -> Option<Decimal> {
        normalize_label(label).and_then(|key| self.surgery_multipliers.get(&key).copied())
    }

    pub fn injection_multiplier(&self, label: &str) -> Option<Decimal> {
        normalize_label(label).and_then(|key| self.injection_multipliers.get(&key).copied())
    }

    pub fn tbi_multiplier(&self, severity: TbiSeverity) -> Option<Decimal> {
        self.tbi_multipliers.get(severity.as_str()).copied()
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now < self.last_updated + ttl
    }
}

/// Derives weights from the full corpus.
///
/// Fails with `NoDataAvailable` when the corpus is empty or carries no positive,
/// parseable settlement to anchor the overall mean.
pub fn learn_weights(
    corpus: &[HistoricalCase],
    now: DateTime<Utc>,
) -> Result<LearnedWeights, ValuationError> {
    if corpus.is_empty() {
        return Err(ValuationError::no_data("historical corpus is empty"));
    }

    let settled = corpus
        .iter()
        .filter_map(|case| case.positive_settlement().map(|amount| (case, amount)))
        .collect::<Vec<_>>();
    let Some(overall_mean) = mean(settled.iter().map(|(_, amount)| *amount)) else {
        return Err(ValuationError::no_data(format!(
            "none of the {} historical cases carries a parseable settlement",
            corpus.len()
        )));
    };

    let mut surgery_groups: BTreeMap<String, Vec<Decimal>> = BTreeMap::new();
    let mut injection_groups: BTreeMap<String, Vec<Decimal>> = BTreeMap::new();
    for (case, amount) in &settled {
        if let Some(label) = case.surgery_label() {
            surgery_groups.entry(label).or_default().push(*amount);
        }
        if let Some(label) = case.injection_label() {
            injection_groups.entry(label).or_default().push(*amount);
        }
    }

    let tbi_multipliers = TbiSeverity::ALL
        .iter()
        .map(|severity| (severity.as_str().to_string(), tbi_multiplier(*severity)))
        .collect();

    Ok(LearnedWeights {
        surgery_multipliers: group_multipliers(surgery_groups, overall_mean),
        injection_multipliers: group_multipliers(injection_groups, overall_mean),
        tbi_multipliers,
        medical_specials_slope: medical_specials_slope(),
        howell_specials_slope: howell_specials_slope(),
        overall_mean,
        sample_size: settled.len(),
        last_updated: now,
    })
}

fn group_multipliers(
    groups: BTreeMap<String, Vec<Decimal>>,
    overall_mean: Decimal,
) -> BTreeMap<String, Decimal> {
    groups
        .into_iter()
        .filter_map(|(label, amounts)| {
            mean(amounts.into_iter())
                .and_then(|group_mean| group_mean.checked_div(overall_mean))
                .map(|multiplier| (label, multiplier))
        })
        .collect()
}

/// Arithmetic mean; `None` for an empty input or a sum outside the `Decimal` range.
pub(crate) fn mean(mut amounts: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    let (sum, count) = amounts.try_fold((Decimal::ZERO, 0u64), |(sum, count), amount| {
        sum.checked_add(amount).map(|sum| (sum, count + 1))
    })?;
    if count == 0 {
        return None;
    }
    sum.checked_div(Decimal::from(count))
}

/// Process-wide holder of the most recent [`LearnedWeights`].
///
/// The lock is held while recomputing, so concurrent callers that observe an
/// expired cache wait for one corpus scan instead of each running their own.
#[derive(Debug)]
pub struct WeightLearner {
    ttl: Duration,
    cache: Mutex<Option<LearnedWeights>>,
}

impl Default for WeightLearner {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_WEIGHTS_TTL_HOURS))
    }
}

impl WeightLearner {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, cache: Mutex::new(None) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns cached weights while fresh, otherwise recomputes from `corpus`.
    ///
    /// A failed recomputation leaves the previous cache in place.
    pub fn get_weights(
        &self,
        corpus: &[HistoricalCase],
        now: DateTime<Utc>,
    ) -> Result<LearnedWeights, ValuationError> {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(now, self.ttl) {
                debug!(
                    event_name = "valuation.weights.cache_hit",
                    last_updated = %cached.last_updated,
                    "reusing learned weights"
                );
                return Ok(cached.clone());
            }
        }

        let weights = learn_weights(corpus, now)?;
        info!(
            event_name = "valuation.weights.recomputed",
            corpus_size = corpus.len(),
            sample_size = weights.sample_size,
            surgery_labels = weights.surgery_multipliers.len(),
            injection_labels = weights.injection_multipliers.len(),
            "learned weights recomputed from corpus"
        );
        *cache = Some(weights.clone());
        Ok(weights)
    }

    pub fn cached(&self) -> Option<LearnedWeights> {
        match self.cache.lock() {
            Ok(cache) => cache.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn invalidate(&self) {
        match self.cache.lock() {
            Ok(mut cache) => *cache = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}
