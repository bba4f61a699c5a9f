use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::case::{HistoricalCase, QueryCase};
use crate::valuation::similarity::{
    DeterministicSimilarityScorer, ScoreComponents, SimilarityScorer,
};

/// Nearest cases surfaced for display and reports.
pub const NEAREST_CASES_LIMIT: usize = 5;
/// Comparables feeding the statistical aggregation.
pub const AGGREGATION_LIMIT: usize = 25;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCase {
    pub case: HistoricalCase,
    pub score: f64,
    pub components: ScoreComponents,
}

#[derive(Clone, Debug)]
pub struct ComparableSelector<S = DeterministicSimilarityScorer> {
    scorer: S,
}

impl Default for ComparableSelector {
    fn default() -> Self {
        Self::new(DeterministicSimilarityScorer)
    }
}

impl<S: SimilarityScorer> ComparableSelector<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    /// Scores every corpus entry and keeps the `limit` best, highest first.
    ///
    /// The sort is stable, so equal scores keep corpus order.
    pub fn select(
        &self,
        query: &QueryCase,
        corpus: &[HistoricalCase],
        limit: usize,
    ) -> Vec<ScoredCase> {
        let mut scored = corpus
            .iter()
            .map(|case| {
                let components = self.scorer.components(query, case);
                ScoredCase { case: case.clone(), score: components.total(), components }
            })
            .collect::<Vec<_>>();

        scored.sort_by(|left, right| {
            right.score.partial_cmp(&left.score).unwrap_or(Ordering::Equal)
        });
        scored.truncate(limit);
        scored
    }

    /// Ranks the whole corpus.
    pub fn rank_all(&self, query: &QueryCase, corpus: &[HistoricalCase]) -> Vec<ScoredCase> {
        self.select(query, corpus, corpus.len())
    }
}

#[cfg(test)]
mod tests {
    use super::{ComparableSelector, NEAREST_CASES_LIMIT};
    use crate::domain::case::{CaseId, HistoricalCase, QueryCase};
    use crate::valuation::similarity::{ScoreComponents, SimilarityScorer};

    fn corpus() -> Vec<HistoricalCase> {
        let venues = ["Fresno", "Los Angeles", "Fresno", "Orange", "Los Angeles", "Fresno", "Kern"];
        venues
            .iter()
            .enumerate()
            .map(|(index, venue)| HistoricalCase {
                id: CaseId(index as i64 + 1),
                venue: venue.to_string(),
                accident_type: if index % 2 == 0 { "rear-end" } else { "slip and fall" }
                    .to_string(),
                ..HistoricalCase::default()
            })
            .collect()
    }

    fn query() -> QueryCase {
        QueryCase {
            venue: "fresno".to_string(),
            accident_type: "Rear-End".to_string(),
            ..QueryCase::default()
        }
    }

    #[test]
    fn selection_is_bounded_and_sorted_descending() {
        let selector = ComparableSelector::default();
        let selected = selector.select(&query(), &corpus(), NEAREST_CASES_LIMIT);

        assert_eq!(selected.len(), NEAREST_CASES_LIMIT);
        assert!(selected.windows(2).all(|pair| pair[0].score >= pair[1].score));
        assert_eq!(selected[0].score, 110.0);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let selector = ComparableSelector::default();
        let selected = selector.select(&query(), &corpus(), 3);

        let ids = selected.iter().map(|scored| scored.case.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![CaseId(1), CaseId(3), CaseId(6)]);
        assert_eq!(selected[2].score, 100.0);
    }

    #[test]
    fn oversized_limit_returns_whole_corpus_sorted() {
        let selector = ComparableSelector::default();
        let corpus = corpus();
        let selected = selector.select(&query(), &corpus, 100);

        assert_eq!(selected.len(), corpus.len());
        assert!(selected.windows(2).all(|pair| pair[0].score >= pair[1].score));
        assert_eq!(selector.rank_all(&query(), &corpus), selected);
    }

    #[test]
    fn empty_corpus_yields_no_comparables() {
        let selector = ComparableSelector::default();
        assert!(selector.select(&query(), &[], 25).is_empty());
    }

    #[test]
    fn selector_supports_custom_scorers() {
        struct IdScorer;

        impl SimilarityScorer for IdScorer {
            fn components(&self, _query: &QueryCase, candidate: &HistoricalCase) -> ScoreComponents {
                ScoreComponents { venue: candidate.id.0 as f64, ..ScoreComponents::default() }
            }
        }

        let selector = ComparableSelector::new(IdScorer);
        let selected = selector.select(&query(), &corpus(), 2);
        let ids = selected.iter().map(|scored| scored.case.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![CaseId(7), CaseId(6)]);
    }
}
