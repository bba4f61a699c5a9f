//! Additive point scoring of one historical case against the claim being valued.
//!
//! Each factor contributes independently and nothing is normalized, so a score is
//! only meaningful relative to other scores computed for the same query.

use serde::{Deserialize, Serialize};

use crate::domain::case::{HistoricalCase, QueryCase};

pub const VENUE_MATCH_POINTS: f64 = 100.0;
pub const SURGERY_MATCH_POINTS: f64 = 50.0;
pub const INJURY_OVERLAP_POINTS: f64 = 25.0;
pub const LIABILITY_PROXIMITY_POINTS: f64 = 15.0;
pub const LIABILITY_BAND_PCT: f64 = 25.0;
pub const ACCIDENT_TYPE_MATCH_POINTS: f64 = 10.0;

/// Injury tokens must be longer than this many characters to count.
const MIN_INJURY_TOKEN_CHARS: usize = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub venue: f64,
    pub surgery: f64,
    pub injury_overlap: f64,
    pub liability: f64,
    pub accident_type: f64,
}

impl ScoreComponents {
    pub fn total(&self) -> f64 {
        self.venue + self.surgery + self.injury_overlap + self.liability + self.accident_type
    }
}

pub trait SimilarityScorer: Send + Sync {
    fn components(&self, query: &QueryCase, candidate: &HistoricalCase) -> ScoreComponents;

    fn score(&self, query: &QueryCase, candidate: &HistoricalCase) -> f64 {
        self.components(query, candidate).total()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicSimilarityScorer;

impl SimilarityScorer for DeterministicSimilarityScorer {
    fn components(&self, query: &QueryCase, candidate: &HistoricalCase) -> ScoreComponents {
        score_components(query, candidate)
    }
}

pub fn score_components(query: &QueryCase, candidate: &HistoricalCase) -> ScoreComponents {
    ScoreComponents {
        venue: exact_match_points(&query.venue, &candidate.venue, VENUE_MATCH_POINTS),
        surgery: exact_match_points(&query.surgery, &candidate.surgery, SURGERY_MATCH_POINTS),
        injury_overlap: injury_overlap_fraction(&query.injuries, &candidate.injuries)
            * INJURY_OVERLAP_POINTS,
        liability: liability_points(query.liability_percentage(), candidate.liability_percentage()),
        accident_type: exact_match_points(
            &query.accident_type,
            &candidate.accident_type,
            ACCIDENT_TYPE_MATCH_POINTS,
        ),
    }
}

fn exact_match_points(left: &str, right: &str, points: f64) -> f64 {
    let left = left.trim();
    let right = right.trim();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    if left.to_lowercase() == right.to_lowercase() {
        points
    } else {
        0.0
    }
}

/// Fraction of query injury tokens that share a substring with some candidate token.
pub fn injury_overlap_fraction(query_injuries: &str, candidate_injuries: &str) -> f64 {
    let query_tokens = injury_tokens(query_injuries);
    if query_tokens.is_empty() {
        return 0.0;
    }

    let candidate_tokens = injury_tokens(candidate_injuries);
    if candidate_tokens.is_empty() {
        return 0.0;
    }

    let matched = query_tokens
        .iter()
        .filter(|query_token| {
            candidate_tokens.iter().any(|candidate_token| {
                candidate_token.contains(query_token.as_str())
                    || query_token.contains(candidate_token.as_str())
            })
        })
        .count();

    matched as f64 / query_tokens.len() as f64
}

fn injury_tokens(injuries: &str) -> Vec<String> {
    injuries
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() > MIN_INJURY_TOKEN_CHARS)
        .collect()
}

fn liability_points(query_pct: Option<f64>, candidate_pct: Option<f64>) -> f64 {
    let (Some(query_pct), Some(candidate_pct)) = (query_pct, candidate_pct) else {
        return 0.0;
    };

    let difference = (query_pct - candidate_pct).abs();
    if difference > LIABILITY_BAND_PCT {
        return 0.0;
    }

    (LIABILITY_PROXIMITY_POINTS - (difference / LIABILITY_BAND_PCT) * LIABILITY_PROXIMITY_POINTS)
        .max(0.0)
}
