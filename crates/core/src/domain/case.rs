use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{parse_currency, parse_percentage};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CaseId(pub i64);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved claim from the historical corpus.
///
/// Every descriptive field is free text as captured at intake. An empty string
/// means the value was never recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalCase {
    pub id: CaseId,
    pub category: String,
    pub venue: String,
    pub surgery: String,
    pub injuries: String,
    pub liability_pct: String,
    pub policy_limit: String,
    pub settlement: String,
    pub accident_type: String,
    pub injection: String,
}

impl HistoricalCase {
    pub fn settlement_amount(&self) -> Option<Decimal> {
        parse_currency(&self.settlement)
    }

    /// Settlement usable for aggregation: parseable and strictly positive.
    pub fn positive_settlement(&self) -> Option<Decimal> {
        self.settlement_amount().filter(|amount| *amount > Decimal::ZERO)
    }

    pub fn policy_limit_amount(&self) -> Option<Decimal> {
        parse_currency(&self.policy_limit)
    }

    pub fn liability_percentage(&self) -> Option<f64> {
        parse_percentage(&self.liability_pct)
    }

    pub fn surgery_label(&self) -> Option<String> {
        normalize_label(&self.surgery)
    }

    pub fn injection_label(&self) -> Option<String> {
        normalize_label(&self.injection)
    }

    pub fn has_surgery(&self) -> bool {
        self.surgery_label().is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TbiSeverity {
    Mild,
    Moderate,
    Severe,
}

impl TbiSeverity {
    pub const ALL: [TbiSeverity; 3] = [Self::Mild, Self::Moderate, Self::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mild" => Some(Self::Mild),
            "moderate" => Some(Self::Moderate),
            "severe" => Some(Self::Severe),
            _ => None,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Mild),
            2 => Some(Self::Moderate),
            3 => Some(Self::Severe),
            _ => None,
        }
    }
}

impl fmt::Display for TbiSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The claim being valued. Built once per valuation request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryCase {
    pub category: String,
    pub venue: String,
    pub surgery: String,
    pub injuries: String,
    pub liability_pct: String,
    pub policy_limit: String,
    pub accident_type: String,
    pub injection: String,
    pub medical_specials: Option<Decimal>,
    pub howell_specials: Option<Decimal>,
    pub age: Option<u32>,
    pub tbi_level: Option<u8>,
    pub tbi_severity: Option<String>,
    pub surgery_count: Option<u32>,
    pub injection_count: Option<u32>,
    pub surgery_type: Option<String>,
    pub injection_type: Option<String>,
}

impl QueryCase {
    pub fn policy_limit_amount(&self) -> Option<Decimal> {
        parse_currency(&self.policy_limit)
    }

    /// Policy limit that can act as a ceiling: parseable and strictly positive.
    pub fn known_policy_limit(&self) -> Option<Decimal> {
        self.policy_limit_amount().filter(|limit| *limit > Decimal::ZERO)
    }

    pub fn liability_percentage(&self) -> Option<f64> {
        parse_percentage(&self.liability_pct)
    }

    /// Surgery type label, falling back to the surgery description.
    pub fn surgery_label(&self) -> Option<String> {
        self.surgery_type
            .as_deref()
            .and_then(normalize_label)
            .or_else(|| normalize_label(&self.surgery))
    }

    /// Injection type label, falling back to the injection description.
    pub fn injection_label(&self) -> Option<String> {
        self.injection_type
            .as_deref()
            .and_then(normalize_label)
            .or_else(|| normalize_label(&self.injection))
    }

    pub fn has_surgery(&self) -> bool {
        self.surgery_label().is_some()
    }

    /// Explicit severity label wins over the numeric level.
    pub fn tbi(&self) -> Option<TbiSeverity> {
        self.tbi_severity
            .as_deref()
            .and_then(TbiSeverity::parse)
            .or_else(|| self.tbi_level.and_then(TbiSeverity::from_level))
    }
}

/// Trims and lowercases a category label; empty and `"none"` mean absent.
pub fn normalize_label(value: &str) -> Option<String> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() || normalized == "none" {
        None
    } else {
        Some(normalized)
    }
}
