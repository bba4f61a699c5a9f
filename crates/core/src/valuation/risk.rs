//! Step-function estimate of how likely a settlement is to breach the policy limit.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `(exclusive upper bound of settlement / limit, risk percent)`, checked in order.
const RISK_BANDS: [(i64, u8); 5] = [(50, 5), (70, 15), (85, 35), (95, 60), (100, 85)];
const MAX_RISK_PCT: u8 = 95;

/// Percent risk that `settlement` exceeds `policy_limit`.
///
/// An unknown, zero or negative limit carries no measurable exposure and yields 0.
pub fn policy_exceedance_risk(settlement: Decimal, policy_limit: Option<Decimal>) -> u8 {
    let Some(limit) = policy_limit.filter(|limit| *limit > Decimal::ZERO) else {
        return 0;
    };

    let Some(ratio) = settlement.checked_div(limit) else {
        return if settlement.is_sign_negative() { RISK_BANDS[0].1 } else { MAX_RISK_PCT };
    };
    RISK_BANDS
        .iter()
        .find(|(upper_hundredths, _)| ratio < Decimal::new(*upper_hundredths, 2))
        .map(|(_, risk)| *risk)
        .unwrap_or(MAX_RISK_PCT)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_percent(risk: u8) -> Self {
        match risk {
            0..=15 => Self::Low,
            16..=35 => Self::Moderate,
            36..=60 => Self::High,
            _ => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
