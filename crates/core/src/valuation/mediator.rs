use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::valuation::MediatorProposal;
use crate::money::round_to_increment;

pub const DEFAULT_PROPOSAL_VALIDITY_DAYS: u64 = 7;
pub const PROPOSAL_ROUNDING_INCREMENT: i64 = 500;

pub fn policy_cap_ratio() -> Decimal {
    Decimal::new(90, 2)
}

pub fn proposal_discount() -> Decimal {
    Decimal::new(95, 2)
}

pub fn range_low_ratio() -> Decimal {
    Decimal::new(95, 2)
}

pub fn range_high_ratio() -> Decimal {
    Decimal::new(105, 2)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediatorPolicy {
    pub validity_days: u64,
    pub rounding_increment: Decimal,
}

impl Default for MediatorPolicy {
    fn default() -> Self {
        Self {
            validity_days: DEFAULT_PROPOSAL_VALIDITY_DAYS,
            rounding_increment: Decimal::from(PROPOSAL_ROUNDING_INCREMENT),
        }
    }
}

impl MediatorPolicy {
    /// Turns an evaluator amount into a negotiation proposal.
    ///
    /// Only a strictly positive `policy_limit` acts as a ceiling. The result always
    /// satisfies `range_low <= proposal <= range_high`, and with a known limit no
    /// field exceeds it.
    pub fn propose(
        &self,
        evaluator_amount: Decimal,
        policy_limit: Option<Decimal>,
        today: NaiveDate,
    ) -> MediatorProposal {
        let limit = policy_limit.filter(|limit| *limit > Decimal::ZERO);

        let raw = match limit {
            Some(limit) => {
                let cap = limit * policy_cap_ratio();
                if evaluator_amount >= cap {
                    cap
                } else {
                    evaluator_amount * proposal_discount()
                }
            }
            None => evaluator_amount * proposal_discount(),
        };

        let mut proposal = self.round(raw);
        if let Some(limit) = limit {
            proposal = proposal.min(limit);
        }

        let range_low = self.round(proposal * range_low_ratio()).min(proposal);
        let mut range_high =
            self.round(proposal.saturating_mul(range_high_ratio())).max(proposal);
        if let Some(limit) = limit {
            range_high = range_high.min(limit);
        }

        MediatorProposal {
            proposal,
            expires_on: self.expires_on(today),
            range_low,
            range_high,
        }
    }

    pub fn expires_on(&self, today: NaiveDate) -> NaiveDate {
        today.checked_add_days(Days::new(self.validity_days)).unwrap_or(NaiveDate::MAX)
    }

    fn round(&self, amount: Decimal) -> Decimal {
        round_to_increment(amount, self.rounding_increment).normalize()
    }
}

/// Proposal under the default seven-day validity and $500 rounding.
pub fn propose(
    evaluator_amount: Decimal,
    policy_limit: Option<Decimal>,
    today: NaiveDate,
) -> MediatorProposal {
    MediatorPolicy::default().propose(evaluator_amount, policy_limit, today)
}
