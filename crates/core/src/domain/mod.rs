pub mod case;
pub mod valuation;
