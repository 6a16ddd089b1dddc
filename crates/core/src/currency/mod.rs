//! Currency precision, rounding and equal allocation.

pub mod allocation;
pub mod amount;
pub mod rules;

#[cfg(test)]
mod props;

pub use allocation::AllocationUtil;
pub use amount::Amount;
pub use rules::{CurrencyRules, MONEY_ROUNDING, round_dp};
