//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{CurrencyCode, DEFAULT_MINOR_UNITS, MAX_MINOR_UNITS, minor_unit_digits};
