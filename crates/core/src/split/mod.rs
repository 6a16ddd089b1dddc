//! Bill splitting: per-participant shares of assigned items.

pub mod splitter;

#[cfg(test)]
mod splitter_props;

pub use splitter::{Allocation, BillSplit, BillSplitter};
