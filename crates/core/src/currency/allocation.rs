//! Equal-split allocation in integer minor units.
//!
//! Allocations always sum EXACTLY to the original total (no cents lost):
//! 1. Divide the total minor units by the number of recipients (floor)
//! 2. The remainder is strictly less than the recipient count
//! 3. The first `remainder` recipients each receive one extra unit

use rust_decimal::Decimal;

use super::rules::{scale_from_minor, scale_to_minor};

/// Allocation utility for distributing amounts.
pub struct AllocationUtil;

impl AllocationUtil {
    /// Split integer minor units equally across `count` recipients.
    ///
    /// Recipients earlier in the order receive the extra units. An empty vector
    /// is returned for zero recipients.
    ///
    /// # Example
    ///
    /// ```
    /// use splitzies_core::currency::AllocationUtil;
    ///
    /// assert_eq!(AllocationUtil::allocate_equal_minor(1000, 3), vec![334, 333, 333]);
    /// ```
    #[must_use]
    pub fn allocate_equal_minor(total: i128, count: usize) -> Vec<i128> {
        if count == 0 {
            return vec![];
        }
        let Ok(n) = i128::try_from(count) else {
            return vec![];
        };

        let base = total.div_euclid(n);
        let remainder = total.rem_euclid(n);
        // remainder < n, so it fits a usize
        let extra_count = usize::try_from(remainder).unwrap_or(0);

        (0..count)
            .map(|i| if i < extra_count { base + 1 } else { base })
            .collect()
    }

    /// Allocate a decimal amount equally across `count` recipients.
    ///
    /// The total is first rounded to `decimal_places`; the sum of the
    /// allocations equals that rounded total.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use splitzies_core::currency::AllocationUtil;
    ///
    /// // 100 / 3 = [33.34, 33.33, 33.33], sum = 100.00
    /// let result = AllocationUtil::allocate_equal(dec!(100), 3, 2);
    /// assert_eq!(result.iter().sum::<rust_decimal::Decimal>(), dec!(100));
    /// ```
    #[must_use]
    pub fn allocate_equal(total: Decimal, count: usize, decimal_places: u32) -> Vec<Decimal> {
        Self::allocate_equal_minor(scale_to_minor(total, decimal_places), count)
            .into_iter()
            .map(|minor| scale_from_minor(minor, decimal_places))
            .collect()
    }
}
