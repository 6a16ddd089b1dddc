//! Property-based tests for the bill splitter.
//!
//! - Conservation: shares of an item sum to its total in minor units
//! - Determinism: recomputing yields identical shares
//! - Tie-break: extra units go to the earliest assignees regardless of input order

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use splitzies_shared::types::{AssignmentId, ItemId, ParticipantId, ReceiptId};

use super::splitter::BillSplitter;
use crate::receipt::{Assignment, Item};

fn fixture(total_minor: i64, participants: usize) -> (Item, Vec<ParticipantId>, Vec<Assignment>) {
    let receipt_id = ReceiptId::new();
    let total = Decimal::new(total_minor, 2);
    let item = Item {
        id: ItemId::new(),
        receipt_id,
        name: "Shared".to_string(),
        quantity: 1,
        total_price: total,
        price_per_item: total,
    };
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap_or_default();
    let people: Vec<ParticipantId> = (0..participants).map(|_| ParticipantId::new()).collect();
    let assignments = people
        .iter()
        .enumerate()
        .map(|(i, p)| Assignment {
            id: AssignmentId::new(),
            participant_id: *p,
            item_id: item.id,
            custom_amount: None,
            created_at: base + Duration::seconds(i64::try_from(i).unwrap_or_default()),
        })
        .collect();
    (item, people, assignments)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Shares always sum exactly to the item total.
    #[test]
    fn prop_split_conserves_item_total(
        total_minor in 0i64..10_000_000,
        participants in 1usize..60,
    ) {
        let (item, _, assignments) = fixture(total_minor, participants);
        let split = BillSplitter::compute(std::slice::from_ref(&item), &assignments, Some("USD"));

        prop_assert_eq!(split.allocations().len(), participants);
        prop_assert_eq!(split.grand_total_minor(), i128::from(total_minor));
    }

    /// Recomputing the split on shuffled input gives the same shares.
    #[test]
    fn prop_split_is_order_independent(
        total_minor in 0i64..1_000_000,
        (participants, order) in (1usize..30).prop_flat_map(|n| {
            (Just(n), Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
        }),
    ) {
        let (item, people, assignments) = fixture(total_minor, participants);
        let first = BillSplitter::compute(std::slice::from_ref(&item), &assignments, None);

        let shuffled: Vec<Assignment> = order.iter().map(|&i| assignments[i].clone()).collect();
        let second = BillSplitter::compute(std::slice::from_ref(&item), &shuffled, None);

        for p in &people {
            prop_assert_eq!(first.minor_for(*p, item.id), second.minor_for(*p, item.id));
        }
    }

    /// The extra units go to the earliest assignees.
    #[test]
    fn prop_remainder_goes_to_earliest(
        total_minor in 0i64..1_000_000,
        participants in 1usize..30,
    ) {
        let (item, people, assignments) = fixture(total_minor, participants);
        let split = BillSplitter::compute(std::slice::from_ref(&item), &assignments, None);

        let n = i128::try_from(participants).unwrap_or(1);
        let total = i128::from(total_minor);
        let remainder = usize::try_from(total % n).unwrap_or(0);
        for (idx, p) in people.iter().enumerate() {
            let expected = total / n + i128::from(idx < remainder);
            prop_assert_eq!(split.minor_for(*p, item.id), Some(expected));
        }
    }
}
