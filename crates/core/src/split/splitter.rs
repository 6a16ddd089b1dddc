//! Equal-split allocation of item totals across assigned participants.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use splitzies_shared::types::{AssignmentId, ItemId, ParticipantId};

use crate::currency::{AllocationUtil, CurrencyRules};
use crate::currency::rules::scale_from_minor;
use crate::receipt::{Assignment, Item};

/// One participant's share of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Assignment the share was computed for.
    pub assignment_id: AssignmentId,
    /// Participant who owes the share.
    pub participant_id: ParticipantId,
    /// Item being shared.
    pub item_id: ItemId,
    /// Share in integer minor units.
    pub minor_units: i128,
}

/// Result of splitting a receipt.
///
/// Allocations are listed item by item (in the order items were given) and
/// within an item in split order.
#[derive(Debug, Clone, Default)]
pub struct BillSplit {
    decimal_places: u32,
    allocations: Vec<Allocation>,
    by_pair: HashMap<(ParticipantId, ItemId), usize>,
    by_assignment: HashMap<AssignmentId, usize>,
    totals: HashMap<ParticipantId, i128>,
    participant_order: Vec<ParticipantId>,
}

impl BillSplit {
    /// Share of `item` owed by `participant`, or `None` when not assigned.
    #[must_use]
    pub fn amount_for(&self, participant: ParticipantId, item: ItemId) -> Option<Decimal> {
        self.minor_for(participant, item)
            .map(|minor| self.to_decimal(minor))
    }

    /// Share in minor units of `item` owed by `participant`.
    #[must_use]
    pub fn minor_for(&self, participant: ParticipantId, item: ItemId) -> Option<i128> {
        self.by_pair
            .get(&(participant, item))
            .map(|&idx| self.allocations[idx].minor_units)
    }

    /// Share computed for an assignment record.
    #[must_use]
    pub fn amount_for_assignment(&self, assignment: AssignmentId) -> Option<Decimal> {
        self.by_assignment
            .get(&assignment)
            .map(|&idx| self.to_decimal(self.allocations[idx].minor_units))
    }

    /// Total owed by `participant` across every item; zero when unassigned.
    #[must_use]
    pub fn total_for(&self, participant: ParticipantId) -> Decimal {
        self.to_decimal(self.total_minor_for(participant))
    }

    /// Total owed by `participant` in minor units.
    #[must_use]
    pub fn total_minor_for(&self, participant: ParticipantId) -> i128 {
        self.totals.get(&participant).copied().unwrap_or_default()
    }

    /// Participants with at least one allocation, in order of first appearance.
    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.participant_order.iter().copied()
    }

    /// Every allocation.
    #[must_use]
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Sum of every allocation in minor units.
    #[must_use]
    pub fn grand_total_minor(&self) -> i128 {
        self.allocations.iter().map(|a| a.minor_units).sum()
    }

    /// Minor-unit digits the split was computed with.
    #[must_use]
    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    fn to_decimal(&self, minor: i128) -> Decimal {
        scale_from_minor(minor, self.decimal_places)
    }

    fn push(&mut self, allocation: Allocation) {
        let idx = self.allocations.len();
        self.by_pair
            .insert((allocation.participant_id, allocation.item_id), idx);
        self.by_assignment.insert(allocation.assignment_id, idx);
        if !self.totals.contains_key(&allocation.participant_id) {
            self.participant_order.push(allocation.participant_id);
        }
        *self.totals.entry(allocation.participant_id).or_default() += allocation.minor_units;
        self.allocations.push(allocation);
    }
}

/// Computes equal splits.
pub struct BillSplitter;

impl BillSplitter {
    /// Split every item's total equally among its assigned participants.
    ///
    /// - Split order per item is first-assigned order: `(created_at, id)`
    /// - Each item total is converted to integer minor units of `currency`
    /// - The first `total % n` participants receive one extra minor unit
    /// - Items nobody is assigned to produce no allocation
    /// - Assignments for unknown items and repeated pairs are ignored
    /// - Custom owed amounts do not change the split
    #[must_use]
    pub fn compute(items: &[Item], assignments: &[Assignment], currency: Option<&str>) -> BillSplit {
        let decimal_places = CurrencyRules::decimal_places(currency);
        let mut split = BillSplit {
            decimal_places,
            ..BillSplit::default()
        };

        let known_items: HashSet<ItemId> = items.iter().map(|i| i.id).collect();

        let mut ordered: Vec<&Assignment> = assignments.iter().collect();
        ordered.sort_by_key(|a| (a.created_at, a.id));

        let mut seen = HashSet::new();
        let mut by_item: HashMap<ItemId, Vec<&Assignment>> = HashMap::new();
        for assignment in ordered {
            if !known_items.contains(&assignment.item_id) {
                continue;
            }
            if !seen.insert((assignment.participant_id, assignment.item_id)) {
                continue;
            }
            by_item.entry(assignment.item_id).or_default().push(assignment);
        }

        for item in items {
            let Some(assigned) = by_item.get(&item.id) else {
                continue;
            };
            let total_minor = CurrencyRules::to_minor_units(item.total_price, currency);
            let shares = AllocationUtil::allocate_equal_minor(total_minor, assigned.len());

            for (assignment, minor_units) in assigned.iter().zip(shares) {
                split.push(Allocation {
                    assignment_id: assignment.id,
                    participant_id: assignment.participant_id,
                    item_id: item.id,
                    minor_units,
                });
            }
        }

        split
    }
}
