// ⚖️ Proration - split a month's total cost by weeks stayed
// Pure functions over decoded month blocks; the engine feeds them data,
// they never touch the grid.

use crate::records::MonthBlock;
use std::collections::BTreeMap;

/// Amounts owed by each unpaid tenant for one month.
///
/// Each unpaid line item owes `(rent + utility) * weeks / total_weeks`,
/// where `total_weeks` sums over ALL line items - paid tenants still
/// count toward the denominator, they just owe nothing themselves. A
/// zero denominator is replaced with 1 so a month with no recorded stays
/// yields zeros instead of dividing by zero.
pub fn amounts_owed_for_month(block: &MonthBlock) -> BTreeMap<String, f64> {
    let mut total_weeks: f64 = block.line_items.values().map(|t| t.weeks_stayed).sum();
    if total_weeks == 0.0 {
        total_weeks = 1.0;
    }
    let total_cost = block.total_cost();

    block
        .line_items
        .values()
        .filter(|t| !t.is_paid)
        .map(|t| {
            let owed = total_cost * (t.weeks_stayed / total_weeks);
            (t.name.clone(), owed)
        })
        .collect()
}

/// Fold one month's owed amounts into a running per-tenant total. Only
/// tenants already present in `totals` accumulate; line items belonging
/// to since-removed tenants are ignored.
pub fn accumulate_owed(totals: &mut BTreeMap<String, f64>, month_owed: &BTreeMap<String, f64>) {
    for (name, total) in totals.iter_mut() {
        if let Some(owed) = month_owed.get(name) {
            *total += owed;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{LineItem, MonthBlock, YearMonth};

    fn block_with(items: &[(&str, f64, bool)], rent: f64, utility: f64) -> MonthBlock {
        let mut block = MonthBlock::empty(YearMonth::new(2021, 9));
        block.total_rent = rent;
        block.total_utility = utility;
        for (name, weeks, paid) in items {
            block.line_items.insert(
                name.to_string(),
                LineItem {
                    name: name.to_string(),
                    weeks_stayed: *weeks,
                    is_paid: *paid,
                },
            );
        }
        block
    }

    #[test]
    fn test_proration_splits_by_weeks() {
        // 4 + 4 + 2 + 2 = 12 total weeks, $2110.18 total cost
        let block = block_with(
            &[("A", 4.0, false), ("B", 4.0, false), ("C", 2.0, false), ("D", 2.0, true)],
            1697.00,
            413.18,
        );
        let owed = amounts_owed_for_month(&block);

        assert!((owed["A"] - 703.39).abs() < 0.005);
        assert!((owed["B"] - 703.39).abs() < 0.005);
        assert!((owed["C"] - 351.70).abs() < 0.005);
        // Paid tenants owe nothing for the month
        assert!(!owed.contains_key("D"));
    }

    #[test]
    fn test_paid_tenants_still_count_in_denominator() {
        let block = block_with(&[("A", 2.0, false), ("B", 2.0, true)], 100.0, 0.0);
        let owed = amounts_owed_for_month(&block);
        // A owes half, not the whole bill, because B's weeks still count
        assert!((owed["A"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_cost_owes_zero() {
        let block = block_with(&[("A", 4.0, false), ("B", 3.0, false)], 0.0, 0.0);
        let owed = amounts_owed_for_month(&block);
        assert_eq!(owed["A"], 0.0);
        assert_eq!(owed["B"], 0.0);
    }

    #[test]
    fn test_zero_weeks_does_not_divide_by_zero() {
        let block = block_with(&[("A", 0.0, false)], 1500.0, 200.0);
        let owed = amounts_owed_for_month(&block);
        assert_eq!(owed["A"], 0.0);
    }

    #[test]
    fn test_unpaid_share_of_total() {
        let block = block_with(
            &[("A", 4.0, false), ("B", 4.0, false), ("C", 2.0, false), ("D", 2.0, true)],
            1697.00,
            413.18,
        );
        let owed = amounts_owed_for_month(&block);
        let unpaid_sum: f64 = owed.values().sum();
        // Sum of unpaid owed = total cost * (unpaid weeks / all weeks)
        let expected = 2110.18 * (10.0 / 12.0);
        assert!((unpaid_sum - expected).abs() < 1e-9);
    }

    #[test]
    fn test_accumulate_ignores_unknown_names() {
        let mut totals = BTreeMap::new();
        totals.insert("A".to_string(), 0.0);

        let mut month_owed = BTreeMap::new();
        month_owed.insert("A".to_string(), 100.0);
        month_owed.insert("Removed Tenant".to_string(), 50.0);

        accumulate_owed(&mut totals, &month_owed);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals["A"], 100.0);
    }
}
