// 📐 Sheet layout - row addressing for the position-addressed ledger
// The sheet has no schema; every record lives at a row computed from a
// configured epoch month and a fixed per-month block size. All business
// logic goes through the named offsets here so the layout can be swapped
// without touching the engine.

use crate::error::LedgerError;
use crate::records::YearMonth;
use serde::{Deserialize, Serialize};

// ============================================================================
// FIXED OFFSETS
// ============================================================================

/// Offsets within a month block, relative to its starting row:
///
/// ```text
/// <month/year e.g. "8/2021">
/// Total Rent,     <rent $ amt>
/// Total Utility,  <utility $ amt>
/// Name,           Weeks Stayed,   Paid?
/// Jake Deerin,    4,              False
/// Mac Mathis,     1.5,            True
/// ...
/// ```
pub const MONTH_LABEL_OFFSET: usize = 0;
pub const MONTH_RENT_OFFSET: usize = 1;
pub const MONTH_UTILITY_OFFSET: usize = 2;
pub const MONTH_HEADER_OFFSET: usize = 3;
pub const MONTH_ITEMS_OFFSET: usize = 4;

/// The roster block starts at row 1 with a header; tenant rows follow.
pub const ROSTER_HEADER_ROW: usize = 1;
pub const ROSTER_ITEMS_ROW: usize = 2;

pub const ROSTER_HEADER: [&str; 3] = ["Name", "Months Unpaid", "Stay Schedule"];
pub const MONTH_ITEMS_HEADER: [&str; 3] = ["Name", "Weeks Stayed", "Paid?"];

// ============================================================================
// LAYOUT
// ============================================================================

/// The addressing scheme: which rows belong to the roster and to each
/// month, given the epoch month the sheet starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub start_year: i32,
    pub start_month: u32,
    /// Roster capacity; also bounds the line items per month block.
    pub max_users: usize,
    /// Rows reserved per month, including the roster as "month zero".
    /// Must exceed max_users + the fixed header rows.
    pub month_block_size: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout {
            start_year: 2021,
            start_month: 8,
            max_users: 20,
            month_block_size: 25,
        }
    }
}

impl SheetLayout {
    /// Whole months elapsed from the epoch month to `ym` (negative for
    /// months before the epoch).
    pub fn months_from_epoch(&self, ym: YearMonth) -> i64 {
        12 * (ym.year as i64 - self.start_year as i64)
            + (ym.month as i64 - self.start_month as i64)
    }

    /// 1-based starting row of the given month's block. The +1 skips the
    /// leading block reserved for the roster.
    ///
    /// Injective over months at or after the epoch: distinct months land
    /// at least `month_block_size` rows apart. Months before the epoch
    /// have no row and are a configuration error, distinct from a month
    /// whose block merely hasn't been created yet.
    pub fn month_start_row(&self, ym: YearMonth) -> Result<usize, LedgerError> {
        let offset = self.months_from_epoch(ym);
        if offset < 0 {
            return Err(LedgerError::MonthBeforeEpoch {
                year: ym.year,
                month: ym.month,
            });
        }
        Ok(self.month_block_size * (offset as usize + 1))
    }

    /// The month `offset` whole months after the epoch month.
    pub fn month_at(&self, offset: usize) -> YearMonth {
        let total = (self.start_month as usize - 1) + offset;
        YearMonth::new(self.start_year + (total / 12) as i32, (total % 12) as u32 + 1)
    }

    // ------------------------------------------------------------------------
    // A1 range builders (all rows 1-based, columns fixed to A..C)
    // ------------------------------------------------------------------------

    /// Single-row range spanning columns A..C.
    pub fn row_range(&self, row: usize) -> String {
        format!("A{}:C{}", row, row)
    }

    /// Single cell in column A.
    pub fn label_range(&self, row: usize) -> String {
        format!("A{}:A{}", row, row)
    }

    /// Two-column range for the totals rows (label + amount).
    pub fn totals_range(&self, start_row: usize) -> String {
        format!("A{}:B{}", start_row, start_row + 1)
    }

    /// Fixed-capacity range holding `max_users` three-column rows.
    pub fn capacity_range(&self, first_row: usize) -> String {
        format!("A{}:C{}", first_row, first_row + self.max_users - 1)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_month_maps_to_first_block() {
        let layout = SheetLayout::default();
        let start = layout.month_start_row(YearMonth::new(2021, 8)).unwrap();
        assert_eq!(start, 25);
    }

    #[test]
    fn test_blocks_advance_by_block_size() {
        let layout = SheetLayout::default();
        assert_eq!(layout.month_start_row(YearMonth::new(2021, 9)).unwrap(), 50);
        assert_eq!(layout.month_start_row(YearMonth::new(2021, 12)).unwrap(), 125);
        // Year rollover
        assert_eq!(layout.month_start_row(YearMonth::new(2022, 8)).unwrap(), 325);
    }

    #[test]
    fn test_pre_epoch_month_is_a_configuration_error() {
        let layout = SheetLayout::default();
        assert_eq!(
            layout.month_start_row(YearMonth::new(2021, 7)).unwrap_err(),
            LedgerError::MonthBeforeEpoch { year: 2021, month: 7 }
        );
        // Not MonthNotFound: that condition is reserved for blocks that
        // were simply never created
        assert!(matches!(
            layout.month_start_row(YearMonth::new(2020, 12)).unwrap_err(),
            LedgerError::MonthBeforeEpoch { .. }
        ));
    }

    #[test]
    fn test_addressing_is_injective() {
        // Any two distinct months within a several-year window must start
        // at least one whole block apart.
        let layout = SheetLayout::default();
        let mut rows = Vec::new();
        for year in 2021..2026 {
            for month in 1..=12u32 {
                let ym = YearMonth::new(year, month);
                if layout.months_from_epoch(ym) < 0 {
                    continue;
                }
                rows.push(layout.month_start_row(ym).unwrap());
            }
        }
        rows.sort_unstable();
        for pair in rows.windows(2) {
            assert!(pair[1] - pair[0] >= layout.month_block_size);
        }
    }

    #[test]
    fn test_block_fits_header_and_capacity() {
        let layout = SheetLayout::default();
        assert!(layout.month_block_size > MONTH_ITEMS_OFFSET + layout.max_users);
    }

    #[test]
    fn test_month_at_inverts_months_from_epoch() {
        let layout = SheetLayout::default();
        for offset in 0..40 {
            let ym = layout.month_at(offset);
            assert_eq!(layout.months_from_epoch(ym), offset as i64);
        }
        assert_eq!(layout.month_at(0), YearMonth::new(2021, 8));
        assert_eq!(layout.month_at(5), YearMonth::new(2022, 1));
    }

    #[test]
    fn test_range_builders() {
        let layout = SheetLayout::default();
        assert_eq!(layout.row_range(28), "A28:C28");
        assert_eq!(layout.label_range(25), "A25:A25");
        assert_eq!(layout.totals_range(26), "A26:B27");
        assert_eq!(layout.capacity_range(2), "A2:C21");
    }
}
