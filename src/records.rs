// 🏠 Domain records for the rent roll
// Three record kinds live on the sheet: the roster of current tenants,
// one block per calendar month, and per-tenant line items inside a block.

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// YEAR/MONTH
// ============================================================================

/// A calendar month. Stored on the sheet as `m/yyyy` (e.g. "8/2021") both
/// in month-block labels and in the roster's unpaid-months list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        YearMonth { year, month }
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            YearMonth { year: self.year - 1, month: 12 }
        } else {
            YearMonth { year: self.year, month: self.month - 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

impl FromStr for YearMonth {
    type Err = LedgerError;

    /// Parse an `m/yyyy` token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LedgerError::MalformedRecord {
            cell: s.to_string(),
            expected: "month/year (e.g. 8/2021)",
        };

        let (month_str, year_str) = s.trim().split_once('/').ok_or_else(malformed)?;
        let month: u32 = month_str.trim().parse().map_err(|_| malformed())?;
        let year: i32 = year_str.trim().parse().map_err(|_| malformed())?;
        if !(1..=12).contains(&month) {
            return Err(malformed());
        }
        Ok(YearMonth { year, month })
    }
}

// ============================================================================
// STAY SCHEDULE
// ============================================================================

/// A tenant's default occupancy pattern, used to seed new month blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaySchedule {
    /// Assumed to stay the full 4 weeks each month
    Fulltime,
    /// Assumed to stay 2 weeks each month
    Halftime,
    /// Stays at irregular intervals; assumed 0 weeks unless otherwise noted
    Irregular,
}

impl StaySchedule {
    /// Weeks a new month block assumes for this schedule.
    pub fn default_weeks(&self) -> f64 {
        match self {
            StaySchedule::Fulltime => 4.0,
            StaySchedule::Halftime => 2.0,
            StaySchedule::Irregular => 0.0,
        }
    }

    /// Cell value stored on the sheet.
    pub fn as_cell(&self) -> &'static str {
        match self {
            StaySchedule::Fulltime => "FULLTIME",
            StaySchedule::Halftime => "HALFTIME",
            StaySchedule::Irregular => "IRREGULAR",
        }
    }

    /// Decode a schedule cell. Unknown or missing values fall back to
    /// FULLTIME rather than failing - legacy roster rows predate the
    /// Stay Schedule column entirely.
    pub fn from_cell(cell: &str) -> Self {
        match cell {
            "HALFTIME" => StaySchedule::Halftime,
            "IRREGULAR" => StaySchedule::Irregular,
            _ => StaySchedule::Fulltime,
        }
    }
}

impl Default for StaySchedule {
    fn default() -> Self {
        StaySchedule::Fulltime
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// One row of the roster block at the top of the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    /// Months this tenant still owes money for. Unordered on the sheet;
    /// kept as a set so duplicate tokens collapse on re-encode.
    pub months_unpaid: BTreeSet<YearMonth>,
    pub stay_schedule: StaySchedule,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>) -> Self {
        RosterEntry {
            name: name.into(),
            months_unpaid: BTreeSet::new(),
            stay_schedule: StaySchedule::Fulltime,
        }
    }

    pub fn initial_weeks_stayed(&self) -> f64 {
        self.stay_schedule.default_weeks()
    }
}

/// One tenant's row inside a month block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub weeks_stayed: f64,
    pub is_paid: bool,
}

impl LineItem {
    pub fn new(name: impl Into<String>, weeks_stayed: f64) -> Self {
        LineItem {
            name: name.into(),
            weeks_stayed,
            is_paid: false,
        }
    }
}

/// One calendar month's data: the totals and every tenant's line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBlock {
    pub year: i32,
    pub month: u32,
    pub total_rent: f64,
    pub total_utility: f64,
    /// Keyed by tenant name; names are the sheet's only identity mechanism.
    pub line_items: BTreeMap<String, LineItem>,
}

impl MonthBlock {
    pub fn empty(ym: YearMonth) -> Self {
        MonthBlock {
            year: ym.year,
            month: ym.month,
            total_rent: 0.0,
            total_utility: 0.0,
            line_items: BTreeMap::new(),
        }
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }

    pub fn total_cost(&self) -> f64 {
        self.total_rent + self.total_utility
    }
}

// ============================================================================
// TESTS
// ============================================================================
