// Ledger error taxonomy
// Only two conditions are real errors; duplicate tenants, over-capacity
// rosters and similar are silent no-ops by design (see engine.rs).

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A cell could not be parsed into its expected type.
    MalformedRecord { cell: String, expected: &'static str },

    /// An operation required a month block that was never created.
    /// Currently only raised by `mark_paid` - every other operation
    /// auto-creates the month instead.
    MonthNotFound { year: i32, month: u32 },

    /// A month before the configured epoch has no row on the sheet.
    /// This is a configuration error, not a missing block.
    MonthBeforeEpoch { year: i32, month: u32 },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::MalformedRecord { cell, expected } => {
                write!(f, "malformed cell {:?}: expected {}", cell, expected)
            }
            LedgerError::MonthNotFound { year, month } => {
                write!(f, "no block exists for month {}/{}", month, year)
            }
            LedgerError::MonthBeforeEpoch { year, month } => {
                write!(f, "month {}/{} predates the ledger epoch", month, year)
            }
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = LedgerError::MalformedRecord {
            cell: "$1,2x3".to_string(),
            expected: "currency amount",
        };
        assert!(err.to_string().contains("currency amount"));

        let err = LedgerError::MonthNotFound { year: 2021, month: 9 };
        assert_eq!(err.to_string(), "no block exists for month 9/2021");

        let err = LedgerError::MonthBeforeEpoch { year: 2021, month: 7 };
        assert_eq!(err.to_string(), "month 7/2021 predates the ledger epoch");
    }
}
