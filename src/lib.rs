// Rent Ledger - Core Library
// A shared household's rent/utility ledger kept on a row-addressed grid
// (a plain spreadsheet). Exposes all modules for the CLI, the webhook
// server, and tests.

pub mod layout;
pub mod records;
pub mod error;
pub mod codec;
pub mod grid;
pub mod engine;
pub mod proration;
pub mod commands;

// Re-export commonly used types
pub use error::LedgerError;
pub use records::{LineItem, MonthBlock, RosterEntry, StaySchedule, YearMonth};
pub use layout::SheetLayout;
pub use grid::{CsvGrid, GridStore, MemoryGrid, RangeUpdate};
pub use engine::{LedgerEngine, LedgerSnapshot};
pub use proration::{accumulate_owed, amounts_owed_for_month};
pub use commands::{
    default_effective_month, execute, format_amounts_owed, parse_message, CommandIntent,
    CommandOutcome, ParseOutcome, Verb, HELP_MESSAGE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
