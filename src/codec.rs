// 🔤 Record codec - raw grid cells <-> typed records
// Everything on the sheet is a string. This module owns the parsing rules
// (currency strings, booleans, month lists, the stay-schedule fallback)
// and the block encode/decode, including the fixed-capacity blank padding
// the write path depends on - the medium has no delete-row primitive, so
// a shrinking list must overwrite its stale tail with empty cells.

use crate::error::LedgerError;
use crate::grid::RangeUpdate;
use crate::layout::{
    SheetLayout, MONTH_ITEMS_HEADER, MONTH_ITEMS_OFFSET, MONTH_LABEL_OFFSET, MONTH_RENT_OFFSET,
    MONTH_UTILITY_OFFSET, ROSTER_HEADER, ROSTER_ITEMS_ROW,
};
use crate::records::{LineItem, MonthBlock, RosterEntry, StaySchedule, YearMonth};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// CELL PARSING
// ============================================================================

/// Cell at `col` within a row, tolerating ragged rows (a short row reads
/// as empty cells past its end).
pub fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// Parse a monetary cell. Accepts a leading `$` and `,` thousands
/// separators ("$1,697.00" and "1697" both parse).
pub fn parse_amount(value: &str) -> Result<f64, LedgerError> {
    let cleaned = value.trim().trim_start_matches('$').replace(',', "");
    cleaned.parse::<f64>().map_err(|_| LedgerError::MalformedRecord {
        cell: value.to_string(),
        expected: "currency amount",
    })
}

/// Parse a plain numeric cell (weeks stayed).
pub fn parse_number(value: &str) -> Result<f64, LedgerError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| LedgerError::MalformedRecord {
            cell: value.to_string(),
            expected: "number",
        })
}

/// Case-insensitive "true" is true; anything else (including garbage) is
/// false. False is the safe default for a Paid? cell, so unrecognized
/// values are not an error.
pub fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Parse a comma-separated list of `m/yyyy` tokens. Empty cell means an
/// empty set; duplicates collapse.
pub fn parse_month_list(value: &str) -> Result<BTreeSet<YearMonth>, LedgerError> {
    let mut months = BTreeSet::new();
    for token in value.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        months.insert(token.parse()?);
    }
    Ok(months)
}

fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

fn format_month_list(months: &BTreeSet<YearMonth>) -> String {
    months
        .iter()
        .map(YearMonth::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn format_bool(value: bool) -> String {
    if value { "True".to_string() } else { "False".to_string() }
}

// ============================================================================
// ROW SCANNING
// ============================================================================

/// The contiguous run of data rows starting at `start_index` (0-based).
/// A row belongs to the run iff its first cell is non-empty; this is how
/// variable-length tenant lists are read without a stored count.
pub fn successive_data_rows(rows: &[Vec<String>], start_index: usize) -> &[Vec<String>] {
    if start_index >= rows.len() {
        return &[];
    }
    let mut end = start_index;
    while end < rows.len() && !cell(&rows[end], 0).is_empty() {
        end += 1;
    }
    &rows[start_index..end]
}

// ============================================================================
// ROSTER BLOCK
// ============================================================================

fn decode_roster_entry(row: &[String]) -> Result<RosterEntry, LedgerError> {
    Ok(RosterEntry {
        name: cell(row, 0).to_string(),
        months_unpaid: parse_month_list(cell(row, 1))?,
        stay_schedule: StaySchedule::from_cell(cell(row, 2).trim()),
    })
}

/// Decode the roster block at the top of the sheet into a name-keyed map.
pub fn decode_roster(rows: &[Vec<String>]) -> Result<BTreeMap<String, RosterEntry>, LedgerError> {
    let mut roster = BTreeMap::new();
    for row in successive_data_rows(rows, ROSTER_ITEMS_ROW - 1) {
        let entry = decode_roster_entry(row)?;
        roster.insert(entry.name.clone(), entry);
    }
    Ok(roster)
}

/// Encode the roster as a single fixed-capacity write: every data row,
/// then blank rows up to `max_users` to erase any stale tail.
pub fn encode_roster(
    roster: &BTreeMap<String, RosterEntry>,
    layout: &SheetLayout,
) -> RangeUpdate {
    let mut values: Vec<Vec<String>> = roster
        .values()
        .map(|t| {
            vec![
                t.name.clone(),
                format_month_list(&t.months_unpaid),
                t.stay_schedule.as_cell().to_string(),
            ]
        })
        .collect();
    pad_to_capacity(&mut values, layout.max_users);
    RangeUpdate {
        range: layout.capacity_range(ROSTER_ITEMS_ROW),
        values,
    }
}

/// The roster header row written when a fresh sheet is initialized.
pub fn roster_header_update(layout: &SheetLayout) -> RangeUpdate {
    RangeUpdate {
        range: layout.row_range(crate::layout::ROSTER_HEADER_ROW),
        values: vec![ROSTER_HEADER.iter().map(|s| s.to_string()).collect()],
    }
}

// ============================================================================
// MONTH BLOCK
// ============================================================================

/// Whether a month block has been created at `start_row` (1-based): its
/// label cell is non-empty.
pub fn month_block_exists(rows: &[Vec<String>], start_row: usize) -> bool {
    let idx = start_row - 1;
    idx < rows.len() && !cell(&rows[idx], 0).is_empty()
}

/// Decode the month block starting at `start_row` (1-based), or None if
/// it was never created.
pub fn decode_month_block(
    rows: &[Vec<String>],
    start_row: usize,
    ym: YearMonth,
) -> Result<Option<MonthBlock>, LedgerError> {
    if !month_block_exists(rows, start_row) {
        return Ok(None);
    }
    let idx = start_row - 1;

    let total_rent = parse_amount(cell(&rows[idx + MONTH_RENT_OFFSET], 1))?;
    let total_utility = parse_amount(cell(&rows[idx + MONTH_UTILITY_OFFSET], 1))?;

    let mut line_items = BTreeMap::new();
    for row in successive_data_rows(rows, idx + MONTH_ITEMS_OFFSET) {
        let item = LineItem {
            name: cell(row, 0).to_string(),
            weeks_stayed: parse_number(cell(row, 1))?,
            is_paid: parse_bool(cell(row, 2)),
        };
        line_items.insert(item.name.clone(), item);
    }

    Ok(Some(MonthBlock {
        year: ym.year,
        month: ym.month,
        total_rent,
        total_utility,
        line_items,
    }))
}

/// Encode a whole month block as range updates: label, totals, line-item
/// header, then the fixed-capacity line-item rows (data + blank padding).
pub fn encode_month_block(
    block: &MonthBlock,
    start_row: usize,
    layout: &SheetLayout,
) -> Vec<RangeUpdate> {
    let label = RangeUpdate {
        range: layout.label_range(start_row + MONTH_LABEL_OFFSET),
        values: vec![vec![block.year_month().to_string()]],
    };
    let totals = RangeUpdate {
        range: layout.totals_range(start_row + MONTH_RENT_OFFSET),
        values: vec![
            vec!["Total Rent".to_string(), format_amount(block.total_rent)],
            vec!["Total Utility".to_string(), format_amount(block.total_utility)],
        ],
    };
    let header = RangeUpdate {
        range: layout.row_range(start_row + crate::layout::MONTH_HEADER_OFFSET),
        values: vec![MONTH_ITEMS_HEADER.iter().map(|s| s.to_string()).collect()],
    };

    let mut item_values: Vec<Vec<String>> = block
        .line_items
        .values()
        .map(|t| {
            vec![
                t.name.clone(),
                t.weeks_stayed.to_string(),
                format_bool(t.is_paid),
            ]
        })
        .collect();
    pad_to_capacity(&mut item_values, layout.max_users);
    let items = RangeUpdate {
        range: layout.capacity_range(start_row + MONTH_ITEMS_OFFSET),
        values: item_values,
    };

    vec![label, totals, header, items]
}

fn pad_to_capacity(values: &mut Vec<Vec<String>>, capacity: usize) {
    while values.len() < capacity {
        values.push(vec![String::new(), String::new(), String::new()]);
    }
    values.truncate(capacity);
}

// ============================================================================
// TESTS
// ============================================================================
