// 🗄️ Grid access - the narrow storage contract the ledger writes through
// The sheet is just rows of strings plus batched rectangular writes. Two
// adapters live here: an in-memory grid (tests, dry runs - it counts its
// batch writes) and a CSV-file grid for running the CLI locally.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One rectangular write: an A1-style range plus a row-major grid of cell
/// values matching the range's dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeUpdate {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

/// The storage contract: read the whole grid, or apply a batch of range
/// writes as one atomic update. The ledger never reads or writes at any
/// finer granularity.
pub trait GridStore {
    fn read_all_rows(&mut self) -> Result<Vec<Vec<String>>>;
    fn batch_write(&mut self, updates: &[RangeUpdate]) -> Result<()>;
}

// ============================================================================
// A1 RANGE PARSING
// ============================================================================

/// Parsed A1 range, all 0-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRect {
    col_start: usize,
    row_start: usize,
    col_end: usize,
    row_end: usize,
}

fn parse_cell_ref(cell: &str) -> Result<(usize, usize)> {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];
    if letters.is_empty() || digits.is_empty() {
        bail!("invalid A1 cell reference {:?}", cell);
    }
    let mut col = 0usize;
    for c in letters.chars() {
        col = col * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    let row: usize = digits.parse().with_context(|| format!("invalid row in {:?}", cell))?;
    if row == 0 {
        bail!("A1 rows are 1-based, got {:?}", cell);
    }
    Ok((col - 1, row - 1))
}

fn parse_a1_range(range: &str) -> Result<CellRect> {
    let (start, end) = range
        .split_once(':')
        .with_context(|| format!("invalid A1 range {:?}", range))?;
    let (col_start, row_start) = parse_cell_ref(start)?;
    let (col_end, row_end) = parse_cell_ref(end)?;
    if col_end < col_start || row_end < row_start {
        bail!("inverted A1 range {:?}", range);
    }
    Ok(CellRect { col_start, row_start, col_end, row_end })
}

/// Apply one range update to a growable grid, extending rows/columns as
/// needed so writes past the current extent land on fresh cells.
fn apply_update(rows: &mut Vec<Vec<String>>, update: &RangeUpdate) -> Result<()> {
    let rect = parse_a1_range(&update.range)?;
    let height = rect.row_end - rect.row_start + 1;
    if update.values.len() != height {
        bail!(
            "range {} holds {} rows but {} were supplied",
            update.range,
            height,
            update.values.len()
        );
    }

    for (i, value_row) in update.values.iter().enumerate() {
        let row_idx = rect.row_start + i;
        while rows.len() <= row_idx {
            rows.push(Vec::new());
        }
        let row = &mut rows[row_idx];
        for (j, value) in value_row.iter().enumerate() {
            let col_idx = rect.col_start + j;
            if col_idx > rect.col_end {
                bail!("range {} is narrower than its values", update.range);
            }
            while row.len() <= col_idx {
                row.push(String::new());
            }
            row[col_idx] = value.clone();
        }
    }
    Ok(())
}

// ============================================================================
// IN-MEMORY GRID
// ============================================================================

/// Grid held entirely in memory. Counts its batch writes, which lets
/// tests assert that a no-op operation really wrote nothing.
#[derive(Debug, Default)]
pub struct MemoryGrid {
    rows: Vec<Vec<String>>,
    write_batches: usize,
}

impl MemoryGrid {
    pub fn new() -> Self {
        MemoryGrid::default()
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        MemoryGrid { rows, write_batches: 0 }
    }

    /// How many batch writes have been applied.
    pub fn write_batches(&self) -> usize {
        self.write_batches
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

impl GridStore for MemoryGrid {
    fn read_all_rows(&mut self) -> Result<Vec<Vec<String>>> {
        Ok(self.rows.clone())
    }

    fn batch_write(&mut self, updates: &[RangeUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        for update in updates {
            apply_update(&mut self.rows, update)?;
        }
        self.write_batches += 1;
        Ok(())
    }
}

// ============================================================================
// CSV-FILE GRID
// ============================================================================

/// Grid persisted in a local CSV file. Each batch rewrites the whole
/// file; partial application is never visible on disk because the write
/// lands via a rename.
pub struct CsvGrid {
    path: PathBuf,
}

impl CsvGrid {
    pub fn open(path: impl AsRef<Path>) -> Self {
        CsvGrid { path: path.as_ref().to_path_buf() }
    }

    fn load(&self) -> Result<Vec<Vec<String>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("opening grid file {}", self.path.display()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("reading grid row")?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn store(&self, rows: &[Vec<String>]) -> Result<()> {
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&tmp_path)
                .with_context(|| format!("creating grid file {}", tmp_path.display()))?;
            for row in rows {
                // The reader skips fully blank lines, which would shift
                // every row address below them; pad to the three-column
                // envelope so blank rows persist as ",,".
                let mut padded = row.clone();
                while padded.len() < 3 {
                    padded.push(String::new());
                }
                writer.write_record(&padded)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replacing grid file {}", self.path.display()))?;
        Ok(())
    }
}

impl GridStore for CsvGrid {
    fn read_all_rows(&mut self) -> Result<Vec<Vec<String>>> {
        self.load()
    }

    fn batch_write(&mut self, updates: &[RangeUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut rows = self.load()?;
        for update in updates {
            apply_update(&mut rows, update)?;
        }
        self.store(&rows)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn update(range: &str, values: &[&[&str]]) -> RangeUpdate {
        RangeUpdate {
            range: range.to_string(),
            values: values
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1").unwrap(), (0, 0));
        assert_eq!(parse_cell_ref("C25").unwrap(), (2, 24));
        assert_eq!(parse_cell_ref("AA3").unwrap(), (26, 2));
        assert!(parse_cell_ref("7").is_err());
        assert!(parse_cell_ref("A0").is_err());
        assert!(parse_cell_ref("A").is_err());
    }

    #[test]
    fn test_apply_update_grows_grid() {
        let mut grid = MemoryGrid::new();
        grid.batch_write(&[update("A25:A25", &[&["9/2021"]])]).unwrap();
        let rows = grid.read_all_rows().unwrap();
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[24][0], "9/2021");
        // Rows before the write exist but are empty
        assert!(rows[0].is_empty() || rows[0][0].is_empty());
    }

    #[test]
    fn test_apply_update_rejects_mismatched_height() {
        let mut grid = MemoryGrid::new();
        let result = grid.batch_write(&[update("A1:C2", &[&["only", "one", "row"]])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_write_batch_counting() {
        let mut grid = MemoryGrid::new();
        assert_eq!(grid.write_batches(), 0);

        grid.batch_write(&[]).unwrap();
        assert_eq!(grid.write_batches(), 0);

        grid.batch_write(&[
            update("A1:C1", &[&["Name", "Months Unpaid", "Stay Schedule"]]),
            update("A2:A2", &[&["Jake Deerin"]]),
        ])
        .unwrap();
        assert_eq!(grid.write_batches(), 1);
    }

    #[test]
    fn test_overwrite_blanks_stale_cells() {
        let mut grid = MemoryGrid::new();
        grid.batch_write(&[update("A2:C3", &[
            &["Jake Deerin", "8/2021", "FULLTIME"],
            &["Mac Mathis", "", "FULLTIME"],
        ])])
        .unwrap();
        grid.batch_write(&[update("A2:C3", &[
            &["Mac Mathis", "", "FULLTIME"],
            &["", "", ""],
        ])])
        .unwrap();

        let rows = grid.read_all_rows().unwrap();
        assert_eq!(rows[1][0], "Mac Mathis");
        assert_eq!(rows[2][0], "");
    }

    #[test]
    fn test_csv_grid_round_trip() {
        let dir = std::env::temp_dir().join("rent-ledger-grid-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("grid-{}.csv", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut grid = CsvGrid::open(&path);
        assert!(grid.read_all_rows().unwrap().is_empty());

        grid.batch_write(&[update("A1:C1", &[&["Name", "Months Unpaid", "Stay Schedule"]])])
            .unwrap();
        grid.batch_write(&[update("A2:C2", &[&["Jake Deerin", "9/2021", "FULLTIME"]])])
            .unwrap();

        let rows = grid.read_all_rows().unwrap();
        assert_eq!(rows[0][0], "Name");
        assert_eq!(rows[1][1], "9/2021");

        std::fs::remove_file(&path).unwrap();
    }
}
