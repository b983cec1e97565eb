// 🧾 Ledger engine - read-modify-write orchestration over the grid
// Every operation follows the same template: read the full grid once,
// compute new records in memory, then push every affected block back as
// one batched write. The roster's unpaid-months set and each month
// block's Paid? column are one fact stored twice; every path that
// touches one rewrites both in the same batch so they cannot drift.
//
// Duplicate tenants, unknown tenants and over-capacity rosters are
// silent no-ops (no grid writes at all), matching the sheet's original
// operator conventions. The only hard failure is marking a month paid
// before that month's block was ever created.

use crate::codec::{
    decode_month_block, decode_roster, encode_month_block, encode_roster, month_block_exists,
    roster_header_update,
};
use crate::error::LedgerError;
use crate::grid::{GridStore, RangeUpdate};
use crate::layout::SheetLayout;
use crate::proration::{accumulate_owed, amounts_owed_for_month};
use crate::records::{LineItem, MonthBlock, RosterEntry, StaySchedule, YearMonth};
use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Decoded view of the whole sheet: the roster plus every month block
/// created so far.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub roster: BTreeMap<String, RosterEntry>,
    pub months: Vec<MonthBlock>,
}

/// A month block plus the roster as it must look after the operation,
/// produced by `ensure_month`. When `roster_dirty` is set the roster
/// changed alongside the block (month creation, or a tenant newly owing
/// for it) and must ride along in the operation's batch.
struct MonthContext {
    roster: BTreeMap<String, RosterEntry>,
    block: MonthBlock,
    start_row: usize,
    roster_dirty: bool,
}

pub struct LedgerEngine<G: GridStore> {
    grid: G,
    layout: SheetLayout,
}

impl<G: GridStore> LedgerEngine<G> {
    pub fn new(grid: G) -> Self {
        LedgerEngine {
            grid,
            layout: SheetLayout::default(),
        }
    }

    pub fn with_layout(grid: G, layout: SheetLayout) -> Self {
        LedgerEngine { grid, layout }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    /// Write the roster header onto a brand-new, completely empty grid.
    /// Returns whether initialization happened.
    pub fn init_if_empty(&mut self) -> Result<bool> {
        let rows = self.grid.read_all_rows()?;
        if !rows.is_empty() {
            return Ok(false);
        }
        self.grid.batch_write(&[roster_header_update(&self.layout)])?;
        Ok(true)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Add a tenant to the roster and to the given month's block. Already
    /// present or roster full: silent no-op, nothing is written.
    pub fn add_tenant(&mut self, name: &str, ym: YearMonth) -> Result<()> {
        let rows = self.grid.read_all_rows()?;
        let roster = decode_roster(&rows)?;
        if roster.contains_key(name) || roster.len() >= self.layout.max_users {
            return Ok(());
        }

        let mut ctx = self.ensure_month(&rows, ym)?;
        let mut entry = RosterEntry::new(name);
        entry.months_unpaid.insert(ym);
        entry.stay_schedule = StaySchedule::Fulltime;
        ctx.block
            .line_items
            .insert(name.to_string(), LineItem::new(name, entry.initial_weeks_stayed()));
        ctx.roster.insert(name.to_string(), entry);

        let mut updates = vec![encode_roster(&ctx.roster, &self.layout)];
        updates.extend(encode_month_block(&ctx.block, ctx.start_row, &self.layout));
        self.grid.batch_write(&updates)
    }

    /// Remove a tenant from the roster, and from the given month's block
    /// if that block exists. Historical blocks keep their line items.
    /// Unknown tenant: silent no-op.
    pub fn remove_tenant(&mut self, name: &str, ym: YearMonth) -> Result<()> {
        let rows = self.grid.read_all_rows()?;
        let mut roster = decode_roster(&rows)?;
        if roster.remove(name).is_none() {
            return Ok(());
        }

        let mut updates = vec![encode_roster(&roster, &self.layout)];
        let start_row = self.layout.month_start_row(ym)?;
        if let Some(mut block) = decode_month_block(&rows, start_row, ym)? {
            if block.line_items.remove(name).is_some() {
                updates.extend(encode_month_block(&block, start_row, &self.layout));
            }
        }
        self.grid.batch_write(&updates)
    }

    /// Mark a tenant's rent as paid for the given month: drop the month
    /// from their unpaid set and flip their line item's Paid? flag.
    ///
    /// Unknown tenant is a silent no-op, but the month block must already
    /// exist - paying for a month nobody ever billed is `MonthNotFound`.
    /// The unpaid set is cleared even when the block has no line item for
    /// the tenant (they may have been added after the month was created).
    pub fn mark_paid(&mut self, name: &str, ym: YearMonth) -> Result<()> {
        let rows = self.grid.read_all_rows()?;
        let mut roster = decode_roster(&rows)?;
        let Some(entry) = roster.get_mut(name) else {
            return Ok(());
        };
        entry.months_unpaid.remove(&ym);

        let start_row = self.layout.month_start_row(ym)?;
        let mut block = decode_month_block(&rows, start_row, ym)?.ok_or(
            LedgerError::MonthNotFound {
                year: ym.year,
                month: ym.month,
            },
        )?;
        if let Some(item) = block.line_items.get_mut(name) {
            item.is_paid = true;
        }

        let mut updates = vec![encode_roster(&roster, &self.layout)];
        updates.extend(encode_month_block(&block, start_row, &self.layout));
        self.grid.batch_write(&updates)
    }

    /// Set the month's total rent, creating the block if needed.
    pub fn set_total_rent(&mut self, amount: f64, ym: YearMonth) -> Result<()> {
        self.set_total(ym, |block| block.total_rent = amount)
    }

    /// Set the month's total utility cost, creating the block if needed.
    pub fn set_total_utility(&mut self, amount: f64, ym: YearMonth) -> Result<()> {
        self.set_total(ym, |block| block.total_utility = amount)
    }

    fn set_total(&mut self, ym: YearMonth, apply: impl FnOnce(&mut MonthBlock)) -> Result<()> {
        let rows = self.grid.read_all_rows()?;
        let mut ctx = self.ensure_month(&rows, ym)?;
        apply(&mut ctx.block);
        self.commit_month(ctx)
    }

    /// Record how many weeks a tenant stayed in the given month, creating
    /// the block if needed. Unknown tenant: silent no-op. A tenant on the
    /// roster but missing from an existing block gets a fresh unpaid line
    /// item, and the month joins their roster unpaid set in the same
    /// batch - the two are one fact stored twice and move together.
    pub fn set_weeks_stayed(&mut self, weeks: f64, name: &str, ym: YearMonth) -> Result<()> {
        let rows = self.grid.read_all_rows()?;
        let roster = decode_roster(&rows)?;
        if !roster.contains_key(name) {
            return Ok(());
        }

        let mut ctx = self.ensure_month(&rows, ym)?;
        if !ctx.block.line_items.contains_key(name) {
            ctx.block
                .line_items
                .insert(name.to_string(), LineItem::new(name, 0.0));
            if let Some(entry) = ctx.roster.get_mut(name) {
                entry.months_unpaid.insert(ym);
            }
            ctx.roster_dirty = true;
        }
        if let Some(item) = ctx.block.line_items.get_mut(name) {
            item.weeks_stayed = weeks;
        }
        self.commit_month(ctx)
    }

    /// Create the given month's block if it does not exist. Idempotent:
    /// an existing block means no writes at all. Seeds a line item per
    /// roster tenant from their stay schedule and marks the month unpaid
    /// for everyone.
    pub fn create_month(&mut self, ym: YearMonth) -> Result<()> {
        let rows = self.grid.read_all_rows()?;
        let start_row = self.layout.month_start_row(ym)?;
        if month_block_exists(&rows, start_row) {
            return Ok(());
        }
        let ctx = self.ensure_month(&rows, ym)?;
        self.commit_month(ctx)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Total amount each roster tenant currently owes, summed over every
    /// month still in anyone's unpaid set. Tenants who owe nothing map to
    /// 0.0 rather than being omitted. Unpaid months whose block was never
    /// created contribute nothing.
    pub fn amounts_owed(&mut self) -> Result<BTreeMap<String, f64>> {
        let rows = self.grid.read_all_rows()?;
        let roster = decode_roster(&rows)?;
        if roster.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut months_owed: BTreeSet<YearMonth> = BTreeSet::new();
        for entry in roster.values() {
            months_owed.extend(entry.months_unpaid.iter().copied());
        }

        let mut totals: BTreeMap<String, f64> =
            roster.keys().map(|name| (name.clone(), 0.0)).collect();
        for ym in months_owed {
            // Legacy roster cells can name months predating the epoch;
            // like uncreated blocks, they contribute nothing rather than
            // sinking the whole query
            let Ok(start_row) = self.layout.month_start_row(ym) else {
                continue;
            };
            let Some(block) = decode_month_block(&rows, start_row, ym)? else {
                continue;
            };
            accumulate_owed(&mut totals, &amounts_owed_for_month(&block));
        }
        Ok(totals)
    }

    /// Decode the roster and every created month block.
    pub fn snapshot(&mut self) -> Result<LedgerSnapshot> {
        let rows = self.grid.read_all_rows()?;
        let roster = decode_roster(&rows)?;

        let mut months = Vec::new();
        let mut offset = 0;
        loop {
            let ym = self.layout.month_at(offset);
            let start_row = self.layout.month_start_row(ym)?;
            if start_row > rows.len() {
                break;
            }
            if let Some(block) = decode_month_block(&rows, start_row, ym)? {
                months.push(block);
            }
            offset += 1;
        }
        Ok(LedgerSnapshot { roster, months })
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// Decode the month block, or stage its creation: totals at zero, a
    /// line item per roster tenant seeded from their stay schedule, and
    /// the month appended to every tenant's unpaid set. Nothing is
    /// written here; the creation ranges ride in the caller's batch.
    fn ensure_month(&self, rows: &[Vec<String>], ym: YearMonth) -> Result<MonthContext> {
        let start_row = self.layout.month_start_row(ym)?;
        let mut roster = decode_roster(rows)?;

        if let Some(block) = decode_month_block(rows, start_row, ym)? {
            return Ok(MonthContext {
                roster,
                block,
                start_row,
                roster_dirty: false,
            });
        }

        let mut block = MonthBlock::empty(ym);
        for entry in roster.values_mut() {
            entry.months_unpaid.insert(ym);
            block.line_items.insert(
                entry.name.clone(),
                LineItem::new(&entry.name, entry.initial_weeks_stayed()),
            );
        }
        Ok(MonthContext {
            roster,
            block,
            start_row,
            roster_dirty: true,
        })
    }

    /// Write a month context back: the block itself, plus the roster when
    /// this operation changed it.
    fn commit_month(&mut self, ctx: MonthContext) -> Result<()> {
        let mut updates: Vec<RangeUpdate> = Vec::new();
        if ctx.roster_dirty {
            updates.push(encode_roster(&ctx.roster, &self.layout));
        }
        updates.extend(encode_month_block(&ctx.block, ctx.start_row, &self.layout));
        self.grid.batch_write(&updates)
    }
}

// ============================================================================
// TESTS
// ============================================================================
