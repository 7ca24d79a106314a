//! Exhaustive reachability over the whole code space.
//!
//! A scan classifies every code as legal and/or final, seeds the start
//! position, and then sweeps the codes in ascending order, round after round,
//! expanding every reached position that is not final until a round expands
//! nothing. Each reached position remembers the position it was first reached
//! from, so solution paths can be walked back to the start.
use crate::codec::PositionCode;
use crate::context::{SearchContext, SearchError, SearchMode};
use crate::engine::{Board, DIRECTIONS};
use crate::table::{classification_flags, EXPANDED, FINAL, FOUND, LEGAL, REACHED};
use log::{debug, info};
use rayon::prelude::*;
use std::time::Instant;
use thousands::Separable;

/// Codes classified per parallel task.
const BLOCK: usize = 1 << 16;

/// When a scan stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanScope {
    /// Stop at the first final position met.
    #[default]
    FirstSolution,
    /// Run until nothing is left to expand, reporting every final position.
    AllSolutions,
}

/// Totals of the classification pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub legal: usize,
    pub finals: usize,
}

#[derive(Clone, Debug)]
pub struct ScanReport {
    pub classification: Classification,
    /// Sweeps over the code space, the last (empty or interrupted) one included.
    pub rounds: usize,
    pub expansions: u64,
    /// Positions reached from the start, the start included.
    pub reached: usize,
    /// Final positions in the order they were met.
    pub found: Vec<PositionCode>,
    /// Boards from the start to the first found position; empty if none was found.
    pub path: Vec<Board>,
}

impl ScanReport {
    pub fn is_solved(&self) -> bool {
        !self.found.is_empty()
    }
}

/// Decodes every code of the instance and records whether it is legal and
/// whether it is final. Previous flags are overwritten.
///
/// Blocks of codes are classified in parallel; each entry is written by
/// exactly one task, so the result does not depend on scheduling.
///
/// # Errors
/// Returns [`SearchError::ModeMismatch`] unless `ctx` is a scan context.
pub fn classify(ctx: &mut SearchContext) -> Result<Classification, SearchError> {
    ctx.require(SearchMode::Scan, "classify")?;

    let started = Instant::now();
    let codec = &ctx.codec;
    let (legal, finals) = ctx
        .table
        .status_mut()
        .par_chunks_mut(BLOCK)
        .enumerate()
        .map(|(block, entries)| {
            let base = block * BLOCK;
            let mut counts = (0, 0);
            for (offset, entry) in entries.iter_mut().enumerate() {
                *entry = match codec.decode((base + offset) as PositionCode) {
                    Ok(board) => {
                        let is_final = board.is_solved();
                        counts.0 += 1;
                        counts.1 += is_final as usize;
                        classification_flags(true, is_final)
                    }
                    Err(_) => 0,
                };
            }
            counts
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    info!(
        "classified {} codes: {} legal, {} final in {:.2?}",
        ctx.table.len().separate_with_commas(),
        legal.separate_with_commas(),
        finals.separate_with_commas(),
        started.elapsed()
    );
    Ok(Classification { legal, finals })
}

/// Runs a reachability scan from `start`.
///
/// Rounds sweep the codes in ascending order. A reached final position that
/// has not been reported yet is reported (and ends the scan under
/// [`ScanScope::FirstSolution`]); a reached, unexpanded, non-final position
/// has its successors marked reached with itself as predecessor. Positions
/// reached during a round are picked up later in the same sweep if their
/// code is higher. The scan ends after a round that expands nothing.
///
/// # Errors
/// Returns a [`SearchError`] if `ctx` is not a scan context, `start` is not a
/// configuration of its instance, or a reached code fails to decode.
pub fn scan(
    ctx: &mut SearchContext,
    start: &Board,
    scope: ScanScope,
) -> Result<ScanReport, SearchError> {
    ctx.require(SearchMode::Scan, "scan")?;
    let start_code = ctx.admit(start)?;
    ctx.reset();

    let classification = classify(ctx)?;
    ctx.table.mark_reached(start_code, start_code);

    let started = Instant::now();
    let size = ctx.table.len();
    let mut found = Vec::new();
    let mut rounds = 0;

    'sweep: loop {
        rounds += 1;
        let mut expanded = 0u64;

        for index in 0..size {
            let code = index as PositionCode;
            let status = ctx.table.status(code);
            if status & (LEGAL | REACHED) != (LEGAL | REACHED) {
                continue;
            }

            if status & FINAL != 0 {
                if status & FOUND == 0 {
                    ctx.table.mark_found(code);
                    found.push(code);
                    debug!("round {}: final position {}", rounds, code);
                    if scope == ScanScope::FirstSolution {
                        ctx.stats.expansions += expanded;
                        break 'sweep;
                    }
                }
                continue;
            }

            if status & EXPANDED != 0 {
                continue;
            }

            let mut board = decode_reached(ctx, code)?;
            for piece in 0..board.len() {
                for (dx, dy) in DIRECTIONS {
                    ctx.stats.tries += 1;
                    if let Some(next) = board.try_move(piece, dx, dy) {
                        ctx.stats.moves += 1;
                        ctx.table.mark_reached(next, code);
                        board.shift(piece, -dx, -dy);
                    }
                }
            }
            ctx.table.mark_expanded(code);
            expanded += 1;
        }

        ctx.stats.expansions += expanded;
        info!(
            "round {}: {} expanded, {} found so far",
            rounds,
            expanded.separate_with_commas(),
            found.len()
        );
        if expanded == 0 {
            break;
        }
    }

    let reached = (0..size)
        .filter(|&index| ctx.table.is_reached(index as PositionCode))
        .count();
    info!(
        "scan finished after {} rounds: {} expanded, {} reached, {} solutions in {:.2?}",
        rounds,
        ctx.stats.expansions.separate_with_commas(),
        reached.separate_with_commas(),
        found.len(),
        started.elapsed()
    );

    let path = match found.first() {
        Some(&code) => path_boards(ctx, code)?,
        None => Vec::new(),
    };

    Ok(ScanReport {
        classification,
        rounds,
        expansions: ctx.stats.expansions,
        reached,
        found,
        path,
    })
}

/// Walks predecessors from `code` back to the start and returns the codes
/// from the start to `code`. The start is the code that is its own
/// predecessor. An unreached code yields an empty path.
pub fn reconstruct(ctx: &SearchContext, code: PositionCode) -> Vec<PositionCode> {
    let mut path = Vec::new();
    let mut current = code;
    while let Some(previous) = ctx.table.predecessor(current) {
        path.push(current);
        // A chain longer than the table can only be a corrupted one.
        if previous == current || path.len() > ctx.table.len() {
            break;
        }
        current = previous;
    }
    path.reverse();
    path
}

/// [`reconstruct`], decoded into boards.
///
/// # Errors
/// Returns [`SearchError::Corrupt`] if a code on the path does not decode.
pub fn path_boards(ctx: &SearchContext, code: PositionCode) -> Result<Vec<Board>, SearchError> {
    reconstruct(ctx, code)
        .into_iter()
        .map(|step| decode_reached(ctx, step))
        .collect()
}

fn decode_reached(ctx: &SearchContext, code: PositionCode) -> Result<Board, SearchError> {
    ctx.codec
        .decode(code)
        .map_err(|reason| SearchError::Corrupt { code, reason })
}
