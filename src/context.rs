//! The state one search run works on.
//!
//! A `SearchContext` owns the codec and the visited table for one puzzle
//! instance and records which kind of search the table is laid out for.
//! Every search entry point takes the context explicitly.
use crate::codec::{Codec, IllegalityReason, PositionCode};
use crate::engine::Board;
use crate::table::VisitedTable;
use thiserror::Error;

/// How the visited table is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    /// Status bytes hold claimed depths; no predecessors are kept.
    DepthFirst,
    /// Status bytes hold flags and every entry has a predecessor.
    Scan,
}

/// Counters collected during a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Moves attempted, legal or not.
    pub tries: u64,
    /// Moves actually applied.
    pub moves: u64,
    /// Positions whose successors were generated.
    pub expansions: u64,
    /// Successful depth claims in the visited table.
    pub claims: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("{operation} needs a {expected:?} context, got {actual:?}")]
    ModeMismatch {
        operation: &'static str,
        expected: SearchMode,
        actual: SearchMode,
    },
    #[error("start board does not belong to this puzzle instance: {0}")]
    ForeignStart(IllegalityReason),
    #[error("reached code {code} does not decode: {reason}")]
    Corrupt {
        code: PositionCode,
        reason: IllegalityReason,
    },
}

pub struct SearchContext {
    pub(crate) mode: SearchMode,
    pub(crate) codec: Codec,
    pub(crate) table: VisitedTable,
    pub(crate) stats: SearchStats,
}

impl SearchContext {
    /// Creates a context for the instance `start` belongs to. Allocates one
    /// status byte per code, plus a predecessor per code in scan mode.
    pub fn new(mode: SearchMode, start: &Board) -> Self {
        let codec = Codec::new(start);
        let table = VisitedTable::new(codec.size(), mode == SearchMode::Scan);
        SearchContext {
            mode,
            codec,
            table,
            stats: SearchStats::default(),
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn table(&self) -> &VisitedTable {
        &self.table
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Clears the table and the counters.
    pub fn reset(&mut self) {
        self.table.clear();
        self.stats = SearchStats::default();
    }

    pub(crate) fn require(
        &self,
        expected: SearchMode,
        operation: &'static str,
    ) -> Result<(), SearchError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(SearchError::ModeMismatch {
                operation,
                expected,
                actual: self.mode,
            })
        }
    }

    /// Encodes `start` after checking that it is a configuration of this
    /// context's instance.
    pub(crate) fn admit(&self, start: &Board) -> Result<PositionCode, SearchError> {
        if start.len() != self.codec.piece_count() {
            return Err(SearchError::ForeignStart(IllegalityReason::PieceCount {
                found: start.len(),
                expected: self.codec.piece_count(),
            }));
        }
        let code = start.encode();
        self.codec.decode(code).map_err(SearchError::ForeignStart)?;
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fixtures::small_board;
    use crate::layout::reference_board;

    #[test]
    fn test_backtrace_only_in_scan_mode() {
        let board = small_board();
        let dfs = SearchContext::new(SearchMode::DepthFirst, &board);
        assert!(!dfs.table().has_backtrace());
        assert_eq!(dfs.table().len(), 1_327_104);

        let scan = SearchContext::new(SearchMode::Scan, &board);
        assert!(scan.table().has_backtrace());
    }

    #[test]
    fn test_mode_is_checked() {
        let ctx = SearchContext::new(SearchMode::Scan, &small_board());
        assert!(ctx.require(SearchMode::Scan, "scan").is_ok());
        assert_eq!(
            ctx.require(SearchMode::DepthFirst, "solve"),
            Err(SearchError::ModeMismatch {
                operation: "solve",
                expected: SearchMode::DepthFirst,
                actual: SearchMode::Scan,
            })
        );
    }

    #[test]
    fn test_foreign_start_is_rejected() {
        let ctx = SearchContext::new(SearchMode::DepthFirst, &small_board());
        assert_eq!(ctx.admit(&small_board()), Ok(614_779));
        assert!(matches!(
            ctx.admit(&reference_board()),
            Err(SearchError::ForeignStart(IllegalityReason::PieceCount {
                found: 10,
                expected: 8
            }))
        ));
    }
}
