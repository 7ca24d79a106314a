use crate::context::{SearchContext, SearchError, SearchMode, SearchStats};
use crate::engine::{Board, Move, DIRECTIONS};
use log::{info, log_enabled, Level};
use std::time::Instant;
use thousands::Separable;

/// Represents a solution found by the depth-first solver.
#[derive(Clone, Debug)]
pub struct Solution {
    /// The winning moves, first move first.
    pub moves: Vec<Move>,
    /// The depth bound of the pass that found the moves.
    pub depth: u8,
    /// Counters accumulated over every pass up to and including this one.
    pub stats: SearchStats,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Replays the moves from `start`. The first board is `start` itself, the
    /// last one is solved.
    pub fn boards(&self, start: &Board) -> Vec<Board> {
        let mut board = start.clone();
        let mut boards = Vec::with_capacity(self.moves.len() + 1);
        boards.push(board.clone());
        for m in &self.moves {
            if !board.shift(m.piece, m.dx, m.dy) {
                break;
            }
            boards.push(board.clone());
        }
        boards
    }
}

/// Runs one depth-bounded pass from `board` without clearing the table.
///
/// Moves are tried in generation order. A move that solves the puzzle ends
/// the pass; otherwise the resulting position is claimed with the remaining
/// depth and, if the claim succeeds, searched one level deeper. Positions
/// already claimed with at least as much depth left are pruned.
///
/// On success returns the winning moves, first move first. `board` is left
/// exactly as it was either way.
///
/// # Errors
/// Returns a [`SearchError`] if `ctx` is not a depth-first context or `board`
/// is not a configuration of the context's instance.
pub fn search_depth(
    ctx: &mut SearchContext,
    board: &mut Board,
    depth: u8,
) -> Result<Option<Vec<Move>>, SearchError> {
    ctx.require(SearchMode::DepthFirst, "search_depth")?;
    ctx.admit(board)?;
    let mut path = Vec::new();
    if descend(ctx, board, depth, &mut path) {
        path.reverse();
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

/// Pushes the winning moves on the way back up, so `path` ends up last move first.
fn descend(ctx: &mut SearchContext, board: &mut Board, depth: u8, path: &mut Vec<Move>) -> bool {
    if depth == 0 {
        return false;
    }
    ctx.stats.expansions += 1;

    for piece in 0..board.len() {
        for (dx, dy) in DIRECTIONS {
            ctx.stats.tries += 1;
            let Some(code) = board.try_move(piece, dx, dy) else {
                continue;
            };
            ctx.stats.moves += 1;
            let step = Move { piece, dx, dy };

            if board.is_solved() {
                board.shift(piece, -dx, -dy);
                path.push(step);
                return true;
            }

            if ctx.table.try_claim(code, depth) {
                ctx.stats.claims += 1;
                if descend(ctx, board, depth - 1, path) {
                    board.shift(piece, -dx, -dy);
                    path.push(step);
                    return true;
                }
            }

            board.shift(piece, -dx, -dy);
        }
    }

    false
}

/// Iterative deepening from `start`: clears the table once, then runs passes
/// with depth bounds `1..=max_depth` until one succeeds.
///
/// The table keeps its claims between passes. A start that is already solved
/// yields an empty solution at depth 0.
///
/// # Errors
/// Returns a [`SearchError`] if `ctx` is not a depth-first context or `start`
/// is not a configuration of the context's instance.
pub fn solve_iterative(
    ctx: &mut SearchContext,
    start: &Board,
    max_depth: u8,
) -> Result<Option<Solution>, SearchError> {
    ctx.require(SearchMode::DepthFirst, "solve_iterative")?;
    ctx.admit(start)?;
    ctx.reset();

    if start.is_solved() {
        return Ok(Some(Solution {
            moves: Vec::new(),
            depth: 0,
            stats: ctx.stats,
        }));
    }

    let started = Instant::now();
    let mut board = start.clone();
    for depth in 1..=max_depth {
        let pass = Instant::now();
        let found = search_depth(ctx, &mut board, depth)?;

        if log_enabled!(Level::Info) {
            info!(
                "depth {}: {} claims, {} positions in table, {:.2?}",
                depth,
                ctx.stats.claims.separate_with_commas(),
                ctx.table.occupied().separate_with_commas(),
                pass.elapsed()
            );
        }

        if let Some(moves) = found {
            info!(
                "solved at depth {} with {} moves, {} moves applied in {:.2?}",
                depth,
                moves.len(),
                ctx.stats.moves.separate_with_commas(),
                started.elapsed()
            );
            return Ok(Some(Solution {
                moves,
                depth,
                stats: ctx.stats,
            }));
        }
    }

    info!("no solution up to depth {}", max_depth);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fixtures::{small_board, stuck_board};
    use crate::layout::reference_board;

    #[test]
    fn test_small_instance_first_succeeds_at_depth_23() {
        let start = small_board();
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &start);
        let solution = solve_iterative(&mut ctx, &start, u8::MAX).unwrap().unwrap();

        assert_eq!(solution.depth, 23);
        assert_eq!(solution.len(), 23);
        assert_eq!(
            &solution.moves[..3],
            &[
                Move { piece: 3, dx: 0, dy: 1 },
                Move { piece: 4, dx: 0, dy: 1 },
                Move { piece: 5, dx: -1, dy: 0 },
            ]
        );
        assert_eq!(solution.stats.claims, 820);
        assert_eq!(ctx.table().occupied(), 66);
    }

    #[test]
    fn test_solution_replays_to_a_solved_board() {
        let start = small_board();
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &start);
        let solution = solve_iterative(&mut ctx, &start, 30).unwrap().unwrap();

        let boards = solution.boards(&start);
        assert_eq!(boards.len(), solution.len() + 1);
        assert_eq!(boards[0], start);
        assert!(boards.last().unwrap().is_solved());
        assert!(boards[..boards.len() - 1].iter().all(|b| !b.is_solved()));
    }

    #[test]
    fn test_no_success_below_the_minimum() {
        let start = small_board();
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &start);
        assert!(solve_iterative(&mut ctx, &start, 22).unwrap().is_none());
    }

    #[test]
    fn test_failed_pass_restores_the_board() {
        let start = small_board();
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &start);
        let mut board = start.clone();
        assert_eq!(search_depth(&mut ctx, &mut board, 10).unwrap(), None);
        assert_eq!(board, start);

        let moves = search_depth(&mut ctx, &mut board, 23).unwrap();
        assert!(moves.is_some());
        assert_eq!(board, start);
    }

    #[test]
    fn test_claimed_positions_are_not_expanded_again() {
        let start = small_board();
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &start);
        let mut board = start.clone();

        search_depth(&mut ctx, &mut board, 8).unwrap();
        let first = ctx.stats();
        assert!(first.claims > 0);
        // Claims made with one move left do not descend further.
        assert!(first.expansions > 1 && first.expansions <= first.claims + 1);

        search_depth(&mut ctx, &mut board, 8).unwrap();
        let second = ctx.stats();
        assert_eq!(second.claims, first.claims, "same depth claims nothing new");
        assert_eq!(second.expansions, first.expansions + 1, "only the root is expanded");
    }

    #[test]
    fn test_foreign_board_is_refused() {
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &small_board());
        let mut board = reference_board();
        assert!(matches!(
            search_depth(&mut ctx, &mut board, 3),
            Err(SearchError::ForeignStart(_))
        ));
        assert_eq!(board, reference_board());
        assert_eq!(ctx.stats(), SearchStats::default());
    }

    #[test]
    fn test_stuck_instance_exhausts_the_bound() {
        let start = stuck_board();
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &start);
        assert!(solve_iterative(&mut ctx, &start, 40).unwrap().is_none());
        assert_eq!(ctx.table().occupied(), 23, "every reachable position, the start included");
    }

    #[test]
    fn test_scan_context_is_refused() {
        let start = small_board();
        let mut ctx = SearchContext::new(SearchMode::Scan, &start);
        assert!(matches!(
            solve_iterative(&mut ctx, &start, 5),
            Err(SearchError::ModeMismatch { .. })
        ));
    }

    #[test]
    fn test_solved_start_needs_no_moves() {
        let start = small_board();
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &start);
        let solved = solve_iterative(&mut ctx, &start, 30)
            .unwrap()
            .unwrap()
            .boards(&start)
            .pop()
            .unwrap();
        let again = solve_iterative(&mut ctx, &solved, 30).unwrap().unwrap();
        assert_eq!(again.depth, 0);
        assert!(again.is_empty());
    }

    #[test]
    #[ignore = "long running"]
    fn test_reference_instance_first_succeeds_at_depth_86() {
        let start = reference_board();
        let mut ctx = SearchContext::new(SearchMode::DepthFirst, &start);
        let solution = solve_iterative(&mut ctx, &start, u8::MAX).unwrap().unwrap();
        assert_eq!(solution.depth, 86);
        assert!(solution.boards(&start).last().unwrap().is_solved());
    }
}
