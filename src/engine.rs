//! Core puzzle engine for the sliding-block puzzle.
//!
//! This module defines the puzzle's fundamental components:
//! - `Piece`: a rigid rectangle (1x1, 2x1, 1x2 or 2x2) with an optional `Goal`.
//! - `Board`: an ordered set of non-overlapping pieces on the `WIDTH` x `HEIGHT`
//!   grid. It checks and applies unit moves, evaluates the goal, and renders
//!   itself as block art.
//! - `Move`: a single-piece unit step, generated in a fixed order.
//!
//! Encoding a board into a `PositionCode` lives in the `codec` module.
use crate::codec::PositionCode;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use thiserror::Error;

/// Width of the grid in cells.
pub const WIDTH: usize = 4;
/// Height of the grid in cells.
pub const HEIGHT: usize = 5;
/// Number of cells on the grid.
pub const CELLS: usize = WIDTH * HEIGHT;
/// Largest number of pieces a board may hold.
pub const MAX_PIECES: usize = 10;
/// Number of free cells every legal board leaves. The position encoding ranks
/// exactly this many empty slots.
pub const EMPTY_CELLS: usize = 2;

/// The four unit steps as `(dx, dy)`, in the order moves are tried:
/// up, left, right, down (row-major order of the 3x3 neighbourhood).
pub const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Errors raised while assembling a board from a list of pieces.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("a puzzle needs at least one piece")]
    NoPieces,
    #[error("{count} pieces exceed the capacity of {max}", max = MAX_PIECES)]
    TooManyPieces { count: usize },
    #[error("piece {index} has unsupported size {w}x{h}")]
    BadSize { index: usize, w: i32, h: i32 },
    #[error("piece {index} at ({x}, {y}) leaves the {width}x{height} grid", width = WIDTH, height = HEIGHT)]
    OutOfBounds { index: usize, x: i32, y: i32 },
    #[error("pieces {first} and {second} overlap")]
    Overlap { first: usize, second: usize },
    #[error("{free} free cells left, the encoding needs exactly {needed}", needed = EMPTY_CELLS)]
    WrongSlack { free: usize },
}

/// How a piece's coordinates are compared against its goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Every constrained coordinate must equal the target.
    #[default]
    Exact,
    /// A constrained coordinate is satisfied once it is at or past the target
    /// (`x >= tx`).
    Minimum,
    /// A constrained coordinate is satisfied while it is at or before the
    /// target (`x <= tx`).
    Maximum,
}

/// Target placement for a piece. `None` leaves a coordinate unconstrained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Goal {
    pub tx: Option<i32>,
    pub ty: Option<i32>,
    pub mode: MatchMode,
}

impl Goal {
    /// A goal that constrains nothing.
    pub const NONE: Goal = Goal {
        tx: None,
        ty: None,
        mode: MatchMode::Exact,
    };

    pub const fn new(tx: Option<i32>, ty: Option<i32>, mode: MatchMode) -> Self {
        Goal { tx, ty, mode }
    }

    /// Returns `true` if at least one coordinate is constrained.
    pub fn is_constrained(&self) -> bool {
        self.tx.is_some() || self.ty.is_some()
    }

    /// Checks whether a piece whose top-left corner sits at `(x, y)` meets
    /// this goal. Unconstrained coordinates always pass.
    pub fn is_met_at(&self, x: i32, y: i32) -> bool {
        let accepts = |target: Option<i32>, value: i32| match (target, self.mode) {
            (None, _) => true,
            (Some(t), MatchMode::Exact) => value == t,
            (Some(t), MatchMode::Minimum) => value >= t,
            (Some(t), MatchMode::Maximum) => value <= t,
        };
        accepts(self.tx, x) && accepts(self.ty, y)
    }
}

/// A rigid axis-aligned rectangle on the grid.
///
/// `(x, y)` is the top-left cell, `(w, h)` the size with `w, h` in `{1, 2}`.
/// Two pieces compare equal when position and size match; goals are ignored.
#[derive(Clone, Copy, Debug)]
pub struct Piece {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    goal: Goal,
}

impl PartialEq for Piece {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.w == other.w && self.h == other.h
    }
}

impl Eq for Piece {}

impl Piece {
    /// Creates a piece without a goal.
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Piece {
            x,
            y,
            w,
            h,
            goal: Goal::NONE,
        }
    }

    /// Returns this piece with `goal` attached.
    pub const fn with_goal(self, goal: Goal) -> Self {
        Piece { goal, ..self }
    }

    /// Creates a piece of the size encoded by `shape` (see [`Piece::shape_code`]).
    pub fn from_shape(x: i32, y: i32, shape: u32) -> Self {
        Piece::new(x, y, (shape & 1) as i32 + 1, (shape >> 1) as i32 + 1)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.w
    }

    pub fn height(&self) -> i32 {
        self.h
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    pub(crate) fn set_goal(&mut self, goal: Goal) {
        self.goal = goal;
    }

    /// The 2-bit shape code `2*(h-1) + (w-1)`: 0 = 1x1, 1 = 2x1, 2 = 1x2, 3 = 2x2.
    pub fn shape_code(&self) -> u32 {
        (2 * (self.h - 1) + (self.w - 1)) as u32
    }

    /// Returns `true` if the piece covers cell `(cx, cy)`.
    pub fn covers(&self, cx: i32, cy: i32) -> bool {
        cx >= self.x && cx < self.x + self.w && cy >= self.y && cy < self.y + self.h
    }

    /// Returns `true` if the piece's goal is constrained and currently met,
    /// or if the piece has no goal at all.
    pub fn is_goal_satisfied(&self) -> bool {
        self.goal.is_met_at(self.x, self.y)
    }

    /// The piece translated by a single orthogonal unit step, or `None` if the
    /// step is not a unit step or would leave the grid.
    fn translated(&self, dx: i32, dy: i32) -> Option<Piece> {
        if dx.abs() + dy.abs() != 1 {
            return None;
        }
        let (x, y) = (self.x + dx, self.y + dy);
        if x < 0 || x + self.w > WIDTH as i32 || y < 0 || y + self.h > HEIGHT as i32 {
            return None;
        }
        Some(Piece { x, y, ..*self })
    }

    /// Tests the four corner cells of `self` against `other`. For rectangles of
    /// at most 2x2 the corners are every cell, so the test is exact.
    fn collides(&self, other: &Piece) -> bool {
        let (right, bottom) = (self.x + self.w - 1, self.y + self.h - 1);
        other.covers(self.x, self.y)
            || other.covers(right, self.y)
            || other.covers(self.x, bottom)
            || other.covers(right, bottom)
    }
}

/// A single-piece unit step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    /// Index of the piece in placement order.
    pub piece: usize,
    pub dx: i32,
    pub dy: i32,
}

impl Move {
    /// The step that undoes this one.
    pub fn reversed(&self) -> Move {
        Move {
            piece: self.piece,
            dx: -self.dx,
            dy: -self.dy,
        }
    }
}

/// The puzzle board: pieces in placement order.
///
/// A `Board` always satisfies the instance invariants: every piece lies on the
/// grid, no two pieces overlap, and exactly `EMPTY_CELLS` cells stay free.
/// Moves mutate it in place; backtracking undoes a move with the reversed
/// step.
///
/// # Examples
/// ```
/// use slide_solver::engine::{Board, Piece};
/// use slide_solver::layout::reference_board;
///
/// let mut board = reference_board();
/// assert_eq!(board.checksum(), 12);
/// // The 1x2 piece in the top-left corner can step down into the gap.
/// assert!(board.shift(2, 0, 1));
/// assert!(board.shift(2, 0, -1));
/// assert_eq!(board, reference_board());
/// assert!(Board::new(&[Piece::new(0, 0, 2, 2), Piece::new(1, 1, 1, 1)]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pieces: Vec<Piece>,
    checksum: u32,
}

impl Board {
    /// Assembles a board from pieces in placement order.
    ///
    /// # Errors
    /// Returns a [`PuzzleError`] if there are no pieces or more than
    /// `MAX_PIECES`, a piece has an unsupported size or leaves the grid, two
    /// pieces overlap, or the pieces do not leave exactly `EMPTY_CELLS` free.
    pub fn new(pieces: &[Piece]) -> Result<Self, PuzzleError> {
        if pieces.is_empty() {
            return Err(PuzzleError::NoPieces);
        }
        if pieces.len() > MAX_PIECES {
            return Err(PuzzleError::TooManyPieces {
                count: pieces.len(),
            });
        }

        let mut owner: [Option<usize>; CELLS] = [None; CELLS];
        for (index, piece) in pieces.iter().enumerate() {
            if !(1..=2).contains(&piece.w) || !(1..=2).contains(&piece.h) {
                return Err(PuzzleError::BadSize {
                    index,
                    w: piece.w,
                    h: piece.h,
                });
            }
            if piece.x < 0
                || piece.y < 0
                || piece.x + piece.w > WIDTH as i32
                || piece.y + piece.h > HEIGHT as i32
            {
                return Err(PuzzleError::OutOfBounds {
                    index,
                    x: piece.x,
                    y: piece.y,
                });
            }
            for cy in piece.y..piece.y + piece.h {
                for cx in piece.x..piece.x + piece.w {
                    let cell = cy as usize * WIDTH + cx as usize;
                    if let Some(first) = owner[cell] {
                        return Err(PuzzleError::Overlap {
                            first,
                            second: index,
                        });
                    }
                    owner[cell] = Some(index);
                }
            }
        }

        let free = owner.iter().filter(|cell| cell.is_none()).count();
        if free != EMPTY_CELLS {
            return Err(PuzzleError::WrongSlack { free });
        }

        Ok(Board::from_pieces_unchecked(pieces.to_vec()))
    }

    /// Builds a board from pieces the caller has already validated.
    pub(crate) fn from_pieces_unchecked(pieces: Vec<Piece>) -> Self {
        let checksum = pieces.iter().map(Piece::shape_code).sum();
        Board { pieces, checksum }
    }

    /// The pieces in placement order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Sum of the shape codes of all pieces. Moves never change it.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// The first piece carrying a constrained goal, if any.
    pub fn goal_piece(&self) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.goal.is_constrained())
    }

    /// Returns the index of the piece covering `(x, y)`, or `None` for an empty cell.
    pub fn owner(&self, x: i32, y: i32) -> Option<usize> {
        self.pieces.iter().position(|p| p.covers(x, y))
    }

    /// The configuration as `(x, y, w, h)` tuples, sorted. Two boards with the
    /// same layout differ at most in piece order and goals.
    pub fn layout(&self) -> Vec<(i32, i32, i32, i32)> {
        let mut layout: Vec<_> = self.pieces.iter().map(|p| (p.x, p.y, p.w, p.h)).collect();
        layout.sort_unstable();
        layout
    }

    /// Checks whether piece `index` could take the unit step `(dx, dy)`.
    pub fn can_shift(&self, index: usize, dx: i32, dy: i32) -> bool {
        let Some(moved) = self.pieces.get(index).and_then(|p| p.translated(dx, dy)) else {
            return false;
        };
        !self
            .pieces
            .iter()
            .enumerate()
            .any(|(j, other)| j != index && moved.collides(other))
    }

    /// Moves piece `index` by `(dx, dy)` if the step stays on the grid and
    /// lands on free cells. Returns `false` and leaves the board untouched
    /// otherwise.
    pub fn shift(&mut self, index: usize, dx: i32, dy: i32) -> bool {
        if !self.can_shift(index, dx, dy) {
            return false;
        }
        let piece = &mut self.pieces[index];
        piece.x += dx;
        piece.y += dy;
        true
    }

    /// Applies a move and returns the code of the resulting position. On
    /// failure the board is unchanged and `None` is returned. Undoing is the
    /// caller's job: `shift` with the negated step.
    pub fn try_move(&mut self, index: usize, dx: i32, dy: i32) -> Option<PositionCode> {
        if self.shift(index, dx, dy) {
            Some(self.encode())
        } else {
            None
        }
    }

    /// Every candidate move in generation order: pieces in placement order,
    /// each with the four `DIRECTIONS`. Candidates are not filtered.
    pub fn moves(&self) -> impl Iterator<Item = Move> {
        (0..self.pieces.len()).flat_map(|piece| {
            DIRECTIONS
                .into_iter()
                .map(move |(dx, dy)| Move { piece, dx, dy })
        })
    }

    /// The moves that can be applied right now, in generation order.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.moves()
            .filter(|m| self.can_shift(m.piece, m.dx, m.dy))
            .collect()
    }

    /// `true` when at least one piece carries a goal and every piece's goal is met.
    pub fn is_solved(&self) -> bool {
        self.goal_piece().is_some() && self.pieces.iter().all(Piece::is_goal_satisfied)
    }

    /// Returns a copy of this board after a reproducible random walk of up to
    /// `steps` legal moves.
    pub fn scrambled(&self, seed: u64, steps: usize) -> Board {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = self.clone();
        for _ in 0..steps {
            let moves = board.legal_moves();
            if moves.is_empty() {
                break;
            }
            let m = moves[rng.gen_range(0..moves.len())];
            board.shift(m.piece, m.dx, m.dy);
        }
        board
    }

    /// One string per row (row 0 first), `'A' + index` for covered cells and
    /// `'.'` for empty ones.
    pub fn letter_rows(&self) -> Vec<String> {
        (0..HEIGHT as i32)
            .map(|y| {
                (0..WIDTH as i32)
                    .map(|x| match self.owner(x, y) {
                        Some(i) => (b'A' + i as u8) as char,
                        None => '.',
                    })
                    .collect()
            })
            .collect()
    }

    /// Renders the board as block art: every cell is 4 columns by 3 lines of
    /// `#`, and the one-character gaps between cells are filled only inside a
    /// piece. Row 0 is printed first. Trailing blanks are trimmed.
    pub fn to_block_art(&self) -> String {
        let same = |x: i32, y: i32, nx: i32, ny: i32| -> bool {
            nx < WIDTH as i32
                && ny < HEIGHT as i32
                && self.owner(x, y).is_some()
                && self.owner(x, y) == self.owner(nx, ny)
        };
        let mark = |on: bool, width: usize| if on { "#".repeat(width) } else { " ".repeat(width) };

        let mut lines = Vec::with_capacity(HEIGHT * 4);
        for y in 0..HEIGHT as i32 {
            let mut body = String::from(" ");
            for x in 0..WIDTH as i32 {
                body.push_str(&mark(self.owner(x, y).is_some(), 4));
                body.push_str(&mark(same(x, y, x + 1, y), 1));
            }
            for _ in 0..3 {
                lines.push(body.trim_end().to_string());
            }

            let mut seam = String::from(" ");
            for x in 0..WIDTH as i32 {
                seam.push_str(&mark(same(x, y, x, y + 1), 4));
                seam.push_str(&mark(same(x, y, x + 1, y) && same(x, y, x, y + 1), 1));
            }
            lines.push(seam.trim_end().to_string());
        }
        lines.join("\n")
    }
}

impl fmt::Display for Board {
    /// Formats the board as block art, see [`Board::to_block_art`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_block_art())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{reference_board, reference_pieces};
    use crate::utils::board_from_str_array;

    #[test]
    fn test_shape_codes() {
        assert_eq!(Piece::new(0, 0, 1, 1).shape_code(), 0);
        assert_eq!(Piece::new(0, 0, 2, 1).shape_code(), 1);
        assert_eq!(Piece::new(0, 0, 1, 2).shape_code(), 2);
        assert_eq!(Piece::new(0, 0, 2, 2).shape_code(), 3);
        for shape in 0..4 {
            assert_eq!(Piece::from_shape(1, 1, shape).shape_code(), shape);
        }
    }

    #[test]
    fn test_goal_modes() {
        let exact = Goal::new(Some(1), Some(3), MatchMode::Exact);
        assert!(exact.is_met_at(1, 3));
        assert!(!exact.is_met_at(2, 3));

        let minimum = Goal::new(Some(1), Some(3), MatchMode::Minimum);
        assert!(minimum.is_met_at(1, 3));
        assert!(minimum.is_met_at(2, 3));
        assert!(!minimum.is_met_at(0, 3));
        assert!(!minimum.is_met_at(2, 2));

        let maximum = Goal::new(Some(1), None, MatchMode::Maximum);
        assert!(maximum.is_met_at(0, 4));
        assert!(maximum.is_met_at(1, 0));
        assert!(!maximum.is_met_at(2, 0));

        assert!(Goal::NONE.is_met_at(3, 4));
        assert!(!Goal::NONE.is_constrained());
    }

    #[test]
    fn test_piece_equality_ignores_goal() {
        let plain = Piece::new(1, 0, 2, 2);
        let goal = plain.with_goal(Goal::new(Some(1), Some(3), MatchMode::Minimum));
        assert_eq!(plain, goal);
        assert_ne!(plain, Piece::new(1, 0, 1, 2));
    }

    #[test]
    fn test_board_new_rejects_defects() {
        let mut pieces = reference_pieces().to_vec();
        pieces.push(Piece::new(0, 2, 1, 1));
        assert_eq!(
            Board::new(&pieces),
            Err(PuzzleError::TooManyPieces { count: 11 })
        );

        assert_eq!(Board::new(&[]), Err(PuzzleError::NoPieces));

        let mut off_grid = reference_pieces().to_vec();
        off_grid[3] = Piece::new(3, 4, 1, 2);
        assert!(matches!(
            Board::new(&off_grid),
            Err(PuzzleError::OutOfBounds { index: 3, .. })
        ));

        let mut overlapping = reference_pieces().to_vec();
        overlapping[6] = Piece::new(1, 1, 1, 1);
        assert_eq!(
            Board::new(&overlapping),
            Err(PuzzleError::Overlap {
                first: 0,
                second: 6
            })
        );

        let short = &reference_pieces()[..9];
        assert_eq!(Board::new(short), Err(PuzzleError::WrongSlack { free: 3 }));

        let mut wide = reference_pieces().to_vec();
        wide[1] = Piece::new(1, 2, 3, 1);
        assert!(matches!(
            Board::new(&wide),
            Err(PuzzleError::BadSize { index: 1, w: 3, h: 1 })
        ));
    }

    #[test]
    fn test_shift_rejects_collisions_and_edges() {
        let mut board = reference_board();
        let before = board.clone();

        assert!(!board.shift(0, 0, -1), "goal piece is on the top edge");
        assert!(!board.shift(0, 0, 1), "the 2x1 piece blocks the way down");
        assert!(!board.shift(6, 1, 0), "1x1 pieces block each other");
        assert!(!board.shift(2, 1, 1), "diagonal steps are not moves");
        assert!(!board.shift(2, 0, 2), "steps are unit length");
        assert!(!board.shift(42, 0, 1), "no such piece");
        assert_eq!(board, before);

        assert!(board.shift(1, -1, 0));
        assert_eq!(board.pieces()[1].x(), 0);
    }

    #[test]
    fn test_legal_moves_follow_generation_order() {
        let board = reference_board();
        let legal = board.legal_moves();
        // Only the pieces bordering the two gaps at (0, 2) and (3, 2) can move.
        assert_eq!(
            legal,
            vec![
                Move { piece: 1, dx: -1, dy: 0 },
                Move { piece: 1, dx: 1, dy: 0 },
                Move { piece: 2, dx: 0, dy: 1 },
                Move { piece: 3, dx: 0, dy: 1 },
                Move { piece: 4, dx: 0, dy: -1 },
                Move { piece: 5, dx: 0, dy: -1 },
            ]
        );
        assert_eq!(board.moves().count(), 40);
    }

    #[test]
    fn test_move_reversibility_over_random_walk() {
        let mut board = reference_board().scrambled(7, 40);
        for step in 0..200u64 {
            let snapshot = board.clone();
            for m in board.legal_moves() {
                assert!(board.shift(m.piece, m.dx, m.dy));
                let back = m.reversed();
                assert!(board.shift(back.piece, back.dx, back.dy));
                assert_eq!(board, snapshot, "move {:?} was not undone exactly", m);
            }
            board = board.scrambled(step, 1);
        }
    }

    #[test]
    fn test_no_overlap_after_random_walks() {
        for seed in 0..20 {
            let board = reference_board().scrambled(seed, 300);
            let pieces: Vec<Piece> = board
                .pieces()
                .iter()
                .map(|p| Piece::new(p.x(), p.y(), p.width(), p.height()))
                .collect();
            assert!(
                Board::new(&pieces).is_ok(),
                "seed {} produced {:?}",
                seed,
                board.letter_rows()
            );
            assert_eq!(board.checksum(), reference_board().checksum());
        }
    }

    #[test]
    fn test_is_solved_needs_a_goal() {
        let board = board_from_str_array(&["AABC", "AABC", "DEFG", "DEHI", "JJ.."]).unwrap();
        assert!(board.goal_piece().is_none());
        assert!(!board.is_solved());

        let mut pieces = board.pieces().to_vec();
        pieces[0] = pieces[0].with_goal(Goal::new(Some(0), Some(0), MatchMode::Exact));
        let with_goal = Board::new(&pieces).unwrap();
        assert!(with_goal.is_solved());
    }

    #[test]
    fn test_reference_board_is_not_solved() {
        let board = reference_board();
        assert!(!board.is_solved());
        assert_eq!(board.goal_piece().map(|p| p.shape_code()), Some(3));
    }

    #[test]
    fn test_letter_rows() {
        let board = reference_board();
        assert_eq!(
            board.letter_rows(),
            vec!["CAAD", "CAAD", ".BB.", "EGHF", "EIJF"]
        );
    }

    #[test]
    fn test_block_art_joins_cells_of_one_piece() {
        let board = board_from_str_array(&["AABC", "AABC", "DDEF", "GHEF", "GI.."]).unwrap();
        let art = board.to_block_art();
        // The seam below the last row is blank, so the art ends in a newline.
        let lines: Vec<&str> = art.split('\n').collect();
        assert_eq!(lines.len(), HEIGHT * 4);
        assert_eq!(lines[HEIGHT * 4 - 1], "");
        assert_eq!(lines[0], " ######### #### ####");
        // Seam below row 0: A continues (with its centre), B and C continue.
        assert_eq!(lines[3], " ######### #### ####");
        // Seam below row 1: nothing continues.
        assert_eq!(lines[7], "");
        // Row 4: G and I, then the two gaps.
        assert_eq!(lines[16], " #### ####");
        assert_eq!(format!("{}", board), art);
    }
}
