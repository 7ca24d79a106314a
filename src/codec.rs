//! Dense position codes.
//!
//! A board is encoded by scanning the grid row by row (row 0 first, left to
//! right). Every cell is empty, the anchor (top-left cell) of a piece, or
//! covered by a piece anchored earlier. Anchors contribute their 2-bit shape
//! code to a big-endian integer; each empty cell contributes one digit, in base
//! `pieces + 1`, holding the number of anchors seen before it. The last shape
//! code is dropped because it follows from the checksum:
//!
//! ```text
//! code = (shape_bits >> 2) * (pieces + 1)^2 + empty_digits
//! ```
//!
//! so codes live in `[0, (pieces + 1)^2 * 4^(pieces - 1))`. Not every code in
//! that range is a legal board; [`Codec::decode`] tells the two apart.
use crate::engine::{Board, Goal, Piece, CELLS, EMPTY_CELLS, HEIGHT, WIDTH};
use thiserror::Error;

/// Identifier of a board configuration.
pub type PositionCode = u32;

/// Why a code does not decode to a legal board.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IllegalityReason {
    #[error("code {code} is outside the codomain of size {size}")]
    OutOfRange { code: PositionCode, size: usize },
    #[error("piece anchored at cell {cell} runs off the grid")]
    OffGrid { cell: usize },
    #[error("piece anchored at cell {cell} covers a cell that is already taken")]
    Overlap { cell: usize },
    #[error("grid has room for more anchors than the instance has pieces")]
    TooManyAnchors,
    #[error("shape codes do not add up to the checksum")]
    ChecksumMismatch,
    #[error("{found} empty cells decoded, expected {expected}", expected = EMPTY_CELLS)]
    EmptyCount { found: usize },
    #[error("{found} pieces decoded, expected {expected}")]
    PieceCount { found: usize, expected: usize },
    #[error("decoded shapes differ from the instance's pieces")]
    ShapeCensus,
}

#[derive(Clone, Copy)]
enum Cell {
    Empty,
    Anchor(u32),
    Covered,
}

impl Board {
    /// Encodes this board. Boards with the same layout get the same code,
    /// whatever the order of their pieces.
    pub fn encode(&self) -> PositionCode {
        let radix = self.len() as u32 + 1;

        let mut grid = [Cell::Empty; CELLS];
        for piece in self.pieces() {
            for dy in 0..piece.height() {
                for dx in 0..piece.width() {
                    let cell = (piece.y() + dy) as usize * WIDTH + (piece.x() + dx) as usize;
                    grid[cell] = if dx == 0 && dy == 0 {
                        Cell::Anchor(piece.shape_code())
                    } else {
                        Cell::Covered
                    };
                }
            }
        }

        let mut empty_digits = 0;
        let mut anchors = 0;
        let mut shape_bits = 0;
        for cell in grid {
            match cell {
                Cell::Empty => empty_digits = empty_digits * radix + anchors,
                Cell::Anchor(shape) => {
                    shape_bits = (shape_bits << 2) | shape;
                    anchors += 1;
                }
                Cell::Covered => {}
            }
        }

        (shape_bits >> 2) * radix * radix + empty_digits
    }
}

/// Decoder for one puzzle instance.
///
/// The codec remembers what every configuration of the instance shares: the
/// number of pieces, the checksum, how many pieces of each shape there are,
/// and the goal carried by the start board.
#[derive(Clone, Debug)]
pub struct Codec {
    piece_count: usize,
    checksum: u32,
    census: [usize; 4],
    goal: Option<(u32, Goal)>,
}

impl Codec {
    pub fn new(start: &Board) -> Self {
        let mut census = [0; 4];
        for piece in start.pieces() {
            census[piece.shape_code() as usize] += 1;
        }
        Codec {
            piece_count: start.len(),
            checksum: start.checksum(),
            census,
            goal: start.goal_piece().map(|p| (p.shape_code(), p.goal())),
        }
    }

    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Number of codes, `(pieces + 1)^2 * 4^(pieces - 1)`.
    pub fn size(&self) -> usize {
        let radix = self.piece_count + 1;
        (radix * radix) << (2 * (self.piece_count - 1))
    }

    /// Rebuilds the board behind `code`.
    ///
    /// Walks the grid in encoding order. At each free cell the next empty-slot
    /// digit decides whether the cell stays empty or anchors the next piece,
    /// whose shape comes from the shape bits (or, for the last piece, from the
    /// checksum). Pieces come back in anchor order. The instance's goal is
    /// attached to a piece of the goal's shape, preferring one that meets it,
    /// so `is_solved()` on the result tells whether the position is final.
    ///
    /// # Errors
    /// Any structural violation makes the code illegal; see [`IllegalityReason`].
    pub fn decode(&self, code: PositionCode) -> Result<Board, IllegalityReason> {
        let size = self.size();
        if code as usize >= size {
            return Err(IllegalityReason::OutOfRange { code, size });
        }

        let radix = self.piece_count as u32 + 1;
        let mut empty_digits = code % (radix * radix);
        let shape_bits = code / (radix * radix);

        let mut taken = [false; CELLS];
        let mut pieces: Vec<Piece> = Vec::with_capacity(self.piece_count);
        let mut empties = 0;
        let mut shape_sum = 0;
        let mut cell = 0;

        while cell < CELLS {
            // Once both slots are used up the digit reads as 0 again; the
            // count guard keeps a third slot from matching.
            if empties < EMPTY_CELLS && pieces.len() as u32 == empty_digits / radix % radix {
                empties += 1;
                cell += 1;
                empty_digits *= radix;
            } else {
                if pieces.len() == self.piece_count {
                    return Err(IllegalityReason::TooManyAnchors);
                }
                let later = self.piece_count - 1 - pieces.len();
                let shape = if later > 0 {
                    (shape_bits >> (2 * (later - 1))) & 0x03
                } else {
                    self.checksum
                        .checked_sub(shape_sum)
                        .filter(|&last| last <= 3)
                        .ok_or(IllegalityReason::ChecksumMismatch)?
                };

                let piece = Piece::from_shape((cell % WIDTH) as i32, (cell / WIDTH) as i32, shape);
                if piece.x() + piece.width() > WIDTH as i32 || piece.y() + piece.height() > HEIGHT as i32
                {
                    return Err(IllegalityReason::OffGrid { cell });
                }
                for dy in 0..piece.height() as usize {
                    for dx in 0..piece.width() as usize {
                        let covered = cell + dy * WIDTH + dx;
                        if taken[covered] {
                            return Err(IllegalityReason::Overlap { cell });
                        }
                        taken[covered] = true;
                    }
                }

                shape_sum += shape;
                pieces.push(piece);
            }

            while cell < CELLS && taken[cell] {
                cell += 1;
            }
        }

        if empties != EMPTY_CELLS {
            return Err(IllegalityReason::EmptyCount { found: empties });
        }
        if pieces.len() != self.piece_count {
            return Err(IllegalityReason::PieceCount {
                found: pieces.len(),
                expected: self.piece_count,
            });
        }
        if shape_sum != self.checksum {
            return Err(IllegalityReason::ChecksumMismatch);
        }
        let mut census = [0; 4];
        for piece in &pieces {
            census[piece.shape_code() as usize] += 1;
        }
        if census != self.census {
            return Err(IllegalityReason::ShapeCensus);
        }

        if let Some((shape, goal)) = self.goal {
            let mut candidates = pieces
                .iter()
                .enumerate()
                .filter(|(_, p)| p.shape_code() == shape)
                .map(|(i, _)| i);
            let first = candidates.clone().next();
            let chosen = candidates
                .find(|&i| goal.is_met_at(pieces[i].x(), pieces[i].y()))
                .or(first);
            if let Some(i) = chosen {
                pieces[i].set_goal(goal);
            }
        }

        Ok(Board::from_pieces_unchecked(pieces))
    }

    /// Returns `true` if `code` decodes to a legal board.
    pub fn is_legal(&self, code: PositionCode) -> bool {
        self.decode(code).is_ok()
    }
}
