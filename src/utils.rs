use crate::engine::{Board, Goal, Piece, PuzzleError, HEIGHT, WIDTH};
use thiserror::Error;

/// Errors raised while reading a letter picture.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PictureError {
    #[error("expected {expected} rows, found {found}", expected = HEIGHT)]
    RowCount { found: usize },
    #[error("row {row} has {found} cells, expected {expected}", expected = WIDTH)]
    RowLength { row: usize, found: usize },
    #[error("unrecognized character '{ch}' in row {row} col {col}")]
    BadCharacter { ch: char, row: usize, col: usize },
    #[error("piece '{letter}' is missing, letters must run from 'A' without gaps")]
    MissingLetter { letter: char },
    #[error("piece '{letter}' is not a solid 1x1, 2x1, 1x2 or 2x2 block")]
    NotABlock { letter: char },
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
}

/// Parses a letter picture into a `Board`.
///
/// The picture has one string per row, row 0 first, each exactly `WIDTH`
/// characters. `'.'` marks an empty cell; every other cell holds an
/// uppercase letter naming the piece that covers it. Piece `'A'` becomes
/// piece 0, `'B'` piece 1 and so on, so `board.letter_rows()` gives the
/// picture back. No piece carries a goal.
///
/// # Errors
/// Returns a [`PictureError`] if:
/// - the picture does not have `HEIGHT` rows of `WIDTH` characters,
/// - a character is neither `'.'` nor an uppercase letter,
/// - the letters skip one (`'A'`, `'C'` without `'B'`),
/// - a letter's cells do not form a solid block of a supported size,
/// - the pieces do not make a valid board (see [`Board::new`]).
///
/// # Examples
/// ```
/// use slide_solver::utils::board_from_str_array;
///
/// let rows = ["CAAD", "CAAD", ".BB.", "EGHF", "EIJF"];
/// let board = board_from_str_array(&rows).unwrap();
/// assert_eq!(board.len(), 10);
/// assert_eq!(board.pieces()[0].width(), 2);
/// assert_eq!(board.letter_rows(), rows);
///
/// assert!(board_from_str_array(&["CAAD", "CAAD", ".BB.", "EGHF"]).is_err());
/// assert!(board_from_str_array(&["CAAD", "CAAD", ".BB.", "EGHF", "EI?F"]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<Board, PictureError> {
    if s.len() != HEIGHT {
        return Err(PictureError::RowCount { found: s.len() });
    }

    // Bounding box and cell count per letter.
    let mut spans: [Option<(i32, i32, i32, i32, i32)>; 26] = [None; 26];
    for (r, row_str) in s.iter().enumerate() {
        let found = row_str.chars().count();
        if found != WIDTH {
            return Err(PictureError::RowLength { row: r, found });
        }
        for (c, ch) in row_str.chars().enumerate() {
            if ch == '.' {
                continue;
            }
            if !ch.is_ascii_uppercase() {
                return Err(PictureError::BadCharacter { ch, row: r, col: c });
            }
            let (x, y) = (c as i32, r as i32);
            let span = &mut spans[(ch as u8 - b'A') as usize];
            *span = Some(match *span {
                None => (x, y, x, y, 1),
                Some((x0, y0, x1, y1, n)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y), n + 1),
            });
        }
    }

    let used = spans.iter().rposition(Option::is_some).map_or(0, |last| last + 1);
    let mut pieces = Vec::with_capacity(used);
    for (index, span) in spans[..used].iter().enumerate() {
        let letter = (b'A' + index as u8) as char;
        let Some((x0, y0, x1, y1, cells)) = *span else {
            return Err(PictureError::MissingLetter { letter });
        };
        let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
        if w > 2 || h > 2 || cells != w * h {
            return Err(PictureError::NotABlock { letter });
        }
        pieces.push(Piece::new(x0, y0, w, h));
    }

    Ok(Board::new(&pieces)?)
}

/// Parses a letter picture like [`board_from_str_array`] and gives piece
/// `'A'` the goal `goal`.
pub fn puzzle_from_str_array(s: &[&str], goal: Goal) -> Result<Board, PictureError> {
    let board = board_from_str_array(s)?;
    let mut pieces = board.pieces().to_vec();
    pieces[0] = pieces[0].with_goal(goal);
    Ok(Board::new(&pieces)?)
}
