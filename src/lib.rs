//! # Sliding Block Puzzle Solver Library
//!
//! This library provides the state-space engine for a sliding-block puzzle on
//! a 4x5 grid: rigid 1x1, 2x1, 1x2 and 2x2 pieces move one cell at a time
//! into empty space until the goal piece reaches its target.
//!
//! Every configuration of a puzzle instance maps to a dense integer code, and
//! a flat table indexed by that code backs both search strategies:
//! - iterative deepening with transposition pruning (`solver`),
//! - exhaustive reachability with path reconstruction (`scanner`).
//!
//! It is used by the `slide_solver` binary, which runs either strategy on the
//! compiled-in instance.
//!
//! ## Modules
//! - `engine`: pieces, goals, the board, move generation and rendering.
//! - `layout`: the compiled-in reference instance.
//! - `codec`: the position code (`Board::encode`, `Codec::decode`).
//! - `table`: the per-code status table.
//! - `context`: `SearchContext`, which ties codec, table and counters to one run.
//! - `solver`: iterative-deepening depth-first search.
//! - `scanner`: classification, fixed-point expansion and path reconstruction.
//! - `utils`: building boards from letter pictures.

pub mod codec;
pub mod context;
pub mod engine;
pub mod layout;
pub mod scanner;
pub mod solver;
pub mod table;
pub mod utils;
