//! An autonomous minesweeper solver.
//!
//! The board tracks hidden/revealed/flagged state over a fixed mine
//! placement; the solver turns revealed clues into sets of hidden
//! coordinates with known mine-count bounds, refines overlapping sets
//! against each other to a fixed point, and acts on every set whose
//! bounds collapse. When deduction stalls, a pluggable guess policy
//! picks the next square.

pub mod board;
pub mod error;
pub mod puzzle;
pub mod render;
pub mod session;
pub mod solver;

pub use board::{Board, CellState, Point};
pub use error::Error;
pub use session::{GuessPolicy, Outcome, RandomGuess, Session};
pub use solver::{Bounds, ClueSets, Deductions, deduce};
