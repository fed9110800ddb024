use crate::board::Point;

/// Everything that can go wrong while building or solving a board.
///
/// `HitMine` is an expected outcome of an unlucky guess, not a defect;
/// the session driver catches it and reports how much of the board was
/// cleared. The other variants are surfaced to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed textual board description. Fatal to that construction
    /// call; the board is never partially built.
    #[error("malformed board: {0}")]
    Format(String),

    /// Coordinate outside the grid. A caller bug: solver-internal
    /// neighbor generation is bounds-checked and never produces these.
    #[error("{point} is outside the {rows}x{cols} board")]
    OutOfBounds {
        point: Point,
        rows: usize,
        cols: usize,
    },

    /// A command that contradicts current cell state, e.g. flagging a
    /// revealed cell. Board state is left untouched.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A mine was revealed. Terminal for the current solve session.
    #[error("revealed a mine at {0}")]
    HitMine(Point),

    /// Two seeds with identical members but different bounds, or bounds
    /// that crossed during refinement. Indicates a corrupt puzzle or a
    /// solver bug; never silently coerced.
    #[error("internal inconsistency: {0}")]
    Inconsistency(String),
}
