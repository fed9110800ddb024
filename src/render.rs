//! Text rendering of a board for the terminal, plain or ANSI-colored.

use itertools::Itertools;

use crate::board::{Board, CellState, Point};
use crate::error::Error;

/// Renders the board as the player sees it: `.` hidden, `F` flags,
/// `X` revealed mines, a space for a 0 clue and the digit otherwise.
pub fn pretty(board: &Board, color: bool) -> Result<String, Error> {
    let (rows, cols) = board.dimensions();
    let mut lines = Vec::with_capacity(rows);
    for row in 0..rows {
        let mut glyphs = Vec::with_capacity(cols);
        for col in 0..cols {
            glyphs.push(glyph(board.cell_state(Point::new(row, col))?, color));
        }
        lines.push(glyphs.into_iter().join(" "));
    }
    Ok(lines.into_iter().join("\n"))
}

fn glyph(state: CellState, color: bool) -> String {
    match state {
        CellState::Hidden => ".".into(),
        CellState::Flagged if color => "\x1b[32mF\x1b[0m".into(),
        CellState::Flagged => "F".into(),
        CellState::Revealed { mine: true, .. } if color => "\x1b[31mX\x1b[0m".into(),
        CellState::Revealed { mine: true, .. } => "X".into(),
        CellState::Revealed { clue: 0, .. } => " ".into(),
        CellState::Revealed { clue, .. } if color => format!("\x1b[94m{clue}\x1b[0m"),
        CellState::Revealed { clue, .. } => clue.to_string(),
    }
}
