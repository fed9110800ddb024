use std::fmt;
use std::str::FromStr;

use itertools::iproduct;

use crate::error::Error;

/// A 2D coordinate on the board, `(row, col)` with `(0, 0)` top-left.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Point { row, col }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// What a caller is allowed to know about one cell.
/// This is the only read surface the solver needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Hidden,
    Flagged,
    /// For a revealed mine `clue` is 0 and meaningless; a mine's clue is
    /// never computed, because revealing one ends the session.
    Revealed {
        mine: bool,
        clue: u8,
    },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Cell {
    hidden: bool,
    mine: bool,
    flagged: bool,
    /// Adjacent-mine count, memoized on first reveal.
    clue: Option<u8>,
}

impl Cell {
    fn covered(mine: bool) -> Self {
        Cell {
            hidden: true,
            mine,
            flagged: false,
            clue: None,
        }
    }
}

/// A rectangular minesweeper board.
///
/// The mine placement is fixed at construction and never mutated; the
/// only state changes afterwards go through [`Board::reveal`] and
/// [`Board::flag`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl Board {
    /// Builds a fully hidden board from a mine layout, one `Vec<bool>`
    /// per row with `true` marking a mine.
    pub fn from_mine_grid(grid: Vec<Vec<bool>>) -> Result<Self, Error> {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(Error::Format("board must have at least one cell".into()));
        }
        if grid.iter().any(|row| row.len() != cols) {
            return Err(Error::Format("board must be rectangular".into()));
        }
        let cells = grid
            .into_iter()
            .map(|row| row.into_iter().map(Cell::covered).collect())
            .collect();
        Ok(Board { rows, cols, cells })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// State of one cell. This is the read surface handed to guess
    /// policies, so it bounds-checks like [`Board::reveal`] and
    /// [`Board::flag`] instead of panicking on a bad coordinate.
    pub fn cell_state(&self, p: Point) -> Result<CellState, Error> {
        self.check_bounds(p)?;
        let cell = &self.cells[p.row][p.col];
        Ok(if cell.flagged {
            CellState::Flagged
        } else if cell.hidden {
            CellState::Hidden
        } else {
            CellState::Revealed {
                mine: cell.mine,
                clue: cell.clue.unwrap_or(0),
            }
        })
    }

    /// Reveals a hidden, unflagged cell.
    ///
    /// On a mine the cell stays revealed and `Error::HitMine` is
    /// returned. Otherwise the clue (adjacent-mine count over the
    /// in-bounds 8-neighborhood) is computed, cached, and returned.
    pub fn reveal(&mut self, p: Point) -> Result<u8, Error> {
        self.check_bounds(p)?;
        let cell = &self.cells[p.row][p.col];
        if cell.flagged {
            return Err(Error::InvalidOperation(format!(
                "cannot reveal flagged cell {p}"
            )));
        }
        if !cell.hidden {
            return Err(Error::InvalidOperation(format!(
                "cell {p} is already revealed"
            )));
        }

        self.cells[p.row][p.col].hidden = false;
        if self.cells[p.row][p.col].mine {
            return Err(Error::HitMine(p));
        }

        let clue = self
            .neighbors(p)
            .filter(|n| self.cells[n.row][n.col].mine)
            .count() as u8;
        self.cells[p.row][p.col].clue = Some(clue);
        Ok(clue)
    }

    /// Flags a hidden cell as a known mine. Re-flagging is a no-op;
    /// flagging a revealed cell is an error.
    pub fn flag(&mut self, p: Point) -> Result<(), Error> {
        self.check_bounds(p)?;
        let cell = &mut self.cells[p.row][p.col];
        if !cell.hidden {
            return Err(Error::InvalidOperation(format!(
                "cannot flag revealed cell {p}"
            )));
        }
        cell.flagged = true;
        Ok(())
    }

    /// The in-bounds 8-neighborhood of `p`, excluding `p` itself.
    /// Out-of-bounds offsets are simply omitted.
    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> + use<> {
        let (rows, cols) = (self.rows, self.cols);
        (-1i32..=1).flat_map(move |dr| {
            (-1i32..=1).filter_map(move |dc| {
                if dr == 0 && dc == 0 {
                    return None;
                }
                let nr = p.row as i32 + dr;
                let nc = p.col as i32 + dc;
                if nr >= 0 && nr < rows as i32 && nc >= 0 && nc < cols as i32 {
                    Some(Point::new(nr as usize, nc as usize))
                } else {
                    None
                }
            })
        })
    }

    /// All coordinates that are still hidden and not flagged, i.e. the
    /// squares the solver has not yet resolved.
    pub fn hidden_unflagged(&self) -> Vec<Point> {
        iproduct!(0..self.rows, 0..self.cols)
            .filter(|&(r, c)| {
                let cell = &self.cells[r][c];
                cell.hidden && !cell.flagged
            })
            .map(|(r, c)| Point::new(r, c))
            .collect()
    }

    /// Percentage of non-mine cells that have been revealed; the final
    /// progress report when a session ends on a mine. A board with no
    /// safe cells counts as vacuously cleared.
    pub fn cleared_percent(&self) -> f64 {
        let safe = self.cells.iter().flatten().filter(|c| !c.mine);
        let total = safe.clone().count();
        if total == 0 {
            return 100.0;
        }
        let revealed = safe.filter(|c| !c.hidden).count();
        revealed as f64 / total as f64 * 100.0
    }

    /// Serializes the board state to bytes.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Restores a board state from bytes.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bytes)?)
    }

    fn check_bounds(&self, p: Point) -> Result<(), Error> {
        if p.row < self.rows && p.col < self.cols {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                point: p,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }
}

impl FromStr for Board {
    type Err = Error;

    /// Parses a textual grid: rows separated by newlines, cells by
    /// whitespace, `X` for a mine and `.` for an empty square.
    fn from_str(s: &str) -> Result<Self, Error> {
        let grid = s
            .lines()
            .map(|line| {
                line.split_whitespace()
                    .map(|token| match token {
                        "X" => Ok(true),
                        "." => Ok(false),
                        other => {
                            Err(Error::Format(format!("unknown cell symbol {other:?}")))
                        }
                    })
                    .collect::<Result<Vec<bool>, Error>>()
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Board::from_mine_grid(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: usize, col: usize) -> Point {
        Point::new(row, col)
    }

    #[test]
    fn parse_layout() {
        let board: Board = "X . .\n. . .\n. . X".parse().unwrap();
        assert_eq!(board.dimensions(), (3, 3));
        assert!(board.cells[0][0].mine);
        assert!(board.cells[2][2].mine);
        assert!(!board.cells[1][1].mine);
        // Everything starts hidden.
        assert_eq!(board.hidden_unflagged().len(), 9);
    }

    #[test]
    fn parse_rejects_unknown_symbol() {
        let err = "X . ?\n. . .".parse::<Board>().unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        let err = "X .\n. . .".parse::<Board>().unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert!(matches!("".parse::<Board>(), Err(Error::Format(_))));
    }

    #[test]
    fn reveal_computes_and_caches_clue() {
        let mut board: Board = "X . .\n. . .\n. . X".parse().unwrap();
        // Center square touches both mines.
        assert_eq!(board.reveal(p(1, 1)).unwrap(), 2);
        assert_eq!(
            board.cell_state(p(1, 1)).unwrap(),
            CellState::Revealed {
                mine: false,
                clue: 2
            }
        );
        // Corner square touches only the (0, 0) mine.
        assert_eq!(board.reveal(p(0, 1)).unwrap(), 1);
    }

    #[test]
    fn reveal_mine_is_terminal_but_leaves_cell_revealed() {
        let mut board: Board = "X .\n. .".parse().unwrap();
        assert_eq!(board.reveal(p(0, 0)), Err(Error::HitMine(p(0, 0))));
        assert_eq!(
            board.cell_state(p(0, 0)).unwrap(),
            CellState::Revealed {
                mine: true,
                clue: 0
            }
        );
    }

    #[test]
    fn reveal_twice_is_invalid() {
        let mut board: Board = ". .\n. .".parse().unwrap();
        board.reveal(p(0, 0)).unwrap();
        assert!(matches!(
            board.reveal(p(0, 0)),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn reveal_out_of_bounds() {
        let mut board: Board = ". .\n. .".parse().unwrap();
        assert!(matches!(
            board.reveal(p(5, 0)),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn cell_state_out_of_bounds_is_an_error() {
        let board: Board = ". .\n. .".parse().unwrap();
        assert!(matches!(
            board.cell_state(p(0, 2)),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            board.cell_state(p(2, 0)),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn flag_semantics() {
        let mut board: Board = "X .\n. .".parse().unwrap();
        board.flag(p(0, 0)).unwrap();
        assert_eq!(board.cell_state(p(0, 0)).unwrap(), CellState::Flagged);
        // Re-flagging is a no-op.
        board.flag(p(0, 0)).unwrap();
        // A flagged cell cannot be revealed.
        assert!(matches!(
            board.reveal(p(0, 0)),
            Err(Error::InvalidOperation(_))
        ));
        // A revealed cell cannot be flagged.
        board.reveal(p(1, 1)).unwrap();
        assert!(matches!(
            board.flag(p(1, 1)),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn flagged_cells_are_not_counted_as_unresolved() {
        let mut board: Board = "X .\n. .".parse().unwrap();
        board.flag(p(0, 0)).unwrap();
        assert_eq!(board.hidden_unflagged().len(), 3);
    }

    #[test]
    fn cleared_percent_tracks_revealed_safe_cells() {
        let mut board: Board = "X .\n. .".parse().unwrap();
        assert_eq!(board.cleared_percent(), 0.0);
        board.reveal(p(1, 1)).unwrap();
        assert!((board.cleared_percent() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn neighbor_counts_clamp_at_edges() {
        let board: Board = ". . .\n. . .\n. . .".parse().unwrap();
        assert_eq!(board.neighbors(p(0, 0)).count(), 3);
        assert_eq!(board.neighbors(p(1, 0)).count(), 5);
        assert_eq!(board.neighbors(p(1, 1)).count(), 8);
    }

    #[test]
    fn one_by_one_board_reveals_with_clue_zero() {
        let mut board: Board = ".".parse().unwrap();
        assert_eq!(board.dimensions(), (1, 1));
        assert_eq!(board.reveal(p(0, 0)).unwrap(), 0);
        assert!(board.hidden_unflagged().is_empty());
    }

    #[test]
    fn snapshot_restores_mid_game_state() {
        let mut board: Board = "X . .\n. . .\n. . X".parse().unwrap();
        board.reveal(p(1, 1)).unwrap();
        board.flag(p(0, 0)).unwrap();

        let restored = Board::from_bytes(&board.to_bytes().unwrap()).unwrap();
        assert_eq!(
            restored.cell_state(p(1, 1)).unwrap(),
            CellState::Revealed {
                mine: false,
                clue: 2
            }
        );
        assert_eq!(restored.cell_state(p(0, 0)).unwrap(), CellState::Flagged);
        assert_eq!(restored.hidden_unflagged(), board.hidden_unflagged());
    }
}
