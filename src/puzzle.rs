//! Random puzzle generation: a uniform mine placement emitted in the
//! textual layout format the board parses.

use std::collections::HashSet;

use itertools::Itertools;
use rand::Rng;

use crate::error::Error;

/// Lays out `num_mines` mines uniformly at random on a `rows` x `cols`
/// grid. The rng is caller-supplied so runs can be seeded.
pub fn random_layout<R: Rng + ?Sized>(
    rng: &mut R,
    rows: usize,
    cols: usize,
    num_mines: usize,
) -> Result<String, Error> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidOperation(
            "board must have at least one cell".into(),
        ));
    }
    if num_mines > rows * cols {
        return Err(Error::InvalidOperation(format!(
            "{num_mines} mines do not fit on a {rows}x{cols} board"
        )));
    }

    let mines: HashSet<usize> = rand::seq::index::sample(rng, rows * cols, num_mines)
        .into_iter()
        .collect();
    Ok((0..rows)
        .map(|row| {
            (0..cols)
                .map(|col| {
                    if mines.contains(&(row * cols + col)) {
                        "X"
                    } else {
                        "."
                    }
                })
                .join(" ")
        })
        .join("\n"))
}
