use anyhow::Context;
use autosweeper::{Board, Outcome, RandomGuess, Session, puzzle, render};

const ROWS: usize = 15;
const COLS: usize = 15;
const NUM_MINES: usize = 40;

fn main() -> anyhow::Result<()> {
    let mut rng = rand::rng();
    let layout = puzzle::random_layout(&mut rng, ROWS, COLS, NUM_MINES)?;
    let board: Board = layout.parse().context("generated layout should parse")?;

    println!("--- Autonomous Minesweeper ---");
    println!("{ROWS}x{COLS} board, {NUM_MINES} mines.");
    println!("Strategy: deduce everything provable, guess at random when stuck.");

    let mut session = Session::new(board, RandomGuess::new());
    match session.run()? {
        Outcome::Cleared { guesses } => {
            println!("\nSolved! Used {guesses} guesses.");
        }
        Outcome::Exploded {
            at,
            guesses,
            cleared_percent,
        } => {
            println!(
                "\nHit a mine at {at} on guess #{guesses}! \
                 {cleared_percent:.1}% of safe squares were revealed."
            );
        }
    }
    println!("\n{}", render::pretty(session.board(), true)?);
    Ok(())
}
