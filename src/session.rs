//! Drives a board to completion: deduce as far as logic reaches, then
//! fall back to a guess policy, until the board is cleared or a guess
//! lands on a mine.

use rand::prelude::IndexedRandom;
use rand::rngs::ThreadRng;

use crate::board::{Board, Point};
use crate::error::Error;
use crate::solver;

/// Picks a square to reveal when deduction is stuck. A policy sees only
/// the board's read surface, so alternative heuristics can be swapped in
/// without touching the deduction core.
pub trait GuessPolicy {
    /// One currently unresolved coordinate, or `None` if there is none.
    fn choose(&mut self, board: &Board) -> Option<Point>;
}

/// The placeholder policy: a uniform random choice among unresolved
/// squares. No attempt to maximize survival odds.
pub struct RandomGuess {
    rng: ThreadRng,
}

impl RandomGuess {
    pub fn new() -> Self {
        RandomGuess { rng: rand::rng() }
    }
}

impl Default for RandomGuess {
    fn default() -> Self {
        Self::new()
    }
}

impl GuessPolicy for RandomGuess {
    fn choose(&mut self, board: &Board) -> Option<Point> {
        board.hidden_unflagged().choose(&mut self.rng).copied()
    }
}

/// How a solve session ended. Hitting a mine is an expected outcome of
/// an unlucky guess, reported with how much of the board was cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Cleared {
        guesses: usize,
    },
    Exploded {
        at: Point,
        guesses: usize,
        cleared_percent: f64,
    },
}

/// One solving run over an exclusively owned board.
pub struct Session<G> {
    board: Board,
    policy: G,
    guesses: usize,
}

impl<G: GuessPolicy> Session<G> {
    pub fn new(board: Board, policy: G) -> Self {
        Session {
            board,
            policy,
            guesses: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Alternates deduction sweeps and guesses until no unresolved
    /// squares remain or a guess explodes.
    pub fn run(&mut self) -> Result<Outcome, Error> {
        loop {
            match solver::deduce(&mut self.board) {
                Ok(_) => {}
                Err(Error::HitMine(at)) => return Ok(self.exploded(at)),
                Err(e) => return Err(e),
            }

            if self.board.hidden_unflagged().is_empty() {
                return Ok(Outcome::Cleared {
                    guesses: self.guesses,
                });
            }

            let at = self.policy.choose(&self.board).ok_or_else(|| {
                Error::Inconsistency(
                    "guess policy produced no coordinate while squares remain \
                     unresolved"
                        .into(),
                )
            })?;
            self.guesses += 1;
            match self.board.reveal(at) {
                Ok(_) => {}
                Err(Error::HitMine(_)) => return Ok(self.exploded(at)),
                Err(e) => return Err(e),
            }
        }
    }

    fn exploded(&self, at: Point) -> Outcome {
        Outcome::Exploded {
            at,
            guesses: self.guesses,
            cleared_percent: self.board.cleared_percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: usize, col: usize) -> Point {
        Point::new(row, col)
    }

    /// A policy for boards that must be solvable by deduction alone.
    struct NoGuess;

    impl GuessPolicy for NoGuess {
        fn choose(&mut self, _board: &Board) -> Option<Point> {
            None
        }
    }

    #[test]
    fn deduction_only_board_solves_with_zero_guesses() {
        let mut board: Board = ". . .\nX . X".parse().unwrap();
        for col in 0..3 {
            board.reveal(p(0, col)).unwrap();
        }

        let mut session = Session::new(board, NoGuess);
        assert_eq!(session.run().unwrap(), Outcome::Cleared { guesses: 0 });
        assert!(session.board().hidden_unflagged().is_empty());
    }

    #[test]
    fn one_by_one_board_terminates_immediately() {
        let board: Board = ".".parse().unwrap();
        let mut session = Session::new(board, RandomGuess::new());
        // The single square is a forced first guess with clue 0.
        assert_eq!(session.run().unwrap(), Outcome::Cleared { guesses: 1 });
    }

    /// A policy with a scripted sequence of picks.
    struct Scripted(Vec<Point>);

    impl GuessPolicy for Scripted {
        fn choose(&mut self, _board: &Board) -> Option<Point> {
            self.0.pop()
        }
    }

    #[test]
    fn unlucky_guess_reports_the_explosion() {
        let board: Board = "X .\n. .".parse().unwrap();
        let mut session = Session::new(board, Scripted(vec![p(0, 0)]));
        match session.run().unwrap() {
            Outcome::Exploded {
                at,
                guesses,
                cleared_percent,
            } => {
                assert_eq!(at, p(0, 0));
                assert_eq!(guesses, 1);
                assert_eq!(cleared_percent, 0.0);
            }
            other => panic!("expected an explosion, got {other:?}"),
        }
    }

    #[test]
    fn stuck_policy_with_unresolved_squares_is_an_error() {
        let board: Board = "X .\n. .".parse().unwrap();
        let mut session = Session::new(board, NoGuess);
        assert!(matches!(session.run(), Err(Error::Inconsistency(_))));
    }

    #[test]
    fn random_policy_clears_a_mine_free_board() {
        let board: Board = ". . .\n. . .".parse().unwrap();
        let mut session = Session::new(board, RandomGuess::new());
        // The first guess cannot explode and its 0 clue cascades.
        assert_eq!(session.run().unwrap(), Outcome::Cleared { guesses: 1 });
    }
}
