//! The deduction core: derives logically certain safe squares and mines
//! from revealed clues by combining overlapping neighborhoods into
//! tighter mine-count bounds.
//!
//! Every revealed clue seeds a set of hidden coordinates with a known
//! mine count. Pairs of overlapping sets then produce intersections and
//! differences with derived bounds, repeated to a fixed point. Any set
//! whose bounds collapse to a single value is actionable: zero mines
//! means reveal every member, bounds equal to the set size means flag
//! every member.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;

use itertools::iproduct;

use crate::board::{Board, CellState, Point};
use crate::error::Error;

/// Canonical identity of a clue set: its member coordinates, ordered.
/// Structural equality, no reliance on where the set came from.
pub type Members = BTreeSet<Point>;

/// Inclusive range of how many members of a set are mines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

impl Bounds {
    fn exact(n: usize) -> Self {
        Bounds { min: n, max: n }
    }

    fn is_settled(self) -> bool {
        self.min == self.max
    }
}

/// What one full deduction run changed on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deductions {
    pub revealed: usize,
    pub flagged: usize,
}

/// The working table of clue sets: member set to current bounds, plus a
/// coordinate to containing-sets index so overlap partners are found
/// without scanning the whole table. Rebuilt from board state each
/// deduction sweep; refined in place to a fixed point.
#[derive(Debug, Default)]
pub struct ClueSets {
    bounds: HashMap<Rc<Members>, Bounds>,
    index: HashMap<Point, HashSet<Rc<Members>>>,
}

impl ClueSets {
    /// Step A: one clue set per revealed non-mine cell, over its hidden
    /// unflagged neighbors, with `min = max = clue - flagged_neighbors`.
    pub fn seed(board: &Board) -> Result<Self, Error> {
        let (rows, cols) = board.dimensions();
        let mut sets = ClueSets::default();

        for (row, col) in iproduct!(0..rows, 0..cols) {
            let p = Point::new(row, col);
            let clue = match board.cell_state(p)? {
                CellState::Revealed { mine: false, clue } => clue as usize,
                _ => continue,
            };

            let mut members = Members::new();
            let mut flagged = 0;
            for n in board.neighbors(p) {
                match board.cell_state(n)? {
                    CellState::Hidden => {
                        members.insert(n);
                    }
                    CellState::Flagged => flagged += 1,
                    CellState::Revealed { .. } => {}
                }
            }

            if clue < flagged {
                return Err(Error::Inconsistency(format!(
                    "cell {p} has clue {clue} but {flagged} flagged neighbors"
                )));
            }
            sets.record_seed(p, Rc::new(members), Bounds::exact(clue - flagged))?;
        }
        Ok(sets)
    }

    /// Step B: pairwise refinement to a fixed point.
    ///
    /// Runs full passes until one changes nothing. A pass pops an
    /// active set `S`, visits every known set `T` sharing a member,
    /// and derives bounds for the intersection `I = S ∩ T` and the
    /// difference `S − I`; the `T − I` direction arises when `T` is
    /// popped. Bounds only ever tighten; any set that tightens (or is
    /// new) becomes active again within the pass. A drained pass can
    /// still leave work pending: a set introduced after some old
    /// partner was popped never had that partner's difference taken
    /// against it. So every pass after a changing one re-examines the
    /// whole table, and the pass that changes nothing certifies the
    /// fixed point. Each changing pass strictly tightens a finite
    /// lattice, so the loop terminates.
    pub fn refine(&mut self) -> Result<(), Error> {
        loop {
            let mut queue: VecDeque<Rc<Members>> = self.bounds.keys().cloned().collect();
            let mut queued: HashSet<Rc<Members>> = queue.iter().cloned().collect();
            let mut changed = false;

            while let Some(s) = queue.pop_front() {
                queued.remove(&s);
                for t in self.overlap_partners(&s) {
                    // Re-read: earlier partners of this pop may have
                    // tightened `s` itself.
                    let sb = self.bounds[&s];
                    let tb = self.bounds[&t];

                    // Most mine-free squares each set can hold; the
                    // overlap cannot hold more than either allows.
                    let bound_safe = (s.len() - sb.min).min(t.len() - tb.min);

                    let i: Members = s.intersection(&t).copied().collect();
                    let i_bounds = Bounds {
                        min: i.len().saturating_sub(bound_safe),
                        max: i.len().min(sb.max).min(tb.max),
                    };
                    let i = Rc::new(i);
                    changed |= self.tighten(&i, i_bounds, &mut queue, &mut queued)?;

                    // Difference uses the intersection's recorded
                    // (post-tighten) bounds, the tightest known.
                    let ib = self.bounds[&i];
                    let d: Rc<Members> = Rc::new(s.difference(&i).copied().collect());
                    let d_bounds = Bounds {
                        min: sb.min.saturating_sub(ib.max),
                        max: d.len().min(sb.max.saturating_sub(ib.min)),
                    };
                    changed |= self.tighten(&d, d_bounds, &mut queue, &mut queued)?;
                }
            }

            if !changed {
                return Ok(());
            }
        }
    }

    /// Sets whose bounds have collapsed to a single value.
    pub fn settled(&self) -> impl Iterator<Item = (&Members, Bounds)> {
        self.iter().filter(|(_, b)| b.is_settled())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Members, Bounds)> {
        self.bounds.iter().map(|(k, &v)| (k.as_ref(), v))
    }

    pub fn get(&self, members: &Members) -> Option<Bounds> {
        self.bounds.get(members).copied()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Every known set sharing at least one member with `s`.
    fn overlap_partners(&self, s: &Rc<Members>) -> Vec<Rc<Members>> {
        let mut partners: HashSet<&Rc<Members>> = HashSet::new();
        for point in s.iter() {
            if let Some(containing) = self.index.get(point) {
                partners.extend(containing.iter());
            }
        }
        partners.remove(s);
        partners.into_iter().cloned().collect()
    }

    /// Two seeds over the identical member set must agree exactly; a
    /// disagreement means the puzzle is corrupt, not something to merge.
    fn record_seed(
        &mut self,
        origin: Point,
        members: Rc<Members>,
        bounds: Bounds,
    ) -> Result<(), Error> {
        match self.bounds.get(&members) {
            Some(&existing) if existing == bounds => Ok(()),
            Some(&existing) => Err(Error::Inconsistency(format!(
                "seed at {origin} declares {}..{} mines over a set already bounded \
                 {}..{}",
                bounds.min, bounds.max, existing.min, existing.max
            ))),
            None => {
                if bounds.max > members.len() {
                    return Err(Error::Inconsistency(format!(
                        "seed at {origin} declares {} mines over {} hidden neighbors",
                        bounds.max,
                        members.len()
                    )));
                }
                self.insert_new(members, bounds);
                Ok(())
            }
        }
    }

    /// Tighten-or-introduce. Never loosens a recorded bound; crossed or
    /// oversized bounds abort the solve. Reports whether the table
    /// changed so `refine` knows when a pass has reached quiescence.
    fn tighten(
        &mut self,
        members: &Rc<Members>,
        derived: Bounds,
        queue: &mut VecDeque<Rc<Members>>,
        queued: &mut HashSet<Rc<Members>>,
    ) -> Result<bool, Error> {
        let (merged, is_new) = match self.bounds.get(members) {
            Some(&existing) => {
                let merged = Bounds {
                    min: existing.min.max(derived.min),
                    max: existing.max.min(derived.max),
                };
                if merged == existing {
                    return Ok(false);
                }
                (merged, false)
            }
            None => (derived, true),
        };

        if merged.min > merged.max || merged.max > members.len() {
            return Err(Error::Inconsistency(format!(
                "bounds {}..{} are impossible for a set of {} squares",
                merged.min,
                merged.max,
                members.len()
            )));
        }

        if is_new {
            self.insert_new(Rc::clone(members), merged);
        } else {
            self.bounds.insert(Rc::clone(members), merged);
        }
        if queued.insert(Rc::clone(members)) {
            queue.push_back(Rc::clone(members));
        }
        Ok(true)
    }

    fn insert_new(&mut self, members: Rc<Members>, bounds: Bounds) {
        for &point in members.iter() {
            self.index
                .entry(point)
                .or_default()
                .insert(Rc::clone(&members));
        }
        self.bounds.insert(members, bounds);
    }
}

/// Runs seed + refine + apply sweeps until a full sweep changes nothing,
/// and reports the cumulative reveals and flags.
///
/// Returning `Deductions::default()` means the solver is stuck and the
/// caller has to fall back to a guess policy.
pub fn deduce(board: &mut Board) -> Result<Deductions, Error> {
    let mut total = Deductions::default();
    loop {
        let mut sets = ClueSets::seed(board)?;
        sets.refine()?;
        let step = apply(board, &sets)?;
        if step == Deductions::default() {
            return Ok(total);
        }
        total.revealed += step.revealed;
        total.flagged += step.flagged;
    }
}

/// Step C: act on every settled set. A square may appear in several
/// settled sets; once resolved by one it is skipped in the rest.
fn apply(board: &mut Board, sets: &ClueSets) -> Result<Deductions, Error> {
    let mut step = Deductions::default();
    for (members, bounds) in sets.settled() {
        if bounds.min == 0 {
            for &p in members {
                if board.cell_state(p)? == CellState::Hidden {
                    board.reveal(p)?;
                    step.revealed += 1;
                }
            }
        } else if bounds.min == members.len() {
            for &p in members {
                if board.cell_state(p)? == CellState::Hidden {
                    board.flag(p)?;
                    step.flagged += 1;
                }
            }
        }
    }
    Ok(step)
}
