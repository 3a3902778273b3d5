use std::collections::HashSet;

use either::Either;
use itertools::Itertools;
use rand::seq::IteratorRandom;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::internal_util::{adjacent, all_cells};
use crate::solve::{Dimensions, KnowledgeBase, Sentence};
use crate::{Cell, Error, Result};

/// What the engine knows for certain. Each set only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertaintySets {
    moves_made: HashSet<Cell>,
    safes: HashSet<Cell>,
    mines: HashSet<Cell>,
}
impl CertaintySets {
    /// Cells that have been played and reported back
    pub fn moves_made(&self) -> &HashSet<Cell> {
        &self.moves_made
    }

    pub fn safes(&self) -> &HashSet<Cell> {
        &self.safes
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        &self.mines
    }

    /// Is the cell played, known safe or known mined?
    pub fn is_resolved(&self, cell: &Cell) -> bool {
        self.moves_made.contains(cell) || self.safes.contains(cell) || self.mines.contains(cell)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One game session's worth of reasoning: the certain cells, the live
/// knowledge base, and the board size they refer to.
///
/// Not synchronised; share across threads behind a lock if needed.
pub struct InferenceEngine {
    dimensions: Dimensions,
    certainty: CertaintySets,
    knowledge: KnowledgeBase,
}
impl InferenceEngine {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            certainty: CertaintySets::default(),
            knowledge: KnowledgeBase::new(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn certainty(&self) -> &CertaintySets {
        &self.certainty
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        self.certainty.moves_made()
    }

    pub fn safes(&self) -> &HashSet<Cell> {
        self.certainty.safes()
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        self.certainty.mines()
    }

    /// Record that `cell` is safe and remove it from every sentence.
    ///
    /// # Errors
    ///
    /// [`Error::Contradiction`] if the cell is already known to be a mine, or
    /// if some sentence needs it to be one.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<()> {
        if self.certainty.mines.contains(&cell) {
            return Err(contradiction("cell is known to be both safe and a mine"));
        }
        self.knowledge.propagate_safe(cell).map_err(report)?;
        self.certainty.safes.insert(cell);
        Ok(())
    }

    /// Record that `cell` is a mine and remove it from every sentence.
    ///
    /// # Errors
    ///
    /// [`Error::Contradiction`] if the cell is already known to be safe, or
    /// if some sentence needs it to be.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<()> {
        if self.certainty.safes.contains(&cell) {
            return Err(contradiction("cell is known to be both safe and a mine"));
        }
        self.knowledge.propagate_mine(cell).map_err(report)?;
        self.certainty.mines.insert(cell);
        Ok(())
    }

    /// Fold in an observation: `cell` was played, turned out safe, and has
    /// `count` mines among its neighbours. Runs inference to a fixpoint
    /// afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::OffBoard`] if `cell` is not on the board.
    /// - [`Error::Contradiction`] if the observation cannot hold together
    ///   with what is already known. The engine must not be used afterwards.
    pub fn add_knowledge(&mut self, cell: Cell, count: usize) -> Result<()> {
        if !self.dimensions.contains(cell) {
            return Err(Error::OffBoard {
                cell,
                dimensions: self.dimensions,
            });
        }
        debug!(%cell, count, "observation");
        self.mark_safe(cell)?;
        self.certainty.moves_made.insert(cell);

        let (already_mined, unresolved): (Vec<_>, Vec<_>) = adjacent(cell, self.dimensions)
            .filter(|neighbour| {
                self.certainty.mines.contains(neighbour) || !self.certainty.is_resolved(neighbour)
            })
            .partition(|neighbour| self.certainty.mines.contains(neighbour));
        // The count only says anything about neighbours that are still open.
        let count = count
            .checked_sub(already_mined.len())
            .ok_or_else(|| contradiction("observation counts fewer mines than are known nearby"))?;
        let sentence = Sentence::new(unresolved, count).map_err(report)?;
        if !sentence.is_empty() {
            trace!(%sentence, "observed");
            self.knowledge.insert(sentence);
        }

        self.infer()?;
        Ok(())
    }

    /// All sentences obtainable by subtracting one live sentence from
    /// another that contains it, excluding those already known.
    ///
    /// Supersets claiming no mines are skipped; resolving them already yields
    /// everything they could contribute.
    ///
    /// # Errors
    ///
    /// [`Error::Contradiction`] if a subtraction is impossible, e.g. two
    /// sentences over the same cells with different counts.
    pub fn derive(&self) -> Result<HashSet<Sentence>> {
        let mut derived = HashSet::new();
        for (subset, superset) in self
            .knowledge
            .iter()
            .cartesian_product(self.knowledge.iter())
        {
            if subset == superset || superset.count() == 0 || !subset.is_subset_of(superset) {
                continue;
            }
            let difference = superset.subtract(subset).map_err(report)?;
            if !self.knowledge.contains(&difference) && derived.insert(difference.clone()) {
                trace!(%subset, %superset, %difference, "derived");
            }
        }
        Ok(derived)
    }

    /// Run derivation and resolution until neither produces anything new.
    /// Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// [`Error::Contradiction`] if the knowledge base turns out to be
    /// inconsistent.
    pub fn infer(&mut self) -> Result<bool> {
        let mut changed = false;
        for round in 1.. {
            // Scan a snapshot first; apply once the scan is over.
            let derived = self.derive()?;
            let num_derived = derived.len();
            for sentence in derived {
                self.knowledge.insert(sentence);
            }

            let mut safes = HashSet::new();
            let mut mines = HashSet::new();
            for sentence in &self.knowledge {
                safes.extend(sentence.known_safes());
                mines.extend(sentence.known_mines());
            }
            debug!(
                round,
                derived = num_derived,
                safes = safes.len(),
                mines = mines.len(),
                sentences = self.knowledge.len(),
                "inference round"
            );
            if num_derived == 0 && safes.is_empty() && mines.is_empty() {
                break;
            }
            changed = true;

            for cell in safes {
                self.mark_safe(cell)?;
            }
            for cell in mines {
                self.mark_mine(cell)?;
            }
        }
        Ok(changed)
    }

    /// A cell known to be safe that has not been played yet; the one with
    /// the lowest `(row, col)` if there are several.
    pub fn safe_move(&self) -> Option<Cell> {
        self.certainty
            .safes
            .difference(&self.certainty.moves_made)
            .min()
            .copied()
    }

    /// A uniformly random cell that has not been played and is not known to
    /// be a mine.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        all_cells(self.dimensions)
            .filter(|cell| {
                !self.certainty.moves_made.contains(cell) && !self.certainty.mines.contains(cell)
            })
            .choose(rng)
    }

    /// [`safe_move`](Self::safe_move) as `Left` if there is one, otherwise a
    /// guess from [`random_move`](Self::random_move) as `Right`.
    pub fn next_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Either<Cell, Cell>> {
        self.safe_move()
            .map(Either::Left)
            .or_else(|| self.random_move(rng).map(Either::Right))
    }
}

fn contradiction(reason: &'static str) -> Error {
    report(Error::Contradiction(reason))
}

fn report(error: Error) -> Error {
    warn!(%error, "knowledge base is inconsistent");
    error
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn cells(coords: &[(usize, usize)]) -> HashSet<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    fn sentence(coords: &[(usize, usize)], count: usize) -> Sentence {
        Sentence::new(coords.iter().copied().map(Cell::from), count).unwrap()
    }

    fn engine(height: usize, width: usize) -> InferenceEngine {
        InferenceEngine::new(Dimensions::new(height, width))
    }

    #[test]
    fn zero_observation_clears_all_neighbours() {
        let mut engine = engine(8, 8);
        engine.add_knowledge(Cell::new(1, 1), 0).unwrap();
        assert_eq!(
            engine.safes(),
            &cells(&[
                (0, 0),
                (0, 1),
                (0, 2),
                (1, 0),
                (1, 1),
                (1, 2),
                (2, 0),
                (2, 1),
                (2, 2),
            ])
        );
        assert_eq!(engine.moves_made(), &cells(&[(1, 1)]));
        assert!(engine.mines().is_empty());
        assert!(engine.knowledge().is_empty());
        assert_eq!(engine.safe_move(), Some(Cell::new(0, 0)));
    }

    #[test]
    fn known_mines_are_discounted_from_observations() {
        let mut engine = engine(8, 8);
        engine.mark_mine(Cell::new(1, 0)).unwrap();
        engine.add_knowledge(Cell::new(0, 0), 1).unwrap();
        assert_eq!(engine.safes(), &cells(&[(0, 0), (0, 1), (1, 1)]));
        assert_eq!(engine.mines(), &cells(&[(1, 0)]));
        assert!(engine.knowledge().is_empty());
    }

    #[test]
    fn subset_difference_derives_a_mine() {
        let mut engine = engine(8, 8);
        engine.knowledge.insert(sentence(&[(0, 0), (0, 1)], 1));
        engine.knowledge.insert(sentence(&[(0, 0), (0, 1), (0, 2)], 2));
        assert_eq!(
            engine.derive().unwrap(),
            [sentence(&[(0, 2)], 1)].into_iter().collect::<HashSet<_>>()
        );

        assert!(engine.infer().unwrap());
        assert_eq!(engine.mines(), &cells(&[(0, 2)]));
        // The superset collapses onto the subset once (0, 2) is removed.
        assert_eq!(engine.knowledge().len(), 1);
        assert!(engine.knowledge().contains(&sentence(&[(0, 0), (0, 1)], 1)));
    }

    #[test]
    fn zero_count_superset_is_not_subtracted_from() {
        let mut engine = engine(8, 8);
        engine.knowledge.insert(sentence(&[(0, 0)], 0));
        engine.knowledge.insert(sentence(&[(0, 0), (0, 1)], 0));
        assert!(engine.derive().unwrap().is_empty());
    }

    #[test]
    fn same_cells_with_different_counts_is_a_contradiction() {
        let mut engine = engine(8, 8);
        engine.knowledge.insert(sentence(&[(0, 0), (0, 1)], 1));
        engine.knowledge.insert(sentence(&[(0, 0), (0, 1)], 2));
        assert!(matches!(engine.derive(), Err(Error::Contradiction(_))));
        assert!(matches!(engine.infer(), Err(Error::Contradiction(_))));
    }

    #[test]
    fn inconsistent_observations_are_contradictions() {
        let mut engine = engine(1, 3);
        engine.add_knowledge(Cell::new(0, 0), 1).unwrap();
        assert_eq!(engine.mines(), &cells(&[(0, 1)]));
        assert_eq!(
            engine.add_knowledge(Cell::new(0, 2), 0),
            Err(Error::Contradiction(
                "observation counts fewer mines than are known nearby"
            ))
        );
    }

    #[test]
    fn observation_claiming_too_many_mines_is_a_contradiction() {
        let mut engine = engine(1, 2);
        assert!(matches!(
            engine.add_knowledge(Cell::new(0, 0), 2),
            Err(Error::Contradiction(_))
        ));
    }

    #[test]
    fn conflicting_marks_are_contradictions() {
        let mut engine = engine(4, 4);
        engine.mark_mine(Cell::new(2, 2)).unwrap();
        engine.mark_mine(Cell::new(2, 2)).unwrap();
        assert!(matches!(
            engine.mark_safe(Cell::new(2, 2)),
            Err(Error::Contradiction(_))
        ));
        assert!(!engine.safes().contains(&Cell::new(2, 2)));
    }

    #[test]
    fn off_board_observation_is_rejected() {
        let mut engine = engine(8, 8);
        assert_eq!(
            engine.add_knowledge(Cell::new(8, 0), 0),
            Err(Error::OffBoard {
                cell: Cell::new(8, 0),
                dimensions: Dimensions::new(8, 8),
            })
        );
        assert!(engine.moves_made().is_empty());
    }

    #[test]
    fn inference_is_idempotent_at_a_fixpoint() {
        // . 1 ? ?
        // ? ? ? ?
        let mut engine = engine(2, 4);
        engine.add_knowledge(Cell::new(0, 0), 1).unwrap();
        engine.add_knowledge(Cell::new(0, 1), 1).unwrap();
        let before = engine.clone();
        assert!(!engine.infer().unwrap());
        assert_eq!(engine, before);
    }

    #[test]
    fn chained_observations_resolve_the_row() {
        // Bottom row revealed one cell at a time, mine at (0, 1):
        // ? * ?
        // 1 1 1
        let mut engine = engine(2, 3);
        engine.add_knowledge(Cell::new(1, 0), 1).unwrap();
        engine.add_knowledge(Cell::new(1, 1), 1).unwrap();
        // {(0,0),(0,1),(0,2),(1,2)} = 1 minus {(0,0),(0,1)} = 1
        assert!(engine.safes().is_superset(&cells(&[(0, 2), (1, 2)])));
        assert!(engine.mines().is_empty());

        engine.add_knowledge(Cell::new(1, 2), 1).unwrap();
        assert_eq!(engine.mines(), &cells(&[(0, 1)]));
        assert_eq!(
            engine.safes(),
            &cells(&[(0, 0), (0, 2), (1, 0), (1, 1), (1, 2)])
        );
        assert!(engine.knowledge().is_empty());
    }

    #[test]
    fn safe_move_skips_played_cells() {
        let mut engine = engine(3, 3);
        engine.add_knowledge(Cell::new(0, 0), 0).unwrap();
        engine.add_knowledge(Cell::new(0, 1), 0).unwrap();
        let next = engine.safe_move().unwrap();
        assert!(!engine.moves_made().contains(&next));
        assert_eq!(next, Cell::new(0, 2));
    }

    #[test]
    fn random_move_avoids_mines_and_played_cells() {
        let mut engine = engine(3, 3);
        engine.add_knowledge(Cell::new(0, 0), 1).unwrap();
        engine.mark_mine(Cell::new(2, 2)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let cell = engine.random_move(&mut rng).unwrap();
            assert!(!engine.moves_made().contains(&cell));
            assert!(!engine.mines().contains(&cell));
        }
    }

    #[test]
    fn moves_run_out_on_a_resolved_board() {
        let mut engine = engine(1, 2);
        engine.add_knowledge(Cell::new(0, 0), 1).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(engine.safe_move(), None);
        assert_eq!(engine.random_move(&mut rng), None);
        assert_eq!(engine.next_move(&mut rng), None);
    }

    #[test]
    fn next_move_prefers_certain_cells() {
        let mut engine = engine(3, 3);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(engine.next_move(&mut rng), Some(Either::Right(_))));
        engine.add_knowledge(Cell::new(1, 1), 0).unwrap();
        assert_eq!(
            engine.next_move(&mut rng),
            Some(Either::Left(Cell::new(0, 0)))
        );
    }
}
