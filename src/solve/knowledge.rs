use std::collections::{hash_set, HashSet};

use crate::solve::Sentence;
use crate::{Cell, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The live set of sentences known to be true.
///
/// Sentences are stored by value, so structurally-equal sentences collapse
/// into one, including ones that only become equal after a propagation.
pub struct KnowledgeBase {
    sentences: HashSet<Sentence>,
}
impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, Sentence> {
        self.sentences.iter()
    }

    pub fn contains(&self, sentence: &Sentence) -> bool {
        self.sentences.contains(sentence)
    }

    /// Add a sentence; returns `false` if an equal one was already present.
    pub fn insert(&mut self, sentence: Sentence) -> bool {
        self.sentences.insert(sentence)
    }

    /// Mark `cell` as a mine in every sentence, then [`cleanup`](Self::cleanup).
    ///
    /// # Errors
    ///
    /// Propagates [`Sentence::mark_mine`]'s contradiction; the knowledge base
    /// is left untouched in that case.
    pub fn propagate_mine(&mut self, cell: Cell) -> Result<()> {
        self.apply(|sentence| sentence.mark_mine(cell))
    }

    /// Mark `cell` as safe in every sentence, then [`cleanup`](Self::cleanup).
    ///
    /// # Errors
    ///
    /// Propagates [`Sentence::mark_safe`]'s contradiction; the knowledge base
    /// is left untouched in that case.
    pub fn propagate_safe(&mut self, cell: Cell) -> Result<()> {
        self.apply(|sentence| sentence.mark_safe(cell))
    }

    /// Rebuild the set with `update` applied to a copy of each sentence, so
    /// no sentence is mutated while it is a member of the set.
    fn apply(&mut self, update: impl Fn(&mut Sentence) -> Result<()>) -> Result<()> {
        let updated = self
            .sentences
            .iter()
            .cloned()
            .map(|mut sentence| {
                update(&mut sentence)?;
                Ok(sentence)
            })
            .collect::<Result<HashSet<_>>>()?;
        self.sentences = updated;
        self.cleanup();
        Ok(())
    }

    /// Drop sentences over no cells.
    ///
    /// A sentence only gets here empty once all of its cells have been
    /// resolved, and since every sentence keeps `count <= cells.len()` an
    /// empty one always has a count of zero.
    pub fn cleanup(&mut self) {
        self.sentences.retain(|sentence| !sentence.is_empty());
    }
}
impl<'a> IntoIterator for &'a KnowledgeBase {
    type IntoIter = hash_set::Iter<'a, Sentence>;
    type Item = &'a Sentence;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences.iter()
    }
}
