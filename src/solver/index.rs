use std::{
    collections::{BTreeMap, BTreeSet},
    panic, thread,
};

use crate::formula::{Cnf, Literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseIdx(usize);

impl From<usize> for ClauseIdx {
    fn from(index: usize) -> Self {
        ClauseIdx(index)
    }
}

impl From<ClauseIdx> for usize {
    fn from(index: ClauseIdx) -> Self {
        index.0
    }
}

pub type ClauseSet = BTreeSet<ClauseIdx>;

/// Maps each literal to the clauses that still contain it.
///
/// Invariant: every stored clause set is non-empty, so two indices describing
/// the same occurrences compare equal no matter how they were produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceIndex {
    occurrences: BTreeMap<Literal, ClauseSet>,
}

impl OccurrenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes the clauses of a formula by their position in the formula.
    pub fn from_cnf(formula: &Cnf, workers: usize) -> Self {
        let entries: Vec<(ClauseIdx, &[Literal])> = formula
            .clauses()
            .iter()
            .enumerate()
            .map(|(index, clause)| (index.into(), clause.literals()))
            .collect();

        Self::build_parallel(&entries, workers)
    }

    /// Single-pass construction.
    pub fn build<'a>(clauses: impl IntoIterator<Item = (ClauseIdx, &'a [Literal])>) -> Self {
        let mut index = Self::new();
        for (clause_idx, literals) in clauses {
            index.add_clause(clause_idx, literals);
        }
        index
    }

    /// Splits the clauses into one contiguous chunk per worker, indexes each chunk on
    /// its own thread and merges the partial indices in chunk order.
    pub fn build_parallel(clauses: &[(ClauseIdx, &[Literal])], workers: usize) -> Self {
        if workers <= 1 || clauses.len() < 2 {
            return Self::build(clauses.iter().copied());
        }

        // at least one clause per worker
        let workers = workers.min(clauses.len());
        let chunk_size = clauses.len().div_ceil(workers);
        let partials: Vec<OccurrenceIndex> = thread::scope(|scope| {
            let handles: Vec<_> = clauses
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || Self::build(chunk.iter().copied())))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect()
        });

        trace!(
            "Merging {} partial occurrence indices over {} clauses",
            partials.len(),
            clauses.len()
        );

        let mut index = Self::new();
        for partial in partials {
            index.merge(partial);
        }
        index
    }

    fn add_clause(&mut self, clause_idx: ClauseIdx, literals: &[Literal]) {
        for &literal in literals {
            self.insert(literal, clause_idx);
        }
    }

    /// Union with another index; clause sets of shared literals are joined.
    pub fn merge(&mut self, other: OccurrenceIndex) {
        for (literal, clauses) in other.occurrences {
            self.occurrences
                .entry(literal)
                .or_default()
                .extend(clauses);
        }
    }

    /// Records that `clause` contains `literal`. Returns `false` if it was already recorded.
    pub fn insert(&mut self, literal: Literal, clause: ClauseIdx) -> bool {
        self.occurrences.entry(literal).or_default().insert(clause)
    }

    /// Forgets that `clause` contains `literal`. Returns `false` if it was not recorded.
    pub fn remove(&mut self, literal: Literal, clause: ClauseIdx) -> bool {
        match self.occurrences.get_mut(&literal) {
            Some(clauses) => {
                let removed = clauses.remove(&clause);
                if clauses.is_empty() {
                    self.occurrences.remove(&literal);
                }
                removed
            }
            None => false,
        }
    }

    pub fn clauses(&self, literal: Literal) -> impl Iterator<Item = ClauseIdx> + '_ {
        self.occurrences
            .get(&literal)
            .into_iter()
            .flat_map(|clauses| clauses.iter().copied())
    }

    pub fn occurrence_count(&self, literal: Literal) -> usize {
        self.occurrences.get(&literal).map_or(0, BTreeSet::len)
    }

    pub fn occurs(&self, literal: Literal) -> bool {
        self.occurrences.contains_key(&literal)
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Literals with at least one occurrence, ordered by variable then polarity.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.occurrences.keys().copied()
    }

    /// Literals that occur while their negation does not.
    pub fn pure_literals(&self) -> Vec<Literal> {
        self.literals()
            .filter(|&literal| !self.occurs(!literal))
            .collect()
    }
}
