use crate::formula::Literal;

use super::index::ClauseIdx;

/// Why a literal was made true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    /// Branch decision; `flipped` once the opposite value is being explored.
    Decision { flipped: bool },
    /// Forced by unit propagation, pure-literal elimination or the starting binding.
    Inference,
}

/// A single change to the working clause set, undone in reverse order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The clause became true and left the formula.
    Satisfied(ClauseIdx),
    /// A false literal was cut out of the clause at `position`.
    Shrunk {
        clause: ClauseIdx,
        literal: Literal,
        position: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailEntry {
    pub literal: Literal,
    pub cause: Cause,
    journal_mark: usize,
}

/// Assignments in chronological order, each owning the mutations it caused.
#[derive(Debug, Default)]
pub struct Trail {
    entries: Vec<TrailEntry>,
    journal: Vec<Mutation>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, literal: Literal, cause: Cause) {
        self.entries.push(TrailEntry {
            literal,
            cause,
            journal_mark: self.journal.len(),
        });
    }

    /// Attributes a mutation to the most recent assignment.
    pub fn record(&mut self, mutation: Mutation) {
        debug_assert!(!self.entries.is_empty());
        self.journal.push(mutation);
    }

    /// Removes the most recent assignment.
    /// Its mutations are returned newest first, ready to be undone.
    pub fn pop(&mut self) -> Option<(TrailEntry, Vec<Mutation>)> {
        let entry = self.entries.pop()?;
        let mut mutations = self.journal.split_off(entry.journal_mark);
        mutations.reverse();
        Some((entry, mutations))
    }

    /// Number of branch decisions currently on the trail.
    pub fn decision_level(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.cause, Cause::Decision { .. }))
            .count()
    }
}
