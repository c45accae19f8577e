use std::{
    collections::BTreeSet,
    ops::{Index, IndexMut},
};

use typed_index_collections::TiVec;

use crate::{
    binding::Binding,
    formula::{Cnf, Literal, Variable},
    prelude::*,
};

use super::{
    index::{ClauseIdx, ClauseSet, OccurrenceIndex},
    trail::{Cause, Mutation, Trail},
    CancelFlag, Cancelled, InvalidInput, SolveError, SolverConfig, Unsatisfiable,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClauseStatus {
    /// Contains a true literal and no longer constrains the search.
    Satisfied,
    /// Every literal is false.
    Falsified,
    Unit,
    Unresolved,
}

/// A clause as seen by the search: the literals that are still unassigned.
#[derive(Clone, Debug, PartialEq, Eq)]
struct WorkingClause {
    literals: Vec<Literal>,
    satisfied: bool,
}

impl WorkingClause {
    fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        let mut distinct = Vec::new();
        for literal in literals {
            if !distinct.contains(&literal) {
                distinct.push(literal);
            }
        }

        WorkingClause {
            literals: distinct,
            satisfied: false,
        }
    }

    fn status(&self) -> ClauseStatus {
        if self.satisfied {
            ClauseStatus::Satisfied
        } else {
            match self.literals.len() {
                0 => ClauseStatus::Falsified,
                1 => ClauseStatus::Unit,
                _ => ClauseStatus::Unresolved,
            }
        }
    }
}

#[derive(Default)]
struct ClauseStateCache {
    falsified: ClauseSet,
    satisfied: ClauseSet,
    unit: ClauseSet,
    unresolved: ClauseSet,
}

impl Index<ClauseStatus> for ClauseStateCache {
    type Output = ClauseSet;

    fn index(&self, index: ClauseStatus) -> &Self::Output {
        match index {
            ClauseStatus::Falsified => &self.falsified,
            ClauseStatus::Satisfied => &self.satisfied,
            ClauseStatus::Unit => &self.unit,
            ClauseStatus::Unresolved => &self.unresolved,
        }
    }
}

impl IndexMut<ClauseStatus> for ClauseStateCache {
    fn index_mut(&mut self, index: ClauseStatus) -> &mut Self::Output {
        match index {
            ClauseStatus::Falsified => &mut self.falsified,
            ClauseStatus::Satisfied => &mut self.satisfied,
            ClauseStatus::Unit => &mut self.unit,
            ClauseStatus::Unresolved => &mut self.unresolved,
        }
    }
}

impl ClauseStateCache {
    fn handle_change(&mut self, old: ClauseStatus, new: ClauseStatus, idx: ClauseIdx) {
        if old != new {
            assert!(self[old].remove(&idx));
            assert!(self[new].insert(idx));
        }
    }
}

/// Raised by propagation when the current assignments cannot be extended.
/// Resolved by backtracking, never surfaced to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conflict;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Branch decisions, counting each flipped branch as well.
    pub decisions: usize,
    pub conflicts: usize,
    /// Literals assigned by unit propagation or pure-literal elimination.
    pub propagations: usize,
}

pub struct DpllSolver {
    config: SolverConfig,
    cancel: CancelFlag,
    /// Variables bound to `false` when left open by a satisfying assignment.
    universe: Vec<Variable>,
    clauses: TiVec<ClauseIdx, WorkingClause>,
    /// Literal -> unsatisfied clauses that still contain it
    index: OccurrenceIndex,
    clause_cache: ClauseStateCache,
    binding: Binding,
    trail: Trail,
    stats: SearchStats,
}

impl DpllSolver {
    /// Prepares a search over `formula` extended with one unit clause per variable
    /// bound in `starting`.
    pub fn new(
        formula: &Cnf,
        starting: &Binding,
        config: SolverConfig,
    ) -> Result<Self, SolveError> {
        if formula.is_closed() {
            for (variable, _) in starting.iter() {
                ensure!(
                    formula.contains_variable(variable),
                    InvalidInput { variable }
                );
            }
        }

        let mut clauses: TiVec<ClauseIdx, WorkingClause> = formula
            .clauses()
            .iter()
            .map(|clause| WorkingClause::new(clause.iter()))
            .collect();
        for literal in starting.literals() {
            clauses.push(WorkingClause::new(Some(literal)));
        }

        let entries: Vec<(ClauseIdx, &[Literal])> = clauses
            .iter()
            .enumerate()
            .map(|(index, clause)| (ClauseIdx::from(index), clause.literals.as_slice()))
            .collect();
        let index = if entries.len() >= config.parallel_index_threshold {
            OccurrenceIndex::build_parallel(&entries, config.index_workers)
        } else {
            OccurrenceIndex::build(entries.iter().copied())
        };

        let mut clause_cache = ClauseStateCache::default();
        for (clause_idx, clause) in clauses.iter().enumerate() {
            clause_cache[clause.status()].insert(ClauseIdx::from(clause_idx));
        }

        Ok(DpllSolver {
            config,
            cancel: CancelFlag::new(),
            universe: formula.variables().to_vec(),
            clauses,
            index,
            clause_cache,
            binding: Binding::new(),
            trail: Trail::new(),
            stats: SearchStats::default(),
        })
    }

    /// Replaces the flag polled before every branch decision.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// The working binding of the search.
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn index(&self) -> &OccurrenceIndex {
        &self.index
    }

    /// True once every clause contains a true literal.
    pub fn is_satisfied(&self) -> bool {
        self.clause_cache.satisfied.len() == self.clauses.len()
    }

    pub fn has_falsified_clause(&self) -> bool {
        !self.clause_cache.falsified.is_empty()
    }

    /// Sole literals of the current unit clauses in clause order, without duplicates.
    /// Fails when a literal and its negation are both forced.
    pub fn unit_literals(&self) -> Result<Vec<Literal>, Conflict> {
        let mut seen = BTreeSet::new();
        let mut units = Vec::new();

        for &clause_idx in &self.clause_cache.unit {
            let literal = self.clauses[clause_idx].literals[0];
            if seen.contains(&!literal) {
                return Err(Conflict);
            }
            if seen.insert(literal) {
                units.push(literal);
            }
        }

        Ok(units)
    }

    /// Literals occurring in the remaining clauses whose negation does not.
    pub fn pure_literals(&self) -> Vec<Literal> {
        self.index.pure_literals()
    }

    /// Makes every literal true as an inference.
    pub fn assign_literals(&mut self, literals: &[Literal]) {
        for &literal in literals {
            self.assign(literal, Cause::Inference);
        }
        self.stats.propagations += literals.len();
    }

    /// Runs unit propagation and pure-literal elimination until neither changes anything.
    /// Returns whether any literal was assigned.
    pub fn simplify(&mut self) -> Result<bool, Conflict> {
        let mut changed = false;

        loop {
            if self.has_falsified_clause() {
                return Err(Conflict);
            }

            let units = self.unit_literals()?;
            if !units.is_empty() {
                trace!("Propagating {} unit literals", units.len());
                self.assign_literals(&units);
                if self.has_falsified_clause() {
                    return Err(Conflict);
                }
            }

            let pure = if self.config.pure_literal_elimination {
                self.pure_literals()
            } else {
                Vec::new()
            };
            if !pure.is_empty() {
                trace!("Eliminating {} pure literals", pure.len());
                self.assign_literals(&pure);
            }

            if units.is_empty() && pure.is_empty() {
                return Ok(changed);
            }
            changed = true;
        }
    }

    /// Binds `literal` to true, drops the clauses it satisfies and removes its
    /// negation from the others.
    fn assign(&mut self, literal: Literal, cause: Cause) {
        let previous = self.binding.assign(literal);
        debug_assert!(previous.is_none(), "{} is already assigned", literal);
        self.trail.push(literal, cause);

        let satisfied: Vec<ClauseIdx> = self.index.clauses(literal).collect();
        for clause_idx in satisfied {
            let clause = &mut self.clauses[clause_idx];
            let old = clause.status();
            clause.satisfied = true;

            for &other in &clause.literals {
                self.index.remove(other, clause_idx);
            }
            self.clause_cache
                .handle_change(old, ClauseStatus::Satisfied, clause_idx);
            self.trail.record(Mutation::Satisfied(clause_idx));
        }

        let falsified = !literal;
        let shrunk: Vec<ClauseIdx> = self.index.clauses(falsified).collect();
        for clause_idx in shrunk {
            let clause = &mut self.clauses[clause_idx];
            let old = clause.status();

            let position = match clause.literals.iter().position(|&l| l == falsified) {
                Some(position) => position,
                None => unreachable!("index lists {} for a clause without it", falsified),
            };
            clause.literals.remove(position);

            let new = clause.status();
            self.index.remove(falsified, clause_idx);
            self.clause_cache.handle_change(old, new, clause_idx);
            self.trail.record(Mutation::Shrunk {
                clause: clause_idx,
                literal: falsified,
                position,
            });
        }
    }

    /// Undoes the most recent assignment. Returns `None` on an empty trail.
    fn pop_assignment(&mut self) -> Option<(Literal, Cause)> {
        let (entry, mutations) = self.trail.pop()?;

        for mutation in mutations {
            match mutation {
                Mutation::Shrunk {
                    clause: clause_idx,
                    literal,
                    position,
                } => {
                    let clause = &mut self.clauses[clause_idx];
                    let old = clause.status();
                    clause.literals.insert(position, literal);

                    let new = clause.status();
                    self.index.insert(literal, clause_idx);
                    self.clause_cache.handle_change(old, new, clause_idx);
                }
                Mutation::Satisfied(clause_idx) => {
                    let clause = &mut self.clauses[clause_idx];
                    clause.satisfied = false;

                    for &literal in &clause.literals {
                        self.index.insert(literal, clause_idx);
                    }
                    let new = clause.status();
                    self.clause_cache
                        .handle_change(ClauseStatus::Satisfied, new, clause_idx);
                }
            }
        }

        let variable = entry.literal.variable();
        let removed = self.binding.unset(variable);
        debug_assert!(removed.is_some());

        Some((entry.literal, entry.cause))
    }

    /// Makes `literal` true as a branch decision, unless the search was cancelled.
    fn decide(&mut self, literal: Literal, flipped: bool) -> Result<(), SolveError> {
        if self.cancel.is_cancelled() {
            debug!("Cancelled after {:?}", self.stats);
            return Cancelled {
                decisions: self.stats.decisions,
            }
            .fail();
        }

        self.stats.decisions += 1;
        trace!(
            "Decision {} at level {}{}",
            literal,
            self.trail.decision_level() + 1,
            if flipped { " (flipped)" } else { "" }
        );
        self.assign(literal, Cause::Decision { flipped });
        Ok(())
    }

    /// Unwinds to the newest decision whose opposite value is untried and flips it.
    /// Returns `false` once every decision has been exhausted.
    fn backtrack(&mut self) -> Result<bool, SolveError> {
        while let Some((literal, cause)) = self.pop_assignment() {
            if cause == (Cause::Decision { flipped: false }) {
                trace!("Backtracking over {}", literal);
                self.decide(!literal, true)?;
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Branch variable: the first variable of the occurrence index.
    fn branch_variable(&self) -> Option<Variable> {
        self.index.literals().next().map(|literal| literal.variable())
    }

    fn into_model(self) -> Binding {
        let mut binding = self.binding;
        if self.config.complete_model {
            for &variable in &self.universe {
                if !binding.binds(variable) {
                    binding.set(variable.into(), false);
                }
            }
        }
        binding
    }

    /// Searches for a binding that satisfies every clause.
    pub fn solve(mut self) -> Result<Binding, SolveError> {
        debug!(
            "Solving {} clauses over {} variables",
            self.clauses.len(),
            self.universe.len()
        );

        loop {
            match self.simplify() {
                Ok(_) if self.is_satisfied() => {
                    debug!("SAT after {:?}", self.stats);
                    return Ok(self.into_model());
                }
                Ok(_) => {
                    let variable = match self.branch_variable() {
                        Some(variable) => variable,
                        None => unreachable!("open clauses without literals are falsified"),
                    };
                    self.decide(variable.into(), false)?;
                }
                Err(Conflict) => {
                    self.stats.conflicts += 1;
                    if !self.backtrack()? {
                        debug!("UNSAT after {:?}", self.stats);
                        return Unsatisfiable.fail();
                    }
                }
            }
        }
    }
}
