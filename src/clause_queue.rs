//! ## Clause Queue
//! This module contains the implementation of the clause queue used as the set of support in the
//! OTTER like prover. The key exported data structures are [ClauseQueue] and the
//! [LightestClauseHeuristic] trait that decides which clause is the lightest one.

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use rustc_hash::FxHashMap;

use crate::clause::{Clause, ClauseId};

/// Assigns the weight that decides which clause of the set of support is picked next, lighter
/// clauses are picked first.
pub trait LightestClauseHeuristic: Debug {
    fn weight(&self, clause: &Clause) -> usize;
}

/// Clauses with fewer literals are lighter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestLiterals;

impl LightestClauseHeuristic for FewestLiterals {
    fn weight(&self, clause: &Clause) -> usize {
        clause.len()
    }
}

/// Clauses with fewer symbols are lighter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolCount;

impl LightestClauseHeuristic for SymbolCount {
    fn weight(&self, clause: &Clause) -> usize {
        clause.weight()
    }
}

// Ties on the heuristic weight are broken on the canonical key so the order does not depend on
// insertion, the clause id only separates keys that are equal, which the queue never stores twice.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct WeightedClause {
    weight: usize,
    key_len: usize,
    key: String,
    id: ClauseId,
}

impl WeightedClause {
    fn of(heuristic: &dyn LightestClauseHeuristic, clause: &Clause) -> Self {
        Self {
            weight: heuristic.weight(clause),
            key_len: clause.identity().len(),
            key: clause.identity().to_string(),
            id: clause.get_id(),
        }
    }
}

/// A priority queue for clauses that also supports removal, which backward subsumption needs.
/// Clauses equal up to variable renaming are only stored once.
#[derive(Debug)]
pub struct ClauseQueue {
    heuristic: Arc<dyn LightestClauseHeuristic + Send + Sync>,
    queue: BTreeMap<WeightedClause, Clause>,
    index: FxHashMap<String, WeightedClause>,
}

impl ClauseQueue {
    /// Create an empty clause queue ordered by `heuristic`.
    pub fn new(heuristic: Arc<dyn LightestClauseHeuristic + Send + Sync>) -> Self {
        Self {
            heuristic,
            queue: BTreeMap::new(),
            index: FxHashMap::default(),
        }
    }

    /// Push a clause into the clause queue, returns `false` if an equal clause is already queued.
    pub fn push(&mut self, clause: Clause) -> bool {
        if self.index.contains_key(clause.identity()) {
            return false;
        }
        let weighted = WeightedClause::of(self.heuristic.as_ref(), &clause);
        self.index
            .insert(clause.identity().to_string(), weighted.clone());
        self.queue.insert(weighted, clause);
        true
    }

    /// Obtain the currently lightest clause from the queue.
    pub fn pop(&mut self) -> Option<Clause> {
        let (weighted, clause) = self.queue.pop_first()?;
        self.index.remove(&weighted.key);
        Some(clause)
    }

    /// Remove the queued clause equal to `clause`.
    pub fn remove(&mut self, clause: &Clause) -> bool {
        match self.index.remove(clause.identity()) {
            Some(weighted) => self.queue.remove(&weighted).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, clause: &Clause) -> bool {
        self.index.contains_key(clause.identity())
    }

    /// The queued clauses, lightest first.
    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.queue.values()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
