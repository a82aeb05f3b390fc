//! ## Clauses
//! This module provides an implementation of first order literals and CNF clauses as well as sets
//! of clauses. The key exported data structures are:
//! - [Literal] for representing possibly negated atoms
//! - [Clause] for representing disjunctions of literals
//! - [ClauseSet] for representing sets of clauses that are distinct up to variable renaming
//!
//! Clauses never change once built, every operation returns new clauses. Equality and hashing go
//! through a canonical key that ignores variable names but keeps co-reference, see [identity].
//!
//! [identity]: crate::identity

use std::{
    cell::OnceCell,
    hash::Hash,
    sync::atomic::{AtomicUsize, Ordering},
};

use log::debug;
use rustc_hash::FxHashSet;

use crate::{
    identity::canonical_key,
    proofs::{ProofLog, ProofRule, StepId},
    standardize::IndexicalAllocator,
    subst::{Substitutable, Substitution},
    term::{Atom, Term, Variable, VariableSet},
    trivial::is_tautology,
};

/// Whether a literal is an atom or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    /// Flip the polarity to the other one.
    pub fn negate(&self) -> Polarity {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// A possibly negated atom. Literals introduced by a model elimination reduction carry the
/// `reduced` mark, which takes part in equality so that they never coincide with plain literals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    atom: Atom,
    polarity: Polarity,
    reduced: bool,
}

impl Literal {
    pub fn new(atom: Atom, polarity: Polarity) -> Self {
        Self {
            atom,
            polarity,
            reduced: false,
        }
    }

    pub fn positive(atom: Atom) -> Self {
        Self::new(atom, Polarity::Positive)
    }

    pub fn negative(atom: Atom) -> Self {
        Self::new(atom, Polarity::Negative)
    }

    /// The same literal marked as reduced.
    pub fn into_reduced(self) -> Self {
        Self {
            reduced: true,
            ..self
        }
    }

    pub fn atom(&self) -> &Atom {
        &self.atom
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn is_positive(&self) -> bool {
        self.polarity == Polarity::Positive
    }

    pub fn is_negative(&self) -> bool {
        self.polarity == Polarity::Negative
    }

    pub fn is_reduced(&self) -> bool {
        self.reduced
    }

    /// Flip the polarity of the literal, the result is never reduced.
    pub fn negate(&self) -> Self {
        Self::new(self.atom.clone(), self.polarity.negate())
    }

    /// Same atom with a positive polarity.
    pub fn to_positive(&self) -> Self {
        Self::positive(self.atom.clone())
    }

    /// Check whether `other` is the negation of `self` with a syntactically identical atom.
    pub fn is_negation_of(&self, other: &Self) -> bool {
        self.polarity == other.polarity.negate() && self.atom == other.atom
    }

    /// The key used to index unit facts: polarity sign followed by the predicate name.
    pub fn fact_key(&self) -> String {
        let sign = match self.polarity {
            Polarity::Positive => '+',
            Polarity::Negative => '-',
        };
        format!("{sign}{}", self.atom.symbolic_name())
    }

    pub fn weight(&self) -> usize {
        1 + self.atom.args().iter().map(Term::weight).sum::<usize>()
    }

    pub fn collect_vars_into(&self, acc: &mut VariableSet) {
        self.atom.collect_vars_into(acc);
    }

    pub fn variables(&self) -> Vec<Variable> {
        self.atom.variables()
    }
}

impl Substitutable for Literal {
    fn subst_with(self, subst: &Substitution) -> Self {
        Self {
            atom: self.atom.subst_with(subst),
            polarity: self.polarity,
            reduced: self.reduced,
        }
    }
}

// We want to maintain unique clause identifiers as a deterministic tie breaker in the clause
// queue, this counter provides us with these identifiers.
static CLAUSE_ID_COUNT: AtomicUsize = AtomicUsize::new(0);

/// A unique identifier for clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseId(usize);

fn next_clause_id() -> ClauseId {
    ClauseId(CLAUSE_ID_COUNT.fetch_add(1, Ordering::SeqCst))
}

/// A disjunction of distinct [Literal]s.
#[derive(Debug, Clone)]
pub struct Clause {
    id: ClauseId,
    literals: Vec<Literal>,
    positive: Vec<usize>,
    negative: Vec<usize>,
    origin: Option<StepId>,
    identity: OnceCell<String>,
    factors: OnceCell<Vec<Clause>>,
}

impl Clause {
    /// Create a new clause containing the literals from `vec`, duplicates are collapsed while the
    /// order of first occurrence is kept.
    pub fn new(vec: Vec<Literal>) -> Self {
        let mut literals: Vec<Literal> = Vec::with_capacity(vec.len());
        for lit in vec {
            if !literals.contains(&lit) {
                literals.push(lit);
            }
        }
        let positive = literals
            .iter()
            .enumerate()
            .filter(|(_, lit)| lit.is_positive())
            .map(|(idx, _)| idx)
            .collect();
        let negative = literals
            .iter()
            .enumerate()
            .filter(|(_, lit)| lit.is_negative())
            .map(|(idx, _)| idx)
            .collect();
        Self {
            id: next_clause_id(),
            literals,
            positive,
            negative,
            origin: None,
            identity: OnceCell::new(),
            factors: OnceCell::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Attach the proof step that produced this clause.
    pub fn with_origin(mut self, origin: StepId) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn origin(&self) -> Option<StepId> {
        self.origin
    }

    pub(crate) fn origin_slice(&self) -> Vec<StepId> {
        self.origin.into_iter().collect()
    }

    /// Obtain the unique identifier of this clause.
    pub fn get_id(&self) -> ClauseId {
        self.id
    }

    /// Get how many literals are in the clause, this operation is `O(1)`.
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn number_of_positive_literals(&self) -> usize {
        self.positive.len()
    }

    pub fn number_of_negative_literals(&self) -> usize {
        self.negative.len()
    }

    /// Check if the clause is empty, this operation is `O(1)`.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Check if the clause is unit, this operation is `O(1)`.
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// Exactly one positive literal.
    pub fn is_definite(&self) -> bool {
        self.positive.len() == 1
    }

    /// A definite clause with at least one negative literal, that is a rule `body => head`.
    pub fn is_implication_definite(&self) -> bool {
        self.is_definite() && !self.negative.is_empty()
    }

    /// At most one positive literal.
    pub fn is_horn(&self) -> bool {
        self.positive.len() <= 1
    }

    pub fn is_tautology(&self) -> bool {
        is_tautology(self)
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn positive_literals(&self) -> impl Iterator<Item = &Literal> {
        self.positive.iter().map(|idx| &self.literals[*idx])
    }

    pub fn negative_literals(&self) -> impl Iterator<Item = &Literal> {
        self.negative.iter().map(|idx| &self.literals[*idx])
    }

    /// Get the default clause weight for the clause queue.
    pub fn weight(&self) -> usize {
        self.literals.iter().map(Literal::weight).sum()
    }

    pub fn variables(&self) -> VariableSet {
        let mut acc = VariableSet::new();
        self.literals.iter().for_each(|lit| lit.collect_vars_into(&mut acc));
        acc
    }

    /// The canonical key identifying this clause up to variable renaming.
    pub fn identity(&self) -> &str {
        self.identity.get_or_init(|| canonical_key(&self.literals))
    }

    /// Clone the clause and substitute all of its variables with fresh ones. The clone keeps the
    /// origin of `self`.
    pub fn renamed(&self, alloc: &mut IndexicalAllocator) -> Clause {
        let vars = self.variables();
        if vars.is_empty() {
            return Clause::new(self.literals.clone()).with_origin_opt(self.origin);
        }
        let renaming = alloc.renaming(vars.iter());
        self.clone().subst_with(&renaming)
    }

    /// Standardize the clause apart, recording a renaming step if any variable was renamed.
    pub fn standardize_apart(&self, alloc: &mut IndexicalAllocator, log: &ProofLog) -> Clause {
        let renamed = self.renamed(alloc);
        if self.variables().is_empty() {
            return renamed;
        }
        let step = log.record(
            ProofRule::Renaming,
            renamed.to_string(),
            "",
            &self.origin_slice(),
        );
        renamed.with_origin(step)
    }

    fn with_origin_opt(mut self, origin: Option<StepId>) -> Self {
        self.origin = origin;
        self
    }

    fn shares_variables_with(&self, other: &Clause) -> bool {
        let ours = self.variables();
        other.variables().iter().any(|var| ours.contains(var))
    }

    /// All factors of the clause, the clause itself always comes first. Factors are computed once
    /// and cached, so this is only called on clauses local to one query.
    pub fn factors(&self, alloc: &mut IndexicalAllocator, log: &ProofLog) -> &[Clause] {
        self.factors.get_or_init(|| self.compute_factors(alloc, log))
    }

    fn compute_factors(&self, alloc: &mut IndexicalAllocator, log: &ProofLog) -> Vec<Clause> {
        let mut seen = FxHashSet::default();
        seen.insert(self.identity().to_string());
        let mut result = vec![self.clone()];
        let mut worklist = vec![self.clone()];
        while let Some(clause) = worklist.pop() {
            for indices in [&clause.positive, &clause.negative] {
                for (pos, i) in indices.iter().enumerate() {
                    for j in indices[pos + 1..].iter() {
                        let lit_i = &clause.literals[*i];
                        let lit_j = &clause.literals[*j];
                        let Some(theta) = lit_i.atom().unify(lit_j.atom()) else {
                            continue;
                        };
                        let factor = Clause::new(clause.literals.clone().subst_with(&theta))
                            .renamed(alloc);
                        if !seen.insert(factor.identity().to_string()) {
                            continue;
                        }
                        let step = log.record(
                            ProofRule::Factor,
                            factor.to_string(),
                            theta.to_string(),
                            &clause.origin_slice(),
                        );
                        let factor = factor.with_origin(step);
                        debug!("Factor of {}: {}", clause, factor);
                        worklist.push(factor.clone());
                        result.push(factor);
                    }
                }
            }
        }
        result
    }

    /// All binary resolvents between `self` and `other`. `other` is standardized apart first
    /// when the two clauses share variables or are the same clause.
    pub fn binary_resolvents(
        &self,
        other: &Clause,
        alloc: &mut IndexicalAllocator,
        log: &ProofLog,
    ) -> Vec<Clause> {
        if self.is_empty() && other.is_empty() {
            return vec![Clause::empty()];
        }
        let other = if self.id == other.id || self.shares_variables_with(other) {
            other.renamed(alloc)
        } else {
            other.clone()
        };

        let mut resolvents = Vec::new();
        let mut seen = FxHashSet::default();
        for (positive_side, negative_side) in [(self, &other), (&other, self)] {
            for pos in positive_side.positive_literals() {
                for neg in negative_side.negative_literals() {
                    let Some(theta) = pos.atom().unify(neg.atom()) else {
                        continue;
                    };
                    let literals = remove_first(&positive_side.literals, pos)
                        .chain(remove_first(&negative_side.literals, neg))
                        .cloned()
                        .collect::<Vec<_>>()
                        .subst_with(&theta);
                    let resolvent = Clause::new(literals).renamed(alloc);
                    if !seen.insert(resolvent.identity().to_string()) {
                        continue;
                    }
                    let mut preds = positive_side.origin_slice();
                    preds.extend(negative_side.origin_slice());
                    let step = log.record(
                        ProofRule::Resolution,
                        resolvent.to_string(),
                        theta.to_string(),
                        &preds,
                    );
                    debug!("Resolved {} with {}: {}", self, other, resolvent);
                    resolvents.push(resolvent.with_origin(step));
                }
            }
        }
        resolvents
    }
}

// Every literal of `literals` except the first one equal to `lit`.
fn remove_first<'a>(literals: &'a [Literal], lit: &'a Literal) -> impl Iterator<Item = &'a Literal> {
    let skip = literals.iter().position(|l| l == lit);
    literals
        .iter()
        .enumerate()
        .filter(move |(idx, _)| Some(*idx) != skip)
        .map(|(_, l)| l)
}

impl PartialEq for Clause {
    /// Clauses are equal if they agree up to a consistent renaming of variables.
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Clause {}

impl Hash for Clause {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Hash::hash(self.identity(), state);
    }
}

impl Substitutable for Clause {
    fn subst_with(self, subst: &Substitution) -> Self {
        let origin = self.origin;
        Clause::new(self.literals.subst_with(subst)).with_origin_opt(origin)
    }
}

/// A set of clauses without duplicates up to variable renaming, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ClauseSet {
    clauses: Vec<Clause>,
    keys: FxHashSet<String>,
}

impl ClauseSet {
    /// Create an empty clause set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new clause into the set, returns `false` if an equal clause was already present.
    pub fn insert(&mut self, clause: Clause) -> bool {
        if self.keys.insert(clause.identity().to_string()) {
            self.clauses.push(clause);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, clause: &Clause) -> bool {
        self.keys.contains(clause.identity())
    }

    /// Remove the clause equal to `clause` if present.
    pub fn remove(&mut self, clause: &Clause) -> bool {
        if self.keys.remove(clause.identity()) {
            self.clauses.retain(|c| c.identity() != clause.identity());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Clause> {
        self.clauses.get(idx)
    }
}

impl FromIterator<Clause> for ClauseSet {
    fn from_iter<I: IntoIterator<Item = Clause>>(iter: I) -> Self {
        let mut set = ClauseSet::new();
        for clause in iter {
            set.insert(clause);
        }
        set
    }
}

#[cfg(test)]
mod test {
    use crate::{
        proofs::ProofLog,
        standardize::IndexicalAllocator,
        subst::{Substitutable, Substitution},
        term::{Atom, Term, Variable},
    };

    use super::{Clause, ClauseSet, Literal};

    fn p(args: Vec<Term>) -> Atom {
        Atom::predicate("P", args)
    }

    fn q(args: Vec<Term>) -> Atom {
        Atom::predicate("Q", args)
    }

    #[test]
    fn basic_literal_test() {
        let x = Term::var("x");
        let l1 = Literal::positive(p(vec![x.clone()]));
        let l2 = Literal::negative(p(vec![x.clone()]));
        assert!(l1.is_positive());
        assert!(l2.is_negative());
        assert_ne!(l1, l2);
        assert!(l1.is_negation_of(&l2));
        assert_eq!(l2.negate(), l1);
        assert_ne!(l1.clone().into_reduced(), l1);
        assert_eq!(l1.fact_key(), "+P");
        assert_eq!(l2.fact_key(), "-P");

        let mut subst = Substitution::new();
        subst.insert(Variable::new("x"), Term::constant("A"));
        assert_eq!(
            l1.subst_with(&subst),
            Literal::positive(p(vec![Term::constant("A")]))
        );
    }

    #[test]
    fn basic_clause_test() {
        let a = Term::constant("A");
        let clause = Clause::empty();
        assert_eq!(clause.len(), 0);
        assert!(clause.is_empty());
        assert!(!clause.is_unit());
        assert!(clause.is_horn());

        let lit1 = Literal::positive(p(vec![a.clone()]));
        let lit2 = Literal::negative(q(vec![a.clone()]));
        let clause = Clause::new(vec![lit1.clone(), lit2.clone(), lit1.clone()]);
        assert_eq!(clause.len(), 2);
        assert!(clause.is_definite());
        assert!(clause.is_implication_definite());
        assert_eq!(clause.number_of_positive_literals(), 1);
        assert_eq!(clause.number_of_negative_literals(), 1);

        let fact = Clause::new(vec![lit1.clone()]);
        assert!(fact.is_unit());
        assert!(fact.is_definite());
        assert!(!fact.is_implication_definite());

        let not_horn = Clause::new(vec![lit1, Literal::positive(q(vec![a]))]);
        assert!(!not_horn.is_horn());
    }

    #[test]
    fn equality_is_up_to_renaming() {
        let c1 = Clause::new(vec![
            Literal::positive(p(vec![Term::var("x")])),
            Literal::negative(q(vec![Term::var("x"), Term::var("y")])),
        ]);
        let c2 = Clause::new(vec![
            Literal::negative(q(vec![Term::var("u"), Term::var("v")])),
            Literal::positive(p(vec![Term::var("u")])),
        ]);
        let c3 = Clause::new(vec![
            Literal::positive(p(vec![Term::var("x")])),
            Literal::negative(q(vec![Term::var("y"), Term::var("x")])),
        ]);
        assert_eq!(c1, c2);
        assert_ne!(c1, c3);

        let set: ClauseSet = vec![c1.clone(), c2, c3].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&c1));
    }

    #[test]
    fn resolving_complementary_units_yields_empty() {
        let mut alloc = IndexicalAllocator::new();
        let log = ProofLog::new();
        let pos = Clause::new(vec![Literal::positive(p(vec![]))]);
        let neg = Clause::new(vec![Literal::negative(p(vec![]))]);
        let resolvents = pos.binary_resolvents(&neg, &mut alloc, &log);
        assert_eq!(resolvents.len(), 1);
        assert!(resolvents[0].is_empty());

        let resolvents = Clause::empty().binary_resolvents(&Clause::empty(), &mut alloc, &log);
        assert_eq!(resolvents, vec![Clause::empty()]);
    }

    #[test]
    fn resolution_applies_the_unifier() {
        let mut alloc = IndexicalAllocator::new();
        let log = ProofLog::new();
        // ¬King(x) ∨ Evil(x) against King(John)
        let rule = Clause::new(vec![
            Literal::negative(Atom::predicate("King", vec![Term::var("x")])),
            Literal::positive(Atom::predicate("Evil", vec![Term::var("x")])),
        ]);
        let fact = Clause::new(vec![Literal::positive(Atom::predicate(
            "King",
            vec![Term::constant("John")],
        ))]);
        let resolvents = rule.binary_resolvents(&fact, &mut alloc, &log);
        assert_eq!(
            resolvents,
            vec![Clause::new(vec![Literal::positive(Atom::predicate(
                "Evil",
                vec![Term::constant("John")]
            ))])]
        );
        assert!(resolvents[0].origin().is_some());
    }

    #[test]
    fn self_resolution_standardizes_apart() {
        let mut alloc = IndexicalAllocator::new();
        let log = ProofLog::new();
        // ¬P(x) ∨ P(F(x)) with itself gives ¬P(x) ∨ P(F(F(x)))
        let x = Term::var("x");
        let clause = Clause::new(vec![
            Literal::negative(p(vec![x.clone()])),
            Literal::positive(p(vec![Term::function("F", vec![x.clone()])])),
        ]);
        let resolvents = clause.binary_resolvents(&clause, &mut alloc, &log);
        let expected = Clause::new(vec![
            Literal::negative(p(vec![x.clone()])),
            Literal::positive(p(vec![Term::function(
                "F",
                vec![Term::function("F", vec![x])],
            )])),
        ]);
        assert!(resolvents.contains(&expected));
    }

    #[test]
    fn factors_include_the_clause_itself() {
        let mut alloc = IndexicalAllocator::new();
        let log = ProofLog::new();
        let clause = Clause::new(vec![
            Literal::positive(p(vec![Term::var("x")])),
            Literal::positive(p(vec![Term::constant("A")])),
            Literal::negative(q(vec![Term::var("x")])),
        ]);
        let factors = clause.factors(&mut alloc, &log).to_vec();
        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0], clause);
        assert_eq!(
            factors[1],
            Clause::new(vec![
                Literal::positive(p(vec![Term::constant("A")])),
                Literal::negative(q(vec![Term::constant("A")])),
            ])
        );

        let ground = Clause::new(vec![Literal::positive(p(vec![Term::constant("A")]))]);
        assert_eq!(ground.factors(&mut alloc, &log).len(), 1);
    }

    #[test]
    fn renamed_clause_has_fresh_variables() {
        let mut alloc = IndexicalAllocator::new();
        let log = ProofLog::new();
        let clause = Clause::new(vec![Literal::positive(p(vec![Term::var("x")]))]);
        let renamed = clause.standardize_apart(&mut alloc, &log);
        assert_eq!(renamed, clause);
        assert!(renamed.variables().iter().all(|v| v.index().is_some()));
        assert!(renamed.origin().is_some());
    }
}
