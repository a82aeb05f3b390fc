//! ## Chains
//! Ordered literal sequences used by model elimination. Unlike a [Clause] the order matters: the
//! first literal is the head that inference works on, literals marked as reduced remember the
//! heads of ancestor chains for later cancellation.

use log::debug;

use crate::{
    clause::{Clause, Literal},
    proofs::{ProofLog, ProofRule, StepId},
    standardize::IndexicalAllocator,
    subst::{Substitutable, Substitution},
    term::VariableSet,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    literals: Vec<Literal>,
    origin: Option<StepId>,
}

impl Chain {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self {
            literals,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: StepId) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn origin(&self) -> Option<StepId> {
        self.origin
    }

    fn origin_slice(&self) -> Vec<StepId> {
        self.origin.into_iter().collect()
    }

    /// Convert a clause into a chain, keeping the literal order of the clause.
    pub fn from_clause(clause: &Clause, log: &ProofLog) -> Self {
        let chain = Chain::new(clause.literals().to_vec());
        let preds: Vec<StepId> = clause.origin().into_iter().collect();
        let step = log.record(ProofRule::ChainFromClause, chain.to_string(), "", &preds);
        chain.with_origin(step)
    }

    pub fn head(&self) -> Option<&Literal> {
        self.literals.first()
    }

    pub fn tail(&self) -> &[Literal] {
        self.literals.get(1..).unwrap_or(&[])
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn variables(&self) -> VariableSet {
        let mut acc = VariableSet::new();
        self.literals.iter().for_each(|lit| lit.collect_vars_into(&mut acc));
        acc
    }

    /// Every rotation that moves a non head literal to the front, the remaining literals keep
    /// their relative order.
    pub fn contrapositives(&self, log: &ProofLog) -> Vec<Chain> {
        (1..self.literals.len())
            .map(|idx| {
                let mut literals = Vec::with_capacity(self.literals.len());
                literals.push(self.literals[idx].clone());
                literals.extend(
                    self.literals
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != idx)
                        .map(|(_, lit)| lit.clone()),
                );
                let chain = Chain::new(literals);
                let step = log.record(
                    ProofRule::ChainContrapositive,
                    chain.to_string(),
                    "",
                    &self.origin_slice(),
                );
                chain.with_origin(step)
            })
            .collect()
    }

    /// Clone the chain with all variables replaced by fresh ones, keeping the origin.
    pub fn renamed(&self, alloc: &mut IndexicalAllocator) -> Chain {
        let vars = self.variables();
        if vars.is_empty() {
            return self.clone();
        }
        let renaming = alloc.renaming(vars.iter());
        self.clone().subst_with(&renaming)
    }

    /// Reduction of `self` (the near parent) with `far`: if the heads are complementary and
    /// unify, the result is the far tail, then the near head as a reduced literal, then the near
    /// tail, all under the unifier. `far` is standardized apart first.
    pub fn reduce(&self, far: &Chain, alloc: &mut IndexicalAllocator, log: &ProofLog) -> Option<Chain> {
        let near_head = self.head()?;
        let far = far.renamed(alloc);
        let far_head = far.head()?;
        if near_head.polarity() == far_head.polarity() {
            return None;
        }
        let theta = near_head.atom().unify(far_head.atom())?;

        let mut literals: Vec<Literal> = far.tail().to_vec();
        literals.push(near_head.clone().into_reduced());
        literals.extend(self.tail().iter().cloned());
        let chain = Chain::new(literals.subst_with(&theta));

        let mut preds = self.origin_slice();
        preds.extend(far.origin_slice());
        let step = log.record(ProofRule::ChainReduction, chain.to_string(), theta.to_string(), &preds);
        debug!("Reduced {} with {}: {}", self, far, chain);
        Some(chain.with_origin(step))
    }

    /// Cancellation: if the head is complementary to a reduced literal of the tail under some
    /// unifier, drop the head and apply the unifier to the tail.
    pub fn cancel(&self, log: &ProofLog) -> Option<Chain> {
        let head = self.head()?;
        for lit in self.tail() {
            if !lit.is_reduced() || lit.polarity() == head.polarity() {
                continue;
            }
            if let Some(theta) = head.atom().unify(lit.atom()) {
                let chain = Chain::new(self.tail().to_vec().subst_with(&theta));
                let step = log.record(
                    ProofRule::ChainCancellation,
                    chain.to_string(),
                    theta.to_string(),
                    &self.origin_slice(),
                );
                return Some(chain.with_origin(step));
            }
        }
        None
    }

    /// Dropping: a reduced head is removed.
    pub fn drop_head(&self, log: &ProofLog) -> Option<Chain> {
        if !self.head()?.is_reduced() {
            return None;
        }
        let chain = Chain::new(self.tail().to_vec());
        let step = log.record(ProofRule::ChainDropped, chain.to_string(), "", &self.origin_slice());
        Some(chain.with_origin(step))
    }
}

impl Substitutable for Chain {
    fn subst_with(self, subst: &Substitution) -> Self {
        Self {
            literals: self.literals.subst_with(subst),
            origin: self.origin,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        clause::{Clause, Literal},
        proofs::ProofLog,
        standardize::IndexicalAllocator,
        term::{Atom, Term},
    };

    use super::Chain;

    fn lit(name: &str, negative: bool, args: Vec<Term>) -> Literal {
        let atom = Atom::predicate(name, args);
        if negative {
            Literal::negative(atom)
        } else {
            Literal::positive(atom)
        }
    }

    #[test]
    fn contrapositives_rotate_heads() {
        let log = ProofLog::new();
        let a = lit("A", false, vec![]);
        let b = lit("B", true, vec![]);
        let c = lit("C", false, vec![]);
        let chain = Chain::from_clause(&Clause::new(vec![a.clone(), b.clone(), c.clone()]), &log);
        let contras = chain.contrapositives(&log);
        assert_eq!(contras.len(), 2);
        assert_eq!(contras[0].literals(), &[b.clone(), a.clone(), c.clone()]);
        assert_eq!(contras[1].literals(), &[c, a, b]);
        assert!(contras.iter().all(|c| c.origin().is_some()));
    }

    #[test]
    fn reduction_marks_near_head() {
        let log = ProofLog::new();
        let mut alloc = IndexicalAllocator::new();
        // near: <¬P(A), Q(A)>, far: <P(x), R(x)>
        let near = Chain::new(vec![
            lit("P", true, vec![Term::constant("A")]),
            lit("Q", false, vec![Term::constant("A")]),
        ]);
        let far = Chain::new(vec![
            lit("P", false, vec![Term::var("x")]),
            lit("R", false, vec![Term::var("x")]),
        ]);
        let reduced = near.reduce(&far, &mut alloc, &log).unwrap();
        assert_eq!(
            reduced.literals(),
            &[
                lit("R", false, vec![Term::constant("A")]),
                lit("P", true, vec![Term::constant("A")]).into_reduced(),
                lit("Q", false, vec![Term::constant("A")]),
            ]
        );
        // Same polarity heads never reduce.
        assert!(near.reduce(&near, &mut alloc, &log).is_none());
    }

    #[test]
    fn cancellation_and_dropping() {
        let log = ProofLog::new();
        let chain = Chain::new(vec![
            lit("P", false, vec![Term::var("y")]),
            lit("P", true, vec![Term::constant("A")]).into_reduced(),
            lit("Q", false, vec![Term::var("y")]),
        ]);
        let cancelled = chain.cancel(&log).unwrap();
        assert_eq!(
            cancelled.literals(),
            &[
                lit("P", true, vec![Term::constant("A")]).into_reduced(),
                lit("Q", false, vec![Term::constant("A")]),
            ]
        );
        assert!(cancelled.cancel(&log).is_none());
        let dropped = cancelled.drop_head(&log).unwrap();
        assert_eq!(dropped.literals(), &[lit("Q", false, vec![Term::constant("A")])]);
        assert!(dropped.drop_head(&log).is_none());
    }
}
