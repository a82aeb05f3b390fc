//! ## Model Elimination
//! Model elimination over chains with iterative deepening. Every clause is turned into a chain
//! plus all of its contrapositives. Starting from the chains of the negated query, the search
//! reduces the head of the current chain with a far parent chain whose head is complementary, then
//! cancels and drops heads as long as possible. An empty chain, or one consisting of just the
//! answer literal, answers the query.
//!
//! The depth bound grows by one until an answer is complete, time runs out or the search tree
//! turns out to be finite.

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::{
    chain::Chain,
    clause::{Clause, Literal, Polarity},
    error::Result,
    inference::{AnswerHandler, InferenceProcedure, InferenceResult, ResourceLimitConfig},
    kb::KnowledgeBase,
    proofs::ProofLog,
    sentence::Sentence,
    standardize::IndexicalAllocator,
    subsume::find_subsumed_clauses,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct FolModelElimination {
    resource_config: ResourceLimitConfig,
}

impl FolModelElimination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_config(mut self, resource_config: ResourceLimitConfig) -> Self {
        self.resource_config = resource_config;
        self
    }
}

impl InferenceProcedure for FolModelElimination {
    fn name(&self) -> &'static str {
        "model elimination"
    }

    fn ask(&self, kb: &mut KnowledgeBase, query: &Sentence) -> Result<InferenceResult> {
        let log = kb.proof_log().clone();
        let (answers, goals) = AnswerHandler::new(kb, query, &self.resource_config, &log);

        let kb_clauses: Vec<Clause> = kb.clauses().cloned().collect();
        let subsumed = find_subsumed_clauses(kb_clauses.iter());
        let background_clauses: Vec<Clause> = kb_clauses
            .into_iter()
            .filter(|clause| !subsumed.contains(clause))
            .collect();
        let background = chains_from_clauses(&background_clauses, &log);
        let sos = chains_from_clauses(&goals, &log);
        let far_parents = IndexedFarParents::new(sos.iter().chain(background.iter()));

        let mut search = Search {
            answers,
            alloc: kb.allocator_mut(),
            log: &log,
            max_depth_reached: 0,
        };
        let mut max_depth = 1;
        loop {
            info!("Iterative deepening to depth {}", max_depth);
            search.max_depth_reached = 0;
            for near_parent in sos.iter() {
                search.recursive_dls(&far_parents, max_depth, 0, near_parent)?;
                if search.answers.is_complete() {
                    return Ok(search.answers.into_result());
                }
            }
            if search.max_depth_reached < max_depth {
                info!("Search tree exhausted at depth {}", search.max_depth_reached);
                break;
            }
            max_depth += 1;
        }
        Ok(search.answers.into_result())
    }
}

/// Each clause as a chain followed by its contrapositives.
fn chains_from_clauses(clauses: &[Clause], log: &ProofLog) -> Vec<Chain> {
    let mut chains = Vec::new();
    for clause in clauses {
        let chain = Chain::from_clause(clause, log);
        let contrapositives = chain.contrapositives(log);
        chains.push(chain);
        chains.extend(contrapositives);
    }
    chains
}

/// Candidate far parents indexed by the polarity and predicate of their head.
struct IndexedFarParents {
    by_head: FxHashMap<(Polarity, String), Vec<Chain>>,
}

impl IndexedFarParents {
    fn new<'a>(chains: impl IntoIterator<Item = &'a Chain>) -> Self {
        let mut by_head: FxHashMap<(Polarity, String), Vec<Chain>> = FxHashMap::default();
        for chain in chains {
            if let Some(head) = chain.head() {
                by_head
                    .entry(Self::key(head.polarity(), head))
                    .or_default()
                    .push(chain.clone());
            }
        }
        Self { by_head }
    }

    fn key(polarity: Polarity, lit: &Literal) -> (Polarity, String) {
        (polarity, lit.atom().symbolic_name().to_string())
    }

    /// The chains whose head is complementary to `head` in polarity and predicate.
    fn candidates(&self, head: &Literal) -> &[Chain] {
        self.by_head
            .get(&Self::key(head.polarity().negate(), head))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

struct Search<'a> {
    answers: AnswerHandler,
    alloc: &'a mut IndexicalAllocator,
    log: &'a ProofLog,
    max_depth_reached: usize,
}

impl Search<'_> {
    fn recursive_dls(
        &mut self,
        far_parents: &IndexedFarParents,
        max_depth: usize,
        depth: usize,
        near_parent: &Chain,
    ) -> Result<()> {
        self.max_depth_reached = self.max_depth_reached.max(depth);
        if depth == max_depth {
            return Ok(());
        }
        let Some(head) = near_parent.head() else {
            return Ok(());
        };

        for far_parent in far_parents.candidates(head) {
            if self.answers.is_complete() {
                break;
            }
            let Some(mut resolvent) = near_parent.reduce(far_parent, self.alloc, self.log) else {
                continue;
            };
            loop {
                if let Some(cancelled) = resolvent.cancel(self.log) {
                    resolvent = cancelled;
                } else if let Some(dropped) = resolvent.drop_head(self.log) {
                    resolvent = dropped;
                } else {
                    break;
                }
            }
            debug!("Depth {}: {}", depth, resolvent);

            if !self.answers.is_answer_chain(&resolvent, self.log)? {
                self.recursive_dls(far_parents, max_depth, depth + 1, &resolvent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use crate::{
        inference::ResourceLimitConfig,
        kb::KnowledgeBase,
        proofs::ProofRule,
        sentence::Sentence,
        term::{Atom, Term, Variable},
    };

    use super::FolModelElimination;

    fn pred(name: &str, args: Vec<Term>) -> Sentence {
        Sentence::from(Atom::predicate(name, args))
    }

    fn kings_kb(procedure: FolModelElimination) -> KnowledgeBase {
        let mut kb = KnowledgeBase::with_inference_procedure(Arc::new(procedure));
        let x = Term::var("x");
        kb.tell(pred("King", vec![Term::constant("John")])).unwrap();
        kb.tell(pred("Greedy", vec![Term::constant("John")])).unwrap();
        kb.tell(pred("King", vec![Term::constant("Richard")])).unwrap();
        kb.tell(Sentence::forall(
            vec![Variable::new("x")],
            Sentence::implies(
                Sentence::and(pred("King", vec![x.clone()]), pred("Greedy", vec![x.clone()])),
                pred("Evil", vec![x]),
            ),
        ))
        .unwrap();
        kb
    }

    #[test]
    fn kings_evil_john() {
        let mut kb = kings_kb(FolModelElimination::new());
        let result = kb.ask(&pred("Evil", vec![Term::constant("John")])).unwrap();
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 1);
        let proof = &result.proofs()[0];
        assert_eq!(proof.steps().last().unwrap().proof_text, "⊥");
        assert!(proof.steps().iter().any(|line| line.rule == ProofRule::ChainReduction));
    }

    #[test]
    fn kings_variable_query() {
        let mut kb = kings_kb(FolModelElimination::new());
        let result = kb.ask(&pred("King", vec![Term::var("x")])).unwrap();
        assert!(result.is_true());
        assert!(!result.is_partial_result_due_to_timeout());
        let mut answers: Vec<_> = result
            .proofs()
            .iter()
            .map(|proof| proof.answer_bindings().get(&Variable::new("x")).cloned())
            .collect();
        answers.sort();
        assert_eq!(
            answers,
            vec![Some(Term::constant("John")), Some(Term::constant("Richard"))]
        );
    }

    #[test]
    fn finite_tree_without_proof() {
        let mut kb = kings_kb(FolModelElimination::new());
        let result = kb.ask(&pred("Evil", vec![Term::constant("Richard")])).unwrap();
        assert!(result.is_possibly_false());
    }

    #[test]
    fn needs_ancestor_cancellation() {
        let mut kb = KnowledgeBase::with_inference_procedure(Arc::new(FolModelElimination::new()));
        kb.tell(Sentence::or(pred("P", vec![]), pred("Q", vec![]))).unwrap();
        kb.tell(Sentence::implies(pred("P", vec![]), pred("Q", vec![]))).unwrap();
        let result = kb.ask(&pred("Q", vec![])).unwrap();
        assert!(result.is_true());
        assert!(
            result.proofs()[0]
                .steps()
                .iter()
                .any(|line| line.rule == ProofRule::ChainCancellation)
        );
    }

    #[test]
    fn zero_time_limit() {
        let config = ResourceLimitConfig::default().with_duration(Some(Duration::ZERO));
        let mut kb = kings_kb(FolModelElimination::new().with_resource_config(config));
        let result = kb.ask(&pred("Evil", vec![Term::constant("Richard")])).unwrap();
        assert!(result.is_unknown_due_to_timeout());
    }
}
