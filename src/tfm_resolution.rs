//! ## Two Finger Method Resolution
//! Saturation by binary resolution without any strategy: the clauses of the knowledge base and of
//! the negated query are resolved pairwise, every resolvent together with its factors is added, and
//! this repeats until a pass adds nothing new, an answer is complete or the time limit is hit.

use log::{debug, info};

use crate::{
    clause::{Clause, ClauseSet},
    error::Result,
    inference::{AnswerHandler, InferenceProcedure, InferenceResult, ResourceLimitConfig},
    kb::KnowledgeBase,
    sentence::Sentence,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct FolTfmResolution {
    resource_config: ResourceLimitConfig,
}

impl FolTfmResolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_config(mut self, resource_config: ResourceLimitConfig) -> Self {
        self.resource_config = resource_config;
        self
    }
}

impl InferenceProcedure for FolTfmResolution {
    fn name(&self) -> &'static str {
        "TFM resolution"
    }

    fn ask(&self, kb: &mut KnowledgeBase, query: &Sentence) -> Result<InferenceResult> {
        let log = kb.proof_log().clone();
        let (mut answers, goals) = AnswerHandler::new(kb, query, &self.resource_config, &log);

        let kb_clauses: Vec<Clause> = kb.clauses().cloned().collect();
        let alloc = kb.allocator_mut();
        let mut clauses = ClauseSet::new();
        for clause in kb_clauses.iter().chain(goals.iter()) {
            let clause = clause.standardize_apart(alloc, &log);
            for factor in clause.factors(alloc, &log) {
                clauses.insert(factor.clone());
            }
        }
        info!("Saturating {} clauses", clauses.len());

        let mut pass = 0;
        loop {
            pass += 1;
            let mut new_clauses = ClauseSet::new();
            'pairs: for i in 0..clauses.len() {
                for j in i..clauses.len() {
                    let (Some(ci), Some(cj)) = (clauses.get(i), clauses.get(j)) else {
                        continue;
                    };
                    for resolvent in ci.binary_resolvents(cj, alloc, &log) {
                        for factor in resolvent.factors(alloc, &log) {
                            if clauses.contains(factor) || !new_clauses.insert(factor.clone()) {
                                continue;
                            }
                            answers.is_answer_clause(factor, &log)?;
                            if answers.is_complete() {
                                break 'pairs;
                            }
                        }
                    }
                }
            }

            debug!("Pass {} produced {} new clauses", pass, new_clauses.len());
            let mut grew = false;
            for clause in new_clauses.iter() {
                grew |= clauses.insert(clause.clone());
            }
            if answers.is_complete() || !grew {
                break;
            }
        }
        Ok(answers.into_result())
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use crate::{
        inference::ResourceLimitConfig,
        kb::KnowledgeBase,
        sentence::Sentence,
        term::{Atom, Term, Variable},
    };

    use super::FolTfmResolution;

    fn pred(name: &str, args: Vec<Term>) -> Sentence {
        Sentence::from(Atom::predicate(name, args))
    }

    fn kings_kb(procedure: FolTfmResolution) -> KnowledgeBase {
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
        let mut kb = kings_kb(FolTfmResolution::new());
        let result = kb.ask(&pred("Evil", vec![Term::constant("John")])).unwrap();
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(result.proofs()[0].steps().last().unwrap().proof_text, "⊥");
    }

    #[test]
    fn kings_variable_query() {
        let mut kb = kings_kb(FolTfmResolution::new());
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
    fn saturates_without_proof() {
        let mut kb = kings_kb(FolTfmResolution::new());
        let result = kb.ask(&pred("Evil", vec![Term::constant("Richard")])).unwrap();
        assert!(result.is_possibly_false());
    }

    #[test]
    fn zero_time_limit() {
        let config = ResourceLimitConfig::default().with_duration(Some(Duration::ZERO));
        let mut kb = kings_kb(FolTfmResolution::new().with_resource_config(config));
        let result = kb.ask(&pred("Evil", vec![Term::constant("Richard")])).unwrap();
        assert!(result.is_unknown_due_to_timeout());
        assert!(result.proofs().is_empty());
    }
}
