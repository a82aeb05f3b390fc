//! ## Forward Chaining
//! Forward chaining over the implication clauses of a knowledge base. Every round instantiates the
//! bodies of all rules with the facts known at the start of the round and collects the heads that
//! are new up to renaming. The collected facts are added to the knowledge base when the round ends,
//! or as soon as one of them unifies with the query. A round that derives nothing ends the search.
//!
//! There is no time limit: over a signature with function symbols the rounds may never run dry.

use log::{debug, info};

use crate::{
    clause::{Clause, Literal},
    error::{FolError, Result},
    inference::{InferenceProcedure, InferenceResult, query_bindings},
    kb::{KnowledgeBase, is_renaming},
    proofs::{Proof, ProofLog, ProofRule, StepId},
    sentence::Sentence,
    subst::Substitutable,
    term::Atom,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct FolFcAsk;

impl FolFcAsk {
    pub fn new() -> Self {
        Self
    }
}

impl InferenceProcedure for FolFcAsk {
    fn name(&self) -> &'static str {
        "forward chaining"
    }

    fn ask(&self, kb: &mut KnowledgeBase, query: &Sentence) -> Result<InferenceResult> {
        let Some(atom) = query.as_atom() else {
            return Err(FolError::InvalidQuery {
                procedure: self.name(),
                query: query.to_string(),
            });
        };
        let alpha = Literal::positive(atom.clone());
        let log = kb.proof_log().clone();

        if !kb.fetch(&alpha).is_empty() {
            info!("{} is already a known fact", alpha);
            let proofs = known_fact_proofs(kb, atom, &alpha, &log, true);
            return Ok(InferenceResult::new(proofs, false));
        }

        loop {
            let mut new_facts: Vec<(Literal, StepId)> = Vec::new();
            let mut answers_query = false;
            let implications: Vec<Clause> = kb.implication_clauses().to_vec();
            'round: for implication in implications.iter() {
                let implication = implication.standardize_apart(kb.allocator_mut(), &log);
                let Some(head) = implication.positive_literals().next().cloned() else {
                    continue;
                };
                let body: Vec<Literal> = implication
                    .negative_literals()
                    .map(Literal::to_positive)
                    .collect();

                for (theta, fact_origins) in kb.fetch_all_facts(&body) {
                    let fact = head.clone().subst_with(&theta);
                    if kb.is_renaming_of_fact(&fact)
                        || is_renaming(&fact, new_facts.iter().map(|(new, _)| new))
                    {
                        continue;
                    }
                    let mut preds = implication.origin_slice();
                    preds.extend(fact_origins);
                    let step =
                        log.record(ProofRule::AssertFact, fact.to_string(), theta.to_string(), &preds);
                    debug!("Derived {} from {}", fact, implication);

                    answers_query = fact.atom().unify(alpha.atom()).is_some();
                    new_facts.push((fact, step));
                    if answers_query {
                        break 'round;
                    }
                }
            }

            // Facts of a round only become usable in the next one.
            let derived = new_facts.len();
            for (fact, step) in new_facts {
                kb.add_derived_fact(fact, step);
            }
            kb.replace_proof_log(log.clone());
            if answers_query {
                info!("Derived {} facts, the last one answers the query", derived);
                let proofs = known_fact_proofs(kb, atom, &alpha, &log, false);
                return Ok(InferenceResult::new(proofs, false));
            }
            if derived == 0 {
                info!("No new facts derived, {} is not entailed", alpha);
                return Ok(InferenceResult::new(Vec::new(), false));
            }
            info!("Derived {} new facts", derived);
        }
    }
}

// One proof per stored fact matching `alpha`. Facts that were known before the query started are
// wrapped into an extra step saying so.
fn known_fact_proofs(
    kb: &KnowledgeBase,
    atom: &Atom,
    alpha: &Literal,
    log: &ProofLog,
    already_known: bool,
) -> Vec<Proof> {
    let vars = atom.variables();
    kb.fetch_facts(alpha)
        .into_iter()
        .filter_map(|(theta, origin)| {
            let origin = origin?;
            let last = if already_known {
                log.record(ProofRule::AlreadyAFact, alpha.to_string(), theta.to_string(), &[origin])
            } else {
                origin
            };
            Some(log.proof(last, query_bindings(&vars, &theta)))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::{
        clause::Literal,
        error::FolError,
        kb::KnowledgeBase,
        proofs::ProofRule,
        sentence::Sentence,
        term::{Atom, Term, Variable},
    };

    use super::FolFcAsk;

    fn pred(name: &str, args: Vec<Term>) -> Sentence {
        Sentence::from(Atom::predicate(name, args))
    }

    fn kings_kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::with_inference_procedure(Arc::new(FolFcAsk::new()));
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
        let mut kb = kings_kb();
        let result = kb.ask(&pred("Evil", vec![Term::constant("John")])).unwrap();
        assert!(result.is_true());
        assert_eq!(result.proofs().len(), 1);
        let proof = &result.proofs()[0];
        assert!(proof.answer_bindings().is_empty());
        let last = proof.steps().last().unwrap();
        assert_eq!(last.proof_text, "Evil(John)");
        assert_eq!(last.rule, ProofRule::AssertFact);
        assert!(
            proof
                .steps()
                .iter()
                .any(|line| line.rule == ProofRule::Premise && line.proof_text == "Greedy(John)")
        );

        // The derived fact stays in the knowledge base.
        assert_eq!(kb.fact_count(), 4);
        let again = kb.ask(&pred("Evil", vec![Term::constant("John")])).unwrap();
        assert_eq!(again.proofs().len(), 1);
        assert_eq!(
            again.proofs()[0].steps().last().unwrap().rule,
            ProofRule::AlreadyAFact
        );
    }

    #[test]
    fn kings_variable_query() {
        let mut kb = kings_kb();
        let result = kb.ask(&pred("King", vec![Term::var("x")])).unwrap();
        assert!(result.is_true());
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
    fn not_entailed() {
        let mut kb = kings_kb();
        let result = kb.ask(&pred("Evil", vec![Term::constant("Richard")])).unwrap();
        assert!(result.is_possibly_false());
        assert!(!result.is_unknown_due_to_timeout());
    }

    #[test]
    fn rejects_complex_queries() {
        let mut kb = kings_kb();
        let query = Sentence::not(pred("Evil", vec![Term::constant("John")]));
        assert!(matches!(kb.ask(&query), Err(FolError::InvalidQuery { .. })));
    }

    #[test]
    fn facts_wait_for_the_next_round() {
        let mut kb = KnowledgeBase::with_inference_procedure(Arc::new(FolFcAsk::new()));
        let x = Term::var("x");
        let c = || vec![Term::constant("C")];
        kb.tell(pred("A", c())).unwrap();
        kb.tell(Sentence::implies(pred("A", vec![x.clone()]), pred("B", vec![x.clone()])))
            .unwrap();
        kb.tell(Sentence::implies(pred("B", vec![x.clone()]), pred("D", vec![x.clone()])))
            .unwrap();
        kb.tell(Sentence::implies(pred("A", vec![x.clone()]), pred("E", vec![x])))
            .unwrap();

        // B(C) and E(C) come out of the first round, D(C) would need a second one.
        let result = kb.ask(&pred("E", c())).unwrap();
        assert!(result.is_true());
        assert_eq!(kb.fact_count(), 3);
        assert!(kb.fetch(&Literal::positive(Atom::predicate("D", c()))).is_empty());
        assert_eq!(kb.fetch(&Literal::positive(Atom::predicate("B", c()))).len(), 1);

        let result = kb.ask(&pred("D", c())).unwrap();
        assert!(result.is_true());
        assert_eq!(kb.fact_count(), 4);
    }
}
