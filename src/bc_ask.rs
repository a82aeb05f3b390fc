//! ## Backward Chaining
//! SLD style backward chaining over the definite clauses of a knowledge base. The first goal of
//! the goal list is unified with the head of each definite clause, the body of the clause then
//! replaces the goal and the search continues depth first on the composed substitution.
//!
//! Like forward chaining this has no time limit, left recursive rules make it diverge.

use log::{debug, info};

use crate::{
    clause::{Clause, Literal},
    error::{FolError, Result},
    inference::{InferenceProcedure, InferenceResult, query_bindings},
    kb::KnowledgeBase,
    proofs::{ProofLog, ProofRule, StepId},
    sentence::Sentence,
    subst::{Substitutable, Substitution},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct FolBcAsk;

impl FolBcAsk {
    pub fn new() -> Self {
        Self
    }
}

impl InferenceProcedure for FolBcAsk {
    fn name(&self) -> &'static str {
        "backward chaining"
    }

    fn ask(&self, kb: &mut KnowledgeBase, query: &Sentence) -> Result<InferenceResult> {
        let Some(atom) = query.as_atom() else {
            return Err(FolError::InvalidQuery {
                procedure: self.name(),
                query: query.to_string(),
            });
        };
        let log = kb.proof_log().clone();
        let goals = vec![Literal::positive(atom.clone())];

        let mut answers = Vec::new();
        prove_goals(kb, &log, &goals, Substitution::new(), &mut answers);
        info!("Backward chaining found {} answer(s)", answers.len());

        let vars = atom.variables();
        let proofs = answers
            .into_iter()
            .filter_map(|(theta, step)| Some(log.proof(step?, query_bindings(&vars, &theta))))
            .collect();
        Ok(InferenceResult::new(proofs, false))
    }
}

// Every substitution that proves all of `goals` starting from `theta`, together with the step
// recording how the first goal was reduced. An empty goal list is proven by `theta` itself.
fn prove_goals(
    kb: &mut KnowledgeBase,
    log: &ProofLog,
    goals: &[Literal],
    theta: Substitution,
    answers: &mut Vec<(Substitution, Option<StepId>)>,
) {
    let Some((first, rest)) = goals.split_first() else {
        answers.push((theta, None));
        return;
    };
    let goal = first.clone().subst_with(&theta);
    let rules: Vec<Clause> = kb.definite_clauses().to_vec();
    for rule in rules.iter() {
        let rule = rule.renamed(kb.allocator_mut());
        let Some(head) = rule.positive_literals().next() else {
            continue;
        };
        let Some(theta_delta) = head.atom().unify(goal.atom()) else {
            continue;
        };
        debug!("Goal {} matches {}", goal, rule);

        let mut new_goals: Vec<Literal> = rule
            .negative_literals()
            .map(Literal::to_positive)
            .collect();
        new_goals.extend(rest.iter().cloned());

        let mut below = Vec::new();
        prove_goals(kb, log, &new_goals, theta.compose(&theta_delta), &mut below);
        for (answer, below_step) in below {
            let mut preds = rule.origin_slice();
            preds.extend(below_step);
            let step = log.record(
                ProofRule::BackwardGoal,
                goal.clone().subst_with(&answer).to_string(),
                theta_delta.to_string(),
                &preds,
            );
            answers.push((answer, Some(step)));
        }
    }
}
