//! ## Inference
//! The interface between the [KnowledgeBase] and the inference procedures that answer queries
//! against it:
//! - [InferenceProcedure] is the strategy a knowledge base delegates its queries to
//! - [InferenceResult] is what every procedure reports back
//! - [ResourceLimitConfig] bounds the wall clock time of the procedures that poll a deadline
//!
//! It also contains the answer bookkeeping shared by the refutation based procedures, which add
//! an answer literal to the negated query so that bindings of query variables can be read off a
//! derived unit clause or chain.

use std::{
    fmt::{Debug, Display},
    time::{Duration, Instant},
};

use log::info;

use crate::{
    chain::Chain,
    clause::{Clause, Literal},
    error::{FolError, Result},
    kb::KnowledgeBase,
    proofs::{Proof, ProofLog, ProofRule, StepId},
    sentence::Sentence,
    subst::Substitution,
    term::Variable,
};

/// The default wall clock budget of a single query.
pub const DEFAULT_QUERY_TIME: Duration = Duration::from_secs(10);

/// A strategy for answering queries against a knowledge base.
pub trait InferenceProcedure: Debug {
    /// Short human readable name used in logs.
    fn name(&self) -> &'static str;

    /// Answer `query`, whose variables have already been standardized apart from the knowledge
    /// base by the caller.
    fn ask(&self, kb: &mut KnowledgeBase, query: &Sentence) -> Result<InferenceResult>;
}

/// The outcome of a query. A result with proofs is true. Without proofs it is only possibly false,
/// or unknown if the procedure ran out of time before the search space was exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceResult {
    proofs: Vec<Proof>,
    timed_out: bool,
}

impl InferenceResult {
    pub fn new(proofs: Vec<Proof>, timed_out: bool) -> Self {
        Self { proofs, timed_out }
    }

    /// The query is entailed, there is at least one proof.
    pub fn is_true(&self) -> bool {
        !self.proofs.is_empty()
    }

    /// The search finished without finding a proof.
    pub fn is_possibly_false(&self) -> bool {
        !self.timed_out && self.proofs.is_empty()
    }

    pub fn is_unknown_due_to_timeout(&self) -> bool {
        self.timed_out && self.proofs.is_empty()
    }

    /// Some answers were found but there may be more.
    pub fn is_partial_result_due_to_timeout(&self) -> bool {
        self.timed_out && !self.proofs.is_empty()
    }

    pub fn proofs(&self) -> &[Proof] {
        &self.proofs
    }

    pub fn proofs_mut(&mut self) -> &mut [Proof] {
        &mut self.proofs
    }

    pub fn into_proofs(self) -> Vec<Proof> {
        self.proofs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceLimitConfig {
    pub duration: Option<Duration>,
}

impl Default for ResourceLimitConfig {
    fn default() -> Self {
        ResourceLimitConfig {
            duration: Some(DEFAULT_QUERY_TIME),
        }
    }
}

impl ResourceLimitConfig {
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceLimits {
    time_limit: Option<Instant>,
}

impl ResourceLimits {
    pub(crate) fn of_config(config: &ResourceLimitConfig) -> Self {
        let time_limit = config.duration.map(|dur| Instant::now() + dur);
        ResourceLimits { time_limit }
    }

    pub(crate) fn is_exceeded(&self) -> bool {
        self.time_limit
            .is_some_and(|time_limit| Instant::now() >= time_limit)
    }
}

/// The bindings `theta` gives to `vars`, unbound variables are left out.
pub(crate) fn query_bindings(vars: &[Variable], theta: &Substitution) -> Substitution {
    vars.iter()
        .filter_map(|var| Some((var.clone(), theta.get(var)?.clone())))
        .collect()
}

/// Collects the answers of a refutation based procedure and decides when it is done.
#[derive(Debug)]
pub(crate) struct AnswerHandler {
    answer_predicate: Option<String>,
    answer_variables: Vec<Variable>,
    resource_limits: ResourceLimits,
    proofs: Vec<Proof>,
    complete: bool,
    timed_out: bool,
}

impl AnswerHandler {
    /// Set up the answer bookkeeping for `query` and build the clauses of its negation, extended
    /// by an answer literal over the query variables if there are any. Every returned clause is
    /// standardized apart and recorded as a goal in `log`.
    pub(crate) fn new(
        kb: &mut KnowledgeBase,
        query: &Sentence,
        config: &ResourceLimitConfig,
        log: &ProofLog,
    ) -> (Self, Vec<Clause>) {
        let refutation = Sentence::not(query.clone());
        let answer_atom = kb.create_answer_literal(&refutation);
        let answer_variables = answer_atom.variables();

        let (answer_predicate, goal) = if answer_variables.is_empty() {
            (None, refutation)
        } else {
            (
                Some(answer_atom.symbolic_name().to_string()),
                Sentence::or(refutation, Sentence::from(answer_atom)),
            )
        };

        let goal_clauses = kb
            .convert_to_clauses(&goal)
            .into_clauses()
            .into_iter()
            .map(|clause| {
                let clause = clause.renamed(kb.allocator_mut());
                let step = log.record(ProofRule::Goal, clause.to_string(), "", &[]);
                clause.with_origin(step)
            })
            .collect();

        let handler = Self {
            answer_predicate,
            answer_variables,
            resource_limits: ResourceLimits::of_config(config),
            proofs: Vec::new(),
            complete: false,
            timed_out: false,
        };
        (handler, goal_clauses)
    }

    /// The predicate name of the answer literal, if the query has variables.
    pub(crate) fn answer_predicate(&self) -> Option<&str> {
        self.answer_predicate.as_deref()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete
    }

    /// Check whether `clause` answers the query, recording a proof if it does. This is also the
    /// point where the time limit is polled.
    pub(crate) fn is_answer_clause(&mut self, clause: &Clause, log: &ProofLog) -> Result<bool> {
        let unit = match clause.literals() {
            [lit] if lit.is_positive() => Some(lit),
            _ => None,
        };
        self.check(clause.is_empty(), unit, clause.origin(), clause, log)
    }

    /// Like [Self::is_answer_clause] for model elimination chains.
    pub(crate) fn is_answer_chain(&mut self, chain: &Chain, log: &ProofLog) -> Result<bool> {
        let unit = match chain.literals() {
            [lit] if lit.is_positive() => Some(lit),
            _ => None,
        };
        self.check(chain.is_empty(), unit, chain.origin(), chain, log)
    }

    fn check(
        &mut self,
        is_empty: bool,
        unit: Option<&Literal>,
        origin: Option<StepId>,
        text: &dyn Display,
        log: &ProofLog,
    ) -> Result<bool> {
        let mut is_answer = false;
        match self.answer_predicate.as_deref() {
            None => {
                if is_empty {
                    info!("Refutation found");
                    let last = Self::final_step(origin, text, log);
                    self.proofs.push(log.proof(last, Substitution::new()));
                    self.complete = true;
                    is_answer = true;
                }
            }
            Some(answer_predicate) => {
                if is_empty {
                    return Err(FolError::InconsistentKnowledgeBase);
                }
                let answer = unit.filter(|lit| {
                    !lit.atom().is_equality() && lit.atom().symbolic_name() == answer_predicate
                });
                if let Some(lit) = answer {
                    let bindings: Substitution = self
                        .answer_variables
                        .iter()
                        .cloned()
                        .zip(lit.atom().args().iter().cloned())
                        .collect();
                    if !self
                        .proofs
                        .iter()
                        .any(|proof| proof.answer_bindings() == &bindings)
                    {
                        info!("Found answer {}", bindings);
                        let last = Self::final_step(origin, text, log);
                        self.proofs.push(log.proof(last, bindings));
                    }
                    is_answer = true;
                }
            }
        }

        if !self.complete && self.resource_limits.is_exceeded() {
            info!("Query time limit reached");
            self.complete = true;
            self.timed_out = true;
        }
        Ok(is_answer)
    }

    fn final_step(origin: Option<StepId>, text: &dyn Display, log: &ProofLog) -> StepId {
        origin.unwrap_or_else(|| log.record(ProofRule::Goal, text.to_string(), "", &[]))
    }

    pub(crate) fn into_result(self) -> InferenceResult {
        InferenceResult::new(self.proofs, self.timed_out)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::{
        clause::{Clause, Literal},
        kb::KnowledgeBase,
        proofs::{Proof, ProofLog},
        sentence::Sentence,
        term::{Atom, Term},
    };

    use super::{AnswerHandler, InferenceResult, ResourceLimitConfig};

    fn proof() -> Proof {
        let log = ProofLog::new();
        let step = log.record(crate::proofs::ProofRule::Goal, "⊥", "", &[]);
        log.proof(step, Default::default())
    }

    #[test]
    fn result_states_are_exclusive() {
        let false_result = InferenceResult::new(vec![], false);
        assert!(false_result.is_possibly_false());
        assert!(!false_result.is_true());

        let unknown = InferenceResult::new(vec![], true);
        assert!(unknown.is_unknown_due_to_timeout());
        assert!(!unknown.is_possibly_false());

        let partial = InferenceResult::new(vec![proof()], true);
        assert!(partial.is_true());
        assert!(partial.is_partial_result_due_to_timeout());
        assert!(!partial.is_unknown_due_to_timeout());
    }

    #[test]
    fn answer_clauses_carry_bindings() {
        let mut kb = KnowledgeBase::new();
        let log = kb.proof_log().clone();
        let query = Sentence::from(Atom::predicate("King", vec![Term::var("x")]));
        let (mut handler, goals) =
            AnswerHandler::new(&mut kb, &query, &ResourceLimitConfig::default(), &log);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].len(), 2);

        let answer_predicate = handler.answer_predicate().unwrap().to_string();
        let answer = Clause::new(vec![Literal::positive(Atom::predicate(
            answer_predicate.as_str(),
            vec![Term::constant("John")],
        ))]);
        assert!(handler.is_answer_clause(&answer, &log).unwrap());
        assert!(handler.is_answer_clause(&answer, &log).unwrap());
        assert!(!handler.is_complete());
        assert!(handler.is_answer_clause(&Clause::empty(), &log).is_err());

        let result = handler.into_result();
        assert_eq!(result.proofs().len(), 1);
        assert_eq!(
            result.proofs()[0].answer_bindings().to_string(),
            format!("{{{}=John}}", query.variables()[0])
        );
    }

    #[test]
    fn zero_time_limit_completes_immediately() {
        let mut kb = KnowledgeBase::new();
        let log = kb.proof_log().clone();
        let query = Sentence::from(Atom::predicate("P", vec![]));
        let config = ResourceLimitConfig::default().with_duration(Some(Duration::ZERO));
        let (mut handler, goals) = AnswerHandler::new(&mut kb, &query, &config, &log);
        assert_eq!(handler.answer_predicate(), None);
        assert!(!handler.is_answer_clause(&goals[0], &log).unwrap());
        assert!(handler.is_complete());
        assert!(handler.into_result().is_unknown_due_to_timeout());
    }
}
