//! ## OTTER like Prover
//! A set of support prover in the style of OTTER. The clauses of the knowledge base are usable
//! from the start, the negated query forms the set of support. The main loop:
//! 1. picks the lightest clause of the set of support and moves it into the usable clauses
//! 2. resolves it, and optionally paramodulates it, against every usable clause
//! 3. simplifies the results with the configured demodulators, drops tautologies and checks for
//!    answers
//! 4. adds the factors of what remains to the set of support with forward and backward
//!    subsumption, looking for an immediate unit refutation of each new clause
//!
//! The search ends when the set of support runs empty, an answer is complete or time runs out.

use std::sync::Arc;

use log::{debug, info};

use crate::{
    clause::{Clause, ClauseSet, Literal},
    clause_queue::{ClauseQueue, FewestLiterals, LightestClauseHeuristic},
    error::Result,
    inference::{AnswerHandler, InferenceProcedure, InferenceResult, ResourceLimitConfig},
    kb::KnowledgeBase,
    modulation::{demodulate_clause, paramodulants},
    proofs::{ProofLog, ProofRule},
    sentence::Sentence,
    standardize::IndexicalAllocator,
    subsume::find_subsumed_clauses,
    term::{Atom, Term, Variable},
};

// Demodulators such as `F(x) = x` rewrite forever.
const MAX_REWRITES_PER_DEMODULATOR: usize = 1000;

/// Simplifies inferred clauses by demodulation. Each demodulator is applied until it no longer
/// rewrites the clause.
#[derive(Debug, Clone, Default)]
pub struct ClauseSimplifier {
    demodulators: Vec<Atom>,
}

impl ClauseSimplifier {
    /// A simplifier rewriting with `demodulators`, atoms that are not equalities are ignored.
    pub fn new(demodulators: Vec<Atom>) -> Self {
        Self {
            demodulators: demodulators
                .into_iter()
                .filter(Atom::is_equality)
                .collect(),
        }
    }

    pub fn demodulators(&self) -> &[Atom] {
        &self.demodulators
    }

    pub fn simplify(&self, clause: Clause, log: &ProofLog) -> Clause {
        let mut simplified = clause;
        for demodulator in self.demodulators.iter() {
            for _ in 0..MAX_REWRITES_PER_DEMODULATOR {
                match demodulate_clause(demodulator, &simplified, log) {
                    Some(rewritten) => simplified = rewritten,
                    None => break,
                }
            }
        }
        simplified
    }
}

#[derive(Debug, Clone)]
pub struct FolOtterLikeTheoremProver {
    resource_config: ResourceLimitConfig,
    use_paramodulation: bool,
    heuristic: Arc<dyn LightestClauseHeuristic + Send + Sync>,
    simplifier: ClauseSimplifier,
}

impl Default for FolOtterLikeTheoremProver {
    fn default() -> Self {
        Self {
            resource_config: ResourceLimitConfig::default(),
            use_paramodulation: true,
            heuristic: Arc::new(FewestLiterals),
            simplifier: ClauseSimplifier::default(),
        }
    }
}

impl FolOtterLikeTheoremProver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_config(mut self, resource_config: ResourceLimitConfig) -> Self {
        self.resource_config = resource_config;
        self
    }

    pub fn with_paramodulation(mut self, use_paramodulation: bool) -> Self {
        self.use_paramodulation = use_paramodulation;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Arc<dyn LightestClauseHeuristic + Send + Sync>) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_simplifier(mut self, simplifier: ClauseSimplifier) -> Self {
        self.simplifier = simplifier;
        self
    }

    pub fn is_use_paramodulation(&self) -> bool {
        self.use_paramodulation
    }
}

impl InferenceProcedure for FolOtterLikeTheoremProver {
    fn name(&self) -> &'static str {
        "OTTER like prover"
    }

    fn ask(&self, kb: &mut KnowledgeBase, query: &Sentence) -> Result<InferenceResult> {
        let log = kb.proof_log().clone();
        let (answers, goals) = AnswerHandler::new(kb, query, &self.resource_config, &log);

        let kb_clauses: Vec<Clause> = kb.clauses().cloned().collect();
        let alloc = kb.allocator_mut();

        let mut usable = ClauseSet::new();
        for clause in kb_clauses.iter() {
            let clause = clause.standardize_apart(alloc, &log);
            for factor in clause.factors(alloc, &log) {
                usable.insert(factor.clone());
            }
        }
        if self.use_paramodulation {
            let x = Term::Variable(alloc.fresh(&Variable::new("x")));
            let reflexivity = Clause::new(vec![Literal::positive(Atom::equality(x.clone(), x))]);
            let step = log.record(
                ProofRule::Premise,
                reflexivity.to_string(),
                "reflexivity",
                &[],
            );
            usable.insert(reflexivity.with_origin(step));
        }

        let mut support = ClauseSet::new();
        for goal in goals.iter() {
            for factor in goal.factors(alloc, &log) {
                support.insert(factor.clone());
            }
        }

        for subsumed in find_subsumed_clauses(usable.iter()) {
            usable.remove(&subsumed);
        }
        for subsumed in find_subsumed_clauses(support.iter()) {
            support.remove(&subsumed);
        }
        let mut sos = ClauseQueue::new(Arc::clone(&self.heuristic));
        for clause in support.iter() {
            sos.push(clause.clone());
        }
        info!(
            "Starting with {} usable clauses and {} clauses in the set of support",
            usable.len(),
            sos.len()
        );

        let mut state = OtterState {
            prover: self,
            usable,
            sos,
            answers,
            alloc,
            log: &log,
        };
        state.run()?;
        Ok(state.answers.into_result())
    }
}

struct OtterState<'a> {
    prover: &'a FolOtterLikeTheoremProver,
    usable: ClauseSet,
    sos: ClauseQueue,
    answers: AnswerHandler,
    alloc: &'a mut IndexicalAllocator,
    log: &'a ProofLog,
}

impl OtterState<'_> {
    fn run(&mut self) -> Result<()> {
        while !self.answers.is_complete() {
            let Some(given) = self.sos.pop() else {
                info!("Set of support exhausted");
                break;
            };
            info!("Given clause: {}", given);
            self.usable.insert(given.clone());
            let usable: Vec<Clause> = self.usable.iter().cloned().collect();
            let inferred = self.infer(&given, &usable);
            self.process(inferred)?;
        }
        Ok(())
    }

    fn infer(&mut self, clause: &Clause, others: &[Clause]) -> Vec<Clause> {
        let mut result = ClauseSet::new();
        for other in others {
            for resolvent in clause.binary_resolvents(other, self.alloc, self.log) {
                result.insert(resolvent);
            }
            if self.prover.use_paramodulation {
                for paramodulant in paramodulants(clause, other, self.alloc, self.log) {
                    result.insert(paramodulant);
                }
            }
        }
        result.iter().cloned().collect()
    }

    fn process(&mut self, clauses: Vec<Clause>) -> Result<()> {
        for clause in clauses {
            let clause = self.prover.simplifier.simplify(clause, self.log);
            if clause.is_tautology() {
                continue;
            }
            if !self.answers.is_answer_clause(&clause, self.log)? && !self.is_known(&clause) {
                let factors = clause.factors(self.alloc, self.log).to_vec();
                for factor in factors {
                    if self.is_known(&factor) {
                        continue;
                    }
                    self.add_to_sos(factor.clone());
                    self.look_for_unit_refutation(&factor)?;
                }
            }
            if self.answers.is_complete() {
                break;
            }
        }
        Ok(())
    }

    fn is_known(&self, clause: &Clause) -> bool {
        self.sos.contains(clause) || self.usable.contains(clause)
    }

    // A new clause that is one literal away from an answer is resolved against all unit clauses
    // right away instead of waiting for it to become the given clause.
    fn look_for_unit_refutation(&mut self, clause: &Clause) -> Result<()> {
        let check = match self.answers.answer_predicate() {
            Some(answer) => {
                clause.len() == 2
                    && clause
                        .literals()
                        .iter()
                        .any(|lit| lit.atom().symbolic_name() == answer)
            }
            None => clause.is_unit(),
        };
        if !check {
            return Ok(());
        }

        let units: Vec<Clause> = self
            .sos
            .iter()
            .chain(self.usable.iter())
            .filter(|c| c.is_unit())
            .cloned()
            .collect();
        if units.is_empty() {
            return Ok(());
        }
        for inferred in self.infer(clause, &units) {
            let inferred = self.prover.simplifier.simplify(inferred, self.log);
            if inferred.is_tautology() {
                continue;
            }
            if !self.answers.is_answer_clause(&inferred, self.log)? && !self.is_known(&inferred) {
                self.add_to_sos(inferred);
            }
            if self.answers.is_complete() {
                break;
            }
        }
        Ok(())
    }

    fn add_to_sos(&mut self, clause: Clause) {
        if self
            .sos
            .iter()
            .chain(self.usable.iter())
            .any(|existing| existing.subsumes(&clause))
        {
            debug!("Forward subsumed: {}", clause);
            return;
        }
        let subsumed: Vec<Clause> = self
            .sos
            .iter()
            .chain(self.usable.iter())
            .filter(|existing| clause.subsumes(existing))
            .cloned()
            .collect();
        debug!("Adding to set of support: {}", clause);
        self.sos.push(clause);
        for existing in subsumed {
            debug!("Backward subsumed: {}", existing);
            if !self.sos.remove(&existing) {
                self.usable.remove(&existing);
            }
        }
    }
}
