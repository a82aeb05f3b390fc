//! ## Knowledge Base
//! The [KnowledgeBase] is the aggregate everything else works on. It owns:
//! - the sentences it was told and the clauses they convert to, deduplicated up to renaming
//! - the definite and implication clauses used by forward and backward chaining
//! - an index of unit clauses keyed by polarity and predicate name for fact retrieval
//! - the [Domain], the [IndexicalAllocator] and the [ProofLog] of its premises
//! - the [InferenceProcedure] that [KnowledgeBase::ask] delegates to
//!
//! Clauses only ever enter through [KnowledgeBase::tell], there is no retraction.

use std::sync::Arc;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::{
    clause::{Clause, ClauseSet, Literal},
    cnf::{Cnf, convert_to_cnf},
    domain::Domain,
    error::{FolError, Result},
    inference::{InferenceProcedure, InferenceResult},
    otter::FolOtterLikeTheoremProver,
    proofs::{ProofLog, ProofRule, StepId},
    sentence::Sentence,
    standardize::{IndexicalAllocator, standardize_sentence},
    subst::{Substitutable, Substitution},
    term::{Atom, Term, Variable},
};

#[derive(Debug)]
pub struct KnowledgeBase {
    domain: Domain,
    alloc: IndexicalAllocator,
    proof_log: ProofLog,
    inference_procedure: Arc<dyn InferenceProcedure + Send + Sync>,
    original_sentences: Vec<Sentence>,
    clauses: ClauseSet,
    definite_clauses: Vec<Clause>,
    implication_clauses: Vec<Clause>,
    facts: FxHashMap<String, Vec<Clause>>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeBase {
    /// An empty knowledge base answering queries with the OTTER like prover.
    pub fn new() -> Self {
        Self::with_inference_procedure(Arc::new(FolOtterLikeTheoremProver::default()))
    }

    pub fn with_inference_procedure(
        inference_procedure: Arc<dyn InferenceProcedure + Send + Sync>,
    ) -> Self {
        Self {
            domain: Domain::new(),
            alloc: IndexicalAllocator::new(),
            proof_log: ProofLog::new(),
            inference_procedure,
            original_sentences: Vec::new(),
            clauses: ClauseSet::new(),
            definite_clauses: Vec::new(),
            implication_clauses: Vec::new(),
            facts: FxHashMap::default(),
        }
    }

    pub fn set_inference_procedure(
        &mut self,
        inference_procedure: Arc<dyn InferenceProcedure + Send + Sync>,
    ) {
        self.inference_procedure = inference_procedure;
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn domain_mut(&mut self) -> &mut Domain {
        &mut self.domain
    }

    pub fn allocator_mut(&mut self) -> &mut IndexicalAllocator {
        &mut self.alloc
    }

    /// The log holding the premise and clausification steps of the told sentences. Procedures
    /// work on a clone of it so that the steps of one query never leak into the next.
    pub fn proof_log(&self) -> &ProofLog {
        &self.proof_log
    }

    /// Add `sentence` to the knowledge base. The sentence is rejected as a whole, leaving the
    /// knowledge base untouched, if its clauses are unsatisfiable on their own.
    pub fn tell(&mut self, sentence: Sentence) -> Result<()> {
        if self.original_sentences.contains(&sentence) {
            debug!("Already told {}", sentence);
            return Ok(());
        }

        let mut domain = self.domain.clone();
        domain.register_sentence(&sentence);
        let cnf = convert_to_cnf(&sentence, &mut domain);
        if is_unsatisfiable(cnf.clauses(), &mut self.alloc.clone()) {
            return Err(FolError::UnsatisfiableAssertion {
                sentence: sentence.to_string(),
            });
        }
        self.domain = domain;

        let premise = self
            .proof_log
            .record(ProofRule::Premise, sentence.to_string(), "", &[]);
        info!("Told {}", sentence);
        for clause in cnf.into_clauses() {
            let clause = clause.renamed(&mut self.alloc);
            if self.clauses.contains(&clause) {
                continue;
            }
            let step =
                self.proof_log
                    .record(ProofRule::Clausify, clause.to_string(), "", &[premise]);
            self.add_clause(clause.with_origin(step));
        }
        self.original_sentences.push(sentence);
        Ok(())
    }

    pub fn tell_all(&mut self, sentences: impl IntoIterator<Item = Sentence>) -> Result<()> {
        sentences
            .into_iter()
            .try_for_each(|sentence| self.tell(sentence))
    }

    fn add_clause(&mut self, clause: Clause) {
        if !self.clauses.insert(clause.clone()) {
            return;
        }
        debug!("Added clause {}", clause);
        if let [lit] = clause.literals() {
            self.facts
                .entry(lit.fact_key())
                .or_default()
                .push(clause.clone());
        }
        if clause.is_implication_definite() {
            self.implication_clauses.push(clause.clone());
        }
        if clause.is_definite() {
            self.definite_clauses.push(clause);
        }
    }

    /// Add a fact derived by an inference procedure. `origin` must be a step of the log that is
    /// installed with [Self::replace_proof_log] afterwards.
    pub(crate) fn add_derived_fact(&mut self, fact: Literal, origin: StepId) {
        let clause = Clause::new(vec![fact]).renamed(&mut self.alloc);
        self.add_clause(clause.with_origin(origin));
    }

    /// Install a log that extends the current one.
    pub(crate) fn replace_proof_log(&mut self, log: ProofLog) {
        debug_assert!(log.len() >= self.proof_log.len());
        self.proof_log = log;
    }

    /// Answer `query` with the configured inference procedure. The query is standardized apart
    /// first, answer bindings are reported for the variables of the query as given.
    pub fn ask(&mut self, query: &Sentence) -> Result<InferenceResult> {
        let standardized = standardize_sentence(query, &mut self.alloc);
        let procedure = Arc::clone(&self.inference_procedure);
        info!("Asking {} with {}", query, procedure.name());
        let mut result = procedure.ask(self, &standardized.standardized)?;

        for proof in result.proofs_mut() {
            let bindings = proof
                .answer_bindings()
                .iter()
                .filter_map(|(var, term)| {
                    let original = standardized.reverse.get(var)?.as_variable()?.clone();
                    Some((original, term.clone().subst_with(&standardized.reverse)))
                })
                .collect();
            proof.replace_answer_bindings(bindings);
        }
        info!("{} proof(s) for {}", result.proofs().len(), query);
        Ok(result)
    }

    /// All substitutions under which `literal` unifies with a stored fact.
    pub fn fetch(&self, literal: &Literal) -> Vec<Substitution> {
        self.fetch_facts(literal)
            .into_iter()
            .map(|(theta, _)| theta)
            .collect()
    }

    /// Like [Self::fetch], together with the step that produced each fact.
    pub(crate) fn fetch_facts(&self, literal: &Literal) -> Vec<(Substitution, Option<StepId>)> {
        let Some(facts) = self.facts.get(&literal.fact_key()) else {
            return Vec::new();
        };
        facts
            .iter()
            .filter_map(|fact| {
                let fact_lit = fact.literals().first()?;
                let theta = literal.atom().unify(fact_lit.atom())?;
                Some((theta, fact.origin()))
            })
            .collect()
    }

    /// All substitutions satisfying the conjunction of `literals` against the stored facts,
    /// computed as a nested loop join from left to right.
    pub fn fetch_all(&self, literals: &[Literal]) -> Vec<Substitution> {
        self.fetch_all_facts(literals)
            .into_iter()
            .map(|(theta, _)| theta)
            .collect()
    }

    /// Like [Self::fetch_all], together with the steps of the facts each solution used.
    pub(crate) fn fetch_all_facts(&self, literals: &[Literal]) -> Vec<(Substitution, Vec<StepId>)> {
        let mut acc = Vec::new();
        self.fetch_join(literals, Substitution::new(), Vec::new(), &mut acc);
        acc
    }

    fn fetch_join(
        &self,
        literals: &[Literal],
        theta: Substitution,
        origins: Vec<StepId>,
        acc: &mut Vec<(Substitution, Vec<StepId>)>,
    ) {
        let Some((first, rest)) = literals.split_first() else {
            acc.push((theta, origins));
            return;
        };
        let first = first.clone().subst_with(&theta);
        for (binding, origin) in self.fetch_facts(&first) {
            let mut origins = origins.clone();
            origins.extend(origin);
            self.fetch_join(rest, theta.compose(&binding), origins, acc);
        }
    }

    /// Whether `literal` is some stored fact up to renaming of variables.
    pub fn is_renaming_of_fact(&self, literal: &Literal) -> bool {
        self.facts.get(&literal.fact_key()).is_some_and(|facts| {
            is_renaming(
                literal,
                facts.iter().filter_map(|fact| fact.literals().first()),
            )
        })
    }

    pub fn original_sentences(&self) -> &[Sentence] {
        &self.original_sentences
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn number_of_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn definite_clauses(&self) -> &[Clause] {
        &self.definite_clauses
    }

    pub fn implication_clauses(&self) -> &[Clause] {
        &self.implication_clauses
    }

    pub fn fact_count(&self) -> usize {
        self.facts.values().map(Vec::len).sum()
    }

    /// Forget everything that was told. The domain and the inference procedure are kept.
    pub fn clear(&mut self) {
        self.proof_log = ProofLog::new();
        self.original_sentences.clear();
        self.clauses = ClauseSet::new();
        self.definite_clauses.clear();
        self.implication_clauses.clear();
        self.facts.clear();
    }

    /// A fresh answer predicate applied to the variables of `sentence`.
    pub fn create_answer_literal(&mut self, sentence: &Sentence) -> Atom {
        let name = self.domain.add_answer_literal();
        let args = sentence.variables().into_iter().map(Term::Variable).collect();
        Atom::predicate(name, args)
    }

    /// Convert `sentence` to clauses, Skolem symbols are registered with the domain.
    pub fn convert_to_clauses(&mut self, sentence: &Sentence) -> Cnf {
        self.domain.register_sentence(sentence);
        convert_to_cnf(sentence, &mut self.domain)
    }

    pub fn collect_all_variables(&self, sentence: &Sentence) -> Vec<Variable> {
        sentence.variables()
    }
}

/// Whether some candidate has the polarity of `literal` and unifies with it through a pure
/// variable renaming.
pub fn is_renaming<'a>(literal: &Literal, candidates: impl IntoIterator<Item = &'a Literal>) -> bool {
    candidates.into_iter().any(|candidate| {
        candidate.polarity() == literal.polarity()
            && literal
                .atom()
                .unify(candidate.atom())
                .is_some_and(|theta| theta.is_renaming())
    })
}

// An empty clause, or two unit clauses that resolve to one. Renaming apart draws from `alloc`, so
// a rejected tell must pass a scratch copy.
fn is_unsatisfiable(clauses: &[Clause], alloc: &mut IndexicalAllocator) -> bool {
    if clauses.iter().any(Clause::is_empty) {
        return true;
    }
    let units: Vec<&Clause> = clauses.iter().filter(|c| c.is_unit()).collect();
    for (idx, unit) in units.iter().enumerate() {
        for other in units[idx + 1..].iter() {
            let other = other.renamed(alloc);
            let (lit, other_lit) = (&unit.literals()[0], &other.literals()[0]);
            if lit.polarity() != other_lit.polarity()
                && lit.atom().unify(other_lit.atom()).is_some()
            {
                return true;
            }
        }
    }
    false
}
