//! ## Domain
//! The [Domain] keeps track of the constant, function and predicate symbols known to a knowledge
//! base and hands out fresh names for Skolem constants, Skolem functions and answer literals.
//! Fresh names are guaranteed not to clash with any symbol registered so far.

use rustc_hash::FxHashSet;

use crate::{
    sentence::Sentence,
    term::{Atom, Term},
};

const SKOLEM_CONSTANT_PREFIX: &str = "SC";
const SKOLEM_FUNCTION_PREFIX: &str = "SF";
const ANSWER_LITERAL_PREFIX: &str = "Answer";

#[derive(Debug, Clone, Default)]
pub struct Domain {
    constants: FxHashSet<String>,
    functions: FxHashSet<String>,
    predicates: FxHashSet<String>,
    skolem_constant_count: usize,
    skolem_function_count: usize,
    answer_literal_count: usize,
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_constant(&mut self, name: impl Into<String>) {
        self.constants.insert(name.into());
    }

    pub fn add_function(&mut self, name: impl Into<String>) {
        self.functions.insert(name.into());
    }

    pub fn add_predicate(&mut self, name: impl Into<String>) {
        self.predicates.insert(name.into());
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn is_predicate(&self, name: &str) -> bool {
        self.predicates.contains(name)
    }

    fn is_known(&self, name: &str) -> bool {
        self.is_constant(name) || self.is_function(name) || self.is_predicate(name)
    }

    fn fresh_name(&self, prefix: &str, counter: &mut usize) -> String {
        loop {
            let name = format!("{prefix}{counter}");
            *counter += 1;
            if !self.is_known(&name) {
                return name;
            }
        }
    }

    /// Allocate and register a fresh Skolem constant.
    pub fn add_skolem_constant(&mut self) -> String {
        let mut counter = self.skolem_constant_count;
        let name = self.fresh_name(SKOLEM_CONSTANT_PREFIX, &mut counter);
        self.skolem_constant_count = counter;
        self.constants.insert(name.clone());
        name
    }

    /// Allocate and register a fresh Skolem function symbol.
    pub fn add_skolem_function(&mut self) -> String {
        let mut counter = self.skolem_function_count;
        let name = self.fresh_name(SKOLEM_FUNCTION_PREFIX, &mut counter);
        self.skolem_function_count = counter;
        self.functions.insert(name.clone());
        name
    }

    /// Allocate and register a fresh answer literal predicate.
    pub fn add_answer_literal(&mut self) -> String {
        let mut counter = self.answer_literal_count;
        let name = self.fresh_name(ANSWER_LITERAL_PREFIX, &mut counter);
        self.answer_literal_count = counter;
        self.predicates.insert(name.clone());
        name
    }

    fn register_term(&mut self, term: &Term) {
        match term {
            Term::Constant(name) => self.add_constant(name.as_str()),
            Term::Variable(_) => {}
            Term::Function { name, args } => {
                self.add_function(name.as_str());
                args.iter().for_each(|arg| self.register_term(arg));
            }
        }
    }

    fn register_atom(&mut self, atom: &Atom) {
        if let Atom::Predicate { name, .. } = atom {
            self.add_predicate(name.as_str());
        }
        atom.args().iter().for_each(|arg| self.register_term(arg));
    }

    /// Register every symbol occurring in `sentence`.
    pub fn register_sentence(&mut self, sentence: &Sentence) {
        match sentence {
            Sentence::Atom(atom) => self.register_atom(atom),
            Sentence::Not(inner) => self.register_sentence(inner),
            Sentence::Connected(_, left, right) => {
                self.register_sentence(left);
                self.register_sentence(right);
            }
            Sentence::Quantified(_, _, body) => self.register_sentence(body),
        }
    }
}
