//! ## Sentences
//! First order sentences built on top of [Atom]. Like terms they are immutable values, the CNF
//! pipeline and substitution always produce fresh trees.

use crate::term::{Atom, Variable, VariableSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Connective {
    And,
    Or,
    Implies,
    Biconditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quantifier {
    ForAll,
    Exists,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sentence {
    Atom(Atom),
    Not(Box<Sentence>),
    Connected(Connective, Box<Sentence>, Box<Sentence>),
    Quantified(Quantifier, Vec<Variable>, Box<Sentence>),
}

impl Sentence {
    pub fn not(inner: Sentence) -> Self {
        Sentence::Not(Box::new(inner))
    }

    pub fn connected(connective: Connective, left: Sentence, right: Sentence) -> Self {
        Sentence::Connected(connective, Box::new(left), Box::new(right))
    }

    pub fn and(left: Sentence, right: Sentence) -> Self {
        Self::connected(Connective::And, left, right)
    }

    pub fn or(left: Sentence, right: Sentence) -> Self {
        Self::connected(Connective::Or, left, right)
    }

    pub fn implies(left: Sentence, right: Sentence) -> Self {
        Self::connected(Connective::Implies, left, right)
    }

    pub fn iff(left: Sentence, right: Sentence) -> Self {
        Self::connected(Connective::Biconditional, left, right)
    }

    pub fn quantified(quantifier: Quantifier, vars: Vec<Variable>, body: Sentence) -> Self {
        Sentence::Quantified(quantifier, vars, Box::new(body))
    }

    pub fn forall(vars: Vec<Variable>, body: Sentence) -> Self {
        Self::quantified(Quantifier::ForAll, vars, body)
    }

    pub fn exists(vars: Vec<Variable>, body: Sentence) -> Self {
        Self::quantified(Quantifier::Exists, vars, body)
    }

    /// Fold a non empty list of sentences with `connective`, associating to the left.
    pub fn fold(connective: Connective, sentences: Vec<Sentence>) -> Option<Self> {
        sentences
            .into_iter()
            .reduce(|acc, next| Self::connected(connective, acc, next))
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Sentence::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    pub fn is_atomic(&self) -> bool {
        self.as_atom().is_some()
    }

    /// Collect the variables occurring in the atoms of the sentence, in order of first occurrence.
    /// The variable lists of quantifiers themselves are not visited.
    pub fn collect_vars_into(&self, acc: &mut VariableSet) {
        match self {
            Sentence::Atom(atom) => atom.collect_vars_into(acc),
            Sentence::Not(inner) => inner.collect_vars_into(acc),
            Sentence::Connected(_, left, right) => {
                left.collect_vars_into(acc);
                right.collect_vars_into(acc);
            }
            Sentence::Quantified(_, _, body) => body.collect_vars_into(acc),
        }
    }

    pub fn variables(&self) -> Vec<Variable> {
        let mut acc = VariableSet::new();
        self.collect_vars_into(&mut acc);
        acc.into_vec()
    }
}

impl From<Atom> for Sentence {
    fn from(atom: Atom) -> Self {
        Sentence::Atom(atom)
    }
}
