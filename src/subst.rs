//! ## Substitutions
//! This module contains an implementation of substitutions on first order constructs, the key
//! things exposed are:
//! - [Substitution] which is the representation of a substitution, mapping some variables to new
//!   terms to replace them with.
//! - [Substitutable] which may be implemented for types that have some notion of substitution.
//!
//! Substitutions produced by the unifier are kept fully cascaded, that is no bound variable
//! occurs in the range, so applying them is a single pass over the target.

use std::fmt::Display;

use rustc_hash::FxHashMap;

use crate::{
    sentence::Sentence,
    term::{Atom, Term, Variable},
};

/// A first order substitution, mapping variables to terms to replace them with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    map: FxHashMap<Variable, Term>,
}

impl Substitution {
    /// Create a new empty substitution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `var` with `term` in the substitution.
    pub fn insert(&mut self, var: Variable, term: Term) {
        self.map.insert(var, term);
    }

    /// Obtain the term associated with `var` if it exists.
    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.map.get(var)
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.map.contains_key(var)
    }

    /// Return `true` if the substitution is an identity substitution.
    pub fn is_nop(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.map.iter()
    }

    pub fn domain(&self) -> impl Iterator<Item = &Variable> {
        self.map.keys()
    }

    /// The bindings ordered by variable, for stable output.
    pub fn sorted(&self) -> Vec<(&Variable, &Term)> {
        let mut bindings: Vec<_> = self.map.iter().collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));
        bindings
    }

    /// Check whether every binding maps a variable to a variable.
    pub fn is_renaming(&self) -> bool {
        self.map.values().all(Term::is_variable)
    }

    /// Re-apply the substitution to its own range until no bound variable remains in it.
    /// Termination relies on the range being free of cycles, which the occurs check guarantees.
    pub fn cascade(&mut self) {
        loop {
            let snapshot = self.clone();
            let mut modified = false;
            for value in self.map.values_mut() {
                let new_value = value.clone().subst_with(&snapshot);
                if new_value != *value {
                    *value = new_value;
                    modified = true;
                }
            }
            if !modified {
                break;
            }
        }
    }

    /// Add `{ var |-> term }` and cascade it through the existing bindings.
    pub fn compose_binding(&mut self, var: Variable, term: Term) {
        self.map.insert(var, term);
        self.cascade();
    }

    /// Compute the substitution whose effect is applying `self` first and `then` afterwards:
    /// `then` is applied to the range of `self`, bindings of `then` for variables outside the
    /// domain of `self` are adjoined, and the result is cascaded.
    pub fn compose(&self, then: &Substitution) -> Substitution {
        let mut composed = Substitution::new();
        for (var, term) in self.map.iter() {
            composed.insert(var.clone(), term.clone().subst_with(then));
        }
        for (var, term) in then.map.iter() {
            if !self.map.contains_key(var) {
                composed.insert(var.clone(), term.clone());
            }
        }
        composed.cascade();
        composed
    }

    /// Swap domain and range of a variable renaming, bindings to non variables are skipped.
    pub fn inverse_renaming(&self) -> Substitution {
        let mut inverse = Substitution::new();
        for (var, term) in self.map.iter() {
            if let Term::Variable(target) = term {
                inverse.insert(target.clone(), Term::Variable(var.clone()));
            }
        }
        inverse
    }
}

impl FromIterator<(Variable, Term)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

impl Display for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (idx, (var, term)) in self.sorted().into_iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{var}={term}")?;
        }
        f.write_str("}")
    }
}

/// A type that has a substitution operation on itself.
pub trait Substitutable {
    /// Apply `subst` to `self`.
    fn subst_with(self, subst: &Substitution) -> Self;
}

impl Substitutable for Term {
    /// Apply `subst` to this term, if the substitution fulfills [Substitution::is_nop] or the term
    /// is ground this is a no-op.
    fn subst_with(self, subst: &Substitution) -> Self {
        if subst.is_nop() {
            return self;
        }
        match self {
            Term::Constant(_) => self,
            Term::Variable(var) => match subst.get(&var) {
                Some(term) => term.clone(),
                None => Term::Variable(var),
            },
            Term::Function { name, args } => Term::Function {
                name,
                args: args.subst_with(subst),
            },
        }
    }
}

impl<T: Substitutable> Substitutable for Vec<T> {
    fn subst_with(self, subst: &Substitution) -> Self {
        self.into_iter().map(|t| t.subst_with(subst)).collect()
    }
}

impl Substitutable for Atom {
    fn subst_with(self, subst: &Substitution) -> Self {
        match self {
            Atom::Predicate { name, args } => Atom::Predicate {
                name,
                args: args.subst_with(subst),
            },
            Atom::Equality([lhs, rhs]) => {
                Atom::Equality([lhs.subst_with(subst), rhs.subst_with(subst)])
            }
        }
    }
}

impl Substitutable for Sentence {
    /// Quantified variables are renamed when they are mapped to another variable and dropped
    /// when mapped to anything else, a quantifier left without variables disappears.
    fn subst_with(self, subst: &Substitution) -> Self {
        match self {
            Sentence::Atom(atom) => Sentence::Atom(atom.subst_with(subst)),
            Sentence::Not(inner) => Sentence::not((*inner).subst_with(subst)),
            Sentence::Connected(connective, left, right) => Sentence::connected(
                connective,
                (*left).subst_with(subst),
                (*right).subst_with(subst),
            ),
            Sentence::Quantified(quantifier, vars, body) => {
                let body = (*body).subst_with(subst);
                let vars: Vec<Variable> = vars
                    .into_iter()
                    .filter_map(|var| match subst.get(&var) {
                        Some(Term::Variable(renamed)) => Some(renamed.clone()),
                        Some(_) => None,
                        None => Some(var),
                    })
                    .collect();
                if vars.is_empty() {
                    body
                } else {
                    Sentence::quantified(quantifier, vars, body)
                }
            }
        }
    }
}
