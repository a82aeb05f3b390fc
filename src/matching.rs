//! # Matching
//! This module contains an implementation of a naive matching algorithm to determine a
//! substitution `sigma` s.t. `sigma(s) = t`. Only variables of the pattern `s` are ever bound,
//! which is what subsumption and demodulation need: the target must not be specialized.

use crate::{
    subst::Substitution,
    term::{Atom, Term},
};

impl Term {
    /// Attempt to compute a subsitution `sigma` s.t. `sigma(self) = other` where `sigma` strictly
    /// extends the already provided `subst` (if it was provided).
    pub fn matching_partial(&self, other: &Self, subst: Option<Substitution>) -> Option<Substitution> {
        let mut subst = subst.unwrap_or_default();
        let mut worklist = vec![(self, other)];
        while let Some((matcher, target)) = worklist.pop() {
            match (matcher, target) {
                (Term::Variable(var), _) => match subst.get(var) {
                    Some(matcher_value) => {
                        if matcher_value != target {
                            return None;
                        }
                    }
                    None => {
                        subst.insert(var.clone(), target.clone());
                    }
                },
                (Term::Constant(m_name), Term::Constant(t_name)) => {
                    if m_name != t_name {
                        return None;
                    }
                }
                (
                    Term::Function {
                        name: m_name,
                        args: m_args,
                    },
                    Term::Function {
                        name: t_name,
                        args: t_args,
                    },
                ) => {
                    if m_name != t_name || m_args.len() != t_args.len() {
                        return None;
                    }
                    worklist.extend(m_args.iter().zip(t_args.iter()));
                }
                _ => return None,
            }
        }
        Some(subst)
    }

    /// Attempt to compute a substitution `sigma` s.t. `sigma(self) = other`.
    pub fn matching(&self, other: &Self) -> Option<Substitution> {
        self.matching_partial(other, None)
    }
}

impl Atom {
    /// Attempt to compute a subsitution `sigma` s.t. `sigma(self) = other` extending `subst`.
    pub fn matching_partial(&self, other: &Self, subst: Option<Substitution>) -> Option<Substitution> {
        if self.is_equality() != other.is_equality()
            || self.symbolic_name() != other.symbolic_name()
            || self.arity() != other.arity()
        {
            return None;
        }
        let mut subst = subst;
        for (matcher, target) in self.args().iter().zip(other.args()) {
            subst = Some(matcher.matching_partial(target, subst)?);
        }
        Some(subst.unwrap_or_default())
    }

    /// Attempt to compute a substitution `sigma` s.t. `sigma(self) = other`.
    pub fn matching(&self, other: &Self) -> Option<Substitution> {
        self.matching_partial(other, None)
    }
}
