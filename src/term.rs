//! ## Terms and Atoms
//! This module contains the leaf level first order structures:
//! - [Variable], a named variable carrying an optional standardizing-apart index
//! - [Term], constants, variables and function applications
//! - [Atom], predicates and term equalities, the atomic sentences of the logic
//!
//! All of them are plain immutable values, every transformation builds new nodes.

use rustc_hash::FxHashSet;

/// The symbolic name used for [Atom::Equality].
pub const EQUALITY_SYMBOL: &str = "=";

/// A first order variable. Two variables are the same iff both their name and their index agree,
/// the index is assigned when a clause or query is standardized apart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    name: String,
    index: Option<u32>,
}

impl Variable {
    /// Create a variable that was never standardized apart.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// Create a variable with an explicit index.
    pub fn indexed(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// The same variable name with a different index.
    pub fn with_index(&self, index: u32) -> Self {
        Self::indexed(self.name.clone(), index)
    }
}

/// A first order term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Constant(String),
    Variable(Variable),
    Function { name: String, args: Vec<Term> },
}

impl Term {
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Constant(name.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(Variable::new(name))
    }

    pub fn function(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Function {
            name: name.into(),
            args,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(var) => Some(var),
            _ => None,
        }
    }

    /// The constant or function symbol, or the variable name.
    pub fn symbolic_name(&self) -> &str {
        match self {
            Term::Constant(name) | Term::Function { name, .. } => name,
            Term::Variable(var) => var.name(),
        }
    }

    /// The arguments of a function application, empty for everything else.
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Function { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Constant(_) => true,
            Term::Variable(_) => false,
            Term::Function { args, .. } => args.iter().all(Term::is_ground),
        }
    }

    /// Check whether `var` occurs syntactically anywhere in `self`.
    pub fn contains_variable(&self, var: &Variable) -> bool {
        match self {
            Term::Constant(_) => false,
            Term::Variable(v) => v == var,
            Term::Function { args, .. } => args.iter().any(|arg| arg.contains_variable(var)),
        }
    }

    /// Count the symbol occurrences in the term.
    pub fn weight(&self) -> usize {
        match self {
            Term::Constant(_) | Term::Variable(_) => 1,
            Term::Function { args, .. } => 1 + args.iter().map(Term::weight).sum::<usize>(),
        }
    }

    pub fn collect_vars_into(&self, acc: &mut VariableSet) {
        match self {
            Term::Constant(_) => {}
            Term::Variable(var) => acc.insert(var),
            Term::Function { args, .. } => {
                args.iter().for_each(|arg| arg.collect_vars_into(acc));
            }
        }
    }
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Term::Variable(var)
    }
}

/// An atomic sentence, either a predicate application or an equality between two terms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
    Predicate { name: String, args: Vec<Term> },
    Equality([Term; 2]),
}

impl Atom {
    pub fn predicate(name: impl Into<String>, args: Vec<Term>) -> Self {
        Atom::Predicate {
            name: name.into(),
            args,
        }
    }

    pub fn equality(lhs: Term, rhs: Term) -> Self {
        Atom::Equality([lhs, rhs])
    }

    /// The predicate name, or [EQUALITY_SYMBOL] for equalities.
    pub fn symbolic_name(&self) -> &str {
        match self {
            Atom::Predicate { name, .. } => name,
            Atom::Equality(_) => EQUALITY_SYMBOL,
        }
    }

    /// The argument terms, an equality has its two sides as arguments.
    pub fn args(&self) -> &[Term] {
        match self {
            Atom::Predicate { args, .. } => args,
            Atom::Equality(sides) => sides,
        }
    }

    pub fn arity(&self) -> usize {
        self.args().len()
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, Atom::Equality(_))
    }

    /// Rebuild the atom with the same symbol over new arguments.
    pub fn with_args(&self, args: Vec<Term>) -> Self {
        match self {
            Atom::Predicate { name, .. } => Atom::Predicate {
                name: name.clone(),
                args,
            },
            Atom::Equality(_) => {
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(lhs), Some(rhs)) => Atom::Equality([lhs, rhs]),
                    _ => unreachable!("equalities always have two sides"),
                }
            }
        }
    }

    pub fn is_ground(&self) -> bool {
        self.args().iter().all(Term::is_ground)
    }

    pub fn collect_vars_into(&self, acc: &mut VariableSet) {
        self.args().iter().for_each(|arg| arg.collect_vars_into(acc));
    }

    pub fn variables(&self) -> Vec<Variable> {
        let mut acc = VariableSet::new();
        self.collect_vars_into(&mut acc);
        acc.into_vec()
    }
}

/// A set of variables that remembers the order in which variables were first seen, answer
/// literals rely on this to line up their arguments with the query variables.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    seen: FxHashSet<Variable>,
    order: Vec<Variable>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: &Variable) {
        if self.seen.insert(var.clone()) {
            self.order.push(var.clone());
        }
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.seen.contains(var)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.order.iter()
    }

    pub fn into_vec(self) -> Vec<Variable> {
        self.order
    }
}

#[cfg(test)]
mod test {
    use super::{Atom, Term, Variable, VariableSet};

    #[test]
    fn variable_identity_includes_index() {
        let x = Variable::new("x");
        let x0 = Variable::indexed("x", 0);
        let x1 = x0.with_index(1);
        assert_ne!(x, x0);
        assert_ne!(x0, x1);
        assert_eq!(x1, Variable::indexed("x", 1));
        assert_eq!(x1.name(), "x");
    }

    #[test]
    fn ground_and_occurrence() {
        let x = Variable::new("x");
        let t = Term::function("F", vec![Term::constant("A"), Term::Variable(x.clone())]);
        assert!(!t.is_ground());
        assert!(t.contains_variable(&x));
        assert!(!t.contains_variable(&Variable::new("y")));
        assert!(Term::function("G", vec![Term::constant("A")]).is_ground());
        assert_eq!(t.weight(), 3);
    }

    #[test]
    fn variables_keep_first_occurrence_order() {
        let atom = Atom::predicate(
            "P",
            vec![
                Term::var("y"),
                Term::function("F", vec![Term::var("x"), Term::var("y")]),
                Term::var("z"),
            ],
        );
        let names: Vec<_> = atom.variables().iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, vec!["y", "x", "z"]);

        let mut set = VariableSet::new();
        set.insert(&Variable::new("a"));
        set.insert(&Variable::new("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn equality_is_a_binary_atom() {
        let eq = Atom::equality(Term::constant("A"), Term::var("x"));
        assert_eq!(eq.symbolic_name(), "=");
        assert_eq!(eq.arity(), 2);
        let rebuilt = eq.with_args(vec![Term::constant("B"), Term::constant("C")]);
        assert_eq!(
            rebuilt,
            Atom::equality(Term::constant("B"), Term::constant("C"))
        );
    }
}
