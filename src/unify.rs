//! ## First Order Unification
//! This module implements recursive syntactic unification with an occurs check. Bindings are
//! cascaded through the substitution as soon as they are made, so a successful result is always
//! idempotent. The key functions are [Term::unify], [Atom::unify] and [unify_terms_with].

use log::debug;

use crate::{
    subst::Substitution,
    term::{Atom, Term, Variable},
};

fn unify_term(x: &Term, y: &Term, theta: &mut Substitution) -> bool {
    if x == y {
        return true;
    }
    match (x, y) {
        (Term::Variable(var), _) => unify_var(var, y, theta),
        (_, Term::Variable(var)) => unify_var(var, x, theta),
        (
            Term::Function {
                name: x_name,
                args: x_args,
            },
            Term::Function {
                name: y_name,
                args: y_args,
            },
        ) => x_name == y_name && unify_lists(x_args, y_args, theta),
        // Distinct constants, or a constant against a function application.
        _ => false,
    }
}

fn unify_lists(xs: &[Term], ys: &[Term], theta: &mut Substitution) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| unify_term(x, y, theta))
}

fn unify_var(var: &Variable, x: &Term, theta: &mut Substitution) -> bool {
    if let Some(bound) = theta.get(var).cloned() {
        return unify_term(&bound, x, theta);
    }
    if let Term::Variable(x_var) = x {
        if let Some(bound) = theta.get(x_var).cloned() {
            return unify_term(&Term::Variable(var.clone()), &bound, theta);
        }
    }
    if occurs_check(var, x, theta) {
        return false;
    }
    theta.compose_binding(var.clone(), x.clone());
    true
}

/// Check whether `var` occurs in `x`, following the bindings in `theta` transitively so chains
/// like `{ y |-> z, z |-> f(x) }` are caught for `x`.
fn occurs_check(var: &Variable, x: &Term, theta: &Substitution) -> bool {
    let mut visited = Vec::new();
    let mut worklist = vec![x];
    while let Some(term) = worklist.pop() {
        match term {
            Term::Constant(_) => {}
            Term::Variable(v) => {
                if v == var {
                    return true;
                }
                if !visited.contains(&v) {
                    visited.push(v);
                    if let Some(bound) = theta.get(v) {
                        worklist.push(bound);
                    }
                }
            }
            Term::Function { args, .. } => worklist.extend(args.iter()),
        }
    }
    false
}

fn unify_atom(x: &Atom, y: &Atom, theta: &mut Substitution) -> bool {
    match (x, y) {
        (
            Atom::Predicate {
                name: x_name,
                args: x_args,
            },
            Atom::Predicate {
                name: y_name,
                args: y_args,
            },
        ) => x_name == y_name && unify_lists(x_args, y_args, theta),
        (Atom::Equality(x_sides), Atom::Equality(y_sides)) => {
            unify_lists(x_sides, y_sides, theta)
        }
        _ => false,
    }
}

/// Unify two term lists elementwise starting from `theta`, failing on a length mismatch.
pub fn unify_terms_with(xs: &[Term], ys: &[Term], theta: Substitution) -> Option<Substitution> {
    let mut theta = theta;
    if unify_lists(xs, ys, &mut theta) {
        Some(theta)
    } else {
        None
    }
}

impl Term {
    /// Try to unify `self` and `other`, returning `Some(subst)` on success and `None` otherwise.
    pub fn unify(&self, other: &Self) -> Option<Substitution> {
        self.unify_with(other, Substitution::new())
    }

    /// Try to unify `self` and `other` extending the already computed `theta`.
    pub fn unify_with(&self, other: &Self, theta: Substitution) -> Option<Substitution> {
        let mut theta = theta;
        if unify_term(self, other, &mut theta) {
            Some(theta)
        } else {
            None
        }
    }
}

impl Atom {
    /// Try to unify `self` and `other`, returning `Some(subst)` on success and `None` otherwise.
    pub fn unify(&self, other: &Self) -> Option<Substitution> {
        self.unify_with(other, Substitution::new())
    }

    /// Try to unify `self` and `other` extending the already computed `theta`.
    pub fn unify_with(&self, other: &Self, theta: Substitution) -> Option<Substitution> {
        debug!("Unifying {} with {}", self, other);
        let mut theta = theta;
        let res = if unify_atom(self, other, &mut theta) {
            Some(theta)
        } else {
            None
        };
        debug!("Unification success? {}", res.is_some());
        res
    }
}

#[cfg(test)]
mod test {
    use crate::{
        subst::{Substitutable, Substitution},
        term::{Atom, Term, Variable},
    };

    use super::unify_terms_with;

    fn x() -> Term {
        Term::var("x")
    }

    fn y() -> Term {
        Term::var("y")
    }

    fn z() -> Term {
        Term::var("z")
    }

    fn a() -> Term {
        Term::constant("A")
    }

    fn f(args: Vec<Term>) -> Term {
        Term::function("F", args)
    }

    fn g(args: Vec<Term>) -> Term {
        Term::function("G", args)
    }

    fn assert_unifier(lhs: &Term, rhs: &Term) -> Substitution {
        let subst = lhs.unify(rhs).expect("terms should unify");
        assert_eq!(
            lhs.clone().subst_with(&subst),
            rhs.clone().subst_with(&subst)
        );
        subst
    }

    #[test]
    fn identical_terms() {
        let subst = assert_unifier(&f(vec![x()]), &f(vec![x()]));
        assert!(subst.is_nop());
    }

    #[test]
    fn ex_3_10_6() {
        let lhs = g(vec![x(), f(vec![x()])]);
        let rhs = g(vec![Term::constant("B"), y()]);
        let subst = assert_unifier(&lhs, &rhs);
        assert_eq!(
            subst.get(&Variable::new("y")),
            Some(&f(vec![Term::constant("B")]))
        );
    }

    #[test]
    fn ex_3_10_7() {
        let lhs = Term::function("H", vec![x(), y(), z()]);
        let rhs = Term::function(
            "H",
            vec![
                Term::function("K", vec![y(), y()]),
                Term::function("K", vec![z(), z()]),
                Term::function("K", vec![a(), a()]),
            ],
        );
        let subst = assert_unifier(&lhs, &rhs);
        // Bindings must be fully cascaded.
        assert!(subst.get(&Variable::new("x")).unwrap().is_ground());
    }

    #[test]
    fn occurs_check() {
        assert!(x().unify(&f(vec![x()])).is_none());
        assert!(f(vec![x()]).unify(&x()).is_none());
    }

    #[test]
    fn occurs_check_through_bindings() {
        // y |-> z, then z against f(y) must fail since z would have to contain itself.
        let lhs = vec![y(), z()];
        let rhs = vec![z(), f(vec![y()])];
        assert!(unify_terms_with(&lhs, &rhs, Substitution::new()).is_none());
    }

    #[test]
    fn clashes() {
        assert!(a().unify(&Term::constant("B")).is_none());
        assert!(f(vec![x()]).unify(&g(vec![x()])).is_none());
        assert!(f(vec![x()]).unify(&f(vec![x(), y()])).is_none());
        assert!(Term::constant("F").unify(&f(vec![])).is_none());
    }

    #[test]
    fn variable_chains_cascade() {
        let lhs = Atom::predicate("P", vec![x(), y(), z()]);
        let rhs = Atom::predicate("P", vec![y(), z(), a()]);
        let subst = lhs.unify(&rhs).unwrap();
        assert_eq!(subst.get(&Variable::new("x")), Some(&a()));
        assert_eq!(subst.get(&Variable::new("y")), Some(&a()));
        assert_eq!(lhs.subst_with(&subst), rhs.subst_with(&subst));
    }

    #[test]
    fn atoms() {
        let knows1 = Atom::predicate("Knows", vec![Term::constant("John"), x()]);
        let knows2 = Atom::predicate("Knows", vec![y(), Term::function("Mother", vec![y()])]);
        let subst = knows1.unify(&knows2).unwrap();
        assert_eq!(
            subst.get(&Variable::new("x")),
            Some(&Term::function("Mother", vec![Term::constant("John")]))
        );

        let eq = Atom::equality(x(), a());
        assert!(eq.unify(&Atom::predicate("=", vec![a(), a()])).is_none());
        assert!(eq.unify(&Atom::equality(Term::constant("B"), y())).is_some());
    }

    #[test]
    fn indexed_variables_are_distinct() {
        let x0 = Term::Variable(Variable::indexed("x", 0));
        let x1 = Term::Variable(Variable::indexed("x", 1));
        let subst = f(vec![x0.clone(), a()]).unify(&f(vec![x1.clone(), x1.clone()])).unwrap();
        assert_eq!(x0.subst_with(&subst), a());
    }
}
