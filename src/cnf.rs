//! ## Clausal Normal Form
//! Conversion of arbitrary sentences into a conjunction of clauses. The pipeline runs:
//! 1. implications out: `A => B` and `A <=> B` are rewritten with `¬`, `∧` and `∨`
//! 2. negations in: `¬` is pushed down to the atoms
//! 3. quantified variables that are bound twice are renamed apart
//! 4. quantifiers are removed, existentials become Skolem terms over the universals in scope
//! 5. `∨` is distributed over `∧`
//! 6. the resulting conjunction of disjunctions is collected into [Clause]s
//!
//! Every stage is a total recursive function over [Sentence] that builds a new tree.

use std::fmt::Display;

use log::debug;
use rustc_hash::FxHashSet;

use crate::{
    clause::{Clause, Literal},
    domain::Domain,
    sentence::{Connective, Quantifier, Sentence},
    subst::{Substitutable, Substitution},
    term::{Term, Variable},
};

const QUANTIFIER_VARIABLE_PREFIX: &str = "q";

/// A conjunction of clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, clause) in self.clauses.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ∧ ")?;
            }
            write!(f, "[{clause}]")?;
        }
        Ok(())
    }
}

/// Eliminate `=>` and `<=>`.
pub fn implications_out(sentence: &Sentence) -> Sentence {
    match sentence {
        Sentence::Atom(_) => sentence.clone(),
        Sentence::Not(inner) => Sentence::not(implications_out(inner)),
        Sentence::Connected(connective, left, right) => {
            let left = implications_out(left);
            let right = implications_out(right);
            match connective {
                Connective::Implies => Sentence::or(Sentence::not(left), right),
                Connective::Biconditional => Sentence::and(
                    Sentence::or(Sentence::not(left.clone()), right.clone()),
                    Sentence::or(left, Sentence::not(right)),
                ),
                _ => Sentence::connected(*connective, left, right),
            }
        }
        Sentence::Quantified(quantifier, vars, body) => {
            Sentence::quantified(*quantifier, vars.clone(), implications_out(body))
        }
    }
}

/// Push negations down to the atoms, assuming implications were already removed.
pub fn negations_in(sentence: &Sentence) -> Sentence {
    match sentence {
        Sentence::Atom(_) => sentence.clone(),
        Sentence::Not(inner) => negate(inner),
        Sentence::Connected(connective, left, right) => {
            Sentence::connected(*connective, negations_in(left), negations_in(right))
        }
        Sentence::Quantified(quantifier, vars, body) => {
            Sentence::quantified(*quantifier, vars.clone(), negations_in(body))
        }
    }
}

// The negation normal form of `¬inner`.
fn negate(inner: &Sentence) -> Sentence {
    match inner {
        Sentence::Atom(_) => Sentence::not(inner.clone()),
        Sentence::Not(double) => negations_in(double),
        Sentence::Connected(Connective::And, left, right) => {
            Sentence::or(negate(left), negate(right))
        }
        Sentence::Connected(Connective::Or, left, right) => {
            Sentence::and(negate(left), negate(right))
        }
        Sentence::Connected(_, _, _) => negate(&implications_out(inner)),
        Sentence::Quantified(Quantifier::ForAll, vars, body) => {
            Sentence::exists(vars.clone(), negate(body))
        }
        Sentence::Quantified(Quantifier::Exists, vars, body) => {
            Sentence::forall(vars.clone(), negate(body))
        }
    }
}

fn collect_all_variable_names(sentence: &Sentence, acc: &mut FxHashSet<String>) {
    match sentence {
        Sentence::Atom(atom) => {
            atom.variables().into_iter().for_each(|v| {
                acc.insert(v.name().to_string());
            });
        }
        Sentence::Not(inner) => collect_all_variable_names(inner, acc),
        Sentence::Connected(_, left, right) => {
            collect_all_variable_names(left, acc);
            collect_all_variable_names(right, acc);
        }
        Sentence::Quantified(_, vars, body) => {
            vars.iter().for_each(|v| {
                acc.insert(v.name().to_string());
            });
            collect_all_variable_names(body, acc);
        }
    }
}

struct QuantifierRenamer {
    seen: FxHashSet<Variable>,
    taken: FxHashSet<String>,
    counter: usize,
}

impl QuantifierRenamer {
    fn fresh(&mut self) -> Variable {
        loop {
            let name = format!("{QUANTIFIER_VARIABLE_PREFIX}{}", self.counter);
            self.counter += 1;
            if self.taken.insert(name.clone()) {
                return Variable::new(name);
            }
        }
    }

    fn standardize(&mut self, sentence: &Sentence) -> Sentence {
        match sentence {
            Sentence::Atom(_) => sentence.clone(),
            Sentence::Not(inner) => Sentence::not(self.standardize(inner)),
            Sentence::Connected(connective, left, right) => {
                let left = self.standardize(left);
                let right = self.standardize(right);
                Sentence::connected(*connective, left, right)
            }
            Sentence::Quantified(quantifier, vars, body) => {
                let mut renaming = Substitution::new();
                let mut new_vars = Vec::with_capacity(vars.len());
                for var in vars {
                    if self.seen.contains(var) {
                        let fresh = self.fresh();
                        renaming.insert(var.clone(), Term::Variable(fresh.clone()));
                        self.seen.insert(fresh.clone());
                        new_vars.push(fresh);
                    } else {
                        self.seen.insert(var.clone());
                        new_vars.push(var.clone());
                    }
                }
                let body = (**body).clone().subst_with(&renaming);
                Sentence::quantified(*quantifier, new_vars, self.standardize(&body))
            }
        }
    }
}

/// Rename quantified variables so that no variable is bound by two quantifiers.
pub fn standardize_quantifier_variables(sentence: &Sentence) -> Sentence {
    let mut taken = FxHashSet::default();
    collect_all_variable_names(sentence, &mut taken);
    let mut renamer = QuantifierRenamer {
        seen: FxHashSet::default(),
        taken,
        counter: 0,
    };
    renamer.standardize(sentence)
}

/// Drop universal quantifiers and replace existentially bound variables by Skolem terms over
/// the universal variables in scope.
pub fn remove_quantifiers(sentence: &Sentence, domain: &mut Domain) -> Sentence {
    remove_quantifiers_aux(sentence, &mut Vec::new(), domain)
}

fn remove_quantifiers_aux(sentence: &Sentence, universal_scope: &mut Vec<Variable>, domain: &mut Domain) -> Sentence {
    match sentence {
        Sentence::Atom(_) => sentence.clone(),
        Sentence::Not(inner) => Sentence::not(remove_quantifiers_aux(inner, universal_scope, domain)),
        Sentence::Connected(connective, left, right) => {
            let left = remove_quantifiers_aux(left, universal_scope, domain);
            let right = remove_quantifiers_aux(right, universal_scope, domain);
            Sentence::connected(*connective, left, right)
        }
        Sentence::Quantified(Quantifier::ForAll, vars, body) => {
            let depth = universal_scope.len();
            universal_scope.extend(vars.iter().cloned());
            let result = remove_quantifiers_aux(body, universal_scope, domain);
            universal_scope.truncate(depth);
            result
        }
        Sentence::Quantified(Quantifier::Exists, vars, body) => {
            let mut skolemization = Substitution::new();
            for var in vars {
                let skolem = if universal_scope.is_empty() {
                    Term::Constant(domain.add_skolem_constant())
                } else {
                    Term::function(
                        domain.add_skolem_function(),
                        universal_scope.iter().cloned().map(Term::Variable).collect(),
                    )
                };
                skolemization.insert(var.clone(), skolem);
            }
            let body = (**body).clone().subst_with(&skolemization);
            remove_quantifiers_aux(&body, universal_scope, domain)
        }
    }
}

/// Distribute `∨` over `∧` until no conjunction remains below a disjunction.
pub fn distribute_or_over_and(sentence: &Sentence) -> Sentence {
    match sentence {
        Sentence::Atom(_) | Sentence::Not(_) => sentence.clone(),
        Sentence::Connected(Connective::And, left, right) => {
            Sentence::and(distribute_or_over_and(left), distribute_or_over_and(right))
        }
        Sentence::Connected(Connective::Or, left, right) => {
            let left = distribute_or_over_and(left);
            let right = distribute_or_over_and(right);
            if let Sentence::Connected(Connective::And, l, r) = left {
                Sentence::and(
                    distribute_or_over_and(&Sentence::or(*l, right.clone())),
                    distribute_or_over_and(&Sentence::or(*r, right)),
                )
            } else if let Sentence::Connected(Connective::And, l, r) = right {
                Sentence::and(
                    distribute_or_over_and(&Sentence::or(left.clone(), *l)),
                    distribute_or_over_and(&Sentence::or(left, *r)),
                )
            } else {
                Sentence::or(left, right)
            }
        }
        Sentence::Connected(connective, left, right) => Sentence::connected(
            *connective,
            distribute_or_over_and(left),
            distribute_or_over_and(right),
        ),
        Sentence::Quantified(quantifier, vars, body) => {
            Sentence::quantified(*quantifier, vars.clone(), distribute_or_over_and(body))
        }
    }
}

fn collect_conjuncts(sentence: &Sentence, acc: &mut Vec<Vec<Literal>>) {
    match sentence {
        Sentence::Connected(Connective::And, left, right) => {
            collect_conjuncts(left, acc);
            collect_conjuncts(right, acc);
        }
        _ => {
            let mut literals = Vec::new();
            collect_literals(sentence, false, &mut literals);
            acc.push(literals);
        }
    }
}

fn collect_literals(sentence: &Sentence, negated: bool, acc: &mut Vec<Literal>) {
    match sentence {
        Sentence::Atom(atom) => {
            if negated {
                acc.push(Literal::negative(atom.clone()));
            } else {
                acc.push(Literal::positive(atom.clone()));
            }
        }
        Sentence::Not(inner) => collect_literals(inner, !negated, acc),
        Sentence::Connected(_, left, right) => {
            collect_literals(left, negated, acc);
            collect_literals(right, negated, acc);
        }
        Sentence::Quantified(_, _, body) => collect_literals(body, negated, acc),
    }
}

/// Collect a quantifier free conjunction of disjunctions into clauses, tautologies are dropped.
pub fn construct_clauses(sentence: &Sentence) -> Cnf {
    let mut conjuncts = Vec::new();
    collect_conjuncts(sentence, &mut conjuncts);
    let clauses = conjuncts
        .into_iter()
        .map(Clause::new)
        .filter(|clause| !clause.is_tautology())
        .collect();
    Cnf::new(clauses)
}

/// Run the full pipeline on `sentence`, registering Skolem symbols in `domain`.
pub fn convert_to_cnf(sentence: &Sentence, domain: &mut Domain) -> Cnf {
    let implications_removed = implications_out(sentence);
    let nnf = negations_in(&implications_removed);
    let standardized = standardize_quantifier_variables(&nnf);
    let skolemized = remove_quantifiers(&standardized, domain);
    let distributed = distribute_or_over_and(&skolemized);
    let cnf = construct_clauses(&distributed);
    debug!("CNF of {}: {}", sentence, cnf);
    cnf
}

#[cfg(test)]
mod test {
    use crate::{
        clause::{Clause, Literal},
        domain::Domain,
        sentence::Sentence,
        term::{Atom, Term, Variable},
    };

    use super::{
        convert_to_cnf, distribute_or_over_and, negations_in, standardize_quantifier_variables,
    };

    fn prop(name: &str) -> Sentence {
        Sentence::from(Atom::predicate(name, vec![]))
    }

    fn pred(name: &str, args: Vec<Term>) -> Atom {
        Atom::predicate(name, args)
    }

    #[test]
    fn implication_becomes_one_clause() {
        let mut domain = Domain::new();
        let cnf = convert_to_cnf(&Sentence::implies(prop("A"), prop("B")), &mut domain);
        assert_eq!(
            cnf.clauses(),
            &[Clause::new(vec![
                Literal::negative(pred("A", vec![])),
                Literal::positive(pred("B", vec![])),
            ])]
        );
    }

    #[test]
    fn biconditional_becomes_two_clauses() {
        let mut domain = Domain::new();
        let cnf = convert_to_cnf(&Sentence::iff(prop("A"), prop("B")), &mut domain);
        assert_eq!(cnf.len(), 2);
        assert!(cnf.clauses().contains(&Clause::new(vec![
            Literal::positive(pred("A", vec![])),
            Literal::negative(pred("B", vec![])),
        ])));
    }

    #[test]
    fn de_morgan_and_quantifier_flip() {
        let x = Variable::new("x");
        let px = Sentence::from(pred("P", vec![Term::Variable(x.clone())]));
        let s = Sentence::not(Sentence::forall(
            vec![x.clone()],
            Sentence::and(px.clone(), Sentence::not(prop("Q"))),
        ));
        assert_eq!(
            negations_in(&s),
            Sentence::exists(vec![x], Sentence::or(Sentence::not(px), prop("Q")))
        );
    }

    #[test]
    fn distribution() {
        let s = Sentence::or(prop("A"), Sentence::and(prop("B"), prop("C")));
        assert_eq!(
            distribute_or_over_and(&s),
            Sentence::and(
                Sentence::or(prop("A"), prop("B")),
                Sentence::or(prop("A"), prop("C"))
            )
        );
    }

    #[test]
    fn rebound_variables_are_renamed() {
        let x = Variable::new("x");
        let px = Sentence::from(pred("P", vec![Term::Variable(x.clone())]));
        let s = Sentence::and(
            Sentence::forall(vec![x.clone()], px.clone()),
            Sentence::exists(vec![x.clone()], px),
        );
        let q0 = Variable::new("q0");
        assert_eq!(
            standardize_quantifier_variables(&s),
            Sentence::and(
                Sentence::forall(
                    vec![x.clone()],
                    Sentence::from(pred("P", vec![Term::Variable(x)]))
                ),
                Sentence::exists(
                    vec![q0.clone()],
                    Sentence::from(pred("P", vec![Term::Variable(q0)]))
                ),
            )
        );
    }

    #[test]
    fn skolemization() {
        // ∀x ∃y Loves(x, y) becomes Loves(x, SF0(x)), ∃z P(z) becomes P(SC0)
        let mut domain = Domain::new();
        let x = Variable::new("x");
        let y = Variable::new("y");
        let loves = Sentence::forall(
            vec![x.clone()],
            Sentence::exists(
                vec![y.clone()],
                Sentence::from(pred("Loves", vec![Term::Variable(x.clone()), Term::Variable(y)])),
            ),
        );
        let cnf = convert_to_cnf(&loves, &mut domain);
        assert_eq!(
            cnf.clauses(),
            &[Clause::new(vec![Literal::positive(pred(
                "Loves",
                vec![
                    Term::Variable(x.clone()),
                    Term::function("SF0", vec![Term::Variable(x)])
                ]
            ))])]
        );

        let z = Variable::new("z");
        let exists = Sentence::exists(
            vec![z.clone()],
            Sentence::from(pred("P", vec![Term::Variable(z)])),
        );
        let cnf = convert_to_cnf(&exists, &mut domain);
        assert_eq!(
            cnf.clauses(),
            &[Clause::new(vec![Literal::positive(pred(
                "P",
                vec![Term::constant("SC0")]
            ))])]
        );
        assert!(domain.is_function("SF0"));
    }

    #[test]
    fn kings_rule() {
        let mut domain = Domain::new();
        let x = Variable::new("x");
        let xt = Term::Variable(x.clone());
        let rule = Sentence::forall(
            vec![x],
            Sentence::implies(
                Sentence::and(
                    Sentence::from(pred("King", vec![xt.clone()])),
                    Sentence::from(pred("Greedy", vec![xt.clone()])),
                ),
                Sentence::from(pred("Evil", vec![xt.clone()])),
            ),
        );
        let cnf = convert_to_cnf(&rule, &mut domain);
        assert_eq!(cnf.len(), 1);
        let clause = &cnf.clauses()[0];
        assert!(clause.is_implication_definite());
        assert_eq!(clause.number_of_negative_literals(), 2);
    }

    #[test]
    fn tautologies_are_dropped() {
        let mut domain = Domain::new();
        let cnf = convert_to_cnf(&Sentence::or(prop("A"), Sentence::not(prop("A"))), &mut domain);
        assert!(cnf.is_empty());
    }
}
