//! ## Equality Reasoning
//! Paramodulation and demodulation. Both look for a subterm of a literal that fits one side of an
//! equality and replace that single occurrence by the other side:
//! - paramodulation unifies, so it may instantiate both clauses, and it only rewrites non
//!   variable subterms
//! - demodulation matches one way from the right hand side of the assertion and rewrites to the
//!   left hand side, so `A = B` turns `P(B)` into `P(A)`, and the rewritten expression is never
//!   instantiated
//!
//! Rewrites that would replace a term by itself are ignored in both.

use log::debug;

use crate::{
    clause::{Clause, Literal},
    position::{AtomPosition, Position},
    proofs::{ProofLog, ProofRule},
    standardize::IndexicalAllocator,
    subst::{Substitutable, Substitution},
    term::{Atom, Term},
};

/// The two sides of `atom` if it is an equality.
pub fn equality_sides(atom: &Atom) -> Option<(&Term, &Term)> {
    match atom {
        Atom::Equality([lhs, rhs]) => Some((lhs, rhs)),
        Atom::Predicate { .. } => None,
    }
}

// The first position of `expression` whose subterm `pattern` matches, together with the matcher.
fn first_match(pattern: &Term, expression: &Atom) -> Option<(AtomPosition, Substitution)> {
    expression.subterm_positions().into_iter().find_map(|pos| {
        let subterm = pos.term_at(expression)?;
        let subst = pattern.matching(subterm)?;
        Some((pos, subst))
    })
}

/// Rewrite the first subterm of `expression` matched by the right hand side of the equality
/// `assertion` into the correspondingly instantiated left hand side.
pub fn demodulate(assertion: &Atom, expression: &Atom) -> Option<Atom> {
    let (lhs, rhs) = equality_sides(assertion)?;
    let (pos, subst) = first_match(rhs, expression)?;
    let replace_with = lhs.clone().subst_with(&subst);
    if pos.term_at(expression) == Some(&replace_with) {
        return None;
    }
    Some(pos.replace_term_at(expression, replace_with))
}

/// Demodulate the first literal of `clause` that `assertion` can rewrite.
pub fn demodulate_clause(assertion: &Atom, clause: &Clause, log: &ProofLog) -> Option<Clause> {
    let (idx, rewritten) = clause
        .literals()
        .iter()
        .enumerate()
        .find_map(|(idx, lit)| demodulate(assertion, lit.atom()).map(|atom| (idx, atom)))?;

    let literals = clause
        .literals()
        .iter()
        .enumerate()
        .map(|(other, lit)| {
            if other == idx {
                Literal::new(rewritten.clone(), lit.polarity())
            } else {
                lit.clone()
            }
        })
        .collect();
    let demodulated = Clause::new(literals);
    let step = log.record(
        ProofRule::Demodulation,
        demodulated.to_string(),
        format!("with {assertion}"),
        &clause.origin_slice(),
    );
    debug!("Demodulated {} into {}", clause, demodulated);
    Some(demodulated.with_origin(step))
}

/// All paramodulants between `c1` and `c2`, using the positive equalities of either clause to
/// rewrite the other one.
pub fn paramodulants(c1: &Clause, c2: &Clause, alloc: &mut IndexicalAllocator, log: &ProofLog) -> Vec<Clause> {
    let c2 = if c1.get_id() == c2.get_id() || shares_variables(c1, c2) {
        c2.renamed(alloc)
    } else {
        c2.clone()
    };

    let mut result = Vec::new();
    for (top, equality_clause) in [(c1, &c2), (&c2, c1)] {
        for eq_lit in equality_clause.positive_literals() {
            let Some((lhs, rhs)) = equality_sides(eq_lit.atom()) else {
                continue;
            };
            for (to_match, to_replace_with) in [(lhs, rhs), (rhs, lhs)] {
                for (lit_idx, lit) in top.literals().iter().enumerate() {
                    let Some(paramodulant) = paramodulate_literal(
                        top,
                        lit_idx,
                        lit,
                        equality_clause,
                        eq_lit,
                        to_match,
                        to_replace_with,
                        alloc,
                        log,
                    ) else {
                        continue;
                    };
                    if !result.contains(&paramodulant) {
                        result.push(paramodulant);
                    }
                }
            }
        }
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn paramodulate_literal(
    top: &Clause,
    lit_idx: usize,
    lit: &Literal,
    equality_clause: &Clause,
    eq_lit: &Literal,
    to_match: &Term,
    to_replace_with: &Term,
    alloc: &mut IndexicalAllocator,
    log: &ProofLog,
) -> Option<Clause> {
    let (pos, theta) = lit.atom().non_variable_positions().into_iter().find_map(|pos| {
        let subterm = pos.term_at(lit.atom())?;
        let theta = to_match.unify(subterm)?;
        Some((pos, theta))
    })?;
    let replace_with = to_replace_with.clone().subst_with(&theta);
    let matched = pos.term_at(lit.atom())?.clone().subst_with(&theta);
    if matched == replace_with {
        return None;
    }

    let rewritten = pos.replace_term_at(lit.atom(), to_replace_with.clone());
    let mut literals = Vec::with_capacity(top.len() + equality_clause.len());
    for (idx, other) in top.literals().iter().enumerate() {
        if idx == lit_idx {
            literals.push(Literal::new(rewritten.clone(), lit.polarity()));
        } else {
            literals.push(other.clone());
        }
    }
    let mut skipped = false;
    for other in equality_clause.literals() {
        if !skipped && other == eq_lit {
            skipped = true;
            continue;
        }
        literals.push(other.clone());
    }

    let paramodulant = Clause::new(literals.subst_with(&theta)).renamed(alloc);
    let mut preds = top.origin_slice();
    preds.extend(equality_clause.origin_slice());
    let step = log.record(
        ProofRule::Paramodulation,
        paramodulant.to_string(),
        theta.to_string(),
        &preds,
    );
    debug!("Paramodulated {} into {}: {}", equality_clause, top, paramodulant);
    Some(paramodulant.with_origin(step))
}

fn shares_variables(c1: &Clause, c2: &Clause) -> bool {
    let ours = c1.variables();
    c2.variables().iter().any(|var| ours.contains(var))
}

#[cfg(test)]
mod test {
    use crate::{
        clause::{Clause, Literal},
        proofs::ProofLog,
        standardize::IndexicalAllocator,
        term::{Atom, Term},
    };

    use super::{demodulate, demodulate_clause, paramodulants};

    fn a() -> Term {
        Term::constant("A")
    }

    fn b() -> Term {
        Term::constant("B")
    }

    #[test]
    fn demodulation_rewrites_first_match() {
        let assertion = Atom::equality(a(), b());
        let expression = Atom::predicate("P", vec![b()]);
        assert_eq!(
            demodulate(&assertion, &expression),
            Some(Atom::predicate("P", vec![a()]))
        );

        let twice = Atom::predicate("P", vec![b(), b()]);
        assert_eq!(
            demodulate(&assertion, &twice),
            Some(Atom::predicate("P", vec![a(), b()]))
        );

        // Only the right hand side is looked for.
        assert_eq!(demodulate(&assertion, &Atom::predicate("P", vec![a()])), None);
    }

    #[test]
    fn demodulation_ignores_reflexivity() {
        let reflexive = Atom::equality(a(), a());
        let expression = Atom::predicate("P", vec![a()]);
        assert_eq!(demodulate(&reflexive, &expression), None);
    }

    #[test]
    fn demodulation_matches_one_way() {
        // x = F(x) rewrites P(F(G(A))) to P(G(A)) but leaves P(y) alone.
        let x = Term::var("x");
        let assertion = Atom::equality(x.clone(), Term::function("F", vec![x]));
        let ga = Term::function("G", vec![a()]);
        let expression = Atom::predicate("P", vec![Term::function("F", vec![ga.clone()])]);
        assert_eq!(
            demodulate(&assertion, &expression),
            Some(Atom::predicate("P", vec![ga]))
        );
        assert_eq!(
            demodulate(&assertion, &Atom::predicate("P", vec![Term::var("y")])),
            None
        );
    }

    #[test]
    fn clause_demodulation_rewrites_one_literal() {
        let log = ProofLog::new();
        let assertion = Atom::equality(a(), b());
        let clause = Clause::new(vec![
            Literal::negative(Atom::predicate("Q", vec![a()])),
            Literal::positive(Atom::predicate("P", vec![b()])),
            Literal::positive(Atom::predicate("R", vec![b()])),
        ]);
        let demodulated = demodulate_clause(&assertion, &clause, &log).unwrap();
        assert_eq!(
            demodulated,
            Clause::new(vec![
                Literal::negative(Atom::predicate("Q", vec![a()])),
                Literal::positive(Atom::predicate("P", vec![a()])),
                Literal::positive(Atom::predicate("R", vec![b()])),
            ])
        );
    }

    #[test]
    fn paramodulation_replaces_equals() {
        let mut alloc = IndexicalAllocator::new();
        let log = ProofLog::new();
        // F(A) = B and P(F(A)) ∨ Q(A) give P(B) ∨ Q(A)
        let fa = Term::function("F", vec![a()]);
        let equality = Clause::new(vec![Literal::positive(Atom::equality(fa.clone(), b()))]);
        let top = Clause::new(vec![
            Literal::positive(Atom::predicate("P", vec![fa])),
            Literal::positive(Atom::predicate("Q", vec![a()])),
        ]);
        let result = paramodulants(&top, &equality, &mut alloc, &log);
        assert!(result.contains(&Clause::new(vec![
            Literal::positive(Atom::predicate("P", vec![b()])),
            Literal::positive(Atom::predicate("Q", vec![a()])),
        ])));
    }

    #[test]
    fn paramodulation_instantiates_variables() {
        let mut alloc = IndexicalAllocator::new();
        let log = ProofLog::new();
        // F(x) = x and P(F(A)) give P(A)
        let x = Term::var("x");
        let equality = Clause::new(vec![Literal::positive(Atom::equality(
            Term::function("F", vec![x.clone()]),
            x,
        ))]);
        let top = Clause::new(vec![Literal::positive(Atom::predicate(
            "P",
            vec![Term::function("F", vec![a()])],
        ))]);
        let result = paramodulants(&equality, &top, &mut alloc, &log);
        assert!(result.contains(&Clause::new(vec![Literal::positive(Atom::predicate(
            "P",
            vec![a()]
        ))])));
    }
}
