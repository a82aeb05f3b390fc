//! ## Trivial Clause Detection
//! A clause is a tautology iff it contains a literal together with its negation over a
//! syntactically identical atom. Pairs that are merely complementary under unification are kept,
//! removing them would lose resolution steps.

use log::debug;

use crate::clause::Clause;

pub fn is_tautology(clause: &Clause) -> bool {
    for pos in clause.positive_literals() {
        for neg in clause.negative_literals() {
            if pos.is_negation_of(neg) {
                debug!("Tautology killed: {}", clause);
                return true;
            }
        }
    }
    false
}
