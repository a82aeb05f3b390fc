//! ## Standardizing Apart
//! Renaming the variables of a sentence, clause or chain to fresh ones so that two independently
//! derived expressions can never share a variable by accident. Fresh variables keep their name and
//! receive a new index from an [IndexicalAllocator], which is owned by the knowledge base and
//! threaded through every operation that creates variables.

use crate::{
    sentence::Sentence,
    subst::{Substitutable, Substitution},
    term::{Term, Variable},
};

/// Hands out the indices used to distinguish standardized variables.
#[derive(Debug, Clone, Default)]
pub struct IndexicalAllocator {
    next: u32,
}

impl IndexicalAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator whose indices are all greater than those carried by `vars`.
    pub fn above<'a>(vars: impl IntoIterator<Item = &'a Variable>) -> Self {
        let next = vars
            .into_iter()
            .filter_map(Variable::index)
            .max()
            .map_or(0, |max| max + 1);
        Self { next }
    }

    pub fn next_index(&mut self) -> u32 {
        let index = self.next;
        self.next += 1;
        index
    }

    /// A variable with the same name as `var` that no other allocation returned.
    pub fn fresh(&mut self, var: &Variable) -> Variable {
        var.with_index(self.next_index())
    }

    /// Build a renaming that maps each of `vars` to a fresh variable.
    pub fn renaming<'a>(&mut self, vars: impl IntoIterator<Item = &'a Variable>) -> Substitution {
        vars.into_iter()
            .map(|var| (var.clone(), Term::Variable(self.fresh(var))))
            .collect()
    }
}

/// The outcome of standardizing a sentence apart: the renamed sentence together with the renaming
/// and its inverse, which maps the fresh variables back to the caller's.
#[derive(Debug, Clone)]
pub struct StandardizeApartResult {
    pub original: Sentence,
    pub standardized: Sentence,
    pub forward: Substitution,
    pub reverse: Substitution,
}

/// Rename every variable of `sentence`, including quantified ones, to a fresh variable.
pub fn standardize_sentence(
    sentence: &Sentence,
    alloc: &mut IndexicalAllocator,
) -> StandardizeApartResult {
    let mut vars = sentence.variables();
    collect_quantified_vars(sentence, &mut vars);
    let forward = alloc.renaming(vars.iter());
    let reverse = forward.inverse_renaming();
    StandardizeApartResult {
        original: sentence.clone(),
        standardized: sentence.clone().subst_with(&forward),
        forward,
        reverse,
    }
}

// Quantified variables that never occur in their body still need renaming.
fn collect_quantified_vars(sentence: &Sentence, acc: &mut Vec<Variable>) {
    match sentence {
        Sentence::Atom(_) => {}
        Sentence::Not(inner) => collect_quantified_vars(inner, acc),
        Sentence::Connected(_, left, right) => {
            collect_quantified_vars(left, acc);
            collect_quantified_vars(right, acc);
        }
        Sentence::Quantified(_, vars, body) => {
            for var in vars {
                if !acc.contains(var) {
                    acc.push(var.clone());
                }
            }
            collect_quantified_vars(body, acc);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        sentence::Sentence,
        term::{Atom, Term, Variable},
    };

    use super::{IndexicalAllocator, standardize_sentence};

    #[test]
    fn fresh_indices_are_unique() {
        let mut alloc = IndexicalAllocator::new();
        let x = Variable::new("x");
        let x0 = alloc.fresh(&x);
        let x1 = alloc.fresh(&x);
        assert_ne!(x0, x1);
        assert_eq!(x0.name(), "x");
        assert_eq!(x1.index(), Some(1));

        let vars = [Variable::new("y"), Variable::indexed("x", 4), x1];
        let mut above = IndexicalAllocator::above(vars.iter());
        assert_eq!(above.next_index(), 5);
        assert_eq!(IndexicalAllocator::above([&Variable::new("y")]).next_index(), 0);
    }

    #[test]
    fn sentence_round_trips_through_reverse() {
        let mut alloc = IndexicalAllocator::new();
        let x = Variable::new("x");
        let s = Sentence::forall(
            vec![x.clone()],
            Sentence::from(Atom::predicate(
                "Knows",
                vec![Term::Variable(x.clone()), Term::var("y")],
            )),
        );
        let res = standardize_sentence(&s, &mut alloc);
        assert_ne!(res.standardized, s);
        assert!(res.standardized.variables().iter().all(|v| v.index().is_some()));
        assert_eq!(res.forward.len(), 2);
        assert_eq!(
            res.reverse.get(&Variable::indexed("x", 0)),
            Some(&Term::Variable(x))
        );
        assert_eq!(res.original, s);
    }
}
