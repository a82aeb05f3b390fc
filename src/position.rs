//! ## Positions
//! Positions address subterms inside terms and atoms as paths of argument indices. They are used
//! by paramodulation and demodulation to pick the subterm that gets rewritten.

use crate::term::{Atom, Term};

pub trait Position {
    type T;

    /// The subterm of `t` at this position, `None` if the path leaves the structure.
    fn term_at<'a>(&self, t: &'a Self::T) -> Option<&'a Term>;

    /// A copy of `t` where the subterm at this position is replaced by `replacement`.
    fn replace_term_at(&self, t: &Self::T, replacement: Term) -> Self::T;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TermPosition {
    path: Vec<usize>,
}

impl TermPosition {
    pub fn new() -> Self {
        Self { path: Vec::new() }
    }

    pub fn of_vec(path: Vec<usize>) -> Self {
        Self { path }
    }

    pub fn add(&mut self, next: usize) {
        self.path.push(next);
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    fn replace_aux(path: &[usize], term: &Term, replacement: Term) -> Term {
        match path.split_first() {
            None => replacement,
            Some((step, rest)) => match term {
                Term::Function { name, args } => {
                    let mut args = args.clone();
                    if let Some(arg) = args.get(*step) {
                        args[*step] = Self::replace_aux(rest, arg, replacement);
                    }
                    Term::Function {
                        name: name.clone(),
                        args,
                    }
                }
                _ => term.clone(),
            },
        }
    }
}

impl Position for TermPosition {
    type T = Term;

    fn term_at<'a>(&self, term: &'a Self::T) -> Option<&'a Term> {
        let mut term = term;
        for step in self.path.iter() {
            term = term.args().get(*step)?;
        }
        Some(term)
    }

    fn replace_term_at(&self, term: &Self::T, replacement: Term) -> Self::T {
        Self::replace_aux(&self.path, term, replacement)
    }
}

/// A position inside an atom: the argument index followed by a path into that argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomPosition {
    arg: usize,
    term_pos: TermPosition,
}

impl AtomPosition {
    pub fn new(arg: usize, term_pos: TermPosition) -> Self {
        Self { arg, term_pos }
    }
}

impl Position for AtomPosition {
    type T = Atom;

    fn term_at<'a>(&self, atom: &'a Self::T) -> Option<&'a Term> {
        self.term_pos.term_at(atom.args().get(self.arg)?)
    }

    fn replace_term_at(&self, atom: &Self::T, replacement: Term) -> Self::T {
        let mut args = atom.args().to_vec();
        if let Some(arg) = args.get(self.arg) {
            args[self.arg] = self.term_pos.replace_term_at(arg, replacement);
        }
        atom.with_args(args)
    }
}

fn collect_positions(
    term: &Term,
    with_variables: bool,
    current: &mut TermPosition,
    acc: &mut Vec<TermPosition>,
) {
    if term.is_variable() && !with_variables {
        return;
    }
    acc.push(current.clone());
    for (idx, arg) in term.args().iter().enumerate() {
        current.add(idx);
        collect_positions(arg, with_variables, current, acc);
        current.path.pop();
    }
}

impl Term {
    /// All positions of subterms, in pre-order from left to right.
    pub fn subterm_positions(&self) -> Vec<TermPosition> {
        let mut acc = Vec::new();
        collect_positions(self, true, &mut TermPosition::new(), &mut acc);
        acc
    }

    /// All positions of non variable subterms, in pre-order from left to right.
    pub fn non_variable_positions(&self) -> Vec<TermPosition> {
        let mut acc = Vec::new();
        collect_positions(self, false, &mut TermPosition::new(), &mut acc);
        acc
    }
}

impl Atom {
    fn positions_with(&self, positions: impl Fn(&Term) -> Vec<TermPosition>) -> Vec<AtomPosition> {
        self.args()
            .iter()
            .enumerate()
            .flat_map(|(idx, arg)| {
                positions(arg)
                    .into_iter()
                    .map(move |term_pos| AtomPosition::new(idx, term_pos))
            })
            .collect()
    }

    /// All positions of subterms of the arguments, in pre-order from left to right.
    pub fn subterm_positions(&self) -> Vec<AtomPosition> {
        self.positions_with(Term::subterm_positions)
    }

    /// All positions of non variable subterms of the arguments, in pre-order from left to right.
    pub fn non_variable_positions(&self) -> Vec<AtomPosition> {
        self.positions_with(Term::non_variable_positions)
    }
}

#[cfg(test)]
mod test {
    use crate::term::{Atom, Term};

    use super::{AtomPosition, Position, TermPosition};

    #[test]
    fn term_at_follows_path() {
        let a = Term::constant("A");
        let g_a = Term::function("G", vec![a.clone()]);
        let t = Term::function("F", vec![Term::var("x"), g_a.clone()]);
        assert_eq!(TermPosition::new().term_at(&t), Some(&t));
        assert_eq!(TermPosition::of_vec(vec![1]).term_at(&t), Some(&g_a));
        assert_eq!(TermPosition::of_vec(vec![1, 0]).term_at(&t), Some(&a));
        assert_eq!(TermPosition::of_vec(vec![2]).term_at(&t), None);
    }

    #[test]
    fn replace_rebuilds_the_path() {
        let t = Term::function("F", vec![Term::var("x"), Term::function("G", vec![Term::constant("A")])]);
        let replaced = TermPosition::of_vec(vec![1, 0]).replace_term_at(&t, Term::constant("B"));
        assert_eq!(
            replaced,
            Term::function("F", vec![Term::var("x"), Term::function("G", vec![Term::constant("B")])])
        );

        let atom = Atom::equality(Term::constant("A"), t.clone());
        let pos = AtomPosition::new(0, TermPosition::new());
        assert_eq!(pos.replace_term_at(&atom, Term::constant("C")), Atom::equality(Term::constant("C"), t));
    }

    #[test]
    fn non_variable_positions_are_preorder() {
        let atom = Atom::predicate(
            "P",
            vec![
                Term::function("F", vec![Term::var("x"), Term::constant("A")]),
                Term::var("y"),
                Term::constant("B"),
            ],
        );
        let subterms: Vec<_> = atom
            .non_variable_positions()
            .iter()
            .map(|pos| pos.term_at(&atom).unwrap().clone())
            .collect();
        assert_eq!(
            subterms,
            vec![
                Term::function("F", vec![Term::var("x"), Term::constant("A")]),
                Term::constant("A"),
                Term::constant("B"),
            ]
        );
        assert_eq!(atom.subterm_positions().len(), 5);
    }
}
