//! ## Clause Identity
//! Computes the canonical key that clause equality and hashing are based on. Two clauses receive
//! the same key iff they consist of the same literals up to a consistent renaming of variables.
//!
//! Literals are first sorted on a variable blind shape (polarity, predicate, arity and argument
//! structure with constants above functions above variables), ties are broken by the pattern in
//! which a literal reuses its own variables. Variables are then colored by iterated refinement:
//! a variable's color is determined by the shapes and colors of the literal positions it occurs
//! in, so `Q(x,y) ∨ Q(y,z)` tells its three variables apart no matter how the literals are
//! ordered. Literals are sorted again by shape and the colors of their variables and numbered by
//! first occurrence. Literals that still tie are permuted exhaustively and the smallest rendering
//! wins, as long as the number of orderings stays small. Past that limit literals are rendered
//! with their variable colors and sorted, which stays independent of the literal order but lets
//! clauses that refinement cannot tell apart share a key.
//!
//! Symbol names are written with their length in front and variables as `?N`, so no symbol
//! renders like a variable.

use rustc_hash::FxHashMap;

use crate::{
    clause::{Literal, Polarity},
    term::{Term, Variable},
};

const MAX_TIE_ORDERINGS: usize = 720;

// Declaration order gives the required ordering: Variable < Function < Constant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Shape {
    Variable,
    Function(String, Vec<Shape>),
    Constant(String),
}

fn shape_of(term: &Term) -> Shape {
    match term {
        Term::Variable(_) => Shape::Variable,
        Term::Function { name, args } => Shape::Function(name.clone(), args.iter().map(shape_of).collect()),
        Term::Constant(name) => Shape::Constant(name.clone()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LiteralShape {
    polarity: Polarity,
    reduced: bool,
    equality: bool,
    name: String,
    arity: usize,
    args: Vec<Shape>,
    // Variables of the literal numbered by their first occurrence inside the literal only.
    local_pattern: Vec<usize>,
}

fn literal_shape(lit: &Literal) -> LiteralShape {
    let mut local: Vec<&Variable> = Vec::new();
    let mut local_pattern = Vec::new();
    for arg in lit.atom().args() {
        collect_pattern(arg, &mut local, &mut local_pattern);
    }
    LiteralShape {
        polarity: lit.polarity(),
        reduced: lit.is_reduced(),
        equality: lit.atom().is_equality(),
        name: lit.atom().symbolic_name().to_string(),
        arity: lit.atom().arity(),
        args: lit.atom().args().iter().map(shape_of).collect(),
        local_pattern,
    }
}

fn collect_pattern<'a>(term: &'a Term, seen: &mut Vec<&'a Variable>, pattern: &mut Vec<usize>) {
    match term {
        Term::Constant(_) => {}
        Term::Variable(var) => match seen.iter().position(|v| *v == var) {
            Some(idx) => pattern.push(idx),
            None => {
                pattern.push(seen.len());
                seen.push(var);
            }
        },
        Term::Function { args, .. } => {
            args.iter().for_each(|arg| collect_pattern(arg, seen, pattern));
        }
    }
}

// Every occurrence of a variable in `lit`, in pre-order from left to right.
fn variable_occurrences(lit: &Literal) -> Vec<&Variable> {
    fn collect<'a>(term: &'a Term, acc: &mut Vec<&'a Variable>) {
        match term {
            Term::Constant(_) => {}
            Term::Variable(var) => acc.push(var),
            Term::Function { args, .. } => args.iter().for_each(|arg| collect(arg, acc)),
        }
    }
    let mut acc = Vec::new();
    for arg in lit.atom().args() {
        collect(arg, &mut acc);
    }
    acc
}

type VariableSignature<'a> = (usize, Vec<(&'a LiteralShape, Vec<usize>, usize)>);

// Colors of all variables of `keyed`, refined until the number of color classes is stable. Only
// shapes and colors are consulted, never variable names or the literal order.
fn refine_colors(keyed: &[(LiteralShape, &Literal)]) -> FxHashMap<Variable, usize> {
    let mut colors: FxHashMap<Variable, usize> = FxHashMap::default();
    for (_, lit) in keyed {
        for var in variable_occurrences(lit) {
            colors.insert(var.clone(), 0);
        }
    }
    let mut classes = usize::from(!colors.is_empty());

    loop {
        let mut signatures: FxHashMap<&Variable, VariableSignature> = FxHashMap::default();
        for (shape, lit) in keyed {
            let occurrences = variable_occurrences(lit);
            let occurrence_colors: Vec<usize> = occurrences.iter().map(|var| colors[*var]).collect();
            for (pos, var) in occurrences.into_iter().enumerate() {
                signatures
                    .entry(var)
                    .or_insert_with(|| (colors[var], Vec::new()))
                    .1
                    .push((shape, occurrence_colors.clone(), pos));
            }
        }
        for signature in signatures.values_mut() {
            signature.1.sort();
        }

        let mut distinct: Vec<&VariableSignature> = signatures.values().collect();
        distinct.sort();
        distinct.dedup();
        if distinct.len() == classes {
            return colors;
        }
        classes = distinct.len();
        colors = signatures
            .iter()
            .map(|(var, signature)| {
                let color = distinct.binary_search(&signature).unwrap_or_default();
                ((*var).clone(), color)
            })
            .collect();
    }
}

fn push_symbol(name: &str, acc: &mut String) {
    acc.push_str(&name.len().to_string());
    acc.push(':');
    acc.push_str(name);
}

// Writes a literal, `variable` decides how each variable occurrence is written.
fn render_literal(lit: &Literal, variable: &mut dyn FnMut(&Variable) -> usize, acc: &mut String) {
    fn render_term(term: &Term, variable: &mut dyn FnMut(&Variable) -> usize, acc: &mut String) {
        match term {
            Term::Constant(name) => push_symbol(name, acc),
            Term::Variable(var) => {
                acc.push('?');
                acc.push_str(&variable(var).to_string());
            }
            Term::Function { name, args } => {
                push_symbol(name, acc);
                acc.push('(');
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        acc.push(',');
                    }
                    render_term(arg, variable, acc);
                }
                acc.push(')');
            }
        }
    }

    if lit.is_reduced() {
        acc.push('#');
    }
    if lit.is_negative() {
        acc.push('~');
    }
    if lit.atom().is_equality() {
        acc.push_str("=(");
    } else {
        push_symbol(lit.atom().symbolic_name(), acc);
        acc.push('(');
    }
    for (idx, arg) in lit.atom().args().iter().enumerate() {
        if idx > 0 {
            acc.push(',');
        }
        render_term(arg, variable, acc);
    }
    acc.push_str(");");
}

// Variables numbered by first occurrence over `literals` in the given order.
fn render(literals: &[&Literal]) -> String {
    let mut numbering: FxHashMap<Variable, usize> = FxHashMap::default();
    let mut number = |var: &Variable| {
        let next = numbering.len();
        *numbering.entry(var.clone()).or_insert(next)
    };
    let mut acc = String::new();
    for lit in literals {
        render_literal(lit, &mut number, &mut acc);
    }
    acc
}

// Variables written as their refined color, literals sorted by their rendering.
fn render_by_colors(literals: &[&Literal], colors: &FxHashMap<Variable, usize>) -> String {
    let mut color = |var: &Variable| colors.get(var).copied().unwrap_or_default();
    let mut rendered: Vec<String> = literals
        .iter()
        .map(|lit| {
            let mut acc = String::new();
            render_literal(lit, &mut color, &mut acc);
            acc
        })
        .collect();
    rendered.sort();
    rendered.concat()
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for smaller in permutations(n - 1) {
        for slot in 0..=smaller.len() {
            let mut perm = smaller.clone();
            perm.insert(slot, n - 1);
            result.push(perm);
        }
    }
    result
}

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

/// The canonical key of a clause with the given literals.
pub fn canonical_key(literals: &[Literal]) -> String {
    let shaped: Vec<(LiteralShape, &Literal)> = literals.iter().map(|lit| (literal_shape(lit), lit)).collect();
    let colors = refine_colors(&shaped);

    let mut keyed: Vec<((LiteralShape, Vec<usize>), &Literal)> = shaped
        .into_iter()
        .map(|(shape, lit)| {
            let occurrence_colors = variable_occurrences(lit).iter().map(|var| colors[*var]).collect();
            ((shape, occurrence_colors), lit)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    // Runs of literals whose shapes and colors tie.
    let mut groups: Vec<Vec<&Literal>> = Vec::new();
    let mut last_key = None;
    for (key, lit) in keyed.iter() {
        if last_key == Some(key) {
            if let Some(group) = groups.last_mut() {
                group.push(*lit);
            }
        } else {
            groups.push(vec![*lit]);
        }
        last_key = Some(key);
    }

    let orderings = groups
        .iter()
        .map(|group| factorial(group.len()))
        .try_fold(1usize, |acc, n| acc.checked_mul(n))
        .unwrap_or(usize::MAX);
    let sorted: Vec<&Literal> = keyed.iter().map(|(_, lit)| *lit).collect();
    if orderings == 1 {
        return render(&sorted);
    }
    if orderings > MAX_TIE_ORDERINGS {
        return render_by_colors(&sorted, &colors);
    }

    let mut best: Option<String> = None;
    let mut current = Vec::with_capacity(literals.len());
    minimal_rendering(&groups, 0, &mut current, &mut best);
    best.unwrap_or_default()
}

fn minimal_rendering<'a>(
    groups: &[Vec<&'a Literal>],
    group_idx: usize,
    current: &mut Vec<&'a Literal>,
    best: &mut Option<String>,
) {
    let Some(group) = groups.get(group_idx) else {
        let candidate = render(current);
        if best.as_ref().is_none_or(|b| candidate < *b) {
            *best = Some(candidate);
        }
        return;
    };
    for perm in permutations(group.len()) {
        let len = current.len();
        current.extend(perm.iter().map(|idx| group[*idx]));
        minimal_rendering(groups, group_idx + 1, current, best);
        current.truncate(len);
    }
}

#[cfg(test)]
mod test {
    use crate::{
        clause::{Clause, ClauseSet, Literal},
        term::{Atom, Term},
    };

    use super::canonical_key;

    fn p(args: Vec<Term>) -> Literal {
        Literal::positive(Atom::predicate("P", args))
    }

    #[test]
    fn renaming_does_not_change_the_key() {
        let lits1 = vec![
            p(vec![Term::var("x"), Term::var("y")]),
            Literal::negative(Atom::predicate("Q", vec![Term::var("x")])),
        ];
        let lits2 = vec![
            Literal::negative(Atom::predicate("Q", vec![Term::var("b")])),
            p(vec![Term::var("b"), Term::var("c")]),
        ];
        assert_eq!(canonical_key(&lits1), canonical_key(&lits2));
    }

    #[test]
    fn coreference_is_kept() {
        let shared = vec![p(vec![Term::var("x"), Term::var("x")])];
        let distinct = vec![p(vec![Term::var("x"), Term::var("y")])];
        assert_ne!(canonical_key(&shared), canonical_key(&distinct));
    }

    #[test]
    fn tied_literals_are_ordered_canonically() {
        let q_x = Literal::positive(Atom::predicate("Q", vec![Term::var("x")]));
        let q_y = Literal::positive(Atom::predicate("Q", vec![Term::var("y")]));
        let lits1 = vec![
            p(vec![Term::var("x"), Term::var("y")]),
            p(vec![Term::var("y"), Term::var("x")]),
            q_x.clone(),
        ];
        let lits2 = vec![
            p(vec![Term::var("y"), Term::var("x")]),
            p(vec![Term::var("x"), Term::var("y")]),
            q_x,
        ];
        assert_eq!(canonical_key(&lits1), canonical_key(&lits2));

        let lits3 = vec![
            p(vec![Term::var("x"), Term::var("y")]),
            p(vec![Term::var("y"), Term::var("x")]),
            q_y,
        ];
        assert_eq!(canonical_key(&lits1), canonical_key(&lits3));
    }

    #[test]
    fn constants_sort_above_variables() {
        let lits1 = vec![p(vec![Term::constant("A")]), p(vec![Term::var("x")])];
        let lits2 = vec![p(vec![Term::var("z")]), p(vec![Term::constant("A")])];
        assert_eq!(canonical_key(&lits1), canonical_key(&lits2));
        assert!(canonical_key(&lits1).starts_with("1:P(?0);"));
    }

    fn chain(names: &[&str]) -> Vec<Literal> {
        names
            .windows(2)
            .map(|pair| {
                Literal::positive(Atom::predicate("Q", vec![Term::var(pair[0]), Term::var(pair[1])]))
            })
            .collect()
    }

    #[test]
    fn long_chains_ignore_literal_order() {
        let forward = chain(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let mut reversed = forward.clone();
        reversed.reverse();
        let renamed = chain(&["s", "t", "u", "v", "w", "x", "y", "z"]);
        assert_eq!(canonical_key(&forward), canonical_key(&reversed));
        assert_eq!(canonical_key(&forward), canonical_key(&renamed));

        let c1 = Clause::new(forward.clone());
        let c2 = Clause::new(reversed);
        assert_eq!(c1, c2);
        let mut set = ClauseSet::new();
        assert!(set.insert(c1));
        assert!(!set.insert(c2));

        // Closing the chain into a cycle is a different clause.
        let cycle = chain(&["a", "b", "c", "d", "e", "f", "g", "a"]);
        assert_ne!(canonical_key(&forward), canonical_key(&cycle));
    }

    #[test]
    fn symmetric_clauses_ignore_literal_order() {
        let names = ["a", "b", "c", "d", "e", "f", "g"];
        let forward: Vec<Literal> = names
            .iter()
            .map(|name| p(vec![Term::var(*name), Term::constant("A")]))
            .collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(canonical_key(&forward), canonical_key(&reversed));
    }

    #[test]
    fn constants_never_render_like_variables() {
        let constant = vec![p(vec![Term::constant("?0")])];
        let variable = vec![p(vec![Term::var("x")])];
        assert_ne!(canonical_key(&constant), canonical_key(&variable));
    }
}
