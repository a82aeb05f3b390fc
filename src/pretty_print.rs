//! ## Pretty Printing
//! This module contains the [PrettyPrint] trait which is implemented by every first order
//! structure of the crate. [Display] is derived from it, so `to_string` and `{}` give the same
//! rendering that ends up in proofs and logs.

use std::fmt::Display;

use crate::{
    chain::Chain,
    clause::{Clause, Literal, Polarity},
    sentence::{Connective, Quantifier, Sentence},
    term::{Atom, Term, Variable},
};

/// Types that can be pretty printed.
pub trait PrettyPrint {
    /// Print the representation of `self` into `acc`.
    fn print_into(&self, acc: &mut String);
}

/// Pretty print some value that implements [PrettyPrint] to a string.
pub fn pretty_print<T: PrettyPrint>(t: &T) -> String {
    let mut acc = String::new();
    t.print_into(&mut acc);
    acc
}

fn print_list_into<T: PrettyPrint>(items: &[T], acc: &mut String) {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            acc.push_str(", ");
        }
        item.print_into(acc);
    }
}

impl PrettyPrint for Variable {
    fn print_into(&self, acc: &mut String) {
        acc.push_str(self.name());
        if let Some(index) = self.index() {
            acc.push_str(&index.to_string());
        }
    }
}

impl PrettyPrint for Term {
    fn print_into(&self, acc: &mut String) {
        match self {
            Term::Constant(name) => acc.push_str(name),
            Term::Variable(var) => var.print_into(acc),
            Term::Function { name, args } => {
                acc.push_str(name);
                acc.push('(');
                print_list_into(args, acc);
                acc.push(')');
            }
        }
    }
}

impl PrettyPrint for Atom {
    fn print_into(&self, acc: &mut String) {
        match self {
            Atom::Predicate { name, args } => {
                acc.push_str(name);
                if !args.is_empty() {
                    acc.push('(');
                    print_list_into(args, acc);
                    acc.push(')');
                }
            }
            Atom::Equality([lhs, rhs]) => {
                lhs.print_into(acc);
                acc.push_str(" = ");
                rhs.print_into(acc);
            }
        }
    }
}

impl PrettyPrint for Connective {
    fn print_into(&self, acc: &mut String) {
        match self {
            Connective::And => acc.push('∧'),
            Connective::Or => acc.push('∨'),
            Connective::Implies => acc.push('⇒'),
            Connective::Biconditional => acc.push('⇔'),
        }
    }
}

fn print_nested_into(sentence: &Sentence, acc: &mut String) {
    match sentence {
        Sentence::Connected(..) => {
            acc.push('(');
            sentence.print_into(acc);
            acc.push(')');
        }
        _ => sentence.print_into(acc),
    }
}

impl PrettyPrint for Sentence {
    fn print_into(&self, acc: &mut String) {
        match self {
            Sentence::Atom(atom) => atom.print_into(acc),
            Sentence::Not(inner) => {
                acc.push('¬');
                print_nested_into(inner, acc);
            }
            Sentence::Connected(connective, left, right) => {
                print_nested_into(left, acc);
                acc.push(' ');
                connective.print_into(acc);
                acc.push(' ');
                print_nested_into(right, acc);
            }
            Sentence::Quantified(quantifier, vars, body) => {
                match quantifier {
                    Quantifier::ForAll => acc.push('∀'),
                    Quantifier::Exists => acc.push('∃'),
                }
                print_list_into(vars, acc);
                acc.push_str(" (");
                body.print_into(acc);
                acc.push(')');
            }
        }
    }
}

impl PrettyPrint for Literal {
    fn print_into(&self, acc: &mut String) {
        if self.is_reduced() {
            acc.push('[');
        }
        if self.polarity() == Polarity::Negative {
            acc.push('¬');
        }
        match self.atom() {
            Atom::Equality(_) if self.is_negative() => {
                acc.push('(');
                self.atom().print_into(acc);
                acc.push(')');
            }
            atom => atom.print_into(acc),
        }
        if self.is_reduced() {
            acc.push(']');
        }
    }
}

impl PrettyPrint for Clause {
    fn print_into(&self, acc: &mut String) {
        if self.is_empty() {
            acc.push('⊥');
        } else {
            for (idx, lit) in self.literals().iter().enumerate() {
                if idx > 0 {
                    acc.push_str(" ∨ ");
                }
                lit.print_into(acc);
            }
        }
    }
}

impl PrettyPrint for Chain {
    fn print_into(&self, acc: &mut String) {
        if self.is_empty() {
            acc.push('⊥');
        } else {
            acc.push('<');
            print_list_into(self.literals(), acc);
            acc.push('>');
        }
    }
}

macro_rules! display_via_pretty_print {
    ($($ty:ty),*) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&pretty_print(self))
                }
            }
        )*
    };
}

display_via_pretty_print!(Variable, Term, Atom, Sentence, Literal, Clause, Chain);
