//! ## TPTP front end
//! Reads TPTP FOF problems, following includes relative to the including file, into
//! [Sentence]s. Formulas with the role `conjecture` become queries, everything else is handed to
//! the knowledge base as an axiom. CNF and typed inputs are rejected.

use std::fs;
use std::path::{Path, PathBuf};

use tptp::TPTPIterator;
use tptp::common::NonassocConnective;
use tptp::fof;
use tptp::top::{AnnotatedFormula, FormulaSelection, TPTPInput};

use crate::{
    error::{FolError, Result},
    sentence::{Connective, Sentence},
    term::{Atom, Term, Variable},
};

// Interpretation of `$true`, TPTP has no propositional constants in our sentence language.
const TRUE_CONSTANT: &str = "$true";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TptpProblem {
    pub axioms: Vec<Sentence>,
    pub conjectures: Vec<Sentence>,
    /// Already negated goals, these are told like axioms.
    pub negated_conjectures: Vec<Sentence>,
}

impl TptpProblem {
    fn append(&mut self, mut other: TptpProblem) {
        self.axioms.append(&mut other.axioms);
        self.conjectures.append(&mut other.conjectures);
        self.negated_conjectures.append(&mut other.negated_conjectures);
    }
}

pub fn parse_file(file: &Path) -> Result<TptpProblem> {
    log::info!("Opening {:?}", file);
    let bytes = fs::read(file)?;
    parse_bytes(&bytes, file.parent())
}

/// Parse TPTP input held in memory. Includes are resolved against `include_dir`, without one they
/// are rejected.
pub fn parse_bytes(bytes: &[u8], include_dir: Option<&Path>) -> Result<TptpProblem> {
    let mut problem = TptpProblem::default();
    let mut parser = TPTPIterator::<()>::new(bytes);
    for result in &mut parser {
        let input = result.map_err(|_| FolError::Parse("syntax error in TPTP input".to_string()))?;
        match input {
            TPTPInput::Include(include) => {
                if let FormulaSelection(Some(selection)) = include.selection {
                    return Err(FolError::Unsupported(format!("include selection {}", selection)));
                }
                let Some(dir) = include_dir else {
                    return Err(FolError::Unsupported(
                        "include without a base directory".to_string(),
                    ));
                };
                // The file name is single quoted.
                let name = include.file_name.0.to_string().replace('\'', "");
                let include_path: PathBuf = dir.join(name);
                log::info!("Include {:?}", include_path);
                problem.append(parse_file(&include_path)?);
            }
            TPTPInput::Annotated(annotated_formula) => match *annotated_formula {
                AnnotatedFormula::Fof(fof) => {
                    let annotated_fof = (*fof).0;
                    let role = annotated_fof.role.0.0;
                    let formula = *annotated_fof.formula;
                    log::debug!("Parse FOF: {}", formula);
                    let sentence = Sentence::try_from(formula.0)?;
                    log::info!("Parsed {}", sentence);
                    if role == "conjecture" {
                        problem.conjectures.push(sentence);
                    } else if role == "negated_conjecture" {
                        problem.negated_conjectures.push(sentence);
                    } else {
                        problem.axioms.push(sentence);
                    }
                }
                AnnotatedFormula::Tfx(_) => {
                    return Err(FolError::Unsupported("TFF/THF formulas".to_string()));
                }
                AnnotatedFormula::Cnf(_) => {
                    return Err(FolError::Unsupported("CNF formulas".to_string()));
                }
            },
        }
    }
    if !parser.remaining.is_empty() {
        return Err(FolError::Parse("trailing input after the last formula".to_string()));
    }
    Ok(problem)
}

fn fold(connective: Connective, sentences: Vec<Sentence>) -> Result<Sentence> {
    Sentence::fold(connective, sentences)
        .ok_or_else(|| FolError::Parse("empty associative formula".to_string()))
}

fn true_atom() -> Atom {
    Atom::equality(Term::constant(TRUE_CONSTANT), Term::constant(TRUE_CONSTANT))
}

impl TryFrom<fof::LogicFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::LogicFormula) -> Result<Self> {
        match f {
            fof::LogicFormula::Binary(b) => Self::try_from(b),
            fof::LogicFormula::Unary(u) => Self::try_from(u),
            fof::LogicFormula::Unitary(u) => Self::try_from(u),
        }
    }
}

impl TryFrom<fof::BinaryFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::BinaryFormula) -> Result<Self> {
        match f {
            fof::BinaryFormula::Nonassoc(fbna) => Self::try_from(fbna),
            fof::BinaryFormula::Assoc(fba) => Self::try_from(fba),
        }
    }
}

impl TryFrom<fof::UnaryFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::UnaryFormula) -> Result<Self> {
        match f {
            fof::UnaryFormula::Unary(_neg, fuf) => Ok(Self::not(Self::try_from(*fuf)?)),
            fof::UnaryFormula::InfixUnary(i) => Self::try_from(i),
        }
    }
}

impl TryFrom<fof::UnitaryFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::UnitaryFormula) -> Result<Self> {
        match f {
            fof::UnitaryFormula::Parenthesised(flf) => Self::try_from(*flf),
            fof::UnitaryFormula::Quantified(fqf) => Self::try_from(fqf),
            fof::UnitaryFormula::Atomic(a) => Self::try_from(*a),
        }
    }
}

impl TryFrom<fof::BinaryNonassoc<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::BinaryNonassoc) -> Result<Self> {
        let l = Self::try_from(*f.left)?;
        let r = Self::try_from(*f.right)?;
        Ok(match f.op {
            NonassocConnective::LRImplies => Self::implies(l, r),
            NonassocConnective::RLImplies => Self::implies(r, l),
            NonassocConnective::Equivalent => Self::iff(l, r),
            NonassocConnective::NotEquivalent => Self::not(Self::iff(l, r)),
            NonassocConnective::NotOr => Self::not(Self::or(l, r)),
            NonassocConnective::NotAnd => Self::not(Self::and(l, r)),
        })
    }
}

impl TryFrom<fof::BinaryAssoc<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::BinaryAssoc) -> Result<Self> {
        match f {
            fof::BinaryAssoc::Or(f_or) => fold(
                Connective::Or,
                f_or.0.into_iter().map(Self::try_from).collect::<Result<_>>()?,
            ),
            fof::BinaryAssoc::And(f_and) => fold(
                Connective::And,
                f_and.0.into_iter().map(Self::try_from).collect::<Result<_>>()?,
            ),
        }
    }
}

impl TryFrom<fof::UnitFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::UnitFormula) -> Result<Self> {
        match f {
            fof::UnitFormula::Unitary(u) => Self::try_from(u),
            fof::UnitFormula::Unary(u) => Self::try_from(u),
        }
    }
}

impl TryFrom<fof::InfixUnary<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::InfixUnary) -> Result<Self> {
        let lhs = Term::try_from(*f.left)?;
        let rhs = Term::try_from(*f.right)?;
        Ok(Self::not(Self::from(Atom::equality(lhs, rhs))))
    }
}

impl TryFrom<fof::QuantifiedFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::QuantifiedFormula) -> Result<Self> {
        let vars: Vec<Variable> = f.bound.0.iter().map(|v| Variable::new(v.to_string())).collect();
        let body = Self::try_from(*f.formula)?;
        Ok(match f.quantifier {
            fof::Quantifier::Forall => Self::forall(vars, body),
            fof::Quantifier::Exists => Self::exists(vars, body),
        })
    }
}

impl TryFrom<fof::AtomicFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::AtomicFormula) -> Result<Self> {
        match f {
            fof::AtomicFormula::Plain(p) => Self::try_from(p),
            fof::AtomicFormula::Defined(d) => Self::try_from(d),
            fof::AtomicFormula::System(_) => {
                Err(FolError::Unsupported("system predicates".to_string()))
            }
        }
    }
}

impl TryFrom<fof::PlainAtomicFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::PlainAtomicFormula) -> Result<Self> {
        let atom = match f.0 {
            fof::PlainTerm::Constant(c) => Atom::predicate(c.to_string(), Vec::new()),
            fof::PlainTerm::Function(name, args) => Atom::predicate(
                name.to_string(),
                args.0.into_iter().map(Term::try_from).collect::<Result<_>>()?,
            ),
        };
        Ok(Self::from(atom))
    }
}

impl TryFrom<fof::DefinedAtomicFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::DefinedAtomicFormula) -> Result<Self> {
        match f {
            fof::DefinedAtomicFormula::Plain(p) => Self::try_from(p),
            fof::DefinedAtomicFormula::Infix(i) => {
                let lhs = Term::try_from(*i.left)?;
                let rhs = Term::try_from(*i.right)?;
                Ok(Self::from(Atom::equality(lhs, rhs)))
            }
        }
    }
}

// `$true` and `$false` are the only defined propositions.
impl TryFrom<fof::DefinedPlainFormula<'_>> for Sentence {
    type Error = FolError;

    fn try_from(f: fof::DefinedPlainFormula) -> Result<Self> {
        match f.0 {
            fof::DefinedPlainTerm::Constant(c) if c.0.0.0.0.0 == "true" => {
                Ok(Self::from(true_atom()))
            }
            fof::DefinedPlainTerm::Constant(c) if c.0.0.0.0.0 == "false" => {
                Ok(Self::not(Self::from(true_atom())))
            }
            _ => Err(FolError::Unsupported("defined predicates other than $true and $false".to_string())),
        }
    }
}

impl TryFrom<fof::Term<'_>> for Term {
    type Error = FolError;

    fn try_from(t: fof::Term) -> Result<Self> {
        match t {
            fof::Term::Variable(v) => Ok(Self::var(v.to_string())),
            fof::Term::Function(f) => Self::try_from(*f),
        }
    }
}

impl TryFrom<fof::FunctionTerm<'_>> for Term {
    type Error = FolError;

    fn try_from(t: fof::FunctionTerm) -> Result<Self> {
        match t {
            fof::FunctionTerm::Plain(p) => Self::try_from(p),
            fof::FunctionTerm::Defined(d) => Self::try_from(d),
            fof::FunctionTerm::System(_) => Err(FolError::Unsupported("system terms".to_string())),
        }
    }
}

impl TryFrom<fof::PlainTerm<'_>> for Term {
    type Error = FolError;

    fn try_from(t: fof::PlainTerm) -> Result<Self> {
        match t {
            fof::PlainTerm::Constant(c) => Ok(Self::constant(c.to_string())),
            fof::PlainTerm::Function(f, args) => Ok(Self::function(
                f.to_string(),
                args.0.into_iter().map(Self::try_from).collect::<Result<_>>()?,
            )),
        }
    }
}

impl TryFrom<fof::DefinedTerm<'_>> for Term {
    type Error = FolError;

    fn try_from(t: fof::DefinedTerm) -> Result<Self> {
        match t {
            // Numbers and distinct objects are plain constants, "cat" and 'cat' stay distinct names.
            fof::DefinedTerm::Defined(tptp::common::DefinedTerm::Number(n)) => {
                Ok(Self::constant(n.to_string()))
            }
            fof::DefinedTerm::Defined(tptp::common::DefinedTerm::Distinct(d)) => {
                Ok(Self::constant(d.to_string()))
            }
            fof::DefinedTerm::Atomic(_) => Err(FolError::Unsupported("defined atomic terms".to_string())),
        }
    }
}
