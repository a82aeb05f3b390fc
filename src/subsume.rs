//! # Subsumption
//! Clause-to-clause subsumption: `A` subsumes `B` if some `sigma` maps every literal of `A` onto a
//! literal of `B`. `A` must be strictly shorter than `B` and no longer in either polarity.
//! Literals are grouped by polarity, predicate and arity, every literal of `A` then picks a
//! partner from its group in `B`. The choices are enumerated with a [MixedRadixNumber], when
//! matching fails at some literal the counter skips every assignment sharing that prefix.

use rustc_hash::FxHashMap;

use crate::{
    clause::{Clause, Literal, Polarity},
    standardize::IndexicalAllocator,
    subst::Substitution,
};

/// A counter whose digits each have their own radix, the first digit is the most significant.
#[derive(Debug, Clone)]
pub struct MixedRadixNumber {
    radices: Vec<usize>,
    digits: Vec<usize>,
    exhausted: bool,
}

impl MixedRadixNumber {
    pub fn new(radices: Vec<usize>) -> Self {
        let exhausted = radices.contains(&0);
        Self {
            digits: vec![0; radices.len()],
            radices,
            exhausted,
        }
    }

    pub fn digits(&self) -> &[usize] {
        &self.digits
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Increment the digit at `position`, resetting all less significant digits and carrying
    /// into more significant ones. Returns `false` once every value was visited.
    pub fn increment_at(&mut self, position: usize) -> bool {
        if self.exhausted {
            return false;
        }
        self.digits[position + 1..].iter_mut().for_each(|d| *d = 0);
        let mut pos = position;
        loop {
            self.digits[pos] += 1;
            if self.digits[pos] < self.radices[pos] {
                return true;
            }
            self.digits[pos] = 0;
            if pos == 0 {
                self.exhausted = true;
                return false;
            }
            pos -= 1;
        }
    }

    /// Increment the least significant digit.
    pub fn increment(&mut self) -> bool {
        match self.radices.len() {
            0 => {
                self.exhausted = true;
                false
            }
            len => self.increment_at(len - 1),
        }
    }
}

type GroupKey<'a> = (Polarity, bool, &'a str, usize);

fn group_key(lit: &Literal) -> GroupKey<'_> {
    (
        lit.polarity(),
        lit.atom().is_equality(),
        lit.atom().symbolic_name(),
        lit.atom().arity(),
    )
}

fn group_literals(literals: &[Literal]) -> FxHashMap<GroupKey<'_>, Vec<&Literal>> {
    let mut groups: FxHashMap<GroupKey<'_>, Vec<&Literal>> = FxHashMap::default();
    for lit in literals {
        groups.entry(group_key(lit)).or_default().push(lit);
    }
    groups
}

impl Clause {
    /// Check whether `self` subsumes `other`. The clauses may share variables, `self` is
    /// standardized apart from `other` before matching.
    pub fn subsumes(&self, other: &Self) -> bool {
        if self.get_id() == other.get_id()
            || self.len() >= other.len()
            || self.number_of_positive_literals() > other.number_of_positive_literals()
            || self.number_of_negative_literals() > other.number_of_negative_literals()
        {
            return false;
        }

        let target_vars = other.variables();
        let renamed;
        let this = if self.variables().iter().any(|var| target_vars.contains(var)) {
            renamed = self.renamed(&mut IndexicalAllocator::above(target_vars.iter()));
            &renamed
        } else {
            self
        };

        let ours = group_literals(this.literals());
        let theirs = group_literals(other.literals());
        let mut subsuming: Vec<&Literal> = Vec::with_capacity(this.len());
        let mut candidates: Vec<&[&Literal]> = Vec::with_capacity(this.len());
        for (key, lits) in ours.iter() {
            let Some(targets) = theirs.get(key) else {
                return false;
            };
            if lits.len() > targets.len() {
                return false;
            }
            for lit in lits {
                subsuming.push(lit);
                candidates.push(targets);
            }
        }

        let mut counter = MixedRadixNumber::new(candidates.iter().map(|c| c.len()).collect());
        while !counter.is_exhausted() {
            match first_failure(&subsuming, &candidates, counter.digits()) {
                None => return true,
                Some(failed_at) => {
                    counter.increment_at(failed_at);
                }
            }
        }
        false
    }
}

// Match the literals under the assignment in `digits`, returning the first literal that fails.
fn first_failure(
    subsuming: &[&Literal],
    candidates: &[&[&Literal]],
    digits: &[usize],
) -> Option<usize> {
    let mut subst = Some(Substitution::new());
    for (idx, lit) in subsuming.iter().enumerate() {
        let target = candidates[idx][digits[idx]];
        subst = lit.atom().matching_partial(target.atom(), subst);
        if subst.is_none() {
            return Some(idx);
        }
    }
    None
}

/// The clauses of `clauses` that are subsumed by some other clause of `clauses`.
pub fn find_subsumed_clauses<'a>(clauses: impl IntoIterator<Item = &'a Clause>) -> Vec<Clause> {
    let all: Vec<&Clause> = clauses.into_iter().collect();
    all.iter()
        .filter(|target| all.iter().any(|candidate| candidate.subsumes(target)))
        .map(|clause| (*clause).clone())
        .collect()
}
