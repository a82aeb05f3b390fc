//! ## Proofs
//! Every derived clause, chain or fact points at the [ProofLog] step that produced it. The log is
//! an arena of steps whose predecessors are other step ids, so a derivation forms a DAG that can
//! be flattened into a numbered [Proof] once an answer is found.

use std::{cell::RefCell, fmt::Display};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::subst::Substitution;

/// Index of a step inside a [ProofLog].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofRule {
    Premise,
    Goal,
    Clausify,
    Renaming,
    Resolution,
    Factor,
    Paramodulation,
    Demodulation,
    ChainFromClause,
    ChainContrapositive,
    ChainReduction,
    ChainCancellation,
    ChainDropped,
    AssertFact,
    AlreadyAFact,
    BackwardGoal,
}

impl ProofRule {
    fn as_str(&self) -> &'static str {
        match self {
            ProofRule::Premise => "Premise",
            ProofRule::Goal => "Goal",
            ProofRule::Clausify => "Clausified",
            ProofRule::Renaming => "Renaming",
            ProofRule::Resolution => "Resolution",
            ProofRule::Factor => "Factor",
            ProofRule::Paramodulation => "Paramodulation",
            ProofRule::Demodulation => "Demodulation",
            ProofRule::ChainFromClause => "Chain from Clause",
            ProofRule::ChainContrapositive => "Contrapositive",
            ProofRule::ChainReduction => "Reduction",
            ProofRule::ChainCancellation => "Cancellation",
            ProofRule::ChainDropped => "Dropped",
            ProofRule::AssertFact => "Assert fact",
            ProofRule::AlreadyAFact => "Already a known fact",
            ProofRule::BackwardGoal => "Goal reduction",
        }
    }
}

impl Display for ProofRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct ProofStep {
    rule: ProofRule,
    proof_text: String,
    detail: String,
    predecessors: Vec<StepId>,
}

/// Arena of proof steps. Steps are only ever appended, ids stay valid for the lifetime of the log.
#[derive(Debug, Clone, Default)]
pub struct ProofLog {
    steps: RefCell<Vec<ProofStep>>,
}

impl ProofLog {
    pub fn new() -> ProofLog {
        Self::default()
    }

    /// Append a step and return its id. `detail` is free form text such as the unifier used.
    pub fn record(
        &self,
        rule: ProofRule,
        proof_text: impl Into<String>,
        detail: impl Into<String>,
        predecessors: &[StepId],
    ) -> StepId {
        let mut steps = self.steps.borrow_mut();
        debug_assert!(predecessors.iter().all(|pred| pred.0 < steps.len()));
        steps.push(ProofStep {
            rule,
            proof_text: proof_text.into(),
            detail: detail.into(),
            predecessors: predecessors.to_owned(),
        });
        StepId(steps.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.steps.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rule_of(&self, id: StepId) -> Option<ProofRule> {
        self.steps.borrow().get(id.0).map(|step| step.rule)
    }

    // Post order over the steps reachable from `last`, so every step comes after its predecessors.
    fn reachable_in_order(&self, last: StepId) -> Vec<StepId> {
        let steps = self.steps.borrow();
        let mut visited = FxHashSet::default();
        let mut order = Vec::new();
        let mut worklist = vec![(last, false)];
        while let Some((id, expanded)) = worklist.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            let Some(step) = steps.get(id.0) else {
                continue;
            };
            worklist.push((id, true));
            step.predecessors
                .iter()
                .rev()
                .filter(|pred| !visited.contains(*pred))
                .for_each(|pred| worklist.push((*pred, false)));
        }
        order
    }

    /// Materialize the derivation ending in `last` into a numbered proof: premises first, goals
    /// next, then everything else in derivation order.
    pub fn proof(&self, last: StepId, answer_bindings: Substitution) -> Proof {
        let order = self.reachable_in_order(last);
        let steps = self.steps.borrow();
        let rank = |id: &StepId| match steps[id.0].rule {
            ProofRule::Premise => 0,
            ProofRule::Goal => 1,
            _ => 2,
        };
        let mut ordered = order;
        // Stable, so derivation order is kept inside each group.
        ordered.sort_by_key(rank);

        let numbers: FxHashMap<StepId, usize> = ordered
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx + 1))
            .collect();

        let lines = ordered
            .iter()
            .map(|id| {
                let step = &steps[id.0];
                let predecessors: Vec<usize> = step
                    .predecessors
                    .iter()
                    .filter_map(|pred| numbers.get(pred).copied())
                    .collect();
                let mut justification_text = step.rule.to_string();
                if !predecessors.is_empty() {
                    let preds: Vec<String> = predecessors.iter().map(usize::to_string).collect();
                    justification_text.push_str(": ");
                    justification_text.push_str(&preds.join(", "));
                }
                if !step.detail.is_empty() {
                    justification_text.push(' ');
                    justification_text.push_str(&step.detail);
                }
                ProofLine {
                    step_number: numbers[id],
                    proof_text: step.proof_text.clone(),
                    justification_text,
                    rule: step.rule,
                    predecessors,
                }
            })
            .collect();

        Proof {
            lines,
            answer_bindings,
        }
    }
}

/// One numbered line of a materialized proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofLine {
    pub step_number: usize,
    pub proof_text: String,
    pub justification_text: String,
    pub rule: ProofRule,
    predecessors: Vec<usize>,
}

impl ProofLine {
    fn to_graphviz(&self, buf: &mut String) {
        let description = format!(
            "{}\\ninference: {} ({})",
            self.proof_text.replace('"', "\\\""),
            self.rule,
            self.step_number
        );
        buf.push_str(&format!(
            "{:?} [shape=box,label=\"{}\"]\n",
            self.step_number, &description
        ));
        for pred in self.predecessors.iter() {
            buf.push_str(&format!("{:?} -> {:?}\n", pred, self.step_number));
        }
    }
}

/// A flattened derivation plus the bindings it gives to the query variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    lines: Vec<ProofLine>,
    answer_bindings: Substitution,
}

impl Proof {
    pub fn steps(&self) -> &[ProofLine] {
        &self.lines
    }

    pub fn answer_bindings(&self) -> &Substitution {
        &self.answer_bindings
    }

    pub fn replace_answer_bindings(&mut self, answer_bindings: Substitution) {
        self.answer_bindings = answer_bindings;
    }

    /// Render the proof as a three column text table.
    pub fn to_table(&self) -> String {
        let text_width = self
            .lines
            .iter()
            .map(|line| line.proof_text.chars().count())
            .max()
            .unwrap_or(0);
        let mut buf = String::new();
        for line in self.lines.iter() {
            buf.push_str(&format!(
                "{:>4}| {:<text_width$} | {}\n",
                line.step_number, line.proof_text, line.justification_text
            ));
        }
        buf
    }

    pub fn to_graphviz(&self) -> String {
        let mut buf = String::new();
        buf.push_str("digraph proof {\n");
        buf.push_str("rankdir = TB\n");
        buf.push_str("graph [splines=true overlap=false];\n");
        for line in self.lines.iter() {
            line.to_graphviz(&mut buf);
        }
        buf.push('}');
        buf
    }
}

impl Display for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Answer bindings: {}\n{}", self.answer_bindings, self.to_table())
    }
}
