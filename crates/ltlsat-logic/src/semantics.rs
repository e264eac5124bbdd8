//! Finite-trace semantics for propositional formulas.
//!
//! Traces are finite and non-empty. `X` is strong (false at the last
//! position), `wX` is weak (true there); `Y` is strict (false at the first
//! position), `Z` is weak (true there). Eventualities must be fulfilled
//! within the trace.

use indexmap::IndexSet;
use std::fmt;

use crate::errors::EvalError;
use crate::hierarchy::{Node, Tag, View};
use crate::symbol::Symbol;
use crate::traversal::Handlers;

/// A finite sequence of states, each the set of propositions true in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    steps: Vec<IndexSet<Symbol>>,
}

impl Trace {
    pub fn new(steps: Vec<IndexSet<Symbol>>) -> Self {
        Trace { steps }
    }

    /// Trace of `len` states where `symbol` holds at `i` iff `valuation(i, symbol)`.
    pub fn from_fn<'a>(
        len: usize,
        symbols: impl IntoIterator<Item = &'a Symbol> + Clone,
        mut valuation: impl FnMut(usize, &Symbol) -> bool,
    ) -> Self {
        let steps = (0..len)
            .map(|i| {
                symbols
                    .clone()
                    .into_iter()
                    .filter(|s| valuation(i, s))
                    .cloned()
                    .collect()
            })
            .collect();
        Trace { steps }
    }

    pub fn push(&mut self, step: IndexSet<Symbol>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[IndexSet<Symbol>] {
        &self.steps
    }

    pub fn is_true(&self, position: usize, symbol: &Symbol) -> bool {
        self.steps
            .get(position)
            .is_some_and(|step| step.contains(symbol))
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " ; ")?;
            }
            let names: Vec<&str> = step.iter().map(Symbol::name).collect();
            write!(f, "{{{}}}", names.join(", "))?;
        }
        Ok(())
    }
}

/// Truth value of `node` at every position of `trace`.
pub fn evaluate(node: &Node, trace: &Trace) -> Result<Vec<bool>, EvalError> {
    if trace.is_empty() {
        return Err(EvalError::EmptyTrace);
    }
    let n = trace.len();
    let handlers: Handlers<'_, Vec<bool>, EvalError> =
        Handlers::new().otherwise(move |node, children| step(node, children, trace, n));
    handlers.rewrite(node)
}

/// Truth value of `node` at the first position of `trace`.
pub fn holds(node: &Node, trace: &Trace) -> Result<bool, EvalError> {
    Ok(evaluate(node, trace)?[0])
}

fn pointwise(a: &[bool], b: &[bool], op: impl Fn(bool, bool) -> bool) -> Vec<bool> {
    a.iter().zip(b).map(|(x, y)| op(*x, *y)).collect()
}

/// Backward fixpoint `v[i] = now(i) || (keep(i) && v[i+1])` style recurrences
/// for the future binary operators, with `end` as the value past the trace.
fn future(n: usize, end: bool, at: impl Fn(usize, bool) -> bool) -> Vec<bool> {
    let mut out = vec![false; n];
    let mut next = end;
    for i in (0..n).rev() {
        next = at(i, next);
        out[i] = next;
    }
    out
}

/// Forward counterpart for the past operators, with `start` as the value
/// before the first position.
fn past(n: usize, start: bool, at: impl Fn(usize, bool) -> bool) -> Vec<bool> {
    let mut out = vec![false; n];
    let mut prev = start;
    for (i, slot) in out.iter_mut().enumerate() {
        prev = at(i, prev);
        *slot = prev;
    }
    out
}

fn step(node: &Node, mut c: Vec<Vec<bool>>, trace: &Trace, n: usize) -> Result<Vec<bool>, EvalError> {
    let tag = node.tag();
    let value = match node.view() {
        View::Boolean(b) => vec![b; n],
        View::Proposition(s) => (0..n).map(|i| trace.is_true(i, s)).collect(),
        View::Unary(Tag::Negation, _) => c.swap_remove(0).into_iter().map(|v| !v).collect(),
        View::Unary(Tag::Tomorrow, _) => (0..n).map(|i| i + 1 < n && c[0][i + 1]).collect(),
        View::Unary(Tag::WTomorrow, _) => (0..n).map(|i| i + 1 >= n || c[0][i + 1]).collect(),
        View::Unary(Tag::Eventually, _) => future(n, false, |i, next| c[0][i] || next),
        View::Unary(Tag::Always, _) => future(n, true, |i, next| c[0][i] && next),
        View::Unary(Tag::Yesterday, _) => (0..n).map(|i| i > 0 && c[0][i - 1]).collect(),
        View::Unary(Tag::WYesterday, _) => (0..n).map(|i| i == 0 || c[0][i - 1]).collect(),
        View::Unary(Tag::Once, _) => past(n, false, |i, prev| c[0][i] || prev),
        View::Unary(Tag::Historically, _) => past(n, true, |i, prev| c[0][i] && prev),
        View::Binary(Tag::Conjunction, _, _) => pointwise(&c[0], &c[1], |a, b| a && b),
        View::Binary(Tag::Disjunction, _, _) => pointwise(&c[0], &c[1], |a, b| a || b),
        View::Binary(Tag::Implication, _, _) => pointwise(&c[0], &c[1], |a, b| !a || b),
        View::Binary(Tag::Iff, _, _) => pointwise(&c[0], &c[1], |a, b| a == b),
        View::Binary(Tag::Until, _, _) => future(n, false, |i, next| c[1][i] || (c[0][i] && next)),
        View::Binary(Tag::WUntil, _, _) => future(n, true, |i, next| c[1][i] || (c[0][i] && next)),
        View::Binary(Tag::Release, _, _) => future(n, true, |i, next| c[1][i] && (c[0][i] || next)),
        View::Binary(Tag::SRelease, _, _) => {
            future(n, false, |i, next| c[1][i] && (c[0][i] || next))
        }
        View::Binary(Tag::Since, _, _) => past(n, false, |i, prev| c[1][i] || (c[0][i] && prev)),
        View::Binary(Tag::Triggered, _, _) => {
            past(n, true, |i, prev| c[1][i] && (c[0][i] || prev))
        }
        _ => return Err(EvalError::Unsupported(tag)),
    };
    Ok(value)
}
