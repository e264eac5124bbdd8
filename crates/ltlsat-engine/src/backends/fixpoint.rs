//! Complete check for future-only propositional requirements over finite traces.
//!
//! The *type* of a suffix is the truth vector of every subformula at its
//! first position. The type of a suffix is a function of its first state and
//! the type of the suffix after it, so the set of types of all finite traces
//! is the least set containing every one-state type and closed under
//! prepending a state. The module is satisfiable iff some type in that set
//! makes every requirement true.

use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use tracing::debug;

use ltlsat_logic::{DispatchError, Handlers, Node, Symbol, Tag, View};

use super::{first_order, occurring_propositions};
use crate::errors::PipelineError;
use crate::module::Module;
use crate::options::{deadline_exceeded, deadline_from_timeout_secs, SolverOptions};
use crate::solver::{Backend, Verdict};

#[derive(Debug, Clone, Copy)]
enum Op {
    Const(bool),
    Prop(usize),
    Not(usize),
    And(usize, usize),
    Or(usize, usize),
    Implies(usize, usize),
    Iff(usize, usize),
    /// `end` is the value after the last position.
    Next { arg: usize, end: bool },
    Eventually(usize),
    Always(usize),
    /// `now || (keep && next)`, `end` past the last position.
    Until { keep: usize, now: usize, end: bool },
    /// `now && (stop || next)`, `end` past the last position.
    Release { stop: usize, now: usize, end: bool },
}

/// Subformulas in post-order with their operations.
struct Closure {
    ops: Vec<Op>,
    roots: Vec<usize>,
    props: usize,
}

impl Closure {
    fn compile(requirements: &[Node], props: &IndexSet<Symbol>) -> Option<Closure> {
        let order = RefCell::new(Vec::new());
        let collect: Handlers<'_, (), DispatchError> = Handlers::new().otherwise(|n, _| {
            order.borrow_mut().push(n.clone());
            Ok(())
        });
        collect.rewrite_all(requirements).ok()?;
        drop(collect);
        let order = order.into_inner();

        let index: IndexMap<&Node, usize> = order.iter().enumerate().map(|(i, n)| (n, i)).collect();
        let at = |n: &Node| index.get(n).copied();
        let mut ops = Vec::with_capacity(order.len());
        for node in &order {
            let op = match node.view() {
                View::Boolean(b) => Op::Const(b),
                View::Proposition(s) => Op::Prop(props.get_index_of(s)?),
                View::Unary(tag, a) => {
                    let a = at(a)?;
                    match tag {
                        Tag::Negation => Op::Not(a),
                        Tag::Tomorrow => Op::Next { arg: a, end: false },
                        Tag::WTomorrow => Op::Next { arg: a, end: true },
                        Tag::Eventually => Op::Eventually(a),
                        Tag::Always => Op::Always(a),
                        _ => return None,
                    }
                }
                View::Binary(tag, l, r) => {
                    let (l, r) = (at(l)?, at(r)?);
                    match tag {
                        Tag::Conjunction => Op::And(l, r),
                        Tag::Disjunction => Op::Or(l, r),
                        Tag::Implication => Op::Implies(l, r),
                        Tag::Iff => Op::Iff(l, r),
                        Tag::Until => Op::Until { keep: l, now: r, end: false },
                        Tag::WUntil => Op::Until { keep: l, now: r, end: true },
                        Tag::Release => Op::Release { stop: l, now: r, end: true },
                        Tag::SRelease => Op::Release { stop: l, now: r, end: false },
                        _ => return None,
                    }
                }
                _ => return None,
            };
            ops.push(op);
        }
        let roots = requirements.iter().map(at).collect::<Option<Vec<_>>>()?;
        Some(Closure {
            ops,
            roots,
            props: props.len(),
        })
    }

    /// Type of a suffix starting with `state` and continuing with `next`.
    fn step(&self, state: u64, next: Option<&[bool]>) -> Vec<bool> {
        let mut v = vec![false; self.ops.len()];
        let later = |i: usize, end: bool| next.map_or(end, |t| t[i]);
        for (i, op) in self.ops.iter().enumerate() {
            v[i] = match *op {
                Op::Const(b) => b,
                Op::Prop(k) => (state >> k) & 1 == 1,
                Op::Not(a) => !v[a],
                Op::And(a, b) => v[a] && v[b],
                Op::Or(a, b) => v[a] || v[b],
                Op::Implies(a, b) => !v[a] || v[b],
                Op::Iff(a, b) => v[a] == v[b],
                Op::Next { arg, end } => later(arg, end),
                Op::Eventually(a) => v[a] || later(i, false),
                Op::Always(a) => v[a] && later(i, true),
                Op::Until { keep, now, end } => v[now] || (v[keep] && later(i, end)),
                Op::Release { stop, now, end } => v[now] && (v[stop] || later(i, end)),
            };
        }
        v
    }

    fn accepts(&self, ty: &[bool]) -> bool {
        self.roots.iter().all(|&r| ty[r])
    }
}

/// Decides future-only propositional modules exactly.
///
/// Past operators and first-order content make it answer unknown; put
/// [`remove_past`](crate::remove_past) in front of it for past formulas.
#[derive(Debug, Clone, Default)]
pub struct FixpointBackend {
    options: SolverOptions,
}

impl FixpointBackend {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

impl Backend for FixpointBackend {
    fn name(&self) -> &str {
        "fixpoint"
    }

    fn check(&self, module: &Module) -> Result<Verdict, PipelineError> {
        let requirements = module.requirements();
        if requirements.is_empty() {
            return Ok(Verdict::Sat);
        }
        if first_order(requirements) {
            debug!("fixpoint backend: first-order requirements");
            return Ok(Verdict::Unknown);
        }
        let props = occurring_propositions(requirements);
        if props.len() > self.options.max_propositions || props.len() >= u64::BITS as usize {
            debug!(props = props.len(), "fixpoint backend: too many propositions");
            return Ok(Verdict::Unknown);
        }
        let Some(closure) = Closure::compile(requirements, &props) else {
            debug!("fixpoint backend: unsupported operator");
            return Ok(Verdict::Unknown);
        };
        let deadline = deadline_from_timeout_secs(self.options.timeout_secs);
        let states = 1u64 << closure.props;

        let mut types: IndexSet<Vec<bool>> = IndexSet::new();
        for state in 0..states {
            let ty = closure.step(state, None);
            if closure.accepts(&ty) {
                return Ok(Verdict::Sat);
            }
            types.insert(ty);
        }
        let mut frontier = 0;
        while frontier < types.len() {
            if deadline_exceeded(deadline) {
                debug!(types = types.len(), "fixpoint backend: timeout");
                return Ok(Verdict::Unknown);
            }
            let next = types[frontier].clone();
            frontier += 1;
            for state in 0..states {
                let ty = closure.step(state, Some(&next));
                if closure.accepts(&ty) {
                    return Ok(Verdict::Sat);
                }
                types.insert(ty);
            }
        }
        debug!(types = types.len(), "fixpoint backend: saturated");
        Ok(Verdict::Unsat)
    }
}
