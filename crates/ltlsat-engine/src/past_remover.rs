//! Elimination of past operators.
//!
//! Every distinct `Y q`, `Z q` and `q S r` subformula (after its own children
//! have been rewritten) is replaced by a fresh proposition, and axioms pinning
//! the proposition to the subformula's value at every position are added.
//! `O`, `H` and `T` are normalized into `S` first:
//!
//! ```text
//! O q      =  true S q
//! H q      =  !(true S !q)
//! q T r    =  !(!q S !r)
//! ```
//!
//! The axioms, with `x` the fresh proposition:
//!
//! ```text
//! Y q      :  !x & G((X x -> q) & (q -> wX x))
//! Z q      :   x & G((X x -> q) & (q -> wX x))
//! q S r    :  G(x <-> (r | (q & y)))        where y is the proposition of Y x
//! ```
//!
//! The result is equisatisfiable with the input, every model of the input
//! extends to exactly one model of the result, and every model of the result
//! restricts to a model of the input.
//!
//! Fresh names avoid every symbol occurring in the input, bound or free. A
//! past subformula mentioning a variable bound by an enclosing quantifier
//! has no proposition-per-position encoding and is rejected as unsupported.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use ltlsat_logic::{
    free_symbols, has_class, scan, symbols, Alphabet, ConstructionError, FragmentId, Handlers,
    Leaf, Node, Sort, Symbol, Tag, TagClass,
};

use crate::errors::PipelineError;
use crate::module::Module;
use crate::options::PastRemoverOptions;
use crate::transform::Transform;

const STAGE: &str = "remove_past";

/// Output of [`PastRemover::remove`].
#[derive(Debug, Clone)]
pub struct Removal {
    pub module: Module,
    /// Each fresh proposition with the past formula it tracks, in allocation
    /// order. A formula mentions only source symbols and earlier propositions.
    pub definitions: Vec<(Symbol, Node)>,
}

/// Replaces past operators with fresh propositions and future axioms.
#[derive(Debug, Clone, Default)]
pub struct PastRemover {
    options: PastRemoverOptions,
}

/// The past remover with default options, as a transform.
pub fn remove_past() -> Transform {
    PastRemover::default().into_transform()
}

impl PastRemover {
    pub fn new(options: PastRemoverOptions) -> Self {
        Self { options }
    }

    pub fn into_transform(self) -> Transform {
        Transform::new(STAGE, move |module| self.run(module))
    }

    /// Remove the past operators of every requirement of `module`.
    pub fn run(&self, module: &Module) -> Result<Module, PipelineError> {
        self.remove(module).map(|removal| removal.module)
    }

    /// Like [`PastRemover::run`], also reporting what each fresh proposition stands for.
    pub fn remove(&self, module: &Module) -> Result<Removal, PipelineError> {
        if !module
            .requirements()
            .iter()
            .any(|r| has_class(TagClass::Past, r))
        {
            debug!("no past operators, module unchanged");
            return Ok(Removal {
                module: module.clone(),
                definitions: Vec::new(),
            });
        }
        for requirement in module.requirements() {
            reject_bound_past(requirement)?;
        }

        let mut out = module.without_requirements();
        let (rewritten, axioms, definitions) = {
            let mut tracker =
                Tracker::new(&mut out, &self.options.fresh_prefix, module.requirements());
            let rewritten = tracker.rewrite(module.requirements())?;
            let axioms = tracker.axioms()?;
            let definitions = tracker.definitions();
            (rewritten, axioms, definitions)
        };
        debug!(
            requirements = rewritten.len(),
            tracked = definitions.len(),
            axioms = axioms.len(),
            "past operators removed"
        );
        for formula in rewritten.iter().chain(&axioms) {
            out.require(formula)?;
        }
        Ok(Removal {
            module: out,
            definitions,
        })
    }

    /// Remove the past operators of a single formula.
    ///
    /// Fresh propositions are declared in `module`. The returned formula is
    /// the rewritten `formula` conjoined with its axioms; it is not added to
    /// the module's requirements.
    pub fn remove_formula(&self, module: &mut Module, formula: &Node) -> Result<Node, PipelineError> {
        reject_bound_past(formula)?;
        let sigma = module.alphabet().clone();
        let mut tracker = Tracker::new(
            module,
            &self.options.fresh_prefix,
            std::slice::from_ref(formula),
        );
        let mut parts = tracker.rewrite(std::slice::from_ref(formula))?;
        parts.extend(tracker.axioms()?);
        let mut acc: Option<Node> = None;
        for part in parts {
            acc = Some(match acc {
                None => part,
                Some(left) => make(&sigma, Tag::Conjunction, vec![left, part])?,
            });
        }
        match acc {
            Some(result) => Ok(result),
            None => Ok(make_leaf(&sigma, Tag::Boolean, Leaf::Bool(true))?),
        }
    }
}

fn make(sigma: &Alphabet, tag: Tag, children: Vec<Node>) -> Result<Node, ConstructionError> {
    sigma.make(FragmentId::Foltlp, tag, Leaf::None, children)
}

fn make_leaf(sigma: &Alphabet, tag: Tag, leaf: Leaf) -> Result<Node, ConstructionError> {
    sigma.make(FragmentId::Foltlp, tag, leaf, vec![])
}

/// Fails on the first past subformula that mentions a variable bound by an
/// enclosing quantifier.
fn reject_bound_past(formula: &Node) -> Result<(), PipelineError> {
    let mut offending = None;
    scan(formula, |q| {
        let Some(bound) = q.symbol().filter(|_| q.tag().is(TagClass::Quantifier)) else {
            return false;
        };
        offending = scan(q, |n| n.tag().is(TagClass::Past) && free_symbols(n).contains(bound))
            .found
            .map(|n| n.tag());
        offending.is_some()
    });
    match offending {
        Some(tag) => Err(PipelineError::Unsupported { stage: STAGE, tag }),
        None => Ok(()),
    }
}

/// Past subformulas seen so far, each with its fresh proposition.
struct Tracker<'m> {
    sigma: Alphabet,
    module: &'m mut Module,
    prefix: &'m str,
    /// Names occurring in the formulas being rewritten or in the module.
    reserved: HashSet<Arc<str>>,
    table: IndexMap<Node, Node>,
}

impl<'m> Tracker<'m> {
    fn new(module: &'m mut Module, prefix: &'m str, sources: &[Node]) -> Self {
        let reserved: HashSet<Arc<str>> = sources
            .iter()
            .chain(module.requirements())
            .flat_map(symbols)
            .map(|s| Arc::from(s.name()))
            .collect();
        Tracker {
            sigma: module.alphabet().clone(),
            module,
            prefix,
            reserved,
            table: IndexMap::new(),
        }
    }

    fn top(&self) -> Result<Node, ConstructionError> {
        make_leaf(&self.sigma, Tag::Boolean, Leaf::Bool(true))
    }

    fn not(&self, arg: Node) -> Result<Node, ConstructionError> {
        make(&self.sigma, Tag::Negation, vec![arg])
    }

    /// Proposition standing for `past`, allocating it on first sight.
    fn track(&mut self, past: Node) -> Result<Node, PipelineError> {
        if let Some(x) = self.table.get(&past) {
            return Ok(x.clone());
        }
        let object = self
            .module
            .fresh_avoiding(self.prefix, Sort::Boolean, &self.reserved);
        let x = make_leaf(&self.sigma, Tag::Proposition, Leaf::Symbol(object.symbol().clone()))?;
        let is_since = past.tag() == Tag::Since;
        self.table.insert(past, x.clone());
        if is_since {
            let previous = make(&self.sigma, Tag::Yesterday, vec![x.clone()])?;
            self.track(previous)?;
        }
        Ok(x)
    }

    fn rewrite(&mut self, requirements: &[Node]) -> Result<Vec<Node>, PipelineError> {
        let sigma = self.sigma.clone();
        let state = RefCell::new(self);
        let handlers: Handlers<'_, Node, PipelineError> = Handlers::rebuilding(&sigma)
            .on(Tag::Yesterday, |n, kids| {
                let past = sigma.rebuild(n, kids)?;
                state.borrow_mut().track(past)
            })
            .on(Tag::WYesterday, |n, kids| {
                let past = sigma.rebuild(n, kids)?;
                state.borrow_mut().track(past)
            })
            .on(Tag::Since, |n, kids| {
                let past = sigma.rebuild(n, kids)?;
                state.borrow_mut().track(past)
            })
            .on(Tag::Once, |_, mut kids| {
                let mut t = state.borrow_mut();
                let q = kids.swap_remove(0);
                let since = make(&sigma, Tag::Since, vec![t.top()?, q])?;
                t.track(since)
            })
            .on(Tag::Historically, |_, mut kids| {
                let mut t = state.borrow_mut();
                let not_q = t.not(kids.swap_remove(0))?;
                let since = make(&sigma, Tag::Since, vec![t.top()?, not_q])?;
                let x = t.track(since)?;
                Ok(t.not(x)?)
            })
            .on(Tag::Triggered, |_, kids| {
                let mut t = state.borrow_mut();
                let mut kids = kids.into_iter();
                let (Some(q), Some(r)) = (kids.next(), kids.next()) else {
                    return Err(PipelineError::Unsupported {
                        stage: STAGE,
                        tag: Tag::Triggered,
                    });
                };
                let since = make(&sigma, Tag::Since, vec![t.not(q)?, t.not(r)?])?;
                let x = t.track(since)?;
                Ok(t.not(x)?)
            })
            .on(TagClass::Past, |n, _| {
                Err(PipelineError::Unsupported {
                    stage: STAGE,
                    tag: n.tag(),
                })
            });
        handlers.rewrite_all(requirements)
    }

    fn definitions(&self) -> Vec<(Symbol, Node)> {
        self.table
            .iter()
            .filter_map(|(past, x)| x.symbol().map(|s| (s.clone(), past.clone())))
            .collect()
    }

    fn axioms(&self) -> Result<Vec<Node>, PipelineError> {
        let s = &self.sigma;
        let mut axioms = Vec::with_capacity(self.table.len());
        for (past, x) in &self.table {
            let axiom = match past.children() {
                [q] => {
                    // (X x -> q) & (q -> wX x), anchored by x's initial value
                    let step = make(
                        s,
                        Tag::Conjunction,
                        vec![
                            make(
                                s,
                                Tag::Implication,
                                vec![make(s, Tag::Tomorrow, vec![x.clone()])?, q.clone()],
                            )?,
                            make(
                                s,
                                Tag::Implication,
                                vec![q.clone(), make(s, Tag::WTomorrow, vec![x.clone()])?],
                            )?,
                        ],
                    )?;
                    let start = if past.tag() == Tag::Yesterday {
                        self.not(x.clone())?
                    } else {
                        x.clone()
                    };
                    make(s, Tag::Conjunction, vec![start, make(s, Tag::Always, vec![step])?])?
                }
                [q, r] => {
                    let previous = make(s, Tag::Yesterday, vec![x.clone()])?;
                    let y = self.table.get(&previous).cloned().ok_or(
                        PipelineError::Unsupported {
                            stage: STAGE,
                            tag: Tag::Since,
                        },
                    )?;
                    let holds = make(
                        s,
                        Tag::Disjunction,
                        vec![r.clone(), make(s, Tag::Conjunction, vec![q.clone(), y])?],
                    )?;
                    make(s, Tag::Always, vec![make(s, Tag::Iff, vec![x.clone(), holds])?])?
                }
                _ => {
                    return Err(PipelineError::Unsupported {
                        stage: STAGE,
                        tag: past.tag(),
                    })
                }
            };
            axioms.push(axiom);
        }
        Ok(axioms)
    }
}
