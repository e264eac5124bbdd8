//! Proptest strategies for propositional formulas.
//!
//! Strategies produce a [`Shape`], a plain tree that shrinks well and is
//! independent of any interning table. Tests turn it into a node of their own
//! alphabet with [`Shape::build`].

use proptest::prelude::*;

use crate::alphabet::Alphabet;
use crate::errors::ConstructionError;
use crate::fragment::FragmentId;
use crate::hierarchy::{Leaf, Node, Tag};
use crate::symbol::Symbol;

/// Propositional formula skeleton over indexed propositions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Const(bool),
    Prop(usize),
    Unary(Tag, Box<Shape>),
    Binary(Tag, Box<Shape>, Box<Shape>),
}

impl Shape {
    /// Intern this shape in `sigma`. `Prop(i)` maps to `props[i % props.len()]`.
    pub fn build(&self, sigma: &Alphabet, props: &[Symbol]) -> Result<Node, ConstructionError> {
        let make = |tag, leaf, children| sigma.make(FragmentId::Ltlp, tag, leaf, children);
        match self {
            Shape::Const(b) => make(Tag::Boolean, Leaf::Bool(*b), vec![]),
            Shape::Prop(i) if !props.is_empty() => make(
                Tag::Proposition,
                Leaf::Symbol(props[i % props.len()].clone()),
                vec![],
            ),
            Shape::Prop(_) => make(Tag::Boolean, Leaf::Bool(true), vec![]),
            Shape::Unary(tag, arg) => make(*tag, Leaf::None, vec![arg.build(sigma, props)?]),
            Shape::Binary(tag, l, r) => make(
                *tag,
                Leaf::None,
                vec![l.build(sigma, props)?, r.build(sigma, props)?],
            ),
        }
    }
}

const FUTURE_UNARY: [Tag; 5] = [
    Tag::Negation,
    Tag::Tomorrow,
    Tag::WTomorrow,
    Tag::Eventually,
    Tag::Always,
];

const FUTURE_BINARY: [Tag; 8] = [
    Tag::Conjunction,
    Tag::Disjunction,
    Tag::Implication,
    Tag::Iff,
    Tag::Until,
    Tag::Release,
    Tag::WUntil,
    Tag::SRelease,
];

const PAST_UNARY: [Tag; 4] = [Tag::Yesterday, Tag::WYesterday, Tag::Once, Tag::Historically];

const PAST_BINARY: [Tag; 2] = [Tag::Since, Tag::Triggered];

fn arb_shape(
    props: usize,
    depth: u32,
    unary: Vec<Tag>,
    binary: Vec<Tag>,
) -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        1 => any::<bool>().prop_map(Shape::Const),
        4 => (0..props.max(1)).prop_map(Shape::Prop),
    ];
    leaf.prop_recursive(depth, 24, 2, move |inner| {
        prop_oneof![
            (proptest::sample::select(unary.clone()), inner.clone())
                .prop_map(|(tag, arg)| Shape::Unary(tag, Box::new(arg))),
            (proptest::sample::select(binary.clone()), inner.clone(), inner)
                .prop_map(|(tag, l, r)| Shape::Binary(tag, Box::new(l), Box::new(r))),
        ]
    })
}

/// Future-only propositional formulas over `props` propositions.
pub fn arb_ltl_shape(props: usize, depth: u32) -> impl Strategy<Value = Shape> {
    arb_shape(props, depth, FUTURE_UNARY.to_vec(), FUTURE_BINARY.to_vec())
}

/// Propositional formulas mixing future and past operators.
pub fn arb_ltlp_shape(props: usize, depth: u32) -> impl Strategy<Value = Shape> {
    let unary = FUTURE_UNARY.iter().chain(&PAST_UNARY).copied().collect();
    let binary = FUTURE_BINARY.iter().chain(&PAST_BINARY).copied().collect();
    arb_shape(props, depth, unary, binary)
}
