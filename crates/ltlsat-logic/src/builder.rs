//! Typed handles and fragment-aware constructors.
//!
//! [`Formula<F>`] and [`Term<F>`] wrap a [`Node`] whose fragment is known to be
//! included in `F`. A [`Builder<F>`] only produces nodes of `F` and only
//! accepts inputs from fragments `A: Within<F>`, so mixing, say, a past
//! formula into a pure LTL builder is a type error. Runtime narrowing goes
//! through `TryFrom<Node>`.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use crate::alphabet::Alphabet;
use crate::errors::ConstructionError;
use crate::fragment::{Fragment, Within};
use crate::hierarchy::{Category, Leaf, Node, Tag};
use crate::sorts::Sort;
use crate::symbol::Symbol;

macro_rules! typed_handle {
    ($name:ident, $category:expr) => {
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name<F: Fragment> {
            node: Node,
            _fragment: PhantomData<F>,
        }

        impl<F: Fragment> $name<F> {
            fn wrap(node: Node) -> Self {
                $name {
                    node,
                    _fragment: PhantomData,
                }
            }

            pub fn node(&self) -> &Node {
                &self.node
            }

            pub fn into_node(self) -> Node {
                self.node
            }

            /// View as a member of a larger fragment.
            pub fn widen<G: Fragment>(self) -> $name<G>
            where
                F: Within<G>,
            {
                $name::wrap(self.node)
            }
        }

        impl<F: Fragment> TryFrom<Node> for $name<F> {
            type Error = ConstructionError;

            fn try_from(node: Node) -> Result<Self, Self::Error> {
                if node.category() != $category {
                    return Err(ConstructionError::WrongCategory {
                        expected: $category,
                        found: node.category(),
                    });
                }
                if !F::ID.includes(node.fragment()) {
                    return Err(ConstructionError::Narrowing {
                        expected: F::ID,
                        found: node.fragment(),
                    });
                }
                Ok($name::wrap(node))
            }
        }

        impl<F: Fragment> From<$name<F>> for Node {
            fn from(handle: $name<F>) -> Node {
                handle.node
            }
        }

        impl<F: Fragment> Deref for $name<F> {
            type Target = Node;

            fn deref(&self) -> &Node {
                &self.node
            }
        }

        impl<F: Fragment> AsRef<Node> for $name<F> {
            fn as_ref(&self) -> &Node {
                &self.node
            }
        }

        impl<F: Fragment> fmt::Debug for $name<F> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}<{}>({:?})", stringify!($name), F::ID, self.node)
            }
        }

        impl<F: Fragment> fmt::Display for $name<F> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.node, f)
            }
        }
    };
}

typed_handle!(Formula, Category::Formula);
typed_handle!(Term, Category::Term);

/// Constructors for the nodes of fragment `F`.
#[derive(Clone)]
pub struct Builder<F: Fragment> {
    sigma: Alphabet,
    _fragment: PhantomData<F>,
}

impl<F: Fragment> fmt::Debug for Builder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("fragment", &F::ID)
            .field("alphabet", &self.sigma)
            .finish()
    }
}

macro_rules! unary_formula {
    ($($(#[$doc:meta])* $fn:ident => $tag:ident),* $(,)?) => {$(
        $(#[$doc])*
        pub fn $fn<A: Within<F>>(&self, arg: &Formula<A>) -> Result<Formula<F>, ConstructionError> {
            self.formula(Tag::$tag, Leaf::None, vec![arg.node.clone()])
        }
    )*};
}

macro_rules! binary_formula {
    ($($(#[$doc:meta])* $fn:ident => $tag:ident),* $(,)?) => {$(
        $(#[$doc])*
        pub fn $fn<A: Within<F>, B: Within<F>>(
            &self,
            left: &Formula<A>,
            right: &Formula<B>,
        ) -> Result<Formula<F>, ConstructionError> {
            self.formula(Tag::$tag, Leaf::None, vec![left.node.clone(), right.node.clone()])
        }
    )*};
}

macro_rules! comparison {
    ($($fn:ident => $tag:ident),* $(,)?) => {$(
        pub fn $fn<A: Within<F>, B: Within<F>>(
            &self,
            left: &Term<A>,
            right: &Term<B>,
        ) -> Result<Formula<F>, ConstructionError> {
            self.formula(Tag::$tag, Leaf::None, vec![left.node.clone(), right.node.clone()])
        }
    )*};
}

macro_rules! unary_term {
    ($($fn:ident => $tag:ident),* $(,)?) => {$(
        pub fn $fn<A: Within<F>>(&self, arg: &Term<A>) -> Result<Term<F>, ConstructionError> {
            self.term(Tag::$tag, Leaf::None, vec![arg.node.clone()])
        }
    )*};
}

macro_rules! binary_term {
    ($($fn:ident => $tag:ident),* $(,)?) => {$(
        pub fn $fn<A: Within<F>, B: Within<F>>(
            &self,
            left: &Term<A>,
            right: &Term<B>,
        ) -> Result<Term<F>, ConstructionError> {
            self.term(Tag::$tag, Leaf::None, vec![left.node.clone(), right.node.clone()])
        }
    )*};
}

impl<F: Fragment> Builder<F> {
    pub(crate) fn new(sigma: Alphabet) -> Self {
        Builder {
            sigma,
            _fragment: PhantomData,
        }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.sigma
    }

    fn formula(
        &self,
        tag: Tag,
        leaf: Leaf,
        children: Vec<Node>,
    ) -> Result<Formula<F>, ConstructionError> {
        self.sigma.make(F::ID, tag, leaf, children).map(Formula::wrap)
    }

    fn term(&self, tag: Tag, leaf: Leaf, children: Vec<Node>) -> Result<Term<F>, ConstructionError> {
        self.sigma.make(F::ID, tag, leaf, children).map(Term::wrap)
    }

    pub fn boolean(&self, value: bool) -> Result<Formula<F>, ConstructionError> {
        self.formula(Tag::Boolean, Leaf::Bool(value), vec![])
    }

    pub fn top(&self) -> Result<Formula<F>, ConstructionError> {
        self.boolean(true)
    }

    pub fn bottom(&self) -> Result<Formula<F>, ConstructionError> {
        self.boolean(false)
    }

    /// Proposition over a boolean variable symbol.
    pub fn prop(&self, symbol: &Symbol) -> Result<Formula<F>, ConstructionError> {
        self.formula(Tag::Proposition, Leaf::Symbol(symbol.clone()), vec![])
    }

    /// Interns a boolean symbol named `name` and returns its proposition.
    pub fn proposition(&self, name: &str) -> Result<Formula<F>, ConstructionError> {
        self.prop(&self.sigma.symbol(name, Sort::Boolean))
    }

    pub fn atom<A: Within<F>>(
        &self,
        relation: &Symbol,
        args: &[Term<A>],
    ) -> Result<Formula<F>, ConstructionError> {
        let children = args.iter().map(|t| t.node.clone()).collect();
        self.formula(Tag::Atom, Leaf::Symbol(relation.clone()), children)
    }

    comparison! {
        equal => Equal,
        not_equal => NotEqual,
        less_than => LessThan,
        less_equal => LessEqual,
        greater_than => GreaterThan,
        greater_equal => GreaterEqual,
    }

    pub fn exists<A: Within<F>>(
        &self,
        variable: &Symbol,
        body: &Formula<A>,
    ) -> Result<Formula<F>, ConstructionError> {
        self.formula(Tag::Exists, Leaf::Symbol(variable.clone()), vec![body.node.clone()])
    }

    pub fn forall<A: Within<F>>(
        &self,
        variable: &Symbol,
        body: &Formula<A>,
    ) -> Result<Formula<F>, ConstructionError> {
        self.formula(Tag::Forall, Leaf::Symbol(variable.clone()), vec![body.node.clone()])
    }

    unary_formula! {
        not => Negation,
        /// Strong next: false at the last position.
        tomorrow => Tomorrow,
        /// Weak next: true at the last position.
        w_tomorrow => WTomorrow,
        eventually => Eventually,
        always => Always,
        /// Strict previous: false at the first position.
        yesterday => Yesterday,
        /// Weak previous: true at the first position.
        w_yesterday => WYesterday,
        once => Once,
        historically => Historically,
    }

    binary_formula! {
        and => Conjunction,
        or => Disjunction,
        implies => Implication,
        iff => Iff,
        until => Until,
        release => Release,
        w_until => WUntil,
        s_release => SRelease,
        since => Since,
        triggered => Triggered,
    }

    /// Conjunction of all operands, folded to the left; `top` when empty.
    pub fn big_and<'a, A: Within<F>>(
        &self,
        operands: impl IntoIterator<Item = &'a Formula<A>>,
    ) -> Result<Formula<F>, ConstructionError> {
        self.fold(Tag::Conjunction, true, operands)
    }

    /// Disjunction of all operands, folded to the left; `bottom` when empty.
    pub fn big_or<'a, A: Within<F>>(
        &self,
        operands: impl IntoIterator<Item = &'a Formula<A>>,
    ) -> Result<Formula<F>, ConstructionError> {
        self.fold(Tag::Disjunction, false, operands)
    }

    fn fold<'a, A: Within<F>>(
        &self,
        tag: Tag,
        unit: bool,
        operands: impl IntoIterator<Item = &'a Formula<A>>,
    ) -> Result<Formula<F>, ConstructionError> {
        let mut acc: Option<Formula<F>> = None;
        for operand in operands {
            acc = Some(match acc {
                None => Formula::wrap(operand.node.clone()),
                Some(left) => self.formula(tag, Leaf::None, vec![left.node, operand.node.clone()])?,
            });
        }
        match acc {
            Some(result) => Ok(result),
            None => self.boolean(unit),
        }
    }

    pub fn var(&self, symbol: &Symbol) -> Result<Term<F>, ConstructionError> {
        self.term(Tag::Variable, Leaf::Symbol(symbol.clone()), vec![])
    }

    pub fn constant(&self, value: i64) -> Result<Term<F>, ConstructionError> {
        self.term(Tag::Constant, Leaf::Int(value), vec![])
    }

    pub fn apply<A: Within<F>>(
        &self,
        function: &Symbol,
        args: &[Term<A>],
    ) -> Result<Term<F>, ConstructionError> {
        let children = args.iter().map(|t| t.node.clone()).collect();
        self.term(Tag::Application, Leaf::Symbol(function.clone()), children)
    }

    unary_term! {
        negative => Negative,
        next => Next,
        wnext => WNext,
        prev => Prev,
        wprev => WPrev,
    }

    binary_term! {
        add => Addition,
        sub => Subtraction,
        mul => Multiplication,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{Foltl, Foltlp, FragmentId, Ltl, Ltlp};

    #[test]
    fn builders_share_the_table() {
        let sigma = Alphabet::new();
        let ltl = sigma.builder::<Ltl>();
        let ltlp = sigma.builder::<Ltlp>();
        let p = ltl.proposition("p").unwrap();
        let q = ltlp.proposition("q").unwrap();
        let a = ltl.until(&p, &ltl.proposition("q").unwrap()).unwrap();
        let b = ltlp.until(&p, &q).unwrap();
        assert_eq!(a.node(), b.node());
        assert_eq!(a.fragment(), FragmentId::Ltl);
    }

    #[test]
    fn widening_keeps_the_node() {
        let sigma = Alphabet::new();
        let p = sigma.builder::<Ltl>().proposition("p").unwrap();
        let wide: Formula<Foltlp> = p.clone().widen();
        assert_eq!(wide.node(), p.node());
    }

    #[test]
    fn narrowing_is_checked() {
        let sigma = Alphabet::new();
        let b = sigma.builder::<Ltlp>();
        let y = b.yesterday(&b.proposition("p").unwrap()).unwrap();
        let err = Formula::<Ltl>::try_from(y.node().clone()).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::Narrowing {
                expected: FragmentId::Ltl,
                found: FragmentId::Ltlp
            }
        );
        assert!(Formula::<Foltlp>::try_from(y.into_node()).is_ok());
    }

    #[test]
    fn term_is_not_a_formula() {
        let sigma = Alphabet::new();
        let c = sigma.builder::<Foltl>().constant(1).unwrap();
        assert!(matches!(
            Formula::<Foltl>::try_from(c.into_node()),
            Err(ConstructionError::WrongCategory { .. })
        ));
    }

    #[test]
    fn big_operators_fold_left() {
        let sigma = Alphabet::new();
        let b = sigma.builder::<Ltl>();
        let p = b.proposition("p").unwrap();
        let q = b.proposition("q").unwrap();
        let r = b.proposition("r").unwrap();
        let all = b.big_and([&p, &q, &r]).unwrap();
        let expected = b.and(&b.and(&p, &q).unwrap(), &r).unwrap();
        assert_eq!(all, expected);
        assert_eq!(b.big_or([&p]).unwrap(), p);
        assert_eq!(b.big_and(std::iter::empty::<&Formula<Ltl>>()).unwrap(), b.top().unwrap());
        assert_eq!(b.big_or(std::iter::empty::<&Formula<Ltl>>()).unwrap(), b.bottom().unwrap());
    }

    #[test]
    fn first_order_terms_are_sorted() {
        let sigma = Alphabet::new();
        let b = sigma.builder::<Foltl>();
        let x = b.var(&sigma.symbol("x", Sort::Integer)).unwrap();
        let one = b.constant(1).unwrap();
        let sum = b.add(&x, &one).unwrap();
        assert_eq!(sum.sort(), Some(&Sort::Integer));
        assert!(b.less_than(&sum, &b.next(&x).unwrap()).is_ok());

        let node = sigma.sort("Node");
        let n = b.var(&sigma.symbol("n", node.clone())).unwrap();
        assert!(matches!(
            b.add(&n, &one),
            Err(ConstructionError::SortMismatch { .. })
        ));
        assert!(matches!(
            b.equal(&n, &one),
            Err(ConstructionError::SortMismatch { .. })
        ));
        let succ = sigma.symbol("succ", crate::sorts::SymbolType::function(vec![node.clone()], node));
        assert!(b.equal(&b.apply(&succ, &[n.clone()]).unwrap(), &n).is_ok());
    }
}
