//! The interning table.
//!
//! An [`Alphabet`] owns every node, symbol and uninterpreted sort name built
//! through it. Tables have an explicit lifetime (typically one per analysis
//! run) instead of living in a global: nodes from different alphabets never
//! compare equal and cannot be combined.

use indexmap::IndexMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

use crate::builder::Builder;
use crate::errors::ConstructionError;
use crate::fragment::{Fragment, FragmentId};
use crate::hierarchy::{Arity, Category, Leaf, Node, NodeData, Tag, TagClass};
use crate::sorts::{Sort, SortName, SymbolType};
use crate::symbol::{Symbol, SymbolData};

static NEXT_TABLE: AtomicU64 = AtomicU64::new(0);

/// Identity of an interning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TableId(u64);

#[derive(PartialEq, Eq, Hash)]
struct NodeKey {
    tag: Tag,
    leaf: Leaf,
    children: Vec<Node>,
}

#[derive(Default)]
struct Tables {
    nodes: IndexMap<NodeKey, Node>,
    symbols: IndexMap<(Arc<str>, SymbolType), Symbol>,
    sorts: IndexMap<Arc<str>, SortName>,
}

impl Drop for Tables {
    fn drop(&mut self) {
        // Newest first: parents go before their children, so no drop cascades.
        while self.nodes.pop().is_some() {}
    }
}

struct AlphabetInner {
    id: TableId,
    tables: Mutex<Tables>,
}

impl Drop for AlphabetInner {
    fn drop(&mut self) {
        let tables = self.tables.get_mut().unwrap_or_else(PoisonError::into_inner);
        trace!(
            table = self.id.0,
            nodes = tables.nodes.len(),
            symbols = tables.symbols.len(),
            "dropping alphabet"
        );
    }
}

/// Shared handle to an interning table. Cloning shares the table.
#[derive(Clone)]
pub struct Alphabet {
    inner: Arc<AlphabetInner>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alphabet")
            .field("id", &self.inner.id.0)
            .field("nodes", &self.node_count())
            .finish()
    }
}

impl PartialEq for Alphabet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Alphabet {}

impl Alphabet {
    pub fn new() -> Self {
        let id = TableId(NEXT_TABLE.fetch_add(1, Ordering::Relaxed));
        trace!(table = id.0, "new alphabet");
        Alphabet {
            inner: Arc::new(AlphabetInner {
                id,
                tables: Mutex::new(Tables::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn id(&self) -> TableId {
        self.inner.id
    }

    /// Whether `node` was interned by this alphabet.
    pub fn owns(&self, node: &Node) -> bool {
        node.table() == self.inner.id
    }

    pub fn owns_symbol(&self, symbol: &Symbol) -> bool {
        symbol.table() == self.inner.id
    }

    /// Number of distinct nodes interned so far.
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Intern a symbol (get-or-create on `(name, ty)`).
    pub fn symbol(&self, name: &str, ty: impl Into<SymbolType>) -> Symbol {
        let ty = ty.into();
        let mut tables = self.lock();
        if let Some(existing) = tables.symbols.get(&(Arc::from(name), ty.clone())) {
            return existing.clone();
        }
        let name: Arc<str> = Arc::from(name);
        let symbol = Symbol(Arc::new(SymbolData {
            name: name.clone(),
            ty: ty.clone(),
            table: self.inner.id,
            id: tables.symbols.len() as u32,
        }));
        tables.symbols.insert((name, ty), symbol.clone());
        symbol
    }

    /// Intern the name of an uninterpreted sort.
    pub fn sort(&self, name: &str) -> Sort {
        let mut tables = self.lock();
        let sort_name = tables
            .sorts
            .entry(Arc::from(name))
            .or_insert_with_key(|key| SortName(key.clone()))
            .clone();
        Sort::Uninterpreted(sort_name)
    }

    /// Builder restricted to fragment `F`.
    pub fn builder<F: Fragment>(&self) -> Builder<F> {
        Builder::new(self.clone())
    }

    /// Return the canonical node for `(tag, leaf, children)`.
    ///
    /// Fails when `tag` or any child lies outside `fragment`, or when the
    /// leaf, arity, child categories or sorts do not fit `tag`.
    pub fn make(
        &self,
        fragment: FragmentId,
        tag: Tag,
        leaf: Leaf,
        children: Vec<Node>,
    ) -> Result<Node, ConstructionError> {
        let shape = self.check(fragment, tag, &leaf, &children)?;

        let key = NodeKey {
            tag,
            leaf,
            children,
        };
        let mut tables = self.lock();
        if let Some(existing) = tables.nodes.get(&key) {
            return Ok(existing.clone());
        }

        let mut hasher = DefaultHasher::new();
        key.tag.hash(&mut hasher);
        key.leaf.hash(&mut hasher);
        for child in &key.children {
            hasher.write_u64(child.hash_value());
        }
        let node = Node(Arc::new(NodeData {
            tag: key.tag,
            leaf: key.leaf.clone(),
            children: key.children.clone(),
            sort: shape.sort,
            fragment: shape.fragment,
            hash: hasher.finish(),
            id: tables.nodes.len() as u64,
            table: self.inner.id,
            size: key
                .children
                .iter()
                .fold(1usize, |acc, c| acc.saturating_add(c.size())),
            depth: 1 + key.children.iter().map(Node::depth).max().unwrap_or(0),
        }));
        tables.nodes.insert(key, node.clone());
        Ok(node)
    }

    /// Re-make `node` with the same tag and leaf over new children.
    ///
    /// Returns `node` itself when the children are unchanged.
    pub fn rebuild(&self, node: &Node, children: Vec<Node>) -> Result<Node, ConstructionError> {
        if children.as_slice() == node.children() && self.owns(node) {
            return Ok(node.clone());
        }
        self.make(FragmentId::Foltlp, node.tag(), node.leaf().clone(), children)
    }

    fn check(
        &self,
        fragment: FragmentId,
        tag: Tag,
        leaf: &Leaf,
        children: &[Node],
    ) -> Result<Shape, ConstructionError> {
        if !fragment.includes(tag.fragment()) {
            return Err(ConstructionError::FragmentViolation {
                tag,
                fragment,
                required: tag.fragment(),
            });
        }
        if !leaf.kind_matches(tag.leaf_kind()) {
            return Err(ConstructionError::LeafMismatch {
                tag,
                leaf: format!("{leaf:?}"),
            });
        }
        if let Leaf::Symbol(symbol) = leaf {
            if !self.owns_symbol(symbol) {
                return Err(ConstructionError::ForeignAlphabet { tag });
            }
        }

        let expected = match tag.arity() {
            Arity::Fixed(n) => n,
            Arity::Signature => match leaf {
                Leaf::Symbol(symbol) => symbol.ty().params().len(),
                _ => 0,
            },
        };
        if children.len() != expected {
            return Err(ConstructionError::Arity {
                tag,
                expected,
                found: children.len(),
            });
        }

        let mut joined = tag.fragment();
        for (index, child) in children.iter().enumerate() {
            if !self.owns(child) {
                return Err(ConstructionError::ForeignAlphabet { tag });
            }
            if child.category() != tag.child_category() {
                return Err(ConstructionError::Category {
                    tag,
                    index,
                    expected: tag.child_category(),
                });
            }
            if !fragment.includes(child.fragment()) {
                return Err(ConstructionError::FragmentViolation {
                    tag: child.tag(),
                    fragment,
                    required: child.fragment(),
                });
            }
            joined = joined.join(child.fragment());
        }

        let sort = infer_sort(tag, leaf, children)?;
        Ok(Shape {
            sort,
            fragment: joined,
        })
    }
}

struct Shape {
    sort: Option<Sort>,
    fragment: FragmentId,
}

fn term_sort(tag: Tag, node: &Node) -> Result<&Sort, ConstructionError> {
    node.sort().ok_or(ConstructionError::Category {
        tag,
        index: 0,
        expected: Category::Term,
    })
}

fn expect_sort(tag: Tag, expected: &Sort, found: &Sort) -> Result<(), ConstructionError> {
    if expected == found {
        Ok(())
    } else {
        Err(ConstructionError::SortMismatch {
            tag,
            expected: expected.to_string(),
            found: found.clone(),
        })
    }
}

fn expect_numeric(tag: Tag, found: &Sort) -> Result<(), ConstructionError> {
    if found.is_numeric() {
        Ok(())
    } else {
        Err(ConstructionError::SortMismatch {
            tag,
            expected: "a numeric sort".to_string(),
            found: found.clone(),
        })
    }
}

/// Sort of the node being built (terms), after checking child sorts.
fn infer_sort(tag: Tag, leaf: &Leaf, children: &[Node]) -> Result<Option<Sort>, ConstructionError> {
    let symbol = match leaf {
        Leaf::Symbol(symbol) => Some(symbol),
        _ => None,
    };
    match tag {
        Tag::Proposition => {
            let sort = symbol.and_then(|s| s.sort()).cloned().unwrap_or(Sort::Boolean);
            expect_sort(tag, &Sort::Boolean, &sort)?;
            Ok(None)
        }
        Tag::Variable => Ok(symbol.and_then(|s| s.sort()).cloned()),
        Tag::Constant => Ok(Some(Sort::Integer)),
        Tag::Atom | Tag::Application => {
            let params = symbol.map(|s| s.ty().params()).unwrap_or(&[]);
            for (param, child) in params.iter().zip(children) {
                expect_sort(tag, param, term_sort(tag, child)?)?;
            }
            match symbol.map(|s| s.ty()) {
                Some(SymbolType::Function { range, .. }) => Ok(Some(range.clone())),
                _ => Ok(None),
            }
        }
        Tag::Equal | Tag::NotEqual => {
            let left = term_sort(tag, &children[0])?;
            expect_sort(tag, left, term_sort(tag, &children[1])?)?;
            Ok(None)
        }
        _ if tag.is(TagClass::Comparison) || tag.is(TagClass::Arithmetic) => {
            for child in children {
                expect_numeric(tag, term_sort(tag, child)?)?;
            }
            Ok(if tag.category() == Category::Term {
                Some(Sort::Integer)
            } else {
                None
            })
        }
        Tag::Next | Tag::WNext | Tag::Prev | Tag::WPrev => {
            Ok(Some(term_sort(tag, &children[0])?.clone()))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(sigma: &Alphabet, name: &str) -> Node {
        let p = sigma.symbol(name, Sort::Boolean);
        sigma
            .make(FragmentId::Ltl, Tag::Proposition, Leaf::Symbol(p), vec![])
            .unwrap()
    }

    #[test]
    fn interning_returns_identical_nodes() {
        let sigma = Alphabet::new();
        let p1 = prop(&sigma, "p");
        let p2 = prop(&sigma, "p");
        assert_eq!(p1, p2);
        assert_eq!(p1.id(), p2.id());

        let a = sigma
            .make(FragmentId::Ltl, Tag::Negation, Leaf::None, vec![p1])
            .unwrap();
        let b = sigma
            .make(FragmentId::Ltl, Tag::Negation, Leaf::None, vec![p2])
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(sigma.node_count(), 2);
    }

    #[test]
    fn symbols_are_interned_by_name_and_type() {
        let sigma = Alphabet::new();
        let x1 = sigma.symbol("x", Sort::Integer);
        let x2 = sigma.symbol("x", Sort::Integer);
        let x3 = sigma.symbol("x", Sort::Boolean);
        assert_eq!(x1, x2);
        assert_ne!(x1, x3);
    }

    #[test]
    fn sorts_are_interned() {
        let sigma = Alphabet::new();
        assert_eq!(sigma.sort("Node"), sigma.sort("Node"));
        assert_ne!(sigma.sort("Node"), sigma.sort("Edge"));
    }

    #[test]
    fn arity_is_checked() {
        let sigma = Alphabet::new();
        let p = prop(&sigma, "p");
        let err = sigma
            .make(FragmentId::Ltl, Tag::Conjunction, Leaf::None, vec![p])
            .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::Arity {
                tag: Tag::Conjunction,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn leaf_kind_is_checked() {
        let sigma = Alphabet::new();
        let err = sigma
            .make(FragmentId::Ltl, Tag::Boolean, Leaf::Int(3), vec![])
            .unwrap_err();
        assert!(matches!(err, ConstructionError::LeafMismatch { .. }));
    }

    #[test]
    fn proposition_requires_boolean_variable() {
        let sigma = Alphabet::new();
        let x = sigma.symbol("x", Sort::Integer);
        let err = sigma
            .make(FragmentId::Ltl, Tag::Proposition, Leaf::Symbol(x), vec![])
            .unwrap_err();
        assert!(matches!(err, ConstructionError::SortMismatch { .. }));
    }

    #[test]
    fn nodes_from_other_alphabets_are_rejected() {
        let sigma = Alphabet::new();
        let other = Alphabet::new();
        let p = prop(&other, "p");
        let err = sigma
            .make(FragmentId::Ltl, Tag::Negation, Leaf::None, vec![p])
            .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::ForeignAlphabet {
                tag: Tag::Negation
            }
        );
    }

    #[test]
    fn rebuild_with_same_children_is_identity() {
        let sigma = Alphabet::new();
        let p = prop(&sigma, "p");
        let not_p = sigma
            .make(FragmentId::Ltl, Tag::Negation, Leaf::None, vec![p.clone()])
            .unwrap();
        let again = sigma.rebuild(&not_p, vec![p]).unwrap();
        assert_eq!(again, not_p);
        let q = prop(&sigma, "q");
        let not_q = sigma.rebuild(&not_p, vec![q.clone()]).unwrap();
        assert_eq!(not_q.children(), &[q]);
    }

    #[test]
    fn concurrent_construction_preserves_identity() {
        let sigma = Alphabet::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sigma = sigma.clone();
                std::thread::spawn(move || {
                    let p = prop(&sigma, "p");
                    let q = prop(&sigma, "q");
                    sigma
                        .make(FragmentId::Ltl, Tag::Until, Leaf::None, vec![p, q])
                        .unwrap()
                })
            })
            .collect();
        let nodes: Vec<Node> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(nodes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(sigma.node_count(), 3);
    }

    #[test]
    fn deep_formula_drops_without_overflow() {
        let sigma = Alphabet::new();
        let mut node = prop(&sigma, "p");
        for _ in 0..200_000 {
            node = sigma
                .make(FragmentId::Ltl, Tag::Tomorrow, Leaf::None, vec![node])
                .unwrap();
        }
        assert_eq!(node.depth(), 200_001);
        drop(sigma);
        drop(node);
    }
}
