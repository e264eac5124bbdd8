//! Syntax elements and hash-consed hierarchy nodes.
//!
//! Every formula and term is a [`Node`]: a syntax-element [`Tag`], a leaf
//! payload ([`Leaf`]) and an ordered list of children. Nodes are only built
//! by an [`Alphabet`](crate::Alphabet), which canonicalizes them, so two nodes
//! are structurally equal iff they are the same allocation. Equality and
//! hashing are therefore identity-based and O(1).

use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::alphabet::TableId;
use crate::fragment::FragmentId;
use crate::sorts::Sort;
use crate::symbol::{Symbol, SymbolKind};

/// Whether a node is a formula or a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Formula,
    Term,
}

/// Groups of tags that handlers can match on as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TagClass {
    Formula,
    Term,
    /// Boolean connectives (negation, conjunction, ...).
    Connective,
    Comparison,
    Quantifier,
    Arithmetic,
    /// Any temporal operator, on formulas or on terms.
    Temporal,
    Future,
    Past,
}

/// Expected shape of the leaf payload of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    None,
    Bool,
    Int,
    Symbol(SymbolKind),
}

/// Expected number of children of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// Given by the parameter list of the leaf symbol.
    Signature,
}

/// Syntax elements of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tag {
    // formulas
    Boolean,
    Proposition,
    Atom,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Exists,
    Forall,
    Negation,
    Conjunction,
    Disjunction,
    Implication,
    Iff,
    Tomorrow,
    WTomorrow,
    Eventually,
    Always,
    Until,
    Release,
    WUntil,
    SRelease,
    Yesterday,
    WYesterday,
    Once,
    Historically,
    Since,
    Triggered,
    // terms
    Variable,
    Constant,
    Application,
    Negative,
    Addition,
    Subtraction,
    Multiplication,
    Next,
    WNext,
    Prev,
    WPrev,
}

impl Tag {
    pub const ALL: [Tag; 41] = [
        Tag::Boolean,
        Tag::Proposition,
        Tag::Atom,
        Tag::Equal,
        Tag::NotEqual,
        Tag::LessThan,
        Tag::LessEqual,
        Tag::GreaterThan,
        Tag::GreaterEqual,
        Tag::Exists,
        Tag::Forall,
        Tag::Negation,
        Tag::Conjunction,
        Tag::Disjunction,
        Tag::Implication,
        Tag::Iff,
        Tag::Tomorrow,
        Tag::WTomorrow,
        Tag::Eventually,
        Tag::Always,
        Tag::Until,
        Tag::Release,
        Tag::WUntil,
        Tag::SRelease,
        Tag::Yesterday,
        Tag::WYesterday,
        Tag::Once,
        Tag::Historically,
        Tag::Since,
        Tag::Triggered,
        Tag::Variable,
        Tag::Constant,
        Tag::Application,
        Tag::Negative,
        Tag::Addition,
        Tag::Subtraction,
        Tag::Multiplication,
        Tag::Next,
        Tag::WNext,
        Tag::Prev,
        Tag::WPrev,
    ];

    pub fn category(self) -> Category {
        match self {
            Tag::Variable
            | Tag::Constant
            | Tag::Application
            | Tag::Negative
            | Tag::Addition
            | Tag::Subtraction
            | Tag::Multiplication
            | Tag::Next
            | Tag::WNext
            | Tag::Prev
            | Tag::WPrev => Category::Term,
            _ => Category::Formula,
        }
    }

    /// Category expected of every child.
    pub fn child_category(self) -> Category {
        if self.category() == Category::Term
            || self.is(TagClass::Comparison)
            || self == Tag::Atom
        {
            Category::Term
        } else {
            Category::Formula
        }
    }

    pub fn leaf_kind(self) -> LeafKind {
        match self {
            Tag::Boolean => LeafKind::Bool,
            Tag::Constant => LeafKind::Int,
            Tag::Proposition | Tag::Variable | Tag::Exists | Tag::Forall => {
                LeafKind::Symbol(SymbolKind::Variable)
            }
            Tag::Atom => LeafKind::Symbol(SymbolKind::Relation),
            Tag::Application => LeafKind::Symbol(SymbolKind::Function),
            _ => LeafKind::None,
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Tag::Boolean | Tag::Proposition | Tag::Variable | Tag::Constant => Arity::Fixed(0),
            Tag::Atom | Tag::Application => Arity::Signature,
            Tag::Exists
            | Tag::Forall
            | Tag::Negation
            | Tag::Tomorrow
            | Tag::WTomorrow
            | Tag::Eventually
            | Tag::Always
            | Tag::Yesterday
            | Tag::WYesterday
            | Tag::Once
            | Tag::Historically
            | Tag::Negative
            | Tag::Next
            | Tag::WNext
            | Tag::Prev
            | Tag::WPrev => Arity::Fixed(1),
            _ => Arity::Fixed(2),
        }
    }

    /// Smallest fragment in which the tag may occur.
    pub fn fragment(self) -> FragmentId {
        let past = self.is(TagClass::Past);
        let first_order = self.category() == Category::Term
            || self.is(TagClass::Comparison)
            || self.is(TagClass::Quantifier)
            || self == Tag::Atom;
        match (past, first_order) {
            (false, false) => FragmentId::Ltl,
            (true, false) => FragmentId::Ltlp,
            (false, true) => FragmentId::Foltl,
            (true, true) => FragmentId::Foltlp,
        }
    }

    pub fn is(self, class: TagClass) -> bool {
        match class {
            TagClass::Formula => self.category() == Category::Formula,
            TagClass::Term => self.category() == Category::Term,
            TagClass::Connective => matches!(
                self,
                Tag::Negation | Tag::Conjunction | Tag::Disjunction | Tag::Implication | Tag::Iff
            ),
            TagClass::Comparison => matches!(
                self,
                Tag::Equal
                    | Tag::NotEqual
                    | Tag::LessThan
                    | Tag::LessEqual
                    | Tag::GreaterThan
                    | Tag::GreaterEqual
            ),
            TagClass::Quantifier => matches!(self, Tag::Exists | Tag::Forall),
            TagClass::Arithmetic => matches!(
                self,
                Tag::Negative | Tag::Addition | Tag::Subtraction | Tag::Multiplication
            ),
            TagClass::Temporal => self.is(TagClass::Future) || self.is(TagClass::Past),
            TagClass::Future => matches!(
                self,
                Tag::Tomorrow
                    | Tag::WTomorrow
                    | Tag::Eventually
                    | Tag::Always
                    | Tag::Until
                    | Tag::Release
                    | Tag::WUntil
                    | Tag::SRelease
                    | Tag::Next
                    | Tag::WNext
            ),
            TagClass::Past => matches!(
                self,
                Tag::Yesterday
                    | Tag::WYesterday
                    | Tag::Once
                    | Tag::Historically
                    | Tag::Since
                    | Tag::Triggered
                    | Tag::Prev
                    | Tag::WPrev
            ),
        }
    }

    /// Operator spelling in the native syntax.
    pub fn symbol(self) -> &'static str {
        match self {
            Tag::Boolean => "bool",
            Tag::Proposition => "prop",
            Tag::Atom => "atom",
            Tag::Equal => "=",
            Tag::NotEqual => "!=",
            Tag::LessThan => "<",
            Tag::LessEqual => "<=",
            Tag::GreaterThan => ">",
            Tag::GreaterEqual => ">=",
            Tag::Exists => "exists",
            Tag::Forall => "forall",
            Tag::Negation => "!",
            Tag::Conjunction => "&",
            Tag::Disjunction => "|",
            Tag::Implication => "->",
            Tag::Iff => "<->",
            Tag::Tomorrow => "X",
            Tag::WTomorrow => "wX",
            Tag::Eventually => "F",
            Tag::Always => "G",
            Tag::Until => "U",
            Tag::Release => "R",
            Tag::WUntil => "W",
            Tag::SRelease => "M",
            Tag::Yesterday => "Y",
            Tag::WYesterday => "Z",
            Tag::Once => "O",
            Tag::Historically => "H",
            Tag::Since => "S",
            Tag::Triggered => "T",
            Tag::Variable => "var",
            Tag::Constant => "const",
            Tag::Application => "app",
            Tag::Negative => "-",
            Tag::Addition => "+",
            Tag::Subtraction => "-",
            Tag::Multiplication => "*",
            Tag::Next => "next",
            Tag::WNext => "wnext",
            Tag::Prev => "prev",
            Tag::WPrev => "wprev",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Non-node payload of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Leaf {
    None,
    Bool(bool),
    Int(i64),
    Symbol(Symbol),
}

impl Leaf {
    pub(crate) fn kind_matches(&self, expected: LeafKind) -> bool {
        match (self, expected) {
            (Leaf::None, LeafKind::None) | (Leaf::Bool(_), LeafKind::Bool) => true,
            (Leaf::Int(_), LeafKind::Int) => true,
            (Leaf::Symbol(s), LeafKind::Symbol(kind)) => s.kind() == kind,
            _ => false,
        }
    }
}

pub(crate) struct NodeData {
    pub(crate) tag: Tag,
    pub(crate) leaf: Leaf,
    pub(crate) children: Vec<Node>,
    pub(crate) sort: Option<Sort>,
    pub(crate) fragment: FragmentId,
    pub(crate) hash: u64,
    pub(crate) id: u64,
    pub(crate) table: TableId,
    pub(crate) size: usize,
    pub(crate) depth: usize,
}

/// Release children without recursing, so dropping the last handle to a
/// very deep formula cannot overflow the stack.
impl Drop for NodeData {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(node) = stack.pop() {
            if let Ok(mut data) = Arc::try_unwrap(node.0) {
                stack.append(&mut data.children);
            }
        }
    }
}

/// A hash-consed formula or term.
#[derive(Clone)]
pub struct Node(pub(crate) Arc<NodeData>);

/// Borrowed, pattern-matchable view of a node.
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    Boolean(bool),
    Proposition(&'a Symbol),
    Atom(&'a Symbol, &'a [Node]),
    Comparison(Tag, &'a Node, &'a Node),
    Quantifier(Tag, &'a Symbol, &'a Node),
    Unary(Tag, &'a Node),
    Binary(Tag, &'a Node, &'a Node),
    Variable(&'a Symbol),
    Constant(i64),
    Application(&'a Symbol, &'a [Node]),
    UnaryTerm(Tag, &'a Node),
    BinaryTerm(Tag, &'a Node, &'a Node),
}

impl Node {
    pub fn tag(&self) -> Tag {
        self.0.tag
    }

    pub fn leaf(&self) -> &Leaf {
        &self.0.leaf
    }

    pub fn children(&self) -> &[Node] {
        &self.0.children
    }

    pub fn category(&self) -> Category {
        self.0.tag.category()
    }

    pub fn is_formula(&self) -> bool {
        self.category() == Category::Formula
    }

    pub fn is_term(&self) -> bool {
        self.category() == Category::Term
    }

    /// The symbol carried as leaf, if any.
    pub fn symbol(&self) -> Option<&Symbol> {
        match &self.0.leaf {
            Leaf::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Sort of a term; `None` for formulas.
    pub fn sort(&self) -> Option<&Sort> {
        self.0.sort.as_ref()
    }

    /// Smallest fragment containing every tag of this node.
    pub fn fragment(&self) -> FragmentId {
        self.0.fragment
    }

    /// Unique id within the node's alphabet, assigned in creation order.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Number of nodes in the tree, counting shared subtrees once per
    /// occurrence. Saturates at `usize::MAX`.
    pub fn size(&self) -> usize {
        self.0.size
    }

    pub fn depth(&self) -> usize {
        self.0.depth
    }

    /// Cached structural hash.
    pub fn hash_value(&self) -> u64 {
        self.0.hash
    }

    pub(crate) fn table(&self) -> TableId {
        self.0.table
    }

    pub fn view(&self) -> View<'_> {
        let d = &*self.0;
        match (d.tag, &d.leaf, d.children.as_slice()) {
            (Tag::Boolean, Leaf::Bool(b), _) => View::Boolean(*b),
            (Tag::Proposition, Leaf::Symbol(s), _) => View::Proposition(s),
            (Tag::Atom, Leaf::Symbol(s), args) => View::Atom(s, args),
            (Tag::Variable, Leaf::Symbol(s), _) => View::Variable(s),
            (Tag::Constant, Leaf::Int(n), _) => View::Constant(*n),
            (Tag::Application, Leaf::Symbol(s), args) => View::Application(s, args),
            (tag, Leaf::Symbol(s), [body]) if tag.is(TagClass::Quantifier) => {
                View::Quantifier(tag, s, body)
            }
            (tag, _, [l, r]) if tag.is(TagClass::Comparison) => View::Comparison(tag, l, r),
            (tag, _, [arg]) if tag.category() == Category::Term => View::UnaryTerm(tag, arg),
            (tag, _, [l, r]) if tag.category() == Category::Term => View::BinaryTerm(tag, l, r),
            (tag, _, [arg]) => View::Unary(tag, arg),
            (tag, _, [l, r]) => View::Binary(tag, l, r),
            (tag, leaf, children) => unreachable!(
                "interning table admitted {tag} with leaf {leaf:?} and {} children",
                children.len()
            ),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl AsRef<Node> for Node {
    fn as_ref(&self) -> &Node {
        self
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node#{}({})", self.0.id, self.0.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_listed_once() {
        let mut tags = Tag::ALL.to_vec();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), Tag::ALL.len());
    }

    #[test]
    fn fragments_of_tags() {
        assert_eq!(Tag::Until.fragment(), FragmentId::Ltl);
        assert_eq!(Tag::Since.fragment(), FragmentId::Ltlp);
        assert_eq!(Tag::Exists.fragment(), FragmentId::Foltl);
        assert_eq!(Tag::Next.fragment(), FragmentId::Foltl);
        assert_eq!(Tag::Prev.fragment(), FragmentId::Foltlp);
    }

    #[test]
    fn classes_partition_temporal_operators() {
        for tag in Tag::ALL {
            assert!(!(tag.is(TagClass::Future) && tag.is(TagClass::Past)));
            assert_eq!(
                tag.is(TagClass::Temporal),
                tag.is(TagClass::Future) || tag.is(TagClass::Past)
            );
        }
    }

    #[test]
    fn child_categories() {
        assert_eq!(Tag::Equal.child_category(), Category::Term);
        assert_eq!(Tag::Atom.child_category(), Category::Term);
        assert_eq!(Tag::Addition.child_category(), Category::Term);
        assert_eq!(Tag::Since.child_category(), Category::Formula);
        assert_eq!(Tag::Exists.child_category(), Category::Formula);
    }
}
