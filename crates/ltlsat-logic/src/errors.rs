use miette::Diagnostic;
use thiserror::Error;

use crate::fragment::FragmentId;
use crate::hierarchy::{Category, Tag};
use crate::sorts::Sort;

/// Rejected node construction. Raised eagerly by the interning table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConstructionError {
    #[error("{tag} is not allowed in fragment {fragment} (requires {required})")]
    #[diagnostic(
        code(ltlsat::construct::fragment),
        help("build the node with a builder for a larger fragment")
    )]
    FragmentViolation {
        tag: Tag,
        fragment: FragmentId,
        required: FragmentId,
    },

    #[error("{tag} expects {expected} children, got {found}")]
    #[diagnostic(code(ltlsat::construct::arity))]
    Arity {
        tag: Tag,
        expected: usize,
        found: usize,
    },

    #[error("child {index} of {tag} must be a {expected:?}")]
    #[diagnostic(code(ltlsat::construct::category))]
    Category {
        tag: Tag,
        index: usize,
        expected: Category,
    },

    #[error("{tag} cannot carry leaf {leaf}")]
    #[diagnostic(code(ltlsat::construct::leaf))]
    LeafMismatch { tag: Tag, leaf: String },

    #[error("sort mismatch in {tag}: expected {expected}, found {found}")]
    #[diagnostic(code(ltlsat::construct::sort))]
    SortMismatch {
        tag: Tag,
        expected: String,
        found: Sort,
    },

    #[error("{tag} mixes nodes or symbols from different alphabets")]
    #[diagnostic(
        code(ltlsat::construct::foreign),
        help("every node of a formula must be interned by the same alphabet")
    )]
    ForeignAlphabet { tag: Tag },

    #[error("{found:?} node used where a {expected:?} was expected")]
    #[diagnostic(code(ltlsat::construct::narrowing))]
    WrongCategory { expected: Category, found: Category },

    #[error("node of fragment {found} does not fit fragment {expected}")]
    #[diagnostic(code(ltlsat::construct::narrowing))]
    Narrowing {
        expected: FragmentId,
        found: FragmentId,
    },
}

/// A traversal reached a node that no handler matches.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("no handler for {tag} and no catch-all")]
#[diagnostic(
    code(ltlsat::traversal::dispatch),
    help("add a handler for this tag, one of its classes, or a catch-all")
)]
pub struct DispatchError {
    pub tag: Tag,
}

/// Failure evaluating a node over a trace.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EvalError {
    #[error("cannot evaluate {0} over a propositional trace")]
    #[diagnostic(code(ltlsat::eval::unsupported))]
    Unsupported(Tag),
    #[error("cannot evaluate over an empty trace")]
    #[diagnostic(code(ltlsat::eval::empty))]
    EmptyTrace,
    #[error("{0}")]
    #[diagnostic(code(ltlsat::eval::dispatch))]
    Dispatch(#[from] DispatchError),
}
