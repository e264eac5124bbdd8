#![doc = include_str!("../README.md")]

//! Typed formula hierarchy, interning and structural traversal.
//!
//! This crate defines sorts and symbols, the four logic fragments, the
//! hash-consed node hierarchy with its interning table, typed builders,
//! the tag-dispatch traversal engine, a printer and finite-trace semantics.

pub mod alphabet;
pub mod builder;
pub mod errors;
pub mod fragment;
pub mod hierarchy;
pub mod printer;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod semantics;
pub mod sorts;
pub mod symbol;
pub mod traversal;

pub use alphabet::Alphabet;
pub use builder::{Builder, Formula, Term};
pub use errors::{ConstructionError, DispatchError, EvalError};
pub use fragment::{Foltl, Foltlp, Fragment, FragmentId, Ltl, Ltlp, Within};
pub use hierarchy::{Category, Leaf, Node, Tag, TagClass, View};
pub use printer::{format, Syntax};
pub use semantics::{evaluate, holds, Trace};
pub use sorts::{Sort, SortName, SymbolType};
pub use symbol::{Symbol, SymbolKind};
pub use traversal::{
    find_element, free_symbols, has_class, has_element, scan, symbols, Handlers, Pattern,
    ScanOutcome,
};
