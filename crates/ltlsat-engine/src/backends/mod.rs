//! Reference decision procedures.
//!
//! Both backends handle propositional requirements only. They exist to run
//! pipelines end to end and to cross-check transforms; production solving
//! belongs to external backends implementing [`Backend`](crate::Backend).

pub mod enumeration;
pub mod fixpoint;

pub use enumeration::EnumerationBackend;
pub use fixpoint::FixpointBackend;

use indexmap::IndexSet;
use ltlsat_logic::{free_symbols, Node, Symbol};

/// Propositions occurring in `requirements`, in order of first occurrence.
pub(crate) fn occurring_propositions(requirements: &[Node]) -> IndexSet<Symbol> {
    requirements
        .iter()
        .flat_map(free_symbols)
        .filter(|s| s.sort().is_some_and(|sort| sort.is_boolean()))
        .collect()
}

/// Whether some requirement contains first-order content.
pub(crate) fn first_order(requirements: &[Node]) -> bool {
    requirements.iter().any(|r| r.fragment().is_first_order())
}
