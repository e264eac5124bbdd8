//! Interned symbols (variables, functions, relations).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::alphabet::TableId;
use crate::sorts::{Sort, SymbolType};

/// What a symbol stands for, derived from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Relation,
}

#[derive(Debug)]
pub(crate) struct SymbolData {
    pub(crate) name: Arc<str>,
    pub(crate) ty: SymbolType,
    pub(crate) table: TableId,
    pub(crate) id: u32,
}

/// An interned identifier with its declared type.
///
/// Symbols are created by [`Alphabet::symbol`](crate::Alphabet::symbol) and
/// compared by identity: two handles are equal iff they come from the same
/// interning call.
#[derive(Clone)]
pub struct Symbol(pub(crate) Arc<SymbolData>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ty(&self) -> &SymbolType {
        &self.0.ty
    }

    pub fn kind(&self) -> SymbolKind {
        match self.0.ty {
            SymbolType::Value(_) => SymbolKind::Variable,
            SymbolType::Function { .. } => SymbolKind::Function,
            SymbolType::Relation { .. } => SymbolKind::Relation,
        }
    }

    /// Sort of a variable symbol, `None` for functions and relations.
    pub fn sort(&self) -> Option<&Sort> {
        self.0.ty.value_sort()
    }

    /// Position of this symbol in its alphabet's interning order.
    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub(crate) fn table(&self) -> TableId {
        self.0.table
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.table.hash(state);
        self.0.id.hash(state);
    }
}

impl AsRef<Symbol> for Symbol {
    fn as_ref(&self) -> &Symbol {
        self
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0.name, self.0.ty)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}
