use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Name of an uninterpreted sort, interned by an [`Alphabet`](crate::Alphabet).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortName(pub(crate) Arc<str>);

impl SortName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sorts of terms and symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sort {
    Boolean,
    Integer,
    Uninterpreted(SortName),
}

impl Sort {
    pub fn is_boolean(&self) -> bool {
        matches!(self, Sort::Boolean)
    }

    /// Sorts accepted by arithmetic and ordering operators.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Sort::Integer)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Boolean => write!(f, "Bool"),
            Sort::Integer => write!(f, "Int"),
            Sort::Uninterpreted(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for Sort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Declared type of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolType {
    /// A variable (or boolean proposition) of the given sort.
    Value(Sort),
    /// An uninterpreted function.
    Function { params: Vec<Sort>, range: Sort },
    /// An uninterpreted relation.
    Relation { params: Vec<Sort> },
}

impl SymbolType {
    pub fn function(params: impl Into<Vec<Sort>>, range: Sort) -> Self {
        SymbolType::Function {
            params: params.into(),
            range,
        }
    }

    pub fn relation(params: impl Into<Vec<Sort>>) -> Self {
        SymbolType::Relation {
            params: params.into(),
        }
    }

    /// The sort of a value-typed symbol.
    pub fn value_sort(&self) -> Option<&Sort> {
        match self {
            SymbolType::Value(sort) => Some(sort),
            _ => None,
        }
    }

    pub fn params(&self) -> &[Sort] {
        match self {
            SymbolType::Value(_) => &[],
            SymbolType::Function { params, .. } | SymbolType::Relation { params } => params,
        }
    }
}

impl From<Sort> for SymbolType {
    fn from(sort: Sort) -> Self {
        SymbolType::Value(sort)
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn params(f: &mut fmt::Formatter<'_>, params: &[Sort]) -> fmt::Result {
            write!(f, "(")?;
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, ")")
        }
        match self {
            SymbolType::Value(sort) => write!(f, "{sort}"),
            SymbolType::Function { params: ps, range } => {
                params(f, ps)?;
                write!(f, " -> {range}")
            }
            SymbolType::Relation { params: ps } => {
                write!(f, "rel")?;
                params(f, ps)
            }
        }
    }
}
