use thiserror::Error;

use ltlsat_logic::{ConstructionError, DispatchError, EvalError, SymbolType, Tag};

/// Rejected declaration or requirement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("`{name}` is already declared as {existing}, cannot redeclare it as {requested}")]
    DuplicateDeclaration {
        name: String,
        existing: SymbolType,
        requested: SymbolType,
    },
    #[error("`{name}` is used in a requirement but not declared in this module")]
    UnboundSymbol { name: String },
    #[error("only formulas can be required, got a term")]
    NotAFormula,
    #[error("node or symbol belongs to a different alphabet than the module")]
    ForeignAlphabet,
    #[error("cannot pop {requested} frames, only {available} pushed")]
    PopUnderflow { requested: usize, available: usize },
}

/// Failure while running a transform or solver.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Module error: {0}")]
    Module(#[from] ModuleError),
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),
    #[error("Traversal error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("Unsupported construct in {stage}: {tag}")]
    Unsupported { stage: &'static str, tag: Tag },
    #[error("Solver error: {0}")]
    Solver(String),
    #[error("Job error: {0}")]
    Job(String),
}
