use serde::Serialize;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::errors::PipelineError;
use crate::module::Module;
use crate::transform::Transform;

/// Outcome of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Sat,
    Unsat,
    Unknown,
}

impl Verdict {
    /// `Some(true)` for sat, `Some(false)` for unsat, `None` when unknown.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Verdict::Sat => Some(true),
            Verdict::Unsat => Some(false),
            Verdict::Unknown => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Sat => write!(f, "sat"),
            Verdict::Unsat => write!(f, "unsat"),
            Verdict::Unknown => write!(f, "unknown"),
        }
    }
}

/// Abstract decision procedure interface.
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    /// Decide the module. Must not mutate shared state observable by callers.
    fn check(&self, module: &Module) -> Result<Verdict, PipelineError>;
}

/// A backend, optionally preceded by a transform pipeline.
///
/// `transform | solver` yields a solver that applies the transform first.
/// Solvers are terminal: nothing composes after them.
#[derive(Clone)]
pub struct Solver {
    prefix: Transform,
    backend: Arc<dyn Backend>,
}

impl Solver {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Solver {
            prefix: Transform::id(),
            backend: Arc::new(backend),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// The transforms applied before the backend runs.
    pub fn prefix(&self) -> &Transform {
        &self.prefix
    }

    pub fn check(&self, module: &Module) -> Result<Verdict, PipelineError> {
        let prepared = self.prefix.apply(module)?;
        let started = Instant::now();
        let verdict = self.backend.check(&prepared)?;
        debug!(
            backend = self.backend.name(),
            pipeline = %self.prefix,
            requirements = prepared.requirements().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            %verdict,
            "solver finished"
        );
        Ok(verdict)
    }
}

impl BitOr<Solver> for Transform {
    type Output = Solver;

    fn bitor(self, rhs: Solver) -> Solver {
        Solver {
            prefix: self | rhs.prefix,
            backend: rhs.backend,
        }
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Solver({} | {})", self.prefix, self.backend.name())
    }
}
