//! Bounded trace enumeration.

use tracing::debug;

use ltlsat_logic::{has_class, holds, Symbol, TagClass, Trace};

use super::{first_order, occurring_propositions};
use crate::errors::PipelineError;
use crate::module::Module;
use crate::options::{deadline_exceeded, deadline_from_timeout_secs, SolverOptions};
use crate::solver::{Backend, Verdict};

/// Tries every trace up to a length bound.
///
/// Finding a model proves satisfiability. Without temporal operators only
/// the first state matters, so exhausting length one proves unsatisfiability;
/// otherwise an exhausted search is inconclusive.
#[derive(Debug, Clone, Default)]
pub struct EnumerationBackend {
    options: SolverOptions,
}

enum Search {
    Found(Trace),
    Exhausted,
    GaveUp(&'static str),
}

impl EnumerationBackend {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// A trace over the module's propositions satisfying every requirement.
    ///
    /// `None` when no model exists within the bounds or the search gave up.
    pub fn find_model(&self, module: &Module) -> Result<Option<Trace>, PipelineError> {
        match self.search(module)? {
            Search::Found(trace) => Ok(Some(trace)),
            Search::Exhausted | Search::GaveUp(_) => Ok(None),
        }
    }

    fn search(&self, module: &Module) -> Result<Search, PipelineError> {
        let requirements = module.requirements();
        if first_order(requirements) {
            return Ok(Search::GaveUp("first-order requirements"));
        }
        let props: Vec<Symbol> = occurring_propositions(requirements).into_iter().collect();
        if props.len() > self.options.max_propositions {
            return Ok(Search::GaveUp("too many propositions"));
        }
        let temporal = requirements.iter().any(|r| has_class(TagClass::Temporal, r));
        let max_len = if temporal {
            self.options.max_trace_length.max(1)
        } else {
            1
        };
        let deadline = deadline_from_timeout_secs(self.options.timeout_secs);

        for len in 1..=max_len {
            let bits = len * props.len();
            if bits >= u64::BITS as usize {
                return Ok(Search::GaveUp("trace space too large"));
            }
            for assignment in 0..(1u64 << bits) {
                if deadline_exceeded(deadline) {
                    return Ok(Search::GaveUp("timeout"));
                }
                let trace = Trace::from_fn(len, &props, |i, s| {
                    let k = props.iter().position(|p| p == s).unwrap_or(0);
                    (assignment >> (i * props.len() + k)) & 1 == 1
                });
                let mut all = true;
                for requirement in requirements {
                    if !holds(requirement, &trace)? {
                        all = false;
                        break;
                    }
                }
                if all {
                    return Ok(Search::Found(trace));
                }
            }
        }
        Ok(Search::Exhausted)
    }
}

impl Backend for EnumerationBackend {
    fn name(&self) -> &str {
        "enumeration"
    }

    fn check(&self, module: &Module) -> Result<Verdict, PipelineError> {
        let temporal = module
            .requirements()
            .iter()
            .any(|r| has_class(TagClass::Temporal, r));
        let verdict = match self.search(module)? {
            Search::Found(trace) => {
                debug!(%trace, "model found");
                Verdict::Sat
            }
            Search::Exhausted if !temporal => Verdict::Unsat,
            Search::Exhausted => {
                debug!(
                    max_trace_length = self.options.max_trace_length,
                    "no model within bound"
                );
                Verdict::Unknown
            }
            Search::GaveUp(reason) => {
                debug!(reason, "enumeration gave up");
                Verdict::Unknown
            }
        };
        Ok(verdict)
    }
}
