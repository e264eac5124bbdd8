#![doc = include_str!("../README.md")]

//! Satisfiability pipeline over LTL modules.
//!
//! This crate defines modules (declarations plus requirements), composable
//! transforms and solvers, the past-operator remover, two reference
//! backends and a small executor for running independent checks.

pub mod backends;
pub mod errors;
pub mod executor;
pub mod module;
pub mod options;
pub mod past_remover;
pub mod solver;
pub mod transform;

pub use backends::{EnumerationBackend, FixpointBackend};
pub use errors::{ModuleError, PipelineError};
pub use executor::{check_all, Executor, InlineExecutor, Job, JobHandle, ThreadExecutor};
pub use module::{Module, Object};
pub use options::{PastRemoverOptions, SolverOptions};
pub use past_remover::{remove_past, PastRemover, Removal};
pub use solver::{Backend, Solver, Verdict};
pub use transform::Transform;
