//! Option structs and deadline helpers.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Limits for the reference backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Longest trace the enumeration backend tries.
    pub max_trace_length: usize,
    /// Propositions beyond this count make the enumeration backend answer unknown.
    pub max_propositions: usize,
    /// Wall-clock budget per check; 0 disables the timeout.
    pub timeout_secs: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_trace_length: 4,
            max_propositions: 12,
            timeout_secs: 0,
        }
    }
}

/// Settings of the past remover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PastRemoverOptions {
    /// Prefix of the names of the fresh tracking propositions.
    pub fresh_prefix: String,
}

impl Default for PastRemoverOptions {
    fn default() -> Self {
        Self {
            fresh_prefix: "_past".to_string(),
        }
    }
}

pub(crate) fn deadline_exceeded(deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) => Instant::now() >= deadline,
        None => false,
    }
}

pub(crate) fn timeout_duration(timeout_secs: u64) -> Option<Duration> {
    if timeout_secs == 0 {
        None
    } else {
        Some(Duration::from_secs(timeout_secs))
    }
}

pub(crate) fn deadline_from_timeout_secs(timeout_secs: u64) -> Option<Instant> {
    timeout_duration(timeout_secs).and_then(|t| Instant::now().checked_add(t))
}
