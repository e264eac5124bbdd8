//! Composable module-to-module transforms.
//!
//! A [`Transform`] is a flat list of named stages. Composition with `|`
//! concatenates the lists, so grouping does not matter and [`Transform::id`]
//! (the empty list) is the unit on both sides.

use indexmap::IndexMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::debug;

use ltlsat_logic::{Alphabet, Handlers, Node};

use crate::errors::PipelineError;
use crate::module::Module;

type StageFn = dyn Fn(&Module) -> Result<Module, PipelineError> + Send + Sync;

#[derive(Clone)]
struct Stage {
    name: Arc<str>,
    run: Arc<StageFn>,
}

impl PartialEq for Stage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.run, &other.run)
    }
}

impl Eq for Stage {}

/// A pure function from modules to modules.
#[derive(Clone, PartialEq, Eq)]
pub struct Transform {
    stages: Vec<Stage>,
}

impl Transform {
    /// Default number of results kept by [`Transform::cached`].
    pub const CACHE_CAPACITY: usize = 1024;

    /// A single-stage transform.
    pub fn new(
        name: &str,
        f: impl Fn(&Module) -> Result<Module, PipelineError> + Send + Sync + 'static,
    ) -> Self {
        Transform {
            stages: vec![Stage {
                name: Arc::from(name),
                run: Arc::new(f),
            }],
        }
    }

    /// The transform returning its input unchanged.
    pub fn id() -> Self {
        Transform { stages: Vec::new() }
    }

    /// Rewrite every requirement with the handlers built by `factory`.
    ///
    /// The result keeps the input's declarations; rewritten requirements are
    /// checked again, so introducing undeclared symbols is an error.
    pub fn map(
        name: &str,
        factory: impl Fn(&Alphabet) -> Handlers<'static, Node, PipelineError> + Send + Sync + 'static,
    ) -> Self {
        Transform::new(name, move |module| {
            let handlers = factory(module.alphabet());
            let rewritten = handlers.rewrite_all(module.requirements())?;
            let mut out = module.without_requirements();
            for formula in &rewritten {
                out.require(formula)?;
            }
            Ok(out)
        })
    }

    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in application order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| &*s.name).collect()
    }

    pub fn apply(&self, module: &Module) -> Result<Module, PipelineError> {
        let Some((first, rest)) = self.stages.split_first() else {
            return Ok(module.clone());
        };
        let mut current = run_stage(first, module)?;
        for stage in rest {
            current = run_stage(stage, &current)?;
        }
        Ok(current)
    }

    /// Collapse this pipeline into one stage that remembers its results.
    ///
    /// Results are keyed by module value; the cache lives as long as the
    /// returned transform and its clones and holds at most
    /// [`Transform::CACHE_CAPACITY`] entries.
    pub fn cached(self) -> Transform {
        self.cached_with_capacity(Self::CACHE_CAPACITY)
    }

    /// Like [`Transform::cached`], keeping at most `capacity` results.
    ///
    /// When full, the oldest entry is evicted. A capacity of zero disables
    /// caching.
    pub fn cached_with_capacity(self, capacity: usize) -> Transform {
        let name = format!("cached({self})");
        let cache: Mutex<IndexMap<Module, Module>> = Mutex::new(IndexMap::new());
        Transform::new(&name, move |module| {
            if let Some(hit) = cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(module)
            {
                debug!(transform = %self, "cache hit");
                return Ok(hit.clone());
            }
            let result = self.apply(module)?;
            if capacity == 0 {
                return Ok(result);
            }
            let mut entries = cache.lock().unwrap_or_else(PoisonError::into_inner);
            while entries.len() >= capacity {
                entries.shift_remove_index(0);
            }
            entries.insert(module.clone(), result.clone());
            Ok(result)
        })
    }
}

fn run_stage(stage: &Stage, module: &Module) -> Result<Module, PipelineError> {
    let started = Instant::now();
    let result = (stage.run)(module);
    debug!(
        stage = %stage.name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "transform stage"
    );
    result
}

impl Default for Transform {
    fn default() -> Self {
        Transform::id()
    }
}

impl BitOr for Transform {
    type Output = Transform;

    /// `a | b` applies `a`, then `b`.
    fn bitor(mut self, rhs: Transform) -> Transform {
        self.stages.extend(rhs.stages);
        self
    }
}

impl BitOr<&Transform> for &Transform {
    type Output = Transform;

    fn bitor(self, rhs: &Transform) -> Transform {
        self.clone() | rhs.clone()
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stages.is_empty() {
            return f.write_str("id");
        }
        f.write_str(&self.stage_names().join(" | "))
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({self})")
    }
}
