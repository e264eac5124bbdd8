#![allow(dead_code)]

use std::sync::Once;

use ltlsat_engine::Module;
use ltlsat_logic::{Alphabet, Sort};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once. `RUST_LOG` overrides the `warn` default.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// A module declaring one boolean per name.
pub fn propositional_module(sigma: &Alphabet, names: &[&str]) -> Module {
    let mut module = Module::new(sigma);
    for name in names {
        module
            .declare(name, Sort::Boolean)
            .unwrap_or_else(|e| panic!("declaring {name}: {e}"));
    }
    module
}
