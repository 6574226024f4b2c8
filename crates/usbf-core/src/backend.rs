//! Array backends
//!
//! A [`Backend`] supplies the three loop primitives that the transformation
//! algebra lowers to: vectorized map, ordered scan, and compilation. The
//! backend is passed explicitly into every call of a transformed function, so
//! two pipelines (or two tests) can run on different backends side by side.
//!
//! | Backend      | `vmap`                | `scan`      | `jit`    |
//! |--------------|-----------------------|-------------|----------|
//! | `Sequential` | plain loop            | plain loop  | identity |
//! | `Parallel`   | rayon work stealing   | plain loop  | identity |
//!
//! `Parallel` requires the `parallel` feature:
//!
//! ```toml
//! [dependencies]
//! usbf-core = { version = "0.1", features = ["parallel"] }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::transform::Func;
use crate::tree::Args;
use crate::types::BeamResult;

/// Loop primitives used by transformed functions.
pub trait Backend: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Evaluate `f(i)` for every `i` in `0..n` and return the results in index
    /// order. Evaluations are independent and may run in any order.
    fn vmap(&self, n: usize, f: &(dyn Fn(usize) -> BeamResult<Args> + Sync)) -> BeamResult<Vec<Args>>;

    /// Ordered fold: `carry = f(carry, i)` for `i` in `0..n`.
    fn scan(
        &self,
        n: usize,
        init: Args,
        f: &(dyn Fn(Args, usize) -> BeamResult<Args> + Sync),
    ) -> BeamResult<Args> {
        (0..n).try_fold(init, |carry, i| f(carry, i))
    }

    /// Compile a function for this backend. CPU backends return it unchanged.
    fn jit(&self, f: Func) -> Func {
        f
    }
}

/// Single-threaded CPU backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Backend for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn vmap(&self, n: usize, f: &(dyn Fn(usize) -> BeamResult<Args> + Sync)) -> BeamResult<Vec<Args>> {
        (0..n).map(f).collect()
    }
}

/// Multi-threaded CPU backend built on rayon.
#[cfg(feature = "parallel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Parallel;

#[cfg(feature = "parallel")]
impl Backend for Parallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn vmap(&self, n: usize, f: &(dyn Fn(usize) -> BeamResult<Args> + Sync)) -> BeamResult<Vec<Args>> {
        use rayon::prelude::*;

        // Indexed collect keeps results in order.
        (0..n).into_par_iter().map(f).collect()
    }
}

/// Backend selection, as read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sequential,
    Parallel,
}

impl BackendKind {
    /// Instantiate the backend. Without the `parallel` feature, `Parallel`
    /// falls back to the sequential loop.
    pub fn create(self) -> Arc<dyn Backend> {
        match self {
            BackendKind::Sequential => Arc::new(Sequential),
            #[cfg(feature = "parallel")]
            BackendKind::Parallel => Arc::new(Parallel),
            #[cfg(not(feature = "parallel"))]
            BackendKind::Parallel => {
                tracing::warn!("built without the `parallel` feature, using the sequential backend");
                Arc::new(Sequential)
            }
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sequential => write!(f, "sequential"),
            BackendKind::Parallel => write!(f, "parallel"),
        }
    }
}
