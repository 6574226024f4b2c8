use std::fmt;
use std::sync::Arc;

use super::{Func, Transformation};
use crate::backend::Backend;
use crate::spec::Spec;
use crate::tree::Args;
use crate::types::BeamResult;

/// Apply an arbitrary higher-order function to the wrapped function. Specs
/// pass through unchanged.
#[derive(Clone)]
pub struct Wrap {
    name: String,
    f: Arc<dyn Fn(Func) -> BeamResult<Func> + Send + Sync>,
}

impl Wrap {
    pub fn new(name: impl Into<String>, f: impl Fn(Func) -> BeamResult<Func> + Send + Sync + 'static) -> Self {
        Self { name: name.into(), f: Arc::new(f) }
    }

    /// Compile the wrapped function with the backend it is called with.
    pub fn jit() -> Self {
        Self::new("jit", |inner: Func| -> BeamResult<Func> {
            Ok(Arc::new(move |backend: &dyn Backend, args: Args| {
                let compiled = backend.jit(inner.clone());
                compiled(backend, args)
            }))
        })
    }

    /// Fill in named arguments. Arguments given at call time take precedence.
    pub fn with_args(fixed: Args) -> Self {
        let name = format!("with_args, {}", fixed);
        Self::new(name, move |inner: Func| -> BeamResult<Func> {
            let fixed = fixed.clone();
            Ok(Arc::new(move |backend: &dyn Backend, args: Args| inner(backend, fixed.merge(&args))))
        })
    }
}

impl Transformation for Wrap {
    fn transform(&self, inner: Func, _input_spec: Option<&Spec>, _returned_spec: Option<&Spec>) -> BeamResult<Func> {
        (self.f)(inner)
    }

    fn transform_input_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        Ok(spec.clone())
    }

    fn transform_output_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        Ok(spec.clone())
    }
}

impl fmt::Display for Wrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX: usize = 140;
        let s = format!("Wrap({}", self.name);
        if s.chars().count() > MAX {
            let truncated: String = s.chars().take(MAX - "… <truncated>".chars().count()).collect();
            write!(f, "{}… <truncated>)", truncated)
        } else {
            write!(f, "{})", s)
        }
    }
}
