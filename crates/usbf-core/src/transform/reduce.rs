use std::fmt;
use std::sync::Arc;

use super::{Func, Transformation};
use crate::backend::Backend;
use crate::spec::{Spec, SpecError};
use crate::tensor::Tensor;
use crate::tree::{Args, Tree};
use crate::types::{BeamError, BeamResult};

/// Combines the running value with the result for one index.
pub type ReduceFn = Arc<dyn Fn(Args, Args) -> BeamResult<Args> + Send + Sync>;

/// Fold over a named dimension instead of vectorizing it.
///
/// `ForAll(d)` followed by `Apply(sum, Axis(d))` gives the same result as
/// `Reduce::sum(d)`, but the fold never holds more than one slice's result, at
/// the cost of running the slices one after the other.
#[derive(Clone)]
pub struct Reduce {
    pub dimension: String,
    name: String,
    reduce_fn: ReduceFn,
    initial_value: Args,
}

impl Reduce {
    pub fn new(
        dimension: impl Into<String>,
        name: impl Into<String>,
        reduce_fn: impl Fn(Args, Args) -> BeamResult<Args> + Send + Sync + 'static,
        initial_value: Args,
    ) -> Self {
        Self {
            dimension: dimension.into(),
            name: name.into(),
            reduce_fn: Arc::new(reduce_fn),
            initial_value,
        }
    }

    pub fn sum(dimension: impl Into<String>) -> Self {
        Self::new(dimension, "add", |a, b| elementwise(&a, &b, Tensor::add), Tree::leaf(Tensor::scalar(0.0)))
    }

    pub fn product(dimension: impl Into<String>) -> Self {
        Self::new(dimension, "mul", |a, b| elementwise(&a, &b, Tensor::mul), Tree::leaf(Tensor::scalar(1.0)))
    }
}

/// Leafwise binary op; a scalar leaf on either side is broadcast over the other tree.
fn elementwise(
    a: &Args,
    b: &Args,
    op: fn(&Tensor, &Tensor) -> Result<Tensor, crate::tensor::TensorError>,
) -> BeamResult<Args> {
    a.zip_with(
        b,
        &|x, y| op(x, y).map_err(BeamError::from),
        &|key| BeamError::from(SpecError::StructureMismatch(key.to_string())),
    )
}

impl Transformation for Reduce {
    fn transform(&self, inner: Func, input_spec: Option<&Spec>, _returned_spec: Option<&Spec>) -> BeamResult<Func> {
        let spec = input_spec.cloned().ok_or_else(|| SpecError::NotBuilt(self.to_string()))?;
        let dimension = self.dimension.clone();
        let reduce_fn = self.reduce_fn.clone();
        let init = self.initial_value.clone();
        Ok(Arc::new(move |backend: &dyn Backend, args: Args| {
            let axes = spec.axes_for(&dimension, &args)?;
            let n = spec.size_of(&dimension, &args)?;
            tracing::trace!(dimension = %dimension, size = n, backend = backend.name(), "reducing");
            backend.scan(n, init.clone(), &|carry, i| {
                let result = inner(backend, args.slice_along(&axes, i)?)?;
                reduce_fn(carry, result)
            })
        }))
    }

    fn transform_input_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        Ok(spec.remove_dimension(&self.dimension)?)
    }

    fn transform_output_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        Ok(spec.clone())
    }
}

impl fmt::Display for Reduce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reduce({:?}, {}, {})", self.dimension, self.name, self.initial_value)
    }
}
