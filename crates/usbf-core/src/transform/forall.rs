use std::fmt;
use std::sync::Arc;

use super::{Func, Transformation};
use crate::backend::Backend;
use crate::spec::{Spec, SpecError};
use crate::tensor::Tensor;
use crate::tree::{Args, Tree};
use crate::types::BeamResult;

/// Vectorize a function over one named dimension.
///
/// Only the arguments that have the dimension are sliced; every other argument
/// is handed to each slice as is. Results are stacked along a new leading axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForAll {
    pub dimension: String,
}

impl ForAll {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self { dimension: dimension.into() }
    }
}

impl Transformation for ForAll {
    fn transform(&self, inner: Func, input_spec: Option<&Spec>, _returned_spec: Option<&Spec>) -> BeamResult<Func> {
        let spec = input_spec.cloned().ok_or_else(|| SpecError::NotBuilt(self.to_string()))?;
        let dimension = self.dimension.clone();
        Ok(Arc::new(move |backend: &dyn Backend, args: Args| {
            let axes = spec.axes_for(&dimension, &args)?;
            let n = spec.size_of(&dimension, &args)?;
            tracing::trace!(dimension = %dimension, size = n, backend = backend.name(), "vectorizing");
            if n == 0 {
                // Run once on zeros to learn the result shapes, then return no rows of them.
                let sample = inner(backend, args.placeholder_along(&axes)?)?;
                return Ok(sample.map(&Tensor::empty_batch));
            }
            let slices = backend.vmap(n, &|i| inner(backend, args.slice_along(&axes, i)?))?;
            Ok(Tree::stack(&slices, 0)?)
        }))
    }

    fn transform_input_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        Ok(spec.remove_dimension(&self.dimension)?)
    }

    fn transform_output_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        Ok(spec.add_dimension(&self.dimension))
    }
}

impl fmt::Display for ForAll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForAll({:?})", self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Sequential;
    use crate::transform::BaseFn;
    use crate::types::BeamError;

    /// a * b for scalar a and b
    fn product() -> BaseFn {
        BaseFn::new("product", |args| {
            let get = |k: &str| -> BeamResult<Tensor> {
                args.get(k)
                    .and_then(Tree::as_leaf)
                    .cloned()
                    .ok_or_else(|| BeamError::other(format!("missing {k}")))
            };
            Ok(Tree::leaf(get("a")?.mul(&get("b")?)?))
        })
    }

    fn data() -> Args {
        Tree::node()
            .with("a", Tensor::from_vec(vec![1.0, 2.0, 3.0]))
            .with("b", Tensor::from_vec(vec![10.0, 100.0]))
    }

    #[test]
    fn test_outer_product() {
        let spec = Spec::tree().with("a", Spec::dims(["i"])).with("b", Spec::dims(["j"]));
        let f = crate::compose!(product(), ForAll::new("j"), ForAll::new("i")).build(&spec).unwrap();
        assert_eq!(f.output_spec, Some(Spec::dims(["i", "j"])));

        let out = f.call(&Sequential, data()).unwrap();
        let out = out.as_leaf().unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        assert_eq!(out.to_real_vec().unwrap(), vec![10.0, 100.0, 20.0, 200.0, 30.0, 300.0]);
    }

    #[test]
    fn test_empty_dimension() {
        let spec = Spec::tree().with("a", Spec::dims(["i"])).with("b", Spec::scalar());
        let f = crate::compose!(product(), ForAll::new("i")).build(&spec).unwrap();
        assert_eq!(f.output_spec, Some(Spec::dims(["i"])));

        let args = Tree::node().with("a", Tensor::from_vec(vec![])).with("b", Tensor::scalar(2.0));
        let out = f.call(&Sequential, args).unwrap();
        let out = out.as_leaf().unwrap();
        assert_eq!(out.shape(), &[0]);
        assert!(out.to_real_vec().unwrap().is_empty());
    }

    #[test]
    fn test_empty_dimension_keeps_inner_shape() {
        let spec = Spec::tree().with("a", Spec::dims(["i"])).with("b", Spec::dims(["j"]));
        let f = crate::compose!(product(), ForAll::new("j"), ForAll::new("i")).build(&spec).unwrap();

        let args = Tree::node().with("a", Tensor::from_vec(vec![])).with("b", Tensor::from_vec(vec![10.0, 100.0]));
        let out = f.call(&Sequential, args).unwrap();
        assert_eq!(out.as_leaf().unwrap().shape(), &[0, 2]);
    }

    #[test]
    fn test_missing_dimension_at_build() {
        let spec = Spec::tree().with("a", Spec::dims(["i"])).with("b", Spec::scalar());
        let err = crate::compose!(product(), ForAll::new("j")).build(&spec).unwrap_err();
        assert!(matches!(err.root_cause(), BeamError::Spec(SpecError::MissingDimension(d)) if d == "j"));
    }

    #[test]
    fn test_unbuilt_call_fails() {
        let f = crate::compose!(product(), ForAll::new("i"));
        let err = f.call(&Sequential, data()).unwrap_err();
        assert!(matches!(err.root_cause(), BeamError::Spec(SpecError::NotBuilt(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(ForAll::new("points").to_string(), r#"ForAll("points")"#);
    }
}
