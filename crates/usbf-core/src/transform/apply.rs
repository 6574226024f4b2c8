use std::fmt;
use std::sync::Arc;

use super::{AxisConcretizationError, Func, Transformation};
use crate::backend::Backend;
use crate::spec::Spec;
use crate::tensor::Tensor;
use crate::tree::Args;
use crate::types::{BeamError, BeamResult};

/// A placeholder for an array axis, given by the name of its dimension.
///
/// It resolves to the axis index of that dimension in the spec of the data at
/// the point where it is used, and declares what happens to the dimension:
/// removed (the default), kept, or replaced by other dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub dimension: String,
    pub keep: bool,
    pub becomes: Vec<String>,
}

impl Axis {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self { dimension: dimension.into(), keep: false, becomes: Vec::new() }
    }

    pub fn keep(mut self) -> Self {
        self.keep = true;
        self
    }

    pub fn becomes<I, S>(mut self, dims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.becomes = dims.into_iter().map(Into::into).collect();
        self
    }

    /// The dimensions after the applied function has acted on this axis.
    ///
    /// ```rust
    /// use usbf_core::transform::Axis;
    ///
    /// let dims: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    /// assert_eq!(Axis::new("b").new_dimensions(&dims), ["a", "c"]);
    /// assert_eq!(Axis::new("b").keep().new_dimensions(&dims), ["a", "b", "c"]);
    /// assert_eq!(Axis::new("b").becomes(["x", "y"]).new_dimensions(&dims), ["a", "x", "y", "c"]);
    /// ```
    pub fn new_dimensions(&self, dims: &[String]) -> Vec<String> {
        if !self.becomes.is_empty() {
            dims.iter()
                .flat_map(|d| {
                    if *d == self.dimension {
                        self.becomes.clone()
                    } else {
                        vec![d.clone()]
                    }
                })
                .collect()
        } else if self.keep {
            dims.to_vec()
        } else {
            dims.iter().filter(|d| **d != self.dimension).cloned().collect()
        }
    }

    /// Axis index of the dimension in `spec`. For a node spec every leaf that
    /// has the dimension must have it at the same position.
    pub fn concretize(&self, spec: &Spec) -> Result<usize, AxisConcretizationError> {
        let missing = || AxisConcretizationError::new(&self.dimension);
        if spec.is_leaf() {
            return spec.index_for(&self.dimension).ok_or_else(missing);
        }
        let mut found: Option<usize> = None;
        for (_, dims) in spec.as_tree().leaves() {
            if let Some(i) = dims.iter().position(|d| *d == self.dimension) {
                match found {
                    Some(j) if j != i => return Err(missing()),
                    _ => found = Some(i),
                }
            }
        }
        found.ok_or_else(missing)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Axis({:?}", self.dimension)?;
        if self.keep {
            write!(f, ", keep=True")?;
        }
        if !self.becomes.is_empty() {
            write!(f, ", becomes={:?}", self.becomes)?;
        }
        write!(f, ")")
    }
}

/// An argument of an applied function, possibly an axis placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisArg {
    Axis(Axis),
    Axes(Vec<Axis>),
    Value(f64),
}

/// An [`AxisArg`] after its placeholders were resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ConcreteArg {
    Index(usize),
    Indices(Vec<usize>),
    Value(f64),
}

impl ConcreteArg {
    pub fn index(&self) -> Option<usize> {
        match self {
            ConcreteArg::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl AxisArg {
    fn axes(&self) -> Vec<&Axis> {
        match self {
            AxisArg::Axis(a) => vec![a],
            AxisArg::Axes(v) => v.iter().collect(),
            AxisArg::Value(_) => Vec::new(),
        }
    }

    fn concretize(&self, spec: Option<&Spec>) -> BeamResult<ConcreteArg> {
        let resolve = |a: &Axis| -> BeamResult<usize> {
            match spec {
                Some(s) => Ok(a.concretize(s)?),
                None => Err(AxisConcretizationError::new(&a.dimension).into()),
            }
        };
        Ok(match self {
            AxisArg::Axis(a) => ConcreteArg::Index(resolve(a)?),
            AxisArg::Axes(v) => ConcreteArg::Indices(v.iter().map(resolve).collect::<BeamResult<_>>()?),
            AxisArg::Value(x) => ConcreteArg::Value(*x),
        })
    }
}

impl From<Axis> for AxisArg {
    fn from(a: Axis) -> Self {
        AxisArg::Axis(a)
    }
}

impl From<f64> for AxisArg {
    fn from(v: f64) -> Self {
        AxisArg::Value(v)
    }
}

impl fmt::Display for AxisArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisArg::Axis(a) => write!(f, "{}", a),
            AxisArg::Axes(v) => {
                write!(f, "(")?;
                for (i, a) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            AxisArg::Value(x) => write!(f, "{}", x),
        }
    }
}

/// Function applied to a result: the result and the resolved arguments.
pub type ApplyFn = Arc<dyn Fn(Args, &[ConcreteArg]) -> BeamResult<Args> + Send + Sync>;

/// Apply a function to the result of the wrapped function.
///
/// Every [`Axis`] argument is resolved against the spec of the wrapped
/// function's result when called, and rewrites the output spec as declared.
/// The declaration must match what the function does to the array.
#[derive(Clone)]
pub struct Apply {
    name: String,
    f: ApplyFn,
    args: Vec<AxisArg>,
}

impl Apply {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(Args, &[ConcreteArg]) -> BeamResult<Args> + Send + Sync + 'static,
        args: Vec<AxisArg>,
    ) -> Self {
        Self { name: name.into(), f: Arc::new(f), args }
    }

    /// Sum every leaf of the result over `axis`.
    pub fn sum(axis: Axis) -> Self {
        Self::per_axis("sum", axis, Tensor::sum_axis)
    }

    /// Average every leaf of the result over `axis`.
    pub fn mean(axis: Axis) -> Self {
        Self::per_axis("mean", axis, Tensor::mean_axis)
    }

    /// Multiply every leaf of the result over `axis`.
    pub fn prod(axis: Axis) -> Self {
        Self::per_axis("prod", axis, Tensor::prod_axis)
    }

    /// Split the axis of `axis.dimension` into the given shape; `axis` should
    /// declare the replacing dimensions with [`Axis::becomes`].
    pub fn unflatten(axis: Axis, shape: Vec<usize>) -> Self {
        Self::new(
            "unflatten",
            move |result: Args, args: &[ConcreteArg]| {
                let axis = first_index(args)?;
                Ok(result.try_map(&|t: &Tensor| t.unflatten_axis(axis, &shape))?)
            },
            vec![axis.into()],
        )
    }

    fn per_axis(
        name: &str,
        axis: Axis,
        op: fn(&Tensor, usize) -> Result<Tensor, crate::tensor::TensorError>,
    ) -> Self {
        Self::new(
            name,
            move |result: Args, args: &[ConcreteArg]| {
                let axis = first_index(args)?;
                Ok(result.try_map(&|t: &Tensor| op(t, axis))?)
            },
            vec![axis.into()],
        )
    }
}

fn first_index(args: &[ConcreteArg]) -> BeamResult<usize> {
    args.first()
        .and_then(ConcreteArg::index)
        .ok_or_else(|| BeamError::other("expected an axis argument"))
}

impl Transformation for Apply {
    fn transform(&self, inner: Func, _input_spec: Option<&Spec>, returned_spec: Option<&Spec>) -> BeamResult<Func> {
        let f = self.f.clone();
        let args = self.args.clone();
        let returned_spec = returned_spec.cloned();
        Ok(Arc::new(move |backend: &dyn Backend, call_args: Args| {
            let result = inner(backend, call_args)?;
            let concrete = args
                .iter()
                .map(|a| a.concretize(returned_spec.as_ref()))
                .collect::<BeamResult<Vec<_>>>()?;
            f(result, &concrete)
        }))
    }

    fn transform_input_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        Ok(spec.clone())
    }

    fn transform_output_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        let mut spec = spec.clone();
        for axis in self.args.iter().flat_map(AxisArg::axes) {
            spec = spec.update_leaves(|dims| axis.new_dimensions(dims));
        }
        Ok(spec)
    }
}

impl fmt::Display for Apply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Apply({}", self.name)?;
        for a in &self.args {
            write!(f, ", {}", a)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Sequential;
    use crate::transform::{BaseFn, ForAll};
    use crate::tree::Tree;

    fn identity_x() -> BaseFn {
        BaseFn::new("x", |args| {
            args.get("x").cloned().ok_or_else(|| BeamError::other("missing x"))
        })
        .specced(None, Some(Arc::new(|s: &Spec| -> BeamResult<Spec> {
            Ok(s.field("x").unwrap_or_else(Spec::scalar))
        })))
    }

    #[test]
    fn test_sum_over_named_axis() {
        let spec = Spec::tree().with("x", Spec::dims(["a", "b"]));
        let f = crate::compose!(identity_x(), Apply::sum(Axis::new("b")))
            .build(&spec)
            .unwrap();
        assert_eq!(f.output_spec, Some(Spec::dims(["a"])));

        let x = Tensor::from_shape_vec(&[2, 3], (0..6).map(f64::from).collect()).unwrap();
        let out = f.call(&Sequential, Tree::node().with("x", x)).unwrap();
        assert_eq!(out.as_leaf().unwrap().to_real_vec().unwrap(), vec![3.0, 12.0]);
    }

    #[test]
    fn test_axis_follows_reordering() {
        // ForAll("b") moves "b" to the front, so Axis("b") resolves to 0.
        let spec = Spec::tree().with("x", Spec::dims(["a", "b"]));
        let f = crate::compose!(identity_x(), ForAll::new("b"), Apply::sum(Axis::new("b")))
            .build(&spec)
            .unwrap();
        assert_eq!(f.returned_spec, Some(Spec::dims(["b", "a"])));
        let x = Tensor::from_shape_vec(&[2, 3], (0..6).map(f64::from).collect()).unwrap();
        let out = f.call(&Sequential, Tree::node().with("x", x)).unwrap();
        assert_eq!(out.as_leaf().unwrap().to_real_vec().unwrap(), vec![3.0, 12.0]);
    }

    #[test]
    fn test_missing_axis_raises_concretization_error() {
        let spec = Spec::tree().with("x", Spec::dims(["a"]));
        let f = crate::compose!(identity_x(), Apply::sum(Axis::new("frames")))
            .build(&spec)
            .unwrap();
        let err = f.call(&Sequential, Tree::node().with("x", Tensor::from_vec(vec![1.0]))).unwrap_err();
        let root = err.root_cause();
        assert!(matches!(root, BeamError::Axis(_)));
        assert_eq!(root.to_string(), "Could not find dimension \"frames\" in the spec.");
    }

    #[test]
    fn test_unflatten_declares_new_dims() {
        let spec = Spec::tree().with("x", Spec::dims(["points"]));
        let f = crate::compose!(
            identity_x(),
            Apply::unflatten(Axis::new("points").becomes(["width", "height"]), vec![2, 3]),
        )
        .build(&spec)
        .unwrap();
        assert_eq!(f.output_spec, Some(Spec::dims(["width", "height"])));
        let out = f.call(&Sequential, Tree::node().with("x", Tensor::zeros(&[6]))).unwrap();
        assert_eq!(out.as_leaf().unwrap().shape(), &[2, 3]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Apply::sum(Axis::new("transmits")).to_string(), r#"Apply(sum, Axis("transmits"))"#);
        assert_eq!(Axis::new("b").keep().to_string(), r#"Axis("b", keep=True)"#);
    }
}
