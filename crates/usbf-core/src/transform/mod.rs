//! Transformations — lifting a point kernel over named dimensions
//!
//! A beamforming kernel is written for a single point, a single receiver and a
//! single transmit. Transformations turn it into a function over whole
//! datacubes while tracking, through a [`Spec`], which named dimension sits on
//! which axis of every argument and of the result.
//!
//! Pipelines are composed left to right: `compose!(f, A, B, C)` is `C(B(A(f)))`.
//! A composed [`TransformedFunction`] must be [built](TransformedFunction::build)
//! with the spec of its input before it can use spec-dependent steps such as
//! [`ForAll`]; building never mutates the receiver, so the same pipeline can be
//! rebuilt for differently shaped data.
//!
//! ```text
//!   build(spec)            outer ──────────────────────────────▶ inner
//!   input spec:  [t, r, p] ─ForAll(t)▶ [r, p] ─Reduce(r)▶ [p] ─ForAll(p)▶ []
//!   output spec: [t, p]   ◀──────────  [p]   ◀──────────  [p] ◀─────────  []
//! ```
//!
//! Errors raised while building or calling are wrapped in a
//! [`TransformedFunctionError`] that points at the failing step.
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::backend::Sequential;
//! use usbf_core::spec::Spec;
//! use usbf_core::tensor::Tensor;
//! use usbf_core::transform::{Apply, Axis, BaseFn, ForAll};
//! use usbf_core::tree::Tree;
//!
//! // Sum of a single row
//! let row_sum = BaseFn::new("row_sum", |args| {
//!     let x = args.get("x").and_then(Tree::as_leaf).cloned().unwrap_or(Tensor::scalar(0.0));
//!     Ok(Tree::leaf(x.sum_axis(0)?))
//! });
//! let f = usbf_core::compose!(row_sum, ForAll::new("rows"), Apply::sum(Axis::new("rows")))
//!     .build(&Spec::tree().with("x", Spec::dims(["rows"])))
//!     .unwrap();
//!
//! let x = Tensor::from_shape_vec(&[2, 3], vec![1.0; 6]).unwrap();
//! let out = f.call(&Sequential, Tree::node().with("x", x)).unwrap();
//! assert_eq!(out.as_leaf().unwrap().to_scalar().unwrap(), 6.0);
//! ```

mod apply;
mod error;
mod forall;
mod reduce;
mod wrap;

pub use apply::{Apply, ApplyFn, Axis, AxisArg, ConcreteArg};
pub use error::{AxisConcretizationError, TransformedFunctionError};
pub use forall::ForAll;
pub use reduce::{Reduce, ReduceFn};
pub use wrap::Wrap;

use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;
use crate::spec::Spec;
use crate::tree::Args;
use crate::types::{BeamError, BeamResult};

/// A callable step of a pipeline. The backend is injected on every call.
pub type Func = Arc<dyn Fn(&dyn Backend, Args) -> BeamResult<Args> + Send + Sync>;

/// Spec rewrite rule attached to a raw function.
pub type SpecRule = Arc<dyn Fn(&Spec) -> BeamResult<Spec> + Send + Sync>;

/// A function transformation that also declares how it rewrites specs.
pub trait Transformation: fmt::Display + Send + Sync {
    /// Wrap `inner`. `input_spec` describes the arguments of the transformed
    /// function and `returned_spec` what `inner` returns; both are `None` for
    /// an unbuilt pipeline.
    fn transform(&self, inner: Func, input_spec: Option<&Spec>, returned_spec: Option<&Spec>) -> BeamResult<Func>;

    /// The spec of the arguments that `inner` receives.
    fn transform_input_spec(&self, spec: &Spec) -> BeamResult<Spec>;

    /// The spec of the transformed function's result, given what `inner` returns.
    fn transform_output_spec(&self, spec: &Spec) -> BeamResult<Spec>;

    /// Steps of a deferred transformation chain, applied in order.
    fn parts(&self) -> Option<&[Arc<dyn Transformation>]> {
        None
    }
}

/// Conversion into a shared transformation object.
pub trait IntoTransformation {
    fn into_transformation(self) -> Arc<dyn Transformation>;
}

impl<T: Transformation + 'static> IntoTransformation for T {
    fn into_transformation(self) -> Arc<dyn Transformation> {
        Arc::new(self)
    }
}

impl IntoTransformation for Arc<dyn Transformation> {
    fn into_transformation(self) -> Arc<dyn Transformation> {
        self
    }
}

/// Apply `wraps` to `x` in order: `compose(x, &[&f, &g, &h]) == h(g(f(x)))`.
pub fn compose<T>(x: T, wraps: &[&dyn Fn(T) -> T]) -> T {
    wraps.iter().fold(x, |acc, wrap| wrap(acc))
}

/// Compose a base function with transformations, left to right.
///
/// `compose!(f, A, B)` is `Wrapped::from(f).then(A).then(B)`.
#[macro_export]
macro_rules! compose {
    ($base:expr $(, $t:expr)* $(,)?) => {
        $crate::transform::Wrapped::from($base)$(.then($t))*
    };
}

/// A deferred chain of transformations, to be composed into a function later.
#[macro_export]
macro_rules! partial {
    ($($t:expr),* $(,)?) => {
        $crate::transform::PartialTransformation::new(vec![
            $($crate::transform::IntoTransformation::into_transformation($t)),*
        ])
    };
}

/// A raw function, optionally carrying spec rules (`Specced`).
///
/// Without an output rule the function is assumed to return a dimensionless
/// scalar.
#[derive(Clone)]
pub struct BaseFn {
    name: String,
    f: Func,
    input_rule: Option<SpecRule>,
    output_rule: Option<SpecRule>,
}

impl BaseFn {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(Args) -> BeamResult<Args> + Send + Sync + 'static,
    ) -> Self {
        Self::from_func(name, Arc::new(move |_: &dyn Backend, args: Args| f(args)))
    }

    pub fn from_func(name: impl Into<String>, f: Func) -> Self {
        Self { name: name.into(), f, input_rule: None, output_rule: None }
    }

    /// Attach spec rules. The input rule maps the spec the function is handed
    /// to the spec it consumes (and may reject it); the output rule maps that
    /// to the spec of the result. Both default to the identity.
    pub fn specced(mut self, input_rule: Option<SpecRule>, output_rule: Option<SpecRule>) -> Self {
        self.input_rule = Some(input_rule.unwrap_or_else(|| Arc::new(|s: &Spec| -> BeamResult<Spec> { Ok(s.clone()) })));
        self.output_rule = Some(output_rule.unwrap_or_else(|| Arc::new(|s: &Spec| -> BeamResult<Spec> { Ok(s.clone()) })));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_specced(&self) -> bool {
        self.output_rule.is_some()
    }

    fn returned_spec(&self, passed: &Spec) -> BeamResult<Spec> {
        let consumed = match &self.input_rule {
            Some(rule) => rule(passed)?,
            None => passed.clone(),
        };
        match &self.output_rule {
            Some(rule) => rule(&consumed),
            None => Ok(Spec::scalar()),
        }
    }

    /// The function with its errors attributed to step 0 of a pipeline.
    fn guarded(&self) -> Func {
        let f = self.f.clone();
        let name = self.name.clone();
        Arc::new(move |backend: &dyn Backend, args: Args| {
            f(backend, args).map_err(|e| match e {
                BeamError::Pipeline(_) => e,
                other => TransformedFunctionError::new(other, vec![name.clone()], 0).into(),
            })
        })
    }
}

impl fmt::Debug for BaseFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseFn").field("name", &self.name).field("specced", &self.is_specced()).finish()
    }
}

/// Attach the identity spec rules to a raw function.
#[allow(non_snake_case)]
pub fn Specced(f: BaseFn) -> BaseFn {
    f.specced(None, None)
}

/// What a [`TransformedFunction`] wraps.
#[derive(Clone)]
pub enum Wrapped {
    Function(Arc<BaseFn>),
    Transformed(Arc<TransformedFunction>),
}

impl Wrapped {
    /// Wrap in one more transformation. Deferred chains are flattened so that
    /// every step shows up (and can fail) separately.
    pub fn then(self, t: impl IntoTransformation) -> TransformedFunction {
        let t = t.into_transformation();
        let parts: Option<Vec<Arc<dyn Transformation>>> = t.parts().map(<[_]>::to_vec);
        match parts {
            Some(parts) if !parts.is_empty() => {
                let mut parts = parts.into_iter();
                // Non-empty, checked above.
                let mut tf = match parts.next() {
                    Some(first) => self.then(first),
                    None => TransformedFunction::new(self, t),
                };
                for part in parts {
                    tf = tf.then(part);
                }
                tf
            }
            _ => TransformedFunction::new(self, t),
        }
    }

    fn steps(&self) -> Vec<String> {
        match self {
            Wrapped::Function(f) => vec![f.name.clone()],
            Wrapped::Transformed(tf) => tf.steps(),
        }
    }
}

impl From<BaseFn> for Wrapped {
    fn from(f: BaseFn) -> Self {
        Wrapped::Function(Arc::new(f))
    }
}

impl From<TransformedFunction> for Wrapped {
    fn from(tf: TransformedFunction) -> Self {
        Wrapped::Transformed(Arc::new(tf))
    }
}

impl From<Arc<TransformedFunction>> for Wrapped {
    fn from(tf: Arc<TransformedFunction>) -> Self {
        Wrapped::Transformed(tf)
    }
}

/// A function wrapped in one transformation, plus the specs computed by `build`.
#[derive(Clone)]
pub struct TransformedFunction {
    wrapped: Wrapped,
    transformation: Arc<dyn Transformation>,
    pub input_spec: Option<Spec>,
    /// The spec handed to the wrapped function.
    pub passed_spec: Option<Spec>,
    /// The spec of what the wrapped function returns.
    pub returned_spec: Option<Spec>,
    pub output_spec: Option<Spec>,
}

impl TransformedFunction {
    pub fn new(wrapped: Wrapped, transformation: Arc<dyn Transformation>) -> Self {
        Self {
            wrapped,
            transformation,
            input_spec: None,
            passed_spec: None,
            returned_spec: None,
            output_spec: None,
        }
    }

    pub fn then(self, t: impl IntoTransformation) -> TransformedFunction {
        Wrapped::from(self).then(t)
    }

    pub fn transformation(&self) -> &Arc<dyn Transformation> {
        &self.transformation
    }

    pub fn wrapped(&self) -> &Wrapped {
        &self.wrapped
    }

    pub fn is_built(&self) -> bool {
        self.output_spec.is_some()
    }

    /// Labels of every step, innermost function first.
    pub fn steps(&self) -> Vec<String> {
        let mut steps = self.wrapped.steps();
        steps.push(self.transformation.to_string());
        steps
    }

    /// Position of this layer's transformation in [`steps`](Self::steps).
    pub fn depth(&self) -> usize {
        match &self.wrapped {
            Wrapped::Function(_) => 1,
            Wrapped::Transformed(tf) => tf.depth() + 1,
        }
    }

    fn rewrap(&self, e: BeamError) -> BeamError {
        let steps = self.steps();
        match e {
            BeamError::Pipeline(inner) => inner.with_steps(steps).into(),
            other => TransformedFunctionError::new(other, steps, self.depth()).into(),
        }
    }

    /// Compute the specs of every layer for arguments described by `input_spec`.
    pub fn build(&self, input_spec: &Spec) -> BeamResult<TransformedFunction> {
        self.try_build(input_spec).map_err(|e| self.rewrap(e))
    }

    fn try_build(&self, input_spec: &Spec) -> BeamResult<TransformedFunction> {
        let passed_spec = self.transformation.transform_input_spec(input_spec)?;
        let (wrapped, returned_spec) = match &self.wrapped {
            Wrapped::Transformed(tf) => {
                let built = tf.build(&passed_spec)?;
                let returned = built.output_spec.clone().unwrap_or_else(Spec::tree);
                (Wrapped::from(built), returned)
            }
            Wrapped::Function(f) => {
                let returned = f.returned_spec(&passed_spec)?;
                (Wrapped::Function(f.clone()), returned)
            }
        };
        let output_spec = self.transformation.transform_output_spec(&returned_spec)?;
        tracing::debug!(
            step = %self.transformation,
            input = %input_spec,
            passed = %passed_spec,
            output = %output_spec,
            "built pipeline step"
        );
        Ok(TransformedFunction {
            wrapped,
            transformation: self.transformation.clone(),
            input_spec: Some(input_spec.clone()),
            passed_spec: Some(passed_spec),
            returned_spec: Some(returned_spec),
            output_spec: Some(output_spec),
        })
    }

    /// Run the pipeline on `args`.
    pub fn call(&self, backend: &dyn Backend, args: Args) -> BeamResult<Args> {
        self.try_call(backend, args).map_err(|e| self.rewrap(e))
    }

    fn try_call(&self, backend: &dyn Backend, args: Args) -> BeamResult<Args> {
        let inner: Func = match &self.wrapped {
            Wrapped::Function(f) => f.guarded(),
            Wrapped::Transformed(tf) => {
                let tf = tf.clone();
                Arc::new(move |backend: &dyn Backend, args: Args| tf.call(backend, args))
            }
        };
        let f = self
            .transformation
            .transform(inner, self.input_spec.as_ref(), self.returned_spec.as_ref())?;
        f(backend, args)
    }

    /// The whole pipeline as a single callable.
    pub fn into_func(self) -> Func {
        let tf = Arc::new(self);
        Arc::new(move |backend: &dyn Backend, args: Args| tf.call(backend, args))
    }
}

impl fmt::Display for TransformedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TransformedFunction(")?;
        writeln!(f, "  <compose(")?;
        for step in self.steps() {
            writeln!(f, "    {},", step)?;
        }
        writeln!(f, "  )>")?;
        write!(f, ")")
    }
}

impl fmt::Debug for TransformedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A chain of transformations that is not yet applied to a function.
///
/// Composing it into a function is the same as composing each of its steps
/// in order.
#[derive(Clone, Default)]
pub struct PartialTransformation {
    parts: Vec<Arc<dyn Transformation>>,
}

impl PartialTransformation {
    pub fn new(parts: Vec<Arc<dyn Transformation>>) -> Self {
        Self { parts }
    }

    pub fn then(mut self, t: impl IntoTransformation) -> Self {
        self.parts.push(t.into_transformation());
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Transformation for PartialTransformation {
    fn transform(&self, inner: Func, input_spec: Option<&Spec>, returned_spec: Option<&Spec>) -> BeamResult<Func> {
        self.parts
            .iter()
            .try_fold(inner, |f, t| t.transform(f, input_spec, returned_spec))
    }

    fn transform_input_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        self.parts.iter().try_fold(spec.clone(), |s, t| t.transform_input_spec(&s))
    }

    fn transform_output_spec(&self, spec: &Spec) -> BeamResult<Spec> {
        self.parts.iter().try_fold(spec.clone(), |s, t| t.transform_output_spec(&s))
    }

    fn parts(&self) -> Option<&[Arc<dyn Transformation>]> {
        Some(&self.parts)
    }
}

impl fmt::Display for PartialTransformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartialTransformation([")?;
        for (i, t) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "])")
    }
}
