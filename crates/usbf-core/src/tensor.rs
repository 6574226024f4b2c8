//! Tensor — n-dimensional real or complex arrays
//!
//! The array layer that data flows through inside a transformed beamforming
//! pipeline. Channel data is complex (IQ) or real (RF); geometry is always real.
//! Storage is reference counted so that arguments which do not vary along a
//! vectorized dimension can be handed to every slice without copying.
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::tensor::Tensor;
//! use ndarray::{ArrayD, IxDyn};
//!
//! let t = Tensor::real(ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1.0; 6]).unwrap());
//! let total = t.sum_axis(1).unwrap().sum_axis(0).unwrap();
//! assert_eq!(total.to_scalar().unwrap(), 6.0);
//! ```

use ndarray::{ArcArray, ArrayD, Axis, IxDyn};

use crate::types::{Complex, Vec3};

/// Shared real array.
pub type RealArray = ArcArray<f64, IxDyn>;

/// Shared complex array.
pub type ComplexArray = ArcArray<Complex, IxDyn>;

/// Errors from the array layer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    #[error("axis {axis} is out of bounds for an array with {ndim} dimensions")]
    AxisOutOfBounds { axis: usize, ndim: usize },

    #[error("index {index} is out of bounds for an axis of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("cannot stack an empty list of arrays")]
    EmptyStack,

    #[error("shapes {left:?} and {right:?} are not compatible")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("expected a real-valued array, got a complex one")]
    ExpectedReal,

    #[error("expected a single value, got an array of shape {0:?}")]
    NotScalar(Vec<usize>),

    #[error("expected an array of shape [3], got {0:?}")]
    NotAVector(Vec<usize>),

    #[error("cannot reshape an axis of length {len} into {shape:?}")]
    InvalidReshape { len: usize, shape: Vec<usize> },
}

/// An n-dimensional array of either real or complex values.
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    Real(RealArray),
    Complex(ComplexArray),
}

macro_rules! dispatch {
    ($self:expr, $a:ident => $body:expr) => {
        match $self {
            Tensor::Real($a) => Tensor::Real($body),
            Tensor::Complex($a) => Tensor::Complex($body),
        }
    };
}

macro_rules! binop {
    ($name:ident, $op:tt) => {
        /// Elementwise operation with numpy-style broadcasting. Real operands are
        /// promoted to complex when the other side is complex.
        pub fn $name(&self, other: &Tensor) -> Result<Tensor, TensorError> {
            broadcast_shape(self.shape(), other.shape()).ok_or_else(|| {
                TensorError::ShapeMismatch {
                    left: self.shape().to_vec(),
                    right: other.shape().to_vec(),
                }
            })?;
            Ok(match (self, other) {
                (Tensor::Real(a), Tensor::Real(b)) => Tensor::Real((a $op b).into_shared()),
                _ => {
                    let a = self.to_complex();
                    let b = other.to_complex();
                    Tensor::Complex((&a $op &b).into_shared())
                }
            })
        }
    };
}

impl Tensor {
    pub fn real(a: ArrayD<f64>) -> Self {
        Tensor::Real(a.into_shared())
    }

    pub fn complex(a: ArrayD<Complex>) -> Self {
        Tensor::Complex(a.into_shared())
    }

    pub fn scalar(v: f64) -> Self {
        Tensor::real(ArrayD::from_elem(IxDyn(&[]), v))
    }

    pub fn complex_scalar(v: Complex) -> Self {
        Tensor::complex(ArrayD::from_elem(IxDyn(&[]), v))
    }

    /// A 1D real array.
    pub fn from_vec(v: Vec<f64>) -> Self {
        let n = v.len();
        // A vector always fits a 1D shape of its own length.
        Tensor::real(ArrayD::from_shape_vec(IxDyn(&[n]), v).unwrap_or_else(|_| ArrayD::zeros(IxDyn(&[0]))))
    }

    /// A real array from a flat buffer and a shape.
    pub fn from_shape_vec(shape: &[usize], v: Vec<f64>) -> Result<Self, TensorError> {
        let len = v.len();
        ArrayD::from_shape_vec(IxDyn(shape), v)
            .map(Tensor::real)
            .map_err(|_| TensorError::InvalidReshape { len, shape: shape.to_vec() })
    }

    /// A complex array from a flat buffer and a shape.
    pub fn from_shape_vec_complex(shape: &[usize], v: Vec<Complex>) -> Result<Self, TensorError> {
        let len = v.len();
        ArrayD::from_shape_vec(IxDyn(shape), v)
            .map(Tensor::complex)
            .map_err(|_| TensorError::InvalidReshape { len, shape: shape.to_vec() })
    }

    pub fn from_vec3(v: Vec3) -> Self {
        Tensor::from_vec(v.to_array().to_vec())
    }

    /// An array of shape `[n, 3]`.
    pub fn from_points(points: &[Vec3]) -> Self {
        let flat: Vec<f64> = points.iter().flat_map(|p| p.to_array()).collect();
        Tensor::from_shape_vec(&[points.len(), 3], flat)
            .unwrap_or_else(|_| Tensor::real(ArrayD::zeros(IxDyn(&[0, 3]))))
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Tensor::real(ArrayD::zeros(IxDyn(shape)))
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::Real(a) => a.shape(),
            Tensor::Complex(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Tensor::Complex(_))
    }

    fn check_axis(&self, axis: usize) -> Result<(), TensorError> {
        if axis >= self.ndim() {
            return Err(TensorError::AxisOutOfBounds { axis, ndim: self.ndim() });
        }
        Ok(())
    }

    pub fn as_real(&self) -> Result<&RealArray, TensorError> {
        match self {
            Tensor::Real(a) => Ok(a),
            Tensor::Complex(_) => Err(TensorError::ExpectedReal),
        }
    }

    /// Complex copy of the data (real values get a zero imaginary part).
    pub fn to_complex(&self) -> ComplexArray {
        match self {
            Tensor::Real(a) => a.mapv(|x| Complex::new(x, 0.0)).into_shared(),
            Tensor::Complex(a) => a.clone(),
        }
    }

    /// The single value of a 0-d (or one-element) real array.
    pub fn to_scalar(&self) -> Result<f64, TensorError> {
        let a = self.as_real()?;
        if a.len() != 1 {
            return Err(TensorError::NotScalar(a.shape().to_vec()));
        }
        a.iter().next().copied().ok_or_else(|| TensorError::NotScalar(a.shape().to_vec()))
    }

    /// The single value of a 0-d (or one-element) array, as a complex number.
    pub fn to_complex_scalar(&self) -> Result<Complex, TensorError> {
        if self.len() != 1 {
            return Err(TensorError::NotScalar(self.shape().to_vec()));
        }
        match self {
            Tensor::Real(a) => Ok(a.iter().next().map(|x| Complex::new(*x, 0.0)).unwrap_or_default()),
            Tensor::Complex(a) => Ok(a.iter().next().copied().unwrap_or_default()),
        }
    }

    /// Interpret a real array of shape `[3]` as a vector.
    pub fn to_vec3(&self) -> Result<Vec3, TensorError> {
        let a = self.as_real()?;
        if a.shape() != [3] {
            return Err(TensorError::NotAVector(a.shape().to_vec()));
        }
        let v: Vec<f64> = a.iter().copied().collect();
        Ok(Vec3::new(v[0], v[1], v[2]))
    }

    /// Real values as a flat vector in logical (row-major) order.
    pub fn to_real_vec(&self) -> Result<Vec<f64>, TensorError> {
        Ok(self.as_real()?.iter().copied().collect())
    }

    /// Complex values as a flat vector in logical (row-major) order.
    pub fn to_complex_vec(&self) -> Vec<Complex> {
        self.to_complex().iter().copied().collect()
    }

    /// The sub-array at `index` along `axis`, with that axis removed.
    pub fn index_axis(&self, axis: usize, index: usize) -> Result<Tensor, TensorError> {
        self.check_axis(axis)?;
        let len = self.shape()[axis];
        if index >= len {
            return Err(TensorError::IndexOutOfBounds { index, len });
        }
        Ok(dispatch!(self, a => a.index_axis(Axis(axis), index).to_owned().into_shared()))
    }

    /// Zeros of the same kind (real or complex) as `self`, with `axis` removed.
    pub fn zeros_without_axis(&self, axis: usize) -> Result<Tensor, TensorError> {
        self.check_axis(axis)?;
        let mut shape = self.shape().to_vec();
        shape.remove(axis);
        Ok(self.zeros_of_shape(&shape))
    }

    /// An empty batch of arrays shaped like `self`: shape `[0, *self.shape()]`.
    pub fn empty_batch(&self) -> Tensor {
        let shape: Vec<usize> = std::iter::once(0).chain(self.shape().iter().copied()).collect();
        self.zeros_of_shape(&shape)
    }

    fn zeros_of_shape(&self, shape: &[usize]) -> Tensor {
        match self {
            Tensor::Real(_) => Tensor::zeros(shape),
            Tensor::Complex(_) => Tensor::complex(ArrayD::zeros(IxDyn(shape))),
        }
    }

    /// Stack arrays of equal shape along a new `axis`.
    pub fn stack(axis: usize, tensors: &[Tensor]) -> Result<Tensor, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyStack)?;
        if axis > first.ndim() {
            return Err(TensorError::AxisOutOfBounds { axis, ndim: first.ndim() + 1 });
        }
        for t in tensors {
            if t.shape() != first.shape() {
                return Err(TensorError::ShapeMismatch {
                    left: first.shape().to_vec(),
                    right: t.shape().to_vec(),
                });
            }
        }
        let mismatch = || TensorError::ShapeMismatch { left: first.shape().to_vec(), right: first.shape().to_vec() };
        if tensors.iter().all(|t| !t.is_complex()) {
            let views: Vec<_> = tensors
                .iter()
                .filter_map(|t| t.as_real().ok())
                .map(|a| a.view())
                .collect();
            let stacked = ndarray::stack(Axis(axis), &views).map_err(|_| mismatch())?;
            Ok(Tensor::real(stacked))
        } else {
            let owned: Vec<ComplexArray> = tensors.iter().map(Tensor::to_complex).collect();
            let views: Vec<_> = owned.iter().map(|a| a.view()).collect();
            let stacked = ndarray::stack(Axis(axis), &views).map_err(|_| mismatch())?;
            Ok(Tensor::complex(stacked))
        }
    }

    pub fn sum_axis(&self, axis: usize) -> Result<Tensor, TensorError> {
        self.check_axis(axis)?;
        Ok(dispatch!(self, a => a.sum_axis(Axis(axis)).into_shared()))
    }

    pub fn mean_axis(&self, axis: usize) -> Result<Tensor, TensorError> {
        self.check_axis(axis)?;
        let n = self.shape()[axis];
        if n == 0 {
            return Err(TensorError::IndexOutOfBounds { index: 0, len: 0 });
        }
        Ok(match self {
            Tensor::Real(a) => Tensor::real(a.sum_axis(Axis(axis)) / n as f64),
            Tensor::Complex(a) => Tensor::complex(a.sum_axis(Axis(axis)).mapv(|v| v / n as f64)),
        })
    }

    pub fn prod_axis(&self, axis: usize) -> Result<Tensor, TensorError> {
        self.check_axis(axis)?;
        Ok(match self {
            Tensor::Real(a) => Tensor::real(a.fold_axis(Axis(axis), 1.0, |acc, x| acc * x)),
            Tensor::Complex(a) => {
                Tensor::complex(a.fold_axis(Axis(axis), Complex::new(1.0, 0.0), |acc, x| acc * x))
            }
        })
    }

    /// Maximum along an axis. Only defined for real arrays.
    pub fn max_axis(&self, axis: usize) -> Result<Tensor, TensorError> {
        self.check_axis(axis)?;
        let a = self.as_real()?;
        Ok(Tensor::real(a.fold_axis(Axis(axis), f64::NEG_INFINITY, |acc, x| acc.max(*x))))
    }

    /// Sum over several axes given relative to the current shape.
    pub fn sum_axes(&self, axes: &[usize]) -> Result<Tensor, TensorError> {
        let mut sorted = axes.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        let mut out = self.clone();
        for axis in sorted {
            out = out.sum_axis(axis)?;
        }
        Ok(out)
    }

    /// Reorder the axes.
    pub fn permute(&self, axes: &[usize]) -> Result<Tensor, TensorError> {
        let mut seen = axes.to_vec();
        seen.sort_unstable();
        if seen != (0..self.ndim()).collect::<Vec<_>>() {
            return Err(TensorError::ShapeMismatch {
                left: self.shape().to_vec(),
                right: axes.to_vec(),
            });
        }
        Ok(dispatch!(self, a => a.clone().permuted_axes(IxDyn(axes))))
    }

    /// Move axis `source` to position `destination`, keeping the order of the rest.
    pub fn moveaxis(&self, source: usize, destination: usize) -> Result<Tensor, TensorError> {
        self.check_axis(source)?;
        self.check_axis(destination)?;
        let mut order: Vec<usize> = (0..self.ndim()).filter(|&i| i != source).collect();
        order.insert(destination, source);
        self.permute(&order)
    }

    /// Split one axis into several, e.g. a flat `points` axis into `(width, height)`.
    pub fn unflatten_axis(&self, axis: usize, shape: &[usize]) -> Result<Tensor, TensorError> {
        self.check_axis(axis)?;
        let len = self.shape()[axis];
        if shape.iter().product::<usize>() != len {
            return Err(TensorError::InvalidReshape { len, shape: shape.to_vec() });
        }
        let mut new_shape: Vec<usize> = self.shape()[..axis].to_vec();
        new_shape.extend_from_slice(shape);
        new_shape.extend_from_slice(&self.shape()[axis + 1..]);
        let err = || TensorError::InvalidReshape { len, shape: shape.to_vec() };
        Ok(match self {
            Tensor::Real(a) => Tensor::real(
                a.as_standard_layout()
                    .to_owned()
                    .into_shape_with_order(IxDyn(&new_shape))
                    .map_err(|_| err())?,
            ),
            Tensor::Complex(a) => Tensor::complex(
                a.as_standard_layout()
                    .to_owned()
                    .into_shape_with_order(IxDyn(&new_shape))
                    .map_err(|_| err())?,
            ),
        })
    }

    binop!(add, +);
    binop!(sub, -);
    binop!(mul, *);
    binop!(div, /);

    /// Apply a function to every real element.
    pub fn map_real(&self, f: impl Fn(f64) -> f64) -> Result<Tensor, TensorError> {
        Ok(Tensor::real(self.as_real()?.mapv(f)))
    }

    /// Elementwise magnitude.
    pub fn abs(&self) -> Tensor {
        match self {
            Tensor::Real(a) => Tensor::real(a.mapv(f64::abs)),
            Tensor::Complex(a) => Tensor::real(a.mapv(|c| c.norm())),
        }
    }
}

impl From<f64> for Tensor {
    fn from(v: f64) -> Self {
        Tensor::scalar(v)
    }
}

impl From<Complex> for Tensor {
    fn from(v: Complex) -> Self {
        Tensor::complex_scalar(v)
    }
}

impl From<Vec3> for Tensor {
    fn from(v: Vec3) -> Self {
        Tensor::from_vec3(v)
    }
}

impl std::fmt::Display for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ndim() == 0 {
            return match self {
                Tensor::Real(_) => write!(f, "{}", self.to_scalar().unwrap_or(f64::NAN)),
                Tensor::Complex(_) => {
                    let c = self.to_complex_scalar().unwrap_or_default();
                    write!(f, "{}", c)
                }
            };
        }
        write!(f, "Tensor{:?}", self.shape())
    }
}

/// Numpy-style broadcast of two shapes, aligned at the trailing axis.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let n = a.len().max(b.len());
    let mut out = vec![0; n];
    for i in 0..n {
        let da = if i < n - a.len() { 1 } else { a[i - (n - a.len())] };
        let db = if i < n - b.len() { 1 } else { b[i - (n - b.len())] };
        out[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return None,
        };
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arange(shape: &[usize]) -> Tensor {
        let n: usize = shape.iter().product();
        Tensor::from_shape_vec(shape, (0..n).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn test_index_and_stack() {
        let t = arange(&[2, 3]);
        let row = t.index_axis(0, 1).unwrap();
        assert_eq!(row.to_real_vec().unwrap(), vec![3.0, 4.0, 5.0]);
        let col = t.index_axis(1, 2).unwrap();
        assert_eq!(col.to_real_vec().unwrap(), vec![2.0, 5.0]);

        let rows: Vec<Tensor> = (0..2).map(|i| t.index_axis(0, i).unwrap()).collect();
        assert_eq!(Tensor::stack(0, &rows).unwrap(), t);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let t = arange(&[2, 3]);
        assert!(matches!(t.index_axis(2, 0), Err(TensorError::AxisOutOfBounds { .. })));
        assert!(matches!(t.index_axis(0, 5), Err(TensorError::IndexOutOfBounds { .. })));
        assert!(matches!(Tensor::stack(0, &[]), Err(TensorError::EmptyStack)));
    }

    #[test]
    fn test_stack_promotes_to_complex() {
        let a = Tensor::scalar(1.0);
        let b = Tensor::complex_scalar(Complex::new(0.0, 2.0));
        let s = Tensor::stack(0, &[a, b]).unwrap();
        assert!(s.is_complex());
        assert_eq!(s.to_complex_vec(), vec![Complex::new(1.0, 0.0), Complex::new(0.0, 2.0)]);
    }

    #[test]
    fn test_reductions() {
        let t = arange(&[2, 3]);
        assert_eq!(t.sum_axis(0).unwrap().to_real_vec().unwrap(), vec![3.0, 5.0, 7.0]);
        assert_eq!(t.mean_axis(1).unwrap().to_real_vec().unwrap(), vec![1.0, 4.0]);
        assert_eq!(t.prod_axis(1).unwrap().to_real_vec().unwrap(), vec![0.0, 60.0]);
        assert_eq!(t.max_axis(0).unwrap().to_real_vec().unwrap(), vec![3.0, 4.0, 5.0]);
        assert_relative_eq!(t.sum_axes(&[0, 1]).unwrap().to_scalar().unwrap(), 15.0);
    }

    #[test]
    fn test_broadcasting() {
        let t = arange(&[2, 3]);
        let s = t.add(&Tensor::scalar(1.0)).unwrap();
        assert_eq!(s.to_real_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let row = Tensor::from_vec(vec![1.0, 2.0, 3.0]);
        let m = t.mul(&row).unwrap();
        assert_eq!(m.to_real_vec().unwrap(), vec![0.0, 2.0, 6.0, 3.0, 8.0, 15.0]);
        assert!(t.add(&Tensor::from_vec(vec![1.0, 2.0])).is_err());
    }

    #[test]
    fn test_moveaxis_and_unflatten() {
        let t = arange(&[2, 3, 4]);
        let moved = t.moveaxis(2, 0).unwrap();
        assert_eq!(moved.shape(), &[4, 2, 3]);

        let flat = arange(&[6, 2]);
        let grid = flat.unflatten_axis(0, &[2, 3]).unwrap();
        assert_eq!(grid.shape(), &[2, 3, 2]);
        assert_eq!(grid.index_axis(0, 1).unwrap().index_axis(0, 0).unwrap().to_real_vec().unwrap(), vec![6.0, 7.0]);
        assert!(flat.unflatten_axis(0, &[4, 2]).is_err());
    }

    #[test]
    fn test_broadcast_shape() {
        assert_eq!(broadcast_shape(&[2, 3], &[3]), Some(vec![2, 3]));
        assert_eq!(broadcast_shape(&[2, 1], &[1, 4]), Some(vec![2, 4]));
        assert_eq!(broadcast_shape(&[], &[5]), Some(vec![5]));
        assert_eq!(broadcast_shape(&[2], &[3]), None);
    }

    #[test]
    fn test_vec3_roundtrip() {
        let v = Vec3::new(1.0, -2.0, 3.5);
        assert_eq!(Tensor::from(v).to_vec3().unwrap(), v);
        assert!(Tensor::scalar(1.0).to_vec3().is_err());
    }
}
