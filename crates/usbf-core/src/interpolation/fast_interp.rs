use super::{EdgeHandling, InterpolationSpace1D};
use crate::tensor::{Tensor, TensorError};

/// Which side of the sampled range a position fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    Below,
    Within,
    Above,
}

/// The two samples and weights for linearly interpolating one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpIndices {
    pub bounds: Bounds,
    pub i1: usize,
    pub i2: usize,
    pub p1: f64,
    pub p2: f64,
}

/// Linear interpolation on a uniformly spaced axis.
///
/// Positions map to fractional indices with one subtraction and one division,
/// which is what makes this the default for delaying channel data.
#[derive(Debug, Clone, PartialEq)]
pub struct FastInterpLinspace {
    pub min: f64,
    pub d: f64,
    pub n: usize,
    /// Edge handling used through [`InterpolationSpace1D`]
    pub edge: EdgeHandling,
}

impl FastInterpLinspace {
    pub fn new(min: f64, d: f64, n: usize) -> Self {
        Self { min, d, n, edge: EdgeHandling::default() }
    }

    pub fn with_edge(mut self, edge: EdgeHandling) -> Self {
        self.edge = edge;
        self
    }

    /// The axis of a uniformly spaced sample array. Needs at least two samples.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        match samples {
            [a, b, ..] => Some(Self::new(*a, b - a, samples.len())),
            _ => None,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.n).map(|i| self.min + self.d * i as f64).collect()
    }

    /// Indices and weights for `x`. The indices are always valid; `bounds`
    /// tells whether `x` was outside the range.
    pub fn interp1d_indices(&self, x: f64) -> InterpIndices {
        let last = self.n.saturating_sub(1) as f64;
        let pseudo_index = (x - self.min) / self.d;
        let bounds = if pseudo_index < 0.0 {
            Bounds::Below
        } else if pseudo_index > last {
            Bounds::Above
        } else {
            Bounds::Within
        };
        let floor = pseudo_index.floor();
        let di = pseudo_index - floor;
        InterpIndices {
            bounds,
            i1: floor.clamp(0.0, last) as usize,
            i2: (floor + 1.0).clamp(0.0, last) as usize,
            p1: 1.0 - di,
            p2: di,
        }
    }

    fn clamped(&self, x: f64) -> f64 {
        let max = self.min + self.d * self.n.saturating_sub(1) as f64;
        let (lo, hi) = if self.d >= 0.0 { (self.min, max) } else { (max, self.min) };
        x.clamp(lo, hi)
    }

    fn lerp(fp: &Tensor, ix: &InterpIndices) -> Result<Tensor, TensorError> {
        let a = fp.index_axis(0, ix.i1)?.mul(&Tensor::scalar(ix.p1))?;
        let b = fp.index_axis(0, ix.i2)?.mul(&Tensor::scalar(ix.p2))?;
        a.add(&b)
    }

    /// Linearly interpolate the first axis of `fp` at `x`.
    pub fn interp1d(&self, x: f64, fp: &Tensor, edge: &EdgeHandling) -> Result<Tensor, TensorError> {
        match edge {
            EdgeHandling::Nearest => Self::lerp(fp, &self.interp1d_indices(self.clamped(x))),
            EdgeHandling::Value { left, right } => {
                let ix = self.interp1d_indices(x);
                let v = Self::lerp(fp, &ix)?;
                match ix.bounds {
                    Bounds::Within => Ok(v),
                    Bounds::Below => EdgeHandling::fill(left, &v),
                    Bounds::Above => EdgeHandling::fill(right, &v),
                }
            }
        }
    }

    /// Bilinear interpolation of `z` at `(x, y)`, where `x` indexes
    /// `azimuth_axis` and `y` indexes `depth_axis`. Other axes of `z` are value
    /// axes and are kept in order. With [`EdgeHandling::Value`] the `left`
    /// value pads positions outside either axis.
    #[allow(clippy::too_many_arguments)]
    pub fn interp2d(
        x: f64,
        y: f64,
        xp: &FastInterpLinspace,
        yp: &FastInterpLinspace,
        z: &Tensor,
        azimuth_axis: usize,
        depth_axis: usize,
        edge: &EdgeHandling,
    ) -> Result<Tensor, TensorError> {
        let moved = z.moveaxis(azimuth_axis, 0)?;
        let depth_axis = if depth_axis < azimuth_axis { depth_axis + 1 } else { depth_axis };
        let z = moved.moveaxis(depth_axis, 1)?;

        let (x, y) = match edge {
            EdgeHandling::Nearest => (xp.clamped(x), yp.clamped(y)),
            EdgeHandling::Value { .. } => (x, y),
        };
        let ix = xp.interp1d_indices(x);
        let iy = yp.interp1d_indices(y);

        let at = |i: usize, j: usize| z.index_axis(0, i)?.index_axis(0, j);
        let scale = |t: Tensor, w: f64| t.mul(&Tensor::scalar(w));
        let v0 = scale(at(ix.i1, iy.i1)?, ix.p1)?.add(&scale(at(ix.i2, iy.i1)?, ix.p2)?)?;
        let v1 = scale(at(ix.i1, iy.i2)?, ix.p1)?.add(&scale(at(ix.i2, iy.i2)?, ix.p2)?)?;
        let v = scale(v0, iy.p1)?.add(&scale(v1, iy.p2)?)?;

        match edge {
            EdgeHandling::Value { left, .. } if ix.bounds != Bounds::Within || iy.bounds != Bounds::Within => {
                EdgeHandling::fill(left, &v)
            }
            _ => Ok(v),
        }
    }
}

impl InterpolationSpace1D for FastInterpLinspace {
    fn start(&self) -> f64 {
        self.min
    }

    fn end(&self) -> f64 {
        self.min + self.d * self.n as f64
    }

    fn interpolate(&self, x: f64, fp: &Tensor) -> Result<Tensor, TensorError> {
        self.interp1d(x, fp, &self.edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Complex;
    use approx::assert_abs_diff_eq;

    fn interp() -> FastInterpLinspace {
        FastInterpLinspace::new(10.0, 1.0, 2)
    }

    fn at(x: f64, edge: &EdgeHandling) -> f64 {
        let fp = Tensor::from_vec(vec![10.0, 30.0]);
        interp().interp1d(x, &fp, edge).unwrap().to_scalar().unwrap()
    }

    #[test]
    fn test_linear_values() {
        let edge = EdgeHandling::values(Tensor::scalar(-1.0), Tensor::scalar(-2.0));
        assert_eq!(at(10.0, &edge), 10.0);
        assert_eq!(at(10.5, &edge), 20.0);
        assert_eq!(at(11.0, &edge), 30.0);
        assert_eq!(at(9.5, &edge), -1.0);
        assert_eq!(at(11.5, &edge), -2.0);
    }

    #[test]
    fn test_nearest_edge_clamps() {
        assert_eq!(at(9.5, &EdgeHandling::Nearest), 10.0);
        assert_eq!(at(11.5, &EdgeHandling::Nearest), 30.0);
        assert_eq!(at(10.5, &EdgeHandling::Nearest), 20.0);
    }

    #[test]
    fn test_value_edge_broadcasts_default_array() {
        // Two value channels per sample
        let fp = Tensor::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let default = Tensor::from_vec(vec![-5.0, -6.0]);
        let edge = EdgeHandling::values(default.clone(), default.clone());
        let v = interp().interp1d(12.0, &fp, &edge).unwrap();
        assert_eq!(v, default);
        let v = interp().interp1d(12.0, &fp, &EdgeHandling::Nearest).unwrap();
        assert_eq!(v.to_real_vec().unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_complex_samples() {
        let fp = Tensor::from_shape_vec_complex(&[2], vec![Complex::new(0.0, 2.0), Complex::new(2.0, 0.0)]).unwrap();
        let v = interp().interpolate(10.5, &fp).unwrap().to_complex_scalar().unwrap();
        assert_abs_diff_eq!(v.re, 1.0);
        assert_abs_diff_eq!(v.im, 1.0);
    }

    #[test]
    fn test_interp2d() {
        // z[x, y] = 10 * x + y on a 3x2 grid, with value axis last
        let z = Tensor::from_shape_vec(&[3, 2], vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0]).unwrap();
        let xp = FastInterpLinspace::new(0.0, 1.0, 3);
        let yp = FastInterpLinspace::new(0.0, 1.0, 2);
        let edge = EdgeHandling::value(-1.0);
        let v = FastInterpLinspace::interp2d(1.5, 0.5, &xp, &yp, &z, 0, 1, &edge).unwrap();
        assert_abs_diff_eq!(v.to_scalar().unwrap(), 15.5, epsilon = 1e-12);

        // Same data with the axes swapped
        let zt = z.permute(&[1, 0]).unwrap();
        let v = FastInterpLinspace::interp2d(1.5, 0.5, &xp, &yp, &zt, 1, 0, &edge).unwrap();
        assert_abs_diff_eq!(v.to_scalar().unwrap(), 15.5, epsilon = 1e-12);

        let v = FastInterpLinspace::interp2d(1.5, 1.5, &xp, &yp, &z, 0, 1, &edge).unwrap();
        assert_eq!(v.to_scalar().unwrap(), -1.0);
        let v = FastInterpLinspace::interp2d(1.5, 1.5, &xp, &yp, &z, 0, 1, &EdgeHandling::Nearest).unwrap();
        assert_abs_diff_eq!(v.to_scalar().unwrap(), 16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_samples() {
        let i = FastInterpLinspace::from_samples(&[0.0, 0.5, 1.0, 1.5]).unwrap();
        assert_eq!(i.n, 4);
        assert_eq!(i.to_vec(), vec![0.0, 0.5, 1.0, 1.5]);
        assert!(FastInterpLinspace::from_samples(&[1.0]).is_none());
    }
}
