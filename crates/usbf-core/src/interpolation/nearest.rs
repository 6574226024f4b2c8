use super::{EdgeHandling, InterpolationSpace1D};
use crate::tensor::{Tensor, TensorError};

/// Nearest-sample interpolation on a uniformly spaced axis.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestInterpolation {
    pub min: f64,
    pub d: f64,
    pub n: usize,
    pub left: Tensor,
    pub right: Tensor,
}

impl NearestInterpolation {
    pub fn new(min: f64, d: f64, n: usize) -> Self {
        Self { min, d, n, left: Tensor::scalar(0.0), right: Tensor::scalar(0.0) }
    }

    pub fn with_fill(mut self, left: f64, right: f64) -> Self {
        self.left = Tensor::scalar(left);
        self.right = Tensor::scalar(right);
        self
    }
}

impl InterpolationSpace1D for NearestInterpolation {
    fn start(&self) -> f64 {
        self.min
    }

    fn end(&self) -> f64 {
        self.min + self.d * self.n as f64
    }

    fn interpolate(&self, x: f64, fp: &Tensor) -> Result<Tensor, TensorError> {
        let index = ((x - self.min) / self.d).round();
        if index < 0.0 {
            let like = fp.index_axis(0, 0)?;
            return EdgeHandling::fill(&self.left, &like);
        }
        if index >= self.n as f64 {
            let like = fp.index_axis(0, 0)?;
            return EdgeHandling::fill(&self.right, &like);
        }
        fp.index_axis(0, index as usize)
    }
}
