//! Interpolation — sampling recorded data at arbitrary positions
//!
//! Two families live here:
//!
//! - [`InterpolationSpace1D`] implementations ([`FastInterpLinspace`],
//!   [`NearestInterpolation`]) sample the first axis of a tensor at one
//!   position. The beamforming kernel uses these to read a channel signal at a
//!   delay.
//! - [`Coordinates`] implementations describe a sampled axis and answer "which
//!   samples surround x". The N-dimensional interpolators in [`nd`] combine
//!   them over named dimensions.
//!
//! Out-of-bounds positions are never an error. What they return is chosen with
//! [`EdgeHandling`].
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::interpolation::{EdgeHandling, FastInterpLinspace};
//! use usbf_core::tensor::Tensor;
//!
//! let interp = FastInterpLinspace::new(10.0, 1.0, 2);
//! let fp = Tensor::from_vec(vec![10.0, 30.0]);
//! let v = interp.interp1d(10.5, &fp, &EdgeHandling::value(-1.0)).unwrap();
//! assert_eq!(v.to_scalar().unwrap(), 20.0);
//! ```

pub mod fast_interp;
pub mod irregular;
pub mod linear_coordinates;
pub mod nd;
pub mod nearest;

pub use fast_interp::FastInterpLinspace;
pub use irregular::IrregularSampledCoordinates;
pub use linear_coordinates::LinearCoordinates;
pub use nd::{LinearNDInterpolator, NearestNDInterpolator};
pub use nearest::NearestInterpolation;

use std::fmt::Debug;

use crate::tensor::{Tensor, TensorError};

/// What an interpolator returns for positions outside the sampled range.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeHandling {
    /// Return `left` below the range and `right` above it. Both broadcast
    /// against the value shape.
    Value { left: Tensor, right: Tensor },
    /// Return the value of the nearest valid sample.
    Nearest,
}

impl EdgeHandling {
    /// The same constant on both sides.
    pub fn value(v: f64) -> Self {
        EdgeHandling::Value { left: Tensor::scalar(v), right: Tensor::scalar(v) }
    }

    pub fn values(left: Tensor, right: Tensor) -> Self {
        EdgeHandling::Value { left, right }
    }

    /// `fill` broadcast to the shape of `like`.
    pub(crate) fn fill(fill: &Tensor, like: &Tensor) -> Result<Tensor, TensorError> {
        Tensor::zeros(like.shape()).add(fill)
    }
}

impl Default for EdgeHandling {
    fn default() -> Self {
        EdgeHandling::value(0.0)
    }
}

/// Samples along the first axis of a tensor at a single position.
pub trait InterpolationSpace1D: Debug + Send + Sync {
    /// Position of the first sample.
    fn start(&self) -> f64;

    /// One step past the last sample.
    fn end(&self) -> f64;

    /// The value of `fp` at `x`. Trailing axes of `fp` are carried along.
    fn interpolate(&self, x: f64, fp: &Tensor) -> Result<Tensor, TensorError>;
}

/// Which samples surround a position, and where they are.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicesInfo {
    pub x: f64,
    /// Sample indices, clipped to the valid range
    pub indices: Vec<usize>,
    /// Physical position of each sample
    pub positions: Vec<f64>,
    pub within_bounds: bool,
}

impl IndicesInfo {
    /// `|position - x|` for each sample.
    pub fn offset_distances(&self) -> Vec<f64> {
        self.positions.iter().map(|p| (p - self.x).abs()).collect()
    }
}

/// A sampled axis.
pub trait Coordinates: Debug + Send + Sync {
    fn start(&self) -> f64;

    fn stop(&self) -> f64;

    /// `n_samples` consecutive samples around `x`. For odd counts they are
    /// centered on the nearest sample; for even counts, on `x` itself.
    fn get_nearest_indices(&self, x: f64, n_samples: usize) -> IndicesInfo;

    /// Whether `x` lies in `[start, stop)`.
    fn is_within_bounds(&self, x: f64) -> bool {
        self.start() <= x && x < self.stop()
    }
}

/// `n` consecutive signed offsets centered as described on [`Coordinates`].
pub(crate) fn centered_offsets(n_samples: usize) -> impl Iterator<Item = i64> {
    let half = (n_samples / 2) as i64;
    (0..n_samples as i64).map(move |i| i - half)
}
