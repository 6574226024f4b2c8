//! Scans — the grid of points to image
//!
//! A scan is a set of axes whose outer product is the image grid. Beamforming
//! works on the flat list of points ([`Scan::points`]); the flat result is
//! reshaped back to the grid with [`Scan::unflatten`].
//!
//! | Scan | Axes | Points |
//! |------|------|--------|
//! | [`LinearScan`] | x, (y), z | the Cartesian grid itself |
//! | [`SectorScan`] | azimuth, (elevation), depth | polar grid around an apex |
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::scan::{linspace, LinearScan, Scan};
//!
//! let scan = LinearScan::new(linspace(-0.01, 0.01, 3), linspace(0.01, 0.03, 5)).unwrap();
//! assert_eq!(scan.shape(), vec![3, 5]);
//! assert_eq!(scan.points().len(), 15);
//! ```

pub mod linear;
pub mod sector;

pub use linear::LinearScan;
pub use sector::SectorScan;

use std::fmt;

use crate::tensor::{Tensor, TensorError};
use crate::types::{BeamResult, PreconditionError, Vec3};

/// `n` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Axis-aligned bounding box of a scan, `(min, max)` per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianBounds {
    pub x: (f64, f64),
    /// `None` for 2D scans
    pub y: Option<(f64, f64)>,
    pub z: (f64, f64),
}

impl CartesianBounds {
    /// Brute-force bounds of a point cloud.
    pub fn of_points(points: &[Vec3], with_y: bool) -> Option<Self> {
        let first = points.first()?;
        let init = ((first.x, first.x), (first.y, first.y), (first.z, first.z));
        let (x, y, z) = points.iter().fold(init, |(x, y, z), p| {
            (
                (x.0.min(p.x), x.1.max(p.x)),
                (y.0.min(p.y), y.1.max(p.y)),
                (z.0.min(p.z), z.1.max(p.z)),
            )
        });
        Some(Self { x, y: with_y.then_some(y), z })
    }
}

/// Both ends of an axis, in the order they were given.
pub(crate) fn ends(axis: &[f64]) -> (f64, f64) {
    match (axis.first(), axis.last()) {
        (Some(&a), Some(&b)) => (a, b),
        _ => (f64::NAN, f64::NAN),
    }
}

pub(crate) fn require_axis(name: &str, axis: &[f64]) -> BeamResult<()> {
    if axis.is_empty() {
        return Err(PreconditionError::InvalidGeometry(format!("scan axis `{name}` is empty")).into());
    }
    Ok(())
}

/// `axis` resampled to `n` evenly spaced values between its ends.
pub(crate) fn resized(name: &str, axis: Option<&[f64]>, n: Option<usize>) -> BeamResult<Option<Vec<f64>>> {
    match (axis, n) {
        (_, None) => Ok(axis.map(<[f64]>::to_vec)),
        (None, Some(_)) => Err(PreconditionError::InvalidGeometry(format!(
            "Cannot resize {name} because it is not defined on this scan"
        ))
        .into()),
        (Some(axis), Some(n)) => {
            let (start, stop) = ends(axis);
            Ok(Some(linspace(start, stop, n)))
        }
    }
}

/// A grid of points to image.
pub trait Scan: fmt::Debug + Send + Sync {
    /// The axes whose outer product is the grid, outermost first.
    fn axes(&self) -> Vec<&[f64]>;

    /// Every point of the grid, in row-major order of [`shape`](Self::shape).
    fn points(&self) -> Vec<Vec3>;

    /// Bounding box of [`points`](Self::points), computed without generating them.
    /// Sector scans report it relative to their apex.
    fn cartesian_bounds(&self) -> CartesianBounds;

    /// A copy with the given axes resampled to new sizes, one entry per axis.
    fn resize(&self, sizes: &[Option<usize>]) -> BeamResult<Self>
    where
        Self: Sized;

    fn shape(&self) -> Vec<usize> {
        self.axes().iter().map(|a| a.len()).collect()
    }

    fn num_points(&self) -> usize {
        self.shape().iter().product()
    }

    fn ndim(&self) -> usize {
        self.axes().len()
    }

    fn is_2d(&self) -> bool {
        self.ndim() == 2
    }

    fn is_3d(&self) -> bool {
        self.ndim() == 3
    }

    /// First and last value of every axis.
    fn bounds(&self) -> Vec<(f64, f64)> {
        self.axes().iter().map(|a| ends(a)).collect()
    }

    /// The points as a `[num_points, 3]` tensor, or `[*shape, 3]` unflattened.
    fn get_points(&self, flatten: bool) -> Result<Tensor, TensorError> {
        let points = Tensor::from_points(&self.points());
        if flatten {
            Ok(points)
        } else {
            points.unflatten_axis(0, &self.shape())
        }
    }

    /// Reshape the flat `points_axis` of `values` to the grid shape.
    fn unflatten(&self, values: &Tensor, points_axis: usize) -> Result<Tensor, TensorError> {
        values.unflatten_axis(points_axis, &self.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_bounds_of_points() {
        let points = [Vec3::new(1.0, -1.0, 3.0), Vec3::new(-2.0, 0.5, 4.0)];
        let b = CartesianBounds::of_points(&points, true).unwrap();
        assert_eq!(b.x, (-2.0, 1.0));
        assert_eq!(b.y, Some((-1.0, 0.5)));
        assert_eq!(b.z, (3.0, 4.0));
        assert!(CartesianBounds::of_points(&[], false).is_none());
    }
}
