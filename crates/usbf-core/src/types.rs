//! Core types for ultrasound beamforming
//!
//! This module defines the small set of types shared by every other module:
//! the complex sample type used for IQ data, a 3D vector type for positions and
//! directions, and the crate-wide error type.
//!
//! ## Coordinate convention
//!
//! Positions are given in meters in a right-handed frame centered on the probe:
//!
//! ```text
//!            z (depth, into the medium)
//!            ^
//!            |
//!            |
//!   ---------+---------> x (lateral / azimuth)
//!           /
//!          y (elevation)
//! ```
//!
//! Azimuth rotates in the xz-plane and elevation in the yz-plane. See
//! [`crate::geometry`] for the rotation order.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Index, Mul, Neg, Sub, SubAssign};

use crate::spec::SpecError;
use crate::tensor::TensorError;
use crate::transform::{AxisConcretizationError, TransformedFunctionError};

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// Result type for beamforming operations
pub type BeamResult<T> = Result<T, BeamError>;

/// Errors that can occur while building or running a beamformer
#[derive(Debug, Clone, thiserror::Error)]
pub enum BeamError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Axis(#[from] AxisConcretizationError),

    #[error(transparent)]
    Pipeline(#[from] TransformedFunctionError),

    #[error("{0}")]
    Other(String),
}

impl BeamError {
    /// Short name of the error kind, used when rendering pipeline diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            BeamError::Spec(_) => "SpecError",
            BeamError::Tensor(_) => "TensorError",
            BeamError::Precondition(_) => "PreconditionError",
            BeamError::Axis(_) => "AxisConcretizationError",
            BeamError::Pipeline(_) => "TransformedFunctionError",
            BeamError::Other(_) => "Error",
        }
    }

    /// The innermost error, looking through pipeline diagnostics.
    pub fn root_cause(&self) -> &BeamError {
        match self {
            BeamError::Pipeline(e) => e.original().root_cause(),
            other => other,
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        BeamError::Other(msg.into())
    }
}

/// Kinds of transmitted waves, used to describe precondition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveKind {
    /// Converging toward a finite virtual source in front of the array
    Focused,
    /// Diverging from a finite virtual source behind the array
    Diverging,
    /// Virtual source at infinity
    Plane,
    /// No virtual source (e.g. single-element synthetic transmit aperture)
    Unfocused,
}

impl std::fmt::Display for WaveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaveKind::Focused => write!(f, "focused wave"),
            WaveKind::Diverging => write!(f, "diverging wave"),
            WaveKind::Plane => write!(f, "plane wave"),
            WaveKind::Unfocused => write!(f, "unfocused wave"),
        }
    }
}

/// Fatal misuse of a model, detected at the call site.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreconditionError {
    #[error("Expected a {expected} transmitted wave, but got a {actual}")]
    WrongWaveKind {
        expected: &'static str,
        actual: WaveKind,
    },

    #[error("Invalid apodization configuration: {0}")]
    InvalidApodization(String),

    #[error("Invalid window parameter: {0}")]
    InvalidWindow(String),

    #[error("Missing field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// A 3D vector (x, y, z) in meters, used for points, element positions and directions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    /// Unit vector pointing straight into the medium.
    pub const Z: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f64 {
        (self - other).norm()
    }

    /// Unit vector in the same direction. The zero vector is returned unchanged.
    pub fn normalized(self) -> Vec3 {
        let n = self.norm();
        if n == 0.0 {
            self
        } else {
            self / n
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Vec3 {
        Vec3::new(f(self.x), f(self.y), f(self.z))
    }

    /// Mean of a set of vectors; `None` when empty.
    pub fn mean(vs: &[Vec3]) -> Option<Vec3> {
        if vs.is_empty() {
            return None;
        }
        let sum = vs.iter().fold(Vec3::ZERO, |acc, v| acc + *v);
        Some(sum / vs.len() as f64)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::from_array(v)
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range: {}", i),
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Vec3 {
        rhs * self
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;
    fn div(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vec3_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_relative_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::new(1.0, 0.0, 0.0).cross(Vec3::new(0.0, 0.0, 1.0)), Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_vec3_norm() {
        let v = Vec3::new(3.0, 0.0, 4.0);
        assert_relative_eq!(v.norm(), 5.0);
        assert_relative_eq!(v.normalized().norm(), 1.0);
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
    }

    #[test]
    fn test_precondition_message_names_both_kinds() {
        let err = PreconditionError::WrongWaveKind {
            expected: "geometrically focused",
            actual: WaveKind::Plane,
        };
        let msg = err.to_string();
        assert!(msg.contains("geometrically focused"));
        assert!(msg.contains("plane wave"));
    }
}
