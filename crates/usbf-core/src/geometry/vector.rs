use serde::{Deserialize, Serialize};

use super::orientation::Direction;
use crate::types::{BeamResult, PreconditionError, Vec3};

/// A vector stored as magnitude and direction. The magnitude may be infinite,
/// which is how plane waves describe their virtual source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub magnitude: f64,
    pub direction: Direction,
}

impl Vector {
    pub const fn new(magnitude: f64, direction: Direction) -> Self {
        Self { magnitude, direction }
    }

    pub fn from_angles(magnitude: f64, azimuth: f64, elevation: f64) -> Self {
        Self::new(magnitude, Direction::new(azimuth, elevation))
    }

    pub fn from_point(p: Vec3) -> Self {
        Self::new(p.norm(), Direction::from_vector(p))
    }

    /// A vector at infinity in the given direction.
    pub fn at_infinity(direction: Direction) -> Self {
        Self::new(f64::INFINITY, direction)
    }

    pub fn is_infinite(&self) -> bool {
        self.magnitude.is_infinite()
    }

    /// The Cartesian point. Fails for vectors at infinity.
    pub fn to_point(&self) -> BeamResult<Vec3> {
        if self.is_infinite() {
            return Err(PreconditionError::InvalidGeometry(
                "a vector with infinite magnitude has no Cartesian point".into(),
            )
            .into());
        }
        Ok(self.direction.normalized_vector() * self.magnitude)
    }

    /// `self - p`. Subtracting a finite point from a vector at infinity leaves
    /// it unchanged.
    pub fn minus_point(&self, p: Vec3) -> Vector {
        if self.is_infinite() {
            return *self;
        }
        Vector::from_point(self.direction.normalized_vector() * self.magnitude - p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_point_round_trip() {
        let p = Vec3::new(0.01, 0.0, 0.04);
        let q = Vector::from_point(p).to_point().unwrap();
        assert_abs_diff_eq!(q.x, p.x, epsilon = 1e-12);
        assert_abs_diff_eq!(q.z, p.z, epsilon = 1e-12);
    }

    #[test]
    fn test_infinite_subtraction_is_noop() {
        let v = Vector::at_infinity(Direction::new(0.2, 0.0));
        assert_eq!(v.minus_point(Vec3::new(1.0, 2.0, 3.0)), v);
        assert!(v.to_point().is_err());
    }

    #[test]
    fn test_finite_subtraction() {
        let v = Vector::from_point(Vec3::new(0.0, 0.0, 0.05));
        let d = v.minus_point(Vec3::new(0.01, 0.0, 0.0));
        assert_abs_diff_eq!(d.direction.azimuth, (-0.01f64).atan2(0.05), epsilon = 1e-12);
        assert_abs_diff_eq!(d.magnitude, (0.01f64.powi(2) + 0.05f64.powi(2)).sqrt(), epsilon = 1e-12);
    }
}
