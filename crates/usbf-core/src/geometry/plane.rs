use serde::{Deserialize, Serialize};

use super::orientation::{Direction, Orientation};
use crate::types::Vec3;

/// An oriented plane: the local x/y axes span the plane and the local z axis
/// is the normal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Vec3,
    pub orientation: Orientation,
}

impl Plane {
    pub const fn new(origin: Vec3, orientation: Orientation) -> Self {
        Self { origin, orientation }
    }

    pub fn normal(&self) -> Direction {
        self.orientation.direction()
    }

    /// Distance from the plane to `p` along the normal, or along `along` if given.
    /// Positive on the side the normal points to.
    pub fn signed_distance(&self, p: Vec3, along: Option<Direction>) -> f64 {
        let n = self.normal().normalized_vector();
        let d = (p - self.origin).dot(n);
        match along {
            Some(dir) => d / dir.normalized_vector().dot(n),
            None => d,
        }
    }

    /// Move `p` onto the plane along the normal, or along `along` if given.
    pub fn project(&self, p: Vec3, along: Option<Direction>) -> Vec3 {
        let dir = along.unwrap_or_else(|| self.normal()).normalized_vector();
        p - dir * self.signed_distance(p, along)
    }

    /// `(x, y)` of the projection of `p` in the plane's local frame.
    pub fn to_plane_coordinates(&self, p: Vec3) -> (f64, f64) {
        let local = self.orientation.rotate_inverse(self.project(p, None) - self.origin);
        (local.x, local.y)
    }

    pub fn from_plane_coordinates(&self, x: f64, y: f64) -> Vec3 {
        self.orientation.rotate(Vec3::new(x, y, 0.0)) + self.origin
    }

    /// The same plane pointing in a new direction, keeping or replacing the roll.
    pub fn orient(&self, direction: Direction, roll: Option<f64>) -> Plane {
        let roll = roll.unwrap_or(self.orientation.roll);
        Plane::new(self.origin, Orientation::from_direction_and_roll(direction, roll))
    }

    pub fn with_origin(&self, origin: Vec3) -> Plane {
        Plane::new(origin, self.orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tilted() -> Plane {
        Plane::new(Vec3::new(0.001, -0.002, 0.01), Orientation::new(0.3, -0.2, 0.5))
    }

    #[test]
    fn test_projection_idempotence() {
        let plane = tilted();
        for p in [Vec3::new(0.02, 0.01, 0.04), Vec3::new(-0.01, 0.0, 0.0), Vec3::ZERO] {
            let projected = plane.project(p, None);
            let (x, y) = plane.to_plane_coordinates(projected);
            let back = plane.from_plane_coordinates(x, y);
            assert_abs_diff_eq!(back.x, projected.x, epsilon = 1e-12);
            assert_abs_diff_eq!(back.y, projected.y, epsilon = 1e-12);
            assert_abs_diff_eq!(back.z, projected.z, epsilon = 1e-12);
            assert_abs_diff_eq!(plane.signed_distance(projected, None), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_signed_distance() {
        let plane = Plane::default();
        assert_abs_diff_eq!(plane.signed_distance(Vec3::new(0.3, 0.0, 0.02), None), 0.02);
        assert_abs_diff_eq!(plane.signed_distance(Vec3::new(0.0, 0.0, -0.02), None), -0.02);

        // Along a 60 degree direction the path to the plane is twice as long.
        let along = Direction::new(std::f64::consts::FRAC_PI_3, 0.0);
        assert_abs_diff_eq!(plane.signed_distance(Vec3::new(0.0, 0.0, 0.02), Some(along)), 0.04, epsilon = 1e-12);
        let p = plane.project(Vec3::new(0.0, 0.0, 0.02), Some(along));
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-12);
    }
}
