use std::f64::consts::{PI, TAU};
use std::ops::Neg;

use serde::{Deserialize, Serialize};

use super::coordinate_systems::{rotate_xy, rotate_xz, rotate_yz};
use crate::types::Vec3;

/// A unit direction given by azimuth and elevation.
///
/// `(0, 0)` points along +z; positive azimuth tilts toward +x and positive
/// elevation toward +y.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Direction {
    pub azimuth: f64,
    pub elevation: f64,
}

impl Direction {
    pub const fn new(azimuth: f64, elevation: f64) -> Self {
        Self { azimuth, elevation }
    }

    /// Direction of an arbitrary (non-zero) vector.
    pub fn from_vector(v: Vec3) -> Self {
        let v = v.normalized();
        Self::new(v.x.atan2(v.z), v.y.clamp(-1.0, 1.0).asin())
    }

    /// Unit vector: elevation first, then azimuth, applied to +z.
    pub fn normalized_vector(&self) -> Vec3 {
        rotate_xz(rotate_yz(Vec3::Z, self.elevation), self.azimuth)
    }
}

impl Neg for Direction {
    type Output = Direction;

    fn neg(self) -> Direction {
        Direction::new((self.azimuth + PI).rem_euclid(TAU), (self.elevation + PI).rem_euclid(TAU))
    }
}

/// Mean of the unit vectors of `directions`, as a direction.
pub fn average_directions(directions: &[Direction]) -> Option<Direction> {
    let vectors: Vec<Vec3> = directions.iter().map(Direction::normalized_vector).collect();
    Vec3::mean(&vectors).map(Direction::from_vector)
}

/// Azimuth, elevation and roll of a rigid frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub azimuth: f64,
    pub elevation: f64,
    pub roll: f64,
}

impl Orientation {
    pub const fn new(azimuth: f64, elevation: f64, roll: f64) -> Self {
        Self { azimuth, elevation, roll }
    }

    /// The orientation whose [`direction`](Self::direction) is `direction`,
    /// with the given roll around it.
    pub fn from_direction_and_roll(direction: Direction, roll: f64) -> Self {
        let v = rotate_xy(direction.normalized_vector(), -roll);
        let d = Direction::from_vector(v);
        Self::new(d.azimuth, d.elevation, roll)
    }

    /// Rotate from the local frame into the global frame.
    pub fn rotate(&self, p: Vec3) -> Vec3 {
        rotate_xy(rotate_xz(rotate_yz(p, self.elevation), self.azimuth), self.roll)
    }

    /// Rotate from the global frame into the local frame.
    pub fn rotate_inverse(&self, p: Vec3) -> Vec3 {
        rotate_yz(rotate_xz(rotate_xy(p, -self.roll), -self.azimuth), -self.elevation)
    }

    /// Where the local +z axis points.
    pub fn direction(&self) -> Direction {
        Direction::from_vector(self.rotate(Vec3::Z))
    }
}

impl From<Direction> for Orientation {
    fn from(d: Direction) -> Self {
        Orientation::new(d.azimuth, d.elevation, 0.0)
    }
}
