//! Lines in the azimuth plane.
//!
//! Only the x and z components of points are used; y is ignored.

use crate::types::Vec3;

/// A 2D point `[x, z]`.
pub type Point2 = [f64; 2];

/// The `[x, z]` components of a 3D point.
pub fn xz(p: Vec3) -> Point2 {
    [p.x, p.z]
}

fn sub(a: Point2, b: Point2) -> Point2 {
    [a[0] - b[0], a[1] - b[1]]
}

fn cross(a: Point2, b: Point2) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

pub fn distance(a: Point2, b: Point2) -> f64 {
    let d = sub(a, b);
    d[0].hypot(d[1])
}

/// An infinite line through `anchor` with unit `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub anchor: Point2,
    pub direction: Point2,
}

impl Line {
    pub fn new(anchor: Point2, direction: Point2) -> Self {
        let n = direction[0].hypot(direction[1]);
        let direction = if n == 0.0 { direction } else { [direction[0] / n, direction[1] / n] };
        Self { anchor, direction }
    }

    pub fn passing_through(p1: Point2, p2: Point2) -> Self {
        Self::new(p1, sub(p2, p1))
    }

    /// A line through `anchor` at `angle` radians from the first axis.
    pub fn with_angle(anchor: Point2, angle: f64) -> Self {
        Self::new(anchor, [angle.cos(), angle.sin()])
    }

    pub fn angle(&self) -> f64 {
        self.direction[1].atan2(self.direction[0])
    }

    /// The direction rotated a quarter turn counter-clockwise.
    pub fn normal(&self) -> Point2 {
        [-self.direction[1], self.direction[0]]
    }

    /// Signed perpendicular distance from the line to `p`. The sign tells which
    /// side of the line `p` is on.
    pub fn signed_distance(&self, p: Point2) -> f64 {
        cross(sub(p, self.anchor), self.direction)
    }

    /// The intersection with `other`, or `None` for parallel lines.
    pub fn intersect(&self, other: &Line) -> Option<Point2> {
        let denom = cross(self.direction, other.direction);
        if denom == 0.0 {
            return None;
        }
        let t = cross(sub(other.anchor, self.anchor), other.direction) / denom;
        Some([self.anchor[0] + t * self.direction[0], self.anchor[1] + t * self.direction[1]])
    }
}
