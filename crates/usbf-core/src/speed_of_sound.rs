//! Speed of sound along the sender → point → receiver path
//!
//! Delays are distances divided by a speed of sound. For a homogeneous medium
//! that is a constant; for a layered medium (e.g. skin, fat and muscle at
//! known depths) it is the average of the layer speeds weighted by how much of
//! the path runs through each layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{BeamResult, PreconditionError, Vec3};

/// Speed of sound between a sender, a point and a receiver.
pub trait SpeedOfSound: fmt::Debug + Send + Sync {
    fn average(&self, sender: Vec3, point: Vec3, receiver: Vec3) -> f64;
}

/// The same speed everywhere, in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantSpeedOfSound(pub f64);

impl Default for ConstantSpeedOfSound {
    fn default() -> Self {
        Self(1540.0)
    }
}

impl SpeedOfSound for ConstantSpeedOfSound {
    fn average(&self, _sender: Vec3, _point: Vec3, _receiver: Vec3) -> f64 {
        self.0
    }
}

/// Horizontal layers of constant speed.
///
/// `boundaries` are ascending depths (z); layer `i` spans
/// `[boundaries[i - 1], boundaries[i])`, with the first and last layers
/// extending to infinity. There is one more speed than boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayeredSpeedOfSound {
    boundaries: Vec<f64>,
    speeds: Vec<f64>,
}

impl LayeredSpeedOfSound {
    pub fn new(boundaries: Vec<f64>, speeds: Vec<f64>) -> BeamResult<Self> {
        if speeds.len() != boundaries.len() + 1 {
            return Err(PreconditionError::InvalidGeometry(format!(
                "{} layer speeds for {} boundaries, expected {}",
                speeds.len(),
                boundaries.len(),
                boundaries.len() + 1
            ))
            .into());
        }
        if boundaries.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(PreconditionError::InvalidGeometry("layer boundaries must be strictly ascending".into()).into());
        }
        if speeds.iter().any(|&c| !(c > 0.0 && c.is_finite())) {
            return Err(PreconditionError::InvalidGeometry("layer speeds must be positive and finite".into()).into());
        }
        Ok(Self { boundaries, speeds })
    }

    /// Speed of the layer containing depth `z`.
    pub fn speed_at(&self, z: f64) -> f64 {
        self.speeds[self.boundaries.partition_point(|&b| b <= z)]
    }

    /// Path-length weighted average speed on the segment `a`–`b`.
    pub fn average_between(&self, a: Vec3, b: Vec3) -> f64 {
        let (lo, hi) = if a.z <= b.z { (a.z, b.z) } else { (b.z, a.z) };
        let span = hi - lo;
        if span == 0.0 {
            return self.speed_at(lo);
        }
        let mut edges = Vec::with_capacity(self.speeds.len() + 1);
        edges.push(f64::NEG_INFINITY);
        edges.extend_from_slice(&self.boundaries);
        edges.push(f64::INFINITY);
        edges
            .windows(2)
            .zip(&self.speeds)
            .map(|(layer, &c)| {
                let overlap = (hi.min(layer[1]) - lo.max(layer[0])).max(0.0);
                c * overlap / span
            })
            .sum()
    }
}

impl SpeedOfSound for LayeredSpeedOfSound {
    fn average(&self, sender: Vec3, point: Vec3, receiver: Vec3) -> f64 {
        let d1 = sender.distance(point);
        let d2 = point.distance(receiver);
        let total = d1 + d2;
        if total == 0.0 {
            return self.speed_at(point.z);
        }
        (self.average_between(sender, point) * d1 + self.average_between(point, receiver) * d2) / total
    }
}
