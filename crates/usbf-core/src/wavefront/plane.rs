use super::{TransmitDistance, TransmittedWavefront};
use crate::element::{ElementGeometry, WaveData};
use crate::geometry::Direction;
use crate::types::{BeamResult, Vec3};

/// A plane wave steered by the wave's azimuth and elevation. Missing angles
/// are taken as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaneWavefront;

impl PlaneWavefront {
    /// Distance along `direction` from `origin` to `point`.
    pub fn steered(origin: Vec3, point: Vec3, direction: Direction) -> f64 {
        (point - origin).dot(direction.normalized_vector())
    }
}

impl TransmittedWavefront for PlaneWavefront {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance> {
        let direction = Direction::new(wave.azimuth.unwrap_or(0.0), wave.elevation.unwrap_or(0.0));
        Ok(Self::steered(sender.position, point, direction).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_unsteered_is_depth() {
        let sender = ElementGeometry::new(Vec3::new(0.005, 0.0, 0.0));
        let d = PlaneWavefront.distance(&sender, Vec3::new(-0.01, 0.002, 0.03), &WaveData::plane(0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(d.mean(), 0.03, epsilon = 1e-15);
    }

    #[test]
    fn test_steered_matches_projection() {
        let sender = ElementGeometry::new(Vec3::ZERO);
        let (az, el) = (0.2_f64, -0.1_f64);
        let p = Vec3::new(0.01, 0.003, 0.02);
        let expected = p.x * az.sin() * el.cos() + p.y * el.sin() + p.z * az.cos() * el.cos();
        let d = PlaneWavefront.distance(&sender, p, &WaveData::plane(az, el)).unwrap();
        assert_abs_diff_eq!(d.mean(), expected, epsilon = 1e-15);
    }
}
