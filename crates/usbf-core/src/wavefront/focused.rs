use serde::{Deserialize, Serialize};

use super::plane::PlaneWavefront;
use super::{sign, TransmitDistance, TransmittedWavefront};
use crate::element::{ElementGeometry, WaveData};
use crate::geometry::Direction;
use crate::types::{BeamResult, Vec3};

fn spherical(sender: &ElementGeometry, source: Vec3, point: Vec3) -> f64 {
    let plane = sender.plane();
    let source_depth = plane.signed_distance(source, None);
    let point_depth = plane.signed_distance(point, None);
    sender.position.distance(source) * sign(source_depth) - source.distance(point) * sign(source_depth - point_depth)
}

/// Plane wave from the sender steered straight at the source.
fn plane_toward_source(sender: &ElementGeometry, source: Vec3, point: Vec3) -> f64 {
    let d = source - sender.position;
    let direction = Direction::new(d.x.atan2(d.z), d.y.atan2(d.z));
    PlaneWavefront::steered(sender.position, point, direction)
}

/// A spherical wave converging to (or diverging from) the virtual source.
///
/// The distance is sender→source plus source→point for points beyond the
/// focal depth, and sender→source minus source→point before it. The sign flip
/// makes the model discontinuous at the focal depth for off-axis points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FocusedSphericalWavefront;

impl TransmittedWavefront for FocusedSphericalWavefront {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance> {
        let source = wave.require_finite_source(sender)?;
        Ok(spherical(sender, source, point).into())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HybridTransition {
    /// Linear blend from plane at the focal depth to spherical at the region edge
    #[default]
    Linear,
    /// Plane wave everywhere inside the region
    Hard,
}

/// Spherical wavefront with the focal region replaced by a plane wave aimed at
/// the source, which removes the discontinuity at the focal depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusedHybridWavefront {
    /// Depth extent of the plane-wave region, centered on the focal depth
    pub plane_wave_region_size: f64,
    pub transition: HybridTransition,
}

impl Default for FocusedHybridWavefront {
    fn default() -> Self {
        Self { plane_wave_region_size: 2e-3, transition: HybridTransition::Linear }
    }
}

impl FocusedHybridWavefront {
    pub fn new(plane_wave_region_size: f64, transition: HybridTransition) -> Self {
        Self { plane_wave_region_size, transition }
    }
}

impl TransmittedWavefront for FocusedHybridWavefront {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance> {
        let source = wave.require_finite_source(sender)?;
        let spherical = spherical(sender, source, point);
        let half = self.plane_wave_region_size / 2.0;
        let plane = sender.plane();
        let from_focal_plane = (plane.signed_distance(point, None) - plane.signed_distance(source, None)).abs();
        if half <= 0.0 || from_focal_plane >= half {
            return Ok(spherical.into());
        }
        let plane_wave = plane_toward_source(sender, source, point);
        let d = match self.transition {
            HybridTransition::Linear => {
                let t = from_focal_plane / half;
                t * spherical + (1.0 - t) * plane_wave
            }
            HybridTransition::Hard => plane_wave,
        };
        Ok(d.into())
    }
}

/// Spherical and plane distances weighted by the source-to-point distance
/// relative to the source range, raised to `blending_power`. Points at the
/// source are pure plane wave; points a full source range away are pure
/// spherical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusedBlendedWavefront {
    pub blending_power: f64,
}

impl Default for FocusedBlendedWavefront {
    fn default() -> Self {
        Self { blending_power: 0.5 }
    }
}

impl TransmittedWavefront for FocusedBlendedWavefront {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance> {
        let source = wave.require_finite_source(sender)?;
        let range = source.norm();
        let normalized = if range > 0.0 { (source.distance(point) / range).clamp(0.0, 1.0) } else { 1.0 };
        let w = normalized.powf(self.blending_power);
        let d = spherical(sender, source, point) * w + plane_toward_source(sender, source, point) * (1.0 - w);
        Ok(d.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeamError, PreconditionError, WaveKind};
    use approx::assert_abs_diff_eq;

    fn at(w: &dyn TransmittedWavefront, wave: &WaveData, p: Vec3) -> f64 {
        w.distance(&ElementGeometry::new(Vec3::ZERO), p, wave).unwrap().mean()
    }

    #[test]
    fn test_spherical_before_and_beyond_focus() {
        let wave = WaveData::focused(Vec3::new(0.0, 0.0, 0.03));
        assert_abs_diff_eq!(at(&FocusedSphericalWavefront, &wave, Vec3::new(0.0, 0.0, 0.02)), 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(at(&FocusedSphericalWavefront, &wave, Vec3::new(0.0, 0.0, 0.05)), 0.05, epsilon = 1e-15);
        // On the focal plane only the sender-to-source leg counts.
        assert_abs_diff_eq!(at(&FocusedSphericalWavefront, &wave, Vec3::new(0.01, 0.0, 0.03)), 0.03, epsilon = 1e-15);
    }

    #[test]
    fn test_spherical_diverging() {
        let wave = WaveData::focused(Vec3::new(0.0, 0.0, -0.01));
        assert_abs_diff_eq!(at(&FocusedSphericalWavefront, &wave, Vec3::new(0.0, 0.0, 0.02)), 0.02, epsilon = 1e-15);
    }

    #[test]
    fn test_spherical_rejects_plane_wave() {
        let err = FocusedSphericalWavefront
            .distance(&ElementGeometry::new(Vec3::ZERO), Vec3::Z, &WaveData::plane(0.1, 0.0))
            .unwrap_err();
        assert!(matches!(
            err,
            BeamError::Precondition(PreconditionError::WrongWaveKind { actual: WaveKind::Plane, .. })
        ));
    }

    #[test]
    fn test_hybrid_is_continuous_at_focus() {
        let wave = WaveData::focused(Vec3::new(0.0, 0.0, 0.03));
        let hybrid = FocusedHybridWavefront::default();
        let before = at(&hybrid, &wave, Vec3::new(0.004, 0.0, 0.03 - 1e-9));
        let after = at(&hybrid, &wave, Vec3::new(0.004, 0.0, 0.03 + 1e-9));
        assert_abs_diff_eq!(before, after, epsilon = 1e-7);

        let sph_before = at(&FocusedSphericalWavefront, &wave, Vec3::new(0.004, 0.0, 0.03 - 1e-9));
        let sph_after = at(&FocusedSphericalWavefront, &wave, Vec3::new(0.004, 0.0, 0.03 + 1e-9));
        assert!((sph_after - sph_before) > 0.007);
    }

    #[test]
    fn test_hybrid_outside_region_is_spherical() {
        let wave = WaveData::focused(Vec3::new(0.0, 0.0, 0.03));
        let p = Vec3::new(0.004, 0.0, 0.02);
        assert_eq!(at(&FocusedHybridWavefront::default(), &wave, p), at(&FocusedSphericalWavefront, &wave, p));
    }

    #[test]
    fn test_hybrid_hard_transition_uses_plane_wave() {
        let wave = WaveData::focused(Vec3::new(0.0, 0.0, 0.03));
        let hard = FocusedHybridWavefront::new(4e-3, HybridTransition::Hard);
        let p = Vec3::new(0.004, 0.0, 0.031);
        assert_abs_diff_eq!(at(&hard, &wave, p), 0.031, epsilon = 1e-15);
    }

    #[test]
    fn test_blended_limits() {
        let wave = WaveData::focused(Vec3::new(0.0, 0.0, 0.03));
        let blended = FocusedBlendedWavefront::default();
        // At the source: pure plane wave.
        assert_abs_diff_eq!(at(&blended, &wave, Vec3::new(0.0, 0.0, 0.03)), 0.03, epsilon = 1e-15);
        // A full source range away: pure spherical.
        let p = Vec3::new(0.0, 0.0, 0.065);
        assert_abs_diff_eq!(at(&blended, &wave, p), at(&FocusedSphericalWavefront, &wave, p), epsilon = 1e-15);
    }
}
