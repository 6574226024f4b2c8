use std::sync::Arc;

use super::focused::FocusedSphericalWavefront;
use super::{TransmitDistance, TransmittedWavefront};
use crate::element::{ElementGeometry, ProbeGeometry, WaveData};
use crate::geometry::line::{distance, xz};
use crate::geometry::Line;
use crate::types::{BeamResult, Vec3};

/// The unified wavefront model (Nguyen & Prager, doi:10.1109/tmi.2015.2456982).
///
/// Lines from the two edges of the array through the virtual source split the
/// image into an hourglass-shaped in-focus region and the regions to either
/// side. Inside the hourglass the base wavefront is used directly. Outside it,
/// the distance is interpolated between the base wavefront evaluated where a
/// line parallel to the scanline through the point crosses the two edges.
/// Geometry is evaluated in the azimuth (x, z) plane.
#[derive(Debug, Clone)]
pub struct UnifiedWavefront {
    /// Left and right edges of the transmitting array
    pub array_bounds: (Vec3, Vec3),
    pub base_wavefront: Arc<dyn TransmittedWavefront>,
}

impl UnifiedWavefront {
    pub fn new(array_bounds: (Vec3, Vec3)) -> Self {
        Self { array_bounds, base_wavefront: Arc::new(FocusedSphericalWavefront) }
    }

    /// Array bounds taken from the probe's transmit aperture around `sender`.
    pub fn from_probe(probe: &ProbeGeometry, sender: Vec3) -> BeamResult<Self> {
        let [left, right, _, _] = probe.tx_aperture_borders(sender)?;
        Ok(Self::new((left, right)))
    }

    pub fn with_base_wavefront(mut self, base_wavefront: Arc<dyn TransmittedWavefront>) -> Self {
        self.base_wavefront = base_wavefront;
        self
    }

    fn base(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<f64> {
        Ok(self.base_wavefront.distance(sender, point, wave)?.mean())
    }
}

impl TransmittedWavefront for UnifiedWavefront {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance> {
        let source = xz(wave.require_finite_source(sender)?);
        let p = xz(point);
        let left = Line::passing_through(xz(self.array_bounds.0), source);
        let right = Line::passing_through(xz(self.array_bounds.1), source);

        let in_focus = (left.signed_distance(p) > 0.0) ^ (right.signed_distance(p) > 0.0);
        if in_focus {
            return Ok(self.base(sender, point, wave)?.into());
        }

        let scanline = Line::passing_through(xz(sender.position), source);
        let crossing = Line::with_angle(p, scanline.angle());
        let (a, b) = match (left.intersect(&crossing), right.intersect(&crossing)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(self.base(sender, point, wave)?.into()),
        };
        let (dist_a, dist_b) = (distance(a, p), distance(b, p));
        let total = dist_a + dist_b;
        if total == 0.0 {
            return Ok(self.base(sender, point, wave)?.into());
        }
        let lift = |q: [f64; 2]| Vec3::new(q[0], point.y, q[1]);
        let r1 = self.base(sender, lift(a), wave)?;
        let r2 = self.base(sender, lift(b), wave)?;
        Ok((r1 * (1.0 - dist_a / total) + r2 * (1.0 - dist_b / total)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn setup() -> (UnifiedWavefront, ElementGeometry, WaveData) {
        let unified = UnifiedWavefront::new((Vec3::new(-0.01, 0.0, 0.0), Vec3::new(0.01, 0.0, 0.0)));
        (unified, ElementGeometry::new(Vec3::ZERO), WaveData::focused(Vec3::new(0.0, 0.0, 0.03)))
    }

    #[test]
    fn test_in_focus_uses_base() {
        let (unified, sender, wave) = setup();
        for p in [Vec3::new(0.0, 0.0, 0.02), Vec3::new(0.001, 0.0, 0.05)] {
            let expected = FocusedSphericalWavefront.distance(&sender, p, &wave).unwrap().mean();
            assert_eq!(unified.distance(&sender, p, &wave).unwrap().mean(), expected);
        }
    }

    #[test]
    fn test_continuous_across_region_edge() {
        let (unified, sender, wave) = setup();
        // The right edge line passes through (0.005, 0.015).
        let inside = unified.distance(&sender, Vec3::new(0.005 - 1e-9, 0.0, 0.015), &wave).unwrap().mean();
        let outside = unified.distance(&sender, Vec3::new(0.005 + 1e-9, 0.0, 0.015), &wave).unwrap().mean();
        assert_abs_diff_eq!(inside, outside, epsilon = 1e-7);
    }

    #[test]
    fn test_outside_interpolates_between_edges() {
        let (unified, sender, wave) = setup();
        let d = unified.distance(&sender, Vec3::new(0.015, 0.0, 0.01), &wave).unwrap().mean();
        // A = (0.015, 0.075) on the left edge, B = (0.015, -0.015) on the right edge.
        let leg = 0.015f64.hypot(0.045);
        let expected = (0.03 + leg) * (1.0 - 0.065 / 0.09) + (0.03 - leg) * (1.0 - 0.025 / 0.09);
        assert_abs_diff_eq!(d, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_from_probe_requires_tx_aperture() {
        let mut probe = ProbeGeometry::flat();
        assert!(UnifiedWavefront::from_probe(&probe, Vec3::ZERO).is_err());
        probe.set_tx_aperture_length(-0.01, 0.01, 0.0, 0.0);
        let unified = UnifiedWavefront::from_probe(&probe, Vec3::ZERO).unwrap();
        assert_abs_diff_eq!(unified.array_bounds.0.x, -0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(unified.array_bounds.1.x, 0.01, epsilon = 1e-15);
    }
}
