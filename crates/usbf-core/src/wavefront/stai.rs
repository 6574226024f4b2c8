use super::{active_positions, per_element, TransmitDistance, TransmittedWavefront};
use crate::element::{ElementGeometry, WaveData};
use crate::types::{BeamResult, Vec3};

/// Synthetic transmit aperture imaging: every active element sends its own
/// spherical wave from t = 0, so the distance is simply element to point. Any
/// virtual source on the wave is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct STAIWavefront;

impl TransmittedWavefront for STAIWavefront {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, _wave: &WaveData) -> BeamResult<TransmitDistance> {
        let values = active_positions(sender).into_iter().map(|e| e.distance(point)).collect();
        Ok(per_element(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_single_element() {
        let sender = ElementGeometry::new(Vec3::new(0.003, 0.0, 0.0));
        let d = STAIWavefront.distance(&sender, Vec3::new(0.0, 0.0, 0.004), &WaveData::plane(0.3, 0.0)).unwrap();
        assert!(matches!(d, TransmitDistance::Single(_)));
        assert_abs_diff_eq!(d.mean(), 0.005, epsilon = 1e-15);
    }

    #[test]
    fn test_active_elements() {
        let sender = ElementGeometry::new(Vec3::ZERO).with_sub_elements(vec![
            ElementGeometry::new(Vec3::new(-0.003, 0.0, 0.0)),
            ElementGeometry::new(Vec3::new(0.0, 0.0, 0.0)),
        ]);
        let d = STAIWavefront.distance(&sender, Vec3::new(0.0, 0.0, 0.004), &WaveData::default()).unwrap();
        assert_eq!(d.values().len(), 2);
        assert_abs_diff_eq!(d.values()[0], 0.005, epsilon = 1e-15);
        assert_abs_diff_eq!(d.values()[1], 0.004, epsilon = 1e-15);
    }
}
