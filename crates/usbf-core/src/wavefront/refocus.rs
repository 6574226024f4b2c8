use std::sync::Arc;

use super::{active_positions, per_element, TransmitDistance, TransmittedWavefront};
use crate::element::{ElementGeometry, WaveData};
use crate::types::{BeamResult, Vec3};

/// Time-domain REFoCUS: recovers a synthetic aperture from arbitrary
/// (usually focused) transmits.
///
/// Each active element is modelled as a diverging spherical source. Its
/// distance to the point is offset by how far the full transmitted wavefront,
/// modelled by `base_wavefront` from `base_sender`, had travelled when it passed
/// the element, i.e. when that element fired in the transmit sequence.
#[derive(Debug, Clone)]
pub struct REFoCUSWavefront {
    pub base_wavefront: Arc<dyn TransmittedWavefront>,
    pub base_sender: ElementGeometry,
    pub compensation_scalar: f64,
}

impl REFoCUSWavefront {
    pub fn new(base_wavefront: Arc<dyn TransmittedWavefront>, base_sender: ElementGeometry) -> Self {
        Self { base_wavefront, base_sender, compensation_scalar: 1.0 }
    }

    pub fn with_compensation_scalar(mut self, compensation_scalar: f64) -> Self {
        self.compensation_scalar = compensation_scalar;
        self
    }

    fn element_distance(&self, element: Vec3, point: Vec3, wave: &WaveData) -> BeamResult<f64> {
        let compensation = self.base_wavefront.distance(&self.base_sender, element, wave)?.mean();
        Ok(element.distance(point) + compensation * self.compensation_scalar)
    }
}

impl TransmittedWavefront for REFoCUSWavefront {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance> {
        let values = active_positions(sender)
            .into_iter()
            .map(|e| self.element_distance(e, point, wave))
            .collect::<BeamResult<Vec<f64>>>()?;
        Ok(per_element(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavefront::{FocusedSphericalWavefront, PlaneWavefront};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_plane_wave_compensation_is_element_depth() {
        let refocus = REFoCUSWavefront::new(Arc::new(PlaneWavefront), ElementGeometry::new(Vec3::ZERO));
        let element = ElementGeometry::new(Vec3::new(0.0, 0.0, 0.001));
        let d = refocus.distance(&element, Vec3::new(0.0, 0.0, 0.021), &WaveData::plane(0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(d.mean(), 0.021, epsilon = 1e-15);
    }

    #[test]
    fn test_focused_sequence_gives_one_distance_per_element() {
        let base_sender = ElementGeometry::new(Vec3::ZERO);
        let refocus = REFoCUSWavefront::new(Arc::new(FocusedSphericalWavefront), base_sender.clone())
            .with_compensation_scalar(1.0);
        let elements = vec![
            ElementGeometry::new(Vec3::new(-0.004, 0.0, 0.0)),
            ElementGeometry::new(Vec3::new(0.004, 0.0, 0.0)),
        ];
        let sender = base_sender.with_sub_elements(elements);
        let wave = WaveData::focused(Vec3::new(0.0, 0.0, 0.03));
        let point = Vec3::new(0.0, 0.0, 0.02);
        let d = refocus.distance(&sender, point, &wave).unwrap();
        let values = d.values();
        assert_eq!(values.len(), 2);
        // Edge elements fire before the center passes t = 0.
        let edge_to_source = (0.004f64.powi(2) + 0.03f64.powi(2)).sqrt();
        let expected = 0.004f64.hypot(0.02) + (0.03 - edge_to_source);
        assert_abs_diff_eq!(values[0], expected, epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], expected, epsilon = 1e-12);
    }
}
