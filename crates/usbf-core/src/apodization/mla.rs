use super::Apodization;
use crate::element::{ElementGeometry, WaveData};
use crate::geometry::line::xz;
use crate::geometry::Line;
use crate::types::{BeamResult, Vec3};
use crate::window::Window;

/// Multiple line acquisition in cartesian space.
///
/// Each focused transmit images a band of `beam_width` around its scanline.
/// The scanline leaves the array where the bisector of the two edge-to-source
/// lines meets it and passes through the virtual source. With `beam_width`
/// equal to the lateral scan spacing this reduces to one line per transmit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MLAApodization {
    pub window: Window,
    pub beam_width: f64,
    /// Left and right x of the array, at z = 0
    pub array_bounds_x: (f64, f64),
}

impl MLAApodization {
    pub fn new(window: Window, beam_width: f64, array_bounds_x: (f64, f64)) -> Self {
        Self { window, beam_width, array_bounds_x }
    }

    /// The scanline of a transmit focused at `source`, or `None` when the
    /// source lies on the array line.
    pub fn scanline(&self, source: Vec3) -> Option<Line> {
        let source = xz(source);
        let left = [self.array_bounds_x.0, 0.0];
        let right = [self.array_bounds_x.1, 0.0];
        let mid_angle = (Line::passing_through(left, source).angle() + Line::passing_through(right, source).angle()) / 2.0;
        let origin = Line::passing_through(left, right).intersect(&Line::with_angle(source, mid_angle))?;
        Some(Line::passing_through(origin, source))
    }
}

impl Apodization for MLAApodization {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        _receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        let source = wave.require_finite_source(sender)?;
        Ok(match self.scanline(source) {
            Some(scanline) => self.window.weight(scanline.signed_distance(xz(point)).abs() / self.beam_width),
            None => 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn weight(apod: &MLAApodization, source: Vec3, point: Vec3) -> f64 {
        let sender = ElementGeometry::new(Vec3::ZERO);
        apod.weight(&sender, point, &sender, &WaveData::focused(source)).unwrap()
    }

    #[test]
    fn test_band_around_centered_scanline() {
        let apod = MLAApodization::new(Window::Rectangular, 0.004, (-0.01, 0.01));
        let source = Vec3::new(0.0, 0.0, 0.03);
        assert_eq!(weight(&apod, source, Vec3::new(0.001, 0.0, 0.02)), 1.0);
        assert_eq!(weight(&apod, source, Vec3::new(-0.001, 0.0, 0.05)), 1.0);
        assert_eq!(weight(&apod, source, Vec3::new(0.003, 0.0, 0.02)), 0.0);
    }

    #[test]
    fn test_scanline_passes_through_source() {
        let apod = MLAApodization::new(Window::hanning(), 0.002, (-0.01, 0.01));
        let source = Vec3::new(0.005, 0.0, 0.03);
        assert_abs_diff_eq!(weight(&apod, source, source), 1.0, epsilon = 1e-12);
        assert_eq!(weight(&apod, source, Vec3::new(-0.005, 0.0, 0.03)), 0.0);
        let origin = apod.scanline(source).unwrap().anchor;
        assert_abs_diff_eq!(origin[1], 0.0, epsilon = 1e-15);
        assert!(origin[0] > 0.0 && origin[0] < 0.005);
    }

    #[test]
    fn test_requires_focused_wave() {
        let apod = MLAApodization::new(Window::Rectangular, 0.004, (-0.01, 0.01));
        let sender = ElementGeometry::new(Vec3::ZERO);
        assert!(apod.weight(&sender, Vec3::Z, &sender, &WaveData::plane(0.0, 0.0)).is_err());
    }
}
