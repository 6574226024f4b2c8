use super::Apodization;
use crate::aperture::Aperture;
use crate::element::{ElementGeometry, WaveData};
use crate::geometry::line::{distance, xz};
use crate::geometry::{Line, Vector};
use crate::types::{BeamResult, Vec3};
use crate::window::Window;

/// Hourglass-shaped weight of a focused transmit, in the azimuth plane.
///
/// Lines from `array_left` and `array_right` through `focus` bound the
/// hourglass. Inside it, the point is windowed by where it lies between the two
/// lines along the perpendicular to the mid line. Because the hourglass closes
/// at the focus, a band of full width `minimum_aperture` around the mid line
/// is always open; the weight is the larger of the two. A `maximum_aperture`
/// band caps the result.
///
/// Without a window the weight is binary: 1 inside the hourglass or within
/// `minimum_aperture` of the mid line, and 0 past `maximum_aperture` from it.
pub fn focused_apodization(
    point: Vec3,
    array_left: Vec3,
    array_right: Vec3,
    focus: Vec3,
    minimum_aperture: f64,
    window: Option<Window>,
    maximum_aperture: Option<f64>,
) -> f64 {
    let (p, focus) = (xz(point), xz(focus));
    let left = Line::passing_through(xz(array_left), focus);
    let right = Line::passing_through(xz(array_right), focus);
    let mid = Line::with_angle(focus, (left.angle() + right.angle()) / 2.0);
    let across = Line::new(p, mid.normal());
    let distance_mid = mid.signed_distance(p).abs();

    let valid = left.signed_distance(p) * right.signed_distance(p) <= 0.0;
    let Some(window) = window else {
        let open = valid || distance_mid < minimum_aperture;
        let capped = maximum_aperture.is_some_and(|max| distance_mid >= max);
        return if open && !capped { 1.0 } else { 0.0 };
    };
    let hourglass = match (valid, left.intersect(&across), right.intersect(&across)) {
        (true, Some(a), Some(b)) if distance(a, b) > 0.0 => {
            let position = distance(a, p) / distance(a, b);
            window.weight((position - 0.5).abs())
        }
        _ => 0.0,
    };
    let weight = hourglass.max(window.weight(distance_mid / minimum_aperture));
    match maximum_aperture {
        Some(max) => weight.min(window.weight(distance_mid / max)),
        None => weight,
    }
}

/// Focused transmit apodization with a fixed minimum aperture.
///
/// The array is taken to span `array_size.0` in x, centered on the sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusedTransmitApodization {
    /// Width and height of the transmitting array
    pub array_size: (f64, f64),
    pub minimum_aperture: f64,
    pub window: Option<Window>,
    pub maximum_aperture: Option<f64>,
}

impl FocusedTransmitApodization {
    pub fn new(array_size: f64) -> Self {
        Self { array_size: (array_size, array_size), minimum_aperture: 0.001, window: None, maximum_aperture: None }
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_minimum_aperture(mut self, minimum_aperture: f64) -> Self {
        self.minimum_aperture = minimum_aperture;
        self
    }

    pub fn with_maximum_aperture(mut self, maximum_aperture: f64) -> Self {
        self.maximum_aperture = Some(maximum_aperture);
        self
    }
}

fn array_edges(sender: Vec3, width: f64) -> (Vec3, Vec3) {
    let half = Vec3::new(width / 2.0, 0.0, 0.0);
    (sender - half, sender + half)
}

impl Apodization for FocusedTransmitApodization {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        _receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        let source = wave.require_finite_source(sender)?;
        let (left, right) = array_edges(sender.position, self.array_size.0);
        Ok(focused_apodization(
            point,
            left,
            right,
            source,
            self.minimum_aperture,
            self.window,
            self.maximum_aperture,
        ))
    }
}

/// Retrospective transmit beamforming apodization.
///
/// The minimum aperture is the diffraction-limited beam width at the focus,
/// `2 · 1.22 · λ · focal_length / array_size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RTBApodization {
    pub window: Window,
    pub wavelength: f64,
    pub array_size: f64,
    pub maximum_aperture: Option<f64>,
}

impl RTBApodization {
    pub const MAINLOBE_WIDTH_COEFFICIENT: f64 = 2.0 * 1.22;

    pub fn new(window: Window, wavelength: f64, array_size: f64) -> Self {
        Self { window, wavelength, array_size, maximum_aperture: None }
    }

    pub fn with_maximum_aperture(mut self, maximum_aperture: f64) -> Self {
        self.maximum_aperture = Some(maximum_aperture);
        self
    }

    pub fn minimum_aperture(&self, focal_length: f64) -> f64 {
        Self::MAINLOBE_WIDTH_COEFFICIENT * self.wavelength * focal_length / self.array_size
    }
}

impl Apodization for RTBApodization {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        _receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        let source = wave.require_finite_source(sender)?;
        let (left, right) = array_edges(sender.position, self.array_size);
        Ok(focused_apodization(
            point,
            left,
            right,
            source,
            self.minimum_aperture(sender.position.distance(source)),
            Some(self.window),
            self.maximum_aperture,
        ))
    }
}

/// A beam of constant width from the sender toward the virtual source.
///
/// The aperture is moved to the sender and projected to face the source, then
/// resized to `beam_width` × `beam_height` (height defaults to the width).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantWidthApodization {
    pub window: Window,
    pub beam_width: f64,
    pub beam_height: Option<f64>,
    pub aperture: Aperture,
}

impl ConstantWidthApodization {
    pub fn new(window: Window, beam_width: f64, aperture: Aperture) -> Self {
        Self { window, beam_width, beam_height: None, aperture }
    }

    pub fn with_beam_height(mut self, beam_height: f64) -> Self {
        self.beam_height = Some(beam_height);
        self
    }
}

impl Apodization for ConstantWidthApodization {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        _receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        let source = wave.require_finite_source(sender)?;
        let beam = self
            .aperture
            .with_origin(sender.position)
            .project_aperture(&Vector::from_point(source))?
            .with_size(Some(self.beam_width), Some(self.beam_height.unwrap_or(self.beam_width)));
        Ok(beam.project_and_apply_window(point, &self.window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;
    use crate::types::{BeamError, PreconditionError};
    use approx::assert_abs_diff_eq;

    const LEFT: Vec3 = Vec3::new(-0.01, 0.0, 0.0);
    const RIGHT: Vec3 = Vec3::new(0.01, 0.0, 0.0);
    const FOCUS: Vec3 = Vec3::new(0.0, 0.0, 0.03);

    fn hourglass(point: Vec3, window: Option<Window>, max: Option<f64>) -> f64 {
        focused_apodization(point, LEFT, RIGHT, FOCUS, 0.001, window, max)
    }

    #[test]
    fn test_hourglass_region() {
        assert_eq!(hourglass(Vec3::new(0.0, 0.0, 0.015), None, None), 1.0);
        assert_eq!(hourglass(Vec3::new(0.004, 0.0, 0.015), None, None), 1.0);
        // The left edge line crosses z = 0.015 at x = -0.005.
        assert_eq!(hourglass(Vec3::new(-0.006, 0.0, 0.015), None, None), 0.0);
        // Past the focus the hourglass opens again, mirrored.
        assert_eq!(hourglass(Vec3::new(0.004, 0.0, 0.045), None, None), 1.0);
        assert_eq!(hourglass(Vec3::new(0.006, 0.0, 0.045), None, None), 0.0);
    }

    #[test]
    fn test_hourglass_window() {
        let w = hourglass(Vec3::new(0.004, 0.0, 0.015), Some(Window::hanning()), None);
        // 0.9 of the way from the left line to the right line.
        let expected = 0.5 + 0.5 * (2.0 * std::f64::consts::PI * 0.4).cos();
        assert_abs_diff_eq!(w, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_minimum_aperture_at_focus() {
        // The hourglass has no width at the focus; the mid band keeps it open.
        assert_eq!(hourglass(Vec3::new(0.0006, 0.0, 0.03), None, None), 1.0);
        assert_eq!(hourglass(Vec3::new(0.0012, 0.0, 0.03), None, None), 0.0);
    }

    #[test]
    fn test_minimum_aperture_without_window_is_a_threshold() {
        // Unwindowed, the band reaches the full minimum aperture from the mid
        // line; a rectangular window only reaches half of it.
        let p = Vec3::new(0.0006, 0.0, 0.03);
        assert_eq!(hourglass(p, None, None), 1.0);
        assert_eq!(hourglass(p, Some(Window::Rectangular), None), 0.0);
        assert_eq!(hourglass(Vec3::new(0.0003, 0.0, 0.03), Some(Window::Rectangular), None), 1.0);
    }

    #[test]
    fn test_maximum_aperture_cap() {
        let p = Vec3::new(0.004, 0.0, 0.015);
        assert_eq!(hourglass(p, None, Some(0.01)), 1.0);
        assert_eq!(hourglass(p, None, Some(0.005)), 1.0);
        assert_eq!(hourglass(p, None, Some(0.003)), 0.0);
        assert_eq!(hourglass(p, Some(Window::Rectangular), Some(0.005)), 0.0);
    }

    #[test]
    fn test_focused_transmit_requires_focus() {
        let apod = FocusedTransmitApodization::new(0.02);
        let sender = ElementGeometry::new(Vec3::ZERO);
        let w = apod.weight(&sender, Vec3::new(0.004, 0.0, 0.015), &sender, &WaveData::focused(FOCUS)).unwrap();
        assert_eq!(w, 1.0);
        let err = apod.weight(&sender, Vec3::Z, &sender, &WaveData::plane(0.1, 0.0)).unwrap_err();
        assert!(matches!(err, BeamError::Precondition(PreconditionError::WrongWaveKind { .. })));
    }

    #[test]
    fn test_rtb_minimum_aperture() {
        let apod = RTBApodization::new(Window::Rectangular, 0.5e-3, 0.02);
        assert_abs_diff_eq!(apod.minimum_aperture(0.03), 2.44 * 0.5e-3 * 1.5, epsilon = 1e-15);
        let sender = ElementGeometry::new(Vec3::ZERO);
        let wave = WaveData::focused(FOCUS);
        // Band half width is 0.000915 at the focus.
        assert_eq!(apod.weight(&sender, Vec3::new(0.0009, 0.0, 0.03), &sender, &wave).unwrap(), 1.0);
        assert_eq!(apod.weight(&sender, Vec3::new(0.001, 0.0, 0.03), &sender, &wave).unwrap(), 0.0);
    }

    #[test]
    fn test_constant_width() {
        let aperture = Aperture::new(Plane::default(), 0.02, 0.004);
        let apod = ConstantWidthApodization::new(Window::Rectangular, 0.004, aperture);
        let sender = ElementGeometry::new(Vec3::ZERO);
        let wave = WaveData::focused(FOCUS);
        assert_eq!(apod.weight(&sender, Vec3::new(0.001, 0.0, 0.02), &sender, &wave).unwrap(), 1.0);
        assert_eq!(apod.weight(&sender, Vec3::new(0.003, 0.0, 0.02), &sender, &wave).unwrap(), 0.0);
        // The beam does not widen with depth.
        assert_eq!(apod.weight(&sender, Vec3::new(0.003, 0.0, 0.06), &sender, &wave).unwrap(), 0.0);

        let err = apod.weight(&sender, Vec3::Z, &sender, &WaveData::plane(0.0, 0.0)).unwrap_err();
        assert_eq!(err.to_string(), "Expected a focused or diverging transmitted wave, but got a plane wave");
    }
}
