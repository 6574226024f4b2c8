use super::Apodization;
use crate::element::{ElementGeometry, WaveData};
use crate::geometry::{Orientation, Plane};
use crate::types::{BeamResult, Vec3};
use crate::window::Window;

/// Receive aperture that grows with depth.
///
/// Depth is the distance from a plane at `origin` facing `orientation`. At
/// depth `d` the aperture is `d / f_number` wide, clamped to
/// `[minimum_aperture, maximum_aperture]`, and centered on the point's
/// projection onto the plane. With a maximum aperture the center is kept far
/// enough from the edges that the aperture never slides past them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandingAperture {
    pub window: Window,
    pub f_number: f64,
    /// Elevation f-number; elevation is not windowed when `None`
    pub elevation_f_number: Option<f64>,
    pub origin: Vec3,
    pub orientation: Orientation,
    pub minimum_aperture: Option<f64>,
    pub maximum_aperture: Option<f64>,
}

impl ExpandingAperture {
    pub fn new(window: Window, f_number: f64) -> Self {
        Self {
            window,
            f_number,
            elevation_f_number: None,
            origin: Vec3::ZERO,
            orientation: Orientation::default(),
            minimum_aperture: None,
            maximum_aperture: None,
        }
    }

    pub fn with_elevation_f_number(mut self, f_number: f64) -> Self {
        self.elevation_f_number = Some(f_number);
        self
    }

    pub fn with_frame(mut self, origin: Vec3, orientation: Orientation) -> Self {
        self.origin = origin;
        self.orientation = orientation;
        self
    }

    pub fn with_aperture_limits(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum_aperture = minimum;
        self.maximum_aperture = maximum;
        self
    }

    pub fn plane(&self) -> Plane {
        Plane::new(self.origin, self.orientation)
    }

    /// Aperture size at `depth`.
    pub fn width_at(&self, depth: f64, f_number: f64) -> f64 {
        let mut width = depth / f_number;
        if let Some(min) = self.minimum_aperture {
            width = width.max(min);
        }
        if let Some(max) = self.maximum_aperture {
            width = width.min(max);
        }
        width
    }

    fn axis_weight(&self, depth: f64, f_number: f64, center: f64, element: f64) -> f64 {
        let width = self.width_at(depth, f_number);
        if !(width > 0.0) {
            return 0.0;
        }
        let center = match self.maximum_aperture {
            Some(max) => {
                let slack = ((max - width) / 2.0).max(0.0);
                center.clamp(-slack, slack)
            }
            None => center,
        };
        self.window.weight((element - center) / width)
    }
}

impl Apodization for ExpandingAperture {
    fn weight(
        &self,
        _sender: &ElementGeometry,
        point: Vec3,
        receiver: &ElementGeometry,
        _wave: &WaveData,
    ) -> BeamResult<f64> {
        let plane = self.plane();
        let depth = plane.signed_distance(point, None);
        let (px, py) = plane.to_plane_coordinates(point);
        let (rx, ry) = plane.to_plane_coordinates(receiver.position);
        let mut weight = self.axis_weight(depth, self.f_number, px, rx);
        if let Some(f) = self.elevation_f_number {
            weight *= self.axis_weight(depth, f, py, ry);
        }
        Ok(weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight(apod: &ExpandingAperture, point: Vec3, receiver_x: f64) -> f64 {
        let sender = ElementGeometry::new(Vec3::ZERO);
        let receiver = ElementGeometry::new(Vec3::new(receiver_x, 0.0, 0.0));
        apod.weight(&sender, point, &receiver, &WaveData::default()).unwrap()
    }

    #[test]
    fn test_aperture_grows_with_depth() {
        let apod = ExpandingAperture::new(Window::Rectangular, 1.0);
        let p = Vec3::new(0.0, 0.0, 0.02);
        assert_eq!(weight(&apod, p, 0.009), 1.0);
        assert_eq!(weight(&apod, p, 0.011), 0.0);
        let deeper = Vec3::new(0.0, 0.0, 0.04);
        assert_eq!(weight(&apod, deeper, 0.011), 1.0);
        // Behind the array the aperture has no width.
        assert_eq!(weight(&apod, Vec3::new(0.0, 0.0, -0.01), 0.0), 0.0);
    }

    #[test]
    fn test_aperture_limits() {
        let apod = ExpandingAperture::new(Window::Rectangular, 1.0).with_aperture_limits(Some(0.01), Some(0.01));
        // Shallow points still get the minimum aperture.
        assert_eq!(weight(&apod, Vec3::new(0.0, 0.0, 0.001), 0.004), 1.0);
        // Deep points never exceed the maximum.
        assert_eq!(weight(&apod, Vec3::new(0.0, 0.0, 0.04), 0.006), 0.0);
        // Once the aperture is at its maximum it stays centered on the array.
        assert_eq!(weight(&apod, Vec3::new(0.02, 0.0, 0.02), 0.004), 1.0);
    }

    #[test]
    fn test_elevation() {
        let apod = ExpandingAperture::new(Window::Rectangular, 1.0).with_elevation_f_number(2.0);
        let sender = ElementGeometry::new(Vec3::ZERO);
        let p = Vec3::new(0.0, 0.0, 0.02);
        let inside = ElementGeometry::new(Vec3::new(0.0, 0.004, 0.0));
        let outside = ElementGeometry::new(Vec3::new(0.0, 0.006, 0.0));
        assert_eq!(apod.weight(&sender, p, &inside, &WaveData::default()).unwrap(), 1.0);
        assert_eq!(apod.weight(&sender, p, &outside, &WaveData::default()).unwrap(), 0.0);
    }
}
