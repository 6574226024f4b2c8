//! Aperture — the active part of the array as a flat rectangle
//!
//! Curved or partially active arrays are modelled by the flat rectangle they
//! project onto. Projecting an aperture toward a virtual source tilts it to
//! face the source and shrinks it by the cosine of the tilt, which is what
//! constant-width apodization uses to follow a focused beam.

use crate::geometry::{average_directions, Direction, Orientation, Plane, RectangularBounds, Vector};
use crate::types::{BeamResult, PreconditionError, Vec3};
use crate::window::Window;

/// A flat rectangular aperture on an oriented plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aperture {
    pub plane: Plane,
    pub width: f64,
    pub height: f64,
}

impl Aperture {
    pub const fn new(plane: Plane, width: f64, height: f64) -> Self {
        Self { plane, width, height }
    }

    pub fn center(&self) -> Vec3 {
        self.plane.origin
    }

    pub fn orientation(&self) -> Orientation {
        self.plane.orientation
    }

    pub fn normal(&self) -> Direction {
        self.plane.normal()
    }

    pub fn bounds(&self) -> RectangularBounds {
        RectangularBounds::new(self.plane, self.width, self.height)
    }

    /// Upper left, upper right, lower right and lower left corners.
    pub fn corners(&self) -> [Vec3; 4] {
        self.bounds().corners()
    }

    pub fn with_origin(&self, origin: Vec3) -> Aperture {
        Aperture { plane: self.plane.with_origin(origin), ..*self }
    }

    /// Replace the width and/or height.
    pub fn with_size(&self, width: Option<f64>, height: Option<f64>) -> Aperture {
        Aperture { width: width.unwrap_or(self.width), height: height.unwrap_or(self.height), ..*self }
    }

    /// Scale the size; height follows width when `scale_height` is `None`.
    pub fn scale(&self, scale_width: f64, scale_height: Option<f64>) -> Aperture {
        let scale_height = scale_height.unwrap_or(scale_width);
        Aperture { width: self.width * scale_width, height: self.height * scale_height, ..*self }
    }

    pub fn signed_distance(&self, point: Vec3) -> f64 {
        self.plane.signed_distance(point, None)
    }

    /// Window weight of plane coordinates `(x, y)`.
    pub fn apply_window(&self, x: f64, y: f64, window: &Window) -> f64 {
        window.weight(x / self.width) * window.weight(y / self.height)
    }

    /// Project `point` onto the plane and window its plane coordinates.
    pub fn project_and_apply_window(&self, point: Vec3, window: &Window) -> f64 {
        let (x, y) = self.plane.to_plane_coordinates(point);
        self.apply_window(x, y, window)
    }

    /// The aperture as seen from `virtual_source`.
    ///
    /// The projected plane faces the average direction from the corners to the
    /// source (keeping the roll), its center is the mean of the corners projected
    /// along those directions, and its size shrinks by the cosine of the change
    /// in azimuth and elevation.
    pub fn project_aperture(&self, virtual_source: &Vector) -> BeamResult<Aperture> {
        let corners = self.corners();
        let to_source: Vec<Direction> = corners.iter().map(|&c| virtual_source.minus_point(c).direction).collect();
        let normal = average_directions(&to_source)
            .ok_or_else(|| PreconditionError::InvalidGeometry("aperture has no corners".into()))?;

        let oriented = self.plane.orient(normal, None);
        let projected: Vec<Vec3> =
            corners.iter().zip(&to_source).map(|(&c, &dir)| oriented.project(c, Some(dir))).collect();
        let origin = Vec3::mean(&projected)
            .ok_or_else(|| PreconditionError::InvalidGeometry("aperture has no corners".into()))?;
        if !origin.is_finite() {
            return Err(PreconditionError::InvalidGeometry(
                "virtual source lies on the aperture plane".into(),
            )
            .into());
        }

        let current = self.normal();
        Ok(Aperture {
            plane: oriented.with_origin(origin),
            width: self.width * (current.azimuth - normal.azimuth).cos(),
            height: self.height * (current.elevation - normal.elevation).cos(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn aperture() -> Aperture {
        Aperture::new(Plane::default(), 0.02, 0.004)
    }

    #[test]
    fn test_window_inside_and_outside() {
        let a = aperture();
        let rect = Window::Rectangular;
        assert_eq!(a.project_and_apply_window(Vec3::new(0.005, 0.001, 0.03), &rect), 1.0);
        assert_eq!(a.project_and_apply_window(Vec3::new(0.012, 0.0, 0.03), &rect), 0.0);
        let w = a.project_and_apply_window(Vec3::new(0.005, 0.0, 0.01), &Window::hanning());
        assert!(w > 0.0 && w < 1.0);
    }

    #[test]
    fn test_projection_toward_centered_source_is_unchanged() {
        let a = aperture();
        let projected = a.project_aperture(&Vector::from_point(Vec3::new(0.0, 0.0, 0.05))).unwrap();
        assert_abs_diff_eq!(projected.width, a.width, epsilon = 1e-12);
        assert_abs_diff_eq!(projected.height, a.height, epsilon = 1e-12);
        assert_abs_diff_eq!(projected.center().norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_toward_steered_plane_wave_shrinks_width() {
        let a = aperture();
        let steer = 0.3;
        let projected = a.project_aperture(&Vector::at_infinity(Direction::new(steer, 0.0))).unwrap();
        assert_abs_diff_eq!(projected.normal().azimuth, steer, epsilon = 1e-9);
        assert_abs_diff_eq!(projected.width, a.width * steer.cos(), epsilon = 1e-9);
        assert_abs_diff_eq!(projected.height, a.height, epsilon = 1e-9);
        assert_abs_diff_eq!(projected.signed_distance(a.center()), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_corners_and_resizing() {
        let a = aperture().scale(2.0, None).with_size(None, Some(0.001));
        let [ul, ur, lr, ll] = a.corners();
        assert_abs_diff_eq!(ur.x - ul.x, 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!((ul.y - ll.y).abs(), 0.001, epsilon = 1e-12);
        assert_abs_diff_eq!(lr.x, ur.x, epsilon = 1e-12);
    }
}
