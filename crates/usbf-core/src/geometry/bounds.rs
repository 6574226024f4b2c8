use super::plane::Plane;
use crate::types::Vec3;

/// A width × height rectangle centered on the origin of a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangularBounds {
    pub plane: Plane,
    pub width: f64,
    pub height: f64,
}

impl RectangularBounds {
    pub const fn new(plane: Plane, width: f64, height: f64) -> Self {
        Self { plane, width, height }
    }

    fn at(&self, x: f64, y: f64) -> Vec3 {
        self.plane.from_plane_coordinates(x * self.width / 2.0, y * self.height / 2.0)
    }

    pub fn center(&self) -> Vec3 {
        self.plane.origin
    }

    pub fn upper_left(&self) -> Vec3 {
        self.at(-1.0, 1.0)
    }

    pub fn upper_right(&self) -> Vec3 {
        self.at(1.0, 1.0)
    }

    pub fn lower_right(&self) -> Vec3 {
        self.at(1.0, -1.0)
    }

    pub fn lower_left(&self) -> Vec3 {
        self.at(-1.0, -1.0)
    }

    pub fn center_top(&self) -> Vec3 {
        self.at(0.0, 1.0)
    }

    pub fn center_bottom(&self) -> Vec3 {
        self.at(0.0, -1.0)
    }

    pub fn center_left(&self) -> Vec3 {
        self.at(-1.0, 0.0)
    }

    pub fn center_right(&self) -> Vec3 {
        self.at(1.0, 0.0)
    }

    /// Upper-left, upper-right, lower-right, lower-left.
    pub fn corners(&self) -> [Vec3; 4] {
        [self.upper_left(), self.upper_right(), self.lower_right(), self.lower_left()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_corners_of_flat_bounds() {
        let b = RectangularBounds::new(Plane::default(), 0.04, 0.01);
        let [ul, ur, lr, ll] = b.corners();
        assert_abs_diff_eq!(ul.x, -0.02);
        assert_abs_diff_eq!(ul.y, 0.005);
        assert_abs_diff_eq!(ur.x, 0.02);
        assert_abs_diff_eq!(lr.y, -0.005);
        assert_abs_diff_eq!(ll.x, -0.02);
        assert_abs_diff_eq!(b.center_right().x, 0.02);
        assert_abs_diff_eq!(b.center_top().y, 0.005);
    }
}
