//! Polar/Cartesian conversion and the three elementary rotations.

use crate::types::Vec3;

/// Polar `(azimuth, elevation, depth)` to Cartesian `(x, y, z)`.
pub fn as_cartesian(azimuth: f64, elevation: f64, depth: f64) -> Vec3 {
    Vec3::new(
        depth * azimuth.sin() * elevation.cos(),
        depth * elevation.sin(),
        depth * azimuth.cos() * elevation.cos(),
    )
}

/// Cartesian point to polar `(azimuth, elevation, depth)`.
///
/// The origin maps to `(0, 0, 0)`.
pub fn as_polar(p: Vec3) -> (f64, f64, f64) {
    let depth = p.norm();
    if depth == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let azimuth = p.x.atan2(p.z);
    let elevation = (p.y / depth).clamp(-1.0, 1.0).asin();
    (azimuth, elevation, depth)
}

/// Rotate around the y axis (azimuth).
pub fn rotate_xz(p: Vec3, azimuth: f64) -> Vec3 {
    let (s, c) = azimuth.sin_cos();
    Vec3::new(p.x * c + p.z * s, p.y, -p.x * s + p.z * c)
}

/// Rotate around the x axis (elevation).
pub fn rotate_yz(p: Vec3, elevation: f64) -> Vec3 {
    let (s, c) = elevation.sin_cos();
    Vec3::new(p.x, p.y * c + p.z * s, -p.y * s + p.z * c)
}

/// Rotate around the z axis (roll).
pub fn rotate_xy(p: Vec3, roll: f64) -> Vec3 {
    let (s, c) = roll.sin_cos();
    Vec3::new(p.x * c - p.y * s, p.x * s + p.y * c, p.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn points() -> Vec<Vec3> {
        let mut out = Vec::new();
        for &x in &[-0.02, -0.001, 0.0, 0.013] {
            for &y in &[-0.01, 0.0, 0.004] {
                for &z in &[0.001, 0.02, 0.05] {
                    out.push(Vec3::new(x, y, z));
                }
            }
        }
        out
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-12);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-12);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-12);
    }

    #[test]
    fn test_polar_cartesian_round_trip() {
        for p in points() {
            let (az, el, d) = as_polar(p);
            assert_close(as_cartesian(az, el, d), p);

            let (az2, el2, d2) = as_polar(as_cartesian(az, el, d));
            assert_abs_diff_eq!(az, az2, epsilon = 1e-12);
            assert_abs_diff_eq!(el, el2, epsilon = 1e-12);
            assert_abs_diff_eq!(d, d2, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotation_inverse() {
        for p in points() {
            for &angle in &[-2.0, -0.3, 0.0, 0.7, 3.0] {
                assert_close(rotate_xz(rotate_xz(p, angle), -angle), p);
                assert_close(rotate_yz(rotate_yz(p, angle), -angle), p);
                assert_close(rotate_xy(rotate_xy(p, angle), -angle), p);
            }
        }
    }

    #[test]
    fn test_rotate_xz_quarter_turn() {
        let p = rotate_xz(Vec3::Z, std::f64::consts::FRAC_PI_2);
        assert_close(p, Vec3::new(1.0, 0.0, 0.0));
    }
}
