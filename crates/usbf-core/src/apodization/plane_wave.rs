use std::f64::consts::FRAC_PI_2;

use super::Apodization;
use crate::element::{ElementGeometry, WaveData};
use crate::types::{BeamResult, PreconditionError, Vec3};
use crate::window::Window;

/// `window(|f · tan(angle − tilt)|)`, or 0 when the point is more than a
/// quarter turn away from the tilt. An f-number of 0 disables the direction.
fn cone_weight(window: &Window, f_number: f64, angle: f64, tilt: f64) -> f64 {
    if f_number == 0.0 {
        return 1.0;
    }
    let off_axis = angle - tilt;
    if off_axis.abs() >= FRAC_PI_2 {
        return 0.0;
    }
    window.weight((f_number * off_axis.tan()).abs())
}

/// Angular weight of `point` seen from `origin`, in azimuth and elevation.
fn f_number_weight(window: &Window, f_number: [f64; 2], origin: Vec3, point: Vec3, tilt: [f64; 2]) -> f64 {
    let d = point - origin;
    cone_weight(window, f_number[0], d.x.atan2(d.z), tilt[0]) * cone_weight(window, f_number[1], d.y.atan2(d.z), tilt[1])
}

/// Lateral extent of the transmitting array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrayBounds {
    /// Left and right x
    Azimuth { left: f64, right: f64 },
    /// Left and right x, bottom and top y
    Rectangular { left: f64, right: f64, bottom: f64, top: f64 },
}

impl ArrayBounds {
    /// From left/right or left/right/bottom/top edge points.
    pub fn from_points(points: &[Vec3]) -> BeamResult<Self> {
        match points {
            [left, right] => Ok(ArrayBounds::Azimuth { left: left.x, right: right.x }),
            [left, right, bottom, top] => {
                Ok(ArrayBounds::Rectangular { left: left.x, right: right.x, bottom: bottom.y, top: top.y })
            }
            _ => Err(PreconditionError::InvalidApodization(format!(
                "Expected either left/right or left/right/bottom/top array bounds, got {} points",
                points.len()
            ))
            .into()),
        }
    }
}

fn shadow_weight(window: &Window, lo: f64, hi: f64, x: f64) -> f64 {
    if x < lo.min(hi) || x > lo.max(hi) {
        return 0.0;
    }
    window.weight((x - (lo + hi) / 2.0) / (hi - lo).abs())
}

/// Transmit weighting of a plane wave.
///
/// With an f-number, points are weighted by their angle from the sender
/// relative to the steering angle. With array bounds, points are traced back
/// along the steering direction to the sender depth and weighted by where they
/// land on the array; points landing outside it get 0.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneWaveTransmitApodization {
    pub window: Window,
    /// Azimuth and elevation f-numbers; 0 disables a direction
    pub f_number: [f64; 2],
    pub array_bounds: Option<ArrayBounds>,
}

impl PlaneWaveTransmitApodization {
    pub fn new(window: Window) -> Self {
        Self { window, f_number: [0.0, 0.0], array_bounds: None }
    }

    pub fn with_f_number(mut self, azimuth: f64, elevation: f64) -> Self {
        self.f_number = [azimuth, elevation];
        self
    }

    pub fn with_array_bounds(mut self, points: &[Vec3]) -> BeamResult<Self> {
        self.array_bounds = Some(ArrayBounds::from_points(points)?);
        Ok(self)
    }
}

impl Apodization for PlaneWaveTransmitApodization {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        _receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        let tilt = [wave.azimuth.unwrap_or(0.0), wave.elevation.unwrap_or(0.0)];
        let mut weight = f_number_weight(&self.window, self.f_number, sender.position, point, tilt);
        if let Some(bounds) = self.array_bounds {
            let depth = point.z - sender.position.z;
            let x = point.x - depth * tilt[0].tan();
            let y = point.y - depth * tilt[1].tan();
            weight *= match bounds {
                ArrayBounds::Azimuth { left, right } => shadow_weight(&self.window, left, right, x),
                ArrayBounds::Rectangular { left, right, bottom, top } => {
                    shadow_weight(&self.window, left, right, x) * shadow_weight(&self.window, bottom, top, y)
                }
            };
        }
        Ok(weight)
    }
}

/// Receive weighting by f-number around each receiving element's normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneWaveReceiveApodization {
    pub window: Window,
    /// Azimuth and elevation f-numbers; 0 disables a direction
    pub f_number: [f64; 2],
}

impl PlaneWaveReceiveApodization {
    /// Azimuth-only f-number.
    pub fn new(window: Window, f_number: f64) -> Self {
        Self { window, f_number: [f_number, 0.0] }
    }

    pub fn with_elevation_f_number(mut self, f_number: f64) -> Self {
        self.f_number[1] = f_number;
        self
    }
}

impl Apodization for PlaneWaveReceiveApodization {
    fn weight(
        &self,
        _sender: &ElementGeometry,
        point: Vec3,
        receiver: &ElementGeometry,
        _wave: &WaveData,
    ) -> BeamResult<f64> {
        let tilt = [receiver.theta.unwrap_or(0.0), receiver.phi.unwrap_or(0.0)];
        Ok(f_number_weight(&self.window, self.f_number, receiver.position, point, tilt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BeamError;
    use std::f64::consts::FRAC_PI_4;

    fn bounds() -> Vec<Vec3> {
        vec![Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, -5.0, 0.0), Vec3::new(0.0, 5.0, 0.0)]
    }

    fn transmit(apod: &PlaneWaveTransmitApodization, az: f64, el: f64, p: Vec3) -> f64 {
        let sender = ElementGeometry::new(Vec3::ZERO);
        apod.weight(&sender, p, &sender, &WaveData::plane(az, el)).unwrap()
    }

    #[test]
    fn test_array_shadow_follows_steering() {
        let apod = PlaneWaveTransmitApodization::new(Window::Rectangular).with_array_bounds(&bounds()).unwrap();
        assert_eq!(transmit(&apod, 0.0, 0.0, Vec3::new(0.0, 0.0, 10.0)), 1.0);
        assert_eq!(transmit(&apod, 0.0, 0.0, Vec3::new(-10.0, 0.0, 10.0)), 0.0);
        assert_eq!(transmit(&apod, FRAC_PI_4, 0.0, Vec3::new(10.0, 0.0, 10.0)), 1.0);
        assert_eq!(transmit(&apod, 0.0, FRAC_PI_4, Vec3::new(0.0, 10.0, 10.0)), 1.0);
    }

    #[test]
    fn test_array_shadow_with_hanning() {
        let apod = PlaneWaveTransmitApodization::new(Window::hanning()).with_array_bounds(&bounds()).unwrap();
        assert!((transmit(&apod, 0.0, 0.0, Vec3::new(0.0, 0.0, 10.0)) - 1.0).abs() < 1e-12);
        let edge = transmit(&apod, 0.0, 0.0, Vec3::new(4.9, 0.0, 10.0));
        assert!(edge > 0.0 && edge < 1.0);
        assert_eq!(transmit(&apod, 0.0, 0.0, Vec3::new(10.0, 0.0, 10.0)), 0.0);
    }

    #[test]
    fn test_f_number_cone() {
        let apod = PlaneWaveTransmitApodization::new(Window::Rectangular).with_f_number(1.5, 0.0);
        assert_eq!(transmit(&apod, 0.0, 0.0, Vec3::new(0.0, 0.0, 0.02)), 1.0);
        assert_eq!(transmit(&apod, 0.0, 0.0, Vec3::new(0.02, 0.0, 0.002)), 0.0);
        // Steering moves the cone.
        assert_eq!(transmit(&apod, FRAC_PI_4, 0.0, Vec3::new(0.02, 0.0, 0.02)), 1.0);
    }

    #[test]
    fn test_invalid_bounds() {
        let err = PlaneWaveTransmitApodization::new(Window::Rectangular).with_array_bounds(&bounds()[..1]).unwrap_err();
        assert!(matches!(err, BeamError::Precondition(PreconditionError::InvalidApodization(_))));
        assert!(err.to_string().contains("Expected either left/right"));
    }

    #[test]
    fn test_receive_cone_follows_element_normal() {
        let apod = PlaneWaveReceiveApodization::new(Window::Rectangular, 1.0);
        let sender = ElementGeometry::new(Vec3::ZERO);
        let wave = WaveData::default();
        let straight = ElementGeometry::new(Vec3::new(0.01, 0.0, 0.0));
        let tilted = straight.clone().with_orientation(FRAC_PI_4, 0.0);
        let p = Vec3::new(0.03, 0.0, 0.02);
        assert_eq!(apod.weight(&sender, p, &straight, &wave).unwrap(), 0.0);
        assert_eq!(apod.weight(&sender, p, &tilted, &wave).unwrap(), 1.0);
        // Behind the element.
        assert_eq!(apod.weight(&sender, Vec3::new(0.01, 0.0, -0.01), &straight, &wave).unwrap(), 0.0);
    }
}
