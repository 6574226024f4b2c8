use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::{ends, require_axis, resized, CartesianBounds, Scan};
use crate::geometry::as_cartesian;
use crate::types::{BeamResult, PreconditionError, Vec3};

/// A polar grid of azimuths, (elevations) and depths fanning out from `apex`.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorScan {
    pub azimuths: Vec<f64>,
    pub elevations: Option<Vec<f64>>,
    pub depths: Vec<f64>,
    pub apex: Vec3,
}

impl SectorScan {
    pub fn new(azimuths: Vec<f64>, depths: Vec<f64>) -> BeamResult<Self> {
        require_axis("azimuths", &azimuths)?;
        require_axis("depths", &depths)?;
        Ok(Self { azimuths, elevations: None, depths, apex: Vec3::ZERO })
    }

    pub fn new_3d(azimuths: Vec<f64>, elevations: Vec<f64>, depths: Vec<f64>) -> BeamResult<Self> {
        require_axis("elevations", &elevations)?;
        let mut scan = Self::new(azimuths, depths)?;
        scan.elevations = Some(elevations);
        Ok(scan)
    }

    pub fn with_apex(mut self, apex: Vec3) -> Self {
        self.apex = apex;
        self
    }
}

/// Range of `cos` over the interval between `a` and `b`.
fn cos_range(a: f64, b: f64) -> (f64, f64) {
    let (lo, hi) = (a.min(b), a.max(b));
    if hi - lo >= TAU {
        return (-1.0, 1.0);
    }
    let (ca, cb) = (lo.cos(), hi.cos());
    let peak = (lo / TAU).ceil() * TAU;
    let trough = ((lo - PI) / TAU).ceil() * TAU + PI;
    let max = if peak <= hi { 1.0 } else { ca.max(cb) };
    let min = if trough <= hi { -1.0 } else { ca.min(cb) };
    (min, max)
}

fn sin_range(a: f64, b: f64) -> (f64, f64) {
    cos_range(a - FRAC_PI_2, b - FRAC_PI_2)
}

/// Range of a product of independent factors, each given by its range.
fn product_range(factors: &[(f64, f64)]) -> (f64, f64) {
    factors.iter().fold((1.0, 1.0), |(lo, hi), &(a, b)| {
        let candidates = [lo * a, lo * b, hi * a, hi * b];
        let min = candidates.iter().copied().fold(f64::INFINITY, f64::min);
        let max = candidates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    })
}

impl Scan for SectorScan {
    fn axes(&self) -> Vec<&[f64]> {
        match &self.elevations {
            Some(el) => vec![self.azimuths.as_slice(), el.as_slice(), self.depths.as_slice()],
            None => vec![self.azimuths.as_slice(), self.depths.as_slice()],
        }
    }

    fn points(&self) -> Vec<Vec3> {
        let elevations: &[f64] = self.elevations.as_deref().unwrap_or(&[0.0]);
        let mut points = Vec::with_capacity(self.azimuths.len() * elevations.len() * self.depths.len());
        for &az in &self.azimuths {
            for &el in elevations {
                points.extend(self.depths.iter().map(|&d| as_cartesian(az, el, d) + self.apex));
            }
        }
        points
    }

    /// Bounds of the continuous sector spanned by the axis ends, which is
    /// also the bounding box of a scan-converted image. Relative to the apex.
    fn cartesian_bounds(&self) -> CartesianBounds {
        let (a0, a1) = ends(&self.azimuths);
        let (d0, d1) = ends(&self.depths);
        let depth = (d0.min(d1), d0.max(d1));
        let cos_el = match self.elevations.as_deref() {
            Some(el) => {
                let (e0, e1) = ends(el);
                cos_range(e0, e1)
            }
            None => (1.0, 1.0),
        };
        let y = self.elevations.as_deref().map(|el| {
            let (e0, e1) = ends(el);
            product_range(&[depth, sin_range(e0, e1)])
        });
        CartesianBounds {
            x: product_range(&[depth, cos_el, sin_range(a0, a1)]),
            y,
            z: product_range(&[depth, cos_el, cos_range(a0, a1)]),
        }
    }

    fn resize(&self, sizes: &[Option<usize>]) -> BeamResult<Self> {
        let (azimuths, elevations, depths) = match *sizes {
            [az, d] if self.elevations.is_none() => (az, None, d),
            [az, el, d] => (az, el, d),
            _ => {
                return Err(PreconditionError::InvalidGeometry(format!(
                    "Expected {} axis sizes, got {}",
                    self.ndim(),
                    sizes.len()
                ))
                .into())
            }
        };
        Ok(Self {
            azimuths: resized("azimuths", Some(&self.azimuths), azimuths)?.unwrap_or_default(),
            elevations: resized("elevations", self.elevations.as_deref(), elevations)?,
            depths: resized("depths", Some(&self.depths), depths)?.unwrap_or_default(),
            apex: self.apex,
        })
    }
}
