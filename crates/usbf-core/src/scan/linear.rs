use super::{ends, require_axis, resized, CartesianBounds, Scan};
use crate::types::{BeamResult, PreconditionError, Vec3};

/// A rectilinear grid in x, (y), z.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScan {
    pub x: Vec<f64>,
    pub y: Option<Vec<f64>>,
    pub z: Vec<f64>,
}

impl LinearScan {
    /// A 2D scan in the xz plane.
    pub fn new(x: Vec<f64>, z: Vec<f64>) -> BeamResult<Self> {
        require_axis("x", &x)?;
        require_axis("z", &z)?;
        Ok(Self { x, y: None, z })
    }

    pub fn new_3d(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> BeamResult<Self> {
        require_axis("y", &y)?;
        let mut scan = Self::new(x, z)?;
        scan.y = Some(y);
        Ok(scan)
    }
}

fn sorted((a, b): (f64, f64)) -> (f64, f64) {
    (a.min(b), a.max(b))
}

impl Scan for LinearScan {
    fn axes(&self) -> Vec<&[f64]> {
        match &self.y {
            Some(y) => vec![self.x.as_slice(), y.as_slice(), self.z.as_slice()],
            None => vec![self.x.as_slice(), self.z.as_slice()],
        }
    }

    fn points(&self) -> Vec<Vec3> {
        let ys: &[f64] = self.y.as_deref().unwrap_or(&[0.0]);
        let mut points = Vec::with_capacity(self.x.len() * ys.len() * self.z.len());
        for &x in &self.x {
            for &y in ys {
                points.extend(self.z.iter().map(|&z| Vec3::new(x, y, z)));
            }
        }
        points
    }

    fn cartesian_bounds(&self) -> CartesianBounds {
        CartesianBounds {
            x: sorted(ends(&self.x)),
            y: self.y.as_deref().map(|y| sorted(ends(y))),
            z: sorted(ends(&self.z)),
        }
    }

    fn resize(&self, sizes: &[Option<usize>]) -> BeamResult<Self> {
        let (x, y, z) = match *sizes {
            [x, z] => (x, None, z),
            [x, y, z] => (x, y, z),
            _ => {
                return Err(PreconditionError::InvalidGeometry(format!(
                    "Expected 2 or 3 axis sizes, got {}",
                    sizes.len()
                ))
                .into())
            }
        };
        if sizes.len() == 2 && self.y.is_some() {
            return Err(PreconditionError::InvalidGeometry("A 3D scan needs sizes for x, y and z".to_string()).into());
        }
        Ok(Self {
            x: resized("x", Some(&self.x), x)?.unwrap_or_default(),
            y: resized("y", self.y.as_deref(), y)?,
            z: resized("z", Some(&self.z), z)?.unwrap_or_default(),
        })
    }
}
