//! Wavefront models — how far a wave has travelled to reach a point
//!
//! A transmitted wavefront model returns the distance (in meters) the
//! transmitted wave has travelled from the moment it passed through the sender
//! until it reaches a point. The reflected wavefront is the straight path back
//! from the point to a receiver. Dividing the sum by the speed of sound gives
//! the delay, so wavefront models stay independent of the medium.
//!
//! | Model | Wave kinds | Distance |
//! |-------|-----------|----------|
//! | [`PlaneWavefront`] | any (uses steering angles) | projection on the steering direction |
//! | [`FocusedSphericalWavefront`] | focused, diverging | via the virtual source, sign flips at the focal depth |
//! | [`FocusedHybridWavefront`] | focused, diverging | plane wave blended in near the focal depth |
//! | [`FocusedBlendedWavefront`] | focused, diverging | spherical and plane weighted by distance to the source |
//! | [`REFoCUSWavefront`] | any | per active element, plus firing-time compensation |
//! | [`STAIWavefront`] | any | per active element |
//! | [`UnifiedWavefront`] | focused, diverging | interpolated across the focal region edges |
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::element::{ElementGeometry, WaveData};
//! use usbf_core::types::Vec3;
//! use usbf_core::wavefront::{FocusedSphericalWavefront, TransmittedWavefront};
//!
//! let sender = ElementGeometry::new(Vec3::ZERO);
//! let wave = WaveData::focused(Vec3::new(0.0, 0.0, 0.03));
//! let d = FocusedSphericalWavefront
//!     .distance(&sender, Vec3::new(0.0, 0.0, 0.02), &wave)
//!     .unwrap();
//! assert!((d.mean() - 0.02).abs() < 1e-12);
//! ```

pub mod focused;
pub mod plane;
pub mod refocus;
pub mod stai;
pub mod unified;

pub use focused::{FocusedBlendedWavefront, FocusedHybridWavefront, FocusedSphericalWavefront, HybridTransition};
pub use plane::PlaneWavefront;
pub use refocus::REFoCUSWavefront;
pub use stai::STAIWavefront;
pub use unified::UnifiedWavefront;

use std::fmt;
use std::sync::Arc;

use crate::element::{ElementGeometry, WaveData};
use crate::tensor::Tensor;
use crate::types::{BeamError, BeamResult, Vec3};

/// Model of the transmitted wave.
pub trait TransmittedWavefront: fmt::Debug + Send + Sync {
    /// Distance travelled by the wave from `sender` to `point`.
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance>;
}

impl<W: TransmittedWavefront + ?Sized> TransmittedWavefront for Arc<W> {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance> {
        (**self).distance(sender, point, wave)
    }
}

impl<W: TransmittedWavefront + ?Sized> TransmittedWavefront for Box<W> {
    fn distance(&self, sender: &ElementGeometry, point: Vec3, wave: &WaveData) -> BeamResult<TransmitDistance> {
        (**self).distance(sender, point, wave)
    }
}

/// Straight-line distance from the point back to the receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReflectedWavefront;

impl ReflectedWavefront {
    pub fn distance(&self, point: Vec3, receiver: &ElementGeometry) -> f64 {
        point.distance(receiver.position)
    }
}

/// Custom aggregation of the samples delayed by each distance.
pub type AggregateFn = Arc<dyn Fn(&[Tensor]) -> BeamResult<Tensor> + Send + Sync>;

/// How samples delayed by several transmit distances are combined.
#[derive(Clone, Default)]
pub enum Aggregation {
    #[default]
    Mean,
    WeightedSum(Vec<f64>),
    Custom(AggregateFn),
}

impl fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Mean => write!(f, "Mean"),
            Aggregation::WeightedSum(w) => f.debug_tuple("WeightedSum").field(w).finish(),
            Aggregation::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Aggregation {
    pub fn aggregate(&self, samples: &[Tensor]) -> BeamResult<Tensor> {
        let first = samples.first().ok_or_else(|| BeamError::other("no samples to aggregate"))?;
        match self {
            Aggregation::Mean => {
                let mut acc = first.clone();
                for s in &samples[1..] {
                    acc = acc.add(s)?;
                }
                Ok(acc.div(&Tensor::scalar(samples.len() as f64))?)
            }
            Aggregation::WeightedSum(weights) => {
                if weights.len() != samples.len() {
                    return Err(BeamError::other(format!(
                        "{} aggregation weights for {} samples",
                        weights.len(),
                        samples.len()
                    )));
                }
                let mut acc = first.mul(&Tensor::scalar(weights[0]))?;
                for (s, &w) in samples[1..].iter().zip(&weights[1..]) {
                    acc = acc.add(&s.mul(&Tensor::scalar(w))?)?;
                }
                Ok(acc)
            }
            Aggregation::Custom(f) => f(samples),
        }
    }
}

/// Several transmit distances for one (transmit, point) pair.
#[derive(Debug, Clone)]
pub struct MultipleTransmitDistances {
    pub values: Vec<f64>,
    pub aggregate: Aggregation,
}

impl MultipleTransmitDistances {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, aggregate: Aggregation::Mean }
    }

    pub fn with_aggregation(mut self, aggregate: Aggregation) -> Self {
        self.aggregate = aggregate;
        self
    }
}

/// The result of a transmitted wavefront model.
#[derive(Debug, Clone)]
pub enum TransmitDistance {
    Single(f64),
    Multiple(MultipleTransmitDistances),
}

impl TransmitDistance {
    pub fn values(&self) -> &[f64] {
        match self {
            TransmitDistance::Single(d) => std::slice::from_ref(d),
            TransmitDistance::Multiple(m) => &m.values,
        }
    }

    /// Mean of the distances; the distance itself for a single one.
    pub fn mean(&self) -> f64 {
        let values = self.values();
        if values.is_empty() {
            return f64::NAN;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Apply `f` to every distance, keeping the aggregation.
    pub fn map(self, f: impl Fn(f64) -> f64) -> TransmitDistance {
        match self {
            TransmitDistance::Single(d) => TransmitDistance::Single(f(d)),
            TransmitDistance::Multiple(mut m) => {
                m.values.iter_mut().for_each(|v| *v = f(*v));
                TransmitDistance::Multiple(m)
            }
        }
    }
}

impl From<f64> for TransmitDistance {
    fn from(d: f64) -> Self {
        TransmitDistance::Single(d)
    }
}

/// The elements that actually fired: the sub-elements if any, else the sender.
pub(crate) fn active_positions(sender: &ElementGeometry) -> Vec<Vec3> {
    if sender.sub_elements.is_empty() {
        vec![sender.position]
    } else {
        sender.sub_elements.iter().map(|e| e.position).collect()
    }
}

/// One distance per active element, or a single distance for a lone sender.
pub(crate) fn per_element(values: Vec<f64>) -> TransmitDistance {
    if values.len() == 1 {
        TransmitDistance::Single(values[0])
    } else {
        TransmitDistance::Multiple(MultipleTransmitDistances::new(values))
    }
}

/// `sign(0) == 0`, unlike `f64::signum`.
pub(crate) fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_reflected_is_euclidean() {
        let receiver = ElementGeometry::new(Vec3::new(0.003, 0.0, 0.0));
        assert_abs_diff_eq!(ReflectedWavefront.distance(Vec3::new(0.0, 0.0, 0.004), &receiver), 0.005, epsilon = 1e-15);
    }

    #[test]
    fn test_aggregations() {
        let samples = vec![Tensor::scalar(1.0), Tensor::scalar(2.0), Tensor::scalar(6.0)];
        assert_eq!(Aggregation::Mean.aggregate(&samples).unwrap().to_scalar().unwrap(), 3.0);
        let weighted = Aggregation::WeightedSum(vec![0.2, 0.6, 0.2]);
        assert_abs_diff_eq!(weighted.aggregate(&samples).unwrap().to_scalar().unwrap(), 2.6, epsilon = 1e-12);
        assert!(Aggregation::WeightedSum(vec![1.0]).aggregate(&samples).is_err());
        let max: AggregateFn = Arc::new(|s: &[Tensor]| -> BeamResult<Tensor> {
            let v: Vec<f64> = s.iter().map(|t| t.to_scalar()).collect::<Result<_, _>>()?;
            Ok(Tensor::scalar(v.into_iter().fold(f64::MIN, f64::max)))
        });
        assert_eq!(Aggregation::Custom(max).aggregate(&samples).unwrap().to_scalar().unwrap(), 6.0);
    }

    #[test]
    fn test_transmit_distance_helpers() {
        let m = TransmitDistance::Multiple(MultipleTransmitDistances::new(vec![1.0, 3.0]));
        assert_eq!(m.mean(), 2.0);
        let shifted = m.map(|d| d + 1.0);
        assert_eq!(shifted.values(), &[2.0, 4.0]);
        assert_eq!(TransmitDistance::from(5.0).values(), &[5.0]);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-2.0), -1.0);
    }
}
