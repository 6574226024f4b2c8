//! Apodization — spatial weighting of delayed samples
//!
//! Every model answers one question: how much should the sample delayed for
//! (sender, point, receiver, wave) count in the sum? Models are plain data
//! (window, f-number, aperture sizes) behind the [`Apodization`] trait and can
//! be combined freely.
//!
//! | Model | Side | Shape |
//! |-------|------|-------|
//! | [`NoApodization`] | both | 1 everywhere |
//! | [`PlaneWaveTransmitApodization`] | transmit | f-number cone along the steering angle, array shadow |
//! | [`PlaneWaveReceiveApodization`] | receive | f-number cone around the element normal |
//! | [`ExpandingAperture`] | receive | aperture growing with depth, clamped |
//! | [`FocusedTransmitApodization`] / [`RTBApodization`] | transmit | hourglass through the focus |
//! | [`ConstantWidthApodization`] | transmit | fixed-width beam toward the virtual source |
//! | [`MLAApodization`] | transmit | fixed-width band around the scanline |
//! | [`CombinedApodization`] / [`TxRxApodization`] | both | product (or custom reduction) |
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::apodization::{Apodization, PlaneWaveReceiveApodization};
//! use usbf_core::element::{ElementGeometry, WaveData};
//! use usbf_core::types::Vec3;
//! use usbf_core::window::Window;
//!
//! let apod = PlaneWaveReceiveApodization::new(Window::hanning(), 1.5);
//! let element = ElementGeometry::new(Vec3::ZERO);
//! let wave = WaveData::plane(0.0, 0.0);
//! let on_axis = apod.weight(&element, Vec3::new(0.0, 0.0, 0.02), &element, &wave).unwrap();
//! assert_eq!(on_axis, 1.0);
//! ```

pub mod expanding;
pub mod focused;
pub mod mla;
pub mod plane_wave;

pub use expanding::ExpandingAperture;
pub use focused::{focused_apodization, ConstantWidthApodization, FocusedTransmitApodization, RTBApodization};
pub use mla::MLAApodization;
pub use plane_wave::{PlaneWaveReceiveApodization, PlaneWaveTransmitApodization};

use std::fmt;
use std::sync::Arc;

use crate::element::{ElementGeometry, WaveData};
use crate::types::{BeamResult, Vec3};

/// Weight of the sample delayed for one (sender, point, receiver, wave).
pub trait Apodization: fmt::Debug + Send + Sync {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64>;
}

impl<A: Apodization + ?Sized> Apodization for Arc<A> {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        (**self).weight(sender, point, receiver, wave)
    }
}

impl<A: Apodization + ?Sized> Apodization for Box<A> {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        (**self).weight(sender, point, receiver, wave)
    }
}

/// Always 1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoApodization;

impl Apodization for NoApodization {
    fn weight(&self, _: &ElementGeometry, _: Vec3, _: &ElementGeometry, _: &WaveData) -> BeamResult<f64> {
        Ok(1.0)
    }
}

/// Reduction of the weights of several apodizations into one.
pub type Combiner = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Several apodizations reduced to one weight, by product unless a custom
/// combiner is given.
#[derive(Clone, Default)]
pub struct CombinedApodization {
    pub apodizations: Vec<Arc<dyn Apodization>>,
    pub combiner: Option<Combiner>,
}

impl fmt::Debug for CombinedApodization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedApodization")
            .field("apodizations", &self.apodizations)
            .field("combiner", &self.combiner.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl CombinedApodization {
    pub fn new(apodizations: Vec<Arc<dyn Apodization>>) -> Self {
        Self { apodizations, combiner: None }
    }

    pub fn with_combiner(mut self, combiner: Combiner) -> Self {
        self.combiner = Some(combiner);
        self
    }
}

impl Apodization for CombinedApodization {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        let weights = self
            .apodizations
            .iter()
            .map(|a| a.weight(sender, point, receiver, wave))
            .collect::<BeamResult<Vec<f64>>>()?;
        Ok(match &self.combiner {
            Some(combine) => combine(&weights),
            None => weights.iter().product(),
        })
    }
}

/// Product of a transmit and a receive apodization; a missing side counts as 1.
#[derive(Debug, Clone, Default)]
pub struct TxRxApodization {
    pub transmit: Option<Arc<dyn Apodization>>,
    pub receive: Option<Arc<dyn Apodization>>,
}

impl TxRxApodization {
    pub fn new(transmit: Arc<dyn Apodization>, receive: Arc<dyn Apodization>) -> Self {
        Self { transmit: Some(transmit), receive: Some(receive) }
    }
}

impl Apodization for TxRxApodization {
    fn weight(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        receiver: &ElementGeometry,
        wave: &WaveData,
    ) -> BeamResult<f64> {
        let mut weight = 1.0;
        for side in [&self.transmit, &self.receive].into_iter().flatten() {
            weight *= side.weight(sender, point, receiver, wave)?;
        }
        Ok(weight)
    }
}
