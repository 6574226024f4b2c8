//! Kernel — delay-and-sum for one point, one receiver and one transmit
//!
//! [`Kernel::signal_for_point`] is the whole beamforming formula for a single
//! (sender, point, receiver, wave) combination:
//!
//! ```text
//!   c      = speed_of_sound.average(sender, point, receiver)
//!   delay  = (tx_distance + rx_distance) / c − t0
//!   value  = interpolate(signal, delay) · exp(i·2π·f_mod·delay)   (IQ data only)
//!   result = value · apodization(sender, point, receiver, wave)
//! ```
//!
//! Transmit models that return several distances have every distance delayed
//! and sampled separately; the samples are then combined by the model's
//! aggregation. There are no loops over points or elements here:
//! [`Kernel::into_base_fn`] turns the kernel into a pipeline function that
//! transformations lift over whole datacubes.

use std::f64::consts::PI;
use std::sync::Arc;

use crate::apodization::{Apodization, NoApodization};
use crate::element::{ElementGeometry, WaveData};
use crate::interpolation::InterpolationSpace1D;
use crate::spec::{Spec, SpecError};
use crate::speed_of_sound::{ConstantSpeedOfSound, SpeedOfSound};
use crate::tensor::Tensor;
use crate::traceable::{self, Traceable};
use crate::transform::BaseFn;
use crate::tree::{Args, Tree};
use crate::types::{BeamError, BeamResult, Complex, Vec3};
use crate::wavefront::{ReflectedWavefront, TransmitDistance, TransmittedWavefront};

/// Argument names of the kernel function.
pub const SENDER: &str = "sender";
pub const POINT: &str = "point";
pub const RECEIVER: &str = "receiver";
pub const WAVE_DATA: &str = "wave_data";
pub const SIGNAL: &str = "signal";

const FIELDS: [&str; 5] = [SENDER, POINT, RECEIVER, WAVE_DATA, SIGNAL];

/// The models used by the kernel.
#[derive(Debug, Clone)]
pub struct Kernel {
    pub speed_of_sound: Arc<dyn SpeedOfSound>,
    pub wavefront: Arc<dyn TransmittedWavefront>,
    pub reflected_wavefront: ReflectedWavefront,
    /// Time axis of the signal, in seconds
    pub interpolation: Arc<dyn InterpolationSpace1D>,
    pub apodization: Arc<dyn Apodization>,
    /// Demodulation frequency of IQ data; `None` for RF data
    pub modulation_frequency: Option<f64>,
}

impl Kernel {
    pub fn new(wavefront: Arc<dyn TransmittedWavefront>, interpolation: Arc<dyn InterpolationSpace1D>) -> Self {
        Self {
            speed_of_sound: Arc::new(ConstantSpeedOfSound::default()),
            wavefront,
            reflected_wavefront: ReflectedWavefront,
            interpolation,
            apodization: Arc::new(NoApodization),
            modulation_frequency: None,
        }
    }

    pub fn with_speed_of_sound(mut self, speed_of_sound: Arc<dyn SpeedOfSound>) -> Self {
        self.speed_of_sound = speed_of_sound;
        self
    }

    pub fn with_apodization(mut self, apodization: Arc<dyn Apodization>) -> Self {
        self.apodization = apodization;
        self
    }

    pub fn with_modulation_frequency(mut self, frequency: f64) -> Self {
        self.modulation_frequency = Some(frequency);
        self
    }

    /// Sample `signal` (time on axis 0) after travelling `distance` at speed `c`.
    fn sample(&self, distance: f64, c: f64, t0: f64, signal: &Tensor) -> BeamResult<Tensor> {
        let delay = distance / c - t0;
        let value = self.interpolation.interpolate(delay, signal)?;
        Ok(match self.modulation_frequency {
            Some(f) => value.mul(&Tensor::complex_scalar(Complex::from_polar(1.0, 2.0 * PI * f * delay)))?,
            None => value,
        })
    }

    /// The delayed, remodulated and weighted signal for one combination.
    pub fn signal_for_point(
        &self,
        sender: &ElementGeometry,
        point: Vec3,
        receiver: &ElementGeometry,
        wave: &WaveData,
        signal: &Tensor,
    ) -> BeamResult<Tensor> {
        let c = self.speed_of_sound.average(sender.position, point, receiver.position);
        let rx = self.reflected_wavefront.distance(point, receiver);
        let tx = self.wavefront.distance(sender, point, wave)?;

        let mut samples = tx
            .values()
            .iter()
            .map(|&d| self.sample(d + rx, c, wave.t0, signal))
            .collect::<BeamResult<Vec<Tensor>>>()?;
        let value = match tx {
            TransmitDistance::Multiple(m) => m.aggregate.aggregate(&samples)?,
            TransmitDistance::Single(_) => samples.pop().ok_or_else(|| BeamError::other("no transmit distance"))?,
        };

        let weight = self.apodization.weight(sender, point, receiver, wave)?;
        Ok(value.mul(&Tensor::scalar(weight))?)
    }

    /// The kernel as a pipeline function over `sender`, `point`, `receiver`,
    /// `wave_data` and `signal`.
    ///
    /// Every argument must have had its named dimensions removed by the
    /// surrounding transformations; building a pipeline that leaves one in
    /// place fails. The result is a dimensionless scalar.
    pub fn into_base_fn(self) -> BaseFn {
        let kernel = Arc::new(self);
        BaseFn::new("signal_for_point", move |args: Args| {
            let sender = ElementGeometry::reconstruct(traceable::field(&args, SENDER)?)?;
            let point = Vec3::reconstruct(traceable::field(&args, POINT)?)?;
            let receiver = ElementGeometry::reconstruct(traceable::field(&args, RECEIVER)?)?;
            let wave = WaveData::reconstruct(traceable::field(&args, WAVE_DATA)?)?;
            let signal = traceable::leaf(traceable::field(&args, SIGNAL)?, SIGNAL)?;
            Ok(Tree::leaf(kernel.signal_for_point(&sender, point, &receiver, &wave, signal)?))
        })
        .specced(
            Some(Arc::new(single_values)),
            Some(Arc::new(|_: &Spec| -> BeamResult<Spec> { Ok(Spec::scalar()) })),
        )
    }
}

/// Reject specs where a kernel argument still carries a named dimension.
fn single_values(spec: &Spec) -> BeamResult<Spec> {
    for field in FIELDS {
        let dims = spec
            .field(field)
            .ok_or_else(|| SpecError::StructureMismatch(field.to_string()))?
            .dimensions();
        if !dims.is_empty() {
            return Err(SpecError::UnexpectedDimensions { field: field.to_string(), dims }.into());
        }
    }
    Ok(spec.clone())
}

/// Kernel arguments for a single combination.
pub fn args(sender: &ElementGeometry, point: Vec3, receiver: &ElementGeometry, wave: &WaveData, signal: Tensor) -> Args {
    Tree::node()
        .with(SENDER, sender.decompose())
        .with(POINT, point.decompose())
        .with(RECEIVER, receiver.decompose())
        .with(WAVE_DATA, wave.decompose())
        .with(SIGNAL, signal)
}

/// The spec of [`args`] with no named dimensions.
pub fn scalar_spec() -> Spec {
    FIELDS.iter().fold(Spec::tree(), |spec, field| spec.with(*field, Spec::scalar()))
}
