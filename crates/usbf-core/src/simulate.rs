//! Simulation — channel data of point scatterers
//!
//! Synthesizes the RF signal every receiver records for every transmit when
//! the medium holds only a few point scatterers. Each scatterer contributes a
//! Gaussian-modulated sinusoid delayed by its round-trip time:
//!
//! ```text
//!   delay(t, r)  = (tx_distance + rx_distance) / c − t0
//!   rf[t, r, i]  = Σ amplitude · pulse(t_start + i / fs − delay(t, r))
//!   pulse(τ)     = exp(−τ² / 2σ²) · cos(2π f_c τ)
//! ```
//!
//! The RF data can be turned into IQ data with [`analytic_signal`] (a Hilbert
//! transform along the time axis) followed by demodulation, see
//! [`Simulator::to_iq`].

use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::{ArrayD, Axis};
use rustfft::FftPlanner;

use crate::element::{ElementGeometry, WaveData};
use crate::interpolation::FastInterpLinspace;
use crate::tensor::{Tensor, TensorError};
use crate::types::{BeamResult, Complex, PreconditionError, Vec3};
use crate::wavefront::{PlaneWavefront, ReflectedWavefront, TransmittedWavefront};

/// Pulse envelopes are cut off this many standard deviations from the center.
const ENVELOPE_SUPPORT: f64 = 5.0;

/// A Gaussian-modulated sinusoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPulse {
    /// Carrier frequency in Hz
    pub center_frequency: f64,
    /// Bandwidth at −6 dB, relative to the center frequency
    pub fractional_bandwidth: f64,
}

impl GaussianPulse {
    pub fn new(center_frequency: f64, fractional_bandwidth: f64) -> Self {
        Self { center_frequency, fractional_bandwidth }
    }

    /// Standard deviation of the envelope, in seconds.
    pub fn sigma(&self) -> f64 {
        let half_bandwidth = self.fractional_bandwidth * self.center_frequency / 2.0;
        let sigma_f = half_bandwidth / (2.0 * 2f64.ln()).sqrt();
        1.0 / (2.0 * PI * sigma_f)
    }

    pub fn envelope(&self, t: f64) -> f64 {
        let sigma = self.sigma();
        (-t * t / (2.0 * sigma * sigma)).exp()
    }

    pub fn at(&self, t: f64) -> f64 {
        self.envelope(t) * (2.0 * PI * self.center_frequency * t).cos()
    }
}

impl Default for GaussianPulse {
    fn default() -> Self {
        Self::new(5e6, 0.6)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointScatterer {
    pub position: Vec3,
    pub amplitude: f64,
}

impl PointScatterer {
    pub fn new(position: Vec3) -> Self {
        Self { position, amplitude: 1.0 }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }
}

/// Point-scatterer channel data simulator.
#[derive(Debug, Clone)]
pub struct Simulator {
    pub pulse: GaussianPulse,
    pub sampling_frequency: f64,
    pub num_samples: usize,
    /// Time of the first sample, in seconds
    pub start_time: f64,
    pub speed_of_sound: f64,
    pub wavefront: Arc<dyn TransmittedWavefront>,
}

impl Simulator {
    pub fn new(pulse: GaussianPulse, sampling_frequency: f64, num_samples: usize) -> Self {
        Self {
            pulse,
            sampling_frequency,
            num_samples,
            start_time: 0.0,
            speed_of_sound: 1540.0,
            wavefront: Arc::new(PlaneWavefront),
        }
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_speed_of_sound(mut self, speed_of_sound: f64) -> Self {
        self.speed_of_sound = speed_of_sound;
        self
    }

    pub fn with_wavefront(mut self, wavefront: Arc<dyn TransmittedWavefront>) -> Self {
        self.wavefront = wavefront;
        self
    }

    /// The time axis of the simulated signal, ready to use as the kernel's
    /// interpolation space.
    pub fn time_axis(&self) -> FastInterpLinspace {
        FastInterpLinspace::new(self.start_time, 1.0 / self.sampling_frequency, self.num_samples)
    }

    /// Channel data of shape `[transmits, receivers, samples]`.
    ///
    /// `senders` holds either one sender per transmit or a single sender used
    /// by every transmit. Transmit models with several distances (e.g. STAI)
    /// get one echo per distance, each scaled by the inverse of their count.
    pub fn simulate(
        &self,
        scatterers: &[PointScatterer],
        senders: &[ElementGeometry],
        receivers: &[ElementGeometry],
        waves: &[WaveData],
    ) -> BeamResult<Tensor> {
        if senders.len() != 1 && senders.len() != waves.len() {
            return Err(PreconditionError::InvalidGeometry(format!(
                "Expected 1 or {} senders, got {}",
                waves.len(),
                senders.len()
            ))
            .into());
        }
        let (n_tx, n_rx, n) = (waves.len(), receivers.len(), self.num_samples);
        let mut rf = vec![0.0; n_tx * n_rx * n];
        let support = ENVELOPE_SUPPORT * self.pulse.sigma();

        for (t, wave) in waves.iter().enumerate() {
            let sender = senders.get(t).unwrap_or(&senders[0]);
            for scatterer in scatterers {
                let tx = self.wavefront.distance(sender, scatterer.position, wave)?;
                let gain = scatterer.amplitude / tx.values().len() as f64;
                for (r, receiver) in receivers.iter().enumerate() {
                    let rx = ReflectedWavefront.distance(scatterer.position, receiver);
                    let trace = &mut rf[(t * n_rx + r) * n..(t * n_rx + r + 1) * n];
                    for &d in tx.values() {
                        let delay = (d + rx) / self.speed_of_sound - wave.t0;
                        self.add_echo(trace, delay, gain, support);
                    }
                }
            }
        }

        tracing::debug!(
            transmits = n_tx,
            receivers = n_rx,
            samples = n,
            scatterers = scatterers.len(),
            "simulated channel data"
        );
        Ok(Tensor::from_shape_vec(&[n_tx, n_rx, n], rf)?)
    }

    fn add_echo(&self, trace: &mut [f64], delay: f64, gain: f64, support: f64) {
        let fs = self.sampling_frequency;
        let first = ((delay - support - self.start_time) * fs).floor().max(0.0) as usize;
        let last = (((delay + support - self.start_time) * fs).ceil().max(0.0) as usize).min(trace.len());
        for (i, sample) in trace.iter_mut().enumerate().take(last).skip(first) {
            let t = self.start_time + i as f64 / fs;
            *sample += gain * self.pulse.at(t - delay);
        }
    }

    /// IQ data of the simulated RF signal: the analytic signal shifted down
    /// by the pulse's center frequency. Beamform it with the kernel's
    /// modulation frequency set to the same frequency.
    pub fn to_iq(&self, rf: &Tensor) -> BeamResult<Tensor> {
        let analytic = analytic_signal(rf)?;
        let time = self.time_axis().to_vec();
        let fc = self.pulse.center_frequency;
        let carrier: Vec<Complex> = time.iter().map(|t| Complex::from_polar(1.0, -2.0 * PI * fc * t)).collect();
        let carrier = Tensor::from_shape_vec_complex(&[carrier.len()], carrier)?;
        Ok(analytic.mul(&carrier)?)
    }
}

/// Frequency-domain gain of the analytic signal: keep DC (and Nyquist),
/// double positive frequencies, drop negative ones.
fn analytic_gain(n: usize) -> Vec<f64> {
    let mut gain = vec![0.0; n];
    if n == 0 {
        return gain;
    }
    gain[0] = 1.0;
    let half = n / 2;
    if n % 2 == 0 {
        gain[half] = 1.0;
        gain[1..half].iter_mut().for_each(|g| *g = 2.0);
    } else {
        gain[1..=half].iter_mut().for_each(|g| *g = 2.0);
    }
    gain
}

/// The analytic signal of real data along its last axis: the data itself as
/// the real part and its Hilbert transform as the imaginary part.
pub fn analytic_signal(rf: &Tensor) -> Result<Tensor, TensorError> {
    let data = rf.as_real()?;
    let axis = rf.ndim().checked_sub(1).ok_or(TensorError::AxisOutOfBounds { axis: 0, ndim: 0 })?;
    let n = rf.shape()[axis];
    let mut out: ArrayD<Complex> = data.mapv(|x| Complex::new(x, 0.0));
    if n == 0 {
        return Ok(Tensor::complex(out));
    }

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);
    let scale: Vec<f64> = analytic_gain(n).into_iter().map(|g| g / n as f64).collect();
    let mut buffer = vec![Complex::new(0.0, 0.0); n];

    for mut lane in out.lanes_mut(Axis(axis)) {
        buffer.iter_mut().zip(lane.iter()).for_each(|(b, v)| *b = *v);
        forward.process(&mut buffer);
        buffer.iter_mut().zip(&scale).for_each(|(b, s)| *b *= *s);
        inverse.process(&mut buffer);
        lane.iter_mut().zip(&buffer).for_each(|(v, b)| *v = *b);
    }
    Ok(Tensor::complex(out))
}
