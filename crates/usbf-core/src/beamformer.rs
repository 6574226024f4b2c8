//! Beamformer — the standard delay-and-sum pipeline
//!
//! Lifts the point [`Kernel`] over a whole acquisition:
//!
//! ```text
//!   signal_for_point
//!     └─ ForAll("points")
//!          └─ ForAll | Reduce::sum ("receivers")
//!               └─ ForAll | Reduce::sum ("transmits")
//!                    └─ sum over the vectorized element dimensions
//!                         └─ unflatten "points" to the scan shape
//! ```
//!
//! Summing over receivers and transmits can either vectorize the dimension and
//! sum the stacked result, or fold it one slice at a time
//! ([`Summation::Folded`]). Folding keeps only one slice's image in memory.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::element::{ElementGeometry, WaveData};
use crate::kernel::{Kernel, POINT, RECEIVER, SENDER, SIGNAL, WAVE_DATA};
use crate::scan::Scan;
use crate::spec::Spec;
use crate::tensor::Tensor;
use crate::traceable::{decompose_batch, Traceable};
use crate::transform::{Apply, Axis, ForAll, Reduce, TransformedFunction, Wrap};
use crate::tree::{Args, Tree};
use crate::types::{BeamError, BeamResult, PreconditionError, Vec3};

pub const POINTS: &str = "points";
pub const RECEIVERS: &str = "receivers";
pub const TRANSMITS: &str = "transmits";

/// How a beamformer sums over an element dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Summation {
    /// Vectorize with `ForAll`, then sum the stacked result
    #[default]
    Vectorized,
    /// Fold with `Reduce::sum`
    Folded,
}

/// Everything a beamformer reads from an acquisition.
#[derive(Debug, Clone)]
pub struct BeamformerData {
    pub points: Vec<Vec3>,
    /// One sender per transmit, or a single sender shared by all transmits
    pub senders: Vec<ElementGeometry>,
    pub receivers: Vec<ElementGeometry>,
    pub waves: Vec<WaveData>,
    /// Channel data of shape `[transmits, receivers, time]`
    pub signal: Tensor,
}

impl BeamformerData {
    pub fn new(
        points: Vec<Vec3>,
        senders: Vec<ElementGeometry>,
        receivers: Vec<ElementGeometry>,
        waves: Vec<WaveData>,
        signal: Tensor,
    ) -> BeamResult<Self> {
        let data = Self { points, senders, receivers, waves, signal };
        data.check_sizes()?;
        Ok(data)
    }

    fn check_sizes(&self) -> BeamResult<()> {
        let expected = [self.waves.len(), self.receivers.len()];
        if self.signal.ndim() != 3 || self.signal.shape()[..2] != expected {
            return Err(PreconditionError::InvalidGeometry(format!(
                "Expected a signal of shape [{}, {}, time], got {:?}",
                expected[0],
                expected[1],
                self.signal.shape()
            ))
            .into());
        }
        if self.senders.len() != 1 && self.senders.len() != self.waves.len() {
            return Err(PreconditionError::InvalidGeometry(format!(
                "Expected 1 or {} senders, got {}",
                self.waves.len(),
                self.senders.len()
            ))
            .into());
        }
        if self.points.is_empty() {
            return Err(PreconditionError::InvalidGeometry("No points to beamform".to_string()).into());
        }
        Ok(())
    }

    fn shared_sender(&self) -> Option<&ElementGeometry> {
        match self.senders.as_slice() {
            [sender] if self.waves.len() != 1 => Some(sender),
            _ => None,
        }
    }

    /// Named dimensions of [`args`](Self::args).
    pub fn spec(&self) -> Spec {
        let sender = match self.shared_sender() {
            Some(_) => Spec::scalar(),
            None => Spec::dims([TRANSMITS]),
        };
        Spec::tree()
            .with(SENDER, sender)
            .with(POINT, Spec::dims([POINTS]))
            .with(RECEIVER, Spec::dims([RECEIVERS]))
            .with(WAVE_DATA, Spec::dims([TRANSMITS]))
            .with(SIGNAL, Spec::dims([TRANSMITS, RECEIVERS]))
    }

    /// The data as kernel arguments, batched along their named dimensions.
    pub fn args(&self) -> BeamResult<Args> {
        let sender = match self.shared_sender() {
            Some(sender) => sender.decompose(),
            None => decompose_batch(&self.senders)?,
        };
        Ok(Tree::node()
            .with(SENDER, sender)
            .with(POINT, Tensor::from_points(&self.points))
            .with(RECEIVER, decompose_batch(&self.receivers)?)
            .with(WAVE_DATA, decompose_batch(&self.waves)?)
            .with(SIGNAL, self.signal.clone()))
    }
}

/// Names of the image dimensions that replace the flat `points` dimension.
fn image_dimensions(ndim: usize) -> Vec<String> {
    match ndim {
        1 => vec![POINTS.to_string()],
        2 => vec!["width".to_string(), "height".to_string()],
        3 => vec!["width".to_string(), "elevation".to_string(), "height".to_string()],
        n => (0..n).map(|i| format!("image_{i}")).collect(),
    }
}

/// A delay-and-sum beamformer over a scan.
#[derive(Debug, Clone)]
pub struct Beamformer {
    pub kernel: Kernel,
    /// Shape of the image; `points` are flattened from it in row-major order
    pub image_shape: Vec<usize>,
    pub receivers: Summation,
    pub transmits: Summation,
    pub jit: bool,
}

impl Beamformer {
    pub fn new(kernel: Kernel, image_shape: Vec<usize>) -> Self {
        Self {
            kernel,
            image_shape,
            receivers: Summation::default(),
            transmits: Summation::default(),
            jit: false,
        }
    }

    pub fn for_scan(kernel: Kernel, scan: &dyn Scan) -> Self {
        Self::new(kernel, scan.shape())
    }

    pub fn with_summation(mut self, receivers: Summation, transmits: Summation) -> Self {
        self.receivers = receivers;
        self.transmits = transmits;
        self
    }

    pub fn with_jit(mut self, jit: bool) -> Self {
        self.jit = jit;
        self
    }

    /// The unbuilt pipeline for data described by `spec`. Element dimensions
    /// the spec does not have are skipped.
    pub fn pipeline(&self, spec: &Spec) -> TransformedFunction {
        let mut f = crate::compose!(self.kernel.clone().into_base_fn(), ForAll::new(POINTS));
        let mut vectorized = Vec::new();
        for (dim, summation) in [(RECEIVERS, self.receivers), (TRANSMITS, self.transmits)] {
            if !spec.has_dimension(dim) {
                continue;
            }
            f = match summation {
                Summation::Vectorized => {
                    vectorized.push(dim);
                    f.then(ForAll::new(dim))
                }
                Summation::Folded => f.then(Reduce::sum(dim)),
            };
        }
        for dim in vectorized.into_iter().rev() {
            f = f.then(Apply::sum(Axis::new(dim)));
        }
        f = f.then(Apply::unflatten(
            Axis::new(POINTS).becomes(image_dimensions(self.image_shape.len())),
            self.image_shape.clone(),
        ));
        if self.jit {
            f = f.then(Wrap::jit());
        }
        f
    }

    /// Build the pipeline for `spec`.
    pub fn build(&self, spec: &Spec) -> BeamResult<TransformedFunction> {
        let built = self.pipeline(spec).build(spec)?;
        tracing::debug!(
            steps = built.steps().len(),
            output = %built.output_spec.clone().unwrap_or_else(Spec::scalar),
            "built beamformer"
        );
        Ok(built)
    }

    /// Beamform `data` into an image of shape [`image_shape`](Self::image_shape).
    pub fn run(&self, backend: &dyn Backend, data: &BeamformerData) -> BeamResult<Tensor> {
        let expected: usize = self.image_shape.iter().product();
        if data.points.len() != expected {
            return Err(PreconditionError::InvalidGeometry(format!(
                "Expected {} points for an image of shape {:?}, got {}",
                expected,
                self.image_shape,
                data.points.len()
            ))
            .into());
        }
        let spec = data.spec();
        let args = data.args()?;
        spec.validate(&args)?;
        let f = self.build(&spec)?;

        tracing::info!(
            points = data.points.len(),
            receivers = data.receivers.len(),
            transmits = data.waves.len(),
            backend = backend.name(),
            "beamforming"
        );
        f.call(backend, args)?
            .into_leaf()
            .ok_or_else(|| BeamError::other("beamformer returned a structured result"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apodization::ExpandingAperture;
    use crate::backend::Sequential;
    use crate::scan::{linspace, LinearScan};
    use crate::simulate::{GaussianPulse, PointScatterer, Simulator};
    use crate::wavefront::PlaneWavefront;
    use crate::window::Window;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    const FS: f64 = 40e6;
    const SCATTERER: Vec3 = Vec3::new(0.002, 0.0, 0.012);

    fn array(n: usize) -> Vec<ElementGeometry> {
        linspace(-0.006, 0.006, n).into_iter().map(|x| ElementGeometry::new(Vec3::new(x, 0.0, 0.0))).collect()
    }

    fn acquisition(scan: &LinearScan) -> (Simulator, BeamformerData) {
        let sim = Simulator::new(GaussianPulse::default(), FS, 1200);
        let waves = vec![WaveData::plane(-0.1, 0.0), WaveData::plane(0.0, 0.0), WaveData::plane(0.1, 0.0)];
        let senders = vec![ElementGeometry::new(Vec3::ZERO)];
        let receivers = array(16);
        let rf = sim.simulate(&[PointScatterer::new(SCATTERER)], &senders, &receivers, &waves).unwrap();
        let data = BeamformerData::new(scan.points(), senders, receivers, waves, rf).unwrap();
        (sim, data)
    }

    fn scan() -> LinearScan {
        LinearScan::new(linspace(-0.004, 0.006, 11), linspace(0.008, 0.016, 17)).unwrap()
    }

    fn beamformer(sim: &Simulator, scan: &LinearScan) -> Beamformer {
        let kernel = Kernel::new(Arc::new(PlaneWavefront), Arc::new(sim.time_axis()))
            .with_apodization(Arc::new(ExpandingAperture::new(Window::hanning(), 0.5)));
        Beamformer::for_scan(kernel, scan)
    }

    fn peak(image: &Tensor) -> (usize, usize) {
        let shape = image.shape().to_vec();
        let envelope = image.abs().to_real_vec().unwrap();
        let i = envelope
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0;
        (i / shape[1], i % shape[1])
    }

    #[test]
    fn test_spec_of_data() {
        let scan = scan();
        let (_, data) = acquisition(&scan);
        let spec = data.spec();
        assert_eq!(spec.field(SENDER), Some(Spec::scalar()));
        assert_eq!(spec.field(SIGNAL), Some(Spec::dims([TRANSMITS, RECEIVERS])));
        assert!(spec.validate(&data.args().unwrap()).is_ok());
    }

    #[test]
    fn test_peak_at_scatterer() {
        let scan = scan();
        let (sim, data) = acquisition(&scan);
        let image = beamformer(&sim, &scan).run(&Sequential, &data).unwrap();
        assert_eq!(image.shape(), &[11, 17]);
        // x = 0.002 is column 6 of the lateral axis, z = 0.012 is row 8 in depth.
        assert_eq!(peak(&image), (6, 8));
    }

    #[test]
    fn test_folded_matches_vectorized() {
        let scan = scan();
        let (sim, data) = acquisition(&scan);
        let vectorized = beamformer(&sim, &scan).run(&Sequential, &data).unwrap();
        let folded = beamformer(&sim, &scan)
            .with_summation(Summation::Folded, Summation::Folded)
            .with_jit(true)
            .run(&Sequential, &data)
            .unwrap();
        let (a, b) = (vectorized.to_real_vec().unwrap(), folded.to_real_vec().unwrap());
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_output_spec_names_image_dimensions() {
        let scan = scan();
        let (sim, data) = acquisition(&scan);
        let f = beamformer(&sim, &scan)
            .with_summation(Summation::Vectorized, Summation::Folded)
            .build(&data.spec())
            .unwrap();
        assert_eq!(f.output_spec, Some(Spec::dims(["width", "height"])));
    }

    #[test]
    fn test_point_count_must_match_image() {
        let scan = scan();
        let (sim, data) = acquisition(&scan);
        let mut bf = beamformer(&sim, &scan);
        bf.image_shape = vec![3, 3];
        assert!(bf.run(&Sequential, &data).is_err());
    }

    #[test]
    fn test_signal_shape_is_checked() {
        let senders = vec![ElementGeometry::new(Vec3::ZERO)];
        let err = BeamformerData::new(
            vec![Vec3::Z],
            senders,
            array(4),
            vec![WaveData::plane(0.0, 0.0)],
            Tensor::zeros(&[1, 3, 10]),
        )
        .unwrap_err();
        assert!(matches!(err, BeamError::Precondition(PreconditionError::InvalidGeometry(_))));
    }
}
