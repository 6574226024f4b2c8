//! # Ultrasound Delay-and-Sum Beamforming
//!
//! This crate reconstructs ultrasound images from recorded channel data by
//! delay-and-sum beamforming. It is built around one small function, the
//! [`Kernel`], that computes the delayed and weighted signal for a single
//! image point, receiving element and transmitted wave. Datacube
//! dimensions (points, receivers, transmits) are added around it by
//! composable transformations instead of loops.
//!
//! ## Overview
//!
//! - **Tensors and trees**: [`Tensor`] holds real or complex arrays and
//!   [`Tree`] holds named, nested arguments
//! - **Specs**: a [`Spec`] names the dimensions of every argument so that
//!   transformations know which axis to map over
//! - **Transformations**: [`ForAll`], [`Reduce`], [`Apply`] and [`Wrap`]
//!   lift a function over named dimensions
//! - **Backends**: a [`Backend`] supplies vectorized map, scan and jit
//! - **Models**: transmitted wavefronts, interpolation, apodization,
//!   speed of sound and windows
//! - **Scans**: Cartesian [`LinearScan`] and polar [`SectorScan`] grids
//!
//! ## Signal Flow
//!
//! ```text
//! kernel(sender, point, receiver, wave, signal) → scalar
//!   → ForAll(points) → ForAll/Reduce(receivers) → ForAll/Reduce(transmits)
//!   → Apply(sum) → Apply(unflatten points → width × height) → image
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use usbf_core::prelude::*;
//!
//! let simulator = Simulator::new(GaussianPulse::default(), 40e6, 1200);
//! let receivers: Vec<ElementGeometry> = (0..16)
//!     .map(|i| ElementGeometry::new(Vec3::new(-0.006 + 0.0008 * i as f64, 0.0, 0.0)))
//!     .collect();
//! let senders = vec![ElementGeometry::new(Vec3::ZERO)];
//! let waves = vec![WaveData::plane(0.0, 0.0)];
//! let scatterers = [PointScatterer::new(Vec3::new(0.0, 0.0, 0.012))];
//! let signal = simulator.simulate(&scatterers, &senders, &receivers, &waves).unwrap();
//!
//! let scan = LinearScan::new(linspace(-0.004, 0.004, 33), linspace(0.008, 0.016, 65)).unwrap();
//! let kernel = Kernel::new(Arc::new(PlaneWavefront), Arc::new(simulator.time_axis()));
//! let data = BeamformerData::new(scan.points(), senders, receivers, waves, signal).unwrap();
//! let image = Beamformer::for_scan(kernel, &scan).run(&Sequential, &data).unwrap();
//! assert_eq!(image.shape(), &[33, 65]);
//! ```

pub mod aperture;
pub mod apodization;
pub mod backend;
pub mod beamformer;
pub mod config;
pub mod element;
pub mod geometry;
pub mod interpolation;
pub mod kernel;
pub mod observe;
pub mod scan;
pub mod simulate;
pub mod spec;
pub mod speed_of_sound;
pub mod tensor;
pub mod traceable;
pub mod transform;
pub mod tree;
pub mod types;
pub mod wavefront;
pub mod window;

pub use backend::{Backend, BackendKind, Sequential};
#[cfg(feature = "parallel")]
pub use backend::Parallel;
pub use beamformer::{Beamformer, BeamformerData, Summation};
pub use config::{BeamformerConfig, ConfigError};
pub use kernel::Kernel;
pub use scan::{LinearScan, Scan, SectorScan};
pub use spec::{Spec, SpecError};
pub use tensor::{Tensor, TensorError};
pub use traceable::Traceable;
pub use transform::{Apply, ForAll, Reduce, TransformedFunction, Wrap};
pub use tree::{Args, Tree};
pub use types::{BeamError, BeamResult, Complex, PreconditionError, Vec3};
pub use window::Window;

/// Prelude for common imports
pub mod prelude {
    pub use crate::apodization::{Apodization, ExpandingAperture};
    pub use crate::backend::{Backend, Sequential};
    pub use crate::beamformer::{Beamformer, BeamformerData};
    pub use crate::element::{ElementGeometry, WaveData};
    pub use crate::interpolation::{FastInterpLinspace, InterpolationSpace1D};
    pub use crate::kernel::Kernel;
    pub use crate::scan::{linspace, LinearScan, Scan, SectorScan};
    pub use crate::simulate::{GaussianPulse, PointScatterer, Simulator};
    pub use crate::tensor::Tensor;
    pub use crate::types::{BeamResult, Vec3};
    pub use crate::wavefront::{PlaneWavefront, TransmittedWavefront};
    pub use crate::window::Window;
}
