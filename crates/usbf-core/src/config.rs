//! # Configuration
//!
//! YAML configuration for beamforming runs: which backend executes the
//! pipeline, and which interpolation, apodization, wavefront and speed of
//! sound models the kernel uses. Every section is optional and falls back to
//! its defaults.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `USBF_CONFIG` environment variable
//! 2. `./usbf.yaml` (current directory)
//! 3. `~/.config/usbf/config.yaml` (user config)
//! 4. `/etc/usbf/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! backend:
//!   kind: parallel
//!   transmits: folded
//!
//! interpolation:
//!   kind: linear
//!   edge: nearest
//!
//! apodization:
//!   window:
//!     kind: tukey
//!     roll: 0.5
//!   f_number: 1.5
//!
//! wavefront:
//!   model: hybrid
//!   plane_wave_region_size: 0.004
//!
//! speed_of_sound:
//!   value: 1480.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::apodization::{Apodization, ExpandingAperture};
use crate::backend::{Backend, BackendKind};
use crate::beamformer::{Beamformer, Summation};
use crate::interpolation::{EdgeHandling, FastInterpLinspace, InterpolationSpace1D, NearestInterpolation};
use crate::kernel::Kernel;
use crate::observe::LogConfig;
use crate::scan::Scan;
use crate::speed_of_sound::{ConstantSpeedOfSound, LayeredSpeedOfSound, SpeedOfSound};
use crate::types::BeamResult;
use crate::wavefront::{
    FocusedBlendedWavefront, FocusedHybridWavefront, FocusedSphericalWavefront, HybridTransition, PlaneWavefront,
    STAIWavefront, TransmittedWavefront,
};
use crate::window::Window;

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    ReadError(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Execution backend and how element dimensions are summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub receivers: Summation,
    pub transmits: Summation,
    pub jit: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Sequential,
            receivers: Summation::Vectorized,
            transmits: Summation::Folded,
            jit: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    #[default]
    Linear,
    Nearest,
}

/// What a delayed sample outside the recorded signal evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    /// `fill_value`
    #[default]
    Value,
    /// The first or last sample
    Nearest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    pub kind: InterpolationKind,
    pub edge: EdgeMode,
    pub fill_value: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self { kind: InterpolationKind::Linear, edge: EdgeMode::Value, fill_value: 0.0 }
    }
}

/// Receive apodization: an expanding aperture with the given window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApodizationConfig {
    pub window: Window,
    pub f_number: f64,
    pub elevation_f_number: Option<f64>,
    pub minimum_aperture: Option<f64>,
    pub maximum_aperture: Option<f64>,
}

impl Default for ApodizationConfig {
    fn default() -> Self {
        Self {
            window: Window::hanning(),
            f_number: 1.5,
            elevation_f_number: None,
            minimum_aperture: None,
            maximum_aperture: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavefrontModel {
    #[default]
    Plane,
    Spherical,
    Hybrid,
    Blended,
    Stai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WavefrontConfig {
    pub model: WavefrontModel,
    /// Depth extent of the plane-wave region of the hybrid model, in meters
    pub plane_wave_region_size: f64,
    pub hybrid_transition: HybridTransition,
    pub blending_power: f64,
}

impl Default for WavefrontConfig {
    fn default() -> Self {
        let hybrid = FocusedHybridWavefront::default();
        Self {
            model: WavefrontModel::Plane,
            plane_wave_region_size: hybrid.plane_wave_region_size,
            hybrid_transition: hybrid.transition,
            blending_power: FocusedBlendedWavefront::default().blending_power,
        }
    }
}

/// Layered medium: one more speed than boundary depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayersConfig {
    pub boundaries: Vec<f64>,
    pub speeds: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedOfSoundConfig {
    /// Speed in m/s when no layers are given
    pub value: f64,
    pub layers: Option<LayersConfig>,
}

impl Default for SpeedOfSoundConfig {
    fn default() -> Self {
        Self { value: ConstantSpeedOfSound::default().0, layers: None }
    }
}

/// Complete beamforming configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamformerConfig {
    pub version: String,
    pub logging: LogConfig,
    pub backend: BackendConfig,
    pub interpolation: InterpolationConfig,
    pub apodization: ApodizationConfig,
    pub wavefront: WavefrontConfig,
    pub speed_of_sound: SpeedOfSoundConfig,
    /// Demodulation frequency of IQ data in Hz; absent for RF data
    pub modulation_frequency: Option<f64>,
}

impl Default for BeamformerConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            logging: LogConfig::default(),
            backend: BackendConfig::default(),
            interpolation: InterpolationConfig::default(),
            apodization: ApodizationConfig::default(),
            wavefront: WavefrontConfig::default(),
            speed_of_sound: SpeedOfSoundConfig::default(),
            modulation_frequency: None,
        }
    }
}

impl BeamformerConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("USBF_CONFIG") {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
            tracing::warn!(path = %path, "USBF_CONFIG points to a missing file");
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&content)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./usbf.yaml")];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "usbf") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/usbf/config.yaml"));
        paths
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        self.window().validate().map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if !(self.apodization.f_number > 0.0) {
            return invalid("apodization.f_number must be positive".to_string());
        }
        if let Some(f) = self.apodization.elevation_f_number {
            if !(f > 0.0) {
                return invalid("apodization.elevation_f_number must be positive".to_string());
            }
        }
        if self.interpolation.kind == InterpolationKind::Nearest && self.interpolation.edge == EdgeMode::Nearest {
            return invalid("nearest interpolation only supports `edge: value`".to_string());
        }
        if self.wavefront.plane_wave_region_size < 0.0 {
            return invalid("wavefront.plane_wave_region_size must not be negative".to_string());
        }
        if !(self.speed_of_sound.value > 0.0) {
            return invalid("speed_of_sound.value must be positive".to_string());
        }
        self.speed_of_sound().map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if let Some(f) = self.modulation_frequency {
            if !(f >= 0.0) {
                return invalid("modulation_frequency must not be negative".to_string());
            }
        }
        Ok(())
    }

    /// Example configuration YAML, with every section filled in.
    pub fn example_yaml() -> String {
        let config = Self {
            backend: BackendConfig { kind: BackendKind::Parallel, ..Default::default() },
            apodization: ApodizationConfig { window: Window::tukey50(), maximum_aperture: Some(0.02), ..Default::default() },
            wavefront: WavefrontConfig { model: WavefrontModel::Hybrid, ..Default::default() },
            speed_of_sound: SpeedOfSoundConfig {
                layers: Some(LayersConfig { boundaries: vec![0.005], speeds: vec![1450.0, 1540.0] }),
                ..Default::default()
            },
            ..Default::default()
        };
        serde_yaml::to_string(&config).unwrap_or_default()
    }

    pub fn window(&self) -> Window {
        self.apodization.window
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.kind.create()
    }

    /// Interpolation over a uniformly sampled time axis.
    pub fn interpolation(&self, start_time: f64, sampling_period: f64, num_samples: usize) -> Arc<dyn InterpolationSpace1D> {
        let fill = self.interpolation.fill_value;
        match self.interpolation.kind {
            InterpolationKind::Linear => {
                let edge = match self.interpolation.edge {
                    EdgeMode::Value => EdgeHandling::value(fill),
                    EdgeMode::Nearest => EdgeHandling::Nearest,
                };
                Arc::new(FastInterpLinspace::new(start_time, sampling_period, num_samples).with_edge(edge))
            }
            InterpolationKind::Nearest => {
                Arc::new(NearestInterpolation::new(start_time, sampling_period, num_samples).with_fill(fill, fill))
            }
        }
    }

    pub fn wavefront(&self) -> Arc<dyn TransmittedWavefront> {
        match self.wavefront.model {
            WavefrontModel::Plane => Arc::new(PlaneWavefront),
            WavefrontModel::Spherical => Arc::new(FocusedSphericalWavefront),
            WavefrontModel::Hybrid => Arc::new(FocusedHybridWavefront::new(
                self.wavefront.plane_wave_region_size,
                self.wavefront.hybrid_transition,
            )),
            WavefrontModel::Blended => Arc::new(FocusedBlendedWavefront { blending_power: self.wavefront.blending_power }),
            WavefrontModel::Stai => Arc::new(STAIWavefront),
        }
    }

    pub fn apodization(&self) -> Arc<dyn Apodization> {
        let a = &self.apodization;
        let mut aperture = ExpandingAperture::new(a.window, a.f_number)
            .with_aperture_limits(a.minimum_aperture, a.maximum_aperture);
        if let Some(f) = a.elevation_f_number {
            aperture = aperture.with_elevation_f_number(f);
        }
        Arc::new(aperture)
    }

    pub fn speed_of_sound(&self) -> BeamResult<Arc<dyn SpeedOfSound>> {
        Ok(match &self.speed_of_sound.layers {
            Some(layers) => Arc::new(LayeredSpeedOfSound::new(layers.boundaries.clone(), layers.speeds.clone())?),
            None => Arc::new(ConstantSpeedOfSound(self.speed_of_sound.value)),
        })
    }

    /// The kernel described by this configuration, for a signal sampled
    /// `num_samples` times every `sampling_period` seconds from `start_time`.
    pub fn kernel(&self, start_time: f64, sampling_period: f64, num_samples: usize) -> BeamResult<Kernel> {
        let mut kernel = Kernel::new(self.wavefront(), self.interpolation(start_time, sampling_period, num_samples))
            .with_speed_of_sound(self.speed_of_sound()?)
            .with_apodization(self.apodization());
        if let Some(f) = self.modulation_frequency {
            kernel = kernel.with_modulation_frequency(f);
        }
        Ok(kernel)
    }

    /// Install the global tracing subscriber described by the `logging`
    /// section. Does nothing if a global subscriber is already installed.
    pub fn init_logging(&self) {
        crate::observe::init_logging(&self.logging);
    }

    /// A beamformer for `scan` with this configuration's kernel and summation.
    pub fn beamformer(
        &self,
        scan: &dyn Scan,
        start_time: f64,
        sampling_period: f64,
        num_samples: usize,
    ) -> BeamResult<Beamformer> {
        let kernel = self.kernel(start_time, sampling_period, num_samples)?;
        Ok(Beamformer::for_scan(kernel, scan)
            .with_summation(self.backend.receivers, self.backend.transmits)
            .with_jit(self.backend.jit))
    }
}
