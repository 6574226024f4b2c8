//! # Observability
//!
//! Structured logging via `tracing`. Pipeline construction logs each built
//! step at `debug`, vectorized and folded loops log at `trace`, and a
//! beamformer run logs its problem size at `info`.
//!
//! ```rust,ignore
//! use usbf_core::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development());
//! tracing::info!(points = 4096, "beamforming");
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
