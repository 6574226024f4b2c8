//! Apodization Windows
//!
//! A window maps a ratio to a weight. The peak is at ratio 0 and the taper
//! reaches its edge at |ratio| = 0.5; every window except [`Window::NoWindow`]
//! is zero beyond that.
//!
//! | Window      | Shape inside the support              |
//! |-------------|---------------------------------------|
//! | Rectangular | 1                                     |
//! | Hanning     | a0 + a1·cos(2πr), a0 = a1 = 0.5       |
//! | Hamming     | Hanning with (0.53836, 0.46164)       |
//! | Tukey(α)    | flat top, cosine taper of width α/2   |
//! | Bartlett    | 1 − 2|r|                              |
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::window::Window;
//!
//! let w = Window::Bartlett;
//! assert_eq!(w.weight(0.0), 1.0);
//! assert_eq!(w.weight(0.5), 0.0);
//! assert_eq!(w.weight(0.7), 0.0);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::types::{BeamResult, PreconditionError};

/// Window function type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Window {
    /// Weight 1 everywhere, including outside the support
    #[serde(rename = "none")]
    NoWindow,
    Rectangular,
    /// Generalized cosine window a0 + a1·cos(2πr)
    Hanning { a0: f64, a1: f64 },
    Hamming,
    /// Tapered cosine window; `roll` is the tapered fraction in (0, 1]
    Tukey { roll: f64 },
    Bartlett,
}

impl Default for Window {
    fn default() -> Self {
        Window::hanning()
    }
}

fn within_support(ratio: f64) -> bool {
    (-0.5..=0.5).contains(&ratio)
}

impl Window {
    pub const fn hanning() -> Self {
        Window::Hanning { a0: 0.5, a1: 0.5 }
    }

    pub const fn tukey25() -> Self {
        Window::Tukey { roll: 0.25 }
    }

    pub const fn tukey50() -> Self {
        Window::Tukey { roll: 0.5 }
    }

    pub const fn tukey75() -> Self {
        Window::Tukey { roll: 0.75 }
    }

    pub const fn tukey80() -> Self {
        Window::Tukey { roll: 0.8 }
    }

    /// Weight for `ratio`.
    pub fn weight(&self, ratio: f64) -> f64 {
        match *self {
            Window::NoWindow => 1.0,
            Window::Rectangular => {
                if within_support(ratio) {
                    1.0
                } else {
                    0.0
                }
            }
            Window::Hanning { a0, a1 } => {
                if within_support(ratio) {
                    a0 + a1 * (2.0 * PI * ratio).cos()
                } else {
                    0.0
                }
            }
            Window::Hamming => Window::Hanning { a0: 0.53836, a1: 0.46164 }.weight(ratio),
            Window::Tukey { roll } => {
                let r = ratio.abs();
                if r <= 0.5 * (1.0 - roll) {
                    1.0
                } else if r < 0.5 {
                    0.5 * (1.0 + (2.0 * PI / roll * (r - roll / 2.0 - 0.5)).cos())
                } else {
                    0.0
                }
            }
            Window::Bartlett => {
                let r = ratio.abs();
                if within_support(r) {
                    (0.5 - r) * 2.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Check parameters. Tukey needs a roll in (0, 1].
    pub fn validate(&self) -> BeamResult<()> {
        match *self {
            Window::Tukey { roll } if !(roll > 0.0 && roll <= 1.0) => {
                Err(PreconditionError::InvalidWindow(format!("Tukey roll must be in (0, 1], got {roll}")).into())
            }
            Window::Hanning { a0, a1 } if !(a0.is_finite() && a1.is_finite()) => {
                Err(PreconditionError::InvalidWindow("Hanning coefficients must be finite".into()).into())
            }
            _ => Ok(()),
        }
    }
}
