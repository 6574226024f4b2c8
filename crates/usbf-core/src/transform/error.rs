//! Pipeline diagnostics

use std::fmt;

use crate::types::BeamError;

/// An `Axis("name")` placeholder could not be resolved against the spec at
/// that point in the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Could not find dimension \"{dimension}\" in the spec.")]
pub struct AxisConcretizationError {
    pub dimension: String,
}

impl AxisConcretizationError {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self { dimension: dimension.into() }
    }
}

/// An error raised while building or calling a transformed function.
///
/// Holds the original error, the labels of every step in the composed
/// pipeline (innermost function first) and the index of the step that raised.
/// Rewrapping at an outer layer replaces the step labels but keeps the failing
/// step index and the original error.
#[derive(Debug, Clone)]
pub struct TransformedFunctionError {
    error: Box<BeamError>,
    steps: Vec<String>,
    failing_step: usize,
}

impl TransformedFunctionError {
    pub fn new(error: BeamError, steps: Vec<String>, failing_step: usize) -> Self {
        Self { error: Box::new(error), steps, failing_step }
    }

    /// The error raised by the failing step.
    pub fn original(&self) -> &BeamError {
        &self.error
    }

    pub fn into_original(self) -> BeamError {
        *self.error
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn failing_step(&self) -> usize {
        self.failing_step
    }

    pub fn failing_step_label(&self) -> Option<&str> {
        self.steps.get(self.failing_step).map(String::as_str)
    }

    /// Same error and failing step, attributed to a different (enclosing) pipeline.
    pub(crate) fn with_steps(self, steps: Vec<String>) -> Self {
        Self { steps, ..self }
    }
}

impl fmt::Display for TransformedFunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.error)?;
        writeln!(f, "TransformedFunction(")?;
        writeln!(f, "  <compose(")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i == self.failing_step {
                writeln!(f, "⚠   {},", step)?;
                writeln!(
                    f,
                    "⚠     ↳ This step raised {}({:?})",
                    self.error.kind(),
                    self.error.to_string()
                )?;
            } else {
                writeln!(f, "    {},", step)?;
            }
        }
        writeln!(f, "  )>")?;
        write!(f, ")")
    }
}

impl std::error::Error for TransformedFunctionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}
