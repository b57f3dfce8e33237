//! Parameters structure for WandCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for wand control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Frequency at which the encoders are sampled and the amplifiers driven.
    ///
    /// Units: hertz
    pub frequency_hz: f64,

    /// Duration of the samples the encoder reader may buffer.
    ///
    /// Units: seconds
    pub buffer_duration_s: f64,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("The sampling frequency must be positive, got {0} Hz")]
    InvalidFrequency(f64),

    #[error("The encoder reader must buffer at least one sample")]
    EmptyBuffer,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            frequency_hz: 1000.0,
            buffer_duration_s: 0.1,
        }
    }
}

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(ParamsError::InvalidFrequency(self.frequency_hz));
        }

        if self.samples_in_buffer() == 0 {
            return Err(ParamsError::EmptyBuffer);
        }

        Ok(())
    }

    /// Sampling period.
    ///
    /// Units: seconds
    pub fn period_s(&self) -> f64 {
        1.0 / self.frequency_hz
    }

    /// Number of samples the encoder reader may buffer.
    pub fn samples_in_buffer(&self) -> u32 {
        let samples = (self.buffer_duration_s * self.frequency_hz).round();
        if samples.is_finite() && samples > 0.0 {
            samples as u32
        } else {
            0
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
