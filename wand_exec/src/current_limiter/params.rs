//! Parameters structure for the current limiter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limits of one class of motor.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LimiterClassParams {
    /// Current which may be drawn for up to `peak_timeout_s`.
    ///
    /// Units: amps
    pub peak_limit_a: f64,

    /// Current which may be drawn indefinitely.
    ///
    /// Units: amps
    pub sustained_limit_a: f64,

    /// Time the motor may spend above the sustained limit.
    ///
    /// Units: seconds
    pub peak_timeout_s: f64,

    /// Time the motor is held to the sustained limit after a peak.
    ///
    /// Units: seconds
    pub cooldown_timeout_s: f64,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("The {0} must be positive and finite")]
    NotPositive(&'static str),

    #[error("The peak limit ({peak} A) must exceed the sustained limit ({sustained} A)")]
    PeakBelowSustained { peak: f64, sustained: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LimiterClassParams {
    /// Limits of the motors driving the sub-chain joints (0 to 3).
    pub const SMALL_MOTOR: LimiterClassParams = LimiterClassParams {
        peak_limit_a: 7.00,
        sustained_limit_a: 2.15,
        peak_timeout_s: 0.2,
        cooldown_timeout_s: 10.0,
    };

    /// Limits of the motors driving the wrist joints (4 and 5).
    pub const LARGE_MOTOR: LimiterClassParams = LimiterClassParams {
        peak_limit_a: 5.00,
        sustained_limit_a: 1.69,
        peak_timeout_s: 0.2,
        cooldown_timeout_s: 10.0,
    };

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        let fields = [
            (self.peak_limit_a, "peak limit"),
            (self.sustained_limit_a, "sustained limit"),
            (self.peak_timeout_s, "peak timeout"),
            (self.cooldown_timeout_s, "cooldown timeout"),
        ];

        for (value, name) in fields.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(ParamsError::NotPositive(*name));
            }
        }

        if self.peak_limit_a <= self.sustained_limit_a {
            return Err(ParamsError::PeakBelowSustained {
                peak: self.peak_limit_a,
                sustained: self.sustained_limit_a,
            });
        }

        Ok(())
    }
}
