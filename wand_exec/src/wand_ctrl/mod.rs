//! Wand control module
//!
//! Owns the wand hardware and drives it through its lifecycle:
//!
//! - Calibration: the operator places the wand in its calibration pose and the encoder origin
//!   is reset
//! - Start: the encoder reader is created, the amplifiers enabled and the reader started
//! - Run: each encoder sample is turned into drive voltages by the force pipeline
//! - Stop: the reader is stopped, the amplifiers disabled and zero volts commanded
//!
//! Whichever way the run ends the wand is left with its amplifiers disabled.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use crate::force_ctrl::ForceCtrlError;
use crate::kinematics::GeometryError;
use hil_if::HilError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during WandCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum WandCtrlError {
    #[error("Invalid wand control parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("Cannot {op} the wand while it is {state:?}")]
    InvalidState { op: &'static str, state: CtrlState },

    #[error("The operator declined the calibration")]
    CalibrationDeclined,

    #[error("Failed to calibrate the wand: {0}")]
    Calibration(HilError),

    #[error("Failed to start the wand: {0}")]
    Start(HilError),

    #[error("Failed to read the joint encoders: {0}")]
    Read(HilError),

    #[error("Invalid wand geometry: {0}")]
    Geometry(GeometryError),

    #[error("Force control error: {0}")]
    ForceCtrl(ForceCtrlError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl From<ForceCtrlError> for WandCtrlError {
    fn from(e: ForceCtrlError) -> Self {
        match e {
            ForceCtrlError::Geometry(g) => WandCtrlError::Geometry(g),
            e => WandCtrlError::ForceCtrl(e),
        }
    }
}
