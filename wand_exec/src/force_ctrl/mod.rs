//! Force control module
//!
//! Converts the task space force demanded of the wand into the drive voltages of the joint
//! current amplifiers. Each cycle:
//!
//! - Computes the joint torques rendering the force, `J^T * F`
//! - Converts the torques into motor currents through the torque constants
//! - Limits the currents to the thermal limits of the motors
//! - Converts the limited currents into amplifier drive voltages

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

use crate::kinematics::GeometryError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ForceCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ForceCtrlError {
    #[error("Invalid force control parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("Cannot compute the joint torques: {0}")]
    Geometry(#[from] GeometryError),

    #[error("The sampling period must be positive, got {0} s")]
    InvalidPeriod(f64),
}
