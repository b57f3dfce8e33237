//! # Haptic wand library.
//!
//! This library allows other crates in the workspace, the tests and the benchmarks to access the
//! items defined inside the wand crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Kinematics - maps encoder counts to joint angles and joint angles to the task space pose
pub mod kinematics;

/// Force kinematics - maps task space forces to joint torques through the Jacobian
pub mod force_kin;

/// Current limiter - keeps the motor currents within their thermal limits
pub mod current_limiter;

/// Force control module - converts joint torques into amplifier drive voltages
pub mod force_ctrl;

/// Force laws - provide the force the wand shall render at a given pose
pub mod force_law;

/// Wand control - drives the calibration, sampling loop and shutdown of the wand
pub mod wand_ctrl;

/// Executable parameters
pub mod params;
