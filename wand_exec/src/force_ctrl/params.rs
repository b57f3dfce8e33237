//! Parameters structure for ForceCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use crate::current_limiter::{self, LimiterClassParams};
use crate::kinematics::LinkGeometry;
use hil_if::NUM_JOINTS;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Torque constant of the small motors.
///
/// Units: newton meters/amp
pub const KT_SMALL_NM_A: f64 = 52.5e-3;

/// Torque constant of the large motors.
///
/// Units: newton meters/amp
pub const KT_LARGE_NM_A: f64 = 191e-3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Class of motor driving a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorClass {
    Small,
    Large,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("The link lengths must all be positive")]
    InvalidGeometry,

    #[error("The torque constant of joint {0} must be positive")]
    InvalidTorqueConstant(usize),

    #[error("The voltage sign of joint {0} must be +1 or -1")]
    InvalidVoltageSign(usize),

    #[error("The {class:?} motor limits are invalid: {source}")]
    InvalidLimits {
        class: MotorClass,
        source: current_limiter::ParamsError,
    },
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for force control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- GEOMETRY ----
    pub geometry: LinkGeometry,

    // ---- MOTORS ----

    /// Class of the motor driving each joint.
    pub motor_classes: [MotorClass; NUM_JOINTS],

    /// Torque constant of each joint motor.
    ///
    /// Units: newton meters/amp
    pub torque_constants_nm_a: [f64; NUM_JOINTS],

    /// Limits of the small motors.
    pub small_motor: LimiterClassParams,

    /// Limits of the large motors.
    pub large_motor: LimiterClassParams,

    // ---- AMPLIFIERS ----

    /// Gain of the drive voltage on the amplifier current.
    ///
    /// Units: volts/amp
    pub volts_per_amp: f64,

    /// Direction of each amplifier relative to its joint.
    pub voltage_signs: [f64; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            geometry: LinkGeometry::default(),
            motor_classes: [
                MotorClass::Small,
                MotorClass::Small,
                MotorClass::Small,
                MotorClass::Small,
                MotorClass::Large,
                MotorClass::Large,
            ],
            torque_constants_nm_a: [
                KT_SMALL_NM_A,
                KT_SMALL_NM_A,
                KT_SMALL_NM_A,
                KT_SMALL_NM_A,
                KT_LARGE_NM_A,
                KT_LARGE_NM_A,
            ],
            small_motor: LimiterClassParams::SMALL_MOTOR,
            large_motor: LimiterClassParams::LARGE_MOTOR,
            volts_per_amp: 0.5,
            voltage_signs: [1.0, 1.0, -1.0, -1.0, 1.0, 1.0],
        }
    }
}

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !self.geometry.is_valid() {
            return Err(ParamsError::InvalidGeometry);
        }

        for (i, kt) in self.torque_constants_nm_a.iter().enumerate() {
            if !(kt.is_finite() && *kt > 0.0) {
                return Err(ParamsError::InvalidTorqueConstant(i));
            }
        }

        for (i, s) in self.voltage_signs.iter().enumerate() {
            if s.abs() != 1.0 {
                return Err(ParamsError::InvalidVoltageSign(i));
            }
        }

        self.small_motor
            .are_valid()
            .map_err(|source| ParamsError::InvalidLimits {
                class: MotorClass::Small,
                source,
            })?;
        self.large_motor
            .are_valid()
            .map_err(|source| ParamsError::InvalidLimits {
                class: MotorClass::Large,
                source,
            })?;

        Ok(())
    }

    /// Limits of the motor of each joint.
    pub fn limiter_classes(&self) -> [LimiterClassParams; NUM_JOINTS] {
        let mut classes = [self.small_motor; NUM_JOINTS];
        for (c, m) in classes.iter_mut().zip(self.motor_classes.iter()) {
            *c = match m {
                MotorClass::Small => self.small_motor,
                MotorClass::Large => self.large_motor,
            };
        }
        classes
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = Params::default();
        assert!(params.are_valid().is_ok());

        let classes = params.limiter_classes();
        assert_eq!(classes[3], LimiterClassParams::SMALL_MOTOR);
        assert_eq!(classes[4], LimiterClassParams::LARGE_MOTOR);
    }

    #[test]
    fn test_invalid_params() {
        let mut params = Params::default();
        params.voltage_signs[2] = 0.5;
        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::InvalidVoltageSign(2))
        ));

        let mut params = Params::default();
        params.large_motor.peak_limit_a = 1.0;
        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::InvalidLimits {
                class: MotorClass::Large,
                ..
            })
        ));
    }

    #[test]
    fn test_load_from_toml() {
        let params: Params = util::params::from_str(
            r#"
            volts_per_amp = 0.25
            motor_classes = ["small", "small", "small", "small", "small", "large"]

            [large_motor]
            peak_limit_a = 4.0
            sustained_limit_a = 1.5
            peak_timeout_s = 0.1
            cooldown_timeout_s = 5.0
            "#,
        )
        .unwrap();

        assert_eq!(params.volts_per_amp, 0.25);
        assert_eq!(params.motor_classes[4], MotorClass::Small);
        assert_eq!(params.large_motor.peak_limit_a, 4.0);
        assert_eq!(params.small_motor, LimiterClassParams::SMALL_MOTOR);
        assert!(params.are_valid().is_ok());
    }
}
