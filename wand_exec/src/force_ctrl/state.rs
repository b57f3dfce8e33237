//! Implementations for the ForceCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{ForceCtrlError, Params};
use crate::current_limiter::{Clamp, LimiterBank, LimiterState};
use crate::force_kin::{inverse_force_kinematics, TaskForce};
use crate::kinematics::{JointAngles, LinkGeometry};
use hil_if::{DriveVoltages, NUM_JOINTS};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Force control module state
#[derive(Default)]
pub struct ForceCtrl {
    pub(crate) params: Params,

    /// Current limiters of the joints, created on init and by [`ForceCtrl::reset_limiters`].
    limiters: Option<LimiterBank>,

    pub(crate) report: StatusReport,
}

/// Input data to force control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Current joint angles.
    pub angles: JointAngles,

    /// Task space force to render.
    pub force: TaskForce,

    /// Time since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Output of force control, the demands sent to the amplifiers and the intermediate values
/// leading to them.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OutputData {
    /// Joint torques rendering the demanded force.
    ///
    /// Units: newton meters
    pub torques_nm: [f64; NUM_JOINTS],

    /// Motor currents producing the joint torques.
    ///
    /// Units: amps
    pub currents_a: [f64; NUM_JOINTS],

    /// Motor currents after thermal limiting.
    ///
    /// Units: amps
    pub limited_currents_a: [f64; NUM_JOINTS],

    /// Amplifier drive voltages.
    ///
    /// Units: volts
    pub voltages: DriveVoltages,
}

/// Status report for ForceCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Limit applied to each joint current this cycle.
    pub clamps: [Clamp; NUM_JOINTS],

    /// State of each joint current limiter after this cycle.
    pub limiter_states: [LimiterState; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ForceCtrl {
    type InitData = Params;
    type InitError = ForceCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = ForceCtrlError;

    /// Initialise the ForceCtrl module.
    ///
    /// Expected init data is the force control parameters.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.are_valid()?;

        self.params = init_data;
        self.reset_limiters();

        Ok(())
    }

    /// Perform cyclic processing of force control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !(input_data.dt_s > 0.0) {
            return Err(ForceCtrlError::InvalidPeriod(input_data.dt_s));
        }

        // Clear the status report
        self.report = StatusReport::default();

        let torques = inverse_force_kinematics(
            &self.params.geometry,
            &input_data.angles,
            &input_data.force,
        )?;

        let mut output = OutputData::default();

        for i in 0..NUM_JOINTS {
            output.torques_nm[i] = torques[i];
            output.currents_a[i] = torques[i] / self.params.torque_constants_nm_a[i];
        }

        let classes = self.params.limiter_classes();
        let limiters = self
            .limiters
            .get_or_insert_with(|| LimiterBank::new(&classes));

        let (limited, clamps) = limiters.limit(&output.currents_a, input_data.dt_s);
        output.limited_currents_a = limited;

        for i in 0..NUM_JOINTS {
            output.voltages[i] =
                self.params.volts_per_amp * self.params.voltage_signs[i] * limited[i];
        }

        self.report.clamps = clamps;
        self.report.limiter_states = limiters.states();

        trace!(
            "ForceCtrl output:\n    torques: {:?}\n    currents: {:?}\n    voltages: {:?}",
            output.torques_nm,
            output.limited_currents_a,
            output.voltages
        );

        Ok((output, self.report))
    }
}

impl ForceCtrl {
    /// Replace the current limiters with a fresh bank, all joints in the `Normal` state.
    pub fn reset_limiters(&mut self) {
        self.limiters = Some(LimiterBank::new(&self.params.limiter_classes()));
    }

    /// Drop the current limiters, their state is lost.
    pub fn clear_limiters(&mut self) {
        self.limiters = None;
    }

    pub fn geometry(&self) -> &LinkGeometry {
        &self.params.geometry
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::force_kin::compute_jacobian;
    use crate::kinematics::CALIBRATION_ANGLES_RAD;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn force_ctrl() -> ForceCtrl {
        let mut fc = ForceCtrl::default();
        fc.init(Params::default()).unwrap();
        fc
    }

    fn calib() -> JointAngles {
        JointAngles::from_column_slice(&CALIBRATION_ANGLES_RAD)
    }

    #[test]
    fn test_zero_force_gives_zero_voltage() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            // Fresh limiters for every configuration
            let mut fc = force_ctrl();
            let angles = calib() + JointAngles::from_fn(|_, _| rng.gen_range(-0.3..0.3));

            let (output, report) = fc
                .proc(&InputData {
                    angles,
                    force: TaskForce::zeros(),
                    dt_s: 0.001,
                })
                .unwrap();

            for i in 0..NUM_JOINTS {
                assert_eq!(output.voltages[i], 0.0);
            }
            assert_eq!(report.clamps, [Clamp::None; NUM_JOINTS]);
            assert_eq!(report.limiter_states, [LimiterState::Normal; NUM_JOINTS]);
        }
    }

    #[test]
    fn test_voltage_chain() {
        let mut fc = force_ctrl();
        let force = TaskForce::new(0.5, -0.2, 0.1, 0.01, -0.02);

        let (output, _) = fc
            .proc(&InputData {
                angles: calib(),
                force,
                dt_s: 0.001,
            })
            .unwrap();

        let jac = compute_jacobian(fc.geometry(), &calib()).unwrap();
        let torques = jac.transpose() * force;
        let signs = [1.0, 1.0, -1.0, -1.0, 1.0, 1.0];
        let kt = Params::default().torque_constants_nm_a;

        for i in 0..NUM_JOINTS {
            assert!((output.torques_nm[i] - torques[i]).abs() < 1e-12);

            // Small forces stay within the sustained limits
            assert_eq!(output.limited_currents_a[i], output.currents_a[i]);
            let expected = 0.5 * signs[i] * torques[i] / kt[i];
            assert!((output.voltages[i] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_large_force_is_limited() {
        let mut fc = force_ctrl();
        let (output, report) = fc
            .proc(&InputData {
                angles: calib(),
                force: TaskForce::new(0.0, 1000.0, 0.0, 0.0, 0.0),
                dt_s: 0.001,
            })
            .unwrap();

        for i in 0..4 {
            assert!(output.limited_currents_a[i].abs() <= 7.0);
            if output.currents_a[i].abs() > 7.0 {
                assert_eq!(report.clamps[i], Clamp::Peak);
                assert!((output.voltages[i].abs() - 3.5).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_reset_limiters() {
        let mut fc = force_ctrl();
        let input = InputData {
            angles: calib(),
            force: TaskForce::new(0.0, 1000.0, 0.0, 0.0, 0.0),
            dt_s: 0.001,
        };

        let (_, report) = fc.proc(&input).unwrap();
        assert!(report
            .limiter_states
            .iter()
            .any(|s| *s == LimiterState::PeakTiming));

        fc.reset_limiters();
        let (_, report) = fc
            .proc(&InputData {
                force: TaskForce::zeros(),
                ..input
            })
            .unwrap();
        assert_eq!(report.limiter_states, [LimiterState::Normal; NUM_JOINTS]);
    }

    #[test]
    fn test_invalid_period() {
        let mut fc = force_ctrl();
        let r = fc.proc(&InputData {
            angles: calib(),
            force: TaskForce::zeros(),
            dt_s: 0.0,
        });
        assert!(matches!(r, Err(ForceCtrlError::InvalidPeriod(_))));
    }
}
