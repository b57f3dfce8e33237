//! Implementations for the WandCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

// Internal
use super::{Params, WandCtrlError};
use crate::current_limiter::Clamp;
use crate::force_ctrl::{self, ForceCtrl, InputData};
use crate::force_law::ForceLaw;
use crate::kinematics::{encoder_counts_to_joint_angles, forward_kinematics, NUM_TASK_DOF};
use hil_if::{
    EncoderCounts, HilError, WandHardware, AMPS_DISABLED, AMPS_ENABLED, CALIBRATION_COUNTS,
    NUM_JOINTS, ZERO_VOLTAGES,
};
use util::module::State;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Lifecycle state of the wand controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CtrlState {
    /// The encoder origin has not been set.
    Uncalibrated,

    /// The encoder origin is set, the amplifiers are disabled.
    Calibrated,

    /// The sampling loop may run, the amplifiers are enabled.
    Running,

    /// The controller has been torn down, the amplifiers are disabled.
    Stopped,
}

/// The reason a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopCause {
    /// The stop flag was set.
    StopRequested,

    /// The encoder reader produced no further samples.
    EndOfSamples,

    /// Reading the encoders failed.
    ReadFailed,

    /// The joint angles had no valid kinematic solution.
    GeometryFault,

    /// Force control failed for another reason.
    ForceCtrlFault,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The wand controller, owning the wand hardware.
pub struct WandCtrl<H: WandHardware> {
    hw: H,

    params: Params,

    force_ctrl: ForceCtrl,

    state: CtrlState,
}

/// Summary of a run of the sampling loop.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Number of samples fully processed.
    pub ticks: u64,

    /// Number of drive voltage writes which failed.
    pub write_failures: u64,

    /// Driver code of the most recent failed write.
    pub last_write_error_code: Option<i32>,

    /// Number of ticks whose processing took longer than the sampling period.
    pub cycle_overruns: u64,

    pub stop_cause: StopCause,

    /// Number of ticks on which each joint current was saturated to its peak limit.
    pub peak_limited_ticks: [u64; NUM_JOINTS],

    /// Number of ticks on which each joint current was saturated to its sustained limit.
    pub sustained_limited_ticks: [u64; NUM_JOINTS],

    /// Pose of the wand on the last processed tick.
    pub final_pose: Option<[f64; NUM_TASK_DOF]>,

    /// Wall clock duration of the run.
    ///
    /// Units: seconds
    pub duration_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RunSummary {
    fn new() -> Self {
        Self {
            ticks: 0,
            write_failures: 0,
            last_write_error_code: None,
            cycle_overruns: 0,
            stop_cause: StopCause::StopRequested,
            peak_limited_ticks: [0; NUM_JOINTS],
            sustained_limited_ticks: [0; NUM_JOINTS],
            final_pose: None,
            duration_s: 0.0,
        }
    }
}

impl<H: WandHardware> WandCtrl<H> {
    /// Create a new, uncalibrated, wand controller.
    pub fn new(
        hw: H,
        params: Params,
        force_ctrl_params: force_ctrl::Params,
    ) -> Result<Self, WandCtrlError> {
        params.are_valid()?;

        let mut force_ctrl = ForceCtrl::default();
        force_ctrl.init(force_ctrl_params)?;

        Ok(Self {
            hw,
            params,
            force_ctrl,
            state: CtrlState::Uncalibrated,
        })
    }

    pub fn state(&self) -> CtrlState {
        self.state
    }

    /// The hardware driven by the controller.
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Calibrate the encoders.
    ///
    /// The amplifiers are disabled and `confirm` is called to wait for the operator to place the
    /// wand in its calibration pose. If the operator confirms the encoder origin is reset to the
    /// calibration pose.
    pub fn calibrate<F>(&mut self, confirm: F) -> Result<(), WandCtrlError>
    where
        F: FnOnce() -> bool,
    {
        if self.state == CtrlState::Running {
            return Err(WandCtrlError::InvalidState {
                op: "calibrate",
                state: self.state,
            });
        }

        self.make_safe().map_err(WandCtrlError::Calibration)?;

        if !confirm() {
            warn!("Calibration declined by the operator");
            return Err(WandCtrlError::CalibrationDeclined);
        }

        self.hw
            .reset_encoder_origin(&CALIBRATION_COUNTS)
            .map_err(WandCtrlError::Calibration)?;

        info!("Wand calibrated");
        self.state = CtrlState::Calibrated;

        Ok(())
    }

    /// Start the controller.
    ///
    /// Creates the encoder reader, enables the amplifiers and starts the reader. If any step fails
    /// the wand is made safe, the reader released, and the controller stays calibrated.
    pub fn start(&mut self) -> Result<(), WandCtrlError> {
        if self.state != CtrlState::Calibrated {
            return Err(WandCtrlError::InvalidState {
                op: "start",
                state: self.state,
            });
        }

        let samples_in_buffer = self.params.samples_in_buffer();
        if let Err(e) = self.hw.create_encoder_reader(samples_in_buffer) {
            error!("Could not create the encoder reader: {}", e);
            self.abort_start();
            return Err(WandCtrlError::Start(e));
        }

        // Amplifiers are only enabled once the reader exists
        if let Err(e) = self.hw.write_amplifier_enable(&AMPS_ENABLED) {
            error!("Could not enable the amplifiers: {}", e);
            self.abort_start();
            return Err(WandCtrlError::Start(e));
        }

        if let Err(e) = self.hw.start_encoder_reader(self.params.frequency_hz) {
            error!("Could not start the encoder reader: {}", e);
            self.abort_start();
            return Err(WandCtrlError::Start(e));
        }

        self.force_ctrl.reset_limiters();
        self.state = CtrlState::Running;

        info!(
            "Wand controller started at {} Hz ({} samples buffered)",
            self.params.frequency_hz, samples_in_buffer
        );

        Ok(())
    }

    /// Run the sampling loop until `stop` is set, the reader runs out of samples, or an error
    /// occurs.
    ///
    /// The controller is stopped before returning, whatever the outcome.
    pub fn run<L>(&mut self, stop: &AtomicBool, law: &mut L) -> Result<RunSummary, WandCtrlError>
    where
        L: ForceLaw + ?Sized,
    {
        if self.state != CtrlState::Running {
            return Err(WandCtrlError::InvalidState {
                op: "run",
                state: self.state,
            });
        }

        let period = Duration::from_secs_f64(self.params.period_s());
        let run_start = Instant::now();
        let mut summary = RunSummary::new();

        let result = loop {
            if stop.load(Ordering::Relaxed) {
                info!("Stop requested");
                break Ok(StopCause::StopRequested);
            }

            let counts = match self.hw.read_joint_encoders() {
                Ok(Some(c)) => c,
                Ok(None) => {
                    info!("Encoder reader has no further samples");
                    break Ok(StopCause::EndOfSamples);
                }
                Err(e) => {
                    error!("Encoder read failed: {}", e);
                    break Err((StopCause::ReadFailed, WandCtrlError::Read(e)));
                }
            };

            let tick_start = Instant::now();

            if let Err(e) = self.tick(&counts, law, &mut summary) {
                error!("Wand control processing failed: {}", e);
                let cause = match e {
                    WandCtrlError::Geometry(_) => StopCause::GeometryFault,
                    _ => StopCause::ForceCtrlFault,
                };
                break Err((cause, e));
            }

            let tick_dur = tick_start.elapsed();
            if tick_dur > period {
                warn!(
                    "Cycle overran by {:.06} s",
                    tick_dur.as_secs_f64() - period.as_secs_f64()
                );
                summary.cycle_overruns += 1;
            }
        };

        self.teardown();

        summary.duration_s = run_start.elapsed().as_secs_f64();
        summary.stop_cause = match result {
            Ok(c) => c,
            Err((c, _)) => c,
        };

        info!(
            "Run ended ({:?}) after {} ticks in {:.03} s, {} write failures, {} cycle overruns",
            summary.stop_cause,
            summary.ticks,
            summary.duration_s,
            summary.write_failures,
            summary.cycle_overruns
        );

        match result {
            Ok(_) => Ok(summary),
            Err((_, e)) => Err(e),
        }
    }

    /// Stop the controller if it is running.
    pub fn stop(&mut self) {
        if self.state == CtrlState::Running {
            self.teardown();
        }
    }

    /// Process a single encoder sample.
    fn tick<L>(
        &mut self,
        counts: &EncoderCounts,
        law: &mut L,
        summary: &mut RunSummary,
    ) -> Result<(), WandCtrlError>
    where
        L: ForceLaw + ?Sized,
    {
        let dt_s = self.params.period_s();

        let angles = encoder_counts_to_joint_angles(counts);
        let pose =
            forward_kinematics(self.force_ctrl.geometry(), &angles).map_err(WandCtrlError::Geometry)?;

        let force = law.force(&pose, dt_s);

        let (output, report) = self.force_ctrl.proc(&InputData {
            angles,
            force,
            dt_s,
        })?;

        if let Err(e) = self.hw.write_motor_voltages(&output.voltages) {
            warn!("Drive voltage write failed: {}", e);
            summary.write_failures += 1;
            summary.last_write_error_code = Some(e.code());
        }

        summary.ticks += 1;
        for (i, clamp) in report.clamps.iter().enumerate() {
            match clamp {
                Clamp::Peak => summary.peak_limited_ticks[i] += 1,
                Clamp::Sustained => summary.sustained_limited_ticks[i] += 1,
                Clamp::None => (),
            }
        }

        let mut final_pose = [0.0; NUM_TASK_DOF];
        final_pose.copy_from_slice(pose.as_slice());
        summary.final_pose = Some(final_pose);

        Ok(())
    }

    /// Disable the amplifiers and command zero volts.
    ///
    /// Both writes are attempted, the first error is returned.
    fn make_safe(&mut self) -> Result<(), HilError> {
        let amps = self.hw.write_amplifier_enable(&AMPS_DISABLED);
        let volts = self.hw.write_motor_voltages(&ZERO_VOLTAGES);

        amps.and(volts)
    }

    /// Undo a partial start, leaving the wand safe with no encoder reader.
    fn abort_start(&mut self) {
        self.hw.stop_encoder_reader();
        if let Err(e) = self.make_safe() {
            error!("Could not make the wand safe: {}", e);
        }
        self.hw.release_encoder_reader();
    }

    /// Stop the encoder reader, make the wand safe and release the reader.
    fn teardown(&mut self) {
        debug!("Tearing down the wand controller");

        self.hw.stop_encoder_reader();
        if let Err(e) = self.make_safe() {
            error!("Could not make the wand safe: {}", e);
        }
        self.hw.release_encoder_reader();

        self.force_ctrl.clear_limiters();
        self.state = CtrlState::Stopped;

        info!("Wand controller stopped");
    }
}

impl<H: WandHardware> Drop for WandCtrl<H> {
    fn drop(&mut self) {
        if self.state == CtrlState::Running {
            warn!("Wand controller dropped while running");
            self.teardown();
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::force_kin::TaskForce;
    use crate::kinematics::Pose;
    use hil_if::sim::{ReaderState, SimCommand, SimFaults, SimParams, SimWand};

    fn sim(max_samples: u64, faults: SimFaults) -> SimWand {
        SimWand::new(
            SimParams {
                max_samples: Some(max_samples),
                realtime: false,
                ..Default::default()
            },
            faults,
        )
    }

    fn ctrl<H: WandHardware>(hw: H) -> WandCtrl<H> {
        WandCtrl::new(hw, Params::default(), force_ctrl::Params::default()).unwrap()
    }

    fn zero_law() -> impl FnMut(&Pose, f64) -> TaskForce {
        |_: &Pose, _: f64| TaskForce::zeros()
    }

    #[test]
    fn test_lifecycle() {
        let mut wc = ctrl(sim(10, SimFaults::default()));
        assert_eq!(wc.state(), CtrlState::Uncalibrated);

        wc.calibrate(|| true).unwrap();
        assert_eq!(wc.state(), CtrlState::Calibrated);

        wc.start().unwrap();
        assert_eq!(wc.state(), CtrlState::Running);
        assert_eq!(wc.hardware().amps_enabled(), AMPS_ENABLED);

        let summary = wc.run(&AtomicBool::new(false), &mut zero_law()).unwrap();
        assert_eq!(wc.state(), CtrlState::Stopped);
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.stop_cause, StopCause::EndOfSamples);
        assert_eq!(wc.hardware().amps_enabled(), AMPS_DISABLED);
        assert_eq!(wc.hardware().reader_state(), ReaderState::Absent);
    }

    #[test]
    fn test_start_requires_calibration() {
        let mut wc = ctrl(sim(10, SimFaults::default()));
        assert!(matches!(
            wc.start(),
            Err(WandCtrlError::InvalidState { op: "start", .. })
        ));
        assert!(matches!(
            wc.run(&AtomicBool::new(false), &mut zero_law()),
            Err(WandCtrlError::InvalidState { op: "run", .. })
        ));
    }

    #[test]
    fn test_calibration_declined() {
        let mut wc = ctrl(sim(10, SimFaults::default()));
        assert!(matches!(
            wc.calibrate(|| false),
            Err(WandCtrlError::CalibrationDeclined)
        ));
        assert_eq!(wc.state(), CtrlState::Uncalibrated);

        // Amplifiers were made safe before asking, and the origin left alone
        assert_eq!(wc.hardware().amps_enabled(), AMPS_DISABLED);
        assert!(!wc
            .hardware()
            .commands()
            .any(|c| matches!(c, SimCommand::EncoderOrigin(_))));
    }

    #[test]
    fn test_calibration_write_failure() {
        let faults = SimFaults {
            fail_amp_enable: true,
            ..Default::default()
        };
        let mut wc = ctrl(sim(10, faults));

        let mut asked = false;
        let r = wc.calibrate(|| {
            asked = true;
            true
        });
        assert!(matches!(r, Err(WandCtrlError::Calibration(_))));
        assert!(!asked);
    }

    #[test]
    fn test_drop_while_running_makes_safe() {
        let mut hw = sim(10, SimFaults::default());
        {
            let mut wc = ctrl(&mut hw);
            wc.calibrate(|| true).unwrap();
            wc.start().unwrap();
        }

        assert_eq!(hw.amps_enabled(), AMPS_DISABLED);
        assert_eq!(hw.voltages(), ZERO_VOLTAGES);
        assert_eq!(hw.reader_state(), ReaderState::Absent);
    }

    #[test]
    fn test_geometry_fault_stops() {
        let mut fc_params = force_ctrl::Params::default();

        // Distal links too short to ever close the sub-chains
        fc_params.geometry.link_lengths_m[1] = 0.01;

        let mut hw = sim(10, SimFaults::default());
        let mut wc = WandCtrl::new(&mut hw, Params::default(), fc_params).unwrap();
        wc.calibrate(|| true).unwrap();
        wc.start().unwrap();

        let r = wc.run(&AtomicBool::new(false), &mut zero_law());
        assert!(matches!(r, Err(WandCtrlError::Geometry(_))));
        assert_eq!(wc.state(), CtrlState::Stopped);
        drop(wc);

        assert_eq!(hw.amps_enabled(), AMPS_DISABLED);
        assert_eq!(hw.voltages(), ZERO_VOLTAGES);
    }
}
