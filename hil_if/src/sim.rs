//! # Simulated wand board
//!
//! [`SimWand`] stands in for the acquisition board when no hardware is attached. It replays a
//! joint trajectory about the calibration pose, paces encoder reads at the sampling frequency and
//! records every command it accepts so that the commands can be inspected after a run. Faults can
//! be injected into any of the board operations.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::Deserialize;
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{ChannelKind, TaskOp};
use crate::{
    AmpEnables, DriveVoltages, EncoderCounts, HilError, WandHardware, AMPS_DISABLED, NUM_JOINTS,
    ZERO_VOLTAGES,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Code reported by every injected fault.
pub const SIM_FAULT_CODE: i32 = -1073;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Motion of the simulated mechanism, in encoder counts relative to the calibration pose.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trajectory {
    /// The mechanism is held still.
    Hold { counts: EncoderCounts },

    /// Each joint follows `amplitude * sin(2 pi t / period + phase)`.
    Sweep {
        amplitude_counts: [f64; NUM_JOINTS],
        phase_rad: [f64; NUM_JOINTS],
        period_s: f64,
    },
}

/// A command accepted by the simulated board.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    EncoderOrigin(EncoderCounts),
    AmpEnable(AmpEnables),
    Voltages(DriveVoltages),
    ReaderCreated { samples_in_buffer: u32 },
    ReaderStarted { frequency_hz: f64 },
    ReaderStopped,
    ReaderReleased,
}

/// Lifecycle of the encoder reader task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Absent,
    Created,
    Running,
    Stopped,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulated board.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Motion replayed by the encoders.
    pub trajectory: Trajectory,

    /// Encoder counter values at power on, before the origin is reset.
    pub power_on_counts: EncoderCounts,

    /// Number of samples produced before the reader reports the end of the data. `None` never
    /// ends.
    pub max_samples: Option<u64>,

    /// If true reads block until the next sampling instant.
    pub realtime: bool,

    /// Number of commands kept in the command log, oldest are dropped first.
    pub command_log_capacity: usize,
}

/// Faults to inject into the simulated board.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimFaults {
    /// Creating the encoder reader fails.
    pub fail_create: bool,

    /// Starting the encoder reader fails.
    pub fail_start: bool,

    /// Reading the sample with this 0-based index fails.
    pub fail_read_at: Option<u64>,

    /// While the reader is running, the voltage write following the read of a sample with one of
    /// these 0-based indices fails. Writes before the first read never fail.
    pub fail_write_at: Vec<u64>,

    /// Amplifier enable writes fail.
    pub fail_amp_enable: bool,
}

/// Simulated wand board.
pub struct SimWand {
    params: SimParams,
    faults: SimFaults,

    reader: ReaderState,
    frequency_hz: f64,
    start_instant: Option<Instant>,
    samples_read: u64,

    /// Raw counts at the last origin reset and the counts they were set to.
    origin_raw: EncoderCounts,
    origin_counts: EncoderCounts,

    amps: AmpEnables,
    voltages: DriveVoltages,
    failed_writes: u64,

    commands: VecDeque<SimCommand>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            trajectory: Trajectory::Hold {
                counts: [0; NUM_JOINTS],
            },
            power_on_counts: [0; NUM_JOINTS],
            max_samples: None,
            realtime: true,
            command_log_capacity: 4096,
        }
    }
}

impl Trajectory {
    /// Counts relative to the calibration pose at time `t_s`.
    pub fn counts_at(&self, t_s: f64) -> EncoderCounts {
        match self {
            Trajectory::Hold { counts } => *counts,
            Trajectory::Sweep {
                amplitude_counts,
                phase_rad,
                period_s,
            } => {
                let mut counts = [0; NUM_JOINTS];
                for i in 0..NUM_JOINTS {
                    let arg = 2.0 * PI * t_s / period_s + phase_rad[i];
                    counts[i] = (amplitude_counts[i] * arg.sin()).round() as i32;
                }
                counts
            }
        }
    }
}

impl SimWand {
    pub fn new(params: SimParams, faults: SimFaults) -> Self {
        Self {
            params,
            faults,
            reader: ReaderState::Absent,
            frequency_hz: 0.0,
            start_instant: None,
            samples_read: 0,
            origin_raw: [0; NUM_JOINTS],
            origin_counts: [0; NUM_JOINTS],
            amps: AMPS_DISABLED,
            voltages: ZERO_VOLTAGES,
            failed_writes: 0,
            commands: VecDeque::new(),
        }
    }

    /// Current state of the encoder reader.
    pub fn reader_state(&self) -> ReaderState {
        self.reader
    }

    pub fn amps_enabled(&self) -> AmpEnables {
        self.amps
    }

    /// Last drive voltages accepted by the board.
    pub fn voltages(&self) -> DriveVoltages {
        self.voltages
    }

    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }

    /// Number of writes rejected by injected faults.
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes
    }

    /// Commands accepted by the board, oldest first.
    pub fn commands(&self) -> impl Iterator<Item = &SimCommand> {
        self.commands.iter()
    }

    /// Raw counter values of the mechanism at time `t_s`.
    fn raw_counts(&self, t_s: f64) -> EncoderCounts {
        let rel = self.params.trajectory.counts_at(t_s);
        let mut raw = [0; NUM_JOINTS];
        for i in 0..NUM_JOINTS {
            raw[i] = self.params.power_on_counts[i].wrapping_add(rel[i]);
        }
        raw
    }

    fn record(&mut self, cmd: SimCommand) {
        trace!("SimWand command: {:?}", cmd);

        if self.params.command_log_capacity == 0 {
            return;
        }
        while self.commands.len() >= self.params.command_log_capacity {
            self.commands.pop_front();
        }
        self.commands.push_back(cmd);
    }

    /// Block until the sampling instant of the next sample.
    fn wait_for_sample(&self) {
        let start = match self.start_instant {
            Some(s) => s,
            None => return,
        };

        let deadline =
            start + Duration::from_secs_f64((self.samples_read + 1) as f64 / self.frequency_hz);
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
}

impl WandHardware for SimWand {
    fn reset_encoder_origin(&mut self, counts: &EncoderCounts) -> Result<(), HilError> {
        // The mechanism sits at the start of its trajectory until the reader is running
        let t_s = match self.reader {
            ReaderState::Running => self.samples_read as f64 / self.frequency_hz,
            _ => 0.0,
        };
        self.origin_raw = self.raw_counts(t_s);
        self.origin_counts = *counts;

        self.record(SimCommand::EncoderOrigin(*counts));
        Ok(())
    }

    fn write_amplifier_enable(&mut self, enables: &AmpEnables) -> Result<(), HilError> {
        if self.faults.fail_amp_enable {
            self.failed_writes += 1;
            return Err(HilError::WriteFailed {
                channels: ChannelKind::Digital,
                code: SIM_FAULT_CODE,
            });
        }

        self.amps = *enables;
        self.record(SimCommand::AmpEnable(*enables));
        Ok(())
    }

    fn write_motor_voltages(&mut self, voltages: &DriveVoltages) -> Result<(), HilError> {
        let last_sample = self.samples_read.checked_sub(1);
        if self.reader == ReaderState::Running
            && last_sample.map_or(false, |n| self.faults.fail_write_at.contains(&n))
        {
            self.failed_writes += 1;
            return Err(HilError::WriteFailed {
                channels: ChannelKind::Analog,
                code: SIM_FAULT_CODE,
            });
        }

        self.voltages = *voltages;
        self.record(SimCommand::Voltages(*voltages));
        Ok(())
    }

    fn create_encoder_reader(&mut self, samples_in_buffer: u32) -> Result<(), HilError> {
        if self.faults.fail_create {
            return Err(HilError::TaskFailed {
                op: TaskOp::Create,
                code: SIM_FAULT_CODE,
            });
        }

        self.reader = ReaderState::Created;
        self.record(SimCommand::ReaderCreated { samples_in_buffer });
        Ok(())
    }

    fn start_encoder_reader(&mut self, frequency_hz: f64) -> Result<(), HilError> {
        match self.reader {
            ReaderState::Created | ReaderState::Stopped => (),
            _ => return Err(HilError::NotStarted),
        }

        if self.faults.fail_start {
            return Err(HilError::TaskFailed {
                op: TaskOp::Start,
                code: SIM_FAULT_CODE,
            });
        }

        debug!("SimWand encoder reader started at {} Hz", frequency_hz);

        self.reader = ReaderState::Running;
        self.frequency_hz = frequency_hz;
        self.samples_read = 0;
        self.start_instant = if self.params.realtime {
            Some(Instant::now())
        } else {
            None
        };

        self.record(SimCommand::ReaderStarted { frequency_hz });
        Ok(())
    }

    fn read_joint_encoders(&mut self) -> Result<Option<EncoderCounts>, HilError> {
        if self.reader != ReaderState::Running {
            return Err(HilError::NotStarted);
        }

        if let Some(max) = self.params.max_samples {
            if self.samples_read >= max {
                return Ok(None);
            }
        }

        if self.faults.fail_read_at == Some(self.samples_read) {
            return Err(HilError::ReadFailed(SIM_FAULT_CODE));
        }

        self.wait_for_sample();

        let raw = self.raw_counts(self.samples_read as f64 / self.frequency_hz);
        let mut counts = [0; NUM_JOINTS];
        for i in 0..NUM_JOINTS {
            counts[i] = raw[i]
                .wrapping_sub(self.origin_raw[i])
                .wrapping_add(self.origin_counts[i]);
        }

        self.samples_read += 1;

        Ok(Some(counts))
    }

    fn stop_encoder_reader(&mut self) {
        if self.reader == ReaderState::Running {
            self.reader = ReaderState::Stopped;
            self.start_instant = None;
            self.record(SimCommand::ReaderStopped);
        }
    }

    fn release_encoder_reader(&mut self) {
        if self.reader != ReaderState::Absent {
            self.reader = ReaderState::Absent;
            self.record(SimCommand::ReaderReleased);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn fast_params() -> SimParams {
        SimParams {
            realtime: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_read_requires_running_reader() {
        let mut sim = SimWand::new(fast_params(), SimFaults::default());
        assert_eq!(sim.read_joint_encoders(), Err(HilError::NotStarted));

        sim.create_encoder_reader(100).unwrap();
        assert_eq!(sim.read_joint_encoders(), Err(HilError::NotStarted));

        sim.start_encoder_reader(1000.0).unwrap();
        assert_eq!(sim.read_joint_encoders(), Ok(Some([0; NUM_JOINTS])));
    }

    #[test]
    fn test_origin_reset() {
        let params = SimParams {
            power_on_counts: [1234, -20, 7, 0, 99999, -4],
            ..fast_params()
        };
        let mut sim = SimWand::new(params, SimFaults::default());

        sim.reset_encoder_origin(&[0; NUM_JOINTS]).unwrap();
        sim.create_encoder_reader(100).unwrap();
        sim.start_encoder_reader(1000.0).unwrap();

        assert_eq!(sim.read_joint_encoders(), Ok(Some([0; NUM_JOINTS])));
    }

    #[test]
    fn test_sweep() {
        let params = SimParams {
            trajectory: Trajectory::Sweep {
                amplitude_counts: [100.0; NUM_JOINTS],
                phase_rad: [0.0; NUM_JOINTS],
                period_s: 0.004,
            },
            ..fast_params()
        };
        let mut sim = SimWand::new(params, SimFaults::default());
        sim.create_encoder_reader(100).unwrap();
        sim.start_encoder_reader(1000.0).unwrap();

        // Quarter period steps of sin
        let expected = [0, 100, 0, -100];
        for e in expected.iter() {
            let counts = sim.read_joint_encoders().unwrap().unwrap();
            assert_eq!(counts, [*e; NUM_JOINTS]);
        }
    }

    #[test]
    fn test_max_samples() {
        let params = SimParams {
            max_samples: Some(3),
            ..fast_params()
        };
        let mut sim = SimWand::new(params, SimFaults::default());
        sim.create_encoder_reader(100).unwrap();
        sim.start_encoder_reader(1000.0).unwrap();

        for _ in 0..3 {
            assert!(sim.read_joint_encoders().unwrap().is_some());
        }
        assert_eq!(sim.read_joint_encoders(), Ok(None));
        assert_eq!(sim.samples_read(), 3);
    }

    #[test]
    fn test_injected_faults() {
        let faults = SimFaults {
            fail_read_at: Some(2),
            fail_write_at: vec![1],
            ..Default::default()
        };
        let mut sim = SimWand::new(fast_params(), faults);
        sim.create_encoder_reader(100).unwrap();
        sim.start_encoder_reader(1000.0).unwrap();

        // Sample 0 read, its write goes through
        sim.read_joint_encoders().unwrap();
        assert!(sim.write_motor_voltages(&[1.0; NUM_JOINTS]).is_ok());

        // Sample 1 read, its write is rejected

        sim.read_joint_encoders().unwrap();
        assert!(sim.write_motor_voltages(&[2.0; NUM_JOINTS]).is_err());
        assert_eq!(sim.voltages(), [1.0; NUM_JOINTS]);
        assert_eq!(sim.failed_writes(), 1);

        assert_eq!(
            sim.read_joint_encoders(),
            Err(HilError::ReadFailed(SIM_FAULT_CODE))
        );

        // Writes are accepted again once the reader has stopped
        sim.stop_encoder_reader();
        assert!(sim.write_motor_voltages(&ZERO_VOLTAGES).is_ok());
    }

    #[test]
    fn test_write_fault_indices_match_read_fault_indices() {
        let faults = SimFaults {
            fail_read_at: Some(3),
            fail_write_at: vec![0, 3],
            ..Default::default()
        };
        let mut sim = SimWand::new(fast_params(), faults);
        sim.create_encoder_reader(100).unwrap();
        sim.start_encoder_reader(1000.0).unwrap();

        // No sample read yet, so no tick index to fail on
        assert!(sim.write_motor_voltages(&ZERO_VOLTAGES).is_ok());

        sim.read_joint_encoders().unwrap();
        assert!(sim.write_motor_voltages(&ZERO_VOLTAGES).is_err());

        for _ in 1..3 {
            sim.read_joint_encoders().unwrap();
            assert!(sim.write_motor_voltages(&ZERO_VOLTAGES).is_ok());
        }

        // Index 3 names the same tick for both faults
        assert!(sim.read_joint_encoders().is_err());
        assert_eq!(sim.samples_read(), 3);
        assert_eq!(sim.failed_writes(), 1);
    }

    #[test]
    fn test_start_faults() {
        let faults = SimFaults {
            fail_start: true,
            ..Default::default()
        };
        let mut sim = SimWand::new(fast_params(), faults);
        sim.create_encoder_reader(100).unwrap();
        assert!(matches!(
            sim.start_encoder_reader(1000.0),
            Err(HilError::TaskFailed {
                op: TaskOp::Start,
                ..
            })
        ));
        assert_eq!(sim.reader_state(), ReaderState::Created);

        sim.release_encoder_reader();
        assert_eq!(sim.reader_state(), ReaderState::Absent);
        assert_eq!(sim.commands().last(), Some(&SimCommand::ReaderReleased));
    }

    #[test]
    fn test_command_log_capacity() {
        let params = SimParams {
            command_log_capacity: 2,
            ..fast_params()
        };
        let mut sim = SimWand::new(params, SimFaults::default());
        for v in 0..5 {
            sim.write_motor_voltages(&[v as f64; NUM_JOINTS]).unwrap();
        }

        let cmds: Vec<_> = sim.commands().cloned().collect();
        assert_eq!(
            cmds,
            vec![
                SimCommand::Voltages([3.0; NUM_JOINTS]),
                SimCommand::Voltages([4.0; NUM_JOINTS])
            ]
        );
    }

    #[test]
    fn test_realtime_pacing() {
        let params = SimParams {
            realtime: true,
            max_samples: Some(5),
            ..Default::default()
        };
        let mut sim = SimWand::new(params, SimFaults::default());
        sim.create_encoder_reader(10).unwrap();
        sim.start_encoder_reader(100.0).unwrap();

        let start = Instant::now();
        while sim.read_joint_encoders().unwrap().is_some() {}

        // 5 samples at 100 Hz
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
