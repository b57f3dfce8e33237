//! # Hardware-in-the-loop interface crate.
//!
//! Provides the boundary between the wand control software and the data acquisition board which
//! reads the joint encoders and drives the motor amplifiers. The control software only ever talks
//! to the board through the [`WandHardware`] trait.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Channel maps, board identification and the data exchanged with the board.
pub mod eqpt;

/// Errors reported by the board.
pub mod error;

/// Simulated wand board.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use eqpt::*;
pub use error::HilError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait providing a unified API over the board controlling the haptic wand.
///
/// All calls are issued serially from a single control thread.
pub trait WandHardware {
    /// Set the encoder counters of every joint to the given counts.
    fn reset_encoder_origin(&mut self, counts: &EncoderCounts) -> Result<(), HilError>;

    /// Write the enable lines of the joint current amplifiers.
    fn write_amplifier_enable(&mut self, enables: &AmpEnables) -> Result<(), HilError>;

    /// Write the drive voltages of the joint current amplifiers.
    fn write_motor_voltages(&mut self, voltages: &DriveVoltages) -> Result<(), HilError>;

    /// Create a task reading the joint encoders at regular intervals.
    ///
    /// ## Arguments
    /// - `samples_in_buffer` - The number of samples the task may buffer before samples are lost.
    fn create_encoder_reader(&mut self, samples_in_buffer: u32) -> Result<(), HilError>;

    /// Start the encoder reader created by [`WandHardware::create_encoder_reader`], clocked at
    /// `frequency_hz`.
    fn start_encoder_reader(&mut self, frequency_hz: f64) -> Result<(), HilError>;

    /// Block until the next encoder sample is available and return it.
    ///
    /// Returns `Ok(None)` when the reader will not produce any further samples.
    fn read_joint_encoders(&mut self) -> Result<Option<EncoderCounts>, HilError>;

    /// Stop the encoder reader. Must be safe to call when the reader isn't running.
    fn stop_encoder_reader(&mut self);

    /// Release all resources held by the encoder reader. Must be safe to call when no reader
    /// exists.
    fn release_encoder_reader(&mut self);
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl<T> WandHardware for &mut T
where
    T: WandHardware + ?Sized,
{
    fn reset_encoder_origin(&mut self, counts: &EncoderCounts) -> Result<(), HilError> {
        (**self).reset_encoder_origin(counts)
    }

    fn write_amplifier_enable(&mut self, enables: &AmpEnables) -> Result<(), HilError> {
        (**self).write_amplifier_enable(enables)
    }

    fn write_motor_voltages(&mut self, voltages: &DriveVoltages) -> Result<(), HilError> {
        (**self).write_motor_voltages(voltages)
    }

    fn create_encoder_reader(&mut self, samples_in_buffer: u32) -> Result<(), HilError> {
        (**self).create_encoder_reader(samples_in_buffer)
    }

    fn start_encoder_reader(&mut self, frequency_hz: f64) -> Result<(), HilError> {
        (**self).start_encoder_reader(frequency_hz)
    }

    fn read_joint_encoders(&mut self) -> Result<Option<EncoderCounts>, HilError> {
        (**self).read_joint_encoders()
    }

    fn stop_encoder_reader(&mut self) {
        (**self).stop_encoder_reader()
    }

    fn release_encoder_reader(&mut self) {
        (**self).release_encoder_reader()
    }
}
