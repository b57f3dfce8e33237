//! # Wand equipment definitions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of actuated joints in the wand.
pub const NUM_JOINTS: usize = 6;

/// Amplifier enable lines with every amplifier enabled.
pub const AMPS_ENABLED: AmpEnables = [true; NUM_JOINTS];

/// Amplifier enable lines with every amplifier disabled.
pub const AMPS_DISABLED: AmpEnables = [false; NUM_JOINTS];

/// Zero drive voltage on every joint.
pub const ZERO_VOLTAGES: DriveVoltages = [0.0; NUM_JOINTS];

/// Encoder counts of the calibration pose.
pub const CALIBRATION_COUNTS: EncoderCounts = [0; NUM_JOINTS];

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Raw encoder counts of each joint.
pub type EncoderCounts = [i32; NUM_JOINTS];

/// Amplifier drive voltage of each joint in volts.
pub type DriveVoltages = [f64; NUM_JOINTS];

/// Amplifier enable state of each joint.
pub type AmpEnables = [bool; NUM_JOINTS];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Board channels used by the wand, ordered by joint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChannelMap {
    /// Analog outputs driving the current amplifiers.
    pub analog_out: [u32; NUM_JOINTS],

    /// Encoder inputs measuring the joint positions.
    pub encoder_in: [u32; NUM_JOINTS],

    /// Digital outputs enabling the current amplifiers.
    pub amp_enable_out: [u32; NUM_JOINTS],
}

/// Identification of the board and the channels it exposes to the wand.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HilParams {
    /// Board type name, as known to the acquisition driver.
    pub board_type: String,

    /// Board identifier, used to pick between several boards of the same type.
    pub board_identifier: String,

    pub channels: ChannelMap,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            analog_out: [0, 1, 2, 3, 4, 5],
            encoder_in: [0, 1, 2, 3, 4, 5],
            amp_enable_out: [0, 1, 2, 3, 16, 17],
        }
    }
}

impl fmt::Display for ChannelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "analog out {:?}, encoders {:?}, amp enables {:?}",
            self.analog_out, self.encoder_in, self.amp_enable_out
        )
    }
}

impl Default for HilParams {
    fn default() -> Self {
        Self {
            board_type: String::from("q8"),
            board_identifier: String::from("0"),
            channels: ChannelMap::default(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
