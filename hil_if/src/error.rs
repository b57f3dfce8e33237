//! # Board errors

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Code reported when the encoder reader is used before it has been started.
pub const NOT_STARTED_CODE: i32 = -1012;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Group of channels addressed by a board operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Analog,
    Digital,
    Encoder,
}

/// Encoder reader task operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOp {
    Create,
    Start,
}

/// Errors reported by the board. The codes are the negative values returned by the acquisition
/// driver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HilError {
    #[error("Failed to read the encoder channels (error {0})")]
    ReadFailed(i32),

    #[error("Failed to write the {channels} channels (error {code})")]
    WriteFailed { channels: ChannelKind, code: i32 },

    #[error("Failed to {op} the encoder reader (error {code})")]
    TaskFailed { op: TaskOp, code: i32 },

    #[error("The encoder reader has not been started")]
    NotStarted,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl HilError {
    /// Driver code carried by the error.
    pub fn code(&self) -> i32 {
        match self {
            HilError::ReadFailed(code) => *code,
            HilError::WriteFailed { code, .. } => *code,
            HilError::TaskFailed { code, .. } => *code,
            HilError::NotStarted => NOT_STARTED_CODE,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Analog => write!(f, "analog"),
            ChannelKind::Digital => write!(f, "digital"),
            ChannelKind::Encoder => write!(f, "encoder"),
        }
    }
}

impl fmt::Display for TaskOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOp::Create => write!(f, "create"),
            TaskOp::Start => write!(f, "start"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codes_are_negative() {
        let errors = [
            HilError::ReadFailed(-1073),
            HilError::WriteFailed {
                channels: ChannelKind::Analog,
                code: -1074,
            },
            HilError::TaskFailed {
                op: TaskOp::Start,
                code: -1085,
            },
            HilError::NotStarted,
        ];

        for e in errors.iter() {
            assert!(e.code() < 0, "{} has a non-negative code", e);
        }
    }

    #[test]
    fn test_display() {
        let e = HilError::WriteFailed {
            channels: ChannelKind::Digital,
            code: -5,
        };
        assert_eq!(
            format!("{}", e),
            "Failed to write the digital channels (error -5)"
        );
    }
}
