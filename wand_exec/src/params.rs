//! # Wand executable parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{force_law::SpringParams, wand_ctrl};
use hil_if::{
    sim::{SimFaults, SimParams},
    HilParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the wand executable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WandExecParams {
    /// Board driving the wand.
    pub hil: HilParams,

    /// Sampling loop settings.
    pub wand_ctrl: wand_ctrl::Params,

    /// Virtual spring rendered by the wand.
    pub spring: SpringParams,

    /// Simulated board settings.
    pub sim: SimParams,

    /// Faults injected into the simulated board.
    pub sim_faults: SimFaults,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use hil_if::sim::Trajectory;

    #[test]
    fn test_load_exec_params() {
        let params: WandExecParams = util::params::from_str(
            r#"
            [wand_ctrl]
            frequency_hz = 500.0

            [spring]
            stiffness = [50.0, 50.0, 50.0, 0.0, 0.0]

            [sim]
            realtime = false
            max_samples = 2000

            [sim.trajectory]
            kind = "sweep"
            amplitude_counts = [200.0, 200.0, 200.0, 200.0, 500.0, 500.0]
            phase_rad = [0.0, 0.0, 0.0, 0.0, 0.0, 1.57]
            period_s = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(params.wand_ctrl.frequency_hz, 500.0);
        assert_eq!(params.wand_ctrl.buffer_duration_s, 0.1);
        assert_eq!(params.spring.home, [0.25, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(params.hil.board_type, "q8");
        assert_eq!(params.hil.channels.amp_enable_out, [0, 1, 2, 3, 16, 17]);
        assert_eq!(params.sim.max_samples, Some(2000));
        assert!(matches!(params.sim.trajectory, Trajectory::Sweep { .. }));
        assert!(!params.sim_faults.fail_start);
    }
}
