//! # Force laws
//!
//! A force law decides the task space force the wand renders at each cycle, given the current
//! pose of the handle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::force_kin::TaskForce;
use crate::kinematics::{Pose, NUM_TASK_DOF};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Source of the force demanded of the wand.
pub trait ForceLaw {
    /// Force to render at `pose`, `dt_s` seconds after the previous cycle.
    fn force(&mut self, pose: &Pose, dt_s: f64) -> TaskForce;
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters of a [`SpringLaw`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpringParams {
    /// Stiffness of the spring along each task space axis.
    ///
    /// Units: newtons/meter for x, y and z, newton meters/radian for roll and pitch
    pub stiffness: [f64; NUM_TASK_DOF],

    /// Pose the spring pulls the handle towards.
    ///
    /// Units: meters, meters, meters, radians, radians
    pub home: [f64; NUM_TASK_DOF],
}

/// Virtual spring attaching the handle to a home pose, `F = -k * (X - X_home)`.
#[derive(Debug, Clone)]
pub struct SpringLaw {
    stiffness: TaskForce,
    home: Pose,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            stiffness: [0.0; NUM_TASK_DOF],
            home: [0.25, 0.0, 0.0, 0.0, 0.0],
        }
    }
}

impl SpringLaw {
    pub fn new(params: &SpringParams) -> Self {
        Self {
            stiffness: TaskForce::from_column_slice(&params.stiffness),
            home: Pose::from_column_slice(&params.home),
        }
    }
}

impl ForceLaw for SpringLaw {
    fn force(&mut self, pose: &Pose, _dt_s: f64) -> TaskForce {
        -self.stiffness.component_mul(&(pose - self.home))
    }
}

impl<F> ForceLaw for F
where
    F: FnMut(&Pose, f64) -> TaskForce,
{
    fn force(&mut self, pose: &Pose, dt_s: f64) -> TaskForce {
        self(pose, dt_s)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_spring_is_slack() {
        let mut law = SpringLaw::new(&SpringParams::default());
        let pose = Pose::new(0.1, 0.12, -0.03, 0.2, 0.1);

        assert_eq!(law.force(&pose, 0.001), TaskForce::zeros());
    }

    #[test]
    fn test_spring_pulls_home() {
        let params = SpringParams {
            stiffness: [100.0, 200.0, 300.0, 1.0, 2.0],
            home: [0.0, 0.1, 0.0, 0.0, 0.0],
        };
        let mut law = SpringLaw::new(&params);

        let f = law.force(&Pose::new(0.01, 0.1, -0.01, 0.5, 0.0), 0.001);
        assert!((f - TaskForce::new(-1.0, 0.0, 3.0, -0.5, 0.0)).amax() < 1e-12);
    }

    #[test]
    fn test_closure_law() {
        let mut calls = 0;
        let mut law = |_: &Pose, _: f64| {
            calls += 1;
            TaskForce::repeat(1.0)
        };

        assert_eq!(law.force(&Pose::zeros(), 0.001), TaskForce::repeat(1.0));
        assert_eq!(calls, 1);
    }
}
