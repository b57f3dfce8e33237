//! # Wand kinematics
//!
//! The wand is a parallel mechanism made of two symmetric planar sub-chains, each a pair of motor
//! driven links (joints 0/1 and 2/3) meeting at a tip, joined by a wrist rotated by joints 4 and
//! 5. This module maps raw encoder counts to joint angles, and joint angles to the task space pose
//! of the wand handle.
//!
//! The pose is `[x, y, z, roll, pitch]`, in meters and radians, expressed in the wand base frame
//! whose origin is the handle position in the calibration pose.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Vector5, Vector6};
use serde::Deserialize;
use std::f64::consts::PI;
use std::fmt;

use hil_if::{EncoderCounts, NUM_JOINTS};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of links in the wand geometry.
pub const NUM_LINKS: usize = 7;

/// Number of task space degrees of freedom.
pub const NUM_TASK_DOF: usize = 5;

/// Smallest value of `1 - r^2`, and of the distance between the distal link bases, for which a
/// sub-chain is considered non-singular.
pub const SINGULARITY_EPSILON: f64 = 1e-9;

/// Conversion from inches to meters.
const INCH_TO_M: f64 = 0.0254;

/// Encoder resolution of all joints.
const COUNTS_PER_REV: f64 = 20000.0;

/// Angle of one encoder count on each joint. Joints 2 and 3 count in the opposite direction.
///
/// Units: radians/count
pub const ENCODER_FACTORS_RAD: [f64; NUM_JOINTS] = [
    2.0 * PI / COUNTS_PER_REV,
    2.0 * PI / COUNTS_PER_REV,
    -2.0 * PI / COUNTS_PER_REV,
    -2.0 * PI / COUNTS_PER_REV,
    2.0 * PI / COUNTS_PER_REV,
    2.0 * PI / COUNTS_PER_REV,
];

/// Joint angles of the calibration pose, where the encoders read zero.
///
/// Units: radians
pub const CALIBRATION_ANGLES_RAD: [f64; NUM_JOINTS] = [
    0.12760527954869,
    3.0139873740411,
    0.12760527954869,
    3.0139873740411,
    0.0,
    0.0,
];

// Indexes into the link lengths
const L1: usize = 0;
const L2: usize = 1;
const L4: usize = 3;
const L5: usize = 4;
const L6: usize = 5;
const L7: usize = 6;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Angles of the six joints.
///
/// Units: radians
pub type JointAngles = Vector6<f64>;

/// Task space pose `[x, y, z, roll, pitch]`.
///
/// Units: meters, meters, meters, radians, radians
pub type Pose = Vector5<f64>;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Identifies one of the two planar sub-chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubChainId {
    /// Joints 0 and 1
    A,
    /// Joints 2 and 3
    B,
}

/// Errors raised when a joint configuration has no valid kinematic solution.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error(
        "Sub-chain {sub_chain} cannot close, its base joints are {ratio:.6} times the reach of \
        its distal links apart"
    )]
    Infeasible { sub_chain: SubChainId, ratio: f64 },

    #[error("Sub-chain {sub_chain} is at a singular configuration (reach ratio {ratio:.9})")]
    Singular { sub_chain: SubChainId, ratio: f64 },
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Link lengths of the wand.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LinkGeometry {
    /// Lengths of links L1 to L7. L3 does not take part in the kinematics.
    ///
    /// Units: meters
    pub link_lengths_m: [f64; NUM_LINKS],
}

/// One of the planar sub-chains, identified by the indexes of its two base joints.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SubChain {
    pub id: SubChainId,
    pub joints: (usize, usize),
}

/// Closed-form solution of a sub-chain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SubChainSolution {
    /// Tip position in the sub-chain plane.
    pub px: f64,
    pub py: f64,

    /// Vector between the two distal link bases.
    pub dx: f64,
    pub dy: f64,

    /// Distance between the distal link bases.
    pub d: f64,

    /// `d` relative to twice the distal link length, the argument of the elbow acos.
    pub r: f64,

    /// Angle of the distal link.
    pub phi: f64,
}

/// Sub-chain tips after the wrist rotations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Wrist {
    pub ya: f64,
    pub za: f64,
    pub yb: f64,
    pub zb: f64,
    pub den: f64,
    pub cos4: f64,
    pub sin4: f64,
    pub cos5: f64,
    pub sin5: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for LinkGeometry {
    fn default() -> Self {
        let inches = [
            5.670,
            7.717,
            8.32232120,
            1.417202685,
            1.750,
            7.000,
            2.078363285,
        ];

        let mut link_lengths_m = [0.0; NUM_LINKS];
        for (l, i) in link_lengths_m.iter_mut().zip(inches.iter()) {
            *l = i * INCH_TO_M;
        }

        Self { link_lengths_m }
    }
}

impl LinkGeometry {
    #[inline]
    pub(crate) fn l(&self, idx: usize) -> f64 {
        self.link_lengths_m[idx]
    }

    /// Offset of the sub-chain tips from the wrist axis.
    #[inline]
    pub(crate) fn wrist_offset(&self) -> f64 {
        self.l(L7) - self.l(L4)
    }

    /// Distance between the two sub-chain tips along the wrist axis, excluding the wrist
    /// rotations.
    #[inline]
    pub(crate) fn wrist_span(&self) -> f64 {
        self.l(L6)
    }

    /// Distance between the base joints of a sub-chain.
    #[inline]
    pub(crate) fn base_span(&self) -> f64 {
        self.l(L5)
    }

    #[inline]
    pub(crate) fn proximal(&self) -> f64 {
        self.l(L1)
    }

    #[inline]
    pub(crate) fn distal(&self) -> f64 {
        self.l(L2)
    }

    /// Determines if the geometry is physically meaningful.
    pub fn is_valid(&self) -> bool {
        self.link_lengths_m.iter().all(|l| l.is_finite() && *l > 0.0)
    }
}

impl fmt::Display for SubChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubChainId::A => write!(f, "A"),
            SubChainId::B => write!(f, "B"),
        }
    }
}

impl SubChain {
    pub const A: SubChain = SubChain {
        id: SubChainId::A,
        joints: (0, 1),
    };

    pub const B: SubChain = SubChain {
        id: SubChainId::B,
        joints: (2, 3),
    };

    /// Solve the sub-chain for its tip position.
    pub fn solve(
        &self,
        geometry: &LinkGeometry,
        angles: &JointAngles,
    ) -> Result<SubChainSolution, GeometryError> {
        let a = angles[self.joints.0];
        let b = angles[self.joints.1];
        let l1 = geometry.proximal();
        let l2 = geometry.distal();

        let dx = geometry.base_span() + l1 * (a.cos() - b.cos());
        let dy = l1 * (a.sin() - b.sin());
        let d = (dx * dx + dy * dy).sqrt();
        let r = d / (2.0 * l2);

        if !(r <= 1.0) {
            return Err(GeometryError::Infeasible {
                sub_chain: self.id,
                ratio: r,
            });
        }

        // Coincident distal bases leave the elbow direction undefined
        if d <= SINGULARITY_EPSILON {
            return Err(GeometryError::Singular {
                sub_chain: self.id,
                ratio: r,
            });
        }

        let phi = PI - r.acos() + (dy / dx).atan();

        Ok(SubChainSolution {
            px: l1 * a.cos() + l2 * phi.cos(),
            py: l1 * a.sin() + l2 * phi.sin(),
            dx,
            dy,
            d,
            r,
            phi,
        })
    }
}

impl Wrist {
    pub fn new(
        geometry: &LinkGeometry,
        angles: &JointAngles,
        sa: &SubChainSolution,
        sb: &SubChainSolution,
    ) -> Self {
        let k = geometry.wrist_offset();
        let (sin4, cos4) = angles[4].sin_cos();
        let (sin5, cos5) = angles[5].sin_cos();

        let ya = cos4 * sa.py - sin4 * k;
        let za = sin4 * sa.py + cos4 * k;
        let yb = cos5 * sb.py + sin5 * k;
        let zb = sin5 * sb.py - cos5 * k;

        Self {
            ya,
            za,
            yb,
            zb,
            den: geometry.wrist_span() + za - zb,
            cos4,
            sin4,
            cos5,
            sin5,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert raw encoder counts into joint angles.
pub fn encoder_counts_to_joint_angles(counts: &EncoderCounts) -> JointAngles {
    JointAngles::from_fn(|i, _| {
        counts[i] as f64 * ENCODER_FACTORS_RAD[i] + CALIBRATION_ANGLES_RAD[i]
    })
}

/// Compute the task space pose of the wand for the given joint angles.
pub fn forward_kinematics(
    geometry: &LinkGeometry,
    angles: &JointAngles,
) -> Result<Pose, GeometryError> {
    let sa = SubChain::A.solve(geometry, angles)?;
    let sb = SubChain::B.solve(geometry, angles)?;

    let w = Wrist::new(geometry, angles, &sa, &sb);

    Ok(Pose::new(
        0.5 * (geometry.base_span() + sa.px + sb.px),
        0.5 * (w.ya + w.yb),
        0.5 * (w.za + w.zb),
        -((w.ya - w.yb) / w.den).atan(),
        ((sa.px - sb.px) / w.den).atan(),
    ))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn calibration_angles() -> JointAngles {
        JointAngles::from_column_slice(&CALIBRATION_ANGLES_RAD)
    }

    #[test]
    fn test_zero_counts_give_calibration_angles() {
        let angles = encoder_counts_to_joint_angles(&[0; NUM_JOINTS]);
        assert_eq!(angles, calibration_angles());
    }

    #[test]
    fn test_encoder_direction() {
        let angles = encoder_counts_to_joint_angles(&[5000, 5000, 5000, 5000, -5000, 10000]);
        let quarter = PI / 2.0;

        assert!((angles[0] - (CALIBRATION_ANGLES_RAD[0] + quarter)).abs() < 1e-12);
        assert!((angles[1] - (CALIBRATION_ANGLES_RAD[1] + quarter)).abs() < 1e-12);
        assert!((angles[2] - (CALIBRATION_ANGLES_RAD[2] - quarter)).abs() < 1e-12);
        assert!((angles[3] - (CALIBRATION_ANGLES_RAD[3] - quarter)).abs() < 1e-12);
        assert!((angles[4] + quarter).abs() < 1e-12);
        assert!((angles[5] - PI).abs() < 1e-12);
    }

    #[test]
    fn test_default_geometry() {
        let geom = LinkGeometry::default();
        assert!(geom.is_valid());
        assert!((geom.link_lengths_m[0] - 0.144018).abs() < 1e-12);
        assert!((geom.link_lengths_m[5] - 0.1778).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_pose() {
        let geom = LinkGeometry::default();
        let pose = forward_kinematics(&geom, &calibration_angles()).unwrap();

        // The elbow closes symmetrically in the calibration pose
        let sa = SubChain::A.solve(&geom, &calibration_angles()).unwrap();
        let y_cal = geom.proximal() * CALIBRATION_ANGLES_RAD[0].sin()
            + geom.distal() * (1.0 - sa.r * sa.r).sqrt();

        let expected = Pose::new(0.0, y_cal, 0.0, 0.0, 0.0);
        assert!((pose - expected).amax() < 1e-9, "pose = {}", pose);
        assert!((y_cal - 0.124024552966507).abs() < 1e-9);
    }

    #[test]
    fn test_wrist_roll() {
        let geom = LinkGeometry::default();
        let mut angles = calibration_angles();
        angles[4] = 0.1;
        angles[5] = 0.1;

        // Rotating both wrist joints together rolls the handle without moving it along x
        let pose = forward_kinematics(&geom, &angles).unwrap();
        assert!(pose[0].abs() < 1e-9);
        assert!(pose[4].abs() < 1e-9);
        assert!(pose[3].abs() > 1e-3);
    }

    #[test]
    fn test_infeasible() {
        // The wand's own distal links always reach, shorten them so they can't
        let mut geom = LinkGeometry::default();
        geom.link_lengths_m[1] = 0.05;

        let mut angles = calibration_angles();
        angles[0] = 1.0;
        angles[1] = 1.0;
        angles[2] = 0.0;
        angles[3] = PI;

        match forward_kinematics(&geom, &angles) {
            Err(GeometryError::Infeasible { sub_chain, ratio }) => {
                assert_eq!(sub_chain, SubChainId::B);
                assert!(ratio > 1.0);
            }
            r => panic!("Expected infeasible geometry, got {:?}", r),
        }
    }

    #[test]
    fn test_coincident_distal_bases() {
        // Mirror image proximal links whose tips meet at the same point
        let geom = LinkGeometry::default();
        let a = (-geom.base_span() / (2.0 * geom.proximal())).acos();

        let mut angles = calibration_angles();
        angles[0] = a;
        angles[1] = PI - a;

        match forward_kinematics(&geom, &angles) {
            Err(GeometryError::Singular { sub_chain, ratio }) => {
                assert_eq!(sub_chain, SubChainId::A);
                assert!(ratio < 1e-6);
            }
            r => panic!("Expected a singular sub-chain, got {:?}", r),
        }
    }
}
