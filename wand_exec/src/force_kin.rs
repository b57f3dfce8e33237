//! # Force kinematics
//!
//! Maps a generalised force in task space onto the joint torques which render it, through the
//! transpose of the analytic Jacobian of [`forward_kinematics`](crate::kinematics::forward_kinematics).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Matrix5x6, Vector5, Vector6};

use crate::kinematics::{
    GeometryError, JointAngles, LinkGeometry, SubChain, SubChainSolution, Wrist,
    SINGULARITY_EPSILON,
};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Partial derivatives of the task space pose with respect to the joint angles. Rows follow the
/// pose, columns the joints.
pub type Jacobian = Matrix5x6<f64>;

/// Generalised task space force `[fx, fy, fz, t_roll, t_pitch]`.
///
/// Units: newtons, newtons, newtons, newton meters, newton meters
pub type TaskForce = Vector5<f64>;

/// Joint torques.
///
/// Units: newton meters
pub type JointTorques = Vector6<f64>;

/// Gradient of a scalar with respect to the six joint angles.
type Gradient = Vector6<f64>;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compute the Jacobian of the forward kinematics at the given joint angles.
pub fn compute_jacobian(
    geometry: &LinkGeometry,
    angles: &JointAngles,
) -> Result<Jacobian, GeometryError> {
    let sa = SubChain::A.solve(geometry, angles)?;
    let sb = SubChain::B.solve(geometry, angles)?;
    let w = Wrist::new(geometry, angles, &sa, &sb);

    let (gpxa, gpya) = sub_chain_gradients(&SubChain::A, geometry, angles, &sa)?;
    let (gpxb, gpyb) = sub_chain_gradients(&SubChain::B, geometry, angles, &sb)?;

    // Wrist rotations of the sub-chain tips
    let mut gya = gpya * w.cos4;
    let mut gza = gpya * w.sin4;
    gya[4] = -w.za;
    gza[4] = w.ya;

    let mut gyb = gpyb * w.cos5;
    let mut gzb = gpyb * w.sin5;
    gyb[5] = -w.zb;
    gzb[5] = w.yb;

    let gden = gza - gzb;

    // Roll, -atan(n / den) with n = ya - yb
    let n_roll = w.ya - w.yb;
    let g_roll = -(w.den * (gya - gyb) - n_roll * gden) / (w.den * w.den + n_roll * n_roll);

    // Pitch, atan(n / den) with n = pxa - pxb
    let n_pitch = sa.px - sb.px;
    let g_pitch = (w.den * (gpxa - gpxb) - n_pitch * gden) / (w.den * w.den + n_pitch * n_pitch);

    let mut jac = Jacobian::zeros();
    jac.set_row(0, &((gpxa + gpxb) * 0.5).transpose());
    jac.set_row(1, &((gya + gyb) * 0.5).transpose());
    jac.set_row(2, &((gza + gzb) * 0.5).transpose());
    jac.set_row(3, &g_roll.transpose());
    jac.set_row(4, &g_pitch.transpose());

    Ok(jac)
}

/// Compute the joint torques rendering `force` at the given joint angles, `J^T * F`.
pub fn inverse_force_kinematics(
    geometry: &LinkGeometry,
    angles: &JointAngles,
    force: &TaskForce,
) -> Result<JointTorques, GeometryError> {
    Ok(compute_jacobian(geometry, angles)?.tr_mul(force))
}

/// Gradients of a sub-chain tip position `(px, py)` with respect to the joint angles. Only the
/// two base joints of the sub-chain have non-zero entries.
fn sub_chain_gradients(
    chain: &SubChain,
    geometry: &LinkGeometry,
    angles: &JointAngles,
    sol: &SubChainSolution,
) -> Result<(Gradient, Gradient), GeometryError> {
    let one_minus_r2 = 1.0 - sol.r * sol.r;
    if one_minus_r2 <= SINGULARITY_EPSILON || sol.d <= SINGULARITY_EPSILON {
        return Err(GeometryError::Singular {
            sub_chain: chain.id,
            ratio: sol.r,
        });
    }

    let (ia, ib) = chain.joints;
    let (sin_a, cos_a) = angles[ia].sin_cos();
    let (sin_b, cos_b) = angles[ib].sin_cos();
    let (sin_phi, cos_phi) = sol.phi.sin_cos();
    let l1 = geometry.proximal();
    let l2 = geometry.distal();

    // Derivatives of dx and dy with respect to (a, b)
    let ddx = [-l1 * sin_a, l1 * sin_b];
    let ddy = [l1 * cos_a, -l1 * cos_b];

    let mut dphi = [0.0; 2];
    for j in 0..2 {
        let dd = (sol.dx * ddx[j] + sol.dy * ddy[j]) / sol.d;
        dphi[j] = dd / (2.0 * l2 * one_minus_r2.sqrt())
            + (sol.dx * ddy[j] - sol.dy * ddx[j]) / (sol.d * sol.d);
    }

    let mut gpx = Gradient::zeros();
    let mut gpy = Gradient::zeros();

    gpx[ia] = -l1 * sin_a - l2 * sin_phi * dphi[0];
    gpx[ib] = -l2 * sin_phi * dphi[1];
    gpy[ia] = l1 * cos_a + l2 * cos_phi * dphi[0];
    gpy[ib] = l2 * cos_phi * dphi[1];

    Ok((gpx, gpy))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
