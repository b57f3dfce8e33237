//! # Force Pipeline Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use util::module::State;
use wand_lib::{
    force_ctrl::{ForceCtrl, InputData, Params},
    force_kin::{compute_jacobian, TaskForce},
    kinematics::{encoder_counts_to_joint_angles, forward_kinematics, LinkGeometry},
};

fn force_pipeline_benchmark(c: &mut Criterion) {
    // ---- Build a configuration away from the calibration pose ----

    let geometry = LinkGeometry::default();
    let counts = [150, -220, 90, 310, -800, 450];
    let angles = encoder_counts_to_joint_angles(&counts);
    let force = TaskForce::new(1.0, -0.5, 2.0, 0.01, -0.02);

    // Bench the kinematics alone
    c.bench_function("forward_kinematics", |b| {
        b.iter(|| forward_kinematics(&geometry, black_box(&angles)).unwrap())
    });

    c.bench_function("compute_jacobian", |b| {
        b.iter(|| compute_jacobian(&geometry, black_box(&angles)).unwrap())
    });

    // Bench a full force control cycle, counts to voltages
    let mut force_ctrl = ForceCtrl::default();
    force_ctrl.init(Params::default()).unwrap();

    c.bench_function("ForceCtrl::proc", |b| {
        b.iter(|| {
            let angles = encoder_counts_to_joint_angles(black_box(&counts));
            forward_kinematics(&geometry, &angles).unwrap();
            force_ctrl
                .proc(&InputData {
                    angles,
                    force,
                    dt_s: 0.001,
                })
                .unwrap()
        })
    });
}

criterion_group!(benches, force_pipeline_benchmark);
criterion_main!(benches);
