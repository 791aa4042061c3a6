//! Position-only co-registration of a headset and a controller.
//!
//! Simulates a user waving a controller around while both trackers report
//! positions in their own frames, then recovers the similarity transform
//! between the frames through a [`RegistrationSession`].
//!
//! Run with: `RUST_LOG=debug cargo run -p coreg --example horn_synthetic`

use anyhow::{bail, Result};
use coreg::core::synthetic::{noise::UniformNoise, poses::box_points};
use coreg::prelude::*;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Headset / Controller Absolute Orientation (Synthetic) ===\n");

    // Ground truth: controller frame is rotated, shifted and in centimetres.
    let rotation_gt = Quat::from_euler_angles(0.1, -0.35, 1.2);
    let translation_gt = Vec3::new(25.0, 140.0, -10.0);
    let scale_gt = 100.0;

    println!("Ground truth:");
    println!("  Rotation (rpy): {:?}", rotation_gt.euler_angles());
    println!("  Translation: {:?}", translation_gt.as_slice());
    println!("  Scale: {scale_gt:.3}");
    println!();

    let noise = UniformNoise {
        seed: 7,
        max_abs: 0.002,
    };
    let config = SessionConfig::default();
    let mut session = RegistrationSession::new(AbsoluteOrientation::new(), config);

    // Controller positions within half a metre of the head.
    let heads = box_points(3, 2 * config.target_samples, 0.5);
    let mut pushed = 0;
    for (i, head) in heads.into_iter().enumerate() {
        let mut controller = scale_gt * (rotation_gt * noise.apply(0, i, head)) + translation_gt;
        // Occasional tracking glitch.
        if i % 97 == 13 {
            controller += Vec3::new(300.0, 0.0, -300.0);
        }
        pushed += 1;
        if session.push(PointCorrelation::new(controller, head))? == SessionStatus::Registered {
            break;
        }
    }

    let Some(estimate) = session.estimate() else {
        bail!("session did not register after {pushed} samples");
    };

    println!("Registered after {pushed} samples ({} kept):", session.solver().len());
    println!("  Rotation (rpy): {:?}", estimate.rotation.euler_angles());
    println!("  Translation: {:?}", estimate.translation.as_slice());
    println!("  Scale: {:.6}", estimate.scale.x);
    println!();

    // The solver maps controller positions onto head positions, so compare
    // against the inverse of the ground truth.
    let expected_rotation = rotation_gt.inverse();
    println!("Errors vs inverse ground truth:");
    println!(
        "  Rotation: {:.4} deg",
        estimate.rotation.angle_to(&expected_rotation).to_degrees()
    );
    println!("  Scale: {:.6}", (estimate.scale.x - 1.0 / scale_gt).abs());
    println!("  Transform:{}", estimate.transform);

    Ok(())
}
