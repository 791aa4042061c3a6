use coreg_core::{
    synthetic::{
        noise::UniformNoise,
        poses::{box_points, random_poses},
    },
    translation_column, Iso3, Quat, Real, Vec3,
};
use coreg_linear::{
    AbsoluteOrientation, Coregistration, CoregistrationError, HandEyeCalibration,
    PointCorrelation, PoseCorrelation,
};
use nalgebra::{Point3, Translation3};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

fn similarity_pairs(n: usize) -> (Quat, Vec3, Real, Vec<PointCorrelation>) {
    let rotation = Quat::from_euler_angles(-0.4, 0.25, 1.1);
    let translation = Vec3::new(1.2, 0.3, -0.7);
    let scale = 0.6;

    let pairs = box_points(99, n, 0.8)
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            PointCorrelation::with_angle(i as Real, p, scale * (rotation * p) + translation)
        })
        .collect();
    (rotation, translation, scale, pairs)
}

fn solve<S: Coregistration>(
    mut solver: S,
    data: Vec<S::Observation>,
) -> Result<S::Estimate, CoregistrationError> {
    for obs in data {
        solver.add(obs);
    }
    solver.compute()
}

#[test]
fn horn_is_invariant_to_insertion_order() {
    let (_, _, _, pairs) = similarity_pairs(60);
    let mut shuffled = pairs.clone();
    shuffled.shuffle(&mut StdRng::seed_from_u64(42));

    let a = solve(AbsoluteOrientation::new(), pairs).unwrap();
    let b = solve(AbsoluteOrientation::new(), shuffled).unwrap();

    assert!(a.rotation.angle_to(&b.rotation) < 1e-6);
    assert!((a.translation - b.translation).norm() < 1e-9);
    assert!((a.scale - b.scale).norm() < 1e-9);
}

#[test]
fn horn_tolerates_noise_and_a_few_outliers() {
    let (rotation, translation, scale, mut pairs) = similarity_pairs(200);
    let noise = UniformNoise {
        seed: 5,
        max_abs: 1e-3,
    };
    for (i, p) in pairs.iter_mut().enumerate() {
        p.target = noise.apply(0, i, p.target);
    }
    // Tracking glitches: target jumps far away from the head.
    for k in 0..5 {
        pairs[k * 37].target += Vec3::new(6.0, -6.0, 6.0);
    }

    let mut solver = AbsoluteOrientation::new();
    for p in pairs {
        solver.add(p);
    }
    let est = solver.compute().unwrap().clone();

    assert!(solver.len() <= 195);
    assert!(est.rotation.angle_to(&rotation) < 5e-3);
    assert!((est.translation - translation).norm() < 5e-3);
    assert!((est.scale.x - scale).abs() < 5e-3);
    assert_eq!(est.scale.x, est.scale.y);
    assert_eq!(est.scale.y, est.scale.z);
}

fn handeye_pairs(n: usize, global: &Iso3, local: &Vec3) -> Vec<PoseCorrelation> {
    random_poses(8, n, 1.0, 0.4)
        .into_iter()
        .map(|h| {
            let tip = h.transform_point(&Point3::from(*local));
            let mut c = PoseCorrelation::new(
                h.translation.vector,
                h.rotation,
                global.inverse_transform_point(&tip).coords,
            );
            c.target_orientation = Some(h.rotation);
            c
        })
        .collect()
}

#[test]
fn handeye_recovers_transforms_through_trait() {
    let global = Iso3::from_parts(
        Translation3::new(-0.3, 1.4, 0.2),
        Quat::from_euler_angles(0.05, -0.6, 0.9),
    );
    let local = Vec3::new(0.0, 0.04, -0.12);

    let est = solve(HandEyeCalibration::new(), handeye_pairs(40, &global, &local)).unwrap();

    assert!((est.global - global.to_homogeneous()).amax() < 1e-8);
    assert!((translation_column(&est.local) - local).amax() < 1e-8);
}

#[test]
fn handeye_recovers_scaled_global_block() {
    // The 3×3 block is unconstrained, so a tracker reporting in different
    // units shows up as a scaled rotation.
    let rotation = Quat::from_euler_angles(0.3, 0.0, -0.2);
    let units = 100.0;
    let local = Vec3::new(0.03, 0.0, 0.08);

    let mut solver = HandEyeCalibration::new();
    for h in random_poses(13, 30, 0.9, 0.5) {
        let tip = h.transform_point(&Point3::from(local));
        // tip = units^-1 R c + g  =>  c = units R^T (tip - g)
        let g = Vec3::new(0.1, 0.2, 0.3);
        let c = units * (rotation.inverse() * (tip.coords - g));
        solver.add(PoseCorrelation::new(h.translation.vector, h.rotation, c));
    }
    let est = solver.compute().unwrap();

    let expected = rotation.to_rotation_matrix().into_inner() / units;
    let block = est.global.fixed_view::<3, 3>(0, 0).into_owned();
    assert!((block - expected).amax() < 1e-9);
    assert!((translation_column(&est.global) - Vec3::new(0.1, 0.2, 0.3)).amax() < 1e-8);
    assert!((translation_column(&est.local) - local).amax() < 1e-8);
}

#[test]
fn handeye_rejects_too_few_survivors() {
    // Five buffered samples pass the first check, but one is a tracking
    // glitch and only four survive the filter.
    let global = Iso3::identity();
    let local = Vec3::zeros();
    let mut pairs = handeye_pairs(5, &global, &local);
    pairs[0].target_position += Vec3::new(10.0, 0.0, 0.0);

    let mut solver = HandEyeCalibration::new();
    for p in pairs {
        solver.add(p);
    }

    match solver.compute() {
        Err(CoregistrationError::InsufficientSamples { needed: 5, got }) => assert!(got < 5),
        other => panic!("expected InsufficientSamples, got {other:?}"),
    }
}
