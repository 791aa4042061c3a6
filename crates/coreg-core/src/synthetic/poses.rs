//! Synthetic point clouds and tracker poses.

use super::noise::unit_sample;
use crate::{Iso3, Quat, Real, Vec3};
use nalgebra::Translation3;

/// `n` points uniformly spread in the box `[-half_extent, half_extent]³`.
///
/// Point `i` only depends on `(seed, i)`, so prefixes are stable when `n`
/// grows.
pub fn box_points(seed: u64, n: usize, half_extent: Real) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            Vec3::new(
                symmetric(seed, 0, i),
                symmetric(seed, 1, i),
                symmetric(seed, 2, i),
            ) * half_extent
        })
        .collect()
}

/// `n` tracker poses with Euler angles in `[-max_angle, max_angle]` and
/// translations in `[-half_extent, half_extent]³`.
pub fn random_poses(seed: u64, n: usize, max_angle: Real, half_extent: Real) -> Vec<Iso3> {
    (0..n)
        .map(|i| {
            let rotation = Quat::from_euler_angles(
                symmetric(seed, 3, i) * max_angle,
                symmetric(seed, 4, i) * max_angle,
                symmetric(seed, 5, i) * max_angle,
            );
            let translation = Translation3::new(
                symmetric(seed, 6, i) * half_extent,
                symmetric(seed, 7, i) * half_extent,
                symmetric(seed, 8, i) * half_extent,
            );
            Iso3::from_parts(translation, rotation)
        })
        .collect()
}

fn symmetric(seed: u64, stream: usize, index: usize) -> Real {
    unit_sample(seed, stream, index) * 2.0 - 1.0
}
