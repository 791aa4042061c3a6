//! Deterministic noise helpers for synthetic datasets.
//!
//! The functions here avoid `thread_rng` and do not depend on the internal
//! algorithm of `rand` RNGs. This keeps synthetic datasets stable across
//! versions and platforms.

use crate::{Real, Vec3};

/// Deterministic uniform noise in `[-max_abs, +max_abs]` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformNoise {
    /// Base seed controlling the pseudo-random sequence.
    pub seed: u64,
    /// Maximum absolute per-axis noise.
    pub max_abs: Real,
}

impl UniformNoise {
    /// Sample a deterministic 3D noise vector for a given `(stream, index)` key.
    #[inline]
    pub fn sample(&self, stream: usize, index: usize) -> Vec3 {
        let max_abs = self.max_abs.abs();
        if max_abs == 0.0 {
            return Vec3::zeros();
        }

        let key = mix_key(self.seed, stream, index);
        Vec3::new(
            symmetric_unit(key),
            symmetric_unit(key ^ 0x94D0_49BB_1331_11EB),
            symmetric_unit(key ^ 0xD6E8_FEB8_6659_FD93),
        ) * max_abs
    }

    /// Apply deterministic noise to a position.
    #[inline]
    pub fn apply(&self, stream: usize, index: usize, v: Vec3) -> Vec3 {
        v + self.sample(stream, index)
    }
}

/// Deterministic scalar in `[0, 1)` for a given `(seed, stream, index)` key.
#[inline]
pub fn unit_sample(seed: u64, stream: usize, index: usize) -> Real {
    u64_to_unit_f64(splitmix64(mix_key(seed, stream, index)))
}

/// Map a key to `[-1, 1)`.
#[inline]
fn symmetric_unit(key: u64) -> Real {
    (u64_to_unit_f64(splitmix64(key)) - 0.5) * 2.0
}

#[inline]
fn mix_key(seed: u64, stream: usize, index: usize) -> u64 {
    // SplitMix64 stream selection via a stable integer mix.
    seed ^ (stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (index as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn u64_to_unit_f64(x: u64) -> Real {
    // Top 53 bits as a double in [0, 1).
    let mantissa = x >> 11;
    (mantissa as Real) * (1.0 / ((1u64 << 53) as Real))
}
