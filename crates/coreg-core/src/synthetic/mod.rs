//! Deterministic synthetic data generation helpers.
//!
//! Small building blocks for constructing co-registration problems with a
//! known answer:
//! - point clouds filling an axis-aligned box,
//! - tracker poses with bounded rotation,
//! - deterministic pseudo-random noise.
//!
//! Everything is keyed by explicit seeds and indices, so the same call
//! always returns the same data.
//!
//! # Example
//!
//! ```
//! use coreg_core::synthetic::{noise::UniformNoise, poses};
//!
//! let points = poses::box_points(7, 24, 0.5);
//! assert_eq!(points.len(), 24);
//!
//! let jitter = UniformNoise { seed: 3, max_abs: 1e-3 };
//! let p = jitter.apply(0, 0, points[0]);
//! assert!((p - points[0]).amax() <= 1e-3 + 1e-12);
//! ```

pub mod noise;
pub mod poses;
