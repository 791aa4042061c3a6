//! Core math primitives for `coreg-rs`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Mat4`, `Quat`, ...),
//! - homogeneous transform helpers (`trs`, block accessors),
//! - deterministic synthetic data used by tests and demos ([`synthetic`]).
//!
//! Everything is double precision. Consumers that need `f32` should convert
//! at their own boundary.

/// Linear algebra type aliases and homogeneous transform helpers.
pub mod math;
/// Deterministic synthetic point clouds, poses and noise.
pub mod synthetic;

pub use math::*;
