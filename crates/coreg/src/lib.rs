//! High-level entry crate for `coreg-rs`.
//!
//! Estimates the transform between a head-mounted tracker and a handheld
//! controller from streamed pose pairs.
//!
//! ## Session API
//!
//! Push correlations as they arrive; the session solves once the configured
//! number of samples is buffered:
//!
//! ```no_run
//! use coreg::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut session = RegistrationSession::new(AbsoluteOrientation::new(), SessionConfig::default());
//! # let samples: Vec<(Vec3, Vec3)> = vec![];
//! for (head, controller) in samples {
//!     if let SessionStatus::Registered = session.push(PointCorrelation::new(head, controller))? {
//!         break;
//!     }
//! }
//! if let Some(estimate) = session.estimate() {
//!     println!("controller -> head: {}", estimate.inverse_transform());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Solver API
//!
//! Drive [`linear::AbsoluteOrientation`] or [`linear::HandEyeCalibration`]
//! directly when the host decides when to compute.

pub use coreg_core as core;
pub use coreg_linear as linear;

pub mod session;

pub mod prelude {
    pub use crate::session::{RegistrationSession, SessionConfig, SessionStatus};
    pub use coreg_core::{Mat4, Quat, Real, Vec3};
    pub use coreg_linear::{
        AbsoluteOrientation, Coregistration, CoregistrationError, HandEyeCalibration,
        HandEyeEstimate, PointCorrelation, PoseCorrelation, SimilarityEstimate,
    };
}
