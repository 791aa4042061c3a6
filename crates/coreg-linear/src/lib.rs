//! Closed-form and linear co-registration solvers.
//!
//! Two solvers share one [`CorrelationBuffer`] and its median/MAD outlier
//! filter:
//! - [`AbsoluteOrientation`]: Horn's unit-quaternion method for rotation,
//!   translation and uniform scale from position pairs;
//! - [`HandEyeCalibration`]: the QR15 `AX = YB` variant recovering a global and
//!   a local transform from reference poses and target positions.
//!
//! Both implement [`Coregistration`], so callers can drive either one through
//! the same collect-then-compute loop.

mod correlation;
mod error;
mod handeye;
mod horn;
pub mod outliers;
mod solver;

pub use correlation::*;
pub use error::*;
pub use handeye::*;
pub use horn::*;
pub use outliers::{median_by_rank, OutlierOptions, OutlierReport};
pub use solver::*;
