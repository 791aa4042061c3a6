//! QR15 hand-eye calibration (`AX = YB` without target orientation).
//!
//! Each correlation pairs a reference pose `H_i = [R_i | p_i]` with a target
//! position `c_i`. The unknowns are a global transform `G = [M | g]` taking
//! target coordinates into the reference world frame (`M` is a general 3×3
//! block, so scale and shear are absorbed) and a local offset `l` of the
//! target expressed in the reference body frame:
//!
//! ```text
//! M c_i + g = R_i l + p_i
//! ```
//!
//! Premultiplying by `R_iᵀ` makes the system linear in the 15 unknowns
//! `(M[:,0], M[:,1], M[:,2], g, l)`, solved in the least-squares sense with an
//! SVD. At least five correlations are needed for `3n ≥ 15` rows.
//!
//! # References
//!
//! F. Ernst et al., "Non-orthogonal tool/flange and robot/world calibration",
//! IJMRCAS 8(4), 2012.

use coreg_core::{linear_block, translation_column, trs, Mat4, Quat, Real, Vec3};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector, Matrix3, SVD};
use serde::{Deserialize, Serialize};

use crate::{
    CoregistrationError, CorrelationBuffer, OutlierOptions, OutlierReport, PoseCorrelation,
    Result,
};

/// Minimum number of correlations for a determined QR15 system.
pub const HANDEYE_MIN_SAMPLES: usize = 5;

const UNKNOWNS: usize = 15;
const SVD_MAX_ITERS: usize = 1000;

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandEyeOptions {
    pub outliers: OutlierOptions,
    /// Singular values below `rank_tolerance · σ_max` count as zero.
    pub rank_tolerance: Real,
}

impl Default for HandEyeOptions {
    fn default() -> Self {
        Self {
            outliers: OutlierOptions::default(),
            rank_tolerance: 1e-10,
        }
    }
}

/// Global and local transforms recovered by [`HandEyeCalibration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandEyeEstimate {
    /// Target frame into reference world frame.
    pub global: Mat4,
    /// Target offset in the reference body frame (identity rotation).
    pub local: Mat4,
}

impl HandEyeEstimate {
    /// Split the 15-vector solution into the two transforms.
    fn from_solution(x: &DVector<Real>) -> Self {
        let mut global = Mat4::identity();
        for col in 0..4 {
            for row in 0..3 {
                global[(row, col)] = x[3 * col + row];
            }
        }

        let mut local = Mat4::identity();
        for row in 0..3 {
            local[(row, 3)] = x[12 + row];
        }

        Self { global, local }
    }
}

/// Assemble the `3n × 15` system `A x = b`.
///
/// Row block `i`, with `RM = R_iᵀ`:
/// `[RM·c_x | RM·c_y | RM·c_z | RM | -I] x = RM · p_i`.
pub fn qr15_system(correlations: &[PoseCorrelation]) -> (DMatrix<Real>, DVector<Real>) {
    let n = correlations.len();
    let mut a = DMatrix::<Real>::zeros(3 * n, UNKNOWNS);
    let mut b = DVector::<Real>::zeros(3 * n);
    let unit = Vec3::repeat(1.0);

    for (i, c) in correlations.iter().enumerate() {
        let h = trs(&c.reference_position, &c.reference_orientation, &unit);
        let t = trs(&c.target_position, &Quat::identity(), &unit);

        let rm = linear_block(&h).transpose();
        let row = 3 * i;

        a.view_mut((row, 0), (3, 3)).copy_from(&(rm * t[(0, 3)]));
        a.view_mut((row, 3), (3, 3)).copy_from(&(rm * t[(1, 3)]));
        a.view_mut((row, 6), (3, 3)).copy_from(&(rm * t[(2, 3)]));
        a.view_mut((row, 9), (3, 3)).copy_from(&rm);
        a.view_mut((row, 12), (3, 3))
            .copy_from(&(-Matrix3::<Real>::identity()));

        b.rows_mut(row, 3)
            .copy_from(&(rm * translation_column(&h)));
    }

    (a, b)
}

/// Least-squares solve of the QR15 system with a rank check.
fn solve_qr15(a: DMatrix<Real>, b: &DVector<Real>, rank_tolerance: Real) -> Result<DVector<Real>> {
    // Non-finite entries keep the SVD iterating without converging.
    if !a.iter().chain(b.iter()).all(|v| v.is_finite()) {
        warn!("QR15 system contains non-finite values");
        return Err(CoregistrationError::NumericalInstability(
            "QR15 system contains non-finite values".into(),
        ));
    }

    let svd = SVD::try_new(a, true, true, Real::EPSILON, SVD_MAX_ITERS).ok_or_else(|| {
        warn!("SVD of the QR15 system did not converge");
        CoregistrationError::NumericalInstability("SVD of the QR15 system did not converge".into())
    })?;

    let sigma_max = svd.singular_values.max();
    let threshold = rank_tolerance.abs() * sigma_max;
    let rank = svd.rank(threshold);
    if rank < UNKNOWNS {
        warn!("QR15 system is rank deficient ({rank} of {UNKNOWNS}, σ_max = {sigma_max:e})");
        return Err(CoregistrationError::DegenerateInput(format!(
            "QR15 coefficient matrix has rank {rank}, need {UNKNOWNS}"
        )));
    }

    svd.solve(b, threshold)
        .map_err(|e| CoregistrationError::NumericalInstability(format!("QR15 solve failed: {e}")))
}

/// Hand-eye co-registration from reference poses and target positions.
///
/// `global_transform` and `local_transform` read as identity until a
/// [`compute`](Self::compute) succeeds; check
/// [`is_registered`](Self::is_registered) first.
#[derive(Debug, Clone)]
pub struct HandEyeCalibration {
    buffer: CorrelationBuffer<PoseCorrelation>,
    options: HandEyeOptions,
    global_transform: Mat4,
    local_transform: Mat4,
    is_registered: bool,
    last_filter: Option<OutlierReport>,
}

impl Default for HandEyeCalibration {
    fn default() -> Self {
        Self::with_options(HandEyeOptions::default())
    }
}

impl HandEyeCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: HandEyeOptions) -> Self {
        Self {
            buffer: CorrelationBuffer::new(),
            options,
            global_transform: Mat4::identity(),
            local_transform: Mat4::identity(),
            is_registered: false,
            last_filter: None,
        }
    }

    pub fn options(&self) -> &HandEyeOptions {
        &self.options
    }

    pub fn add(&mut self, correlation: PoseCorrelation) {
        self.buffer.push(correlation);
    }

    pub fn buffer(&self) -> &CorrelationBuffer<PoseCorrelation> {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_registered(&self) -> bool {
        self.is_registered
    }

    /// Statistics of the outlier pass run by the last compute attempt.
    pub fn last_filter(&self) -> Option<&OutlierReport> {
        self.last_filter.as_ref()
    }

    /// Filter outliers, assemble the QR15 system and solve it.
    ///
    /// Fails with [`CoregistrationError::InsufficientSamples`] when fewer than
    /// five correlations are buffered (or survive filtering), and with
    /// [`CoregistrationError::DegenerateInput`] when the system is rank
    /// deficient, e.g. every reference pose has the same orientation.
    /// After success further calls return the stored transforms.
    pub fn compute(&mut self) -> Result<HandEyeEstimate> {
        if self.is_registered {
            debug!("hand-eye already registered, keeping transforms");
            return Ok(self.current());
        }

        let got = self.buffer.len();
        if got < HANDEYE_MIN_SAMPLES {
            return Err(CoregistrationError::InsufficientSamples {
                needed: HANDEYE_MIN_SAMPLES,
                got,
            });
        }

        let report = self.buffer.remove_outliers(&self.options.outliers)?;
        self.last_filter = Some(report);
        if report.kept < HANDEYE_MIN_SAMPLES {
            return Err(CoregistrationError::InsufficientSamples {
                needed: HANDEYE_MIN_SAMPLES,
                got: report.kept,
            });
        }

        let correlations: Vec<PoseCorrelation> =
            self.buffer.iter().map(|c| c.observation).collect();
        let (a, b) = qr15_system(&correlations);
        let x = solve_qr15(a, &b, self.options.rank_tolerance)?;
        let estimate = HandEyeEstimate::from_solution(&x);

        info!(
            "hand-eye from {} correlations: global translation {:?}, local offset {:?}",
            correlations.len(),
            translation_column(&estimate.global).as_slice(),
            translation_column(&estimate.local).as_slice()
        );

        self.global_transform = estimate.global;
        self.local_transform = estimate.local;
        self.is_registered = true;
        Ok(estimate)
    }

    fn current(&self) -> HandEyeEstimate {
        HandEyeEstimate {
            global: self.global_transform,
            local: self.local_transform,
        }
    }

    pub fn estimate(&self) -> Option<HandEyeEstimate> {
        self.is_registered.then(|| self.current())
    }

    pub fn global_transform(&self) -> &Mat4 {
        &self.global_transform
    }

    pub fn local_transform(&self) -> &Mat4 {
        &self.local_transform
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.global_transform = Mat4::identity();
        self.local_transform = Mat4::identity();
        self.is_registered = false;
        self.last_filter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coreg_core::{synthetic::poses::random_poses, Iso3};
    use nalgebra::{Point3, Translation3};

    fn ground_truth() -> (Iso3, Vec3) {
        let global = Iso3::from_parts(
            Translation3::new(0.4, -0.2, 1.1),
            Quat::from_euler_angles(0.1, 0.2, -0.3),
        );
        let local = Vec3::new(0.02, -0.05, 0.1);
        (global, local)
    }

    /// Target position consistent with `G c = H l`.
    fn correlations(global: &Iso3, local: &Vec3, n: usize) -> Vec<PoseCorrelation> {
        random_poses(21, n, 0.8, 0.5)
            .into_iter()
            .map(|h| {
                let tip = h.transform_point(&Point3::from(*local));
                let target = global.inverse_transform_point(&tip);
                PoseCorrelation::new(h.translation.vector, h.rotation, target.coords)
            })
            .collect()
    }

    #[test]
    fn system_rows_vanish_at_ground_truth() {
        let (global, local) = ground_truth();
        let data = correlations(&global, &local, 8);
        let (a, b) = qr15_system(&data);

        assert_eq!(a.shape(), (24, 15));
        assert_eq!(b.len(), 24);

        let g = global.to_homogeneous();
        let mut x = DVector::<Real>::zeros(15);
        for col in 0..4 {
            for row in 0..3 {
                x[3 * col + row] = g[(row, col)];
            }
        }
        x.rows_mut(12, 3).copy_from(&local);

        let residual = &a * &x - &b;
        assert!(residual.amax() < 1e-12, "residual {}", residual.amax());
    }

    #[test]
    fn recovers_global_and_local_transforms() {
        let (global, local) = ground_truth();
        let mut solver = HandEyeCalibration::new();
        for c in correlations(&global, &local, 24) {
            solver.add(c);
        }

        let est = solver.compute().unwrap();
        assert!((est.global - global.to_homogeneous()).amax() < 1e-8);
        assert!((translation_column(&est.local) - local).amax() < 1e-8);
        assert_eq!(linear_block(&est.local), Matrix3::identity());
        assert!(solver.is_registered());
        assert_eq!(solver.global_transform(), &est.global);
    }

    #[test]
    fn four_samples_are_insufficient() {
        let (global, local) = ground_truth();
        let mut solver = HandEyeCalibration::new();
        for c in correlations(&global, &local, 4) {
            solver.add(c);
        }

        assert_eq!(
            solver.compute(),
            Err(CoregistrationError::InsufficientSamples { needed: 5, got: 4 })
        );
        assert!(solver.last_filter().is_none());
        assert!(!solver.is_registered());
        assert_eq!(solver.global_transform(), &Mat4::identity());
        assert_eq!(solver.local_transform(), &Mat4::identity());
    }

    #[test]
    fn fixed_orientation_is_rank_deficient() {
        let (global, local) = ground_truth();
        let mut solver = HandEyeCalibration::new();
        for mut c in correlations(&global, &local, 20) {
            c.reference_orientation = Quat::identity();
            solver.add(c);
        }

        match solver.compute() {
            Err(CoregistrationError::DegenerateInput(_)) => {}
            other => panic!("expected DegenerateInput, got {other:?}"),
        }
        assert!(solver.estimate().is_none());
    }

    #[test]
    fn non_finite_target_fails_instead_of_hanging() {
        let (global, local) = ground_truth();
        let mut solver = HandEyeCalibration::new();
        for (i, mut c) in correlations(&global, &local, 20).into_iter().enumerate() {
            if i == 7 {
                c.target_position.x = Real::NAN;
            }
            solver.add(c);
        }

        match solver.compute() {
            Err(CoregistrationError::NumericalInstability(_)) => {}
            other => panic!("expected NumericalInstability, got {other:?}"),
        }
        assert!(!solver.is_registered());
        assert_eq!(solver.global_transform(), &Mat4::identity());
    }

    #[test]
    fn reset_returns_to_identity() {
        let (global, local) = ground_truth();
        let mut solver = HandEyeCalibration::new();
        for c in correlations(&global, &local, 12) {
            solver.add(c);
        }
        solver.compute().unwrap();

        solver.reset();
        assert!(!solver.is_registered());
        assert!(solver.is_empty());
        assert_eq!(solver.global_transform(), &Mat4::identity());
    }
}
