//! Absolute orientation (similarity registration) with Horn's method.
//!
//! Given correlations `(r_i, t_i)`, finds rotation `R`, translation `T` and a
//! uniform scale `s` minimising `Σ |t_i - (s R r_i + T)|²`:
//!
//! 1. drop outlier correlations (median/MAD on pair distances),
//! 2. compute centroids and the 3×3 cross-covariance of centred positions,
//! 3. take the eigenvector of the largest eigenvalue of Horn's symmetric 4×4
//!    matrix `N` as the rotation quaternion `(w, x, y, z)`,
//! 4. `s = sqrt(Σ|t_i - t̄|² / Σ|r_i - r̄|²)`,
//! 5. `T = t̄ - s R r̄`.
//!
//! # References
//!
//! B.K.P. Horn, "Closed-form solution of absolute orientation using unit
//! quaternions", JOSA A 4(4), 1987.

use coreg_core::{trs, Mat3, Mat4, Quat, Real, Vec3};
use log::{debug, info, warn};
use nalgebra::{linalg::SymmetricEigen, Matrix4, Quaternion, Similarity3, Translation3};
use serde::{Deserialize, Serialize};

use crate::{
    Centroids, CoregistrationError, Correlation, CorrelationBuffer, OutlierOptions,
    PointCorrelation, Result,
};

/// Rotation estimator used by [`AbsoluteOrientation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMethod {
    /// Horn's closed-form unit-quaternion solution.
    #[default]
    Horn,
}

const EIGEN_MAX_ITERS: usize = 1000;
const SYMMETRY_TOL: Real = 1e-9;
const SPREAD_EPS: Real = 8.0 * Real::EPSILON;

impl RotationMethod {
    /// Estimate the rotation taking centred reference positions onto centred
    /// target positions.
    pub fn estimate(
        self,
        correlations: &[Correlation<PointCorrelation>],
        centroids: &Centroids,
    ) -> Result<Quat> {
        match self {
            RotationMethod::Horn => horn_rotation(correlations, centroids),
        }
    }
}

/// `s[(a, b)] = Σ (r_a - r̄_a)(t_b - t̄_b)`.
fn cross_covariance(
    correlations: &[Correlation<PointCorrelation>],
    centroids: &Centroids,
) -> Mat3 {
    let mut s = Mat3::zeros();
    for c in correlations {
        let dr = c.observation.reference - centroids.reference;
        let dt = c.observation.target - centroids.target;
        s += dr * dt.transpose();
    }
    s
}

/// Horn's symmetric 4×4 matrix built from the cross-covariance sums.
#[rustfmt::skip]
fn horn_matrix(s: &Mat3) -> Matrix4<Real> {
    let (sxx, sxy, sxz) = (s[(0, 0)], s[(0, 1)], s[(0, 2)]);
    let (syx, syy, syz) = (s[(1, 0)], s[(1, 1)], s[(1, 2)]);
    let (szx, szy, szz) = (s[(2, 0)], s[(2, 1)], s[(2, 2)]);

    Matrix4::new(
        sxx + syy + szz, syz - szy,        szx - sxz,        sxy - syx,
        syz - szy,       sxx - syy - szz,  sxy + syx,        szx + sxz,
        szx - sxz,       sxy + syx,        -sxx + syy - szz, syz + szy,
        sxy - syx,       szx + sxz,        syz + szy,        -sxx - syy + szz,
    )
}

fn horn_rotation(
    correlations: &[Correlation<PointCorrelation>],
    centroids: &Centroids,
) -> Result<Quat> {
    let n = horn_matrix(&cross_covariance(correlations, centroids));

    if !n.iter().all(|v| v.is_finite()) {
        warn!("Horn matrix has non-finite entries");
        return Err(CoregistrationError::NumericalInstability(
            "Horn matrix N has non-finite entries".into(),
        ));
    }

    let asymmetry = (n - n.transpose()).amax();
    let is_symmetric = asymmetry <= SYMMETRY_TOL * n.amax().max(1.0);
    if !is_symmetric {
        warn!("Horn matrix is not symmetric (max |N - Nᵀ| = {asymmetry:e})");
        return Err(CoregistrationError::NumericalInstability(
            "Horn matrix N is not symmetric".into(),
        ));
    }

    let eigen = SymmetricEigen::try_new(n, Real::EPSILON, EIGEN_MAX_ITERS).ok_or_else(|| {
        warn!("eigen-decomposition of the Horn matrix did not converge");
        CoregistrationError::NumericalInstability(
            "eigen-decomposition of N did not converge".into(),
        )
    })?;

    // Largest eigenvalue, first occurrence on ties.
    let mut index = 0;
    let mut max_eigenvalue = eigen.eigenvalues[0];
    for (i, &value) in eigen.eigenvalues.iter().enumerate().skip(1) {
        if value > max_eigenvalue {
            index = i;
            max_eigenvalue = value;
        }
    }
    debug!("Horn eigenvalues {:?}, using #{index}", eigen.eigenvalues.as_slice());

    let v = eigen.eigenvectors.column(index);
    // Eigenvectors come out unit-norm.
    Ok(Quat::new_unchecked(Quaternion::new(v[0], v[1], v[2], v[3])))
}

/// Rounding floor for a sum of squared deviations around `centroid`.
///
/// Centring `n` copies of one point leaves residuals of order `ε·|c̄|`, so
/// anything at or below this is no spread at all, whatever the units.
fn spread_floor(n: usize, centroid: &Vec3) -> Real {
    let residual = SPREAD_EPS * centroid.norm();
    n as Real * residual * residual
}

/// Uniform scale `sqrt(Σ|t_i - t̄|² / Σ|r_i - r̄|²)`.
fn horn_scale(
    correlations: &[Correlation<PointCorrelation>],
    centroids: &Centroids,
) -> Result<Real> {
    let mut reference_ss = 0.0;
    let mut target_ss = 0.0;
    for c in correlations {
        reference_ss += (c.observation.reference - centroids.reference).norm_squared();
        target_ss += (c.observation.target - centroids.target).norm_squared();
    }

    let n = correlations.len();
    if !target_ss.is_finite() || target_ss <= spread_floor(n, &centroids.target) {
        return Err(CoregistrationError::DegenerateInput(
            "target positions have no spread around their centroid".into(),
        ));
    }
    if !reference_ss.is_finite() || reference_ss <= spread_floor(n, &centroids.reference) {
        return Err(CoregistrationError::DegenerateInput(
            "reference positions have no spread around their centroid".into(),
        ));
    }

    Ok((target_ss / reference_ss).sqrt())
}

/// Rotation, translation and uniform scale mapping reference positions onto
/// target positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEstimate {
    pub rotation: Quat,
    pub translation: Vec3,
    /// Same value on all three axes.
    pub scale: Vec3,
    /// Homogeneous `T · R · S`.
    pub transform: Mat4,
}

impl SimilarityEstimate {
    fn new(rotation: Quat, translation: Vec3, scale: Real) -> Self {
        let scale = Vec3::repeat(scale);
        Self {
            rotation,
            translation,
            scale,
            transform: trs(&translation, &rotation, &scale),
        }
    }

    pub fn similarity(&self) -> Similarity3<Real> {
        Similarity3::from_parts(
            Translation3::from(self.translation),
            self.rotation,
            self.scale.x,
        )
    }

    /// Homogeneous transform mapping target positions back onto reference
    /// positions.
    pub fn inverse_transform(&self) -> Mat4 {
        self.similarity().inverse().to_homogeneous()
    }

    pub fn transform_point(&self, reference: &Vec3) -> Vec3 {
        self.translation + self.rotation * reference.component_mul(&self.scale)
    }
}

/// Solver configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsoluteOrientationOptions {
    pub method: RotationMethod,
    pub outliers: OutlierOptions,
}

/// Position-only co-registration of two trackers.
///
/// Collect correlations with [`add`](Self::add), then call
/// [`compute`](Self::compute) once. The estimate is immutable afterwards;
/// [`reset`](Self::reset) starts over.
#[derive(Debug, Clone, Default)]
pub struct AbsoluteOrientation {
    buffer: CorrelationBuffer<PointCorrelation>,
    options: AbsoluteOrientationOptions,
    centroids: Option<Centroids>,
    estimate: Option<SimilarityEstimate>,
}

impl AbsoluteOrientation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AbsoluteOrientationOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &AbsoluteOrientationOptions {
        &self.options
    }

    pub fn add(&mut self, correlation: PointCorrelation) {
        self.buffer.push(correlation);
    }

    pub fn buffer(&self) -> &CorrelationBuffer<PointCorrelation> {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_registered(&self) -> bool {
        self.estimate.is_some()
    }

    /// Filter, then estimate rotation, scale and translation.
    ///
    /// Calling this again after success returns the stored estimate without
    /// touching the buffer. On failure nothing is registered and the caller
    /// may add more correlations and retry.
    pub fn compute(&mut self) -> Result<&SimilarityEstimate> {
        let estimate = match self.estimate.take() {
            Some(existing) => {
                debug!("absolute orientation already registered, keeping estimate");
                existing
            }
            None => self.solve()?,
        };
        Ok(&*self.estimate.insert(estimate))
    }

    fn solve(&mut self) -> Result<SimilarityEstimate> {
        if self.buffer.is_empty() {
            return Err(CoregistrationError::InsufficientSamples { needed: 1, got: 0 });
        }

        self.buffer.remove_outliers(&self.options.outliers)?;
        let centroids = self.buffer.centroids()?;
        let correlations = self.buffer.as_slice();

        let rotation = self.options.method.estimate(correlations, &centroids)?;
        let scale = horn_scale(correlations, &centroids)?;
        let translation = centroids.target - scale * (rotation * centroids.reference);

        info!(
            "absolute orientation from {} correlations: rotation {:?}, translation {:?}, scale {:.6}",
            correlations.len(),
            rotation.euler_angles(),
            translation.as_slice(),
            scale
        );

        self.centroids = Some(centroids);
        Ok(SimilarityEstimate::new(rotation, translation, scale))
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.centroids = None;
        self.estimate = None;
    }

    pub fn estimate(&self) -> Option<&SimilarityEstimate> {
        self.estimate.as_ref()
    }

    /// Centroids used by the last successful [`compute`](Self::compute).
    pub fn centroids(&self) -> Option<&Centroids> {
        self.centroids.as_ref()
    }

    pub fn rotation(&self) -> Option<Quat> {
        self.estimate.as_ref().map(|e| e.rotation)
    }

    pub fn translation(&self) -> Option<Vec3> {
        self.estimate.as_ref().map(|e| e.translation)
    }

    pub fn scale(&self) -> Option<Vec3> {
        self.estimate.as_ref().map(|e| e.scale)
    }

    pub fn transform(&self) -> Option<Mat4> {
        self.estimate.as_ref().map(|e| e.transform)
    }
}
