//! Paired observations and the buffer both solvers collect them into.

use coreg_core::{Quat, Real, Vec3};
use serde::{Deserialize, Serialize};

use crate::{CoregistrationError, Result};

/// One paired observation of the same physical event seen by two trackers.
///
/// The reference frame is the head-mounted tracker, the target frame the
/// handheld controller.
pub trait Observation {
    fn reference_position(&self) -> &Vec3;
    fn target_position(&self) -> &Vec3;
}

/// Position-only correlation consumed by [`crate::AbsoluteOrientation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCorrelation {
    /// Diagnostic angle reported by the host (e.g. controller yaw). Not used
    /// in solving.
    pub angle: Real,
    pub reference: Vec3,
    pub target: Vec3,
}

impl PointCorrelation {
    pub fn new(reference: Vec3, target: Vec3) -> Self {
        Self {
            angle: 0.0,
            reference,
            target,
        }
    }

    pub fn with_angle(angle: Real, reference: Vec3, target: Vec3) -> Self {
        Self {
            angle,
            reference,
            target,
        }
    }
}

impl Observation for PointCorrelation {
    fn reference_position(&self) -> &Vec3 {
        &self.reference
    }

    fn target_position(&self) -> &Vec3 {
        &self.target
    }
}

/// Reference pose plus target position, consumed by
/// [`crate::HandEyeCalibration`].
///
/// `target_orientation` is carried for the host's benefit; the QR15 solve
/// does not need it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseCorrelation {
    pub reference_position: Vec3,
    pub reference_orientation: Quat,
    pub target_position: Vec3,
    pub target_orientation: Option<Quat>,
}

impl PoseCorrelation {
    pub fn new(reference_position: Vec3, reference_orientation: Quat, target_position: Vec3) -> Self {
        Self {
            reference_position,
            reference_orientation,
            target_position,
            target_orientation: None,
        }
    }
}

impl Observation for PoseCorrelation {
    fn reference_position(&self) -> &Vec3 {
        &self.reference_position
    }

    fn target_position(&self) -> &Vec3 {
        &self.target_position
    }
}

/// A buffered observation with its distance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation<O> {
    pub observation: O,
    pub(crate) distance: Real,
    pub(crate) absolute_distance: Real,
}

impl<O: Observation> Correlation<O> {
    fn new(observation: O) -> Self {
        let distance = (observation.reference_position() - observation.target_position()).norm();
        Self {
            observation,
            distance,
            absolute_distance: 0.0,
        }
    }
}

impl<O> Correlation<O> {
    /// Euclidean distance between the two positions, fixed at insertion.
    pub fn distance(&self) -> Real {
        self.distance
    }

    /// Deviation of [`Self::distance`] from the median of the last outlier
    /// pass. Zero before any pass; stale once the buffer changes.
    pub fn absolute_distance(&self) -> Real {
        self.absolute_distance
    }
}

/// Arithmetic means of the reference and target positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroids {
    pub reference: Vec3,
    pub target: Vec3,
}

/// Ordered collection of correlations owned by one solver.
///
/// Insertion order is kept until [`CorrelationBuffer::remove_outliers`] runs;
/// afterwards entries are ordered by absolute deviation from the median
/// distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationBuffer<O> {
    pub(crate) correlations: Vec<Correlation<O>>,
    pub(crate) is_clean: bool,
}

impl<O> Default for CorrelationBuffer<O> {
    fn default() -> Self {
        Self {
            correlations: Vec::new(),
            is_clean: false,
        }
    }
}

impl<O: Observation> CorrelationBuffer<O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            correlations: Vec::with_capacity(capacity),
            is_clean: false,
        }
    }

    /// Append an observation. Inputs are not validated: NaN positions yield
    /// a NaN distance and propagate into any later solve.
    pub fn push(&mut self, observation: O) {
        self.correlations.push(Correlation::new(observation));
        self.is_clean = false;
    }

    pub fn len(&self) -> usize {
        self.correlations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correlations.is_empty()
    }

    /// `true` when an outlier pass ran and nothing was appended since.
    pub fn is_clean(&self) -> bool {
        self.is_clean
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Correlation<O>> {
        self.correlations.iter()
    }

    pub fn as_slice(&self) -> &[Correlation<O>] {
        &self.correlations
    }

    pub fn clear(&mut self) {
        self.correlations.clear();
        self.is_clean = false;
    }

    /// Mean reference and target positions over the current contents.
    pub fn centroids(&self) -> Result<Centroids> {
        if self.correlations.is_empty() {
            return Err(CoregistrationError::InsufficientSamples { needed: 1, got: 0 });
        }

        let mut reference = Vec3::zeros();
        let mut target = Vec3::zeros();
        for c in &self.correlations {
            reference += c.observation.reference_position();
            target += c.observation.target_position();
        }
        let n = self.correlations.len() as Real;

        Ok(Centroids {
            reference: reference / n,
            target: target / n,
        })
    }

    /// Per-axis mean of `|reference - target|`.
    ///
    /// A quick check of how far apart the two trackers report the same event,
    /// axis by axis. `None` for an empty buffer.
    pub fn mean_axis_distance(&self) -> Option<Vec3> {
        if self.correlations.is_empty() {
            return None;
        }
        let sum = self.correlations.iter().fold(Vec3::zeros(), |acc, c| {
            acc + (c.observation.reference_position() - c.observation.target_position()).abs()
        });
        Some(sum / self.correlations.len() as Real)
    }
}

impl<O: Observation> Extend<O> for CorrelationBuffer<O> {
    fn extend<I: IntoIterator<Item = O>>(&mut self, iter: I) {
        for observation in iter {
            self.push(observation);
        }
    }
}

impl<O: Observation> FromIterator<O> for CorrelationBuffer<O> {
    fn from_iter<I: IntoIterator<Item = O>>(iter: I) -> Self {
        let mut buffer = Self::new();
        buffer.extend(iter);
        buffer
    }
}

impl<'a, O> IntoIterator for &'a CorrelationBuffer<O> {
    type Item = &'a Correlation<O>;
    type IntoIter = std::slice::Iter<'a, Correlation<O>>;

    fn into_iter(self) -> Self::IntoIter {
        self.correlations.iter()
    }
}
